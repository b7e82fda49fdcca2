#![deny(warnings)]

//! Headless driver: loads a game configuration, runs the session tick by tick
//! and reports portfolio KPIs.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use sim_core::{format_money, GameConfig, GameState};
use sim_runtime::{invested_value, net_worth, resume, roi, Session, WithdrawalResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    ticks: Option<u32>,
    seed: Option<u64>,
    invest: Option<String>,
    liquidate: bool,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--ticks" => args.ticks = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--invest" => args.invest = it.next(),
            "--liquidate" => args.liquidate = true,
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn parse_fraction(s: &str) -> Result<Decimal> {
    let f = Decimal::from_str(s).with_context(|| format!("invalid --invest fraction {s:?}"))?;
    if f <= Decimal::ZERO || f > Decimal::ONE {
        bail!("--invest fraction must be in (0, 1], got {f}");
    }
    Ok(f)
}

/// Spread `fraction` of the wallet evenly across the catalog. Rejected buys are
/// logged and skipped.
fn invest_evenly(session: &Session, state: GameState, fraction: Decimal) -> GameState {
    let n = state.assets.len();
    if n == 0 {
        return state;
    }
    let per_asset =
        (state.portfolio.wallet_balance * fraction / Decimal::from(n as u64)).round_dp(2);
    let ids: Vec<_> = state.assets.iter().map(|a| a.id.clone()).collect();
    ids.iter().fold(state, |st, id| match session.buy(&st, id, per_asset) {
        Ok(next) => next,
        Err(e) => {
            warn!(asset = %id, error = %e, "skipping buy");
            st
        }
    })
}

/// Sell every open position in full.
fn liquidate(session: &Session, mut state: GameState) -> (GameState, Vec<WithdrawalResult>) {
    let mut results = Vec::new();
    let mut index = 0;
    while let Some(inv) = state.portfolio.investments.get(index) {
        let shares = inv.shares_owned;
        match session.sell(&state, index, shares) {
            Ok((next, result)) => {
                state = next;
                results.push(result);
            }
            Err(e) => {
                warn!(index, error = %e, "position kept");
                index += 1;
            }
        }
    }
    (state, results)
}

fn print_summary(session: &Session, state: &GameState, won: bool) {
    let cfg = session.config();
    println!(
        "KPI | date: {} | wallet: {} | invested: {} | net worth: {} | goal: {} | won: {}",
        state.current_date,
        format_money(state.portfolio.wallet_balance),
        format_money(invested_value(&state.portfolio, &state.assets)),
        format_money(net_worth(&state.portfolio, &state.assets)),
        format_money(cfg.goal_amount),
        won
    );
    for (i, inv) in state.portfolio.investments.iter().enumerate() {
        let price = state.asset(&inv.asset_id).map(|a| a.current_price);
        let roi_pct = price
            .and_then(|p| roi(inv, p))
            .map(|r| format!("{:.2}%", r.round_dp(2)))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  #{i} {} | shares: {} | basis: {} | ROI: {}",
            inv.asset_id,
            inv.shares_owned.round_dp(6),
            format_money(inv.amount_invested),
            roi_pct
        );
    }
}

/// Log subscriber filtered by `directives` (the `RUST_LOG` syntax). Missing or
/// unparsable directives fall back to `info`.
fn log_subscriber(
    directives: Option<&str>,
) -> tracing_subscriber::fmt::Subscriber<DefaultFields, Format, EnvFilter> {
    let filter = directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).finish()
}

fn main() -> Result<()> {
    // Logging setup
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing::subscriber::set_global_default(log_subscriber(directives.as_deref()))
        .context("installing log subscriber")?;

    let args = parse_args();
    info!(
        git_sha = env!("GIT_SHA"),
        build_date = env!("BUILD_DATE"),
        ?args,
        "starting CLI"
    );

    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    let fraction = args.invest.as_deref().map(parse_fraction).transpose()?;
    let mut session = Session::seeded(cfg)?;

    let mut state = session.initialize();
    if let Some(f) = fraction {
        state = invest_evenly(&session, state, f);
    }

    let (mut state, mut won) = session.pause_on_win(resume(&state));
    let ticks = args.ticks.unwrap_or(365);
    let mut ran = 0;
    while ran < ticks && !won {
        state = session.advance(&state)?;
        ran += 1;
        (state, won) = session.pause_on_win(state);
    }
    info!(ticks = ran, date = %state.current_date, won, "simulation stopped");

    if args.liquidate {
        let (next, results) = liquidate(&session, state);
        state = next;
        for r in &results {
            println!(
                "SELL | gross: {} | gain: {} | tax: {} | net: {}",
                format_money(r.gross_amount),
                format_money(r.capital_gain),
                format_money(r.tax_amount),
                format_money(r.net_amount)
            );
        }
        won = session.has_won(&state);
    }

    print_summary(&session, &state, won);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/scenarios/capital_quest.yaml")
    }

    #[test]
    fn bundled_scenario_matches_defaults() {
        let cfg = load_config(Some(bundled().as_path())).unwrap();
        sim_core::validate_config(&cfg).unwrap();
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), GameConfig::default());
        assert!(load_config(Some(Path::new("does/not/exist.yaml"))).is_err());
    }

    #[test]
    fn log_level_follows_directives() {
        use tracing::level_filters::LevelFilter;
        use tracing::Subscriber;

        assert_eq!(log_subscriber(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_subscriber(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_subscriber(Some("trace")).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_subscriber(Some("sim_econ=loud")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn fraction_bounds() {
        assert_eq!(parse_fraction("0.5").unwrap(), Decimal::new(5, 1));
        assert!(parse_fraction("1").is_ok());
        assert!(parse_fraction("0").is_err());
        assert!(parse_fraction("1.5").is_err());
        assert!(parse_fraction("abc").is_err());
    }

    #[test]
    fn invest_then_liquidate_round_trip() {
        let session = Session::seeded(GameConfig::default()).unwrap();
        let start = session.initialize();
        let invested = invest_evenly(&session, start, Decimal::new(5, 1));
        assert_eq!(invested.portfolio.investments.len(), 5);
        assert_eq!(invested.portfolio.wallet_balance, Decimal::new(500, 0));

        let (after, results) = liquidate(&session, invested);
        assert_eq!(results.len(), 5);
        assert!(after.portfolio.investments.is_empty());
        // flat 1% withdrawal tax at unchanged prices
        let expected = Decimal::new(500, 0) + Decimal::new(500, 0) * Decimal::new(99, 2);
        assert_eq!(after.portfolio.wallet_balance.round_dp(10), expected);
    }
}
