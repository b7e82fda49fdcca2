#![deny(warnings)]

//! Session runtime: the game clock that composes calendar, price engine and
//! ledger over immutable [`GameState`] snapshots.
//!
//! A [`Session`] owns the validated configuration and the random source. Every
//! operation takes a state snapshot and returns a new one; rejected operations
//! return an error and the caller keeps its previous snapshot. Driving ticks in
//! real time is left to the caller, see [`Session::tick_interval`].

use rust_decimal::Decimal;
use sim_core::{validate_config, AssetId, GameConfig, GameState, Portfolio, ValidationError};
use sim_econ::{EconError, RandomSource, SeededRandom, TradeError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub use sim_core::WithdrawalResult;
pub use sim_econ::{invested_value, net_worth, roi, wallet_balance};

/// Rejected pacing controls.
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    /// Speed multiplier must be finite and strictly positive.
    #[error("game speed must be finite and > 0, got {0}")]
    InvalidSpeed(f64),
}

/// Errors surfaced by session operations.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error("trade not applied: {0}")]
    Trade(#[from] TradeError),
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Game clock and trade desk for one session.
#[derive(Debug)]
pub struct Session<R: RandomSource = SeededRandom> {
    config: GameConfig,
    rng: R,
}

impl Session<SeededRandom> {
    /// Session whose prices are driven by `config.rng_seed`.
    pub fn seeded(config: GameConfig) -> Result<Self, SessionError> {
        let rng = SeededRandom::new(config.rng_seed);
        Self::new(config, rng)
    }
}

impl<R: RandomSource> Session<R> {
    /// Validate `config` and take ownership of it for the session lifetime.
    pub fn new(config: GameConfig, rng: R) -> Result<Self, SessionError> {
        validate_config(&config)?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Starting state: full wallet, no positions, catalog prices, paused.
    pub fn initialize(&self) -> GameState {
        GameState {
            portfolio: Portfolio::new(self.config.starting_money),
            current_date: self.config.start_date,
            assets: self.config.assets.iter().map(|a| a.to_asset()).collect(),
            game_speed: self.config.default_speed,
            is_paused: true,
        }
    }

    /// One tick. Returns the state unchanged when paused; otherwise moves the
    /// calendar by `days_per_tick` and every asset price by one step.
    pub fn advance(&mut self, state: &GameState) -> Result<GameState, SessionError> {
        if state.is_paused {
            return Ok(state.clone());
        }
        let assets = sim_econ::update_all(&state.assets, &self.config.risk_multipliers, &mut self.rng)?;
        let current_date = state.current_date.increment(self.config.days_per_tick);
        debug!(date = %current_date, "tick");
        Ok(GameState {
            portfolio: state.portfolio.clone(),
            current_date,
            assets,
            game_speed: state.game_speed,
            is_paused: state.is_paused,
        })
    }

    /// Advance up to `ticks` times, stopping early if the state is paused.
    pub fn run_ticks(&mut self, state: &GameState, ticks: u32) -> Result<GameState, SessionError> {
        let mut current = state.clone();
        for _ in 0..ticks {
            if current.is_paused {
                break;
            }
            current = self.advance(&current)?;
        }
        Ok(current)
    }

    /// Buy `amount` worth of the asset with id `asset_id` at its current price.
    pub fn buy(
        &self,
        state: &GameState,
        asset_id: &AssetId,
        amount: Decimal,
    ) -> Result<GameState, SessionError> {
        let asset = state
            .asset(asset_id)
            .ok_or_else(|| rejected("buy", TradeError::UnknownAsset(asset_id.clone())))?;
        let portfolio = sim_econ::buy(&state.portfolio, asset, amount, state.current_date)
            .map_err(|e| rejected("buy", e))?;
        info!(asset = %asset_id, %amount, price = %asset.current_price, "bought");
        Ok(GameState {
            portfolio,
            ..state.clone()
        })
    }

    /// Sell `shares` of the investment at `index`, priced from the state's
    /// asset list.
    pub fn sell(
        &self,
        state: &GameState,
        index: usize,
        shares: Decimal,
    ) -> Result<(GameState, WithdrawalResult), SessionError> {
        let inv = state
            .portfolio
            .investments
            .get(index)
            .ok_or_else(|| rejected("sell", TradeError::UnknownInvestment(index)))?;
        let asset = state
            .asset(&inv.asset_id)
            .ok_or_else(|| rejected("sell", TradeError::UnknownAsset(inv.asset_id.clone())))?;
        let (portfolio, result) =
            sim_econ::sell(&state.portfolio, index, asset, shares, &self.config.tax)
                .map_err(|e| rejected("sell", e))?;
        info!(
            asset = %asset.id,
            %shares,
            gross = %result.gross_amount,
            tax = %result.tax_amount,
            net = %result.net_amount,
            "sold"
        );
        Ok((
            GameState {
                portfolio,
                ..state.clone()
            },
            result,
        ))
    }

    /// Whether net worth has reached the configured goal.
    pub fn has_won(&self, state: &GameState) -> bool {
        sim_econ::has_won(&state.portfolio, &state.assets, self.config.goal_amount)
    }

    /// Pause the state if the goal is reached. Returns the resulting state and
    /// whether the goal was reached.
    pub fn pause_on_win(&self, state: GameState) -> (GameState, bool) {
        if !self.has_won(&state) {
            return (state, false);
        }
        if !state.is_paused {
            info!(net_worth = %net_worth(&state.portfolio, &state.assets), "goal reached");
        }
        (pause(&state), true)
    }

    /// Real-time delay between ticks at the state's speed.
    pub fn tick_interval(&self, state: &GameState) -> Duration {
        let base = Duration::from_millis(self.config.tick_interval_ms);
        Duration::try_from_secs_f64(base.as_secs_f64() / state.game_speed).unwrap_or(base)
    }
}

fn rejected(op: &'static str, err: TradeError) -> SessionError {
    debug!(op, error = %err, "trade rejected");
    SessionError::Trade(err)
}

/// Stop ticking. Idempotent.
pub fn pause(state: &GameState) -> GameState {
    if !state.is_paused {
        info!("paused");
    }
    GameState {
        is_paused: true,
        ..state.clone()
    }
}

/// Resume ticking. Idempotent.
pub fn resume(state: &GameState) -> GameState {
    if state.is_paused {
        info!("resumed");
    }
    GameState {
        is_paused: false,
        ..state.clone()
    }
}

/// Change the speed multiplier in either pacing state.
pub fn set_speed(state: &GameState, speed: f64) -> Result<GameState, ControlError> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(ControlError::InvalidSpeed(speed));
    }
    Ok(GameState {
        game_speed: speed,
        ..state.clone()
    })
}
