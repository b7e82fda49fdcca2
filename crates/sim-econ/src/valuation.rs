//! Mark-to-market valuation and the win condition.

use rust_decimal::Decimal;
use sim_core::{find_asset, Asset, Investment, Portfolio};
use tracing::debug;

/// Cash on hand.
pub fn wallet_balance(portfolio: &Portfolio) -> Decimal {
    portfolio.wallet_balance
}

/// Current value of one position. A position whose asset is no longer listed
/// is worth zero.
pub fn position_value(investment: &Investment, assets: &[Asset]) -> Decimal {
    match find_asset(assets, &investment.asset_id) {
        Some(asset) => investment.shares_owned * asset.current_price,
        None => {
            debug!(asset = %investment.asset_id, "investment references unlisted asset; valued at zero");
            Decimal::ZERO
        }
    }
}

/// Total value of all open positions at current prices.
pub fn invested_value(portfolio: &Portfolio, assets: &[Asset]) -> Decimal {
    portfolio
        .investments
        .iter()
        .map(|inv| position_value(inv, assets))
        .sum()
}

/// Wallet plus invested value.
pub fn net_worth(portfolio: &Portfolio, assets: &[Asset]) -> Decimal {
    wallet_balance(portfolio) + invested_value(portfolio, assets)
}

/// Return on investment in percent. `None` when the cost basis is zero.
pub fn roi(investment: &Investment, current_price: Decimal) -> Option<Decimal> {
    if investment.amount_invested.is_zero() {
        return None;
    }
    let current_value = investment.shares_owned * current_price;
    let ratio = (current_value - investment.amount_invested).checked_div(investment.amount_invested)?;
    Some(ratio * Decimal::ONE_HUNDRED)
}

/// Whether net worth has reached `goal`.
pub fn has_won(portfolio: &Portfolio, assets: &[Asset], goal: Decimal) -> bool {
    net_worth(portfolio, assets) >= goal
}
