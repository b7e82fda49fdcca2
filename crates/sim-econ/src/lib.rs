#![deny(warnings)]

//! Economic models for Capital Quest.
//!
//! This crate provides the pure state transforms behind a session:
//! - Stochastic daily price updates with an injectable random source
//! - Withdrawal tax on realized gains
//! - Portfolio ledger buy/sell with cost-basis accounting
//! - Mark-to-market valuation, ROI and the win condition

use rust_decimal::Decimal;
use sim_core::AssetId;
use thiserror::Error;

pub mod ledger;
pub mod price;
pub mod tax;
pub mod valuation;

pub use ledger::{buy, sell};
pub use price::{
    next_price, price_change, price_floor, update_all, RandomSource, ScriptedRandom, SeededRandom,
    HISTORY_LEN,
};
pub use tax::withdrawal_tax;
pub use valuation::{has_won, invested_value, net_worth, position_value, roi, wallet_balance};

/// Errors produced by the price engine.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Price change could not be represented (NaN or infinite inputs).
    #[error("non-finite price change for {0}")]
    NonFinite(AssetId),
    /// Decimal arithmetic overflowed.
    #[error("price overflow for {0}")]
    Overflow(AssetId),
}

/// Reasons a buy or sell was not applied. The input portfolio is untouched.
#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    /// Buy amount must be > 0.
    #[error("amount must be > 0, got {0}")]
    NonPositiveAmount(Decimal),
    /// Wallet does not cover the buy.
    #[error("insufficient funds: have {available}, need {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },
    /// Asset price is not positive, so shares cannot be computed.
    #[error("asset {0} has no positive price")]
    InvalidPrice(AssetId),
    /// No investment at this index.
    #[error("no investment at index {0}")]
    UnknownInvestment(usize),
    /// Shares to sell must be > 0.
    #[error("shares must be > 0, got {0}")]
    NonPositiveShares(Decimal),
    /// Selling more shares than owned.
    #[error("insufficient shares: own {owned}, selling {requested}")]
    InsufficientShares { owned: Decimal, requested: Decimal },
    /// The asset passed in is not the one the investment references.
    #[error("investment holds {expected}, got price for {got}")]
    AssetMismatch { expected: AssetId, got: AssetId },
    /// Referenced asset is not listed, so it cannot be priced.
    #[error("asset not found: {0}")]
    UnknownAsset(AssetId),
}
