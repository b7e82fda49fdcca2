#![deny(warnings)]

//! Core domain models and invariants for Capital Quest.
//!
//! This crate defines the serializable game state shared by the economy engine
//! and the session runtime, the immutable game configuration, and validation
//! helpers that guard the configuration invariants before a session starts.

mod calendar;

pub use calendar::{days_in_month, increment, GameDate, DAYS_IN_MONTH, MAX_YEAR, MIN_YEAR};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Unique identifier for an asset, e.g. "Apple" or "S&P-500".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Asset classes available on the market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Bond,
    Fund,
    Crypto,
}

/// Qualitative volatility class of an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Extreme,
    ];
}

/// A tradable asset with its live price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Lookup key referenced by investments.
    pub id: AssetId,
    /// Human-readable name, e.g. "Apple Inc. (AAPL)".
    pub name: String,
    /// Asset class.
    #[serde(rename = "type")]
    pub kind: AssetType,
    /// Risk class, mapped to a price-change multiplier.
    pub risk_level: RiskLevel,
    /// Annualized drift (e.g., 0.10 = 10%).
    pub base_return_rate: f64,
    /// Daily noise scale (>= 0).
    pub volatility: f64,
    /// Current price per share (> 0).
    pub current_price: Decimal,
    /// Past prices, most recent last.
    pub price_history: Vec<Decimal>,
}

/// An open position in one asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    /// Asset this position refers to (lookup only).
    pub asset_id: AssetId,
    /// Cost basis, scaled down proportionally on partial sells.
    pub amount_invested: Decimal,
    /// Fractional share count (> 0).
    pub shares_owned: Decimal,
    /// Price per share at acquisition.
    pub purchase_price: Decimal,
    /// Date the position was opened.
    pub purchase_date: GameDate,
}

/// Player cash plus open positions in acquisition order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Cash on hand (>= 0).
    pub wallet_balance: Decimal,
    /// Open investments; the index is the handle used to sell.
    pub investments: Vec<Investment>,
}

impl Portfolio {
    pub fn new(wallet_balance: Decimal) -> Self {
        Self {
            wallet_balance,
            investments: Vec::new(),
        }
    }
}

/// Full state of one game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub portfolio: Portfolio,
    pub current_date: GameDate,
    /// Authoritative price source for valuation and trades.
    pub assets: Vec<Asset>,
    /// Tick cadence multiplier (> 0).
    pub game_speed: f64,
    pub is_paused: bool,
}

impl GameState {
    /// Look up an asset by id.
    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        find_asset(&self.assets, id)
    }
}

/// Look up an asset by id in a slice.
pub fn find_asset<'a>(assets: &'a [Asset], id: &AssetId) -> Option<&'a Asset> {
    assets.iter().find(|a| &a.id == id)
}

/// Outcome of a sell, returned for display and confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalResult {
    /// Proceeds before tax.
    pub gross_amount: Decimal,
    /// Tax deducted.
    pub tax_amount: Decimal,
    /// Amount credited to the wallet.
    pub net_amount: Decimal,
    /// Realized gain; negative for a loss.
    pub capital_gain: Decimal,
}

/// Catalog entry used to create an [`Asset`] at session start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub id: AssetId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetType,
    pub risk_level: RiskLevel,
    pub base_return_rate: f64,
    pub volatility: f64,
    pub initial_price: Decimal,
}

impl AssetSpec {
    /// Build the live asset; history starts with the initial price.
    pub fn to_asset(&self) -> Asset {
        Asset {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            risk_level: self.risk_level,
            base_return_rate: self.base_return_rate,
            volatility: self.volatility,
            current_price: self.initial_price,
            price_history: vec![self.initial_price],
        }
    }
}

/// Price-change multiplier per risk level. Every level has a value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub extreme: f64,
}

impl RiskMultipliers {
    pub fn get(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Extreme => self.extreme,
        }
    }
}

impl Default for RiskMultipliers {
    fn default() -> Self {
        Self {
            low: 0.2,
            medium: 0.3,
            high: 1.0,
            extreme: 2.0,
        }
    }
}

/// Withdrawal tax rates as decimals (0.15 = 15%).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    /// Applied to positive realized gains.
    pub capital_gains: Decimal,
    /// Applied to the gross amount of every withdrawal.
    pub flat_withdrawal: Decimal,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            capital_gains: Decimal::new(15, 2),
            flat_withdrawal: Decimal::new(1, 2),
        }
    }
}

/// A selectable game speed, e.g. "2x".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedOption {
    pub label: String,
    pub multiplier: f64,
}

/// Session configuration. Loaded once and immutable for the session lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Starting wallet amount.
    pub starting_money: Decimal,
    /// Net worth needed to win.
    pub goal_amount: Decimal,
    pub start_date: GameDate,
    /// Speed multiplier at session start (> 0).
    pub default_speed: f64,
    /// Simulated days per tick (> 0).
    pub days_per_tick: u32,
    pub tax: TaxRates,
    pub risk_multipliers: RiskMultipliers,
    /// Real-time milliseconds between ticks at speed 1.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_speed_options")]
    pub speed_options: Vec<SpeedOption>,
    /// Seed for the deterministic price RNG.
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
    /// Asset catalog.
    pub assets: Vec<AssetSpec>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_rng_seed() -> u64 {
    42
}

fn default_speed_options() -> Vec<SpeedOption> {
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| SpeedOption {
            label: format!("{m}x"),
            multiplier: m,
        })
        .collect()
}

fn default_catalog() -> Vec<AssetSpec> {
    let spec = |id: &str,
                name: &str,
                kind: AssetType,
                risk_level: RiskLevel,
                base_return_rate: f64,
                volatility: f64,
                cents: i64| AssetSpec {
        id: AssetId::new(id),
        name: name.to_string(),
        kind,
        risk_level,
        base_return_rate,
        volatility,
        initial_price: Decimal::new(cents, 2),
    };
    vec![
        spec("Apple", "Apple Inc. (AAPL)", AssetType::Stock, RiskLevel::Medium, 0.15, 0.015, 23_000),
        spec("US-Treasury-Bonds", "US 10-Year Treasury Bond", AssetType::Bond, RiskLevel::Low, 0.042, 0.002, 10_000),
        spec("S&P-500", "Vanguard S&P 500 ETF (VOO)", AssetType::Fund, RiskLevel::Medium, 0.10, 0.01, 51_000),
        spec("Bitcoin-ETF", "iShares Bitcoin Trust (IBIT)", AssetType::Crypto, RiskLevel::Extreme, 0.40, 0.06, 4_000),
        spec("NVIDIA", "NVIDIA Corp (NVDA)", AssetType::Stock, RiskLevel::High, 0.35, 0.035, 13_000),
    ]
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_money: Decimal::new(1_000, 0),
            goal_amount: Decimal::new(10_000, 0),
            start_date: GameDate::start_of_year(2000),
            default_speed: 10.0,
            days_per_tick: 1,
            tax: TaxRates::default(),
            risk_multipliers: RiskMultipliers::default(),
            tick_interval_ms: default_tick_interval_ms(),
            speed_options: default_speed_options(),
            rng_seed: default_rng_seed(),
            assets: default_catalog(),
        }
    }
}

/// Validation errors for configuration and date invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Year outside [`MIN_YEAR`, `MAX_YEAR`].
    #[error("year {0} is out of range [-9999, 9999]")]
    YearOutOfRange(i32),
    /// Month outside [1, 12].
    #[error("month {0} is out of range [1, 12]")]
    InvalidMonth(u32),
    /// Day outside the month's length.
    #[error("day {day} is out of range for month {month}")]
    InvalidDay { month: u32, day: u32 },
    /// Numeric field must be finite.
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    /// Rate must lie within [0, 1].
    #[error("{0} must be within [0,1]")]
    RateOutOfRange(&'static str),
    /// Monetary value must be non-negative.
    #[error("negative monetary value for {0}")]
    NegativeMoney(&'static str),
    /// Multiplier or speed must be strictly positive.
    #[error("{0} must be > 0")]
    NonPositive(&'static str),
    /// Risk multiplier must be non-negative.
    #[error("risk multiplier for {0:?} must be >= 0")]
    NegativeMultiplier(RiskLevel),
    /// Catalog has no assets.
    #[error("asset catalog is empty")]
    EmptyCatalog,
    /// Asset id is blank.
    #[error("asset id must not be empty")]
    EmptyAssetId,
    /// Asset id appears twice in the catalog.
    #[error("duplicate asset id: {0}")]
    DuplicateAsset(String),
    /// Initial price must be > 0.
    #[error("initial price for {0} must be > 0")]
    NonPositivePrice(String),
    /// Volatility must be finite and >= 0.
    #[error("volatility for {0} must be finite and >= 0")]
    InvalidVolatility(String),
}

fn validate_rate(rate: Decimal, name: &'static str) -> Result<(), ValidationError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ValidationError::RateOutOfRange(name));
    }
    Ok(())
}

/// Validate tax rates.
pub fn validate_tax_rates(t: &TaxRates) -> Result<(), ValidationError> {
    validate_rate(t.capital_gains, "capital gains tax rate")?;
    validate_rate(t.flat_withdrawal, "flat withdrawal tax rate")
}

/// Validate risk multipliers.
pub fn validate_risk_multipliers(m: &RiskMultipliers) -> Result<(), ValidationError> {
    for level in RiskLevel::ALL {
        let v = m.get(level);
        if !v.is_finite() {
            return Err(ValidationError::NonFinite("risk multiplier"));
        }
        if v < 0.0 {
            return Err(ValidationError::NegativeMultiplier(level));
        }
    }
    Ok(())
}

/// Validate a catalog entry.
pub fn validate_asset_spec(a: &AssetSpec) -> Result<(), ValidationError> {
    if a.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyAssetId);
    }
    if a.initial_price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(a.id.0.clone()));
    }
    if !a.base_return_rate.is_finite() {
        return Err(ValidationError::NonFinite("base return rate"));
    }
    if !a.volatility.is_finite() || a.volatility < 0.0 {
        return Err(ValidationError::InvalidVolatility(a.id.0.clone()));
    }
    Ok(())
}

/// Validate the whole configuration, including catalog uniqueness.
pub fn validate_config(cfg: &GameConfig) -> Result<(), ValidationError> {
    if cfg.starting_money < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("starting money"));
    }
    if cfg.goal_amount < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("goal amount"));
    }
    if !cfg.default_speed.is_finite() {
        return Err(ValidationError::NonFinite("default speed"));
    }
    if cfg.default_speed <= 0.0 {
        return Err(ValidationError::NonPositive("default speed"));
    }
    if cfg.days_per_tick == 0 {
        return Err(ValidationError::NonPositive("days per tick"));
    }
    if cfg.tick_interval_ms == 0 {
        return Err(ValidationError::NonPositive("tick interval"));
    }
    for opt in &cfg.speed_options {
        if !(opt.multiplier.is_finite() && opt.multiplier > 0.0) {
            return Err(ValidationError::NonPositive("speed option multiplier"));
        }
    }
    validate_tax_rates(&cfg.tax)?;
    validate_risk_multipliers(&cfg.risk_multipliers)?;

    if cfg.assets.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }
    let mut ids: BTreeSet<&AssetId> = BTreeSet::new();
    for a in &cfg.assets {
        validate_asset_spec(a)?;
        if !ids.insert(&a.id) {
            return Err(ValidationError::DuplicateAsset(a.id.0.clone()));
        }
    }
    Ok(())
}

/// Format an amount as dollars, e.g. `$1,234.56` or `-$12.00`.
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac_part}")
}
