//! Stochastic daily price updates.
//!
//! Each tick moves an asset by
//! `(base_return_rate / 365 + u * volatility) * risk_multiplier`, where `u` is
//! drawn uniformly from [-1, 1], and clamps the result at [`price_floor`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sim_core::{Asset, RiskMultipliers};
use tracing::trace;

use crate::EconError;

/// Maximum number of prices kept in an asset's history.
pub const HISTORY_LEN: usize = 100;

/// Lowest price an asset can reach (0.01).
pub fn price_floor() -> Decimal {
    Decimal::new(1, 2)
}

/// Source of uniform draws in [-1, 1].
pub trait RandomSource {
    fn next_signed_unit(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_signed_unit(&mut self) -> f64 {
        (**self).next_signed_unit()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_signed_unit(&mut self) -> f64 {
        (**self).next_signed_unit()
    }
}

/// Seeded ChaCha8 source for reproducible sessions.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_signed_unit(&mut self) -> f64 {
        self.rng.gen_range(-1.0..=1.0)
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Values are clamped to [-1, 1]; an empty script always yields 0.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            pos: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_signed_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let v = self.draws[self.pos % self.draws.len()];
        self.pos = self.pos.wrapping_add(1);
        v.clamp(-1.0, 1.0)
    }
}

/// Fractional price change for one tick, e.g. 0.02 for +2%.
pub fn price_change<R: RandomSource + ?Sized>(
    asset: &Asset,
    multipliers: &RiskMultipliers,
    rng: &mut R,
) -> f64 {
    let drift = asset.base_return_rate / 365.0;
    let noise = rng.next_signed_unit() * asset.volatility;
    (drift + noise) * multipliers.get(asset.risk_level)
}

/// Next price for `asset`, never below [`price_floor`].
pub fn next_price<R: RandomSource + ?Sized>(
    asset: &Asset,
    multipliers: &RiskMultipliers,
    rng: &mut R,
) -> Result<Decimal, EconError> {
    let change = price_change(asset, multipliers, rng);
    let factor =
        Decimal::from_f64(1.0 + change).ok_or_else(|| EconError::NonFinite(asset.id.clone()))?;
    let raw = asset
        .current_price
        .checked_mul(factor)
        .ok_or_else(|| EconError::Overflow(asset.id.clone()))?;
    Ok(raw.max(price_floor()))
}

fn push_history(history: &[Decimal], price: Decimal) -> Vec<Decimal> {
    let keep = history.len().min(HISTORY_LEN - 1);
    let mut out = Vec::with_capacity(keep + 1);
    out.extend_from_slice(&history[history.len() - keep..]);
    out.push(price);
    out
}

/// Move every asset one tick, independently and in order. The input is not
/// modified; each returned asset carries the new price appended to its history.
pub fn update_all<R: RandomSource + ?Sized>(
    assets: &[Asset],
    multipliers: &RiskMultipliers,
    rng: &mut R,
) -> Result<Vec<Asset>, EconError> {
    assets
        .iter()
        .map(|asset| {
            let price = next_price(asset, multipliers, rng)?;
            trace!(asset = %asset.id, from = %asset.current_price, to = %price, "price move");
            Ok(Asset {
                current_price: price,
                price_history: push_history(&asset.price_history, price),
                ..asset.clone()
            })
        })
        .collect()
}
