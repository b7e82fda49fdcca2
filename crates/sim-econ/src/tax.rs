//! Withdrawal tax.

use rust_decimal::Decimal;
use sim_core::TaxRates;

/// Tax owed on a withdrawal of `gross_amount` realizing `capital_gain`.
///
/// Every withdrawal pays the flat rate on the gross amount. A positive gain
/// additionally pays the capital gains rate on the gain. No rounding is applied.
pub fn withdrawal_tax(rates: &TaxRates, capital_gain: Decimal, gross_amount: Decimal) -> Decimal {
    let flat = gross_amount * rates.flat_withdrawal;
    if capital_gain <= Decimal::ZERO {
        return flat;
    }
    capital_gain * rates.capital_gains + flat
}
