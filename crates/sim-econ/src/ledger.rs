//! Portfolio ledger: moves cash between the wallet and open positions.
//!
//! Both operations are pure. On rejection the caller's portfolio is untouched
//! and the returned [`TradeError`] says why.

use rust_decimal::Decimal;
use sim_core::{Asset, GameDate, Investment, Portfolio, TaxRates, WithdrawalResult};

use crate::tax::withdrawal_tax;
use crate::TradeError;

/// Spend `amount` of wallet cash on fractional shares of `asset` at its
/// current price.
pub fn buy(
    portfolio: &Portfolio,
    asset: &Asset,
    amount: Decimal,
    date: GameDate,
) -> Result<Portfolio, TradeError> {
    if amount <= Decimal::ZERO {
        return Err(TradeError::NonPositiveAmount(amount));
    }
    if amount > portfolio.wallet_balance {
        return Err(TradeError::InsufficientFunds {
            available: portfolio.wallet_balance,
            requested: amount,
        });
    }
    if asset.current_price <= Decimal::ZERO {
        return Err(TradeError::InvalidPrice(asset.id.clone()));
    }
    let shares = amount
        .checked_div(asset.current_price)
        .ok_or_else(|| TradeError::InvalidPrice(asset.id.clone()))?;

    let mut investments = Vec::with_capacity(portfolio.investments.len() + 1);
    investments.extend_from_slice(&portfolio.investments);
    investments.push(Investment {
        asset_id: asset.id.clone(),
        amount_invested: amount,
        shares_owned: shares,
        purchase_price: asset.current_price,
        purchase_date: date,
    });
    Ok(Portfolio {
        wallet_balance: portfolio.wallet_balance - amount,
        investments,
    })
}

/// Sell `shares` of the investment at `index`, priced by `asset`, and credit
/// the after-tax proceeds to the wallet.
///
/// A position sold down to zero is removed, shifting later indices down by
/// one. A partial sell scales the cost basis by the fraction of shares kept.
pub fn sell(
    portfolio: &Portfolio,
    index: usize,
    asset: &Asset,
    shares: Decimal,
    rates: &TaxRates,
) -> Result<(Portfolio, WithdrawalResult), TradeError> {
    let inv = portfolio
        .investments
        .get(index)
        .ok_or(TradeError::UnknownInvestment(index))?;
    if inv.asset_id != asset.id {
        return Err(TradeError::AssetMismatch {
            expected: inv.asset_id.clone(),
            got: asset.id.clone(),
        });
    }
    if shares <= Decimal::ZERO {
        return Err(TradeError::NonPositiveShares(shares));
    }
    if shares > inv.shares_owned {
        return Err(TradeError::InsufficientShares {
            owned: inv.shares_owned,
            requested: shares,
        });
    }

    let gross_amount = shares * asset.current_price;
    let original_cost = shares * inv.purchase_price;
    let capital_gain = gross_amount - original_cost;
    let tax_amount = withdrawal_tax(rates, capital_gain, gross_amount);
    let net_amount = gross_amount - tax_amount;

    let mut investments = portfolio.investments.clone();
    let remaining = inv.shares_owned - shares;
    if remaining <= Decimal::ZERO {
        investments.remove(index);
    } else {
        let kept = &mut investments[index];
        kept.amount_invested = kept.amount_invested * remaining / kept.shares_owned;
        kept.shares_owned = remaining;
    }

    Ok((
        Portfolio {
            wallet_balance: portfolio.wallet_balance + net_amount,
            investments,
        },
        WithdrawalResult {
            gross_amount,
            tax_amount,
            net_amount,
            capital_gain,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{AssetId, AssetType, RiskLevel};

    fn asset(id: &str, price: Decimal) -> Asset {
        Asset {
            id: AssetId::from(id),
            name: id.to_string(),
            kind: AssetType::Fund,
            risk_level: RiskLevel::Medium,
            base_return_rate: 0.1,
            volatility: 0.01,
            current_price: price,
            price_history: vec![price],
        }
    }

    fn rates() -> TaxRates {
        TaxRates {
            capital_gains: Decimal::new(15, 2),
            flat_withdrawal: Decimal::new(1, 2),
        }
    }

    fn date() -> GameDate {
        GameDate::new(2000, 1, 1).unwrap()
    }

    #[test]
    fn buy_then_sell_all_at_profit() {
        let start = Portfolio::new(Decimal::new(1000, 0));
        let p = buy(&start, &asset("A", Decimal::new(100, 0)), Decimal::new(500, 0), date()).unwrap();
        assert_eq!(p.wallet_balance, Decimal::new(500, 0));
        assert_eq!(p.investments.len(), 1);
        assert_eq!(p.investments[0].shares_owned, Decimal::new(5, 0));
        assert_eq!(p.investments[0].amount_invested, Decimal::new(500, 0));
        assert_eq!(p.investments[0].purchase_date, date());

        let (after, w) = sell(&p, 0, &asset("A", Decimal::new(120, 0)), Decimal::new(5, 0), &rates()).unwrap();
        assert_eq!(w.gross_amount, Decimal::new(600, 0));
        assert_eq!(w.capital_gain, Decimal::new(100, 0));
        assert_eq!(w.tax_amount, Decimal::new(21, 0));
        assert_eq!(w.net_amount, Decimal::new(579, 0));
        assert_eq!(after.wallet_balance, Decimal::new(1079, 0));
        assert!(after.investments.is_empty());
        // input untouched
        assert_eq!(p.investments.len(), 1);
    }

    #[test]
    fn buy_rejections() {
        let p = Portfolio::new(Decimal::new(100, 0));
        let a = asset("A", Decimal::new(10, 0));
        assert_eq!(
            buy(&p, &a, Decimal::ZERO, date()),
            Err(TradeError::NonPositiveAmount(Decimal::ZERO))
        );
        assert!(matches!(
            buy(&p, &a, Decimal::new(-5, 0), date()),
            Err(TradeError::NonPositiveAmount(_))
        ));
        assert_eq!(
            buy(&p, &a, Decimal::new(101, 0), date()),
            Err(TradeError::InsufficientFunds {
                available: Decimal::new(100, 0),
                requested: Decimal::new(101, 0)
            })
        );
        let free = asset("B", Decimal::ZERO);
        assert!(matches!(buy(&p, &free, Decimal::ONE, date()), Err(TradeError::InvalidPrice(_))));
    }

    #[test]
    fn buy_whole_wallet_is_allowed() {
        let p = Portfolio::new(Decimal::new(100, 0));
        let out = buy(&p, &asset("A", Decimal::new(3, 0)), Decimal::new(100, 0), date()).unwrap();
        assert_eq!(out.wallet_balance, Decimal::ZERO);
        assert_eq!(out.investments[0].amount_invested, Decimal::new(100, 0));
    }

    #[test]
    fn sell_rejections() {
        let p = buy(
            &Portfolio::new(Decimal::new(100, 0)),
            &asset("A", Decimal::new(10, 0)),
            Decimal::new(50, 0),
            date(),
        )
        .unwrap();
        let a = asset("A", Decimal::new(10, 0));
        assert_eq!(
            sell(&p, 1, &a, Decimal::ONE, &rates()),
            Err(TradeError::UnknownInvestment(1))
        );
        assert!(matches!(
            sell(&p, 0, &a, Decimal::ZERO, &rates()),
            Err(TradeError::NonPositiveShares(_))
        ));
        assert!(matches!(
            sell(&p, 0, &a, Decimal::new(6, 0), &rates()),
            Err(TradeError::InsufficientShares { .. })
        ));
        assert!(matches!(
            sell(&p, 0, &asset("B", Decimal::ONE), Decimal::ONE, &rates()),
            Err(TradeError::AssetMismatch { .. })
        ));
    }

    #[test]
    fn partial_sell_scales_cost_basis() {
        let p = buy(
            &Portfolio::new(Decimal::new(1000, 0)),
            &asset("A", Decimal::new(100, 0)),
            Decimal::new(400, 0),
            date(),
        )
        .unwrap();
        let (after, w) = sell(&p, 0, &asset("A", Decimal::new(80, 0)), Decimal::ONE, &rates()).unwrap();
        assert_eq!(w.gross_amount, Decimal::new(80, 0));
        assert_eq!(w.capital_gain, Decimal::new(-20, 0));
        assert_eq!(w.tax_amount, Decimal::new(80, 2));
        assert_eq!(after.wallet_balance, Decimal::new(600, 0) + Decimal::new(7920, 2));
        let inv = &after.investments[0];
        assert_eq!(inv.shares_owned, Decimal::new(3, 0));
        assert_eq!(inv.amount_invested, Decimal::new(300, 0));
        assert_eq!(inv.purchase_price, Decimal::new(100, 0));
    }

    #[test]
    fn full_sell_removes_only_that_position() {
        let mut p = Portfolio::new(Decimal::new(1000, 0));
        for (id, price) in [("A", 10), ("B", 20), ("C", 40)] {
            p = buy(&p, &asset(id, Decimal::new(price, 0)), Decimal::new(100, 0), date()).unwrap();
        }
        let (after, _) = sell(&p, 1, &asset("B", Decimal::new(20, 0)), Decimal::new(5, 0), &rates()).unwrap();
        let ids: Vec<&str> = after.investments.iter().map(|i| i.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    proptest! {
        #[test]
        fn buy_conserves_cash(wallet in 1i64..10_000_000, frac in 1u32..=100, price in 1i64..10_000_000) {
            let wallet = Decimal::new(wallet, 2);
            let amount = (wallet * Decimal::from(frac) / Decimal::from(100u32)).round_dp(2);
            prop_assume!(amount > Decimal::ZERO);
            let p = Portfolio::new(wallet);
            let a = asset("A", Decimal::new(price, 2));
            let out = buy(&p, &a, amount, date()).unwrap();
            prop_assert_eq!(out.wallet_balance, wallet - amount);
            prop_assert_eq!(out.investments[0].amount_invested, amount);
            let cost = out.investments[0].shares_owned * out.investments[0].purchase_price;
            prop_assert!((cost - amount).abs() < Decimal::new(1, 12));
        }

        #[test]
        fn sell_conserves_cash(buy_price in 1i64..100_000, sell_price in 1i64..100_000, pct in 1u32..=100) {
            let start = Portfolio::new(Decimal::new(10_000, 0));
            let p = buy(&start, &asset("A", Decimal::new(buy_price, 2)), Decimal::new(5_000, 0), date()).unwrap();
            let owned = p.investments[0].shares_owned;
            let shares = if pct == 100 { owned } else { owned * Decimal::from(pct) / Decimal::from(100u32) };
            prop_assume!(shares > Decimal::ZERO);
            let (after, w) = sell(&p, 0, &asset("A", Decimal::new(sell_price, 2)), shares, &rates()).unwrap();
            prop_assert!(w.tax_amount >= Decimal::ZERO);
            prop_assert_eq!(w.net_amount, w.gross_amount - w.tax_amount);
            prop_assert_eq!(after.wallet_balance, p.wallet_balance + w.net_amount);
            if pct == 100 {
                prop_assert!(after.investments.is_empty());
            } else {
                prop_assert!(after.investments[0].shares_owned < owned);
                prop_assert!(after.investments[0].amount_invested <= p.investments[0].amount_invested);
            }
        }
    }
}
