use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::PayoffError;
use crate::types::{Money, Rate};
use crate::PayoffResult;

/// Level payment (PMT) that amortises `present_value` to `future_value`
/// over `nper` periods at a periodic `rate`.
///
/// Follows the spreadsheet sign convention: a positive balance owed yields
/// a negative payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> PayoffResult<Money> {
    if nper == 0 {
        return Err(PayoffError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must be non-negative".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powd(Decimal::from(nper))
        .ok_or_else(|| growth_overflow(nper))?;
    let annuity_factor = (factor - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| growth_overflow(nper))?;

    if annuity_factor.is_zero() {
        return Err(PayoffError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let grown = present_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(future_value))
        .ok_or_else(|| growth_overflow(nper))?;
    Ok(-grown / annuity_factor)
}

fn growth_overflow(nper: u32) -> PayoffError {
    PayoffError::FinancialImpossibility(format!(
        "Compound growth over {nper} periods exceeds the representable range"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pmt_zero_rate() {
        let result = pmt(Decimal::ZERO, 10, dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(result, dec!(-100));
    }

    #[test]
    fn test_pmt_card_balance() {
        // 5000 at 18.99% APR cleared in 36 months ≈ 183.26 per month
        let result = pmt(dec!(0.015825), 36, dec!(5000), Decimal::ZERO).unwrap();
        assert!((result + dec!(183.26)).abs() < dec!(0.5), "got {result}");
    }

    #[test]
    fn test_pmt_zero_periods_error() {
        assert!(pmt(dec!(0.01), 0, dec!(1000), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_pmt_long_horizon_is_an_error() {
        let err = pmt(dec!(0.015825), 100_000, dec!(5000), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, PayoffError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_pmt_negative_rate_error() {
        assert!(pmt(dec!(-0.01), 12, dec!(1000), Decimal::ZERO).is_err());
    }
}
