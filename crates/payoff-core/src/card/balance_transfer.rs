use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::comparator::{run_comparison, ComparisonInput, ComparisonOutput, ScenarioSpec};
use crate::amortization::projector::{ProjectionLimits, MAX_MONTHS_CEILING};
use crate::amortization::schedule::{PaymentPolicy, RateSchedule};
use crate::error::PayoffError;
use crate::time_value::pmt;
use crate::types::*;
use crate::PayoffResult;

/// Input for a balance-transfer evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTransferInput {
    pub balance: Money,
    /// APR on the card the balance currently sits on
    pub current_apr: Rate,
    pub monthly_payment: Money,
    #[serde(default)]
    pub promo_apr: Rate,
    pub promo_months: Month,
    /// APR on the transfer card once the promotion ends
    pub post_promo_apr: Rate,
    /// Transfer fee as a fraction of the balance (0.03 = 3%)
    pub transfer_fee_rate: Rate,
    #[serde(default)]
    pub limits: ProjectionLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Output of a balance-transfer evaluation
#[derive(Debug, Clone, Serialize)]
pub struct BalanceTransferOutput {
    pub transfer_fee: Money,
    /// Monthly payment that clears the transferred balance before the promotion ends
    pub payment_to_clear_in_promo: Option<Money>,
    /// Transfer-card balance remaining when the promotion ends
    pub balance_at_promo_end: Option<Money>,
    pub comparison: ComparisonOutput,
}

fn validate(input: &BalanceTransferInput) -> PayoffResult<()> {
    if input.balance <= Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "balance".into(),
            reason: "Balance must be positive".into(),
        });
    }
    if input.monthly_payment <= Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "monthly_payment".into(),
            reason: "Monthly payment must be positive".into(),
        });
    }
    for (field, apr) in [
        ("current_apr", input.current_apr),
        ("promo_apr", input.promo_apr),
        ("post_promo_apr", input.post_promo_apr),
    ] {
        if apr < Decimal::ZERO {
            return Err(PayoffError::InvalidInput {
                field: field.into(),
                reason: "APR must be non-negative".into(),
            });
        }
    }
    if input.promo_months > MAX_MONTHS_CEILING {
        return Err(PayoffError::InvalidInput {
            field: "promo_months".into(),
            reason: format!("Promotional period must not exceed {MAX_MONTHS_CEILING} months"),
        });
    }
    if input.transfer_fee_rate < Decimal::ZERO || input.transfer_fee_rate > Decimal::ONE {
        return Err(PayoffError::InvalidInput {
            field: "transfer_fee_rate".into(),
            reason: "Transfer fee rate must be between 0 and 1".into(),
        });
    }
    Ok(())
}

/// Compare keeping a balance on the current card against moving it to a
/// promotional-rate card for an up-front fee.
pub fn analyze_balance_transfer(
    input: &BalanceTransferInput,
) -> PayoffResult<ComputationOutput<BalanceTransferOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let transfer_fee = input.balance * input.transfer_fee_rate;
    let payment = PaymentPolicy::fixed(input.monthly_payment);

    let comparison_input = ComparisonInput {
        scenario_a: ScenarioSpec {
            label: "Current card".into(),
            principal: input.balance,
            rate_schedule: RateSchedule::flat(input.current_apr),
            payment_policy: payment.clone(),
        },
        scenario_b: ScenarioSpec {
            label: "Transfer card".into(),
            principal: input.balance,
            rate_schedule: RateSchedule::promotional(
                input.promo_apr,
                input.promo_months,
                input.post_promo_apr,
            ),
            payment_policy: payment,
        },
        switch_fee: transfer_fee,
        limits: input.limits.clone(),
        start_date: input.start_date,
    };
    let comparison = run_comparison(&comparison_input, &mut warnings)?;

    let (payment_to_clear_in_promo, balance_at_promo_end) = if input.promo_months > 0 {
        let required = -pmt(
            monthly_rate(input.promo_apr),
            input.promo_months,
            input.balance,
            Decimal::ZERO,
        )?;
        // A run cut short by the cap has no balance for months it never reached
        let transfer = &comparison.b.projection;
        let remaining = if transfer.converged || input.promo_months <= transfer.months_run() {
            transfer.balance_at(input.promo_months)
        } else {
            None
        };
        (Some(required.round_dp(2)), remaining)
    } else {
        warnings.push("No promotional period; transfer card uses the post-promotion APR".into());
        (None, None)
    };

    if input.post_promo_apr > input.current_apr {
        warnings.push(
            "Post-promotion APR is higher than the current card APR; savings depend on clearing the balance during the promotion"
                .into(),
        );
    }

    let output = BalanceTransferOutput {
        transfer_fee,
        payment_to_clear_in_promo,
        balance_at_promo_end,
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Balance Transfer Savings and Break-Even",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "current_apr": input.current_apr.to_string(),
            "promo_apr": input.promo_apr.to_string(),
            "promo_months": input.promo_months,
            "post_promo_apr": input.post_promo_apr.to_string(),
            "transfer_fee_rate": input.transfer_fee_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn typical() -> BalanceTransferInput {
        BalanceTransferInput {
            balance: dec!(5000),
            current_apr: dec!(0.2299),
            monthly_payment: dec!(250),
            promo_apr: Decimal::ZERO,
            promo_months: 15,
            post_promo_apr: dec!(0.1999),
            transfer_fee_rate: dec!(0.03),
            limits: ProjectionLimits::default(),
            start_date: None,
        }
    }

    #[test]
    fn test_fee_and_promo_payment() {
        let out = analyze_balance_transfer(&typical()).unwrap().result;
        assert_eq!(out.transfer_fee, dec!(150));
        // 0% promo: 5000 / 15
        assert_eq!(out.payment_to_clear_in_promo, Some(dec!(333.33)));
        // 15 payments of 250 at 0% leave 1250
        assert_eq!(out.balance_at_promo_end, Some(dec!(1250)));
    }

    #[test]
    fn test_transfer_saves_after_fee() {
        let out = analyze_balance_transfer(&typical()).unwrap().result;
        let cmp = &out.comparison;
        assert!(cmp.interest_delta.unwrap() > dec!(150));
        assert!(cmp.net_savings.unwrap() > Decimal::ZERO);
        assert!(cmp.break_even_month.is_some());
        assert!(cmp.time_delta.unwrap() > 0);
    }

    #[test]
    fn test_no_promo_warns() {
        let mut input = typical();
        input.promo_months = 0;
        let result = analyze_balance_transfer(&input).unwrap();
        assert_eq!(result.result.payment_to_clear_in_promo, None);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_promo_end_beyond_cap_is_unknown() {
        let mut input = typical();
        input.limits.max_months = 6;
        let out = analyze_balance_transfer(&input).unwrap().result;
        assert!(!out.comparison.b.projection.converged);
        assert_eq!(out.balance_at_promo_end, None);
        assert_eq!(out.payment_to_clear_in_promo, Some(dec!(333.33)));
    }

    #[test]
    fn test_promo_end_after_payoff_is_zero() {
        let mut input = typical();
        input.monthly_payment = dec!(1000);
        let out = analyze_balance_transfer(&input).unwrap().result;
        assert_eq!(out.balance_at_promo_end, Some(Decimal::ZERO));
    }

    #[test]
    fn test_promo_months_bounded() {
        let mut input = typical();
        input.promo_months = MAX_MONTHS_CEILING + 1;
        let err = analyze_balance_transfer(&input).unwrap_err();
        assert!(err.to_string().contains("promo_months"));

        input.promo_months = Month::MAX;
        assert!(analyze_balance_transfer(&input).is_err());
    }

    #[test]
    fn test_fee_rate_bounds() {
        let mut input = typical();
        input.transfer_fee_rate = dec!(1.5);
        assert!(analyze_balance_transfer(&input).is_err());
    }
}
