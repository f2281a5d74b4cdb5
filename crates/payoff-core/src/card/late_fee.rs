use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::comparator::{run_comparison, ComparisonInput, ComparisonOutput, ScenarioSpec};
use crate::amortization::projector::{ProjectionLimits, MAX_MONTHS_CEILING};
use crate::amortization::schedule::{PaymentPolicy, RateSchedule};
use crate::error::PayoffError;
use crate::types::*;
use crate::PayoffResult;

fn default_trigger_month() -> Month {
    1
}

/// Input for a late-payment cost evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateFeeInput {
    pub balance: Money,
    pub regular_apr: Rate,
    pub penalty_apr: Rate,
    /// Fee charged to the balance for the missed payment
    pub late_fee: Money,
    pub monthly_payment: Money,
    /// First month billed at the penalty APR
    #[serde(default = "default_trigger_month")]
    pub penalty_trigger_month: Month,
    /// Months of on-time payments after which the regular APR is restored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_duration_months: Option<Month>,
    #[serde(default)]
    pub limits: ProjectionLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Output of a late-payment cost evaluation
#[derive(Debug, Clone, Serialize)]
pub struct LateFeeOutput {
    pub late_fee: Money,
    pub extra_interest: Option<Money>,
    pub extra_months: Option<i64>,
    pub total_cost_of_late_payment: Option<Money>,
    pub comparison: ComparisonOutput,
}

fn validate(input: &LateFeeInput) -> PayoffResult<()> {
    if input.balance <= Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "balance".into(),
            reason: "Balance must be positive".into(),
        });
    }
    if input.regular_apr < Decimal::ZERO || input.penalty_apr < Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "apr".into(),
            reason: "APR must be non-negative".into(),
        });
    }
    if input.late_fee < Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "late_fee".into(),
            reason: "Late fee must be non-negative".into(),
        });
    }
    if input.monthly_payment <= Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "monthly_payment".into(),
            reason: "Monthly payment must be positive".into(),
        });
    }
    if input.penalty_trigger_month == 0 || input.penalty_trigger_month > MAX_MONTHS_CEILING {
        return Err(PayoffError::InvalidInput {
            field: "penalty_trigger_month".into(),
            reason: format!("Penalty trigger month must be between 1 and {MAX_MONTHS_CEILING}"),
        });
    }
    if input
        .penalty_duration_months
        .is_some_and(|months| months > MAX_MONTHS_CEILING)
    {
        return Err(PayoffError::InvalidInput {
            field: "penalty_duration_months".into(),
            reason: format!("Penalty duration must not exceed {MAX_MONTHS_CEILING} months"),
        });
    }
    Ok(())
}

/// Cost of a late payment: the fee plus the extra interest from the
/// penalty APR, against the on-time path at the regular APR.
pub fn analyze_late_fee(input: &LateFeeInput) -> PayoffResult<ComputationOutput<LateFeeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    if input.penalty_apr < input.regular_apr {
        warnings.push("Penalty APR is below the regular APR".into());
    }

    let payment = PaymentPolicy::fixed(input.monthly_payment);
    let comparison_input = ComparisonInput {
        scenario_a: ScenarioSpec {
            label: "Late payment".into(),
            principal: input.balance + input.late_fee,
            rate_schedule: RateSchedule::penalty(
                input.regular_apr,
                input.penalty_trigger_month,
                input.penalty_apr,
                input.penalty_duration_months,
            ),
            payment_policy: payment.clone(),
        },
        scenario_b: ScenarioSpec {
            label: "On-time payment".into(),
            principal: input.balance,
            rate_schedule: RateSchedule::flat(input.regular_apr),
            payment_policy: payment,
        },
        switch_fee: Decimal::ZERO,
        limits: input.limits.clone(),
        start_date: input.start_date,
    };
    let comparison = run_comparison(&comparison_input, &mut warnings)?;

    let extra_interest = comparison.interest_delta;
    let output = LateFeeOutput {
        late_fee: input.late_fee,
        extra_interest,
        extra_months: comparison.time_delta,
        total_cost_of_late_payment: extra_interest.map(|i| i + input.late_fee),
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Late Payment Fee and Penalty APR Cost",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "regular_apr": input.regular_apr.to_string(),
            "penalty_apr": input.penalty_apr.to_string(),
            "late_fee": input.late_fee.to_string(),
            "penalty_trigger_month": input.penalty_trigger_month,
            "penalty_duration_months": input.penalty_duration_months,
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

    fn base() -> LateFeeInput {
        LateFeeInput {
            balance: dec!(3000),
            regular_apr: dec!(0.1899),
            penalty_apr: dec!(0.2999),
            late_fee: dec!(40),
            monthly_payment: dec!(150),
            penalty_trigger_month: 1,
            penalty_duration_months: None,
            limits: ProjectionLimits::default(),
            start_date: None,
        }
    }

    #[test]
    fn test_late_path_costs_more() {
        let out = analyze_late_fee(&base()).unwrap().result;
        let extra = out.extra_interest.unwrap();
        assert!(extra > Decimal::ZERO);
        assert_eq!(out.total_cost_of_late_payment, Some(extra + dec!(40)));
        assert!(out.extra_months.unwrap() >= 0);
    }

    #[test]
    fn test_penalty_reversion_reduces_cost() {
        let permanent = analyze_late_fee(&base()).unwrap().result;
        let mut input = base();
        input.penalty_duration_months = Some(6);
        let reverted = analyze_late_fee(&input).unwrap().result;
        assert!(reverted.extra_interest.unwrap() < permanent.extra_interest.unwrap());
    }

    #[test]
    fn test_zero_fee_same_rate_costs_nothing() {
        let mut input = base();
        input.late_fee = Decimal::ZERO;
        input.penalty_apr = input.regular_apr;
        let out = analyze_late_fee(&input).unwrap().result;
        assert_eq!(out.extra_interest, Some(Decimal::ZERO));
        assert_eq!(out.total_cost_of_late_payment, Some(Decimal::ZERO));
    }

    #[test]
    fn test_zero_trigger_rejected() {
        let mut input = base();
        input.penalty_trigger_month = 0;
        assert!(analyze_late_fee(&input).is_err());
    }

    #[test]
    fn test_penalty_months_bounded() {
        let mut input = base();
        input.penalty_trigger_month = Month::MAX;
        let err = analyze_late_fee(&input).unwrap_err();
        assert!(err.to_string().contains("penalty_trigger_month"));

        let mut input = base();
        input.penalty_trigger_month = 2;
        input.penalty_duration_months = Some(Month::MAX);
        let err = analyze_late_fee(&input).unwrap_err();
        assert!(err.to_string().contains("penalty_duration_months"));

        input.penalty_duration_months = Some(MAX_MONTHS_CEILING);
        assert!(analyze_late_fee(&input).is_ok());
    }
}
