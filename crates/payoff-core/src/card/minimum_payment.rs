use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::comparator::{run_comparison, ComparisonInput, ComparisonOutput, ScenarioSpec};
use crate::amortization::projector::{ProjectionLimits, MAX_MONTHS_CEILING};
use crate::amortization::schedule::{PaymentPolicy, PaymentRule, RateSchedule};
use crate::error::PayoffError;
use crate::time_value::pmt;
use crate::types::*;
use crate::PayoffResult;

/// How the issuer computes the minimum payment due
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinimumRule {
    /// `max(balance * rate, floor)`
    #[default]
    PercentOfBalance,
    /// `max(interest + balance * rate, floor)`
    InterestPlusPercent,
}

/// Input for a minimum-payment evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumPaymentInput {
    pub balance: Money,
    pub apr: Rate,
    #[serde(default)]
    pub minimum_rule: MinimumRule,
    pub minimum_rate: Rate,
    pub minimum_floor: Money,
    pub recommended_payment: Money,
    /// Optional payoff horizon for which the level payment is solved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_months: Option<Month>,
    #[serde(default)]
    pub limits: ProjectionLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Output of a minimum-payment evaluation
#[derive(Debug, Clone, Serialize)]
pub struct MinimumPaymentOutput {
    pub first_minimum_payment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_for_target: Option<Money>,
    pub comparison: ComparisonOutput,
}

impl MinimumPaymentInput {
    fn minimum_policy(&self) -> PaymentPolicy {
        match self.minimum_rule {
            MinimumRule::PercentOfBalance => PaymentPolicy::PercentOfBalance {
                rate: self.minimum_rate,
                floor: self.minimum_floor,
            },
            MinimumRule::InterestPlusPercent => PaymentPolicy::InterestPlusPercent {
                rate: self.minimum_rate,
                floor: self.minimum_floor,
            },
        }
    }
}

/// Compare paying only the minimum due against a fixed recommended payment.
pub fn analyze_minimum_payment(
    input: &MinimumPaymentInput,
) -> PayoffResult<ComputationOutput<MinimumPaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.balance <= Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "balance".into(),
            reason: "Balance must be positive".into(),
        });
    }
    if input.apr < Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "apr".into(),
            reason: "APR must be non-negative".into(),
        });
    }
    if let Some(months) = input.target_months {
        if months == 0 || months > MAX_MONTHS_CEILING {
            return Err(PayoffError::InvalidInput {
                field: "target_months".into(),
                reason: format!("Target horizon must be between 1 and {MAX_MONTHS_CEILING} months"),
            });
        }
    }

    let schedule = RateSchedule::flat(input.apr);
    let minimum = input.minimum_policy();
    minimum.validate()?;

    let first_interest = input.balance * monthly_rate(input.apr);
    let first_minimum_payment = minimum
        .payment_for(input.balance, first_interest)
        .min(input.balance + first_interest);

    if input.recommended_payment < first_minimum_payment {
        return Err(PayoffError::InvalidInput {
            field: "recommended_payment".into(),
            reason: format!(
                "Recommended payment {} is below the current minimum payment {}",
                input.recommended_payment,
                first_minimum_payment.round_dp(2)
            ),
        });
    }

    let comparison_input = ComparisonInput {
        scenario_a: ScenarioSpec {
            label: "Minimum payment".into(),
            principal: input.balance,
            rate_schedule: schedule.clone(),
            payment_policy: minimum,
        },
        scenario_b: ScenarioSpec {
            label: "Recommended payment".into(),
            principal: input.balance,
            rate_schedule: schedule,
            payment_policy: PaymentPolicy::fixed(input.recommended_payment),
        },
        switch_fee: Decimal::ZERO,
        limits: input.limits.clone(),
        start_date: input.start_date,
    };
    let comparison = run_comparison(&comparison_input, &mut warnings)?;

    let payment_for_target = match input.target_months {
        Some(months) => {
            let level = -pmt(monthly_rate(input.apr), months, input.balance, Decimal::ZERO)?;
            Some(level.round_dp(2))
        }
        None => None,
    };

    let output = MinimumPaymentOutput {
        first_minimum_payment,
        payment_for_target,
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Minimum Payment vs Fixed Payment Payoff",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "apr": input.apr.to_string(),
            "minimum_rule": input.minimum_rule,
            "minimum_rate": input.minimum_rate.to_string(),
            "minimum_floor": input.minimum_floor.to_string(),
            "recommended_payment": input.recommended_payment.to_string(),
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

    fn base() -> MinimumPaymentInput {
        MinimumPaymentInput {
            balance: dec!(5000),
            apr: dec!(0.1899),
            minimum_rule: MinimumRule::PercentOfBalance,
            minimum_rate: dec!(0.02),
            minimum_floor: dec!(25),
            recommended_payment: dec!(200),
            target_months: None,
            limits: ProjectionLimits::default(),
            start_date: None,
        }
    }

    #[test]
    fn test_first_minimum_payment() {
        let out = analyze_minimum_payment(&base()).unwrap().result;
        assert_eq!(out.first_minimum_payment, dec!(100));
    }

    #[test]
    fn test_interest_plus_percent_first_payment() {
        let mut input = base();
        input.minimum_rule = MinimumRule::InterestPlusPercent;
        input.minimum_rate = dec!(0.01);
        let out = analyze_minimum_payment(&input).unwrap().result;
        // 79.125 interest + 50
        assert_eq!(out.first_minimum_payment, dec!(129.125));
    }

    #[test]
    fn test_recommended_below_minimum_rejected() {
        let mut input = base();
        input.recommended_payment = dec!(90);
        let err = analyze_minimum_payment(&input).unwrap_err();
        assert!(err.to_string().contains("recommended_payment"));
    }

    #[test]
    fn test_target_payment() {
        let mut input = base();
        input.target_months = Some(36);
        let out = analyze_minimum_payment(&input).unwrap().result;
        assert_eq!(out.payment_for_target, Some(dec!(183.25)));
    }

    #[test]
    fn test_zero_target_rejected() {
        let mut input = base();
        input.target_months = Some(0);
        assert!(analyze_minimum_payment(&input).is_err());
    }

    #[test]
    fn test_target_horizon_bounded() {
        let mut input = base();
        input.target_months = Some(MAX_MONTHS_CEILING);
        assert!(analyze_minimum_payment(&input).is_ok());

        input.target_months = Some(MAX_MONTHS_CEILING + 1);
        let err = analyze_minimum_payment(&input).unwrap_err();
        assert!(err.to_string().contains("target_months"));

        input.target_months = Some(Month::MAX);
        assert!(analyze_minimum_payment(&input).is_err());
    }
}
