use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::projector::{
    projection_warnings, run_projection, stamp_payoff_date, validate_principal, ProjectionLimits,
    ProjectionResult,
};
use super::schedule::{PaymentPolicy, RateSchedule};
use crate::error::PayoffError;
use crate::types::*;
use crate::PayoffResult;

/// One side of a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub label: String,
    pub principal: Money,
    pub rate_schedule: RateSchedule,
    pub payment_policy: PaymentPolicy,
}

impl ScenarioSpec {
    pub fn validate(&self) -> PayoffResult<()> {
        validate_principal(&format!("{}.principal", self.label), self.principal)?;
        self.rate_schedule.validate()?;
        self.payment_policy.validate()
    }

    fn run(&self, limits: &ProjectionLimits) -> PayoffResult<ProjectionResult> {
        run_projection(
            self.principal,
            &self.rate_schedule,
            &self.payment_policy,
            limits,
        )
    }
}

/// Input for a two-scenario comparison. Scenario A is the baseline,
/// scenario B the alternative whose savings are measured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub scenario_a: ScenarioSpec,
    pub scenario_b: ScenarioSpec,
    /// One-time cost of switching to scenario B
    #[serde(default)]
    pub switch_fee: Money,
    #[serde(default)]
    pub limits: ProjectionLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationStatus {
    BothAmortize,
    ADoesNotAmortize,
    BDoesNotAmortize,
    NeitherAmortizes,
}

impl AmortizationStatus {
    fn of(a: &ProjectionResult, b: &ProjectionResult) -> Self {
        match (a.converged, b.converged) {
            (true, true) => AmortizationStatus::BothAmortize,
            (false, true) => AmortizationStatus::ADoesNotAmortize,
            (true, false) => AmortizationStatus::BDoesNotAmortize,
            (false, false) => AmortizationStatus::NeitherAmortizes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub label: String,
    pub projection: ProjectionResult,
}

/// Output of a two-scenario comparison.
///
/// The deltas are `A - B` and are only populated when both balances
/// amortize within the iteration cap.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutput {
    pub a: ScenarioOutcome,
    pub b: ScenarioOutcome,
    pub status: AmortizationStatus,
    pub interest_delta: Option<Money>,
    pub time_delta: Option<i64>,
    pub total_paid_delta: Option<Money>,
    pub switch_fee: Money,
    pub net_savings: Option<Money>,
    /// First month in which interest saved by B exceeds `switch_fee`
    pub break_even_month: Option<Month>,
}

/// First month where `a`'s cumulative interest exceeds `b`'s by more than `fee`.
pub fn break_even_month(a: &ProjectionResult, b: &ProjectionResult, fee: Money) -> Option<Month> {
    let horizon = a.months_run().max(b.months_run());
    (1..=horizon).find(|&m| a.cumulative_interest_at(m) - b.cumulative_interest_at(m) > fee)
}

pub(crate) fn run_comparison(
    input: &ComparisonInput,
    warnings: &mut Vec<String>,
) -> PayoffResult<ComparisonOutput> {
    input.scenario_a.validate()?;
    input.scenario_b.validate()?;
    input.limits.validate()?;
    if input.switch_fee < Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: "switch_fee".into(),
            reason: "Switching fee must be non-negative".into(),
        });
    }

    let mut a = input.scenario_a.run(&input.limits)?;
    let mut b = input.scenario_b.run(&input.limits)?;
    stamp_payoff_date(&mut a, input.start_date);
    stamp_payoff_date(&mut b, input.start_date);

    warnings.extend(projection_warnings(&input.scenario_a.label, &a));
    warnings.extend(projection_warnings(&input.scenario_b.label, &b));

    let status = AmortizationStatus::of(&a, &b);
    let both = status == AmortizationStatus::BothAmortize;
    if !both {
        warnings.push(
            "At least one scenario does not amortize within the iteration cap; deltas are not reported"
                .into(),
        );
    }

    let interest_delta = both.then(|| a.total_interest_paid - b.total_interest_paid);
    let time_delta = both.then(|| i64::from(a.months_to_payoff) - i64::from(b.months_to_payoff));
    let total_paid_delta = both.then(|| a.total_paid - b.total_paid);
    let net_savings = interest_delta.map(|d| d - input.switch_fee);
    let break_even = break_even_month(&a, &b, input.switch_fee);

    if both && break_even.is_none() && input.switch_fee > Decimal::ZERO {
        warnings.push(format!(
            "Interest saved by {} never exceeds the switching fee",
            input.scenario_b.label
        ));
    }

    debug!(
        "comparison finished: status={status:?} interest_delta={interest_delta:?} break_even={break_even:?}"
    );

    Ok(ComparisonOutput {
        a: ScenarioOutcome {
            label: input.scenario_a.label.clone(),
            projection: a,
        },
        b: ScenarioOutcome {
            label: input.scenario_b.label.clone(),
            projection: b,
        },
        status,
        interest_delta,
        time_delta,
        total_paid_delta,
        switch_fee: input.switch_fee,
        net_savings,
        break_even_month: break_even,
    })
}

/// Project two scenarios independently and diff the results.
pub fn compare_scenarios(
    input: &ComparisonInput,
) -> PayoffResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = run_comparison(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-Scenario Payoff Comparison",
        &serde_json::json!({
            "scenario_a": input.scenario_a.label,
            "scenario_b": input.scenario_b.label,
            "switch_fee": input.switch_fee.to_string(),
            "max_months": input.limits.max_months,
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

    fn scenario(label: &str, apr: Rate, payment: Money) -> ScenarioSpec {
        ScenarioSpec {
            label: label.into(),
            principal: dec!(5000),
            rate_schedule: RateSchedule::flat(apr),
            payment_policy: PaymentPolicy::fixed(payment),
        }
    }

    fn input(a: ScenarioSpec, b: ScenarioSpec, fee: Money) -> ComparisonInput {
        ComparisonInput {
            scenario_a: a,
            scenario_b: b,
            switch_fee: fee,
            limits: ProjectionLimits::default(),
            start_date: None,
        }
    }

    #[test]
    fn test_identical_scenarios_have_zero_deltas() {
        let out = compare_scenarios(&input(
            scenario("A", dec!(0.1899), dec!(200)),
            scenario("B", dec!(0.1899), dec!(200)),
            Decimal::ZERO,
        ))
        .unwrap()
        .result;
        assert_eq!(out.status, AmortizationStatus::BothAmortize);
        assert_eq!(out.interest_delta, Some(Decimal::ZERO));
        assert_eq!(out.time_delta, Some(0));
        assert_eq!(out.break_even_month, None);
    }

    #[test]
    fn test_lower_rate_saves_interest() {
        let out = compare_scenarios(&input(
            scenario("Current", dec!(0.2499), dec!(200)),
            scenario("New", dec!(0.0999), dec!(200)),
            Decimal::ZERO,
        ))
        .unwrap()
        .result;
        assert!(out.interest_delta.unwrap() > Decimal::ZERO);
        assert!(out.time_delta.unwrap() > 0);
        // Savings start in month 1 when there is no fee
        assert_eq!(out.break_even_month, Some(1));
    }

    #[test]
    fn test_break_even_waits_for_fee() {
        let out = compare_scenarios(&input(
            scenario("Current", dec!(0.2499), dec!(200)),
            scenario("New", dec!(0.0999), dec!(200)),
            dec!(150),
        ))
        .unwrap()
        .result;
        let month = out.break_even_month.unwrap();
        assert!(month > 1);
        let saved = out.a.projection.cumulative_interest_at(month)
            - out.b.projection.cumulative_interest_at(month);
        assert!(saved > dec!(150));
        let before = out.a.projection.cumulative_interest_at(month - 1)
            - out.b.projection.cumulative_interest_at(month - 1);
        assert!(before <= dec!(150));
        assert_eq!(out.net_savings, out.interest_delta.map(|d| d - dec!(150)));
    }

    #[test]
    fn test_non_amortizing_scenario_suppresses_deltas() {
        let result = compare_scenarios(&input(
            scenario("Minimum", dec!(0.1899), dec!(50)),
            scenario("Fixed", dec!(0.1899), dec!(200)),
            Decimal::ZERO,
        ))
        .unwrap();
        let out = &result.result;
        assert_eq!(out.status, AmortizationStatus::ADoesNotAmortize);
        assert_eq!(out.interest_delta, None);
        assert_eq!(out.time_delta, None);
        assert_eq!(out.net_savings, None);
        assert!(result.warnings.iter().any(|w| w.contains("deltas are not reported")));
    }

    #[test]
    fn test_negative_fee_rejected() {
        assert!(compare_scenarios(&input(
            scenario("A", dec!(0.1899), dec!(200)),
            scenario("B", dec!(0.1899), dec!(200)),
            dec!(-1),
        ))
        .is_err());
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let mut b = scenario("B", dec!(0.1899), dec!(200));
        b.principal = Decimal::ZERO;
        let err = compare_scenarios(&input(scenario("A", dec!(0.1899), dec!(200)), b, Decimal::ZERO))
            .unwrap_err();
        assert!(err.to_string().contains("B.principal"));
    }
}
