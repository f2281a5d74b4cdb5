use chrono::{Months, NaiveDate};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::{PaymentPolicy, PaymentRule, PeriodicRateSource, RateSchedule};
use crate::error::PayoffError;
use crate::types::*;
use crate::PayoffResult;

/// Iteration ceiling used when the caller does not supply one (50 years).
pub const DEFAULT_MAX_MONTHS: Month = 600;

/// Largest iteration ceiling accepted from callers.
pub const MAX_MONTHS_CEILING: Month = 1200;

/// Number of leading months kept in the displayed schedule.
pub const DEFAULT_SCHEDULE_WINDOW: Month = 120;

/// Balances at or below one cent count as paid off.
pub const PAYOFF_EPSILON: Decimal = dec!(0.01);

fn default_max_months() -> Month {
    DEFAULT_MAX_MONTHS
}

fn default_schedule_window() -> Month {
    DEFAULT_SCHEDULE_WINDOW
}

/// Iteration cap and display window for a projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionLimits {
    #[serde(default = "default_max_months")]
    pub max_months: Month,
    #[serde(default = "default_schedule_window")]
    pub schedule_window: Month,
}

impl Default for ProjectionLimits {
    fn default() -> Self {
        ProjectionLimits {
            max_months: DEFAULT_MAX_MONTHS,
            schedule_window: DEFAULT_SCHEDULE_WINDOW,
        }
    }
}

impl ProjectionLimits {
    pub fn validate(&self) -> PayoffResult<()> {
        if self.max_months == 0 || self.max_months > MAX_MONTHS_CEILING {
            return Err(PayoffError::InvalidInput {
                field: "limits.max_months".into(),
                reason: format!("Iteration cap must be between 1 and {MAX_MONTHS_CEILING}"),
            });
        }
        if self.schedule_window == 0 {
            return Err(PayoffError::InvalidInput {
                field: "limits.schedule_window".into(),
                reason: "Schedule window must be at least 1 month".into(),
            });
        }
        Ok(())
    }
}

/// Input for a single balance projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub principal: Money,
    pub rate_schedule: RateSchedule,
    pub payment_policy: PaymentPolicy,
    #[serde(default)]
    pub limits: ProjectionLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// One month of the displayed schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSnapshot {
    pub month: Month,
    pub opening_balance: Money,
    pub periodic_rate: Rate,
    pub interest: Money,
    pub payment: Money,
    /// Negative when the payment did not cover the interest
    pub principal: Money,
    pub closing_balance: Money,
    pub cumulative_interest: Money,
}

/// Outcome of a projection run.
///
/// Serialize-only: the full per-month series behind the accessors are not
/// part of the JSON form, so a result is only queryable where it was computed.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResult {
    /// Month the loop stopped in; equals the cap when `converged` is false
    pub months_to_payoff: Month,
    pub converged: bool,
    pub total_interest_paid: Money,
    pub total_paid: Money,
    pub final_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_amortization_month: Option<Month>,
    /// First month whose balance hit the decimal range; figures from here on are capped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_capped_month: Option<Month>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    pub schedule: Vec<MonthSnapshot>,
    #[serde(skip)]
    cumulative_interest_by_month: Vec<Money>,
    #[serde(skip)]
    balance_by_month: Vec<Money>,
}

impl ProjectionResult {
    /// Cumulative interest charged through `month`, held flat once the run ended.
    pub fn cumulative_interest_at(&self, month: Month) -> Money {
        if month == 0 {
            return Decimal::ZERO;
        }
        held_flat(&self.cumulative_interest_by_month, month).unwrap_or(Decimal::ZERO)
    }

    /// Closing balance after `month`, held flat once the run ended.
    pub fn balance_at(&self, month: Month) -> Option<Money> {
        if month == 0 {
            return None;
        }
        held_flat(&self.balance_by_month, month)
    }

    /// Number of months actually iterated (full series length, not the display window).
    pub fn months_run(&self) -> Month {
        self.cumulative_interest_by_month.len() as Month
    }
}

fn held_flat(series: &[Money], month: Month) -> Option<Money> {
    series
        .get(month as usize - 1)
        .or_else(|| series.last())
        .copied()
}

/// Mutable loop state; lives only for one run.
struct AmortizationState {
    balance: Money,
    month: Month,
    cumulative_interest: Money,
}

pub(crate) fn validate_principal(field: &str, principal: Money) -> PayoffResult<()> {
    if principal <= Decimal::ZERO {
        return Err(PayoffError::InvalidInput {
            field: field.into(),
            reason: "Principal must be positive".into(),
        });
    }
    Ok(())
}

/// Run the month-by-month amortization loop.
///
/// Each month accrues `balance * rate`, takes the policy payment capped at
/// the amount owed, and applies the remainder to principal. The loop ends
/// once the balance is at or below [`PAYOFF_EPSILON`] (any residual is
/// swept into that month's payment) or when `limits.max_months` is reached.
/// A runaway balance saturates at `Decimal::MAX` and the run continues to
/// the cap unconverged.
pub fn run_projection<R, P>(
    principal: Money,
    rates: &R,
    payments: &P,
    limits: &ProjectionLimits,
) -> PayoffResult<ProjectionResult>
where
    R: PeriodicRateSource + ?Sized,
    P: PaymentRule + ?Sized,
{
    validate_principal("principal", principal)?;
    limits.validate()?;

    let mut state = AmortizationState {
        balance: principal,
        month: 0,
        cumulative_interest: Decimal::ZERO,
    };
    let mut total_paid = Decimal::ZERO;
    let mut negative_amortization_month = None;
    let mut balance_capped_month = None;
    let mut schedule = Vec::with_capacity(limits.schedule_window.min(limits.max_months) as usize);
    let mut cumulative_interest_by_month = Vec::with_capacity(limits.max_months as usize);
    let mut balance_by_month = Vec::with_capacity(limits.max_months as usize);

    while state.month < limits.max_months {
        state.month += 1;
        let month = state.month;
        let opening = state.balance;

        let rate = rates.periodic_rate_for(month);
        let (interest, owed) = match opening
            .checked_mul(rate)
            .and_then(|i| opening.checked_add(i).map(|o| (i, o)))
        {
            Some(accrued) => accrued,
            None => {
                balance_capped_month.get_or_insert(month);
                let interest = opening.saturating_mul(rate);
                (interest, opening.saturating_add(interest))
            }
        };

        let mut payment = payments
            .payment_for(opening, interest)
            .max(Decimal::ZERO)
            .min(owed);
        let mut closing = owed - payment;

        // Sub-cent residue is settled with the final payment
        if closing > Decimal::ZERO && closing <= PAYOFF_EPSILON {
            payment = owed;
            closing = Decimal::ZERO;
        }

        let principal_paid = payment - interest;
        if principal_paid < Decimal::ZERO && negative_amortization_month.is_none() {
            negative_amortization_month = Some(month);
        }

        state.balance = closing;
        state.cumulative_interest = state.cumulative_interest.saturating_add(interest);
        total_paid = total_paid.saturating_add(payment);

        if month <= limits.schedule_window {
            schedule.push(MonthSnapshot {
                month,
                opening_balance: opening,
                periodic_rate: rate,
                interest,
                payment,
                principal: principal_paid,
                closing_balance: closing,
                cumulative_interest: state.cumulative_interest,
            });
        }
        cumulative_interest_by_month.push(state.cumulative_interest);
        balance_by_month.push(closing);

        if closing <= PAYOFF_EPSILON {
            break;
        }
    }

    let converged = state.balance <= PAYOFF_EPSILON;
    debug!(
        "projection finished: month={} converged={} interest={} residual={}",
        state.month, converged, state.cumulative_interest, state.balance
    );

    Ok(ProjectionResult {
        months_to_payoff: state.month,
        converged,
        total_interest_paid: state.cumulative_interest,
        total_paid,
        final_balance: state.balance,
        negative_amortization_month,
        balance_capped_month,
        payoff_date: None,
        schedule,
        cumulative_interest_by_month,
        balance_by_month,
    })
}

/// Set `payoff_date` from a start date when the run converged.
pub(crate) fn stamp_payoff_date(result: &mut ProjectionResult, start_date: Option<NaiveDate>) {
    result.payoff_date = match start_date {
        Some(date) if result.converged => {
            date.checked_add_months(Months::new(result.months_to_payoff))
        }
        _ => None,
    };
}

/// Warnings shared by every caller that surfaces a projection.
pub(crate) fn projection_warnings(label: &str, result: &ProjectionResult) -> Vec<String> {
    let mut warnings = Vec::new();
    if !result.converged {
        warn!(
            "{label}: balance not paid off after {} months (residual {})",
            result.months_to_payoff, result.final_balance
        );
        warnings.push(format!(
            "{label}: payment does not amortize the balance; {} remains after {} months",
            result.final_balance.round_dp(2),
            result.months_to_payoff
        ));
    }
    if let Some(month) = result.negative_amortization_month {
        warnings.push(format!(
            "{label}: negative amortization from month {month} (payment below accrued interest)"
        ));
    }
    if let Some(month) = result.balance_capped_month {
        warn!("{label}: balance saturated at the decimal range in month {month}");
        warnings.push(format!(
            "{label}: balance exceeded the representable range in month {month}; later figures are capped"
        ));
    }
    warnings
}

/// Project a balance to payoff under a rate schedule and payment policy.
pub fn project(input: &ProjectionInput) -> PayoffResult<ComputationOutput<ProjectionResult>> {
    let start = Instant::now();

    validate_principal("principal", input.principal)?;
    input.rate_schedule.validate()?;
    input.payment_policy.validate()?;
    input.limits.validate()?;

    let mut result = run_projection(
        input.principal,
        &input.rate_schedule,
        &input.payment_policy,
        &input.limits,
    )?;
    stamp_payoff_date(&mut result, input.start_date);

    let warnings = projection_warnings("Projection", &result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly Amortized-Balance Projection",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "rate_tiers": input.rate_schedule.tiers.len(),
            "max_months": input.limits.max_months,
            "schedule_window": input.limits.schedule_window,
            "payoff_epsilon": PAYOFF_EPSILON.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card_input(payment: Money) -> ProjectionInput {
        ProjectionInput {
            principal: dec!(5000),
            rate_schedule: RateSchedule::flat(dec!(0.1899)),
            payment_policy: PaymentPolicy::fixed(payment),
            limits: ProjectionLimits::default(),
            start_date: None,
        }
    }

    #[test]
    fn test_zero_rate_exact_payoff() {
        let input = ProjectionInput {
            principal: dec!(1000),
            rate_schedule: RateSchedule::flat(Decimal::ZERO),
            payment_policy: PaymentPolicy::fixed(dec!(100)),
            limits: ProjectionLimits::default(),
            start_date: None,
        };
        let result = project(&input).unwrap().result;
        assert!(result.converged);
        assert_eq!(result.months_to_payoff, 10);
        assert_eq!(result.total_interest_paid, Decimal::ZERO);
        assert_eq!(result.total_paid, dec!(1000));
        assert_eq!(result.final_balance, Decimal::ZERO);
    }

    #[test]
    fn test_first_month_arithmetic() {
        let result = project(&card_input(dec!(200))).unwrap().result;
        let first = &result.schedule[0];
        // 5000 * 0.1899 / 12 = 79.125
        assert_eq!(first.interest, dec!(79.125));
        assert_eq!(first.principal, dec!(120.875));
        assert_eq!(first.closing_balance, dec!(4879.125));
    }

    #[test]
    fn test_final_payment_capped_at_amount_owed() {
        let result = project(&card_input(dec!(200))).unwrap().result;
        let last = result.schedule.last().unwrap();
        assert!(last.payment < dec!(200));
        assert_eq!(last.closing_balance, Decimal::ZERO);
        assert_eq!(last.payment, last.opening_balance + last.interest);
    }

    #[test]
    fn test_non_convergence_is_flagged() {
        // 79.125 interest in month 1; 50 never covers it
        let output = project(&card_input(dec!(50))).unwrap();
        let result = &output.result;
        assert!(!result.converged);
        assert_eq!(result.months_to_payoff, DEFAULT_MAX_MONTHS);
        assert!(result.final_balance > dec!(5000));
        assert_eq!(result.negative_amortization_month, Some(1));
        assert!(output.warnings.iter().any(|w| w.contains("does not amortize")));
    }

    #[test]
    fn test_schedule_truncated_to_window() {
        let mut input = card_input(dec!(50));
        input.limits.schedule_window = 24;
        let result = project(&input).unwrap().result;
        assert_eq!(result.schedule.len(), 24);
        assert_eq!(result.months_run(), DEFAULT_MAX_MONTHS);
        assert!(result.cumulative_interest_at(600) > result.schedule[23].cumulative_interest);
    }

    #[test]
    fn test_series_held_flat_after_payoff() {
        let result = project(&card_input(dec!(200))).unwrap().result;
        let months = result.months_to_payoff;
        assert_eq!(result.cumulative_interest_at(months + 50), result.total_interest_paid);
        assert_eq!(result.balance_at(months + 50), Some(Decimal::ZERO));
        assert_eq!(result.cumulative_interest_at(0), Decimal::ZERO);
        assert_eq!(result.balance_at(0), None);
    }

    #[test]
    fn test_sub_cent_residual_swept() {
        // 100.005 leaves half a cent after a 100 payment
        let input = ProjectionInput {
            principal: dec!(100.005),
            rate_schedule: RateSchedule::flat(Decimal::ZERO),
            payment_policy: PaymentPolicy::fixed(dec!(100)),
            limits: ProjectionLimits::default(),
            start_date: None,
        };
        let result = project(&input).unwrap().result;
        assert_eq!(result.months_to_payoff, 1);
        assert_eq!(result.total_paid, dec!(100.005));
        assert_eq!(result.final_balance, Decimal::ZERO);
    }

    #[test]
    fn test_payoff_date_stamped() {
        let mut input = card_input(dec!(200));
        input.start_date = NaiveDate::from_ymd_opt(2025, 1, 15);
        let result = project(&input).unwrap().result;
        assert_eq!(result.months_to_payoff, 33);
        assert_eq!(result.payoff_date, NaiveDate::from_ymd_opt(2027, 10, 15));
    }

    #[test]
    fn test_no_payoff_date_without_convergence() {
        let mut input = card_input(dec!(50));
        input.start_date = NaiveDate::from_ymd_opt(2025, 1, 15);
        assert_eq!(project(&input).unwrap().result.payoff_date, None);
    }

    #[test]
    fn test_runaway_balance_saturates_without_converging() {
        let input = ProjectionInput {
            principal: dec!(5000),
            rate_schedule: RateSchedule::flat(dec!(50)),
            payment_policy: PaymentPolicy::fixed(Decimal::ZERO),
            limits: ProjectionLimits::default(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        };
        let output = project(&input).unwrap();
        let result = &output.result;
        assert!(!result.converged);
        assert_eq!(result.months_to_payoff, DEFAULT_MAX_MONTHS);
        assert_eq!(result.months_run(), DEFAULT_MAX_MONTHS);
        assert!(result.balance_capped_month.is_some());
        assert_eq!(result.final_balance, Decimal::MAX);
        assert_eq!(result.payoff_date, None);
        assert!(output.warnings.iter().any(|w| w.contains("representable range")));
        assert!(output.warnings.iter().any(|w| w.contains("does not amortize")));
    }

    #[test]
    fn test_ordinary_runs_are_not_capped() {
        let result = project(&card_input(dec!(50))).unwrap().result;
        assert_eq!(result.balance_capped_month, None);
    }

    #[test]
    fn test_json_omits_internal_series() {
        let result = project(&card_input(dec!(200))).unwrap().result;
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("cumulative_interest_by_month").is_none());
        assert!(json.get("balance_by_month").is_none());
        assert!(json.get("balance_capped_month").is_none());
        assert_eq!(json["months_to_payoff"], 33);
        assert_eq!(result.months_run(), 33);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = card_input(dec!(200));
        input.principal = Decimal::ZERO;
        assert!(project(&input).is_err());

        let mut input = card_input(dec!(200));
        input.principal = dec!(-10);
        assert!(project(&input).is_err());

        let mut input = card_input(dec!(200));
        input.limits.max_months = 0;
        assert!(project(&input).is_err());

        let mut input = card_input(dec!(200));
        input.limits.max_months = MAX_MONTHS_CEILING + 1;
        assert!(project(&input).is_err());

        let mut input = card_input(dec!(200));
        input.limits.schedule_window = 0;
        assert!(project(&input).is_err());
    }

    #[test]
    fn test_limits_default_from_json() {
        let input: ProjectionInput = serde_json::from_value(serde_json::json!({
            "principal": "1000",
            "rate_schedule": {"tiers": [{"start_month": 1, "annual_rate": "0"}]},
            "payment_policy": {"Fixed": {"amount": "100"}}
        }))
        .unwrap();
        assert_eq!(input.limits, ProjectionLimits::default());
        assert_eq!(input.start_date, None);
    }
}
