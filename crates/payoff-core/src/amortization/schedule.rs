use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PayoffError;
use crate::types::*;
use crate::PayoffResult;

/// Source of the periodic (monthly) interest rate for a given month.
pub trait PeriodicRateSource {
    fn periodic_rate_for(&self, month: Month) -> Rate;
}

/// Rule deriving the payment due from the opening balance and the
/// interest accrued in the same month.
pub trait PaymentRule {
    fn payment_for(&self, balance: Money, interest: Money) -> Money;
}

/// One step of a rate schedule: `annual_rate` applies from `start_month`
/// until the next tier begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    pub start_month: Month,
    pub annual_rate: Rate,
}

/// Piecewise-constant APR schedule (flat, promotional, or penalty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub tiers: Vec<RateTier>,
}

impl RateSchedule {
    /// Single APR for the whole projection.
    pub fn flat(annual_rate: Rate) -> Self {
        RateSchedule {
            tiers: vec![RateTier {
                start_month: 1,
                annual_rate,
            }],
        }
    }

    /// `promo_rate` for months 1..=promo_months, `regular_rate` afterwards.
    pub fn promotional(promo_rate: Rate, promo_months: Month, regular_rate: Rate) -> Self {
        if promo_months == 0 {
            return Self::flat(regular_rate);
        }
        RateSchedule {
            tiers: vec![
                RateTier {
                    start_month: 1,
                    annual_rate: promo_rate,
                },
                RateTier {
                    start_month: promo_months.saturating_add(1),
                    annual_rate: regular_rate,
                },
            ],
        }
    }

    /// `regular_rate` until `trigger_month`, then `penalty_rate`. When
    /// `revert_after` is set the regular rate is restored after that many
    /// penalty months.
    pub fn penalty(
        regular_rate: Rate,
        trigger_month: Month,
        penalty_rate: Rate,
        revert_after: Option<Month>,
    ) -> Self {
        let trigger = trigger_month.max(1);
        let mut tiers = Vec::with_capacity(3);
        if trigger > 1 {
            tiers.push(RateTier {
                start_month: 1,
                annual_rate: regular_rate,
            });
        }
        tiers.push(RateTier {
            start_month: trigger,
            annual_rate: penalty_rate,
        });
        if let Some(months) = revert_after.filter(|m| *m > 0) {
            tiers.push(RateTier {
                start_month: trigger.saturating_add(months),
                annual_rate: regular_rate,
            });
        }
        RateSchedule { tiers }
    }

    /// APR in force for `month`.
    pub fn annual_rate_for(&self, month: Month) -> Rate {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.start_month <= month)
            .map(|t| t.annual_rate)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn validate(&self) -> PayoffResult<()> {
        let first = self.tiers.first().ok_or_else(|| {
            PayoffError::InsufficientData("Rate schedule requires at least one tier".into())
        })?;
        if first.start_month != 1 {
            return Err(PayoffError::InvalidInput {
                field: "rate_schedule.tiers[0].start_month".into(),
                reason: "First tier must start at month 1".into(),
            });
        }
        for (i, tier) in self.tiers.iter().enumerate() {
            if tier.annual_rate < Decimal::ZERO {
                return Err(PayoffError::InvalidInput {
                    field: format!("rate_schedule.tiers[{i}].annual_rate"),
                    reason: "Annual rate must be non-negative".into(),
                });
            }
            if i > 0 && tier.start_month <= self.tiers[i - 1].start_month {
                return Err(PayoffError::InvalidInput {
                    field: format!("rate_schedule.tiers[{i}].start_month"),
                    reason: "Tier start months must be strictly increasing".into(),
                });
            }
        }
        Ok(())
    }
}

impl PeriodicRateSource for RateSchedule {
    fn periodic_rate_for(&self, month: Month) -> Rate {
        monthly_rate(self.annual_rate_for(month))
    }
}

/// How the monthly payment is determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaymentPolicy {
    /// Same amount every month
    Fixed { amount: Money },
    /// Percentage of the opening balance, never below `floor`
    PercentOfBalance { rate: Rate, floor: Money },
    /// Accrued interest plus a percentage of the opening balance, never below `floor`
    InterestPlusPercent { rate: Rate, floor: Money },
}

impl PaymentPolicy {
    pub fn fixed(amount: Money) -> Self {
        PaymentPolicy::Fixed { amount }
    }

    pub fn validate(&self) -> PayoffResult<()> {
        match self {
            PaymentPolicy::Fixed { amount } => {
                if *amount < Decimal::ZERO {
                    return Err(PayoffError::InvalidInput {
                        field: "payment_policy.amount".into(),
                        reason: "Payment amount must be non-negative".into(),
                    });
                }
            }
            PaymentPolicy::PercentOfBalance { rate, floor }
            | PaymentPolicy::InterestPlusPercent { rate, floor } => {
                if *rate < Decimal::ZERO || *rate > Decimal::ONE {
                    return Err(PayoffError::InvalidInput {
                        field: "payment_policy.rate".into(),
                        reason: "Payment rate must be between 0 and 1".into(),
                    });
                }
                if *floor < Decimal::ZERO {
                    return Err(PayoffError::InvalidInput {
                        field: "payment_policy.floor".into(),
                        reason: "Payment floor must be non-negative".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl PaymentRule for PaymentPolicy {
    fn payment_for(&self, balance: Money, interest: Money) -> Money {
        match self {
            PaymentPolicy::Fixed { amount } => *amount,
            PaymentPolicy::PercentOfBalance { rate, floor } => (balance * rate).max(*floor),
            PaymentPolicy::InterestPlusPercent { rate, floor } => {
                interest.saturating_add(balance * rate).max(*floor)
            }
        }
    }
}
