use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use payoff_core::amortization::comparator::{self, ComparisonInput};
use payoff_core::amortization::projector::{self, ProjectionInput, ProjectionLimits};
use payoff_core::amortization::schedule::{PaymentPolicy, RateSchedule};

use crate::input;

/// Iteration cap and display window shared by every projection command
#[derive(Args)]
pub struct LimitArgs {
    /// Hard iteration ceiling in months
    #[arg(long, default_value_t = projector::DEFAULT_MAX_MONTHS)]
    pub max_months: u32,

    /// Number of leading months included in the schedule output
    #[arg(long, default_value_t = projector::DEFAULT_SCHEDULE_WINDOW)]
    pub window: u32,
}

impl LimitArgs {
    pub fn limits(&self) -> ProjectionLimits {
        ProjectionLimits {
            max_months: self.max_months,
            schedule_window: self.window,
        }
    }
}

/// Arguments for a single balance projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Starting balance
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual percentage rate as a decimal (0.1899 = 18.99%)
    #[arg(long)]
    pub apr: Option<Decimal>,

    /// Fixed monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Minimum-payment percentage of balance (used instead of --payment)
    #[arg(long)]
    pub min_rate: Option<Decimal>,

    /// Minimum-payment floor when --min-rate is used
    #[arg(long, default_value = "0")]
    pub min_floor: Decimal,

    /// Promotional APR applied before --apr
    #[arg(long)]
    pub promo_apr: Option<Decimal>,

    /// Length of the promotional period in months
    #[arg(long, default_value_t = 0)]
    pub promo_months: u32,

    /// First billing date, used to report the payoff date
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let apr = args.apr.ok_or("--apr is required (or provide --input)")?;

        let payment_policy = match (args.payment, args.min_rate) {
            (Some(amount), None) => PaymentPolicy::fixed(amount),
            (None, Some(rate)) => PaymentPolicy::PercentOfBalance {
                rate,
                floor: args.min_floor,
            },
            (Some(_), Some(_)) => return Err("use either --payment or --min-rate, not both".into()),
            (None, None) => return Err("--payment or --min-rate is required".into()),
        };

        let rate_schedule = match args.promo_apr {
            Some(promo) => RateSchedule::promotional(promo, args.promo_months, apr),
            None => RateSchedule::flat(apr),
        };

        ProjectionInput {
            principal,
            rate_schedule,
            payment_policy,
            limits: args.limits.limits(),
            start_date: args.start_date,
        }
    };

    let result = projector::project(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a two-scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for scenario comparison".into());
    };
    let result = comparator::compare_scenarios(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}
