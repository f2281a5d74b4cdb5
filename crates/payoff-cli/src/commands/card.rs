use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use payoff_core::card::balance_transfer::{self, BalanceTransferInput};
use payoff_core::card::late_fee::{self, LateFeeInput};
use payoff_core::card::minimum_payment::{self, MinimumPaymentInput, MinimumRule};

use super::amortization::LimitArgs;
use crate::input;

/// Arguments for a balance-transfer evaluation
#[derive(Args)]
pub struct BalanceTransferArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Balance to transfer
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// APR on the current card
    #[arg(long)]
    pub current_apr: Option<Decimal>,

    /// Monthly payment applied to either card
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Promotional APR on the transfer card
    #[arg(long, default_value = "0")]
    pub promo_apr: Decimal,

    /// Promotional period in months
    #[arg(long, default_value_t = 12)]
    pub promo_months: u32,

    /// APR on the transfer card after the promotion
    #[arg(long)]
    pub post_promo_apr: Option<Decimal>,

    /// Transfer fee as a fraction of the balance (0.03 = 3%)
    #[arg(long, default_value = "0.03")]
    pub fee_rate: Decimal,

    /// First billing date, used to report payoff dates
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

pub fn run_balance_transfer(args: BalanceTransferArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bt_input: BalanceTransferInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let balance = args
            .balance
            .ok_or("--balance is required (or provide --input)")?;
        let current_apr = args
            .current_apr
            .ok_or("--current-apr is required (or provide --input)")?;
        let monthly_payment = args
            .payment
            .ok_or("--payment is required (or provide --input)")?;
        let post_promo_apr = args
            .post_promo_apr
            .ok_or("--post-promo-apr is required (or provide --input)")?;

        BalanceTransferInput {
            balance,
            current_apr,
            monthly_payment,
            promo_apr: args.promo_apr,
            promo_months: args.promo_months,
            post_promo_apr,
            transfer_fee_rate: args.fee_rate,
            limits: args.limits.limits(),
            start_date: args.start_date,
        }
    };

    let result = balance_transfer::analyze_balance_transfer(&bt_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a minimum-payment evaluation
#[derive(Args)]
pub struct MinimumPaymentArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current card balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Annual percentage rate as a decimal
    #[arg(long)]
    pub apr: Option<Decimal>,

    /// Minimum-payment percentage
    #[arg(long, default_value = "0.02")]
    pub min_rate: Decimal,

    /// Minimum-payment floor
    #[arg(long, default_value = "25")]
    pub min_floor: Decimal,

    /// Minimum is accrued interest plus --min-rate of the balance
    #[arg(long)]
    pub interest_plus: bool,

    /// Fixed payment to compare against the minimum
    #[arg(long)]
    pub recommended: Option<Decimal>,

    /// Solve the level payment that clears the balance in this many months
    #[arg(long)]
    pub target_months: Option<u32>,

    /// First billing date, used to report payoff dates
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

pub fn run_minimum_payment(args: MinimumPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mp_input: MinimumPaymentInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let balance = args
            .balance
            .ok_or("--balance is required (or provide --input)")?;
        let apr = args.apr.ok_or("--apr is required (or provide --input)")?;
        let recommended_payment = args
            .recommended
            .ok_or("--recommended is required (or provide --input)")?;

        MinimumPaymentInput {
            balance,
            apr,
            minimum_rule: if args.interest_plus {
                MinimumRule::InterestPlusPercent
            } else {
                MinimumRule::PercentOfBalance
            },
            minimum_rate: args.min_rate,
            minimum_floor: args.min_floor,
            recommended_payment,
            target_months: args.target_months,
            limits: args.limits.limits(),
            start_date: args.start_date,
        }
    };

    let result = minimum_payment::analyze_minimum_payment(&mp_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a late-payment cost evaluation
#[derive(Args)]
pub struct LateFeeArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current card balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Regular APR
    #[arg(long)]
    pub regular_apr: Option<Decimal>,

    /// Penalty APR after the missed payment
    #[arg(long, default_value = "0.2999")]
    pub penalty_apr: Decimal,

    /// Late fee charged to the balance
    #[arg(long, default_value = "40")]
    pub late_fee: Decimal,

    /// Monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// First month billed at the penalty APR
    #[arg(long, default_value_t = 1)]
    pub trigger_month: u32,

    /// Months until the regular APR is restored (omit for a permanent penalty)
    #[arg(long)]
    pub penalty_months: Option<u32>,

    /// First billing date, used to report payoff dates
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

pub fn run_late_fee(args: LateFeeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lf_input: LateFeeInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let balance = args
            .balance
            .ok_or("--balance is required (or provide --input)")?;
        let regular_apr = args
            .regular_apr
            .ok_or("--regular-apr is required (or provide --input)")?;
        let monthly_payment = args
            .payment
            .ok_or("--payment is required (or provide --input)")?;

        LateFeeInput {
            balance,
            regular_apr,
            penalty_apr: args.penalty_apr,
            late_fee: args.late_fee,
            monthly_payment,
            penalty_trigger_month: args.trigger_month,
            penalty_duration_months: args.penalty_months,
            limits: args.limits.limits(),
            start_date: args.start_date,
        }
    };

    let result = late_fee::analyze_late_fee(&lf_input)?;
    Ok(serde_json::to_value(result)?)
}
