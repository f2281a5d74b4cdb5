mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{CompareArgs, ProjectArgs};
use commands::card::{BalanceTransferArgs, LateFeeArgs, MinimumPaymentArgs};

/// Credit card payoff projections and scenario comparisons
#[derive(Parser)]
#[command(
    name = "payoff",
    version,
    about = "Credit card payoff projections and scenario comparisons",
    long_about = "A CLI for projecting card balances to payoff with decimal precision. \
                  Supports fixed and minimum-payment rules, promotional and penalty APRs, \
                  two-scenario comparisons with break-even, balance transfers, and \
                  late-payment costs. Set RUST_LOG=debug for diagnostics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a balance month by month until payoff
    Project(ProjectArgs),
    /// Compare two payoff scenarios (interest saved, time saved, break-even)
    Compare(CompareArgs),
    /// Evaluate moving a balance to a promotional-rate card
    BalanceTransfer(BalanceTransferArgs),
    /// Compare minimum payments against a fixed recommended payment
    MinimumPayment(MinimumPaymentArgs),
    /// Cost of a late payment (fee plus penalty APR interest)
    LateFee(LateFeeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::amortization::run_project(args),
        Commands::Compare(args) => commands::amortization::run_compare(args),
        Commands::BalanceTransfer(args) => commands::card::run_balance_transfer(args),
        Commands::MinimumPayment(args) => commands::card::run_minimum_payment(args),
        Commands::LateFee(args) => commands::card::run_late_fee(args),
        Commands::Version => {
            println!("payoff {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
