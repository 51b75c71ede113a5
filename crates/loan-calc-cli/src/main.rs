mod commands;
mod config;
mod input;
mod logger;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::process;

use commands::repayment::{LoanArgs, PmtArgs};
use commands::schedule::ScheduleArgs;
use commands::sensitivity::SensitivityArgs;
use loan_calc_core::options::LoanOptions;

/// Loan repayment estimates
#[derive(Parser)]
#[command(
    name = "loanc",
    version,
    about = "Loan repayment estimates",
    long_about = "Estimate the periodic payment and total repaid for a fixed-rate loan, \
                  given an amount, a loan purpose (or explicit rate), a repayment \
                  frequency and a term in months. Also builds amortisation schedules \
                  and rate x term sensitivity grids."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON or YAML file with loan purposes, repayment frequencies and terms
    #[arg(long, global = true)]
    options: Option<String>,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Periodic payment and total repaid
    Repayment(LoanArgs),
    /// Raw annuity payment formula (signed, unrounded)
    Pmt(PmtArgs),
    /// Payment-by-payment amortisation schedule
    Schedule(ScheduleArgs),
    /// Payment across a grid of annual rates and terms
    Sensitivity(SensitivityArgs),
    /// List loan purposes, repayment frequencies and terms
    Options,
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

fn run(command: Commands, options: &LoanOptions) -> Result<Value, Box<dyn std::error::Error>> {
    match command {
        Commands::Repayment(args) => commands::repayment::run_repayment(args, options),
        Commands::Pmt(args) => commands::repayment::run_pmt(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args, options),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Options => Ok(serde_json::to_value(options)?),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Commands::Version => {
            println!("loanc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        command => config::load_options(cli.options.as_deref())
            .and_then(|options| run(command, &options)),
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
