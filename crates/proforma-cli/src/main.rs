mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::equity::{IrrArgs, WaterfallArgs};
use commands::pro_forma::{CalculateArgs, ValidateArgs};
use commands::sensitivity::SensitivityArgs;

/// Real-estate development pro forma calculations
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Real-estate development pro forma calculations",
    long_about = "A CLI for running development pro formas with decimal precision. \
                  Computes development budgets, stabilised operations, annual projections, \
                  equity IRR, exit value, LP/GP waterfalls and one-way sensitivities \
                  for retail and office projects."
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
    /// Run the full pro forma (costs, projections, returns, exit, waterfall)
    Calculate(CalculateArgs),
    /// Re-run the pro forma while flexing inputs by percentage adjustments
    Sensitivity(SensitivityArgs),
    /// Check DSCR, debt yield and development margin against lender thresholds
    Validate(ValidateArgs),
    /// Distribute a cash-flow series through the LP/GP waterfall
    Waterfall(WaterfallArgs),
    /// Solve the IRR of a periodic cash-flow series
    Irr(IrrArgs),
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
        Commands::Calculate(args) => commands::pro_forma::run_calculate(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Validate(args) => commands::pro_forma::run_validate(args),
        Commands::Waterfall(args) => commands::equity::run_waterfall(args),
        Commands::Irr(args) => commands::equity::run_irr(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("Command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
