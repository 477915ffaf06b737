use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use proforma_core::development::report::{fixed, percent};
use proforma_core::equity::waterfall::{self, WaterfallInput};
use proforma_core::time_value::{self, IrrSettings};

use crate::input;

/// Arguments for a standalone LP/GP waterfall
#[derive(Args)]
pub struct WaterfallArgs {
    /// Path to a JSON or YAML waterfall input (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_waterfall(args: WaterfallArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wf_input: WaterfallInput = input::read_input(args.input.as_deref(), "waterfall")?;
    let result = waterfall::calculate_waterfall(&wf_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a quick IRR solve
#[derive(Args)]
pub struct IrrArgs {
    /// Cash flows at periods 0, 1, 2, ... (comma-separated, e.g. "-1000,0,1210")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Initial guess as a decimal rate
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Maximum Newton-Raphson iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let defaults = IrrSettings::default();
    let settings = IrrSettings {
        guess: args.guess.unwrap_or(defaults.guess),
        max_iterations: args.max_iterations.unwrap_or(defaults.max_iterations),
        ..defaults
    };

    let flows: Vec<(u32, Decimal)> = args
        .cash_flows
        .iter()
        .enumerate()
        .map(|(period, amount)| Ok((u32::try_from(period)?, *amount)))
        .collect::<Result<_, std::num::TryFromIntError>>()?;

    let result = time_value::irr(&flows, &settings)?;
    let multiple = time_value::equity_multiple(args.cash_flows.iter().copied());

    Ok(json!({
        "result": {
            "irr": fixed(result.rate, 6),
            "irr_pct": format!("{}%", percent(result.rate, 2)),
            "converged": result.converged,
            "iterations": result.iterations,
            "equity_multiple": multiple.map(|m| fixed(m, 4)),
        }
    }))
}
