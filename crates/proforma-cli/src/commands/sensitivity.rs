use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use proforma_core::development::report::{fixed, percent, NOT_APPLICABLE};
use proforma_core::scenarios::sensitivity::{self, SensitivityInput, SensitivityVariable};
use proforma_core::types::ComputationOutput;

use crate::input;

/// Arguments for one-way sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON or YAML request file (reads stdin when omitted).
    /// A `sensitivities` list in the file is used when no --var is given.
    #[arg(long)]
    pub input: Option<String>,

    /// Variable to flex in format name:field:adjustments
    /// (e.g. "Exit cap:exit_cap_rate:-10,0,10"). Repeatable.
    #[arg(long = "var", allow_hyphen_values = true)]
    pub vars: Vec<String>,
}

/// One flattened sensitivity row, formatted like the pro forma report.
#[derive(Debug, Serialize)]
struct SensitivityRow {
    variable: String,
    field: String,
    adjustment: String,
    value: String,
    equity_irr: String,
    irr_converged: bool,
    development_margin: String,
    dscr: String,
    error: String,
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

fn parse_var(arg: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = arg.splitn(3, ':').collect();
    if parts.len() != 3 {
        return Err(format!(
            "Sensitivity variable must be name:field:adjustments, got '{}'",
            arg
        )
        .into());
    }
    let ranges = parts[2]
        .split(',')
        .map(|s| s.trim().parse::<Decimal>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Invalid adjustment list '{}': {}", parts[2], e))?;

    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        field: parts[1].parse()?,
        ranges,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SensitivityInput = input::read_input(args.input.as_deref(), "sensitivity")?;

    let variables = if args.vars.is_empty() {
        request.sensitivities
    } else {
        args.vars
            .iter()
            .map(|v| parse_var(v))
            .collect::<Result<Vec<_>, _>>()?
    };
    if variables.is_empty() {
        return Err("At least one --var (or a sensitivities list in the input) is required".into());
    }

    let output = sensitivity::run_sensitivity(&request.base, &variables)?;

    let rows: Vec<SensitivityRow> = output
        .result
        .iter()
        .flat_map(|variable| {
            variable.results.iter().map(move |point| SensitivityRow {
                variable: variable.variable.clone(),
                field: variable.field.to_string(),
                adjustment: format!("{}%", point.adjustment.normalize()),
                value: or_na(point.value.map(|v| fixed(v, 2))),
                equity_irr: or_na(point.equity_irr.map(|r| percent(r, 2))),
                irr_converged: point.irr_converged,
                development_margin: or_na(point.development_margin.map(|m| percent(m, 1))),
                dscr: or_na(point.dscr.map(|d| fixed(d, 2))),
                error: point.error.clone().unwrap_or_default(),
            })
        })
        .collect();

    let display = ComputationOutput {
        result: rows,
        methodology: output.methodology,
        assumptions: output.assumptions,
        warnings: output.warnings,
        metadata: output.metadata,
    };
    Ok(serde_json::to_value(display)?)
}
