use clap::Args;
use serde_json::Value;

use proforma_core::development::pro_forma::{self, ProFormaRequest};
use proforma_core::development::report::ProFormaReport;
use proforma_core::scenarios::validation;
use proforma_core::types::ComputationOutput;

use crate::input;

/// Arguments for a full pro forma run
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to a JSON or YAML request file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Emit the full-precision result instead of the rounded report
    #[arg(long)]
    pub raw: bool,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ProFormaRequest = input::read_input(args.input.as_deref(), "calculate")?;
    let output = pro_forma::calculate_pro_forma(&request)?;

    if args.raw {
        return Ok(serde_json::to_value(output)?);
    }

    let report = ComputationOutput {
        result: ProFormaReport::from_result(&output.result),
        methodology: output.methodology,
        assumptions: output.assumptions,
        warnings: output.warnings,
        metadata: output.metadata,
    };
    Ok(serde_json::to_value(report)?)
}

/// Arguments for the lender / feasibility check
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to a JSON or YAML request file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ProFormaRequest = input::read_input(args.input.as_deref(), "validate")?;
    let result = validation::validate_project(&request)?;
    Ok(serde_json::to_value(result)?)
}
