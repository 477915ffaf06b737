use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::development::pro_forma::{run_pro_forma, ProFormaRequest};
use crate::development::report::{fixed, percent};
use crate::types::*;
use crate::ProFormaResult;

const MIN_DSCR: Decimal = dec!(1.25);
const MIN_DEBT_YIELD: Rate = dec!(0.08);
const MIN_DEVELOPMENT_MARGIN: Rate = dec!(0.15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Warning,
    Info,
}

/// A feasibility flag raised against a computed pro forma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub severity: ValidationSeverity,
    pub field: String,
    pub message: String,
}

impl ValidationWarning {
    fn warning(field: &str, message: String) -> Self {
        Self {
            severity: ValidationSeverity::Warning,
            field: field.into(),
            message,
        }
    }

    fn info(field: &str, message: String) -> Self {
        Self {
            severity: ValidationSeverity::Info,
            field: field.into(),
            message,
        }
    }
}

fn dscr_message(dscr: Decimal) -> String {
    format!("DSCR of {}x is below the {MIN_DSCR}x lender minimum", fixed(dscr, 2))
}

fn debt_yield_message(debt_yield: Rate) -> String {
    format!(
        "Debt yield of {}% is below the 8% lender minimum",
        percent(debt_yield, 1)
    )
}

fn margin_message(margin: Rate) -> String {
    format!(
        "Development margin of {}% is below the 15% feasibility target",
        percent(margin, 1)
    )
}

/// Run the pro forma and check lender and feasibility thresholds:
/// DSCR below 1.25x, debt yield below 8%, development margin below 15%.
///
/// Input errors propagate; threshold breaches are returned as flags.
pub fn validate_project(
    request: &ProFormaRequest,
) -> ProFormaResult<ComputationOutput<Vec<ValidationWarning>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = run_pro_forma(request, &mut warnings)?;
    let ops = &result.operations;
    let mut flags = Vec::new();

    match ops.dscr {
        Some(dscr) if dscr < MIN_DSCR => {
            flags.push(ValidationWarning::warning("dscr", dscr_message(dscr)))
        }
        Some(_) => {}
        None => flags.push(ValidationWarning::info(
            "dscr",
            "DSCR is not applicable: the project carries no permanent debt service".into(),
        )),
    }

    match ops.debt_yield {
        Some(debt_yield) if debt_yield < MIN_DEBT_YIELD => {
            flags.push(ValidationWarning::warning(
                "debt_yield",
                debt_yield_message(debt_yield),
            ))
        }
        Some(_) => {}
        None => flags.push(ValidationWarning::info(
            "debt_yield",
            "Debt yield is not applicable: the project carries no permanent loan".into(),
        )),
    }

    if let Some(margin) = ops.development_margin {
        if margin < MIN_DEVELOPMENT_MARGIN {
            flags.push(ValidationWarning::info(
                "development_margin",
                margin_message(margin),
            ));
        }
    }

    if !result.returns.equity_irr.converged {
        flags.push(ValidationWarning::warning(
            "equity_irr",
            format!(
                "Equity IRR did not converge after {} iterations",
                result.returns.equity_irr.iterations
            ),
        ));
    }

    log::debug!(
        "Validated {} ({}): {} flag(s)",
        request.project.name,
        request.property_type,
        flags.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Development Feasibility Check (DSCR ≥ 1.25x, debt yield ≥ 8%, margin ≥ 15%)",
        &serde_json::json!({
            "min_dscr": MIN_DSCR.to_string(),
            "min_debt_yield": MIN_DEBT_YIELD.to_string(),
            "min_development_margin": MIN_DEVELOPMENT_MARGIN.to_string(),
        }),
        warnings,
        elapsed,
        flags,
    ))
}
