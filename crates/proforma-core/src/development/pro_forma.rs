use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::cash_flows::{as_period_flows, assemble_cash_flows, CashFlowEvent};
use super::costs::{analyze_development, DevelopmentBudget, FinancingSummary, StabilizedOperations};
use super::exit::{analyze_exit, ExitAnalysis};
use super::inputs::{EngineAssumptions, ProjectInput, PropertyType};
use super::projection::{build_projections, YearProjection};
use crate::equity::waterfall::{distribute, WaterfallConfig, WaterfallResult};
use crate::time_value::{equity_multiple, irr, IrrResult};
use crate::types::*;
use crate::ProFormaResult;

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// Everything one pro forma run needs, resolved at the call boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProFormaRequest {
    pub property_type: PropertyType,
    pub project: ProjectInput,
    /// `None` runs the default 8% pref / 50% catch-up / 80-20 promote waterfall
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waterfall: Option<WaterfallConfig>,
    #[serde(default)]
    pub assumptions: EngineAssumptions,
}

impl ProFormaRequest {
    pub fn new(property_type: PropertyType, project: ProjectInput) -> Self {
        Self {
            property_type,
            project,
            waterfall: None,
            assumptions: EngineAssumptions::default(),
        }
    }

    /// The waterfall configuration this request runs with.
    pub fn waterfall_config(&self) -> WaterfallConfig {
        self.waterfall.clone().unwrap_or_default()
    }
}

/// Investor return metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// IRR of the equity cash-flow series (investment, refinance, operations)
    pub equity_irr: IrrResult,
    /// Σ inflows / |Σ outflows| of the equity series
    pub equity_multiple: Option<Multiple>,
    /// Equity series with exit net proceeds received in the final period
    pub equity_irr_with_sale: IrrResult,
    /// Total project cost against cash flow before debt and net sale price
    pub unlevered_irr: IrrResult,
}

/// Raw, unrounded output of the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub property_type: PropertyType,
    pub budget: DevelopmentBudget,
    pub financing: FinancingSummary,
    pub operations: StabilizedOperations,
    pub projections: Vec<YearProjection>,
    pub cash_flows: Vec<CashFlowEvent>,
    pub exit: ExitAnalysis,
    pub returns: ReturnMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waterfall: Option<WaterfallResult>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run a full development pro forma and wrap it with metadata.
pub fn calculate_pro_forma(
    request: &ProFormaRequest,
) -> ProFormaResult<ComputationOutput<CalculationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = run_pro_forma(request, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Development Pro Forma (cost build-up, monthly amortisation, Newton-Raphson IRR, LP/GP waterfall)",
        request,
        warnings,
        elapsed,
        output,
    ))
}

/// Costs → projections → cash flows → IRR and exit → waterfall.
pub fn run_pro_forma(
    request: &ProFormaRequest,
    warnings: &mut Vec<String>,
) -> ProFormaResult<CalculationResult> {
    let input = &request.project;
    let assumptions = &request.assumptions;

    let analysis = analyze_development(input, request.property_type, assumptions, warnings)?;
    let projections = build_projections(input, &analysis, assumptions)?;
    let cash_flows = assemble_cash_flows(&projections, &analysis.financing);
    let exit = analyze_exit(
        &projections,
        input.exit_cap_rate,
        assumptions.selling_cost_percent,
    )?;

    let returns = compute_returns(&projections, &cash_flows, &analysis.budget, &exit, request)?;
    for (label, result) in [
        ("Equity IRR", &returns.equity_irr),
        ("Equity IRR with sale", &returns.equity_irr_with_sale),
        ("Unlevered IRR", &returns.unlevered_irr),
    ] {
        if !result.converged {
            warnings.push(format!(
                "{label} did not converge after {} iterations — last estimate {}",
                result.iterations, result.rate
            ));
        }
    }

    let config = request.waterfall_config();
    let waterfall = if config.enabled {
        Some(distribute(
            &cash_flows,
            analysis.financing.equity_required,
            &config,
            &assumptions.irr,
        )?)
    } else {
        None
    };

    Ok(CalculationResult {
        property_type: request.property_type,
        budget: analysis.budget,
        financing: analysis.financing,
        operations: analysis.operations,
        projections,
        cash_flows,
        exit,
        returns,
        waterfall,
    })
}

fn compute_returns(
    projections: &[YearProjection],
    cash_flows: &[CashFlowEvent],
    budget: &DevelopmentBudget,
    exit: &ExitAnalysis,
    request: &ProFormaRequest,
) -> ProFormaResult<ReturnMetrics> {
    let settings = &request.assumptions.irr;
    let equity_flows = as_period_flows(cash_flows);
    let final_period = projections.last().map(|row| row.period).unwrap_or(0);

    let equity_irr = irr(&equity_flows, settings)?;
    let equity_multiple = equity_multiple(cash_flows.iter().map(|e| e.amount));

    let mut with_sale = equity_flows.clone();
    with_sale.push((final_period, exit.net_proceeds));
    let equity_irr_with_sale = irr(&with_sale, settings)?;

    let mut unlevered = vec![(0, -budget.total_project_cost)];
    unlevered.extend(
        projections
            .iter()
            .filter(|row| !row.is_construction)
            .map(|row| (row.period, row.cash_flow_before_debt)),
    );
    unlevered.push((final_period, exit.net_sale_price));
    let unlevered_irr = irr(&unlevered, settings)?;

    log::debug!(
        "Returns: equity IRR {} (converged: {}), unlevered IRR {}",
        equity_irr.rate,
        equity_irr.converged,
        unlevered_irr.rate
    );

    Ok(ReturnMetrics {
        equity_irr,
        equity_multiple,
        equity_irr_with_sale,
        unlevered_irr,
    })
}
