//! Display layer: rounds the raw pipeline output for presentation.
//!
//! Money rounds to whole currency units (midpoint away from zero). Rates,
//! IRRs, DSCR and multiples render with 2 decimals; margins and yields with
//! 1 decimal. Undefined ratios render as `N/A`.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::pro_forma::CalculationResult;
use super::projection::YearProjection;
use crate::time_value::IrrResult;
use crate::types::{Money, Rate};

pub const NOT_APPLICABLE: &str = "N/A";

/// Round to whole currency units.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-precision string with midpoint-away-from-zero rounding.
pub fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

/// A decimal rate rendered in percentage points, e.g. 0.12345 → "12.35".
pub fn percent(rate: Rate, dp: u32) -> String {
    fixed(rate * dec!(100), dp)
}

fn optional_percent(rate: Option<Rate>, dp: u32) -> String {
    rate.map(|r| percent(r, dp))
        .unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

fn optional_fixed(value: Option<Decimal>, dp: u32) -> String {
    value
        .map(|v| fixed(v, dp))
        .unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

/// One rounded projection row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportYear {
    pub label: String,
    pub is_construction: bool,
    pub gross_rent: Money,
    pub vacancy: Money,
    pub effective_gross_income: Money,
    pub total_expenses: Money,
    pub noi: Money,
    pub reserves: Money,
    pub cash_flow_before_debt: Money,
    pub debt_service: Money,
    pub interest: Money,
    pub principal: Money,
    pub loan_balance: Money,
    pub cash_flow_after_debt: Money,
}

impl From<&YearProjection> for ReportYear {
    fn from(row: &YearProjection) -> Self {
        Self {
            label: row.label.clone(),
            is_construction: row.is_construction,
            gross_rent: round_money(row.gross_rent),
            vacancy: round_money(row.vacancy),
            effective_gross_income: round_money(row.effective_gross_income),
            total_expenses: round_money(row.total_expenses),
            noi: round_money(row.noi),
            reserves: round_money(row.reserves),
            cash_flow_before_debt: round_money(row.cash_flow_before_debt),
            debt_service: round_money(row.debt_service),
            interest: round_money(row.interest),
            principal: round_money(row.principal),
            loan_balance: round_money(row.loan_balance),
            cash_flow_after_debt: round_money(row.cash_flow_after_debt),
        }
    }
}

/// Rounded LP/GP summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWaterfall {
    pub lp_invested: Money,
    pub gp_invested: Money,
    pub lp_total_distributed: Money,
    pub gp_total_distributed: Money,
    pub lp_multiple: String,
    pub gp_multiple: String,
}

/// Presentation form of a `CalculationResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProFormaReport {
    pub property_type: String,
    pub rentable_sf: Money,
    pub useable_sf: Money,
    pub site_area_sf: Money,
    pub land_cost: Money,
    pub hard_costs: Money,
    pub soft_costs: Money,
    pub total_project_cost: Money,
    pub construction_loan: Money,
    pub construction_interest: Money,
    pub equity_required: Money,
    pub permanent_loan: Money,
    pub refinance_proceeds: Money,
    pub annual_debt_service: Money,
    pub annual_rent: Money,
    pub effective_gross_income: Money,
    pub total_expenses: Money,
    pub noi: Money,
    pub stabilized_value: Money,
    pub value_creation: Money,
    pub development_margin: String,
    pub yield_on_cost: String,
    pub debt_yield: String,
    pub dscr: String,
    pub equity_irr: String,
    pub irr_converged: bool,
    pub equity_irr_with_sale: String,
    pub unlevered_irr: String,
    pub equity_multiple: String,
    pub gross_sale_price: Money,
    pub net_sale_price: Money,
    pub net_proceeds: Money,
    pub projections: Vec<ReportYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waterfall: Option<ReportWaterfall>,
}

fn irr_text(result: &IrrResult) -> String {
    percent(result.rate, 2)
}

impl ProFormaReport {
    pub fn from_result(result: &CalculationResult) -> Self {
        let b = &result.budget;
        let f = &result.financing;
        let ops = &result.operations;

        Self {
            property_type: result.property_type.to_string(),
            rentable_sf: round_money(b.rentable_sf),
            useable_sf: round_money(b.useable_sf),
            site_area_sf: round_money(b.site_area_sf),
            land_cost: round_money(b.land_cost),
            hard_costs: round_money(b.hard_costs),
            soft_costs: round_money(b.soft_costs),
            total_project_cost: round_money(b.total_project_cost),
            construction_loan: round_money(f.construction_loan),
            construction_interest: round_money(f.construction_interest),
            equity_required: round_money(f.equity_required),
            permanent_loan: round_money(f.permanent_loan),
            refinance_proceeds: round_money(f.refinance_proceeds),
            annual_debt_service: round_money(f.annual_debt_service),
            annual_rent: round_money(ops.annual_rent),
            effective_gross_income: round_money(ops.effective_gross_income),
            total_expenses: round_money(ops.total_expenses),
            noi: round_money(ops.noi),
            stabilized_value: round_money(ops.stabilized_value),
            value_creation: round_money(ops.value_creation),
            development_margin: optional_percent(ops.development_margin, 1),
            yield_on_cost: optional_percent(ops.yield_on_cost, 1),
            debt_yield: optional_percent(ops.debt_yield, 1),
            dscr: optional_fixed(ops.dscr, 2),
            equity_irr: irr_text(&result.returns.equity_irr),
            irr_converged: result.returns.equity_irr.converged,
            equity_irr_with_sale: irr_text(&result.returns.equity_irr_with_sale),
            unlevered_irr: irr_text(&result.returns.unlevered_irr),
            equity_multiple: optional_fixed(result.returns.equity_multiple, 2),
            gross_sale_price: round_money(result.exit.gross_sale_price),
            net_sale_price: round_money(result.exit.net_sale_price),
            net_proceeds: round_money(result.exit.net_proceeds),
            projections: result.projections.iter().map(ReportYear::from).collect(),
            waterfall: result.waterfall.as_ref().map(|wf| ReportWaterfall {
                lp_invested: round_money(wf.lp_invested),
                gp_invested: round_money(wf.gp_invested),
                lp_total_distributed: round_money(wf.lp_total_distributed),
                gp_total_distributed: round_money(wf.gp_total_distributed),
                lp_multiple: optional_fixed(wf.lp_multiple, 2),
                gp_multiple: optional_fixed(wf.gp_multiple, 2),
            }),
        }
    }
}
