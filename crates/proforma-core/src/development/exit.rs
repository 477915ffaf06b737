use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::projection::YearProjection;
use crate::error::ProFormaError;
use crate::types::{pct, Money, Percent, Rate, MAX_AMOUNT};
use crate::ProFormaResult;

/// Reversion at the end of the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAnalysis {
    pub final_year_noi: Money,
    pub exit_cap_rate: Rate,
    pub gross_sale_price: Money,
    pub selling_costs: Money,
    pub net_sale_price: Money,
    pub loan_payoff: Money,
    /// Net sale price less the outstanding loan balance
    pub net_proceeds: Money,
}

/// Capitalise the final operating year's NOI at the exit cap rate and net
/// out selling costs and the loan payoff.
pub fn analyze_exit(
    projections: &[YearProjection],
    exit_cap_rate: Percent,
    selling_cost_percent: Percent,
) -> ProFormaResult<ExitAnalysis> {
    let final_year = projections
        .iter()
        .rev()
        .find(|row| !row.is_construction)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "hold_years".into(),
            reason: "Exit analysis needs at least one operating year".into(),
        })?;

    if selling_cost_percent < Decimal::ZERO || selling_cost_percent > Decimal::ONE_HUNDRED {
        return Err(ProFormaError::InvalidInput {
            field: "selling_cost_percent".into(),
            reason: format!("Must be between 0 and 100 percent, got {selling_cost_percent}"),
        });
    }

    let cap = pct(exit_cap_rate);
    if cap.is_zero() {
        return Err(ProFormaError::DivisionByZero {
            context: "exit valuation (NOI / exit_cap_rate)".into(),
        });
    }

    let gross_sale_price = final_year
        .noi
        .checked_div(cap)
        .filter(|price| price.abs() <= MAX_AMOUNT)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "exit_cap_rate".into(),
            reason: format!("Capitalising NOI of {} at {cap} is out of range", final_year.noi),
        })?;
    let selling_costs = gross_sale_price * pct(selling_cost_percent);
    let net_sale_price = gross_sale_price - selling_costs;
    let loan_payoff = final_year.loan_balance.max(Decimal::ZERO);

    Ok(ExitAnalysis {
        final_year_noi: final_year.noi,
        exit_cap_rate: cap,
        gross_sale_price,
        selling_costs,
        net_sale_price,
        loan_payoff,
        net_proceeds: net_sale_price - loan_payoff,
    })
}
