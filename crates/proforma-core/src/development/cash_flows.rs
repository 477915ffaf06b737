use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::costs::FinancingSummary;
use super::projection::YearProjection;
use crate::types::Money;

/// Source of an equity cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    Investment,
    Refinance,
    Operations,
}

/// A signed equity cash flow at an integer period (0 = closing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub period: u32,
    pub amount: Money,
    pub kind: CashFlowKind,
}

/// Flatten the schedule into the equity cash-flow series, ordered by period:
/// the equity check at period 0, the refinance cash-out at the end of
/// construction (period 1 when there is no construction phase), then each
/// operating year's cash flow after debt.
pub fn assemble_cash_flows(
    projections: &[YearProjection],
    financing: &FinancingSummary,
) -> Vec<CashFlowEvent> {
    let mut events = Vec::with_capacity(projections.len() + 2);

    events.push(CashFlowEvent {
        period: 0,
        amount: -financing.equity_required,
        kind: CashFlowKind::Investment,
    });

    if financing.refinance_proceeds > Decimal::ZERO {
        let period = projections
            .iter()
            .filter(|row| row.is_construction)
            .map(|row| row.period)
            .last()
            .unwrap_or(1);
        events.push(CashFlowEvent {
            period,
            amount: financing.refinance_proceeds,
            kind: CashFlowKind::Refinance,
        });
    }

    events.extend(
        projections
            .iter()
            .filter(|row| !row.is_construction)
            .map(|row| CashFlowEvent {
                period: row.period,
                amount: row.cash_flow_after_debt,
                kind: CashFlowKind::Operations,
            }),
    );

    events
}

/// `(period, amount)` pairs for the IRR solver.
pub fn as_period_flows(events: &[CashFlowEvent]) -> Vec<(u32, Money)> {
    events.iter().map(|e| (e.period, e.amount)).collect()
}
