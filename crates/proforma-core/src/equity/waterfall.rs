use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::development::cash_flows::CashFlowEvent;
use crate::error::ProFormaError;
use crate::time_value::{irr, IrrSettings};
use crate::types::*;
use crate::ProFormaResult;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A promote tier: once the hurdle is met, the remainder splits LP/GP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoteTier {
    /// Hurdle IRR in percent
    pub hurdle_irr: Percent,
    pub lp_split: Percent,
    pub gp_split: Percent,
}

/// How the promote tier is chosen for each distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoteTierSelection {
    /// Always split on the first tier
    #[default]
    FirstTier,
    /// Highest tier whose hurdle the LP's realised IRR to date has cleared
    LpIrrHurdle,
}

/// Sponsor / investor distribution rules. Percentages are in points; omitted
/// fields take the standard 8% pref, 50% catch-up, 80/20 first-tier values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterfallConfig {
    pub enabled: bool,
    pub preferred_return_rate: Percent,
    pub catch_up_percent: Percent,
    /// Ordered by ascending hurdle
    pub promote_tiers: Vec<PromoteTier>,
    pub gp_contribution_percent: Percent,
    pub tier_selection: PromoteTierSelection,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preferred_return_rate: dec!(8),
            catch_up_percent: dec!(50),
            promote_tiers: vec![
                PromoteTier {
                    hurdle_irr: dec!(12),
                    lp_split: dec!(80),
                    gp_split: dec!(20),
                },
                PromoteTier {
                    hurdle_irr: dec!(18),
                    lp_split: dec!(70),
                    gp_split: dec!(30),
                },
                PromoteTier {
                    hurdle_irr: dec!(25),
                    lp_split: dec!(60),
                    gp_split: dec!(40),
                },
            ],
            gp_contribution_percent: dec!(10),
            tier_selection: PromoteTierSelection::FirstTier,
        }
    }
}

/// Standalone waterfall request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallInput {
    /// Equity cash flows, ordered by period
    pub cash_flows: Vec<CashFlowEvent>,
    /// Total equity contributed by LP and GP together
    pub total_equity: Money,
    #[serde(default)]
    pub config: WaterfallConfig,
    #[serde(default)]
    pub irr: IrrSettings,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A distribution to one side with the running total after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub period: u32,
    pub amount: Money,
    pub cumulative: Money,
}

/// How one positive cash flow was split across the waterfall steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallAllocation {
    pub period: u32,
    pub cash_available: Money,
    pub lp_capital: Money,
    pub gp_capital: Money,
    pub lp_preferred: Money,
    pub gp_preferred: Money,
    pub gp_catch_up: Money,
    pub lp_promote: Money,
    pub gp_promote: Money,
    /// Index into `promote_tiers` used for the promote split
    pub promote_tier: usize,
}

/// Full LP/GP distribution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallResult {
    pub lp_invested: Money,
    pub gp_invested: Money,
    pub lp_distributions: Vec<Distribution>,
    pub gp_distributions: Vec<Distribution>,
    pub allocations: Vec<WaterfallAllocation>,
    pub lp_total_distributed: Money,
    pub gp_total_distributed: Money,
    /// Total distributed / invested; `None` when the side invested nothing
    pub lp_multiple: Option<Multiple>,
    pub gp_multiple: Option<Multiple>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Running state carried across distributions.
#[derive(Default)]
struct Ledger {
    lp_capital_returned: Money,
    gp_capital_returned: Money,
    lp_preferred_paid: Money,
    gp_preferred_paid: Money,
    lp_cumulative: Money,
    gp_cumulative: Money,
}

/// Calculate an LP/GP equity waterfall over a cash-flow series.
pub fn calculate_waterfall(
    input: &WaterfallInput,
) -> ProFormaResult<ComputationOutput<WaterfallResult>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let output = distribute(&input.cash_flows, input.total_equity, &input.config, &input.irr)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "LP/GP Equity Waterfall (capital, preferred, catch-up, promote)",
        &serde_json::json!({
            "total_equity": input.total_equity.to_string(),
            "preferred_return_rate": input.config.preferred_return_rate.to_string(),
            "catch_up_percent": input.config.catch_up_percent.to_string(),
            "gp_contribution_percent": input.config.gp_contribution_percent.to_string(),
            "num_tiers": input.config.promote_tiers.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Allocate every positive cash flow, in order, through return of capital,
/// preferred return, GP catch-up and promote. Capital and preferred state
/// carries across distributions.
pub fn distribute(
    cash_flows: &[CashFlowEvent],
    total_equity: Money,
    config: &WaterfallConfig,
    irr_settings: &IrrSettings,
) -> ProFormaResult<WaterfallResult> {
    validate_config(config)?;
    if total_equity < Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "total_equity".into(),
            reason: "Total equity cannot be negative".into(),
        });
    }

    let gp_share = pct(config.gp_contribution_percent);
    let lp_share = Decimal::ONE - gp_share;
    let lp_invested = total_equity * lp_share;
    let gp_invested = total_equity * gp_share;
    let preferred_rate = pct(config.preferred_return_rate);

    let mut ledger = Ledger::default();
    let mut lp_distributions = Vec::new();
    let mut gp_distributions = Vec::new();
    let mut allocations = Vec::new();
    let mut lp_flows: Vec<(u32, Money)> = vec![(0, -lp_invested)];

    for event in cash_flows.iter().filter(|e| e.amount > Decimal::ZERO) {
        let mut remaining = event.amount;

        // --- Return of capital, pro rata to the capital split ---
        let pool = remaining;
        let lp_capital = (lp_invested - ledger.lp_capital_returned)
            .min(pool * lp_share)
            .max(Decimal::ZERO);
        let gp_capital = (gp_invested - ledger.gp_capital_returned)
            .min(pool * gp_share)
            .max(Decimal::ZERO);
        ledger.lp_capital_returned += lp_capital;
        ledger.gp_capital_returned += gp_capital;
        remaining -= lp_capital + gp_capital;

        // --- Preferred return accrued through this period ---
        let period = Decimal::from(event.period);
        let lp_accrued = lp_invested * preferred_rate * period;
        let gp_accrued = gp_invested * preferred_rate * period;
        let lp_preferred = remaining
            .min(lp_accrued - ledger.lp_preferred_paid)
            .max(Decimal::ZERO);
        remaining -= lp_preferred;
        let gp_preferred = remaining
            .min(gp_accrued - ledger.gp_preferred_paid)
            .max(Decimal::ZERO);
        remaining -= gp_preferred;
        ledger.lp_preferred_paid += lp_preferred;
        ledger.gp_preferred_paid += gp_preferred;

        // --- GP catch-up ---
        let gp_catch_up = remaining * pct(config.catch_up_percent);
        remaining -= gp_catch_up;

        // --- Promote ---
        let promote_tier = match config.tier_selection {
            PromoteTierSelection::FirstTier => 0,
            PromoteTierSelection::LpIrrHurdle => {
                let mut flows = lp_flows.clone();
                flows.push((event.period, lp_capital + lp_preferred));
                select_tier_by_irr(&flows, &config.promote_tiers, irr_settings)?
            }
        };
        let tier = &config.promote_tiers[promote_tier];
        let lp_promote = remaining * pct(tier.lp_split);
        let gp_promote = remaining - lp_promote;

        let lp_amount = lp_capital + lp_preferred + lp_promote;
        let gp_amount = gp_capital + gp_preferred + gp_catch_up + gp_promote;
        ledger.lp_cumulative += lp_amount;
        ledger.gp_cumulative += gp_amount;
        lp_flows.push((event.period, lp_amount));

        lp_distributions.push(Distribution {
            period: event.period,
            amount: lp_amount,
            cumulative: ledger.lp_cumulative,
        });
        gp_distributions.push(Distribution {
            period: event.period,
            amount: gp_amount,
            cumulative: ledger.gp_cumulative,
        });
        allocations.push(WaterfallAllocation {
            period: event.period,
            cash_available: event.amount,
            lp_capital,
            gp_capital,
            lp_preferred,
            gp_preferred,
            gp_catch_up,
            lp_promote,
            gp_promote,
            promote_tier,
        });
    }

    log::debug!(
        "Waterfall: {} distributions, LP {} / GP {}",
        allocations.len(),
        ledger.lp_cumulative,
        ledger.gp_cumulative
    );

    let multiple = |total: Money, invested: Money| {
        if invested.is_zero() {
            None
        } else {
            Some(total / invested)
        }
    };

    Ok(WaterfallResult {
        lp_invested,
        gp_invested,
        lp_distributions,
        gp_distributions,
        allocations,
        lp_total_distributed: ledger.lp_cumulative,
        gp_total_distributed: ledger.gp_cumulative,
        lp_multiple: multiple(ledger.lp_cumulative, lp_invested),
        gp_multiple: multiple(ledger.gp_cumulative, gp_invested),
    })
}

/// Highest tier whose hurdle is at or below the LP's realised IRR. Falls back
/// to the first tier below the first hurdle or when the IRR does not solve.
fn select_tier_by_irr(
    lp_flows: &[(u32, Money)],
    tiers: &[PromoteTier],
    settings: &IrrSettings,
) -> ProFormaResult<usize> {
    let realised = irr(lp_flows, settings)?;
    if !realised.converged {
        return Ok(0);
    }
    let realised_pct = realised.rate * dec!(100);
    Ok(tiers
        .iter()
        .rposition(|t| t.hurdle_irr <= realised_pct)
        .unwrap_or(0))
}

fn validate_config(config: &WaterfallConfig) -> ProFormaResult<()> {
    if config.gp_contribution_percent < Decimal::ZERO
        || config.gp_contribution_percent > dec!(100)
    {
        return Err(ProFormaError::InvalidInput {
            field: "gp_contribution_percent".into(),
            reason: "GP contribution must be between 0 and 100 percent".into(),
        });
    }
    if config.catch_up_percent < Decimal::ZERO || config.catch_up_percent > dec!(100) {
        return Err(ProFormaError::InvalidInput {
            field: "catch_up_percent".into(),
            reason: "Catch-up must be between 0 and 100 percent".into(),
        });
    }
    if config.preferred_return_rate < Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "preferred_return_rate".into(),
            reason: "Preferred return cannot be negative".into(),
        });
    }
    if config.promote_tiers.is_empty() {
        return Err(ProFormaError::InvalidInput {
            field: "promote_tiers".into(),
            reason: "At least one promote tier is required".into(),
        });
    }
    for (i, tier) in config.promote_tiers.iter().enumerate() {
        if tier.lp_split < Decimal::ZERO || tier.gp_split < Decimal::ZERO {
            return Err(ProFormaError::InvalidInput {
                field: format!("promote_tiers[{i}]"),
                reason: "Splits cannot be negative".into(),
            });
        }
        if tier.lp_split + tier.gp_split != dec!(100) {
            return Err(ProFormaError::InvalidInput {
                field: format!("promote_tiers[{i}]"),
                reason: format!(
                    "LP split {} and GP split {} must sum to 100",
                    tier.lp_split, tier.gp_split
                ),
            });
        }
    }
    if config
        .promote_tiers
        .windows(2)
        .any(|w| w[1].hurdle_irr < w[0].hurdle_irr)
    {
        return Err(ProFormaError::InvalidInput {
            field: "promote_tiers".into(),
            reason: "Tiers must be ordered by ascending hurdle IRR".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
