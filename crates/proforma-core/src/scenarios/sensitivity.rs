use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::development::inputs::{LandCostMode, ProjectInput};
use crate::development::pro_forma::{run_pro_forma, ProFormaRequest};
use crate::error::ProFormaError;
use crate::types::*;
use crate::ProFormaResult;

/// Numeric project inputs that can be flexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SensitivityField {
    ConstructionShellPerSf,
    ConstructionSitePerSf,
    OfficeTiPerSf,
    OfficeRentPerSf,
    /// Every tenant's rent per SF
    TenantRentPerSf,
    /// The land price field for the active land-cost mode
    LandCost,
    VacancyRate,
    OperatingExpensesPerSf,
    GoingInCapRate,
    ExitCapRate,
    ConstructionLoanRate,
    PermanentLoanRate,
    ConstructionLoanLtc,
    PermanentLoanLtv,
    RentGrowth,
    ExpenseGrowth,
}

const ALL_FIELDS: [SensitivityField; 16] = [
    SensitivityField::ConstructionShellPerSf,
    SensitivityField::ConstructionSitePerSf,
    SensitivityField::OfficeTiPerSf,
    SensitivityField::OfficeRentPerSf,
    SensitivityField::TenantRentPerSf,
    SensitivityField::LandCost,
    SensitivityField::VacancyRate,
    SensitivityField::OperatingExpensesPerSf,
    SensitivityField::GoingInCapRate,
    SensitivityField::ExitCapRate,
    SensitivityField::ConstructionLoanRate,
    SensitivityField::PermanentLoanRate,
    SensitivityField::ConstructionLoanLtc,
    SensitivityField::PermanentLoanLtv,
    SensitivityField::RentGrowth,
    SensitivityField::ExpenseGrowth,
];

impl SensitivityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityField::ConstructionShellPerSf => "construction_shell_per_sf",
            SensitivityField::ConstructionSitePerSf => "construction_site_per_sf",
            SensitivityField::OfficeTiPerSf => "office_ti_per_sf",
            SensitivityField::OfficeRentPerSf => "office_rent_per_sf",
            SensitivityField::TenantRentPerSf => "tenant_rent_per_sf",
            SensitivityField::LandCost => "land_cost",
            SensitivityField::VacancyRate => "vacancy_rate",
            SensitivityField::OperatingExpensesPerSf => "operating_expenses_per_sf",
            SensitivityField::GoingInCapRate => "going_in_cap_rate",
            SensitivityField::ExitCapRate => "exit_cap_rate",
            SensitivityField::ConstructionLoanRate => "construction_loan_rate",
            SensitivityField::PermanentLoanRate => "permanent_loan_rate",
            SensitivityField::ConstructionLoanLtc => "construction_loan_ltc",
            SensitivityField::PermanentLoanLtv => "permanent_loan_ltv",
            SensitivityField::RentGrowth => "rent_growth",
            SensitivityField::ExpenseGrowth => "expense_growth",
        }
    }

    fn slot(self, input: &mut ProjectInput) -> Option<&mut Decimal> {
        let slot = match self {
            SensitivityField::ConstructionShellPerSf => &mut input.construction_shell_per_sf,
            SensitivityField::ConstructionSitePerSf => &mut input.construction_site_per_sf,
            SensitivityField::OfficeTiPerSf => &mut input.office_ti_per_sf,
            SensitivityField::OfficeRentPerSf => &mut input.office_rent_per_sf,
            SensitivityField::TenantRentPerSf => return None,
            SensitivityField::LandCost => match input.land_cost_mode {
                LandCostMode::PerAcre => &mut input.land_cost_per_acre,
                LandCostMode::Total => &mut input.land_cost_total,
                LandCostMode::PerSiteArea => &mut input.land_cost_per_sf,
            },
            SensitivityField::VacancyRate => &mut input.vacancy_rate,
            SensitivityField::OperatingExpensesPerSf => &mut input.operating_expenses_per_sf,
            SensitivityField::GoingInCapRate => &mut input.going_in_cap_rate,
            SensitivityField::ExitCapRate => &mut input.exit_cap_rate,
            SensitivityField::ConstructionLoanRate => &mut input.construction_loan_rate,
            SensitivityField::PermanentLoanRate => &mut input.permanent_loan_rate,
            SensitivityField::ConstructionLoanLtc => &mut input.construction_loan_ltc,
            SensitivityField::PermanentLoanLtv => &mut input.permanent_loan_ltv,
            SensitivityField::RentGrowth => &mut input.rent_growth,
            SensitivityField::ExpenseGrowth => &mut input.expense_growth,
        };
        Some(slot)
    }

    /// Current value of the field. Tenant rents report the area-weighted
    /// average; `None` if that average leaves `Decimal` range.
    pub fn value(self, input: &ProjectInput) -> Option<Decimal> {
        let mut scratch = input.clone();
        match self.slot(&mut scratch) {
            Some(v) => Some(*v),
            None => {
                let (area, rent) = input.tenants.iter().try_fold(
                    (Decimal::ZERO, Decimal::ZERO),
                    |(area, rent), t| {
                        Some((
                            area.checked_add(t.square_feet)?,
                            rent.checked_add(t.square_feet.checked_mul(t.rent_per_sf)?)?,
                        ))
                    },
                )?;
                if area.is_zero() {
                    Some(Decimal::ZERO)
                } else {
                    rent.checked_div(area)
                }
            }
        }
    }

    /// Multiply the field by `factor` in place.
    pub fn scale(self, input: &mut ProjectInput, factor: Decimal) -> ProFormaResult<()> {
        let overflow = || ProFormaError::InvalidInput {
            field: self.as_str().into(),
            reason: format!("Scaling by {factor} overflows"),
        };
        match self.slot(input) {
            Some(v) => *v = v.checked_mul(factor).ok_or_else(overflow)?,
            None => {
                for tenant in &mut input.tenants {
                    tenant.rent_per_sf = tenant.rent_per_sf.checked_mul(factor).ok_or_else(overflow)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SensitivityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensitivityField {
    type Err = ProFormaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FIELDS
            .iter()
            .copied()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| ProFormaError::InvalidMode {
                field: "sensitivity.field".into(),
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for SensitivityField {
    type Error = ProFormaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SensitivityField> for String {
    fn from(value: SensitivityField) -> Self {
        value.as_str().to_string()
    }
}

/// One input to flex and the percentage adjustments to apply to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub field: SensitivityField,
    /// Adjustments in percent, e.g. [-10, 0, 10]
    pub ranges: Vec<Percent>,
}

/// Headline metrics for one adjustment. A scenario that fails carries its
/// error and no metrics; its siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub adjustment: Percent,
    /// Field value after the adjustment
    pub value: Option<Decimal>,
    pub equity_irr: Option<Rate>,
    pub irr_converged: bool,
    pub development_margin: Option<Rate>,
    pub dscr: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// All adjustments for one variable, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub variable: String,
    pub field: SensitivityField,
    pub results: Vec<SensitivityPoint>,
}

/// A base request with its sensitivity sweep, as read from a request file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    #[serde(flatten)]
    pub base: ProFormaRequest,
    #[serde(default)]
    pub sensitivities: Vec<SensitivityVariable>,
}

/// Re-run the full pro forma for every (variable, adjustment) pair on an
/// independent copy of the base input. Only an empty sweep fails the call;
/// a failing scenario is reported on its own row and in the warnings.
pub fn run_sensitivity(
    base: &ProFormaRequest,
    variables: &[SensitivityVariable],
) -> ProFormaResult<ComputationOutput<Vec<SensitivityResult>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if variables.is_empty() {
        return Err(ProFormaError::InvalidInput {
            field: "sensitivities".into(),
            reason: "At least one sensitivity variable is required".into(),
        });
    }

    for variable in variables {
        if variable.ranges.is_empty() {
            return Err(ProFormaError::InvalidInput {
                field: format!("variable:{}", variable.name),
                reason: "At least one adjustment is required".into(),
            });
        }
    }

    let scenarios: Vec<(usize, Percent)> = variables
        .iter()
        .enumerate()
        .flat_map(|(i, v)| v.ranges.iter().map(move |adj| (i, *adj)))
        .collect();

    let evaluate = |(index, adjustment): &(usize, Percent)| {
        evaluate_scenario(base, &variables[*index], *adjustment)
    };

    #[cfg(feature = "parallel")]
    let points: Vec<SensitivityPoint> = {
        use rayon::prelude::*;
        scenarios.par_iter().map(evaluate).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let points: Vec<SensitivityPoint> = scenarios.iter().map(evaluate).collect();

    let mut points = points.into_iter();
    let mut output = Vec::with_capacity(variables.len());
    for variable in variables {
        let results: Vec<SensitivityPoint> =
            points.by_ref().take(variable.ranges.len()).collect();
        for point in &results {
            if let Some(error) = &point.error {
                warnings.push(format!(
                    "Sensitivity {} {}% failed: {error}",
                    variable.name, point.adjustment
                ));
            }
        }
        output.push(SensitivityResult {
            variable: variable.name.clone(),
            field: variable.field,
            results,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Way Sensitivity Analysis (full pro forma re-run per adjustment)",
        &serde_json::json!({
            "property_type": base.property_type,
            "variables": variables.iter().map(|v| v.field.as_str()).collect::<Vec<_>>(),
            "scenarios": scenarios.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn evaluate_scenario(
    base: &ProFormaRequest,
    variable: &SensitivityVariable,
    adjustment: Percent,
) -> SensitivityPoint {
    let mut request = base.clone();
    let scaled = if adjustment.is_zero() {
        Ok(())
    } else {
        variable
            .field
            .scale(&mut request.project, Decimal::ONE + pct(adjustment))
    };
    let value = scaled
        .as_ref()
        .ok()
        .and_then(|_| variable.field.value(&request.project));

    let mut warnings = Vec::new();
    match scaled.and_then(|_| run_pro_forma(&request, &mut warnings)) {
        Ok(result) => SensitivityPoint {
            adjustment,
            value,
            equity_irr: Some(result.returns.equity_irr.rate),
            irr_converged: result.returns.equity_irr.converged,
            development_margin: result.operations.development_margin,
            dscr: result.operations.dscr,
            error: None,
        },
        Err(e) => {
            log::warn!(
                "Sensitivity scenario {} {adjustment}% failed: {e}",
                variable.name
            );
            SensitivityPoint {
                adjustment,
                value,
                equity_irr: None,
                irr_converged: false,
                development_margin: None,
                dscr: None,
                error: Some(e.to_string()),
            }
        }
    }
}
