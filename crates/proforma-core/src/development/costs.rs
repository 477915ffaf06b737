use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::inputs::{
    ArchitecturalCostMode, EngineAssumptions, LandCostMode, ProjectInput, PropertyType,
    SpaceLayout,
};
use crate::error::ProFormaError;
use crate::time_value::monthly_payment;
use crate::types::{pct, Money, Rate, SquareFeet, MAX_AMOUNT};
use crate::ProFormaResult;

/// Square feet in one acre.
pub const SQUARE_FEET_PER_ACRE: Decimal = dec!(43560);

/// Longest hold period, in years.
pub const MAX_HOLD_YEARS: u32 = 100;
/// Longest construction phase, in months.
pub const MAX_CONSTRUCTION_MONTHS: u32 = 120;
/// Longest permanent loan amortisation, in years.
pub const MAX_AMORTIZATION_YEARS: u32 = 50;
/// Largest area, price or per-SF figure accepted on input (1e10).
const MAX_INPUT_MAGNITUDE: Decimal = dec!(10000000000);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Areas and the full land / hard / soft cost build-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentBudget {
    pub rentable_sf: SquareFeet,
    pub useable_sf: SquareFeet,
    pub site_area_sf: SquareFeet,
    pub land_cost: Money,
    pub shell_cost: Money,
    pub site_cost: Money,
    pub tenant_improvements: Money,
    /// Shell + site + TI
    pub hard_costs: Money,
    pub architectural_fee: Money,
    pub contingency: Money,
    pub soft_costs_other: Money,
    pub development_fee: Money,
    /// Architectural + contingency + other + development fee
    pub soft_costs: Money,
    /// Land + hard + soft (before construction interest)
    pub total_project_cost: Money,
}

/// Construction and permanent loan sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingSummary {
    pub construction_loan: Money,
    /// Average-balance approximation: loan × rate × term/12 × 0.5
    pub construction_interest: Money,
    /// Total project cost plus construction interest
    pub all_in_cost: Money,
    pub equity_required: Money,
    pub permanent_loan: Money,
    /// Cash returned to equity when the permanent loan takes out construction debt
    pub refinance_proceeds: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
}

/// Year-1 stabilised operating metrics and the ratios derived from them.
/// Ratios are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizedOperations {
    pub annual_rent: Money,
    pub vacancy_loss: Money,
    pub effective_gross_income: Money,
    pub management_fee: Money,
    pub operating_expenses: Money,
    pub insurance: Money,
    pub property_tax: Money,
    pub total_expenses: Money,
    pub noi: Money,
    pub reserves: Money,
    pub stabilized_value: Money,
    /// Stabilised value less all-in cost
    pub value_creation: Money,
    /// Value creation / all-in cost
    pub development_margin: Option<Rate>,
    /// (NOI − reserves) / annual debt service
    pub dscr: Option<Decimal>,
    /// NOI / permanent loan
    pub debt_yield: Option<Rate>,
    /// NOI / total project cost
    pub yield_on_cost: Option<Rate>,
}

/// Everything the static calculator derives from a `ProjectInput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentAnalysis {
    pub budget: DevelopmentBudget,
    pub financing: FinancingSummary,
    pub operations: StabilizedOperations,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Build the development budget, size both loans and compute stabilised
/// year-1 operations for a retail or office project.
pub fn analyze_development(
    input: &ProjectInput,
    property_type: PropertyType,
    assumptions: &EngineAssumptions,
    warnings: &mut Vec<String>,
) -> ProFormaResult<DevelopmentAnalysis> {
    let layout = property_type.layout()?;
    validate_input(input, layout, warnings)?;

    let budget = build_budget(input, layout, warnings)?;
    let operations = stabilize_operations(input, layout, assumptions)?;
    let financing = size_financing(input, &budget, &operations)?;
    let operations = with_ratios(operations, &budget, &financing);

    log::debug!(
        "{}: total cost {}, NOI {}, equity {}",
        property_type,
        budget.total_project_cost,
        operations.noi,
        financing.equity_required
    );

    Ok(DevelopmentAnalysis {
        budget,
        financing,
        operations,
    })
}

fn build_budget(
    input: &ProjectInput,
    layout: SpaceLayout,
    warnings: &mut Vec<String>,
) -> ProFormaResult<DevelopmentBudget> {
    let gross = input.gross_square_feet;
    let rentable_sf = gross * pct(input.rentable_percent);
    let useable_sf = gross * pct(input.useable_percent);
    let site_area_sf = input.land_acres * SQUARE_FEET_PER_ACRE;

    let land_cost = match input.land_cost_mode {
        LandCostMode::PerAcre => input.land_acres * input.land_cost_per_acre,
        LandCostMode::Total => input.land_cost_total,
        LandCostMode::PerSiteArea => site_area_sf * input.land_cost_per_sf,
    };

    let shell_cost = gross * input.construction_shell_per_sf;

    let (site_cost, tenant_improvements) = match layout {
        SpaceLayout::SingleTenant => (
            gross * input.construction_site_per_sf,
            gross * input.office_ti_per_sf,
        ),
        SpaceLayout::TenantRoll => {
            let site_less_building = site_area_sf - gross;
            if site_less_building < Decimal::ZERO && !input.construction_site_per_sf.is_zero() {
                warnings.push(format!(
                    "Site area of {site_area_sf} SF is smaller than the {gross} SF building — site work cost is negative"
                ));
            }
            let ti: Money = input
                .tenants
                .iter()
                .map(|t| t.square_feet * t.ti_per_sf)
                .sum();
            (site_less_building * input.construction_site_per_sf, ti)
        }
    };

    let hard_costs = shell_cost + site_cost + tenant_improvements;

    let architectural_fee = match input.architectural_mode {
        ArchitecturalCostMode::Percent => hard_costs * pct(input.architectural_percent),
        ArchitecturalCostMode::Fixed => input.architectural_fixed,
    };
    let contingency = hard_costs * pct(input.contingency_percent);
    let soft_costs =
        architectural_fee + contingency + input.soft_costs_other + input.development_fee;

    let total_project_cost = land_cost + hard_costs + soft_costs;
    if total_project_cost <= Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "total_project_cost".into(),
            reason: "Land, hard and soft costs must sum to a positive amount".into(),
        });
    }

    Ok(DevelopmentBudget {
        rentable_sf,
        useable_sf,
        site_area_sf,
        land_cost,
        shell_cost,
        site_cost,
        tenant_improvements,
        hard_costs,
        architectural_fee,
        contingency,
        soft_costs_other: input.soft_costs_other,
        development_fee: input.development_fee,
        soft_costs,
        total_project_cost,
    })
}

fn stabilize_operations(
    input: &ProjectInput,
    layout: SpaceLayout,
    assumptions: &EngineAssumptions,
) -> ProFormaResult<StabilizedOperations> {
    let gross = input.gross_square_feet;

    let annual_rent = match layout {
        SpaceLayout::SingleTenant => {
            gross * pct(input.rentable_percent) * input.office_rent_per_sf
        }
        SpaceLayout::TenantRoll => input
            .tenants
            .iter()
            .map(|t| t.square_feet * t.rent_per_sf)
            .sum(),
    };

    let vacancy_loss = annual_rent * pct(input.vacancy_rate);
    let effective_gross_income = annual_rent - vacancy_loss;

    let management_fee = effective_gross_income * pct(input.management_fee_percent);
    let operating_expenses = gross * input.operating_expenses_per_sf;
    let insurance = gross * input.insurance_per_sf;
    let property_tax = gross
        * input
            .property_tax_per_sf
            .unwrap_or(assumptions.default_property_tax_per_sf);
    let total_expenses = management_fee + operating_expenses + insurance + property_tax;

    let noi = effective_gross_income - total_expenses;
    let reserves =
        annual_rent * (pct(input.leasing_reserve_percent) + pct(input.capex_reserve_percent));

    // A positive cap rate can still round to zero once converted from points.
    let cap = pct(input.going_in_cap_rate);
    if cap.is_zero() {
        return Err(ProFormaError::DivisionByZero {
            context: "stabilized value (NOI / going_in_cap_rate)".into(),
        });
    }
    let stabilized_value = noi
        .checked_div(cap)
        .filter(|value| value.abs() <= MAX_AMOUNT)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "going_in_cap_rate".into(),
            reason: format!("Capitalising NOI of {noi} at {cap} is out of range"),
        })?;

    Ok(StabilizedOperations {
        annual_rent,
        vacancy_loss,
        effective_gross_income,
        management_fee,
        operating_expenses,
        insurance,
        property_tax,
        total_expenses,
        noi,
        reserves,
        stabilized_value,
        value_creation: Decimal::ZERO,
        development_margin: None,
        dscr: None,
        debt_yield: None,
        yield_on_cost: None,
    })
}

fn size_financing(
    input: &ProjectInput,
    budget: &DevelopmentBudget,
    operations: &StabilizedOperations,
) -> ProFormaResult<FinancingSummary> {
    let construction_loan = budget.total_project_cost * pct(input.construction_loan_ltc);
    let construction_interest = construction_loan
        * pct(input.construction_loan_rate)
        * (Decimal::from(input.construction_months) / dec!(12))
        * dec!(0.5);
    let all_in_cost = budget.total_project_cost + construction_interest;
    let equity_required = all_in_cost - construction_loan;

    let permanent_loan = operations.stabilized_value * pct(input.permanent_loan_ltv);
    let refinance_proceeds =
        (permanent_loan - construction_loan - construction_interest).max(Decimal::ZERO);

    let monthly = monthly_payment(
        permanent_loan,
        pct(input.permanent_loan_rate),
        input.permanent_loan_amortization_years,
    )?;

    Ok(FinancingSummary {
        construction_loan,
        construction_interest,
        all_in_cost,
        equity_required,
        permanent_loan,
        refinance_proceeds,
        monthly_payment: monthly,
        annual_debt_service: monthly * dec!(12),
    })
}

fn with_ratios(
    operations: StabilizedOperations,
    budget: &DevelopmentBudget,
    financing: &FinancingSummary,
) -> StabilizedOperations {
    let value_creation = operations.stabilized_value - financing.all_in_cost;
    let cash_flow_before_debt = operations.noi - operations.reserves;

    StabilizedOperations {
        value_creation,
        development_margin: ratio(value_creation, financing.all_in_cost),
        dscr: ratio(cash_flow_before_debt, financing.annual_debt_service),
        debt_yield: ratio(operations.noi, financing.permanent_loan),
        yield_on_cost: ratio(operations.noi, budget.total_project_cost),
        ..operations
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub(crate) fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(numerator / denominator)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(
    input: &ProjectInput,
    layout: SpaceLayout,
    warnings: &mut Vec<String>,
) -> ProFormaResult<()> {
    if input.gross_square_feet <= Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "gross_square_feet".into(),
            reason: "Gross square feet must be positive".into(),
        });
    }

    let bounded = [
        ("rentable_percent", input.rentable_percent),
        ("useable_percent", input.useable_percent),
        ("vacancy_rate", input.vacancy_rate),
        ("construction_loan_ltc", input.construction_loan_ltc),
        ("construction_loan_rate", input.construction_loan_rate),
        ("permanent_loan_ltv", input.permanent_loan_ltv),
        ("permanent_loan_rate", input.permanent_loan_rate),
        ("management_fee_percent", input.management_fee_percent),
        ("contingency_percent", input.contingency_percent),
        ("architectural_percent", input.architectural_percent),
        ("leasing_reserve_percent", input.leasing_reserve_percent),
        ("capex_reserve_percent", input.capex_reserve_percent),
    ];
    for (field, value) in bounded {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(ProFormaError::InvalidInput {
                field: field.into(),
                reason: format!("Must be between 0 and 100 percent, got {value}"),
            });
        }
    }

    if input.land_acres < Decimal::ZERO {
        return Err(ProFormaError::InvalidInput {
            field: "land_acres".into(),
            reason: format!("Must not be negative, got {}", input.land_acres),
        });
    }

    let magnitudes = [
        ("gross_square_feet", input.gross_square_feet),
        ("land_acres", input.land_acres),
        ("land_cost_per_acre", input.land_cost_per_acre),
        ("land_cost_total", input.land_cost_total),
        ("land_cost_per_sf", input.land_cost_per_sf),
        ("construction_shell_per_sf", input.construction_shell_per_sf),
        ("construction_site_per_sf", input.construction_site_per_sf),
        ("office_ti_per_sf", input.office_ti_per_sf),
        ("architectural_fixed", input.architectural_fixed),
        ("soft_costs_other", input.soft_costs_other),
        ("development_fee", input.development_fee),
        ("office_rent_per_sf", input.office_rent_per_sf),
        ("operating_expenses_per_sf", input.operating_expenses_per_sf),
        ("insurance_per_sf", input.insurance_per_sf),
        (
            "property_tax_per_sf",
            input.property_tax_per_sf.unwrap_or(Decimal::ZERO),
        ),
        ("rent_growth", input.rent_growth),
        ("expense_growth", input.expense_growth),
        (
            "property_tax_growth",
            input.property_tax_growth.unwrap_or(Decimal::ZERO),
        ),
    ];
    for (field, value) in magnitudes {
        if value.abs() > MAX_INPUT_MAGNITUDE {
            return Err(ProFormaError::InvalidInput {
                field: field.into(),
                reason: format!("Magnitude of {value} exceeds {MAX_INPUT_MAGNITUDE}"),
            });
        }
    }

    for (field, value) in [
        ("going_in_cap_rate", input.going_in_cap_rate),
        ("exit_cap_rate", input.exit_cap_rate),
    ] {
        if value <= Decimal::ZERO {
            return Err(ProFormaError::InvalidInput {
                field: field.into(),
                reason: "Cap rate must be positive".into(),
            });
        }
    }

    if input.hold_years < 1 || input.hold_years > MAX_HOLD_YEARS {
        return Err(ProFormaError::InvalidInput {
            field: "hold_years".into(),
            reason: format!(
                "Hold period must be between 1 and {MAX_HOLD_YEARS} years, got {}",
                input.hold_years
            ),
        });
    }
    if input.construction_months > MAX_CONSTRUCTION_MONTHS {
        return Err(ProFormaError::InvalidInput {
            field: "construction_months".into(),
            reason: format!(
                "Construction phase must not exceed {MAX_CONSTRUCTION_MONTHS} months, got {}",
                input.construction_months
            ),
        });
    }
    if input.permanent_loan_amortization_years > MAX_AMORTIZATION_YEARS {
        return Err(ProFormaError::InvalidInput {
            field: "permanent_loan_amortization_years".into(),
            reason: format!(
                "Amortization term must not exceed {MAX_AMORTIZATION_YEARS} years, got {}",
                input.permanent_loan_amortization_years
            ),
        });
    }

    if layout == SpaceLayout::TenantRoll {
        if input.tenants.is_empty() {
            return Err(ProFormaError::InvalidInput {
                field: "tenants".into(),
                reason: "At least one tenant is required for a tenant-roll property".into(),
            });
        }
        for tenant in &input.tenants {
            if tenant.square_feet < Decimal::ZERO {
                return Err(ProFormaError::InvalidInput {
                    field: format!("tenants[{}].square_feet", tenant.name),
                    reason: "Tenant area must not be negative".into(),
                });
            }
            for (name, value) in [
                ("square_feet", tenant.square_feet),
                ("rent_per_sf", tenant.rent_per_sf),
                ("ti_per_sf", tenant.ti_per_sf),
            ] {
                if value.abs() > MAX_INPUT_MAGNITUDE {
                    return Err(ProFormaError::InvalidInput {
                        field: format!("tenants[{}].{name}", tenant.name),
                        reason: format!("Magnitude of {value} exceeds {MAX_INPUT_MAGNITUDE}"),
                    });
                }
            }
        }
        let leased: SquareFeet = input.tenants.iter().map(|t| t.square_feet).sum();
        let rentable = input.gross_square_feet * pct(input.rentable_percent);
        if leased > rentable {
            warnings.push(format!(
                "Tenant roll covers {leased} SF, more than the {rentable} SF rentable area"
            ));
        }
    }

    let cap = input.going_in_cap_rate;
    if cap < dec!(3) {
        warnings.push(format!(
            "Going-in cap rate {cap}% is below 3% — unusually low, verify market data"
        ));
    }
    if input.vacancy_rate > dec!(15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            input.vacancy_rate
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::development::inputs::Tenant;
    use rust_decimal_macros::dec;

    fn tenant(name: &str, sf: Decimal, rent: Decimal) -> Tenant {
        Tenant {
            name: name.into(),
            square_feet: sf,
            rent_per_sf: rent,
            ti_per_sf: dec!(35),
        }
    }

    fn retail_input() -> ProjectInput {
        ProjectInput {
            name: "Retail Center".into(),
            gross_square_feet: dec!(9000),
            land_acres: dec!(1),
            land_cost_per_acre: dec!(500000),
            construction_shell_per_sf: dec!(130),
            construction_loan_ltc: dec!(70),
            construction_loan_rate: dec!(9.5),
            permanent_loan_ltv: dec!(75),
            permanent_loan_rate: dec!(7.5),
            vacancy_rate: dec!(5),
            management_fee_percent: dec!(3),
            operating_expenses_per_sf: dec!(5.50),
            insurance_per_sf: dec!(0.25),
            capex_reserve_percent: dec!(2),
            going_in_cap_rate: dec!(7.0),
            exit_cap_rate: dec!(7.5),
            tenants: vec![
                tenant("Suite 1", dec!(2800), dec!(47)),
                tenant("Suite 2", dec!(1200), dec!(47)),
                tenant("Suite 3", dec!(2500), dec!(45)),
                tenant("Suite 4", dec!(2500), dec!(45)),
            ],
            ..ProjectInput::default()
        }
    }

    fn office_input() -> ProjectInput {
        ProjectInput {
            name: "Office Building".into(),
            gross_square_feet: dec!(12000),
            rentable_percent: dec!(97.5),
            useable_percent: dec!(90),
            land_acres: dec!(2.33),
            land_cost_per_acre: dec!(367596),
            construction_shell_per_sf: dec!(72),
            construction_site_per_sf: dec!(56.245),
            architectural_percent: dec!(4.5),
            development_fee: dec!(75000),
            soft_costs_other: dec!(200000),
            office_rent_per_sf: dec!(18.50),
            office_ti_per_sf: dec!(60),
            construction_loan_ltc: dec!(90),
            construction_loan_rate: dec!(6.25),
            permanent_loan_ltv: dec!(90),
            permanent_loan_rate: dec!(5.25),
            vacancy_rate: dec!(3),
            leasing_reserve_percent: dec!(3),
            capex_reserve_percent: dec!(1.5),
            going_in_cap_rate: dec!(7.5),
            exit_cap_rate: dec!(7.5),
            ..ProjectInput::default()
        }
    }

    fn analyze(input: &ProjectInput, pt: PropertyType) -> DevelopmentAnalysis {
        let mut warnings = Vec::new();
        analyze_development(input, pt, &EngineAssumptions::default(), &mut warnings).unwrap()
    }

    #[test]
    fn test_retail_rent_roll() {
        let result = analyze(&retail_input(), PropertyType::Retail);
        // 2800×47 + 1200×47 + 2500×45 + 2500×45
        assert_eq!(result.operations.annual_rent, dec!(376700));
        assert_eq!(result.operations.vacancy_loss, dec!(18835));
        assert_eq!(result.operations.effective_gross_income, dec!(357865));
    }

    #[test]
    fn test_retail_noi_and_value() {
        let result = analyze(&retail_input(), PropertyType::Retail);
        let ops = &result.operations;
        // mgmt 3% of EGI + 5.50 + 0.25 + 2.50 default tax per SF
        let expected_expenses = dec!(357865) * dec!(0.03) + dec!(9000) * dec!(8.25);
        assert_eq!(ops.total_expenses, expected_expenses);
        assert_eq!(ops.noi, dec!(357865) - expected_expenses);
        assert_eq!(ops.stabilized_value, ops.noi / dec!(0.07));
        assert_eq!(ops.property_tax, dec!(22500));
    }

    #[test]
    fn test_retail_cost_buildup() {
        let result = analyze(&retail_input(), PropertyType::Retail);
        let b = &result.budget;
        assert_eq!(b.site_area_sf, dec!(43560));
        assert_eq!(b.land_cost, dec!(500000));
        assert_eq!(b.shell_cost, dec!(1170000));
        // TI: 9000 SF × $35 across the tenant roll
        assert_eq!(b.tenant_improvements, dec!(315000));
        assert_eq!(
            b.total_project_cost,
            b.land_cost + b.hard_costs + b.soft_costs
        );
    }

    #[test]
    fn test_office_branch_uses_gross_area() {
        let result = analyze(&office_input(), PropertyType::Office);
        let b = &result.budget;
        assert_eq!(b.rentable_sf, dec!(11700));
        assert_eq!(b.useable_sf, dec!(10800));
        assert_eq!(b.site_cost, dec!(12000) * dec!(56.245));
        assert_eq!(b.tenant_improvements, dec!(720000));
        assert_eq!(b.architectural_fee, b.hard_costs * dec!(0.045));
        assert_eq!(result.operations.annual_rent, dec!(11700) * dec!(18.50));
    }

    #[test]
    fn test_financing_sizing() {
        let result = analyze(&office_input(), PropertyType::Office);
        let b = &result.budget;
        let f = &result.financing;
        assert_eq!(f.construction_loan, b.total_project_cost * dec!(0.90));
        // 12 months at 6.25%, half outstanding on average
        assert_eq!(
            f.construction_interest,
            f.construction_loan * dec!(0.0625) * dec!(0.5)
        );
        assert_eq!(
            f.equity_required,
            b.total_project_cost + f.construction_interest - f.construction_loan
        );
        assert_eq!(f.annual_debt_service, f.monthly_payment * dec!(12));
        assert!(f.refinance_proceeds >= Decimal::ZERO);
    }

    #[test]
    fn test_ratios_computed_from_unrounded_values() {
        let result = analyze(&office_input(), PropertyType::Office);
        let ops = &result.operations;
        let f = &result.financing;
        assert_eq!(
            ops.dscr.unwrap(),
            (ops.noi - ops.reserves) / f.annual_debt_service
        );
        assert_eq!(ops.debt_yield.unwrap(), ops.noi / f.permanent_loan);
        assert_eq!(
            ops.development_margin.unwrap(),
            ops.value_creation / f.all_in_cost
        );
    }

    #[test]
    fn test_no_permanent_debt_gives_undefined_ratios() {
        let mut input = office_input();
        input.permanent_loan_ltv = Decimal::ZERO;
        let result = analyze(&input, PropertyType::Office);
        assert!(result.operations.dscr.is_none());
        assert!(result.operations.debt_yield.is_none());
        assert!(result.operations.yield_on_cost.is_some());
    }

    #[test]
    fn test_land_cost_modes() {
        let mut input = office_input();
        input.land_cost_mode = LandCostMode::Total;
        input.land_cost_total = dec!(850000);
        assert_eq!(analyze(&input, PropertyType::Office).budget.land_cost, dec!(850000));

        input.land_cost_mode = LandCostMode::PerSiteArea;
        input.land_cost_per_sf = dec!(4);
        assert_eq!(
            analyze(&input, PropertyType::Office).budget.land_cost,
            dec!(2.33) * dec!(43560) * dec!(4)
        );
    }

    #[test]
    fn test_fixed_architectural_fee() {
        let mut input = office_input();
        input.architectural_mode = ArchitecturalCostMode::Fixed;
        input.architectural_fixed = dec!(125000);
        assert_eq!(
            analyze(&input, PropertyType::Office).budget.architectural_fee,
            dec!(125000)
        );
    }

    #[test]
    fn test_explicit_property_tax_overrides_default() {
        let mut input = retail_input();
        input.property_tax_per_sf = Some(dec!(3));
        assert_eq!(
            analyze(&input, PropertyType::Retail).operations.property_tax,
            dec!(27000)
        );
    }

    #[test]
    fn test_unsupported_property_type() {
        let mut warnings = Vec::new();
        let result = analyze_development(
            &retail_input(),
            PropertyType::Hotel,
            &EngineAssumptions::default(),
            &mut warnings,
        );
        match result.unwrap_err() {
            ProFormaError::UnsupportedPropertyType { property_type } => {
                assert_eq!(property_type, "hotel");
            }
            other => panic!("Expected UnsupportedPropertyType, got: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_zero_cap_rate() {
        let mut input = retail_input();
        input.going_in_cap_rate = Decimal::ZERO;
        let mut warnings = Vec::new();
        let result = analyze_development(
            &input,
            PropertyType::Retail,
            &EngineAssumptions::default(),
            &mut warnings,
        );
        match result.unwrap_err() {
            ProFormaError::InvalidInput { field, .. } => assert_eq!(field, "going_in_cap_rate"),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_retail_requires_tenants() {
        let mut input = retail_input();
        input.tenants.clear();
        let mut warnings = Vec::new();
        assert!(analyze_development(
            &input,
            PropertyType::Retail,
            &EngineAssumptions::default(),
            &mut warnings
        )
        .is_err());
    }

    #[test]
    fn test_rentable_percent_above_100_rejected() {
        let mut input = office_input();
        input.rentable_percent = dec!(120);
        let mut warnings = Vec::new();
        assert!(analyze_development(
            &input,
            PropertyType::Office,
            &EngineAssumptions::default(),
            &mut warnings
        )
        .is_err());
    }

    #[test]
    fn test_cap_rate_rounding_to_zero_is_division_by_zero() {
        let mut input = retail_input();
        input.going_in_cap_rate = dec!(0.0000000000000000000000000001);
        let mut warnings = Vec::new();
        let result = analyze_development(
            &input,
            PropertyType::Retail,
            &EngineAssumptions::default(),
            &mut warnings,
        );
        assert!(matches!(result, Err(ProFormaError::DivisionByZero { .. })));
    }

    #[test]
    fn test_tiny_cap_rate_value_out_of_range() {
        let mut input = office_input();
        input.going_in_cap_rate = dec!(0.0000000000000000000001);
        let mut warnings = Vec::new();
        match analyze_development(
            &input,
            PropertyType::Office,
            &EngineAssumptions::default(),
            &mut warnings,
        )
        .unwrap_err()
        {
            ProFormaError::InvalidInput { field, .. } => assert_eq!(field, "going_in_cap_rate"),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_loan_rate_above_100_rejected() {
        let mut input = office_input();
        input.permanent_loan_rate = dec!(250);
        let mut warnings = Vec::new();
        match analyze_development(
            &input,
            PropertyType::Office,
            &EngineAssumptions::default(),
            &mut warnings,
        )
        .unwrap_err()
        {
            ProFormaError::InvalidInput { field, .. } => assert_eq!(field, "permanent_loan_rate"),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_area_rejected() {
        let mut input = office_input();
        input.gross_square_feet = dec!(100000000000000000000);
        let mut warnings = Vec::new();
        assert!(matches!(
            analyze_development(
                &input,
                PropertyType::Office,
                &EngineAssumptions::default(),
                &mut warnings
            ),
            Err(ProFormaError::InvalidInput { ref field, .. }) if field == "gross_square_feet"
        ));
    }
}
