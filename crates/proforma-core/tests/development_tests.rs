use pretty_assertions::assert_eq;
use proforma_core::development::inputs::{LandCostMode, ProjectInput, PropertyType, Tenant};
use proforma_core::development::pro_forma::{calculate_pro_forma, run_pro_forma, ProFormaRequest};
use proforma_core::development::report::{ProFormaReport, NOT_APPLICABLE};
use proforma_core::ProFormaError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn tenant(name: &str, sf: Decimal, rent: Decimal) -> Tenant {
    Tenant {
        name: name.into(),
        square_feet: sf,
        rent_per_sf: rent,
        ti_per_sf: dec!(35),
    }
}

/// Four-suite strip center on one acre.
fn strip_center() -> ProFormaRequest {
    ProFormaRequest::new(
        PropertyType::Retail,
        ProjectInput {
            name: "Strip Center".into(),
            gross_square_feet: dec!(9000),
            rentable_percent: dec!(100),
            useable_percent: dec!(100),
            land_acres: dec!(1),
            land_cost_per_acre: dec!(450000),
            construction_shell_per_sf: dec!(125),
            construction_site_per_sf: dec!(12),
            architectural_percent: dec!(5),
            contingency_percent: dec!(5),
            soft_costs_other: dec!(60000),
            development_fee: dec!(80000),
            tenants: vec![
                tenant("Suite 100", dec!(2800), dec!(47)),
                tenant("Suite 200", dec!(1200), dec!(47)),
                tenant("Suite 300", dec!(2500), dec!(45)),
                tenant("Suite 400", dec!(2500), dec!(45)),
            ],
            construction_loan_ltc: dec!(70),
            construction_loan_rate: dec!(8),
            construction_months: 12,
            permanent_loan_ltv: dec!(70),
            permanent_loan_rate: dec!(6.5),
            permanent_loan_amortization_years: 25,
            vacancy_rate: dec!(5),
            management_fee_percent: dec!(4),
            operating_expenses_per_sf: dec!(6),
            insurance_per_sf: dec!(0.75),
            leasing_reserve_percent: dec!(2),
            capex_reserve_percent: dec!(1),
            going_in_cap_rate: dec!(6.5),
            exit_cap_rate: dec!(7),
            hold_years: 10,
            rent_growth: dec!(2.5),
            expense_growth: dec!(3),
            ..ProjectInput::default()
        },
    )
}

fn suburban_office() -> ProFormaRequest {
    ProFormaRequest::new(
        PropertyType::Office,
        ProjectInput {
            name: "Suburban Office".into(),
            gross_square_feet: dec!(12000),
            rentable_percent: dec!(97.5),
            useable_percent: dec!(90),
            land_acres: dec!(2.33),
            land_cost_per_acre: dec!(367596),
            construction_shell_per_sf: dec!(72),
            construction_site_per_sf: dec!(56.245),
            office_ti_per_sf: dec!(60),
            architectural_percent: dec!(4.5),
            soft_costs_other: dec!(200000),
            development_fee: dec!(75000),
            office_rent_per_sf: dec!(18.50),
            construction_loan_ltc: dec!(90),
            construction_loan_rate: dec!(6.25),
            construction_months: 18,
            permanent_loan_ltv: dec!(90),
            permanent_loan_rate: dec!(5.25),
            vacancy_rate: dec!(3),
            leasing_reserve_percent: dec!(3),
            capex_reserve_percent: dec!(1.5),
            going_in_cap_rate: dec!(7.5),
            exit_cap_rate: dec!(7.5),
            hold_years: 7,
            rent_growth: dec!(3),
            expense_growth: dec!(3),
            ..ProjectInput::default()
        },
    )
}

// ===========================================================================
// Revenue and value
// ===========================================================================

#[test]
fn test_retail_annual_rent_from_tenant_roll() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let ops = &out.result.operations;
    assert_eq!(ops.annual_rent, dec!(376700));
    assert_eq!(ops.vacancy_loss, dec!(18835));
    assert_eq!(ops.effective_gross_income, dec!(357865));
}

#[test]
fn test_retail_noi_and_value_derive_from_rent() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let ops = &out.result.operations;

    let egi = dec!(357865);
    // 4% management, then 6.00 + 0.75 + 2.50 default tax per SF over 9,000 SF
    let expenses = egi * dec!(0.04) + dec!(9000) * dec!(9.25);
    assert_eq!(ops.total_expenses, expenses);
    assert_eq!(ops.noi, egi - expenses);
    assert_eq!(ops.stabilized_value, ops.noi / dec!(0.065));
}

#[test]
fn test_office_rent_on_rentable_area() {
    let out = calculate_pro_forma(&suburban_office()).unwrap();
    let budget = &out.result.budget;
    assert_eq!(budget.rentable_sf, dec!(11700));
    assert_eq!(budget.useable_sf, dec!(10800));
    assert_eq!(out.result.operations.annual_rent, dec!(11700) * dec!(18.50));
}

// ===========================================================================
// Costs
// ===========================================================================

#[test]
fn test_total_cost_reconstructs_from_components() {
    for request in [strip_center(), suburban_office()] {
        let out = calculate_pro_forma(&request).unwrap();
        let b = &out.result.budget;
        assert_eq!(b.total_project_cost, b.land_cost + b.hard_costs + b.soft_costs);
        assert!(b.rentable_sf <= request.project.gross_square_feet);
        assert!(b.useable_sf <= request.project.gross_square_feet);
    }
}

#[test]
fn test_land_cost_modes_agree() {
    let per_acre = calculate_pro_forma(&strip_center()).unwrap();

    let mut total = strip_center();
    total.project.land_cost_mode = LandCostMode::Total;
    total.project.land_cost_total = dec!(450000);
    let total = calculate_pro_forma(&total).unwrap();

    assert_eq!(per_acre.result.budget, total.result.budget);
}

// ===========================================================================
// Projections and debt
// ===========================================================================

#[test]
fn test_projection_shape() {
    let out = calculate_pro_forma(&suburban_office()).unwrap();
    let rows = &out.result.projections;

    // 18 months rounds up to 2 construction years, then 7 operating years
    assert_eq!(rows.len(), 9);
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Construction 1",
            "Construction 2",
            "Year 1",
            "Year 2",
            "Year 3",
            "Year 4",
            "Year 5",
            "Year 6",
            "Year 7",
        ]
    );

    for row in &rows[..2] {
        assert!(row.is_construction);
        assert_eq!(row.gross_rent, Decimal::ZERO);
        assert_eq!(row.noi, Decimal::ZERO);
        assert_eq!(row.debt_service, Decimal::ZERO);
    }
    assert!(rows[2..].iter().all(|r| !r.is_construction));
}

#[test]
fn test_loan_amortizes_at_constant_debt_service() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let result = &out.result;
    let annual = result.financing.annual_debt_service;

    let operating: Vec<_> = result
        .projections
        .iter()
        .filter(|r| !r.is_construction)
        .collect();

    let mut previous = result.financing.permanent_loan;
    for row in operating {
        assert!(row.loan_balance <= previous);
        assert!((row.interest + row.principal - annual).abs() < dec!(1));
        assert_eq!(row.debt_service, annual);
        assert_eq!(row.cash_flow_after_debt, row.cash_flow_before_debt - annual);
        previous = row.loan_balance;
    }
}

#[test]
fn test_rent_grows_each_operating_year() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let rows: Vec<_> = out
        .result
        .projections
        .iter()
        .filter(|r| !r.is_construction)
        .collect();
    assert_eq!(rows[0].gross_rent, dec!(376700));
    assert_eq!(rows[1].gross_rent, dec!(376700) * dec!(1.025));
}

// ===========================================================================
// Cash flows and returns
// ===========================================================================

#[test]
fn test_equity_series_starts_with_equity_check() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let result = &out.result;
    let first = &result.cash_flows[0];
    assert_eq!(first.period, 0);
    assert_eq!(first.amount, -result.financing.equity_required);

    let periods: Vec<u32> = result.cash_flows.iter().map(|e| e.period).collect();
    let mut sorted = periods.clone();
    sorted.sort_unstable();
    assert_eq!(periods, sorted);
}

#[test]
fn test_reversion_lifts_equity_irr() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let returns = &out.result.returns;
    assert!(returns.equity_irr_with_sale.converged);
    assert!(returns.unlevered_irr.converged);
    if out.result.exit.net_proceeds > Decimal::ZERO {
        assert!(returns.equity_irr_with_sale.rate > returns.equity_irr.rate);
    }
}

#[test]
fn test_exit_uses_final_year_noi() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let result = &out.result;
    let last = result.projections.last().unwrap();
    assert_eq!(result.exit.final_year_noi, last.noi);
    assert_eq!(result.exit.gross_sale_price, last.noi / dec!(0.07));
    assert_eq!(result.exit.selling_costs, result.exit.gross_sale_price * dec!(0.02));
    assert_eq!(result.exit.loan_payoff, last.loan_balance);
    assert_eq!(
        result.exit.net_proceeds,
        result.exit.net_sale_price - result.exit.loan_payoff
    );
}

#[test]
fn test_waterfall_runs_with_default_config() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let result = &out.result;
    let waterfall = result.waterfall.as_ref().unwrap();

    assert_eq!(
        waterfall.lp_invested + waterfall.gp_invested,
        result.financing.equity_required
    );
    let positive: Decimal = result
        .cash_flows
        .iter()
        .filter(|e| e.amount > Decimal::ZERO)
        .map(|e| e.amount)
        .sum();
    let distributed = waterfall.lp_total_distributed + waterfall.gp_total_distributed;
    assert!((distributed - positive).abs() < dec!(0.01));
}

#[test]
fn test_disabled_waterfall_is_omitted() {
    let mut request = strip_center();
    let mut config = request.waterfall_config();
    config.enabled = false;
    request.waterfall = Some(config);
    let out = calculate_pro_forma(&request).unwrap();
    assert!(out.result.waterfall.is_none());
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn test_unsupported_property_types_rejected() {
    for property_type in [
        PropertyType::Hotel,
        PropertyType::Condo,
        PropertyType::Senior,
        PropertyType::Mixed,
    ] {
        let mut request = strip_center();
        request.property_type = property_type;
        match calculate_pro_forma(&request).unwrap_err() {
            ProFormaError::UnsupportedPropertyType { property_type: name } => {
                assert_eq!(name, property_type.as_str())
            }
            other => panic!("Expected UnsupportedPropertyType, got {other}"),
        }
    }
}

#[test]
fn test_unknown_land_mode_names_field() {
    let json = r#"{
        "property_type": "retail",
        "project": { "gross_square_feet": "9000", "land_cost_mode": "per_hectare" }
    }"#;
    let err = serde_json::from_str::<ProFormaRequest>(json).unwrap_err();
    assert!(err.to_string().contains("land_cost_mode"));
    assert!(err.to_string().contains("per_hectare"));
}

#[test]
fn test_retail_without_tenants_rejected() {
    let mut request = strip_center();
    request.project.tenants.clear();
    assert!(matches!(
        calculate_pro_forma(&request),
        Err(ProFormaError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Report
// ===========================================================================

#[test]
fn test_report_rounds_money_and_formats_ratios() {
    let out = calculate_pro_forma(&strip_center()).unwrap();
    let report = ProFormaReport::from_result(&out.result);

    assert_eq!(report.property_type, "retail");
    assert_eq!(report.annual_rent, dec!(376700));
    assert_eq!(report.effective_gross_income, dec!(357865));
    assert_eq!(report.total_project_cost.scale(), 0);
    assert_eq!(report.projections.len(), out.result.projections.len());

    let decimals = |s: &str| s.split('.').nth(1).map(str::len);
    assert_eq!(decimals(&report.equity_irr), Some(2));
    assert_eq!(decimals(&report.dscr), Some(2));
    assert_eq!(decimals(&report.development_margin), Some(1));
    assert_eq!(decimals(&report.debt_yield), Some(1));
}

#[test]
fn test_report_marks_undefined_ratios() {
    let mut request = strip_center();
    request.project.permanent_loan_ltv = Decimal::ZERO;
    let mut warnings = Vec::new();
    let result = run_pro_forma(&request, &mut warnings).unwrap();
    let report = ProFormaReport::from_result(&result);

    assert_eq!(report.dscr, NOT_APPLICABLE);
    assert_eq!(report.debt_yield, NOT_APPLICABLE);
}
