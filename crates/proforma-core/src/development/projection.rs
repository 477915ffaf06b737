use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::costs::DevelopmentAnalysis;
use super::inputs::{EngineAssumptions, ProjectInput};
use crate::error::ProFormaError;
use crate::types::{pct, Money, MAX_AMOUNT};
use crate::ProFormaResult;

/// One row of the multi-year schedule. Construction rows carry zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    /// 1-based position in the schedule; also the cash-flow period
    pub period: u32,
    pub label: String,
    pub is_construction: bool,
    pub gross_rent: Money,
    pub vacancy: Money,
    pub effective_gross_income: Money,
    /// Management, operating expenses and insurance
    pub operating_expenses: Money,
    pub property_tax: Money,
    pub total_expenses: Money,
    pub noi: Money,
    pub leasing_reserve: Money,
    pub capex_reserve: Money,
    pub reserves: Money,
    pub cash_flow_before_debt: Money,
    pub debt_service: Money,
    pub interest: Money,
    pub principal: Money,
    pub loan_balance: Money,
    pub cash_flow_after_debt: Money,
}

impl YearProjection {
    fn construction(period: u32) -> Self {
        Self {
            period,
            label: format!("Construction {period}"),
            is_construction: true,
            gross_rent: Decimal::ZERO,
            vacancy: Decimal::ZERO,
            effective_gross_income: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            property_tax: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            noi: Decimal::ZERO,
            leasing_reserve: Decimal::ZERO,
            capex_reserve: Decimal::ZERO,
            reserves: Decimal::ZERO,
            cash_flow_before_debt: Decimal::ZERO,
            debt_service: Decimal::ZERO,
            interest: Decimal::ZERO,
            principal: Decimal::ZERO,
            loan_balance: Decimal::ZERO,
            cash_flow_after_debt: Decimal::ZERO,
        }
    }
}

/// Interest and principal paid over one year of monthly amortisation.
struct AnnualAmortization {
    interest: Money,
    principal: Money,
    ending_balance: Money,
}

/// Run twelve monthly payments against `balance`. The final payment is
/// capped at the outstanding balance once the loan is retired.
fn amortize_year(balance: Money, monthly_rate: Decimal, payment: Money) -> AnnualAmortization {
    let mut balance = balance;
    let mut interest = Decimal::ZERO;
    let mut principal = Decimal::ZERO;

    for _ in 0..12 {
        if balance <= Decimal::ZERO {
            break;
        }
        let month_interest = balance * monthly_rate;
        let month_principal = (payment - month_interest).min(balance);
        interest += month_interest;
        principal += month_principal;
        balance -= month_principal;
    }

    AnnualAmortization {
        interest,
        principal,
        ending_balance: balance,
    }
}

/// Compound `value` by one year of growth. Fails once the line leaves the
/// range the rest of the pipeline can sum without overflowing.
fn grow(value: Money, factor: Decimal, field: &str, year: u32) -> ProFormaResult<Money> {
    value
        .checked_mul(factor)
        .filter(|grown| grown.abs() <= MAX_AMOUNT)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: field.into(),
            reason: format!(
                "Compounding overflows in year {year}; reduce the growth rate or the hold period"
            ),
        })
}

/// Number of construction placeholder rows: construction months rounded up to whole years.
pub fn construction_years(construction_months: u32) -> u32 {
    construction_months.div_ceil(12)
}

/// Build the construction placeholders followed by `hold_years` operating
/// years. Year 1 uses the stabilised figures; later years grow rent,
/// expenses and property tax at their own rates. The permanent loan
/// amortises monthly inside each year; cash flow after debt is charged the
/// level annual debt service until the loan is retired.
pub fn build_projections(
    input: &ProjectInput,
    analysis: &DevelopmentAnalysis,
    assumptions: &EngineAssumptions,
) -> ProFormaResult<Vec<YearProjection>> {
    let construction_rows = construction_years(input.construction_months);
    let mut rows: Vec<YearProjection> =
        Vec::with_capacity(construction_rows.saturating_add(input.hold_years) as usize);

    for period in 1..=construction_rows {
        rows.push(YearProjection::construction(period));
    }

    let ops = &analysis.operations;
    let rent_growth = Decimal::ONE + pct(input.rent_growth);
    let expense_growth = Decimal::ONE + pct(input.expense_growth);
    let tax_growth = Decimal::ONE
        + pct(input
            .property_tax_growth
            .unwrap_or(assumptions.default_property_tax_growth));

    let monthly_rate = pct(input.permanent_loan_rate) / dec!(12);
    let payment = analysis.financing.monthly_payment;

    let mut rent = ops.annual_rent;
    let mut expenses = ops.management_fee + ops.operating_expenses + ops.insurance;
    let mut property_tax = ops.property_tax;
    let mut balance = analysis.financing.permanent_loan;

    for year in 1..=input.hold_years {
        if year > 1 {
            rent = grow(rent, rent_growth, "rent_growth", year)?;
            expenses = grow(expenses, expense_growth, "expense_growth", year)?;
            property_tax = grow(property_tax, tax_growth, "property_tax_growth", year)?;
        }

        let vacancy = rent * pct(input.vacancy_rate);
        let effective_gross_income = rent - vacancy;
        let total_expenses = expenses + property_tax;
        let noi = effective_gross_income - total_expenses;

        let leasing_reserve = rent * pct(input.leasing_reserve_percent);
        let capex_reserve = rent * pct(input.capex_reserve_percent);
        let reserves = leasing_reserve + capex_reserve;
        let cash_flow_before_debt = noi - reserves;

        let debt_service = if balance > Decimal::ZERO {
            analysis.financing.annual_debt_service
        } else {
            Decimal::ZERO
        };
        let amortization = amortize_year(balance, monthly_rate, payment);
        balance = amortization.ending_balance;

        rows.push(YearProjection {
            period: construction_rows + year,
            label: format!("Year {year}"),
            is_construction: false,
            gross_rent: rent,
            vacancy,
            effective_gross_income,
            operating_expenses: expenses,
            property_tax,
            total_expenses,
            noi,
            leasing_reserve,
            capex_reserve,
            reserves,
            cash_flow_before_debt,
            debt_service,
            interest: amortization.interest,
            principal: amortization.principal,
            loan_balance: balance,
            cash_flow_after_debt: cash_flow_before_debt - debt_service,
        });
    }

    log::debug!(
        "Projected {} construction and {} operating years",
        construction_rows,
        input.hold_years
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::development::costs::{
        DevelopmentBudget, FinancingSummary, StabilizedOperations,
    };
    use crate::time_value::monthly_payment;
    use rust_decimal_macros::dec;

    fn analysis_with_loan(loan: Money, rate: Decimal) -> DevelopmentAnalysis {
        let payment = monthly_payment(loan, rate, 30).unwrap();
        DevelopmentAnalysis {
            budget: DevelopmentBudget {
                rentable_sf: dec!(10000),
                useable_sf: dec!(10000),
                site_area_sf: dec!(43560),
                land_cost: dec!(500000),
                shell_cost: dec!(1500000),
                site_cost: Decimal::ZERO,
                tenant_improvements: Decimal::ZERO,
                hard_costs: dec!(1500000),
                architectural_fee: Decimal::ZERO,
                contingency: Decimal::ZERO,
                soft_costs_other: Decimal::ZERO,
                development_fee: Decimal::ZERO,
                soft_costs: Decimal::ZERO,
                total_project_cost: dec!(2000000),
            },
            financing: FinancingSummary {
                construction_loan: dec!(1400000),
                construction_interest: dec!(50000),
                all_in_cost: dec!(2050000),
                equity_required: dec!(650000),
                permanent_loan: loan,
                refinance_proceeds: Decimal::ZERO,
                monthly_payment: payment,
                annual_debt_service: payment * dec!(12),
            },
            operations: StabilizedOperations {
                annual_rent: dec!(300000),
                vacancy_loss: dec!(15000),
                effective_gross_income: dec!(285000),
                management_fee: dec!(8550),
                operating_expenses: dec!(50000),
                insurance: dec!(2500),
                property_tax: dec!(25000),
                total_expenses: dec!(86050),
                noi: dec!(198950),
                reserves: dec!(6000),
                stabilized_value: dec!(2842142.86),
                value_creation: Decimal::ZERO,
                development_margin: None,
                dscr: None,
                debt_yield: None,
                yield_on_cost: None,
            },
        }
    }

    fn input() -> ProjectInput {
        ProjectInput {
            construction_months: 18,
            hold_years: 10,
            vacancy_rate: dec!(5),
            capex_reserve_percent: dec!(2),
            permanent_loan_rate: dec!(7.5),
            rent_growth: dec!(3),
            expense_growth: dec!(2.5),
            property_tax_growth: Some(dec!(4)),
            ..ProjectInput::default()
        }
    }

    #[test]
    fn test_schedule_shape() {
        let rows = build_projections(
            &input(),
            &analysis_with_loan(dec!(2000000), dec!(0.075)),
            &EngineAssumptions::default(),
        )
        .unwrap();
        // ceil(18 / 12) = 2 construction rows + 10 operating rows
        assert_eq!(rows.len(), 12);
        for row in &rows[..2] {
            assert!(row.is_construction);
            assert_eq!(row.noi, Decimal::ZERO);
            assert_eq!(row.cash_flow_after_debt, Decimal::ZERO);
        }
        assert_eq!(rows[1].label, "Construction 2");
        assert_eq!(rows[2].label, "Year 1");
        assert_eq!(rows[2].period, 3);
        assert!(rows[2..].iter().all(|r| !r.is_construction));
    }

    #[test]
    fn test_year_one_matches_stabilized_figures() {
        let rows = build_projections(
            &input(),
            &analysis_with_loan(dec!(2000000), dec!(0.075)),
            &EngineAssumptions::default(),
        )
        .unwrap();
        let y1 = &rows[2];
        assert_eq!(y1.gross_rent, dec!(300000));
        assert_eq!(y1.vacancy, dec!(15000));
        assert_eq!(y1.total_expenses, dec!(86050));
        assert_eq!(y1.noi, dec!(198950));
        assert_eq!(y1.reserves, dec!(6000));
    }

    #[test]
    fn test_independent_growth_rates() {
        let rows = build_projections(
            &input(),
            &analysis_with_loan(dec!(2000000), dec!(0.075)),
            &EngineAssumptions::default(),
        )
        .unwrap();
        let y2 = &rows[3];
        assert_eq!(y2.gross_rent, dec!(309000));
        assert_eq!(y2.operating_expenses, dec!(61050) * dec!(1.025));
        assert_eq!(y2.property_tax, dec!(26000));
    }

    #[test]
    fn test_property_tax_growth_default() {
        let mut inp = input();
        inp.property_tax_growth = None;
        let rows = build_projections(
            &inp,
            &analysis_with_loan(dec!(2000000), dec!(0.075)),
            &EngineAssumptions::default(),
        )
        .unwrap();
        assert_eq!(rows[3].property_tax, dec!(25500));
    }

    #[test]
    fn test_monthly_amortization_splits_debt_service() {
        let analysis = analysis_with_loan(dec!(2000000), dec!(0.075));
        let annual = analysis.financing.annual_debt_service;
        let rows = build_projections(&input(), &analysis, &EngineAssumptions::default()).unwrap();

        let mut previous = dec!(2000000);
        for row in rows.iter().filter(|r| !r.is_construction) {
            assert!((row.interest + row.principal - annual).abs() < dec!(1));
            assert!(row.loan_balance < previous);
            previous = row.loan_balance;
        }

        // Monthly compounding pays less interest in year 1 than a single
        // annual charge on the opening balance would.
        let y1 = &rows[2];
        assert!(y1.interest < dec!(2000000) * dec!(0.075));
        assert_eq!(
            y1.cash_flow_after_debt,
            y1.cash_flow_before_debt - y1.debt_service
        );
    }

    #[test]
    fn test_loan_retires_within_hold() {
        let mut inp = input();
        inp.hold_years = 3;
        let mut analysis = analysis_with_loan(dec!(100000), dec!(0.075));
        let payment = monthly_payment(dec!(100000), dec!(0.075), 1).unwrap();
        analysis.financing.monthly_payment = payment;
        analysis.financing.annual_debt_service = payment * dec!(12);
        let rows = build_projections(&inp, &analysis, &EngineAssumptions::default()).unwrap();
        assert!(rows[2].loan_balance.abs() < dec!(0.01));
        assert_eq!(rows[2].debt_service, payment * dec!(12));
        assert!(rows[3].principal.abs() < dec!(0.01));
        assert_eq!(rows[4].debt_service, Decimal::ZERO);
        assert_eq!(rows[4].cash_flow_after_debt, rows[4].cash_flow_before_debt);
        assert_eq!(rows[4].loan_balance.round_dp(2), Decimal::ZERO);
    }

    #[test]
    fn test_level_debt_service_while_loan_outstanding() {
        let analysis = analysis_with_loan(dec!(2000000), dec!(0.075));
        let annual = analysis.financing.annual_debt_service;
        let rows = build_projections(&input(), &analysis, &EngineAssumptions::default()).unwrap();
        for row in rows.iter().filter(|r| !r.is_construction) {
            assert_eq!(row.debt_service, annual);
            assert_eq!(row.cash_flow_after_debt, row.cash_flow_before_debt - annual);
        }
    }

    #[test]
    fn test_runaway_rent_growth_is_rejected() {
        let mut inp = input();
        inp.rent_growth = dec!(100);
        inp.hold_years = 100;
        let result = build_projections(
            &inp,
            &analysis_with_loan(dec!(2000000), dec!(0.075)),
            &EngineAssumptions::default(),
        );
        match result.unwrap_err() {
            ProFormaError::InvalidInput { field, .. } => assert_eq!(field, "rent_growth"),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_runaway_expense_growth_names_its_field() {
        let mut inp = input();
        inp.rent_growth = Decimal::ZERO;
        inp.expense_growth = dec!(500);
        inp.hold_years = 60;
        let err = build_projections(
            &inp,
            &analysis_with_loan(dec!(2000000), dec!(0.075)),
            &EngineAssumptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ProFormaError::InvalidInput { ref field, .. } if field == "expense_growth"));
    }

    #[test]
    fn test_construction_years_rounds_up() {
        assert_eq!(construction_years(0), 0);
        assert_eq!(construction_years(12), 1);
        assert_eq!(construction_years(13), 2);
    }
}
