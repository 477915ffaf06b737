use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProFormaError;
use crate::time_value::IrrSettings;
use crate::types::{Money, Percent, SquareFeet};
use crate::ProFormaResult;

// ---------------------------------------------------------------------------
// Property type
// ---------------------------------------------------------------------------

/// Property categories offered on the deal sheet. Only retail and office have
/// formula branches; the rest are rejected before any number is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PropertyType {
    Retail,
    Office,
    Hotel,
    Condo,
    Senior,
    Mixed,
}

/// How rent, tenant improvements and site work are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpaceLayout {
    /// Whole building leased at a single rate per rentable SF
    SingleTenant,
    /// Rent and TI come from the tenant roll
    TenantRoll,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Retail => "retail",
            PropertyType::Office => "office",
            PropertyType::Hotel => "hotel",
            PropertyType::Condo => "condo",
            PropertyType::Senior => "senior",
            PropertyType::Mixed => "mixed",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, PropertyType::Retail | PropertyType::Office)
    }

    pub(crate) fn layout(&self) -> ProFormaResult<SpaceLayout> {
        match self {
            PropertyType::Office => Ok(SpaceLayout::SingleTenant),
            PropertyType::Retail => Ok(SpaceLayout::TenantRoll),
            other => Err(ProFormaError::UnsupportedPropertyType {
                property_type: other.as_str().to_string(),
            }),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = ProFormaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retail" => Ok(PropertyType::Retail),
            "office" => Ok(PropertyType::Office),
            "hotel" => Ok(PropertyType::Hotel),
            "condo" => Ok(PropertyType::Condo),
            "senior" => Ok(PropertyType::Senior),
            "mixed" => Ok(PropertyType::Mixed),
            _ => Err(ProFormaError::InvalidMode {
                field: "property_type".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for PropertyType {
    type Error = ProFormaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PropertyType> for String {
    fn from(value: PropertyType) -> Self {
        value.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Cost modes
// ---------------------------------------------------------------------------

/// Basis on which the land price is quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LandCostMode {
    /// `land_cost_per_acre` × acres
    #[default]
    PerAcre,
    /// `land_cost_total` as a lump sum
    Total,
    /// `land_cost_per_sf` × site area in SF
    PerSiteArea,
}

impl LandCostMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandCostMode::PerAcre => "per_acre",
            LandCostMode::Total => "total",
            LandCostMode::PerSiteArea => "per_site_area",
        }
    }
}

impl FromStr for LandCostMode {
    type Err = ProFormaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "per_acre" | "perAcre" => Ok(LandCostMode::PerAcre),
            "total" => Ok(LandCostMode::Total),
            "per_site_area" | "perSiteArea" | "per_sf" | "perSF" => Ok(LandCostMode::PerSiteArea),
            _ => Err(ProFormaError::InvalidMode {
                field: "land_cost_mode".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for LandCostMode {
    type Error = ProFormaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LandCostMode> for String {
    fn from(value: LandCostMode) -> Self {
        value.as_str().to_string()
    }
}

/// Basis for the architectural and engineering fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArchitecturalCostMode {
    /// `architectural_percent` of hard costs
    #[default]
    Percent,
    /// `architectural_fixed` dollar amount
    Fixed,
}

impl ArchitecturalCostMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchitecturalCostMode::Percent => "percent",
            ArchitecturalCostMode::Fixed => "fixed",
        }
    }
}

impl FromStr for ArchitecturalCostMode {
    type Err = ProFormaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "percent" => Ok(ArchitecturalCostMode::Percent),
            "fixed" | "dollar" => Ok(ArchitecturalCostMode::Fixed),
            _ => Err(ProFormaError::InvalidMode {
                field: "architectural_mode".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ArchitecturalCostMode {
    type Error = ProFormaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArchitecturalCostMode> for String {
    fn from(value: ArchitecturalCostMode) -> Self {
        value.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Project input
// ---------------------------------------------------------------------------

/// A tenant on the rent roll (retail and other multi-tenant layouts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
    #[serde(alias = "sqft")]
    pub square_feet: SquareFeet,
    pub rent_per_sf: Money,
    #[serde(default)]
    pub ti_per_sf: Money,
}

/// Property description for one pro forma run. Percentages are in points
/// (5 = 5%). Omitted fields fall back to the values in `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub name: String,

    // --- Areas ---
    pub gross_square_feet: SquareFeet,
    pub rentable_percent: Percent,
    pub useable_percent: Percent,
    pub land_acres: Decimal,

    // --- Land ---
    pub land_cost_mode: LandCostMode,
    pub land_cost_per_acre: Money,
    pub land_cost_total: Money,
    pub land_cost_per_sf: Money,

    // --- Hard costs ---
    pub construction_shell_per_sf: Money,
    pub construction_site_per_sf: Money,
    /// Tenant improvements per gross SF (office only)
    pub office_ti_per_sf: Money,

    // --- Soft costs ---
    pub architectural_mode: ArchitecturalCostMode,
    pub architectural_percent: Percent,
    pub architectural_fixed: Money,
    pub contingency_percent: Percent,
    pub soft_costs_other: Money,
    pub development_fee: Money,

    // --- Revenue ---
    /// Rent per rentable SF (office only)
    pub office_rent_per_sf: Money,
    pub tenants: Vec<Tenant>,

    // --- Financing ---
    pub construction_loan_ltc: Percent,
    pub construction_loan_rate: Percent,
    pub construction_months: u32,
    pub permanent_loan_ltv: Percent,
    pub permanent_loan_rate: Percent,
    pub permanent_loan_amortization_years: u32,

    // --- Operations ---
    pub vacancy_rate: Percent,
    pub management_fee_percent: Percent,
    pub operating_expenses_per_sf: Money,
    pub insurance_per_sf: Money,
    /// Falls back to `EngineAssumptions::default_property_tax_per_sf`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_tax_per_sf: Option<Money>,
    pub leasing_reserve_percent: Percent,
    pub capex_reserve_percent: Percent,

    // --- Valuation ---
    pub going_in_cap_rate: Percent,
    pub exit_cap_rate: Percent,

    // --- Projection ---
    pub hold_years: u32,
    pub rent_growth: Percent,
    pub expense_growth: Percent,
    /// Falls back to `EngineAssumptions::default_property_tax_growth`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_tax_growth: Option<Percent>,
}

impl Default for ProjectInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            gross_square_feet: Decimal::ZERO,
            rentable_percent: dec!(100),
            useable_percent: dec!(100),
            land_acres: Decimal::ZERO,
            land_cost_mode: LandCostMode::PerAcre,
            land_cost_per_acre: Decimal::ZERO,
            land_cost_total: Decimal::ZERO,
            land_cost_per_sf: Decimal::ZERO,
            construction_shell_per_sf: Decimal::ZERO,
            construction_site_per_sf: Decimal::ZERO,
            office_ti_per_sf: Decimal::ZERO,
            architectural_mode: ArchitecturalCostMode::Percent,
            architectural_percent: Decimal::ZERO,
            architectural_fixed: Decimal::ZERO,
            contingency_percent: Decimal::ZERO,
            soft_costs_other: Decimal::ZERO,
            development_fee: Decimal::ZERO,
            office_rent_per_sf: Decimal::ZERO,
            tenants: Vec::new(),
            construction_loan_ltc: Decimal::ZERO,
            construction_loan_rate: Decimal::ZERO,
            construction_months: 12,
            permanent_loan_ltv: Decimal::ZERO,
            permanent_loan_rate: Decimal::ZERO,
            permanent_loan_amortization_years: 30,
            vacancy_rate: Decimal::ZERO,
            management_fee_percent: Decimal::ZERO,
            operating_expenses_per_sf: Decimal::ZERO,
            insurance_per_sf: Decimal::ZERO,
            property_tax_per_sf: None,
            leasing_reserve_percent: Decimal::ZERO,
            capex_reserve_percent: Decimal::ZERO,
            going_in_cap_rate: Decimal::ZERO,
            exit_cap_rate: Decimal::ZERO,
            hold_years: 10,
            rent_growth: Decimal::ZERO,
            expense_growth: Decimal::ZERO,
            property_tax_growth: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine assumptions
// ---------------------------------------------------------------------------

/// Business constants the engine applies when the deal sheet is silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineAssumptions {
    /// Property tax per gross SF when `property_tax_per_sf` is not given
    pub default_property_tax_per_sf: Money,
    /// Annual property tax growth when `property_tax_growth` is not given
    pub default_property_tax_growth: Percent,
    /// Broker and closing costs on sale, as a percent of gross price
    pub selling_cost_percent: Percent,
    pub irr: IrrSettings,
}

impl Default for EngineAssumptions {
    fn default() -> Self {
        Self {
            default_property_tax_per_sf: dec!(2.50),
            default_property_tax_growth: dec!(2.0),
            selling_cost_percent: dec!(2.0),
            irr: IrrSettings::default(),
        }
    }
}
