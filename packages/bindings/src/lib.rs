use napi::Result as NapiResult;
use napi_derive::napi;

use proforma_core::development::pro_forma::{self, ProFormaRequest};
use proforma_core::development::report::ProFormaReport;
use proforma_core::equity::waterfall::{self, WaterfallInput};
use proforma_core::scenarios::sensitivity::{self, SensitivityInput};
use proforma_core::scenarios::validation;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pro forma
// ---------------------------------------------------------------------------

/// Full-precision pro forma run inside the computation envelope.
#[napi]
pub fn calculate_pro_forma(input_json: String) -> NapiResult<String> {
    let input: ProFormaRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pro_forma::calculate_pro_forma(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Rounded display form of a pro forma run.
#[napi]
pub fn pro_forma_report(input_json: String) -> NapiResult<String> {
    let input: ProFormaRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pro_forma::calculate_pro_forma(&input).map_err(to_napi_error)?;
    let report = ProFormaReport::from_result(&output.result);
    serde_json::to_string(&report).map_err(to_napi_error)
}

#[napi]
pub fn validate_project(input_json: String) -> NapiResult<String> {
    let input: ProFormaRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = validation::validate_project(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Expects the request fields plus a `sensitivities` list.
#[napi]
pub fn run_sensitivity(input_json: String) -> NapiResult<String> {
    let input: SensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sensitivity::run_sensitivity(&input.base, &input.sensitivities)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Equity
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_waterfall(input_json: String) -> NapiResult<String> {
    let input: WaterfallInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = waterfall::calculate_waterfall(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
