use napi::Result as NapiResult;
use napi_derive::napi;

use property_metrics_core::real_estate::investment::{self, InvestmentInputs};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn compute_json(input_json: &str) -> Result<String, property_metrics_core::PropertyMetricsError> {
    let input: InvestmentInputs = serde_json::from_str(input_json)?;
    let output = investment::compute_metrics(&input)?;
    Ok(serde_json::to_string(&output)?)
}

/// JSON in, JSON out: `InvestmentInputs` to the metrics envelope.
#[napi]
pub fn compute_property_metrics(input_json: String) -> NapiResult<String> {
    compute_json(&input_json).map_err(to_napi_error)
}

/// `[{field, label}, ...]` for each metric, in display order.
#[napi]
pub fn metric_labels() -> NapiResult<String> {
    let labels: Vec<serde_json::Value> = investment::METRIC_LABELS
        .iter()
        .map(|(field, label)| serde_json::json!({ "field": field, "label": label }))
        .collect();
    serde_json::to_string(&labels).map_err(to_napi_error)
}
