pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of a computation envelope, or the value itself.
fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Text of a `{status, value}` / `{status, reason, detail}` metric object.
fn metric_text(metric: &Value) -> String {
    match metric.get("status").and_then(Value::as_str) {
        Some("defined") => scalar_text(metric.get("value").unwrap_or(&Value::Null)),
        Some("not_applicable") => {
            let detail = metric
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("not applicable");
            format!("N/A ({detail})")
        }
        _ => scalar_text(metric),
    }
}

fn metric_reason(metric: &Value) -> String {
    metric
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
