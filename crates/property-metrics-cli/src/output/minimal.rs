use serde_json::Value;

use super::{metric_text, result_of};

/// Headline figures, most informative first.
const PRIORITY_KEYS: [&str; 3] = ["cash_on_cash_return", "cap_rate", "noi"];

/// Print just the headline value: the first defined priority metric.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(result_of(value)));
}

fn headline(result: &Value) -> String {
    for key in PRIORITY_KEYS {
        if let Some(metric) = result.get(key) {
            if metric.get("status").and_then(Value::as_str) == Some("defined") {
                return metric_text(metric);
            }
        }
    }
    metric_text(result)
}
