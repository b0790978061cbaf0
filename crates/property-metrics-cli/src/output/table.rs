use property_metrics_core::real_estate::investment::METRIC_LABELS;
use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{metric_text, result_of};

/// Labeled metrics table, followed by warnings and methodology.
pub fn print_table(value: &Value) {
    println!("{}", metrics_table(value));

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn metrics_table(value: &Value) -> Table {
    let result = result_of(value);

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    for (key, label) in METRIC_LABELS {
        if let Some(metric) = result.get(key) {
            builder.push_record([label.to_string(), metric_text(metric)]);
        }
    }
    Table::from(builder)
}
