use property_metrics_core::real_estate::investment::METRIC_LABELS;
use serde_json::Value;
use std::io;

use super::{metric_reason, metric_text, result_of};

/// Write one CSV row per metric to stdout: metric, label, value, reason.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_rows(&mut wtr, result_of(value)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> csv::Result<()> {
    wtr.write_record(["metric", "label", "value", "reason"])?;
    for (key, label) in METRIC_LABELS {
        let Some(metric) = result.get(key) else {
            continue;
        };
        let value = match metric.get("status").and_then(Value::as_str) {
            Some("not_applicable") => String::new(),
            _ => metric_text(metric),
        };
        wtr.write_record([key, label, value.as_str(), metric_reason(metric).as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
