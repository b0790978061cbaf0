use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_metrics_core::real_estate::investment::{self, InvestmentInputs};

use crate::input;

/// Arguments for investment property metrics
#[derive(Args)]
pub struct MetricsArgs {
    /// Total purchase price
    #[arg(long, allow_hyphen_values = true)]
    pub price: Option<Decimal>,

    /// Down payment in percent of price (e.g. 20 or 20%; 100 = all cash)
    #[arg(long, default_value = "20", allow_hyphen_values = true, value_parser = parse_percent)]
    pub down: Decimal,

    /// Nominal annual interest rate in percent (e.g. 6 or 6%)
    #[arg(long, default_value = "6", allow_hyphen_values = true, value_parser = parse_percent)]
    pub rate: Decimal,

    /// Amortization period in years
    #[arg(long, allow_hyphen_values = true)]
    pub years: Option<Decimal>,

    /// Expected gross monthly rent
    #[arg(long, allow_hyphen_values = true)]
    pub rent: Option<Decimal>,

    /// Annual operating expenses (excluding debt service)
    #[arg(long, allow_hyphen_values = true)]
    pub expenses: Option<Decimal>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Accept `20` and `20%` alike.
fn parse_percent(raw: &str) -> Result<Decimal, String> {
    raw.trim()
        .trim_end_matches('%')
        .trim_end()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid percentage '{raw}': {e}"))
}

impl MetricsArgs {
    fn has_flag_inputs(&self) -> bool {
        self.price.is_some() || self.years.is_some() || self.rent.is_some() || self.expenses.is_some()
    }

    fn to_inputs(&self) -> Result<InvestmentInputs, Box<dyn std::error::Error>> {
        Ok(InvestmentInputs {
            property_price: self
                .price
                .ok_or("--price is required (or provide --input)")?,
            down_payment_percent: self.down,
            interest_rate: self.rate,
            amortization_years: self
                .years
                .ok_or("--years is required (or provide --input)")?,
            monthly_rent: self
                .rent
                .ok_or("--rent is required (or provide --input)")?,
            annual_expenses: self
                .expenses
                .ok_or("--expenses is required (or provide --input)")?,
        })
    }
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = collect_inputs(&args)?;
    let result = investment::compute_metrics(&inputs)?;
    log_warnings(&result.warnings);
    Ok(serde_json::to_value(result)?)
}

fn log_warnings(warnings: &[String]) {
    for warning in warnings {
        tracing::warn!(%warning, "metrics warning");
    }
}

/// `--input` file first, then explicit flags, then piped stdin.
fn collect_inputs(args: &MetricsArgs) -> Result<InvestmentInputs, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if args.has_flag_inputs() {
        return args.to_inputs();
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    args.to_inputs()
}
