use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::PropertyMetricsError;
use crate::time_value::{monthly_payment, monthly_rate, payment_count, MONTHS_PER_YEAR};
use crate::types::{
    round_for_display, with_metadata, ComputationOutput, Metric, Money, Multiple, Percent, Rate,
    UndefinedReason, Years,
};
use crate::PropertyMetricsResult;

/// Largest accepted price, rent or expense figure.
pub const MAX_MONEY: Money = dec!(1_000_000_000_000_000);
/// Upper end of the supported nominal annual rate, in percent.
pub const MAX_INTEREST_RATE: Percent = dec!(1000);
/// Upper end of the supported amortization term.
pub const MAX_AMORTIZATION_YEARS: Years = dec!(100);

const METHODOLOGY: &str = "Investment Property Metrics (Income Approach)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The six user-entered figures behind every calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInputs {
    /// Total purchase price
    pub property_price: Money,
    /// Share of the price paid upfront, in percent (100 = all cash)
    pub down_payment_percent: Percent,
    /// Nominal annual mortgage rate, in percent
    pub interest_rate: Percent,
    /// Loan term in years
    pub amortization_years: Years,
    /// Expected gross monthly rent
    pub monthly_rent: Money,
    /// Annual operating expenses, excluding debt service
    pub annual_expenses: Money,
}

/// Whether financing amplifies or dampens the return on the whole asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeverageType {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for LeverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LeverageType::Positive => "Positive",
            LeverageType::Negative => "Negative",
            LeverageType::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Every intermediate of the derivation chain at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivation {
    /// Loan principal = price * (1 - down%)
    pub principal: Money,
    /// Monthly rate as a decimal
    pub monthly_rate: Rate,
    /// Number of monthly payments
    pub payment_count: Decimal,
    pub monthly_mortgage_payment: Metric<Money>,
    pub annual_rent: Money,
    /// Net operating income = annual rent - annual expenses
    pub noi: Money,
    /// NOI / price, in percent
    pub cap_rate: Metric<Percent>,
    pub down_payment: Money,
    pub annual_mortgage_payment: Metric<Money>,
    /// NOI - annual debt service
    pub annual_cash_flow: Metric<Money>,
    /// Annual cash flow / down payment, in percent
    pub cash_on_cash_return: Metric<Percent>,
    /// NOI / annual debt service
    pub dscr: Metric<Multiple>,
    /// Price / annual rent
    pub grm: Metric<Multiple>,
}

/// The nine presented outputs, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    pub monthly_mortgage_payment: Metric<Money>,
    pub noi: Metric<Money>,
    pub cap_rate: Metric<Percent>,
    pub cash_on_cash_return: Metric<Percent>,
    pub leverage_type: Metric<LeverageType>,
    /// Same quantity as `cap_rate`
    pub unleveraged_return: Metric<Percent>,
    /// Same quantity as `cash_on_cash_return`
    pub leveraged_return: Metric<Percent>,
    pub dscr: Metric<Multiple>,
    pub grm: Metric<Multiple>,
}

/// Serialised field name and display label of each output, in display order.
pub const METRIC_LABELS: [(&str, &str); 9] = [
    ("monthly_mortgage_payment", "Monthly Mortgage Payment"),
    ("noi", "Net Operating Income (NOI)"),
    ("cap_rate", "Cap Rate"),
    ("cash_on_cash_return", "Cash on Cash Return"),
    ("leverage_type", "Leverage Type"),
    ("unleveraged_return", "Unleveraged Return"),
    ("leveraged_return", "Leveraged Return"),
    ("dscr", "Debt Service Coverage Ratio (DSCR)"),
    ("grm", "Gross Rent Multiplier (GRM)"),
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the full set of investment metrics for one property.
///
/// Validation failures abort the whole computation. Metrics whose formula
/// divides by zero come back as [`Metric::NotApplicable`] while every other
/// metric is still returned.
pub fn compute_metrics(
    input: &InvestmentInputs,
) -> PropertyMetricsResult<ComputationOutput<InvestmentMetrics>> {
    let start = Instant::now();

    let derivation = derive(input)?;
    let metrics = derivation.to_metrics();
    let warnings = collect_warnings(&derivation, &metrics);

    tracing::debug!(
        noi = %derivation.noi,
        cap_rate = ?metrics.cap_rate.value(),
        leverage = ?metrics.leverage_type.value(),
        warnings = warnings.len(),
        "investment metrics computed"
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(METHODOLOGY, input, warnings, elapsed, metrics))
}

/// Validate the inputs and run the derivation chain without rounding.
pub fn derive(input: &InvestmentInputs) -> PropertyMetricsResult<Derivation> {
    validate_input(input)?;
    Ok(derive_unchecked(input))
}

/// Three-way comparison of leveraged against unleveraged return.
pub fn classify_leverage(unleveraged: Percent, leveraged: Percent) -> LeverageType {
    if leveraged > unleveraged {
        LeverageType::Positive
    } else if leveraged < unleveraged {
        LeverageType::Negative
    } else {
        LeverageType::Neutral
    }
}

impl Derivation {
    /// Round to presentation precision and classify leverage.
    ///
    /// Leverage is classified on the rounded returns so the category always
    /// agrees with the two figures shown next to it.
    pub fn to_metrics(&self) -> InvestmentMetrics {
        let cap_rate = self.cap_rate.rounded();
        let cash_on_cash_return = self.cash_on_cash_return.rounded();
        let leverage_type = cash_on_cash_return.and_then(|leveraged| {
            cap_rate.map(|unleveraged| classify_leverage(*unleveraged, *leveraged))
        });

        InvestmentMetrics {
            monthly_mortgage_payment: self.monthly_mortgage_payment.rounded(),
            noi: Metric::defined(round_for_display(self.noi)),
            unleveraged_return: cap_rate.clone(),
            leveraged_return: cash_on_cash_return.clone(),
            cap_rate,
            cash_on_cash_return,
            leverage_type,
            dscr: self.dscr.rounded(),
            grm: self.grm.rounded(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &InvestmentInputs) -> PropertyMetricsResult<()> {
    if input.property_price <= Decimal::ZERO {
        return Err(invalid("property_price", "Property price must be positive"));
    }

    if input.down_payment_percent < Decimal::ZERO || input.down_payment_percent > dec!(100) {
        return Err(invalid(
            "down_payment_percent",
            "Down payment must be between 0 and 100 percent",
        ));
    }

    if input.interest_rate < Decimal::ZERO {
        return Err(invalid("interest_rate", "Interest rate cannot be negative"));
    }
    if input.interest_rate > MAX_INTEREST_RATE {
        return Err(invalid(
            "interest_rate",
            &format!("Interest rate exceeds the supported range of {MAX_INTEREST_RATE} percent"),
        ));
    }

    if input.amortization_years <= Decimal::ZERO {
        return Err(invalid(
            "amortization_years",
            "Amortization period must be positive",
        ));
    }
    if input.amortization_years > MAX_AMORTIZATION_YEARS {
        return Err(invalid(
            "amortization_years",
            &format!(
                "Amortization period exceeds the supported range of {MAX_AMORTIZATION_YEARS} years"
            ),
        ));
    }

    if input.monthly_rent < Decimal::ZERO {
        return Err(invalid("monthly_rent", "Monthly rent cannot be negative"));
    }

    if input.annual_expenses < Decimal::ZERO {
        return Err(invalid("annual_expenses", "Annual expenses cannot be negative"));
    }

    for (field, value) in [
        ("property_price", input.property_price),
        ("monthly_rent", input.monthly_rent),
        ("annual_expenses", input.annual_expenses),
    ] {
        if value > MAX_MONEY {
            return Err(invalid(
                field,
                &format!("Value {value} exceeds the supported maximum of {MAX_MONEY}"),
            ));
        }
    }

    Ok(())
}

fn invalid(field: &str, reason: &str) -> PropertyMetricsError {
    tracing::debug!(field, reason, "investment inputs rejected");
    PropertyMetricsError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Derivation chain
// ---------------------------------------------------------------------------

pub(crate) fn derive_unchecked(input: &InvestmentInputs) -> Derivation {
    let down_fraction = input.down_payment_percent / dec!(100);

    // --- Mortgage ---
    let principal = input.property_price * (Decimal::ONE - down_fraction);
    let rate = monthly_rate(input.interest_rate);
    let periods = payment_count(input.amortization_years);
    let monthly_mortgage_payment = monthly_payment(principal, rate, periods);

    // --- Income ---
    let annual_rent = input.monthly_rent * MONTHS_PER_YEAR;
    let noi = annual_rent - input.annual_expenses;
    let cap_rate = Metric::percentage(
        noi,
        input.property_price,
        UndefinedReason::ZeroPropertyPrice,
    );

    // --- Cash on cash ---
    let down_payment = input.property_price * down_fraction;
    let annual_mortgage_payment = monthly_mortgage_payment
        .and_then(|m| Metric::checked(m.checked_mul(MONTHS_PER_YEAR)));
    let annual_cash_flow =
        annual_mortgage_payment.and_then(|ds| Metric::checked(noi.checked_sub(*ds)));
    let cash_on_cash_return = annual_cash_flow
        .and_then(|cf| Metric::percentage(*cf, down_payment, UndefinedReason::NoCashInvested));

    // --- Coverage and multiples ---
    let dscr = annual_mortgage_payment
        .and_then(|ds| Metric::ratio(noi, *ds, UndefinedReason::NoDebtService));
    let grm = Metric::ratio(
        input.property_price,
        annual_rent,
        UndefinedReason::NoRentalIncome,
    );

    Derivation {
        principal,
        monthly_rate: rate,
        payment_count: periods,
        monthly_mortgage_payment,
        annual_rent,
        noi,
        cap_rate,
        down_payment,
        annual_mortgage_payment,
        annual_cash_flow,
        cash_on_cash_return,
        dscr,
        grm,
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn collect_warnings(derivation: &Derivation, metrics: &InvestmentMetrics) -> Vec<String> {
    let mut warnings = Vec::new();

    if derivation.noi < Decimal::ZERO {
        warnings.push(format!(
            "NOI of {:.2} is negative; expenses exceed rental income",
            derivation.noi
        ));
    }

    if let Some(cf) = derivation.annual_cash_flow.value() {
        if *cf < Decimal::ZERO {
            warnings.push(format!(
                "Annual cash flow of {cf:.2} is negative after debt service"
            ));
        }
    }

    if let Some(dscr) = derivation.dscr.value() {
        if *dscr < dec!(1.2) {
            warnings.push(format!(
                "DSCR of {dscr:.2} is below 1.20x; lender covenant risk"
            ));
        }
    }

    if let Some(cap) = derivation.cap_rate.value() {
        if *cap < dec!(3) {
            warnings.push(format!(
                "Cap rate {cap:.2}% is below 3%; unusually low, verify rent and price"
            ));
        } else if *cap > dec!(12) {
            warnings.push(format!(
                "Cap rate {cap:.2}% exceeds 12%; unusually high, may indicate elevated risk"
            ));
        }
    }

    if metrics.leverage_type.value() == Some(&LeverageType::Negative) {
        warnings.push(
            "Negative leverage: financing costs more than the property yields".into(),
        );
    }

    for (label, reason) in [
        ("Monthly mortgage payment", metrics.monthly_mortgage_payment.reason()),
        ("Cap rate", metrics.cap_rate.reason()),
        ("Cash on cash return", metrics.cash_on_cash_return.reason()),
        ("Leverage type", metrics.leverage_type.reason()),
        ("DSCR", metrics.dscr.reason()),
        ("GRM", metrics.grm.reason()),
    ] {
        if let Some(reason) = reason {
            warnings.push(format!("{label} not applicable: {}", reason.describe()));
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    /// $300k single-family rental, 20% down at 6% over 30 years
    fn sample_input() -> InvestmentInputs {
        InvestmentInputs {
            property_price: dec!(300000),
            down_payment_percent: dec!(20),
            interest_rate: dec!(6),
            amortization_years: dec!(30),
            monthly_rent: dec!(2500),
            annual_expenses: dec!(6000),
        }
    }

    fn value<T: Copy>(metric: &Metric<T>) -> T {
        *metric.value().expect("metric should be defined")
    }

    #[test]
    fn test_sample_derivation_chain() {
        let d = derive(&sample_input()).unwrap();

        assert_eq!(d.principal, dec!(240000));
        assert_eq!(d.monthly_rate, dec!(0.005));
        assert_eq!(d.payment_count, dec!(360));
        assert_eq!(d.annual_rent, dec!(30000));
        assert_eq!(d.noi, dec!(24000));
        assert_eq!(value(&d.cap_rate), dec!(8));
        assert_eq!(d.down_payment, dec!(60000));

        let annual_ds = value(&d.annual_mortgage_payment);
        assert_eq!(annual_ds, value(&d.monthly_mortgage_payment) * dec!(12));
        assert!((annual_ds - dec!(17267.06)).abs() < dec!(0.01), "got {annual_ds}");
        assert_eq!(value(&d.annual_cash_flow), dec!(24000) - annual_ds);
    }

    #[test]
    fn test_sample_presented_metrics() {
        let m = compute_metrics(&sample_input()).unwrap().result;

        assert_eq!(value(&m.monthly_mortgage_payment), dec!(1438.92));
        assert_eq!(value(&m.noi), dec!(24000));
        assert_eq!(value(&m.cap_rate), dec!(8));
        assert_eq!(value(&m.cash_on_cash_return), dec!(11.22));
        assert_eq!(value(&m.leverage_type), LeverageType::Positive);
        assert_eq!(value(&m.dscr), dec!(1.39));
        assert_eq!(value(&m.grm), dec!(10));
    }

    #[test]
    fn test_aliases_equal_their_sources() {
        let m = compute_metrics(&sample_input()).unwrap().result;
        assert_eq!(m.unleveraged_return, m.cap_rate);
        assert_eq!(m.leveraged_return, m.cash_on_cash_return);
    }

    #[test]
    fn test_all_cash_purchase() {
        let mut input = sample_input();
        input.down_payment_percent = dec!(100);
        let m = compute_metrics(&input).unwrap().result;

        assert_eq!(value(&m.monthly_mortgage_payment), Decimal::ZERO);
        assert_eq!(m.dscr.reason(), Some(UndefinedReason::NoDebtService));
        // No debt: cash-on-cash collapses to the cap rate
        assert_eq!(m.cash_on_cash_return, m.cap_rate);
        assert_eq!(value(&m.leverage_type), LeverageType::Neutral);
    }

    #[test]
    fn test_fully_financed_purchase() {
        let mut input = sample_input();
        input.down_payment_percent = Decimal::ZERO;
        let m = compute_metrics(&input).unwrap().result;

        assert_eq!(m.cash_on_cash_return.reason(), Some(UndefinedReason::NoCashInvested));
        assert_eq!(m.leveraged_return.reason(), Some(UndefinedReason::NoCashInvested));
        assert_eq!(m.leverage_type.reason(), Some(UndefinedReason::NoCashInvested));
        assert!(m.dscr.is_defined());
        assert!(m.cap_rate.is_defined());
    }

    #[test]
    fn test_zero_rent() {
        let mut input = sample_input();
        input.monthly_rent = Decimal::ZERO;
        let m = compute_metrics(&input).unwrap().result;

        assert_eq!(m.grm.reason(), Some(UndefinedReason::NoRentalIncome));
        assert_eq!(value(&m.noi), dec!(-6000));
        assert_eq!(value(&m.cap_rate), dec!(-2));
    }

    #[test]
    fn test_zero_interest_rate() {
        let mut input = sample_input();
        input.interest_rate = Decimal::ZERO;
        let d = derive(&input).unwrap();
        assert_eq!(value(&d.monthly_mortgage_payment), d.principal / d.payment_count);
    }

    #[test]
    fn test_negative_leverage() {
        let mut input = sample_input();
        input.interest_rate = dec!(12);
        let out = compute_metrics(&input).unwrap();
        assert_eq!(value(&out.result.leverage_type), LeverageType::Negative);
        assert!(out.warnings.iter().any(|w| w.contains("Negative leverage")));
    }

    #[test]
    fn test_zero_price_branch_is_not_applicable() {
        let mut input = sample_input();
        input.property_price = Decimal::ZERO;
        let d = derive_unchecked(&input);
        assert_eq!(d.cap_rate.reason(), Some(UndefinedReason::ZeroPropertyPrice));
    }

    #[test]
    fn test_zero_term_branch_propagates() {
        let mut input = sample_input();
        input.amortization_years = Decimal::ZERO;
        let m = derive_unchecked(&input).to_metrics();
        for reason in [
            m.monthly_mortgage_payment.reason(),
            m.cash_on_cash_return.reason(),
            m.leverage_type.reason(),
            m.dscr.reason(),
        ] {
            assert_eq!(reason, Some(UndefinedReason::ZeroAmortizationTerm));
        }
        assert!(m.grm.is_defined());
    }

    #[test]
    fn test_vanishing_term_marks_debt_metrics_unbounded() {
        for rate in [Decimal::ZERO, dec!(6)] {
            let mut input = sample_input();
            input.interest_rate = rate;
            input.amortization_years = dec!(0.000000000000000000000000001);
            let out = compute_metrics(&input).unwrap();
            let m = &out.result;
            for reason in [
                m.monthly_mortgage_payment.reason(),
                m.cash_on_cash_return.reason(),
                m.leverage_type.reason(),
                m.dscr.reason(),
            ] {
                assert_eq!(reason, Some(UndefinedReason::Unbounded), "rate {rate}");
            }
            assert_eq!(value(&m.cap_rate), dec!(8.00));
            assert_eq!(value(&m.grm), dec!(10.00));
        }
    }

    #[test]
    fn test_huge_payment_overflowing_annual_total_is_unbounded() {
        // 240000 over 2.4e-23 payments is exactly 1e28 a month; twelve of them overflow
        let mut input = sample_input();
        input.interest_rate = Decimal::ZERO;
        input.amortization_years = dec!(0.000000000000000000000002);
        let d = derive(&input).unwrap();
        assert_eq!(
            value(&d.monthly_mortgage_payment),
            Decimal::from_i128_with_scale(10_i128.pow(28), 0)
        );
        assert_eq!(d.annual_mortgage_payment.reason(), Some(UndefinedReason::Unbounded));
        assert_eq!(d.dscr.reason(), Some(UndefinedReason::Unbounded));
    }

    #[test]
    fn test_classify_leverage() {
        assert_eq!(classify_leverage(dec!(8), dec!(11.22)), LeverageType::Positive);
        assert_eq!(classify_leverage(dec!(8), dec!(5)), LeverageType::Negative);
        assert_eq!(classify_leverage(dec!(8.00), dec!(8)), LeverageType::Neutral);
    }

    #[test]
    fn test_leverage_uses_rounded_returns() {
        let d = Derivation {
            cap_rate: Metric::defined(dec!(8.001)),
            cash_on_cash_return: Metric::defined(dec!(8.004)),
            ..derive(&sample_input()).unwrap()
        };
        assert_eq!(value(&d.to_metrics().leverage_type), LeverageType::Neutral);
    }

    // --- Validation ---

    fn rejected_field(input: &InvestmentInputs) -> String {
        match compute_metrics(input) {
            Err(PropertyMetricsError::InvalidInput { field, .. }) => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let mut input = sample_input();
        input.property_price = Decimal::ZERO;
        assert_eq!(rejected_field(&input), "property_price");
    }

    #[test]
    fn test_rejects_down_payment_out_of_range() {
        let mut input = sample_input();
        input.down_payment_percent = dec!(100.01);
        assert_eq!(rejected_field(&input), "down_payment_percent");
        input.down_payment_percent = dec!(-1);
        assert_eq!(rejected_field(&input), "down_payment_percent");
    }

    #[test]
    fn test_rejects_negative_rate() {
        let mut input = sample_input();
        input.interest_rate = dec!(-0.5);
        assert_eq!(rejected_field(&input), "interest_rate");
    }

    #[test]
    fn test_rejects_zero_term() {
        let mut input = sample_input();
        input.amortization_years = Decimal::ZERO;
        assert_eq!(rejected_field(&input), "amortization_years");
    }

    #[test]
    fn test_rejects_negative_rent_and_expenses() {
        let mut input = sample_input();
        input.monthly_rent = dec!(-1);
        assert_eq!(rejected_field(&input), "monthly_rent");

        let mut input = sample_input();
        input.annual_expenses = dec!(-1);
        assert_eq!(rejected_field(&input), "annual_expenses");
    }

    #[test]
    fn test_rejects_values_beyond_supported_range() {
        let mut input = sample_input();
        input.monthly_rent = MAX_MONEY + Decimal::ONE;
        assert_eq!(rejected_field(&input), "monthly_rent");

        let mut input = sample_input();
        input.interest_rate = dec!(1000.5);
        assert_eq!(rejected_field(&input), "interest_rate");

        let mut input = sample_input();
        input.amortization_years = dec!(101);
        let err = derive(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: amortization_years: Amortization period exceeds the supported range of 100 years"
        );
    }

    // --- Envelope ---

    #[test]
    fn test_methodology_and_assumptions() {
        let out = compute_metrics(&sample_input()).unwrap();
        assert_eq!(out.methodology, METHODOLOGY);
        assert_eq!(out.assumptions["property_price"], "300000");
        assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);
    }

    #[test]
    fn test_low_dscr_warning() {
        let mut input = sample_input();
        input.monthly_rent = dec!(1800);
        let out = compute_metrics(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("DSCR")));
        assert!(out.warnings.iter().any(|w| w.contains("negative after debt service")));
    }

    #[test]
    fn test_not_applicable_warning() {
        let mut input = sample_input();
        input.down_payment_percent = dec!(100);
        let out = compute_metrics(&input).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("DSCR not applicable")));
    }

    #[test]
    fn test_metric_labels_match_serialised_fields() {
        let json = serde_json::to_value(compute_metrics(&sample_input()).unwrap().result).unwrap();
        let fields = json.as_object().unwrap();
        assert_eq!(fields.len(), METRIC_LABELS.len());
        for (key, _) in METRIC_LABELS {
            assert!(fields.contains_key(key), "missing field {key}");
        }
    }
}
