use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Periodic rates expressed as decimals (0.005 = 0.5% per month).
pub type Rate = Decimal;

/// User-facing percentages (6 = 6%). Inputs and return metrics use this form.
pub type Percent = Decimal;

/// Ratios and multiples (e.g. 1.39x DSCR, 10x GRM)
pub type Multiple = Decimal;

/// Year counts, possibly fractional
pub type Years = Decimal;

/// Fractional digits kept on every presented value.
pub const DISPLAY_DECIMALS: u32 = 2;

/// Round a full-precision value for presentation (half away from zero),
/// padded so every value carries exactly two fractional digits.
pub fn round_for_display(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_DECIMALS);
    rounded
}

/// Why a metric has no value for an otherwise valid set of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Cap rate is measured against the purchase price.
    ZeroPropertyPrice,
    /// 0% down: there is no cash basis for cash-on-cash.
    NoCashInvested,
    /// All-cash purchase: nothing to cover, so DSCR is undefined.
    NoDebtService,
    /// Zero rent: GRM would be infinite.
    NoRentalIncome,
    /// Zero payments: the mortgage cannot amortise.
    ZeroAmortizationTerm,
    /// The result does not fit in a Decimal.
    Unbounded,
}

impl UndefinedReason {
    pub fn describe(&self) -> &'static str {
        match self {
            UndefinedReason::ZeroPropertyPrice => "property price is zero",
            UndefinedReason::NoCashInvested => {
                "purchase is fully financed; no cash invested for leveraged metrics"
            }
            UndefinedReason::NoDebtService => {
                "purchase is fully paid in cash; no debt service to cover"
            }
            UndefinedReason::NoRentalIncome => "annual rent is zero",
            UndefinedReason::ZeroAmortizationTerm => "amortization term has zero payments",
            UndefinedReason::Unbounded => "value exceeds the representable range",
        }
    }
}

/// A derived value, or an explicit marker that its formula divides by zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric<T> {
    Defined { value: T },
    NotApplicable { reason: UndefinedReason, detail: String },
}

impl<T> Metric<T> {
    pub fn defined(value: T) -> Self {
        Metric::Defined { value }
    }

    pub fn not_applicable(reason: UndefinedReason) -> Self {
        Metric::NotApplicable {
            reason,
            detail: reason.describe().to_string(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Defined { value } => Some(value),
            Metric::NotApplicable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<UndefinedReason> {
        match self {
            Metric::Defined { .. } => None,
            Metric::NotApplicable { reason, .. } => Some(*reason),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined { .. })
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Metric<U> {
        match self {
            Metric::Defined { value } => Metric::defined(f(value)),
            Metric::NotApplicable { reason, .. } => Metric::not_applicable(*reason),
        }
    }

    /// Chain a derivation that may itself be undefined. The upstream reason wins.
    pub fn and_then<U>(&self, f: impl FnOnce(&T) -> Metric<U>) -> Metric<U> {
        match self {
            Metric::Defined { value } => f(value),
            Metric::NotApplicable { reason, .. } => Metric::not_applicable(*reason),
        }
    }
}

impl Metric<Decimal> {
    /// Result of a `checked_*` operation; `None` means it left the Decimal range.
    pub fn checked(value: Option<Decimal>) -> Self {
        match value {
            Some(value) => Metric::defined(value),
            None => Metric::not_applicable(UndefinedReason::Unbounded),
        }
    }

    /// `numerator / denominator`, or `reason` when the denominator is zero.
    pub fn ratio(numerator: Decimal, denominator: Decimal, reason: UndefinedReason) -> Self {
        if denominator.is_zero() {
            return Metric::not_applicable(reason);
        }
        Metric::checked(numerator.checked_div(denominator))
    }

    /// `(numerator / denominator) * 100`, guarded the same way as [`Metric::ratio`].
    pub fn percentage(numerator: Decimal, denominator: Decimal, reason: UndefinedReason) -> Self {
        Metric::ratio(numerator, denominator, reason)
            .and_then(|v| Metric::checked(v.checked_mul(Decimal::ONE_HUNDRED)))
    }

    pub fn rounded(&self) -> Self {
        self.map(|v| round_for_display(*v))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
