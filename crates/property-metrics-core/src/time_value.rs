use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::{Metric, Money, Percent, Rate, UndefinedReason, Years};

pub const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly rate from a nominal annual percentage: (annual / 100) / 12.
pub fn monthly_rate(annual_rate: Percent) -> Rate {
    (annual_rate / dec!(100)) / MONTHS_PER_YEAR
}

/// Number of monthly payments over the amortization term.
pub fn payment_count(amortization_years: Years) -> Decimal {
    amortization_years * MONTHS_PER_YEAR
}

/// (1 + r)^n. Integer terms use exact repeated squaring; fractional terms
/// fall back to `powd`. `None` when the factor leaves the Decimal range.
fn compound_factor(rate: Rate, periods: Decimal) -> Option<Decimal> {
    let base = Decimal::ONE + rate;
    if periods.fract().is_zero() {
        if let Some(whole) = periods.to_u64() {
            return base.checked_powu(whole);
        }
    }
    base.checked_powd(periods)
}

/// Standard fixed-rate mortgage payment: P * r(1+r)^n / ((1+r)^n - 1)
///
/// Terms short enough to push the payment outside the Decimal range come
/// back as [`UndefinedReason::Unbounded`].
pub fn monthly_payment(principal: Money, rate: Rate, periods: Decimal) -> Metric<Money> {
    if periods.is_zero() {
        return Metric::not_applicable(UndefinedReason::ZeroAmortizationTerm);
    }

    if rate.is_zero() {
        // Interest-free: straight-line amortisation
        return Metric::checked(principal.checked_div(periods));
    }

    let compound = match compound_factor(rate, periods) {
        Some(c) => c,
        // (1+r)^n / ((1+r)^n - 1) is 1 at Decimal precision once (1+r)^n overflows
        None => return Metric::checked(principal.checked_mul(rate)),
    };

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        // 1 + r rounded to exactly 1: the loan is effectively interest-free
        return Metric::checked(principal.checked_div(periods));
    }

    Metric::checked(
        compound
            .checked_div(denominator)
            .and_then(|annuity| annuity.checked_mul(rate))
            .and_then(|factor| principal.checked_mul(factor)),
    )
}
