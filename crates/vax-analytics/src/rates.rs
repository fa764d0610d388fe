//! Rate calculator.
//!
//! Both rates are percentages rounded to two decimals. A zero denominator is
//! not an error: the rate is `0.0`.

use vax_domain::Totals;

/// Round to two decimals, halves away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Deaths as a percentage of the vaccinated total (not of the population).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mortality_rate(totals: &Totals) -> f64 {
    if totals.vaccinated == 0 {
        return 0.0;
    }
    round2(totals.deaths as f64 / totals.vaccinated as f64 * 100.0)
}

/// Vaccinated as a percentage of the population.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vaccination_rate(totals: &Totals) -> f64 {
    if totals.population == 0 {
        return 0.0;
    }
    round2(totals.vaccinated as f64 / totals.population as f64 * 100.0)
}
