//! Country comparator.
//!
//! Builds one [`CountrySummary`] per requested country and composes them into
//! a [`ComparisonReport`] with a deterministic best performer.

use serde::{Deserialize, Serialize};
use vax_domain::{CountryId, Observation, Totals};

use crate::aggregate::totals;
use crate::error::{AnalyticsError, Result};
use crate::ranking::{rank_regions, RegionRank, SUMMARY_TOP_N};
use crate::rates::{mortality_rate, vaccination_rate};

// =============================================================================
// RESULT SHAPES
// =============================================================================

/// Aggregate result of one country plus its top regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    /// Country identifier.
    pub country: CountryId,
    /// Vaccinated total.
    pub total_vaccinated: u64,
    /// Deaths total.
    pub total_deaths: u64,
    /// Population total.
    pub total_population: u64,
    /// Deaths per vaccinated, in percent.
    pub mortality_rate: f64,
    /// Vaccinated per population, in percent.
    pub vaccination_rate: f64,
    /// Top regions by vaccinated total.
    pub top_regions: Vec<RegionRank>,
}

impl CountrySummary {
    /// Summarize the observations of one country.
    #[must_use]
    pub fn from_observations(country: CountryId, observations: &[Observation]) -> Self {
        let sums = totals(observations);
        Self {
            country,
            total_vaccinated: sums.vaccinated,
            total_deaths: sums.deaths,
            total_population: sums.population,
            mortality_rate: mortality_rate(&sums),
            vaccination_rate: vaccination_rate(&sums),
            top_regions: rank_regions(observations, SUMMARY_TOP_N),
        }
    }

    /// Summed counts behind this summary.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        Totals::new(
            self.total_vaccinated,
            self.total_deaths,
            self.total_population,
        )
    }
}

/// Row of the country totals view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTotalsRow {
    /// Country identifier.
    pub country: CountryId,
    /// Vaccinated total.
    pub vaccinated: u64,
    /// Deaths total.
    pub deaths: u64,
}

impl From<&CountrySummary> for CountryTotalsRow {
    fn from(summary: &CountrySummary) -> Self {
        Self {
            country: summary.country.clone(),
            vaccinated: summary.total_vaccinated,
            deaths: summary.total_deaths,
        }
    }
}

/// Row of the deaths comparison view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathsComparisonRow {
    /// Country identifier.
    pub country: CountryId,
    /// Deaths total.
    pub deaths: u64,
    /// Vaccinated per population, in percent.
    pub vaccination_rate: f64,
    /// Deaths per vaccinated, in percent.
    pub mortality_rate: f64,
}

impl From<&CountrySummary> for DeathsComparisonRow {
    fn from(summary: &CountrySummary) -> Self {
        Self {
            country: summary.country.clone(),
            deaths: summary.total_deaths,
            vaccination_rate: summary.vaccination_rate,
            mortality_rate: summary.mortality_rate,
        }
    }
}

/// One country's value in a comparison. Kept as a sequence entry so repeated
/// countries are not collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryValue<T> {
    /// Country identifier.
    pub country: CountryId,
    /// Compared value.
    pub value: T,
}

/// Full cross-country report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Countries in request order.
    pub countries: Vec<CountryId>,
    /// Vaccinated totals per country.
    pub vaccinated_comparison: Vec<CountryValue<u64>>,
    /// Death totals per country.
    pub deaths_comparison: Vec<CountryValue<u64>>,
    /// Mortality rates per country.
    pub mortality_rates: Vec<CountryValue<f64>>,
    /// Lowest mortality rate, ties to the highest vaccinated total.
    pub best_performer: CountryId,
    /// Per-country summaries in request order.
    pub detailed_summaries: Vec<CountrySummary>,
}

fn per_country<T>(
    summaries: &[CountrySummary],
    value: impl Fn(&CountrySummary) -> T,
) -> Vec<CountryValue<T>> {
    summaries
        .iter()
        .map(|s| CountryValue {
            country: s.country.clone(),
            value: value(s),
        })
        .collect()
}

// =============================================================================
// COMPARISON
// =============================================================================

/// Pick the summary minimizing `(mortality_rate, -total_vaccinated)`.
///
/// Lexicographic, not weighted: a lower mortality rate always wins and the
/// vaccinated total only breaks exact rate ties, toward the larger total.
/// On a full tie the earliest summary wins. `None` only for an empty slice.
#[must_use]
pub fn select_best_performer(summaries: &[CountrySummary]) -> Option<&CountrySummary> {
    summaries.iter().min_by(|a, b| {
        a.mortality_rate
            .total_cmp(&b.mortality_rate)
            .then_with(|| b.total_vaccinated.cmp(&a.total_vaccinated))
    })
}

impl ComparisonReport {
    /// Compose a report from per-country summaries, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidArgument`] when `summaries` is empty.
    pub fn from_summaries(summaries: Vec<CountrySummary>) -> Result<Self> {
        let best_performer = select_best_performer(&summaries)
            .map(|s| s.country.clone())
            .ok_or_else(|| {
                AnalyticsError::InvalidArgument(
                    "at least one country is required for a comparison".to_string(),
                )
            })?;

        Ok(Self {
            countries: summaries.iter().map(|s| s.country.clone()).collect(),
            vaccinated_comparison: per_country(&summaries, |s| s.total_vaccinated),
            deaths_comparison: per_country(&summaries, |s| s.total_deaths),
            mortality_rates: per_country(&summaries, |s| s.mortality_rate),
            best_performer,
            detailed_summaries: summaries,
        })
    }

    /// Report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Conversion`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AnalyticsError::Conversion(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(country: &str, vaccinated: u64, deaths: u64) -> CountrySummary {
        let obs = Observation::new(
            CountryId::parse(country).unwrap(),
            Some("Capital"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .with_counts(vaccinated, deaths, vaccinated * 2);
        CountrySummary::from_observations(obs.country.clone(), &[obs])
    }

    #[test]
    fn test_summary_from_observations() {
        let s = summary("brasil", 1000, 20);
        assert_eq!(s.mortality_rate, 2.0);
        assert_eq!(s.vaccination_rate, 50.0);
        assert_eq!(s.top_regions.len(), 1);
        assert_eq!(s.totals(), Totals::new(1000, 20, 2000));
    }

    #[test]
    fn test_summary_of_no_rows_is_zero() {
        let s = CountrySummary::from_observations(CountryId::parse("nowhere").unwrap(), &[]);
        assert_eq!(s.totals(), Totals::default());
        assert_eq!(s.mortality_rate, 0.0);
        assert!(s.top_regions.is_empty());
    }

    #[test]
    fn test_lowest_mortality_wins() {
        let summaries = vec![summary("usa", 1_000_000, 30_000), summary("portugal", 100, 1)];
        let best = select_best_performer(&summaries).unwrap();
        assert_eq!(best.country.as_str(), "portugal");
    }

    #[test]
    fn test_tie_goes_to_higher_vaccinated() {
        let summaries = vec![summary("a", 100, 1), summary("b", 200, 2)];
        assert_eq!(summaries[0].mortality_rate, 1.0);
        assert_eq!(summaries[1].mortality_rate, 1.0);

        let best = select_best_performer(&summaries).unwrap();
        assert_eq!(best.country.as_str(), "b");
    }

    #[test]
    fn test_full_tie_keeps_first() {
        let summaries = vec![summary("x", 100, 1), summary("y", 100, 1)];
        assert_eq!(select_best_performer(&summaries).unwrap().country.as_str(), "x");
    }

    #[test]
    fn test_empty_report_rejected() {
        assert!(matches!(
            ComparisonReport::from_summaries(Vec::new()),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_report_keeps_order_and_duplicates() {
        let report = ComparisonReport::from_summaries(vec![
            summary("italia", 500, 10),
            summary("brasil", 800, 8),
            summary("italia", 500, 10),
        ])
        .unwrap();

        let names: Vec<_> = report.countries.iter().map(CountryId::as_str).collect();
        assert_eq!(names, vec!["italia", "brasil", "italia"]);
        assert_eq!(report.vaccinated_comparison.len(), 3);
        assert_eq!(report.deaths_comparison[1].value, 8);
        assert_eq!(report.mortality_rates[0].value, 2.0);
        assert_eq!(report.best_performer.as_str(), "brasil");

        let json = report.to_json().unwrap();
        assert!(json.contains("\"best_performer\": \"brasil\""));
    }
}
