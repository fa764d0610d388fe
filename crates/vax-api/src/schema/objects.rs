//! # GraphQL Output Types
//!
//! Object type definitions for GraphQL responses. Each mirrors an analytics
//! or interchange result shape.

use async_graphql::SimpleObject;
use chrono::NaiveDate;
use uuid::Uuid;

use super::enums::UpsertOutcome;
use vax_analytics as analytics;
use vax_domain as domain;
use vax_interchange as interchange;

// =============================================================================
// OBSERVATIONS
// =============================================================================

/// One country/region/date row
#[derive(Debug, Clone, SimpleObject)]
pub struct Observation {
    pub country: String,
    /// `null` for the national aggregate
    pub region: Option<String>,
    pub date: NaiveDate,
    pub vaccinated: u64,
    pub deaths: u64,
    pub population: u64,
}

impl From<domain::Observation> for Observation {
    fn from(o: domain::Observation) -> Self {
        Self {
            country: o.country.into(),
            region: o.region,
            date: o.date,
            vaccinated: o.vaccinated,
            deaths: o.deaths,
            population: o.population,
        }
    }
}

/// Result of a single upsert
#[derive(Debug, Clone, SimpleObject)]
pub struct UpsertResult {
    pub outcome: UpsertOutcome,
    pub observation: Observation,
}

/// Result of a batch upsert
#[derive(Debug, Clone, SimpleObject)]
pub struct BatchUpsertResult {
    /// Rows written
    pub written: usize,
}

// =============================================================================
// ANALYTICS VIEWS
// =============================================================================

/// Totals of one country
#[derive(Debug, Clone, SimpleObject)]
pub struct CountryTotals {
    pub country: String,
    pub vaccinated: u64,
    pub deaths: u64,
}

impl From<analytics::CountryTotalsRow> for CountryTotals {
    fn from(row: analytics::CountryTotalsRow) -> Self {
        Self {
            country: row.country.into(),
            vaccinated: row.vaccinated,
            deaths: row.deaths,
        }
    }
}

/// One region in a ranking
#[derive(Debug, Clone, SimpleObject)]
pub struct RegionRank {
    pub region: String,
    pub vaccinated: u64,
    pub deaths: u64,
}

impl From<analytics::RegionRank> for RegionRank {
    fn from(rank: analytics::RegionRank) -> Self {
        Self {
            region: rank.region,
            vaccinated: rank.vaccinated,
            deaths: rank.deaths,
        }
    }
}

/// Deaths comparison row
#[derive(Debug, Clone, SimpleObject)]
pub struct DeathsComparison {
    pub country: String,
    pub deaths: u64,
    /// Vaccinated per population, in percent
    pub vaccination_rate: f64,
    /// Deaths per vaccinated, in percent
    pub mortality_rate: f64,
}

impl From<analytics::DeathsComparisonRow> for DeathsComparison {
    fn from(row: analytics::DeathsComparisonRow) -> Self {
        Self {
            country: row.country.into(),
            deaths: row.deaths,
            vaccination_rate: row.vaccination_rate,
            mortality_rate: row.mortality_rate,
        }
    }
}

/// Totals of one date
#[derive(Debug, Clone, SimpleObject)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub vaccinated: u64,
    pub deaths: u64,
}

impl From<analytics::SeriesPoint> for SeriesPoint {
    fn from(p: analytics::SeriesPoint) -> Self {
        Self {
            date: p.date,
            vaccinated: p.vaccinated,
            deaths: p.deaths,
        }
    }
}

/// Summary of one country
#[derive(Debug, Clone, SimpleObject)]
pub struct CountrySummary {
    pub country: String,
    pub total_vaccinated: u64,
    pub total_deaths: u64,
    pub total_population: u64,
    pub mortality_rate: f64,
    pub vaccination_rate: f64,
    /// Top 5 regions by vaccinated total
    pub top_regions: Vec<RegionRank>,
}

impl From<analytics::CountrySummary> for CountrySummary {
    fn from(s: analytics::CountrySummary) -> Self {
        Self {
            country: s.country.into(),
            total_vaccinated: s.total_vaccinated,
            total_deaths: s.total_deaths,
            total_population: s.total_population,
            mortality_rate: s.mortality_rate,
            vaccination_rate: s.vaccination_rate,
            top_regions: s.top_regions.into_iter().map(RegionRank::from).collect(),
        }
    }
}

/// Integer value of one country in a comparison
#[derive(Debug, Clone, SimpleObject)]
pub struct CountryCount {
    pub country: String,
    pub value: u64,
}

/// Rate of one country in a comparison
#[derive(Debug, Clone, SimpleObject)]
pub struct CountryRate {
    pub country: String,
    pub value: f64,
}

/// Full cross-country report
#[derive(Debug, Clone, SimpleObject)]
pub struct ComparisonReport {
    pub countries: Vec<String>,
    pub vaccinated_comparison: Vec<CountryCount>,
    pub deaths_comparison: Vec<CountryCount>,
    pub mortality_rates: Vec<CountryRate>,
    /// Lowest mortality rate; ties go to the higher vaccinated total
    pub best_performer: String,
    pub detailed_summaries: Vec<CountrySummary>,
}

impl From<analytics::ComparisonReport> for ComparisonReport {
    fn from(r: analytics::ComparisonReport) -> Self {
        let counts = |values: Vec<analytics::CountryValue<u64>>| {
            values
                .into_iter()
                .map(|v| CountryCount {
                    country: v.country.into(),
                    value: v.value,
                })
                .collect::<Vec<_>>()
        };

        Self {
            countries: r.countries.into_iter().map(String::from).collect(),
            vaccinated_comparison: counts(r.vaccinated_comparison),
            deaths_comparison: counts(r.deaths_comparison),
            mortality_rates: r
                .mortality_rates
                .into_iter()
                .map(|v| CountryRate {
                    country: v.country.into(),
                    value: v.value,
                })
                .collect(),
            best_performer: r.best_performer.into(),
            detailed_summaries: r
                .detailed_summaries
                .into_iter()
                .map(CountrySummary::from)
                .collect(),
        }
    }
}

// =============================================================================
// IMPORT
// =============================================================================

/// Outcome of a CSV import
#[derive(Debug, Clone, SimpleObject)]
pub struct ImportSummary {
    pub batch_id: Uuid,
    pub country: String,
    pub imported_count: usize,
    pub errors_count: usize,
    /// First 10 error messages, prefixed with their line
    pub errors: Vec<String>,
}

impl From<interchange::ImportSummary> for ImportSummary {
    fn from(s: interchange::ImportSummary) -> Self {
        Self {
            batch_id: s.batch_id,
            country: s.country.into(),
            imported_count: s.imported_count,
            errors_count: s.errors_count,
            errors: s.errors,
        }
    }
}
