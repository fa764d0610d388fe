//! Analytics engine over an injected observation store.
//!
//! The engine only reads: [`AnalyticsEngine::load`] issues one store query
//! and returns an immutable [`ObservationSet`]; every computation then runs
//! against that snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use vax_domain::{CountryId, DateRange, Observation, ObservationFilter, Totals};
use vax_persistence::ObservationStore;

use crate::aggregate::{aggregate, GroupBy, GroupKey};
use crate::comparator::{ComparisonReport, CountrySummary, CountryTotalsRow, DeathsComparisonRow};
use crate::error::{AnalyticsError, Result};
use crate::ranking::{rank_regions, RegionRank};
use crate::series::{time_series, SeriesPoint};

// =============================================================================
// OBSERVATION SET
// =============================================================================

/// Immutable snapshot of the observations matching one filter.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    filter: ObservationFilter,
    observations: Arc<[Observation]>,
}

impl ObservationSet {
    /// Wrap already-filtered observations.
    #[must_use]
    pub fn new(filter: ObservationFilter, observations: Vec<Observation>) -> Self {
        Self {
            filter,
            observations: observations.into(),
        }
    }

    /// Filter this set was loaded with.
    #[must_use]
    pub const fn filter(&self) -> &ObservationFilter {
        &self.filter
    }

    /// Observations in store order.
    #[must_use]
    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Grand totals; zero for an empty set.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.observations.iter().collect()
    }

    /// Totals per group.
    #[must_use]
    pub fn aggregate(&self, group_by: Option<GroupBy>) -> BTreeMap<GroupKey, Totals> {
        aggregate(self.observations.iter(), group_by)
    }

    /// Regions ranked by vaccinated total.
    #[must_use]
    pub fn rank_regions(&self, top_n: i64) -> Vec<RegionRank> {
        rank_regions(self.observations.iter(), top_n)
    }

    /// Per-date totals, ascending.
    #[must_use]
    pub fn time_series(&self) -> Vec<SeriesPoint> {
        time_series(self.observations.iter())
    }

    /// Country summary of this set.
    #[must_use]
    pub fn summarize(&self, country: CountryId) -> CountrySummary {
        CountrySummary::from_observations(country, &self.observations)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Read-only analytics over an [`ObservationStore`].
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn ObservationStore>,
}

impl std::fmt::Debug for AnalyticsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsEngine").finish_non_exhaustive()
    }
}

impl AnalyticsEngine {
    /// Create an engine reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }

    /// Load the observations matching `filter` as one consistent read.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] if the store query fails.
    pub async fn load(&self, filter: &ObservationFilter) -> Result<ObservationSet> {
        let observations = self.store.filter(filter).await?;
        tracing::debug!(rows = observations.len(), ?filter, "Loaded observation set");
        Ok(ObservationSet::new(filter.clone(), observations))
    }

    async fn load_country(
        &self,
        country: &CountryId,
        range: Option<DateRange>,
    ) -> Result<ObservationSet> {
        self.load(&ObservationFilter::for_country(country.clone()).with_date_range(range))
            .await
    }

    /// Summary of one country: totals, rates and its top regions.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] if the store query fails.
    pub async fn country_summary(&self, country: &CountryId) -> Result<CountrySummary> {
        let set = self.load_country(country, None).await?;
        Ok(set.summarize(country.clone()))
    }

    async fn summaries(&self, countries: &[CountryId]) -> Result<Vec<CountrySummary>> {
        let mut summaries = Vec::with_capacity(countries.len());
        for country in countries {
            summaries.push(self.country_summary(country).await?);
        }
        Ok(summaries)
    }

    /// `{country, vaccinated, deaths}` per requested country, in order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] if a store query fails.
    pub async fn country_totals(&self, countries: &[CountryId]) -> Result<Vec<CountryTotalsRow>> {
        let summaries = self.summaries(countries).await?;
        Ok(summaries.iter().map(CountryTotalsRow::from).collect())
    }

    /// Ranking of the regions of one country.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] if the store query fails.
    pub async fn rank_regions(&self, country: &CountryId, top_n: i64) -> Result<Vec<RegionRank>> {
        let set = self.load_country(country, None).await?;
        Ok(set.rank_regions(top_n))
    }

    /// Per-date totals of one country, optionally limited to `range`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] if the store query fails.
    pub async fn time_series(
        &self,
        country: &CountryId,
        range: Option<DateRange>,
    ) -> Result<Vec<SeriesPoint>> {
        let set = self.load_country(country, range).await?;
        Ok(set.time_series())
    }

    /// `{country, deaths, vaccination_rate, mortality_rate}` per requested
    /// country, in order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] if a store query fails.
    pub async fn deaths_comparison(
        &self,
        countries: &[CountryId],
    ) -> Result<Vec<DeathsComparisonRow>> {
        let summaries = self.summaries(countries).await?;
        Ok(summaries.iter().map(DeathsComparisonRow::from).collect())
    }

    /// Full comparison report across `countries`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidArgument`] for an empty list, before
    /// touching the store, or [`AnalyticsError::Persistence`] if a store query
    /// fails.
    pub async fn compare(&self, countries: &[CountryId]) -> Result<ComparisonReport> {
        if countries.is_empty() {
            return Err(AnalyticsError::InvalidArgument(
                "at least one country is required for a comparison".to_string(),
            ));
        }

        let report = ComparisonReport::from_summaries(self.summaries(countries).await?)?;
        tracing::info!(
            countries = countries.len(),
            best_performer = %report.best_performer,
            "Generated comparison report"
        );
        Ok(report)
    }
}
