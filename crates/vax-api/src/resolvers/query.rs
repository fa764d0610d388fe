//! # GraphQL Query Resolver
//!
//! Read operations over the observation store and the analytics engine.

use async_graphql::{Context, Object, Result};
use chrono::NaiveDate;

use crate::context::{parse_countries, ApiContext};
use crate::error::graphql_error;
use crate::schema::*;
use vax_domain as domain;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    // =========================================================================
    // OBSERVATION QUERIES
    // =========================================================================

    /// Distinct countries present in the store
    async fn countries(&self, ctx: &Context<'_>) -> Result<Vec<String>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let countries = api_ctx.store.countries().await.map_err(graphql_error)?;
        Ok(countries.into_iter().map(String::from).collect())
    }

    /// Raw observations, newest first
    async fn observations(
        &self,
        ctx: &Context<'_>,
        filter: Option<ObservationFilterInput>,
        #[graphql(
            default = 100,
            validator(minimum = 0, maximum = 1000),
            desc = "Maximum rows to return (default: 100, max: 1000)"
        )]
        limit: i32,
        #[graphql(default = 0, validator(minimum = 0))] offset: i32,
    ) -> Result<Vec<Observation>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let filter = domain::ObservationFilter::try_from(filter.unwrap_or_default())
            .map_err(graphql_error)?;

        let rows = api_ctx.store.filter(&filter).await.map_err(graphql_error)?;
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(Observation::from)
            .collect())
    }

    // =========================================================================
    // ANALYTICS QUERIES
    // =========================================================================

    /// `{country, vaccinated, deaths}` per country; defaults to the configured
    /// country list
    #[graphql(name = "countryTotals")]
    async fn country_totals(
        &self,
        ctx: &Context<'_>,
        countries: Option<Vec<String>>,
    ) -> Result<Vec<CountryTotals>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let countries = api_ctx.countries_or_default(countries).map_err(graphql_error)?;

        let rows = api_ctx
            .engine
            .country_totals(&countries)
            .await
            .map_err(graphql_error)?;
        Ok(rows.into_iter().map(CountryTotals::from).collect())
    }

    /// Regions of a country ranked by vaccinated total
    #[graphql(name = "regionRanking")]
    async fn region_ranking(
        &self,
        ctx: &Context<'_>,
        country: String,
        #[graphql(
            default = 10,
            desc = "Entries to return; zero or less returns none (default: 10)"
        )]
        top_n: i64,
    ) -> Result<Vec<RegionRank>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let country = domain::CountryId::parse(&country).map_err(graphql_error)?;

        tracing::debug!(country = %country, top_n, "Ranking regions");

        let ranking = api_ctx
            .engine
            .rank_regions(&country, top_n)
            .await
            .map_err(graphql_error)?;
        Ok(ranking.into_iter().map(RegionRank::from).collect())
    }

    /// `{country, deaths, vaccinationRate, mortalityRate}` per country
    #[graphql(name = "deathsComparison")]
    async fn deaths_comparison(
        &self,
        ctx: &Context<'_>,
        countries: Option<Vec<String>>,
    ) -> Result<Vec<DeathsComparison>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let countries = api_ctx.countries_or_default(countries).map_err(graphql_error)?;

        let rows = api_ctx
            .engine
            .deaths_comparison(&countries)
            .await
            .map_err(graphql_error)?;
        Ok(rows.into_iter().map(DeathsComparison::from).collect())
    }

    /// Per-date totals of one country, ascending
    #[graphql(name = "timeSeries")]
    async fn time_series(
        &self,
        ctx: &Context<'_>,
        country: String,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let country = domain::CountryId::parse(&country).map_err(graphql_error)?;
        let range = domain::DateRange::from_bounds(from, to).map_err(graphql_error)?;

        let series = api_ctx
            .engine
            .time_series(&country, range)
            .await
            .map_err(graphql_error)?;
        Ok(series.into_iter().map(SeriesPoint::from).collect())
    }

    /// Totals, rates and top regions of one country
    #[graphql(name = "countrySummary")]
    async fn country_summary(&self, ctx: &Context<'_>, country: String) -> Result<CountrySummary> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let country = domain::CountryId::parse(&country).map_err(graphql_error)?;

        let summary = api_ctx
            .engine
            .country_summary(&country)
            .await
            .map_err(graphql_error)?;
        Ok(summary.into())
    }

    /// Full cross-country report; an empty list is rejected
    #[graphql(name = "comparisonReport")]
    async fn comparison_report(
        &self,
        ctx: &Context<'_>,
        countries: Vec<String>,
    ) -> Result<ComparisonReport> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let countries = parse_countries(&countries).map_err(graphql_error)?;

        let report = api_ctx
            .engine
            .compare(&countries)
            .await
            .map_err(graphql_error)?;
        Ok(report.into())
    }
}
