//! # GraphQL Mutation Resolver
//!
//! Write operations. Every write is an upsert keyed by
//! `(country, region, date)`.

use async_graphql::{Context, Object, Result};

use crate::context::ApiContext;
use crate::error::graphql_error;
use crate::schema::*;
use vax_domain as domain;

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Insert or replace one observation
    #[graphql(name = "upsertObservation")]
    async fn upsert_observation(
        &self,
        ctx: &Context<'_>,
        input: ObservationInput,
    ) -> Result<UpsertResult> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let observation = domain::Observation::try_from(input).map_err(graphql_error)?;

        let outcome = api_ctx
            .store
            .upsert(&observation)
            .await
            .map_err(graphql_error)?;

        tracing::info!(key = %observation.key(), ?outcome, "Upserted observation");

        Ok(UpsertResult {
            outcome: outcome.into(),
            observation: observation.into(),
        })
    }

    /// Insert or replace a batch. Every input is validated before anything
    /// is written.
    #[graphql(name = "upsertObservations")]
    async fn upsert_observations(
        &self,
        ctx: &Context<'_>,
        inputs: Vec<ObservationInput>,
    ) -> Result<BatchUpsertResult> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let observations = inputs
            .into_iter()
            .map(domain::Observation::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(graphql_error)?;

        let written = api_ctx
            .store
            .upsert_batch(&observations)
            .await
            .map_err(graphql_error)?;

        tracing::info!(written, "Upserted observation batch");
        Ok(BatchUpsertResult { written })
    }

    /// Import CSV text under `country`; bad rows are reported, not fatal
    #[graphql(name = "importCsv")]
    async fn import_csv(
        &self,
        ctx: &Context<'_>,
        country: String,
        content: String,
    ) -> Result<ImportSummary> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let country = domain::CountryId::parse(&country).map_err(graphql_error)?;

        let summary = api_ctx
            .importer
            .import(&country, content.as_bytes())
            .await
            .map_err(graphql_error)?;
        Ok(summary.into())
    }
}
