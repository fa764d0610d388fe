//! In-memory observation store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::{sort_for_listing, ObservationStore, UpsertOutcome};
use crate::error::Result;
use vax_domain::{CountryId, Observation, ObservationFilter, ObservationKey};

/// Map-backed store. Used by tests and by the API when no database path is
/// configured.
#[derive(Debug, Default)]
pub struct InMemoryObservationStore {
    rows: RwLock<BTreeMap<ObservationKey, Observation>>,
}

impl InMemoryObservationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with observations (later rows win on
    /// duplicate keys).
    #[must_use]
    pub fn with_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let rows = observations
            .into_iter()
            .map(|o| (o.key(), o))
            .collect::<BTreeMap<_, _>>();
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ObservationStore for InMemoryObservationStore {
    async fn filter(&self, filter: &ObservationFilter) -> Result<Vec<Observation>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Observation> = rows
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        drop(rows);

        sort_for_listing(&mut matched);
        Ok(matched)
    }

    async fn upsert(&self, observation: &Observation) -> Result<UpsertOutcome> {
        let previous = self
            .rows
            .write()
            .await
            .insert(observation.key(), observation.clone());

        let outcome = if previous.is_some() {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        };
        tracing::trace!(key = %observation.key(), ?outcome, "Upserted observation");
        Ok(outcome)
    }

    async fn countries(&self) -> Result<Vec<CountryId>> {
        let rows = self.rows.read().await;
        let countries: BTreeSet<CountryId> = rows.keys().map(|k| k.country.clone()).collect();
        Ok(countries.into_iter().collect())
    }
}
