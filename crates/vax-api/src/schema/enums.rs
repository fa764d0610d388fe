//! # GraphQL Enums

use async_graphql::Enum;
use vax_persistence as persistence;

/// Whether an upsert created a row or overwrote one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

impl From<persistence::UpsertOutcome> for UpsertOutcome {
    fn from(outcome: persistence::UpsertOutcome) -> Self {
        match outcome {
            persistence::UpsertOutcome::Inserted => Self::Inserted,
            persistence::UpsertOutcome::Replaced => Self::Replaced,
        }
    }
}
