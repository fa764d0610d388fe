//! Output sinks: GraphQL batch upserts and CSV files.

use std::path::Path;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use vax_domain::Observation;
use vax_interchange::{CsvExporter, Exporter};

use crate::error::{CollectorError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 500;

const UPSERT_MUTATION: &str = r"
    mutation UpsertObservations($inputs: [ObservationInput!]!) {
        upsertObservations(inputs: $inputs) {
            written
        }
    }
";

// =============================================================================
// GRAPHQL
// =============================================================================

/// Posts observations to the API's `upsertObservations` mutation.
pub struct GraphQlSink {
    client: Client,
    url: String,
    batch_size: usize,
}

impl GraphQlSink {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, batch_size: usize) -> Self {
        Self {
            client,
            url: url.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Send every observation, one request per batch. Stops at the first
    /// rejected batch.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] on transport failures and
    /// [`CollectorError::Api`] when the API reports GraphQL errors.
    pub async fn send(&self, observations: &[Observation]) -> Result<usize> {
        let mut written = 0;

        for (index, chunk) in observations.chunks(self.batch_size).enumerate() {
            let response: GraphQlResponse = self
                .client
                .post(&self.url)
                .json(&batch_request(chunk))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let count = response.written()?;
            written += count;
            tracing::info!(batch = index + 1, rows = chunk.len(), written = count, "Posted observation batch");
        }

        Ok(written)
    }
}

/// GraphQL request body upserting `chunk`.
#[must_use]
pub fn batch_request(chunk: &[Observation]) -> Value {
    let inputs: Vec<Value> = chunk
        .iter()
        .map(|o| {
            json!({
                "country": o.country.as_str(),
                "region": o.region,
                "date": o.date.format("%Y-%m-%d").to_string(),
                "vaccinated": o.vaccinated,
                "deaths": o.deaths,
                "population": o.population,
            })
        })
        .collect();

    json!({
        "query": UPSERT_MUTATION,
        "variables": { "inputs": inputs },
    })
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorBody {
    message: String,
}

impl GraphQlResponse {
    fn written(&self) -> Result<usize> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(CollectorError::Api(messages.join("; ")));
        }

        self.data
            .as_ref()
            .and_then(|d| d.pointer("/upsertObservations/written"))
            .and_then(Value::as_u64)
            .and_then(|w| usize::try_from(w).ok())
            .ok_or_else(|| CollectorError::Api("response carried no written count".to_string()))
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Write observations as an importable CSV file.
///
/// # Errors
///
/// Returns an export or I/O error.
pub fn write_csv(path: &Path, observations: &[Observation]) -> Result<usize> {
    let bytes = CsvExporter.export(observations)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), rows = observations.len(), "Wrote CSV file");
    Ok(observations.len())
}
