//! Export adapters.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::WriterBuilder;
use vax_domain::{Observation, NATIONAL_PLACEHOLDER};

use crate::error::ExportError;

/// Column order shared by export and import.
pub const CSV_HEADER: [&str; 6] = [
    "country",
    "region_or_state",
    "date",
    "vaccinated",
    "deaths",
    "population",
];

/// Serializes observations into a downloadable document.
pub trait Exporter: Send + Sync {
    /// Render `observations` in this format.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if serialization fails.
    fn export(&self, observations: &[Observation]) -> Result<Vec<u8>, ExportError>;

    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str;

    /// File extension without the dot.
    fn file_extension(&self) -> &'static str;
}

// =============================================================================
// CSV
// =============================================================================

/// CSV with a fixed header and `N/A` for national rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn export(&self, observations: &[Observation]) -> Result<Vec<u8>, ExportError> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for observation in observations {
            writer.write_record([
                observation.country.to_string(),
                observation
                    .region
                    .clone()
                    .unwrap_or_else(|| NATIONAL_PLACEHOLDER.to_string()),
                observation.date.format("%Y-%m-%d").to_string(),
                observation.vaccinated.to_string(),
                observation.deaths.to_string(),
                observation.population.to_string(),
            ])?;
        }

        writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
    }

    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }
}

// =============================================================================
// JSON
// =============================================================================

/// Pretty-printed JSON array of observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, observations: &[Observation]) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(observations)?)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

// =============================================================================
// FORMAT SELECTION
// =============================================================================

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub fn exporter(self) -> &'static dyn Exporter {
        match self {
            Self::Csv => &CsvExporter,
            Self::Json => &JsonExporter,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Attachment name, e.g. `vaccination_data_20240131_235959.csv`.
#[must_use]
pub fn export_file_name(format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "vaccination_data_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.exporter().file_extension()
    )
}
