//! CSV import.
//!
//! Parsing is pure ([`parse_csv`]); [`CsvImporter`] then upserts the parsed
//! rows into the store. Rows are imported under the caller's country: a
//! `country` column, if present, is ignored.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vax_domain::{CountryId, Observation};
use vax_persistence::ObservationStore;

use crate::error::{ImportError, RowValidationError};

/// Region assigned when the file has no region column at all.
pub const DEFAULT_REGION: &str = "national";

/// Number of error messages kept in an [`ImportSummary`].
pub const MAX_ERROR_SAMPLES: usize = 10;

const REGION_COLUMNS: [&str; 4] = ["region_or_state", "state_or_region", "region", "state"];

// =============================================================================
// PARSING
// =============================================================================

/// A rejected row and the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub line: u64,
    pub error: RowValidationError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Outcome of parsing one CSV document.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub observations: Vec<Observation>,
    pub failures: Vec<RowFailure>,
}

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    vaccinated: Option<usize>,
    deaths: Option<usize>,
    population: Option<usize>,
    region: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |wanted: &str| names.iter().position(|n| n == wanted);

        Self {
            date: find("date"),
            vaccinated: find("vaccinated"),
            deaths: find("deaths"),
            population: find("population"),
            region: REGION_COLUMNS.iter().find_map(|c| find(*c)),
        }
    }
}

/// Parse CSV content into observations for `country`.
///
/// Each row must carry `date`, `vaccinated`, `deaths` and `population`. An
/// empty numeric cell counts as zero. Invalid rows are collected in
/// [`ParsedCsv::failures`] and never stop the parse.
///
/// # Errors
///
/// Returns [`ImportError::MissingHeader`] for empty content or
/// [`ImportError::Header`] if the header row itself is unreadable.
pub fn parse_csv(country: &CountryId, content: &[u8]) -> Result<ParsedCsv, ImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content);

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::MissingHeader);
    }
    let columns = Columns::from_headers(&headers);

    let mut parsed = ParsedCsv::default();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(0, csv::Position::line);
                parsed.failures.push(RowFailure {
                    line,
                    error: RowValidationError::Malformed(err.to_string()),
                });
                continue;
            }
        };

        let line = record.position().map_or(0, csv::Position::line);
        match parse_row(country, &columns, &record) {
            Ok(observation) => parsed.observations.push(observation),
            Err(error) => {
                tracing::debug!(line, %error, "Rejected CSV row");
                parsed.failures.push(RowFailure { line, error });
            }
        }
    }

    Ok(parsed)
}

fn parse_row(
    country: &CountryId,
    columns: &Columns,
    record: &StringRecord,
) -> Result<Observation, RowValidationError> {
    let raw_date = field(record, columns.date, "date")?;
    let vaccinated = count(record, columns.vaccinated, "vaccinated")?;
    let deaths = count(record, columns.deaths, "deaths")?;
    let population = count(record, columns.population, "population")?;

    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| RowValidationError::InvalidDate(raw_date.to_string()))?;

    let region = match columns.region {
        Some(index) => record.get(index),
        None => Some(DEFAULT_REGION),
    };

    Ok(Observation::new(country.clone(), region, date).with_counts(vaccinated, deaths, population))
}

fn field<'r>(
    record: &'r StringRecord,
    column: Option<usize>,
    name: &'static str,
) -> Result<&'r str, RowValidationError> {
    column
        .and_then(|index| record.get(index))
        .ok_or(RowValidationError::MissingField(name))
}

fn count(
    record: &StringRecord,
    column: Option<usize>,
    name: &'static str,
) -> Result<u64, RowValidationError> {
    let raw = field(record, column, name)?;
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| RowValidationError::InvalidNumber {
        field: name,
        value: raw.to_string(),
    })
}

// =============================================================================
// IMPORT
// =============================================================================

/// Result of one import batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: Uuid,
    pub country: CountryId,
    pub imported_count: usize,
    pub errors_count: usize,
    /// First [`MAX_ERROR_SAMPLES`] messages, each prefixed with its line.
    pub errors: Vec<String>,
}

/// Imports CSV uploads into an [`ObservationStore`].
#[derive(Clone)]
pub struct CsvImporter {
    store: Arc<dyn ObservationStore>,
}

impl CsvImporter {
    #[must_use]
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }

    /// Parse `content` and upsert every valid row under `country`.
    ///
    /// # Errors
    ///
    /// Row problems are reported in the summary. An unreadable header or a
    /// store failure aborts the import.
    pub async fn import(
        &self,
        country: &CountryId,
        content: &[u8],
    ) -> Result<ImportSummary, ImportError> {
        let batch_id = Uuid::new_v4();
        let parsed = parse_csv(country, content)?;

        let imported_count = self.store.upsert_batch(&parsed.observations).await?;

        let summary = ImportSummary {
            batch_id,
            country: country.clone(),
            imported_count,
            errors_count: parsed.failures.len(),
            errors: parsed
                .failures
                .iter()
                .take(MAX_ERROR_SAMPLES)
                .map(ToString::to_string)
                .collect(),
        };

        tracing::info!(
            batch_id = %summary.batch_id,
            country = %summary.country,
            imported = summary.imported_count,
            errors = summary.errors_count,
            "CSV import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_domain::ObservationFilter;
    use vax_persistence::InMemoryObservationStore;

    fn brasil() -> CountryId {
        CountryId::parse("brasil").unwrap()
    }

    #[test]
    fn test_parse_valid_rows() {
        let csv = "date,state_or_region,vaccinated,deaths,population\n\
                   2024-01-01,Bahia,100,2,1000\n\
                   2024-01-02,N/A,50,1,500\n";
        let parsed = parse_csv(&brasil(), csv.as_bytes()).unwrap();

        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.observations.len(), 2);
        assert_eq!(parsed.observations[0].region.as_deref(), Some("Bahia"));
        assert_eq!(parsed.observations[0].vaccinated, 100);
        assert_eq!(parsed.observations[1].region, None);
    }

    #[test]
    fn test_headers_are_case_insensitive_and_country_column_ignored() {
        let csv = "Country,Region_Or_State,Date,Vaccinated,Deaths,Population\n\
                   usa,Lisboa,2024-03-01,1,0,2\n";
        let parsed = parse_csv(&brasil(), csv.as_bytes()).unwrap();

        assert_eq!(parsed.observations.len(), 1);
        assert_eq!(parsed.observations[0].country, brasil());
    }

    #[test]
    fn test_missing_region_column_defaults_to_national() {
        let csv = "date,vaccinated,deaths,population\n2024-01-01,1,1,1\n";
        let parsed = parse_csv(&brasil(), csv.as_bytes()).unwrap();
        assert_eq!(parsed.observations[0].region.as_deref(), Some(DEFAULT_REGION));
    }

    #[test]
    fn test_bad_rows_are_isolated() {
        let csv = "date,region,vaccinated,deaths,population\n\
                   2024-01-01,Bahia,10,1,100\n\
                   2024-01-02,Bahia,ten,1,100\n\
                   not-a-date,Bahia,10,1,100\n\
                   2024-01-04,Bahia,10\n\
                   2024-01-05,Bahia,-3,1,100\n\
                   2024-01-06,Bahia,,,\n";
        let parsed = parse_csv(&brasil(), csv.as_bytes()).unwrap();

        assert_eq!(parsed.observations.len(), 2);
        assert_eq!(parsed.observations[1].vaccinated, 0);
        assert_eq!(parsed.failures.len(), 4);

        assert_eq!(parsed.failures[0].line, 3);
        assert!(matches!(
            parsed.failures[0].error,
            RowValidationError::InvalidNumber { field: "vaccinated", .. }
        ));
        assert!(matches!(parsed.failures[1].error, RowValidationError::InvalidDate(_)));
        assert_eq!(
            parsed.failures[2].error,
            RowValidationError::MissingField("deaths")
        );
        assert_eq!(parsed.failures[2].to_string(), "line 5: missing required field: deaths");
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "date,region,vaccinated,deaths\n2024-01-01,Bahia,10,1\n";
        let parsed = parse_csv(&brasil(), csv.as_bytes()).unwrap();
        assert!(parsed.observations.is_empty());
        assert_eq!(
            parsed.failures[0].error,
            RowValidationError::MissingField("population")
        );
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(matches!(
            parse_csv(&brasil(), b""),
            Err(ImportError::MissingHeader)
        ));
    }

    #[tokio::test]
    async fn test_import_upserts_and_truncates_errors() {
        let store = Arc::new(InMemoryObservationStore::new());
        let importer = CsvImporter::new(store.clone());

        let mut csv = String::from("date,region,vaccinated,deaths,population\n");
        csv.push_str("2024-01-01,Bahia,10,1,100\n");
        for _ in 0..12 {
            csv.push_str("bad,Bahia,1,1,1\n");
        }

        let summary = importer.import(&brasil(), csv.as_bytes()).await.unwrap();
        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.errors_count, 12);
        assert_eq!(summary.errors.len(), MAX_ERROR_SAMPLES);
        assert!(summary.errors[0].starts_with("line 3:"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reimport_overwrites_same_key() {
        let store = Arc::new(InMemoryObservationStore::new());
        let importer = CsvImporter::new(store.clone());

        let first = "date,region,vaccinated,deaths,population\n2024-01-01,Bahia,10,1,100\n";
        let second = "date,region,vaccinated,deaths,population\n2024-01-01,Bahia,99,9,100\n";
        importer.import(&brasil(), first.as_bytes()).await.unwrap();
        importer.import(&brasil(), second.as_bytes()).await.unwrap();

        let rows = store.filter(&ObservationFilter::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].vaccinated, rows[0].deaths), (99, 9));
    }
}
