//! # Vaccination Data Interchange
//!
//! Adapters between the observation store and flat files.
//!
//! - [`import`]: CSV upload parsing with per-row validation. A bad row is
//!   recorded and skipped, never fatal to the batch.
//! - [`export`]: the [`Exporter`] capability with CSV and JSON variants.
//!
//! Both directions share the header
//! `country,region_or_state,date,vaccinated,deaths,population`, so an export
//! re-imports to the same rows.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod import;

pub use error::{ExportError, ImportError, RowValidationError};
pub use export::{export_file_name, CsvExporter, ExportFormat, Exporter, JsonExporter, CSV_HEADER};
pub use import::{parse_csv, CsvImporter, ImportSummary, ParsedCsv, RowFailure};
