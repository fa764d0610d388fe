//! # Vaccination Data Collector
//!
//! Batch producer of observations for the comparison API.
//!
//! ## Features
//!
//! - Deterministic sample series with optional Gaussian jitter
//! - Conversion of the Our World in Data COVID dump
//! - GraphQL batch upserts, CSV files or dry runs as output

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod owid;
pub mod sample;
pub mod sink;

pub use error::{CollectorError, Result};
pub use owid::{OwidDataset, OWID_URL};
pub use sample::SampleGenerator;
pub use sink::{write_csv, GraphQlSink};
