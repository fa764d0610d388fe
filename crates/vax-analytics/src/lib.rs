//! # Vaccination Analytics
//!
//! Aggregation and comparison engine over per-region daily observations.
//! Every query runs against an immutable [`ObservationSet`] loaded once from
//! an injected [`vax_persistence::ObservationStore`].
//!
//! ## Features
//!
//! - Sum-based totals, optionally grouped by region or date
//! - Mortality and vaccination rates with a zero-denominator policy
//! - Regional rankings within a country
//! - Cross-country comparison with best-performer selection
//! - Per-date time series for dashboards

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod aggregate;
pub mod comparator;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod rates;
pub mod series;

pub use aggregate::{aggregate, GroupBy, GroupKey};
pub use comparator::{
    select_best_performer, ComparisonReport, CountrySummary, CountryTotalsRow, CountryValue,
    DeathsComparisonRow,
};
pub use engine::{AnalyticsEngine, ObservationSet};
pub use error::{AnalyticsError, Result};
pub use ranking::{rank_regions, RegionRank, DEFAULT_TOP_N, SUMMARY_TOP_N};
pub use rates::{mortality_rate, round2, vaccination_rate};
pub use series::{time_series, SeriesPoint};
