//! # Vaccination Comparison - Domain Model
//!
//! Core value objects shared by every layer: the per-region daily
//! [`Observation`], its uniqueness key, query filters and summed [`Totals`].
//! These types carry no I/O and are the single source of truth for the
//! store, the analytics engine and the API.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder written for the national aggregate when exporting.
pub const NATIONAL_PLACEHOLDER: &str = "N/A";

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Normalized country identifier.
///
/// Always trimmed and lowercase, so `"Brasil"` and `" BRASIL "` name the same
/// country regardless of the import source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryId(String);

impl CountryId {
    /// Normalize a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidArgument`] when the input is empty or
    /// whitespace only.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::InvalidArgument(
                "country identifier must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryId> for String {
    fn from(id: CountryId) -> Self {
        id.0
    }
}

/// Normalize a free-text region.
///
/// Empty text and the export placeholder `N/A` both denote the national
/// aggregate and become `None`.
#[must_use]
pub fn normalize_region(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NATIONAL_PLACEHOLDER) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn deserialize_region<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_region(raw.as_deref()))
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidDateRange`] when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from optional bounds, leaving open ends unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidDateRange`] when both bounds are given
    /// and out of order.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, DomainError> {
        match (start, end) {
            (None, None) => Ok(None),
            (start, end) => Self::new(
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )
            .map(Some),
        }
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// One country/region/date row of vaccination and death counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub country: CountryId,
    /// `None` is the national aggregate with no sub-division.
    #[serde(default, deserialize_with = "deserialize_region")]
    pub region: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub vaccinated: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub population: u64,
}

impl Observation {
    /// Create an observation with a normalized region and zeroed counts.
    #[must_use]
    pub fn new(country: CountryId, region: Option<&str>, date: NaiveDate) -> Self {
        Self {
            country,
            region: normalize_region(region),
            date,
            vaccinated: 0,
            deaths: 0,
            population: 0,
        }
    }

    #[must_use]
    pub fn with_counts(mut self, vaccinated: u64, deaths: u64, population: u64) -> Self {
        self.vaccinated = vaccinated;
        self.deaths = deaths;
        self.population = population;
        self
    }

    /// Uniqueness key of this row in the store.
    #[must_use]
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            country: self.country.clone(),
            region: self.region.clone(),
            date: self.date,
        }
    }

    /// Region name if this row belongs to a distinct sub-division.
    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.trim().is_empty())
    }

    #[must_use]
    pub const fn totals(&self) -> Totals {
        Totals {
            vaccinated: self.vaccinated,
            deaths: self.deaths,
            population: self.population,
        }
    }
}

/// `(country, region, date)`: at most one observation per region per day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObservationKey {
    pub country: CountryId,
    pub region: Option<String>,
    pub date: NaiveDate,
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.country,
            self.region.as_deref().unwrap_or(NATIONAL_PLACEHOLDER),
            self.date
        )
    }
}

// =============================================================================
// AGGREGATE TYPES
// =============================================================================

/// Summed counts over a set of observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub vaccinated: u64,
    pub deaths: u64,
    pub population: u64,
}

impl Totals {
    #[must_use]
    pub const fn new(vaccinated: u64, deaths: u64, population: u64) -> Self {
        Self {
            vaccinated,
            deaths,
            population,
        }
    }

    /// Add one observation's counts, saturating rather than wrapping.
    pub const fn accumulate(&mut self, observation: &Observation) {
        self.vaccinated = self.vaccinated.saturating_add(observation.vaccinated);
        self.deaths = self.deaths.saturating_add(observation.deaths);
        self.population = self.population.saturating_add(observation.population);
    }
}

impl Add for Totals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            vaccinated: self.vaccinated.saturating_add(rhs.vaccinated),
            deaths: self.deaths.saturating_add(rhs.deaths),
            population: self.population.saturating_add(rhs.population),
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<'a> FromIterator<&'a Observation> for Totals {
    fn from_iter<I: IntoIterator<Item = &'a Observation>>(iter: I) -> Self {
        let mut totals = Self::default();
        for observation in iter {
            totals.accumulate(observation);
        }
        totals
    }
}

// =============================================================================
// QUERY/FILTER TYPES
// =============================================================================

/// Region criterion of an [`ObservationFilter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionFilter {
    /// Every row, national or regional.
    #[default]
    Any,
    /// Only national aggregate rows.
    National,
    /// Rows of one named region.
    Named(String),
}

impl RegionFilter {
    /// Build from free text with the same normalization writes use: empty
    /// text and `N/A` select national rows.
    #[must_use]
    pub fn from_text(raw: &str) -> Self {
        normalize_region(Some(raw)).map_or(Self::National, Self::Named)
    }

    #[must_use]
    pub fn matches(&self, region: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::National => region.is_none(),
            Self::Named(name) => region == Some(name.as_str()),
        }
    }
}

/// Filter criteria for loading observations from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationFilter {
    pub country: Option<CountryId>,
    #[serde(default)]
    pub region: RegionFilter,
    pub date_range: Option<DateRange>,
}

impl ObservationFilter {
    /// Match every observation.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_country(country: CountryId) -> Self {
        Self {
            country: Some(country),
            ..Self::default()
        }
    }

    /// Restrict to the region named by `region`; empty text or `N/A`
    /// restricts to national rows.
    #[must_use]
    pub fn with_region(mut self, region: impl AsRef<str>) -> Self {
        self.region = RegionFilter::from_text(region.as_ref());
        self
    }

    #[must_use]
    pub fn national_only(mut self) -> Self {
        self.region = RegionFilter::National;
        self
    }

    #[must_use]
    pub const fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    #[must_use]
    pub fn matches(&self, observation: &Observation) -> bool {
        if let Some(ref country) = self.country {
            if &observation.country != country {
                return false;
            }
        }
        if !self.region.matches(observation.region.as_deref()) {
            return false;
        }
        if let Some(range) = self.date_range {
            if !range.contains(observation.date) {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}
