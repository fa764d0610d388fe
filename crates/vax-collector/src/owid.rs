//! Our World in Data COVID dump.
//!
//! The dump is a JSON object keyed by ISO code (older snapshots used the
//! country name), each value holding a `location`, an optional country-level
//! `population` and a `data` array of daily entries.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use vax_domain::{CountryId, Observation};
use vax_interchange::import::DEFAULT_REGION;

use crate::error::Result;

pub const OWID_URL: &str = "https://covid.ourworldindata.org/data/owid-covid-data.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// OWID location name to country identifier.
pub const COUNTRY_MAPPING: [(&str, &str); 4] = [
    ("Brazil", "brasil"),
    ("Portugal", "portugal"),
    ("Italy", "italia"),
    ("United States", "usa"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwidEntry {
    pub date: Option<String>,
    pub people_fully_vaccinated: Option<f64>,
    pub total_deaths: Option<f64>,
    pub population: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwidCountry {
    pub location: Option<String>,
    pub population: Option<f64>,
    #[serde(default)]
    pub data: Vec<OwidEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct OwidDataset {
    countries: HashMap<String, OwidCountry>,
}

impl OwidDataset {
    /// Download and decode the dump.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CollectorError::Http`] on a transport failure, a
    /// non-success status or an undecodable body.
    pub async fn fetch(client: &Client, url: &str) -> Result<Self> {
        tracing::info!(%url, "Fetching OWID dataset");
        let dataset = client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<Self>()
            .await?;
        tracing::info!(locations = dataset.countries.len(), "OWID dataset downloaded");
        Ok(dataset)
    }

    /// Decode a dump already in memory.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if `bytes` is not an OWID dump.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    fn find(&self, name: &str) -> Option<&OwidCountry> {
        self.countries.get(name).or_else(|| {
            self.countries
                .values()
                .find(|c| c.location.as_deref() == Some(name))
        })
    }

    /// National observations for every mapped country.
    ///
    /// Entries without a valid date, or with neither vaccinations nor
    /// deaths, are skipped.
    ///
    /// # Errors
    ///
    /// Fails only if a mapped country identifier is rejected.
    pub fn observations(&self) -> Result<Vec<Observation>> {
        let mut observations = Vec::new();

        for (name, id) in COUNTRY_MAPPING {
            let Some(series) = self.find(name) else {
                tracing::warn!(country = name, "Country missing from OWID dataset");
                continue;
            };

            let country = CountryId::parse(id)?;
            let before = observations.len();
            observations.extend(
                series
                    .data
                    .iter()
                    .filter_map(|entry| entry.to_observation(&country, series.population)),
            );

            tracing::info!(
                country = %country,
                rows = observations.len() - before,
                skipped = series.data.len() - (observations.len() - before),
                "Converted OWID series"
            );
        }

        Ok(observations)
    }
}

impl OwidEntry {
    fn to_observation(&self, country: &CountryId, population: Option<f64>) -> Option<Observation> {
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;

        let vaccinated = to_count(self.people_fully_vaccinated);
        let deaths = to_count(self.total_deaths);
        if vaccinated == 0 && deaths == 0 {
            return None;
        }

        Some(
            Observation::new(country.clone(), Some(DEFAULT_REGION), date).with_counts(
                vaccinated,
                deaths,
                to_count(self.population.or(population)),
            ),
        )
    }
}

/// Null, negative and non-finite values count as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.trunc() as u64)
}
