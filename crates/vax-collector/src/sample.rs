//! Sample series generation.
//!
//! Every region gets one row per day over a window ending yesterday. The
//! series grows linearly from half of the country's base count, which keeps
//! rankings and comparisons stable enough to eyeball in the dashboard.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use vax_domain::{CountryId, Observation};

use crate::error::{CollectorError, Result};

/// Length of the generated window in days.
pub const DEFAULT_DAYS: u32 = 90;

/// Country, its regions and the base vaccinated count of each regional series.
pub const SAMPLE_COUNTRIES: [(&str, &[&str], u64); 4] = [
    (
        "brasil",
        &["São Paulo", "Rio de Janeiro", "Minas Gerais", "Bahia"],
        80_000_000,
    ),
    ("portugal", &["Lisboa", "Porto", "Covilhã"], 5_000_000),
    ("italia", &["Roma", "Milão", "Nápoles"], 35_000_000),
    ("usa", &["California", "Nova York", "Texas"], 200_000_000),
];

/// Vaccinated and deaths counts of day `day` for a series with base `base`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn sample_counts(base: u64, day: u32) -> (u64, u64) {
    let i = f64::from(day);
    let vaccinated = (base as f64 * (0.5 + i / 180.0) + i * 50_000.0) as u64;
    let deaths = (vaccinated as f64 * 0.02 + i * 100.0) as u64;
    (vaccinated, deaths)
}

/// Generates the sample series, optionally perturbed by Gaussian noise.
pub struct SampleGenerator {
    days: u32,
    jitter: Option<Normal<f64>>,
    rng: StdRng,
}

impl SampleGenerator {
    #[must_use]
    pub fn new(days: u32) -> Self {
        Self {
            days,
            jitter: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Multiply each count by `1 + N(0, pct / 100)`. Zero disables the noise.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidArgument`] for a negative or
    /// non-finite percentage.
    pub fn with_jitter(mut self, pct: f64) -> Result<Self> {
        if pct == 0.0 {
            self.jitter = None;
            return Ok(self);
        }
        if !pct.is_finite() {
            return Err(CollectorError::InvalidArgument(format!(
                "jitter must be finite, got {pct}"
            )));
        }
        let normal = Normal::new(0.0, pct / 100.0).map_err(|e| {
            CollectorError::InvalidArgument(format!("jitter of {pct}%: {e}"))
        })?;
        self.jitter = Some(normal);
        Ok(self)
    }

    /// Fix the noise seed so runs are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Produce every regional series for the window ending the day before
    /// `today`.
    ///
    /// # Errors
    ///
    /// Fails only if a built-in country identifier is rejected.
    pub fn generate(&mut self, today: NaiveDate) -> Result<Vec<Observation>> {
        let first = today - Duration::days(i64::from(self.days));
        let mut observations = Vec::new();

        for (name, regions, base) in SAMPLE_COUNTRIES {
            let country = CountryId::parse(name)?;
            for region in regions.iter().copied() {
                for day in 0..self.days {
                    let date = first + Duration::days(i64::from(day));
                    let (vaccinated, deaths) = sample_counts(base, day);
                    let observation = Observation::new(country.clone(), Some(region), date)
                        .with_counts(self.perturb(vaccinated), self.perturb(deaths), base * 2);
                    observations.push(observation);
                }
            }
        }

        tracing::info!(
            rows = observations.len(),
            days = self.days,
            jitter = self.jitter.is_some(),
            "Generated sample observations"
        );
        Ok(observations)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn perturb(&mut self, value: u64) -> u64 {
        match self.jitter {
            Some(normal) => {
                let factor = 1.0 + normal.sample(&mut self.rng);
                (value as f64 * factor).max(0.0) as u64
            }
            None => value,
        }
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_DAYS)
    }
}
