//! DuckDB repository implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::{params, params_from_iter, Connection};

use super::traits::{ObservationStore, UpsertOutcome};
use crate::error::{PersistenceError, Result};
use vax_domain::{CountryId, Observation, ObservationFilter, RegionFilter};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Region value stored for national rows.
const NATIONAL_REGION: &str = "";

// =============================================================================
// DUCKDB STORE
// =============================================================================

/// Observation store backed by an embedded DuckDB database.
///
/// National rows are stored with region `''` so the primary key also
/// deduplicates them; `NULL`s never collide in a uniqueness constraint.
/// Queries run on tokio's blocking pool.
pub struct DuckDbObservationStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbObservationStore {
    /// Create a new in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Create a store with persistent storage at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::info!(path = %path.as_ref().display(), "Opening DuckDB observation store");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            op(&guard)
        })
        .await
        .map_err(|e| PersistenceError::Task(e.to_string()))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| PersistenceError::LockPoisoned)
}

fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS observations (
            country VARCHAR NOT NULL,
            region VARCHAR NOT NULL DEFAULT '',
            date DATE NOT NULL,
            vaccinated UBIGINT NOT NULL DEFAULT 0,
            deaths UBIGINT NOT NULL DEFAULT 0,
            population UBIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (country, region, date)
        );
        ",
    )?;
    Ok(())
}

fn query_filtered(conn: &Connection, filter: &ObservationFilter) -> Result<Vec<Observation>> {
    let mut sql = String::from(
        "SELECT country, region, CAST(date AS VARCHAR), vaccinated, deaths, population \
         FROM observations WHERE 1 = 1",
    );
    let mut values: Vec<String> = Vec::new();

    if let Some(ref country) = filter.country {
        sql.push_str(" AND country = ?");
        values.push(country.to_string());
    }
    match filter.region {
        RegionFilter::Any => {}
        RegionFilter::National => {
            sql.push_str(" AND region = ?");
            values.push(NATIONAL_REGION.to_string());
        }
        RegionFilter::Named(ref region) => {
            sql.push_str(" AND region = ?");
            values.push(region.clone());
        }
    }
    if let Some(range) = filter.date_range {
        if range.start() != NaiveDate::MIN {
            sql.push_str(" AND date >= CAST(? AS DATE)");
            values.push(range.start().format(DATE_FORMAT).to_string());
        }
        if range.end() != NaiveDate::MAX {
            sql.push_str(" AND date <= CAST(? AS DATE)");
            values.push(range.end().format(DATE_FORMAT).to_string());
        }
    }
    sql.push_str(" ORDER BY date DESC, country ASC, region ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(StoredRow {
            country: row.get(0)?,
            region: row.get(1)?,
            date: row.get(2)?,
            vaccinated: row.get(3)?,
            deaths: row.get(4)?,
            population: row.get(5)?,
        })
    })?;

    let stored = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    stored.into_iter().map(StoredRow::into_observation).collect()
}

fn upsert_row(conn: &Connection, observation: &Observation) -> Result<UpsertOutcome> {
    let country = observation.country.to_string();
    let region = observation
        .region
        .clone()
        .unwrap_or_else(|| NATIONAL_REGION.to_string());
    let date = observation.date.format(DATE_FORMAT).to_string();

    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM observations \
         WHERE country = ? AND region = ? AND date = CAST(? AS DATE)",
        params![country, region, date],
        |row| row.get(0),
    )?;

    conn.execute(
        r"
        INSERT OR REPLACE INTO observations (
            country, region, date, vaccinated, deaths, population
        ) VALUES (?, ?, CAST(? AS DATE), ?, ?, ?)
        ",
        params![
            country,
            region,
            date,
            observation.vaccinated,
            observation.deaths,
            observation.population,
        ],
    )?;

    Ok(if existing > 0 {
        UpsertOutcome::Replaced
    } else {
        UpsertOutcome::Inserted
    })
}

fn distinct_countries(conn: &Connection) -> Result<Vec<CountryId>> {
    let mut stmt = conn.prepare("SELECT DISTINCT country FROM observations ORDER BY country")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let names = rows.collect::<std::result::Result<Vec<_>, _>>()?;

    names
        .iter()
        .map(|name| CountryId::parse(name).map_err(PersistenceError::from))
        .collect()
}

#[async_trait]
impl ObservationStore for DuckDbObservationStore {
    async fn filter(&self, filter: &ObservationFilter) -> Result<Vec<Observation>> {
        let owned = filter.clone();
        let rows = self
            .with_connection(move |conn| query_filtered(conn, &owned))
            .await?;
        tracing::debug!(rows = rows.len(), ?filter, "Loaded observations from DuckDB");
        Ok(rows)
    }

    async fn upsert(&self, observation: &Observation) -> Result<UpsertOutcome> {
        let owned = observation.clone();
        let outcome = self
            .with_connection(move |conn| upsert_row(conn, &owned))
            .await?;
        tracing::trace!(key = %observation.key(), ?outcome, "Upserted observation");
        Ok(outcome)
    }

    async fn upsert_batch(&self, observations: &[Observation]) -> Result<usize> {
        let owned = observations.to_vec();
        let written = self
            .with_connection(move |conn| {
                owned.iter().try_for_each(|o| upsert_row(conn, o).map(|_| ()))?;
                Ok(owned.len())
            })
            .await?;
        tracing::debug!(written, "Upserted observation batch into DuckDB");
        Ok(written)
    }

    async fn countries(&self) -> Result<Vec<CountryId>> {
        self.with_connection(distinct_countries).await
    }
}

/// Raw row as read from the `observations` table.
struct StoredRow {
    country: String,
    region: String,
    date: String,
    vaccinated: u64,
    deaths: u64,
    population: u64,
}

impl StoredRow {
    fn into_observation(self) -> Result<Observation> {
        let country = CountryId::parse(&self.country)?;
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| PersistenceError::Conversion(format!("date '{}': {e}", self.date)))?;

        Ok(Observation::new(country, Some(&self.region), date).with_counts(
            self.vaccinated,
            self.deaths,
            self.population,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryObservationStore;
    use vax_domain::DateRange;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn obs(country: &str, region: Option<&str>, day: u32, vaccinated: u64) -> Observation {
        Observation::new(CountryId::parse(country).unwrap(), region, date(day))
            .with_counts(vaccinated, vaccinated / 100, vaccinated * 3)
    }

    #[tokio::test]
    async fn test_create_store() {
        let store = DuckDbObservationStore::new_in_memory().unwrap();
        assert!(store.filter(&ObservationFilter::all()).await.unwrap().is_empty());
        assert!(store.countries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_key() {
        let store = DuckDbObservationStore::new_in_memory().unwrap();

        let first = store.upsert(&obs("brasil", Some("Bahia"), 1, 1_000)).await.unwrap();
        let second = store.upsert(&obs("brasil", Some("Bahia"), 1, 2_000)).await.unwrap();
        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Replaced);

        let rows = store.filter(&ObservationFilter::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vaccinated, 2_000);
        assert_eq!(rows[0].population, 6_000);
    }

    #[tokio::test]
    async fn test_national_row_round_trips_as_none() {
        let store = DuckDbObservationStore::new_in_memory().unwrap();
        store.upsert(&obs("usa", None, 2, 10)).await.unwrap();
        store.upsert(&obs("usa", None, 2, 20)).await.unwrap();

        let rows = store.filter(&ObservationFilter::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region, None);
        assert_eq!(rows[0].vaccinated, 20);
    }

    #[tokio::test]
    async fn test_filter_by_country_region_and_dates() {
        let store = DuckDbObservationStore::new_in_memory().unwrap();
        let rows = [
            obs("italia", Some("Roma"), 1, 10),
            obs("italia", Some("Roma"), 5, 50),
            obs("italia", Some("Nápoles"), 5, 70),
            obs("portugal", Some("Porto"), 5, 90),
        ];
        assert_eq!(store.upsert_batch(&rows).await.unwrap(), 4);

        let italy = CountryId::parse("italia").unwrap();
        let all_italy = store
            .filter(&ObservationFilter::for_country(italy.clone()))
            .await
            .unwrap();
        assert_eq!(all_italy.len(), 3);
        assert_eq!(all_italy[0].date, date(5));
        assert_eq!(all_italy[2].date, date(1));

        let roma_recent = store
            .filter(
                &ObservationFilter::for_country(italy)
                    .with_region("Roma")
                    .with_date_range(Some(DateRange::new(date(2), date(9)).unwrap())),
            )
            .await
            .unwrap();
        assert_eq!(roma_recent.len(), 1);
        assert_eq!(roma_recent[0].vaccinated, 50);
    }

    #[tokio::test]
    async fn test_open_ended_range_skips_unbounded_side() {
        let store = DuckDbObservationStore::new_in_memory().unwrap();
        store
            .upsert_batch(&[obs("usa", None, 1, 1), obs("usa", None, 9, 9)])
            .await
            .unwrap();

        let range = DateRange::from_bounds(Some(date(3)), None).unwrap();
        let rows = store
            .filter(&ObservationFilter::all().with_date_range(range))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(9));
    }

    #[tokio::test]
    async fn test_region_filter_agrees_with_memory_store() {
        let rows = [
            obs("portugal", None, 1, 10),
            obs("portugal", Some("Porto"), 1, 20),
            obs("portugal", Some("Lisboa"), 2, 30),
        ];
        let duck = DuckDbObservationStore::new_in_memory().unwrap();
        duck.upsert_batch(&rows).await.unwrap();
        let memory = InMemoryObservationStore::with_observations(rows.clone());

        let filters = [
            ObservationFilter::all().with_region(""),
            ObservationFilter::all().with_region("N/A"),
            ObservationFilter::all().national_only(),
            ObservationFilter::all().with_region(" Porto "),
            ObservationFilter::all(),
        ];
        let expected = [1, 1, 1, 1, 3];

        for (filter, count) in filters.iter().zip(expected) {
            let from_duck = duck.filter(filter).await.unwrap();
            let from_memory = memory.filter(filter).await.unwrap();
            assert_eq!(from_duck.len(), count, "{filter:?}");
            assert_eq!(from_duck, from_memory, "{filter:?}");
        }

        let national = duck
            .filter(&ObservationFilter::all().with_region("n/a"))
            .await
            .unwrap();
        assert_eq!(national[0].region, None);
        assert_eq!(national[0].vaccinated, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_upserts_share_connection() {
        let store = std::sync::Arc::new(DuckDbObservationStore::new_in_memory().unwrap());

        let tasks: Vec<_> = (1..=8)
            .map(|day| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.upsert(&obs("italia", Some("Roma"), day, 100)).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), UpsertOutcome::Inserted);
        }

        let rows = store.filter(&ObservationFilter::all()).await.unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].date, date(8));
    }

    #[tokio::test]
    async fn test_persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.duckdb");

        {
            let store = DuckDbObservationStore::open(&path).unwrap();
            store.upsert(&obs("portugal", Some("Lisboa"), 4, 44)).await.unwrap();
        }

        let reopened = DuckDbObservationStore::open(&path).unwrap();
        let countries = reopened.countries().await.unwrap();
        assert_eq!(countries, vec![CountryId::parse("portugal").unwrap()]);
    }
}
