//! Per-date time series for dashboard charts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use vax_domain::Observation;

use crate::aggregate::{aggregate, GroupBy, GroupKey};

/// Totals of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Calendar date.
    pub date: NaiveDate,
    /// Vaccinated summed over every region of that date.
    pub vaccinated: u64,
    /// Deaths summed over every region of that date.
    pub deaths: u64,
}

/// Sum observations per date, ascending.
pub fn time_series<'a, I>(observations: I) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a Observation>,
{
    aggregate(observations, Some(GroupBy::Date))
        .into_iter()
        .filter_map(|(key, totals)| match key {
            GroupKey::Date(date) => Some(SeriesPoint {
                date,
                vaccinated: totals.vaccinated,
                deaths: totals.deaths,
            }),
            GroupKey::All | GroupKey::Region(_) => None,
        })
        .collect()
}
