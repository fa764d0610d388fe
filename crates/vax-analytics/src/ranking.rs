//! Region ranker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vax_domain::Observation;

/// Ranking length when the caller does not ask for one.
pub const DEFAULT_TOP_N: i64 = 10;

/// Ranking length used inside country summaries.
pub const SUMMARY_TOP_N: i64 = 5;

/// One region's summed counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRank {
    /// Region name.
    pub region: String,
    /// Vaccinated total across all dates.
    pub vaccinated: u64,
    /// Deaths total across all dates.
    pub deaths: u64,
}

/// Rank regions by vaccinated total, descending.
///
/// National rows are excluded. Regions come from the data itself; ties keep
/// region-name order. `top_n <= 0` yields an empty ranking.
pub fn rank_regions<'a, I>(observations: I, top_n: i64) -> Vec<RegionRank>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let limit = usize::try_from(top_n).unwrap_or(0);
    if limit == 0 {
        return Vec::new();
    }

    let mut by_region: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for observation in observations {
        let Some(region) = observation.region_name() else {
            continue;
        };
        let entry = by_region.entry(region).or_default();
        entry.0 = entry.0.saturating_add(observation.vaccinated);
        entry.1 = entry.1.saturating_add(observation.deaths);
    }

    let mut ranking: Vec<RegionRank> = by_region
        .into_iter()
        .map(|(region, (vaccinated, deaths))| RegionRank {
            region: region.to_string(),
            vaccinated,
            deaths,
        })
        .collect();

    // Stable: equal counts stay in name order.
    ranking.sort_by(|a, b| b.vaccinated.cmp(&a.vaccinated));
    ranking.truncate(limit);
    ranking
}
