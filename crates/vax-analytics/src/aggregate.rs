//! Aggregator: sum-based totals over an observation subset.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use vax_domain::{Observation, Totals};

/// Optional grouping key for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    /// One group per region; national rows group under `None`.
    Region,
    /// One group per calendar date.
    Date,
}

/// Key of one aggregated group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    /// Grand total of an ungrouped aggregation.
    All,
    /// Totals of one region.
    Region(Option<String>),
    /// Totals of one date.
    Date(NaiveDate),
}

/// Sum vaccinated, deaths and population per group.
///
/// Groups without matching observations are absent from the result. The
/// ungrouped case always yields [`GroupKey::All`], zeroed when the input is
/// empty.
pub fn aggregate<'a, I>(observations: I, group_by: Option<GroupBy>) -> BTreeMap<GroupKey, Totals>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut groups = BTreeMap::new();

    let Some(group_by) = group_by else {
        groups.insert(GroupKey::All, observations.into_iter().collect());
        return groups;
    };

    for observation in observations {
        let key = match group_by {
            GroupBy::Region => GroupKey::Region(observation.region.clone()),
            GroupBy::Date => GroupKey::Date(observation.date),
        };
        groups
            .entry(key)
            .or_insert_with(Totals::default)
            .accumulate(observation);
    }
    groups
}

/// Grand total of a set of observations.
pub fn totals<'a, I>(observations: I) -> Totals
where
    I: IntoIterator<Item = &'a Observation>,
{
    observations.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_domain::CountryId;

    fn obs(region: Option<&str>, day: u32, vaccinated: u64, deaths: u64) -> Observation {
        Observation::new(
            CountryId::parse("brasil").unwrap(),
            region,
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        )
        .with_counts(vaccinated, deaths, vaccinated * 2)
    }

    #[test]
    fn test_ungrouped_empty_is_zero() {
        let empty: [Observation; 0] = [];
        let result = aggregate(&empty, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[&GroupKey::All], Totals::default());
    }

    #[test]
    fn test_grouped_empty_is_empty() {
        let empty: Vec<Observation> = Vec::new();
        assert!(aggregate(&empty, Some(GroupBy::Region)).is_empty());
    }

    #[test]
    fn test_group_by_region() {
        let rows = [
            obs(Some("Bahia"), 1, 10, 1),
            obs(Some("Bahia"), 2, 15, 2),
            obs(Some("Minas Gerais"), 1, 7, 0),
            obs(None, 1, 100, 9),
        ];

        let result = aggregate(&rows, Some(GroupBy::Region));
        assert_eq!(result.len(), 3);
        assert_eq!(
            result[&GroupKey::Region(Some("Bahia".to_string()))],
            Totals::new(25, 3, 50)
        );
        assert_eq!(result[&GroupKey::Region(None)].vaccinated, 100);
    }

    #[test]
    fn test_group_by_date() {
        let rows = [
            obs(Some("Bahia"), 1, 10, 1),
            obs(Some("Minas Gerais"), 1, 7, 0),
            obs(Some("Bahia"), 2, 15, 2),
        ];

        let result = aggregate(&rows, Some(GroupBy::Date));
        let day1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(result[&GroupKey::Date(day1)], Totals::new(17, 1, 34));
    }

    #[test]
    fn test_totals_sums_everything() {
        let rows = [obs(None, 1, 1, 1), obs(Some("Bahia"), 1, 2, 2)];
        assert_eq!(totals(&rows), Totals::new(3, 3, 6));
    }
}
