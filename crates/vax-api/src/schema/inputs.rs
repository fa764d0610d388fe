//! # GraphQL Input Types
//!
//! Input object definitions for mutations and queries.

use async_graphql::InputObject;
use chrono::NaiveDate;
use vax_domain as domain;

// =============================================================================
// OBSERVATION INPUTS
// =============================================================================

/// One observation to insert or replace
#[derive(Debug, Clone, InputObject)]
pub struct ObservationInput {
    /// Country identifier (normalized to lowercase)
    pub country: String,
    /// Region; omit, leave empty or pass `N/A` for the national aggregate
    pub region: Option<String>,
    /// Calendar date
    pub date: NaiveDate,
    #[graphql(default)]
    pub vaccinated: u64,
    #[graphql(default)]
    pub deaths: u64,
    #[graphql(default)]
    pub population: u64,
}

impl TryFrom<ObservationInput> for domain::Observation {
    type Error = domain::DomainError;

    fn try_from(input: ObservationInput) -> Result<Self, Self::Error> {
        let country = domain::CountryId::parse(&input.country)?;
        Ok(Self::new(country, input.region.as_deref(), input.date).with_counts(
            input.vaccinated,
            input.deaths,
            input.population,
        ))
    }
}

// =============================================================================
// FILTER INPUTS
// =============================================================================

/// Observation filter; every field is optional
#[derive(Debug, Clone, Default, InputObject)]
pub struct ObservationFilterInput {
    pub country: Option<String>,
    /// Region name; empty or `N/A` selects national rows
    pub region: Option<String>,
    /// First date, inclusive
    pub from: Option<NaiveDate>,
    /// Last date, inclusive
    pub to: Option<NaiveDate>,
}

impl TryFrom<ObservationFilterInput> for domain::ObservationFilter {
    type Error = domain::DomainError;

    fn try_from(input: ObservationFilterInput) -> Result<Self, Self::Error> {
        Ok(Self {
            country: input
                .country
                .as_deref()
                .map(domain::CountryId::parse)
                .transpose()?,
            region: input
                .region
                .as_deref()
                .map_or(domain::RegionFilter::Any, domain::RegionFilter::from_text),
            date_range: domain::DateRange::from_bounds(input.from, input.to)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(region: Option<&str>) -> domain::ObservationFilter {
        domain::ObservationFilter::try_from(ObservationFilterInput {
            region: region.map(str::to_string),
            ..ObservationFilterInput::default()
        })
        .unwrap()
    }

    #[test]
    fn test_filter_region_is_normalized() {
        assert_eq!(filter(None).region, domain::RegionFilter::Any);
        assert_eq!(filter(Some("N/A")).region, domain::RegionFilter::National);
        assert_eq!(filter(Some("")).region, domain::RegionFilter::National);
        assert_eq!(
            filter(Some("  Lisboa ")).region,
            domain::RegionFilter::Named("Lisboa".to_string())
        );
    }
}
