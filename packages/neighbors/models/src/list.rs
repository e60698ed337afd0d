//! Display form of a neighbor.

use chrono::NaiveDate;

use crate::{NeighborRecord, party_name};

/// Shown when a voter has no last vote date.
pub const UNKNOWN_LAST_VOTE: &str = "(unknown last vote date)";

/// City, state and ZIP appended to street addresses for geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locality {
    /// City name.
    pub city: String,
    /// State abbreviation.
    pub state: String,
    /// ZIP code.
    pub zip: String,
}

/// One entry of the neighbor list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborListItem {
    /// Voter id.
    pub voter_id: String,
    /// Full name.
    pub name: String,
    /// Geocodable address: `"{house} {street}, {city}, {state} {zip}"`.
    pub address: String,
    /// Party display name or `(unknown party)`.
    pub party: String,
    /// Last vote date as exported, or `(unknown last vote date)`.
    pub last_vote: String,
    /// Parsed last vote date.
    pub last_vote_date: Option<NaiveDate>,
}

impl NeighborListItem {
    /// Builds the list entry for `record`.
    #[must_use]
    pub fn new(record: &NeighborRecord, locality: &Locality) -> Self {
        let last_vote = if record.last_vote_date.trim().is_empty() {
            UNKNOWN_LAST_VOTE.to_string()
        } else {
            record.last_vote_date.clone()
        };

        Self {
            voter_id: record.voter_id.clone(),
            name: record.full_name(),
            address: format!(
                "{} {}, {}, {} {}",
                record.house_number.trim(),
                record.street_name.trim(),
                locality.city,
                locality.state,
                locality.zip
            ),
            party: party_name(&record.party_code).to_string(),
            last_vote,
            last_vote_date: record.last_vote(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNKNOWN_PARTY;

    fn philadelphia() -> Locality {
        Locality {
            city: "Philadelphia".to_string(),
            state: "PA".to_string(),
            zip: "19148".to_string(),
        }
    }

    #[test]
    fn renders_full_entry() {
        let record = NeighborRecord {
            voter_id: "015234567-51".to_string(),
            first_name: "JANE".to_string(),
            middle_name: "Q".to_string(),
            last_name: "PUBLIC".to_string(),
            house_number: "1234".to_string(),
            street_name: "S 9TH ST".to_string(),
            party_code: "D".to_string(),
            last_vote_date: "11/02/2021".to_string(),
        };
        let item = NeighborListItem::new(&record, &philadelphia());
        assert_eq!(item.name, "JANE Q PUBLIC");
        assert_eq!(item.address, "1234 S 9TH ST, Philadelphia, PA 19148");
        assert_eq!(item.party, "Democratic");
        assert_eq!(item.last_vote, "11/02/2021");
        assert_eq!(item.last_vote_date, NaiveDate::from_ymd_opt(2021, 11, 2));
    }

    #[test]
    fn unknown_values_get_placeholders() {
        let record = NeighborRecord {
            voter_id: "9".to_string(),
            party_code: "ZZ".to_string(),
            ..NeighborRecord::default()
        };
        let item = NeighborListItem::new(&record, &philadelphia());
        assert_eq!(item.party, UNKNOWN_PARTY);
        assert_eq!(item.last_vote, UNKNOWN_LAST_VOTE);
        assert!(item.last_vote_date.is_none());
    }
}
