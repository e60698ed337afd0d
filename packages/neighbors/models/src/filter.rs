//! Recency and party filter.

use chrono::NaiveDate;

use crate::NeighborRecord;

/// Which neighbors to list.
///
/// Both criteria must hold. An unset criterion matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NeighborFilter {
    /// Only voters whose last vote is on or after this date. Voters with
    /// no usable last vote date never match.
    pub recency: Option<NaiveDate>,
    /// Only voters with exactly this party code.
    pub party: Option<String>,
}

impl NeighborFilter {
    /// A filter that matches every record.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            recency: None,
            party: None,
        }
    }

    /// Whether no criterion is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.recency.is_none() && self.party.is_none()
    }

    /// Whether `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &NeighborRecord) -> bool {
        let recent = self
            .recency
            .is_none_or(|since| record.last_vote().is_some_and(|voted| voted >= since));

        let party = self
            .party
            .as_deref()
            .is_none_or(|code| record.party_code == code);

        recent && party
    }

    /// The matching records in their original order.
    pub fn apply<'a>(
        &'a self,
        records: &'a [NeighborRecord],
    ) -> impl Iterator<Item = &'a NeighborRecord> + 'a {
        records.iter().filter(|record| self.matches(record))
    }
}
