#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Records from the per-precinct voter exports and the filters applied to
//! them.
//!
//! Exports are CSV files with a header row. Only the columns below are
//! read; anything else in the file is ignored:
//!
//! | Header | Field |
//! |---|---|
//! | `ID Number` | [`NeighborRecord::voter_id`] |
//! | `First Name`, `Middle Name`, `Last Name` | name parts |
//! | `House Number`, `Street Name` | street address |
//! | `Party Code` | [`NeighborRecord::party_code`] |
//! | `Last Vote Date` | `MM/DD/YYYY` |

pub mod filter;
pub mod list;
pub mod party;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

pub use filter::NeighborFilter;
pub use list::{Locality, NeighborListItem, UNKNOWN_LAST_VOTE};
pub use party::{PoliticalParty, UNKNOWN_PARTY, find_party, party_name, political_parties};

/// Header of the voter id column.
pub const VOTER_ID_HEADER: &str = "ID Number";

/// `MM/DD/YYYY`, the export's date format.
static LAST_VOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("valid regex"));

/// Errors from reading a voter export.
#[derive(Debug, Error)]
pub enum NeighborParseError {
    /// The CSV could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("Voter export has no \"{name}\" column")]
    MissingColumn {
        /// The missing header.
        name: &'static str,
    },
}

/// One registered voter.
///
/// Columns absent from a row come through as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NeighborRecord {
    /// Voter id, unique across exports.
    #[serde(rename = "ID Number", default)]
    pub voter_id: String,
    /// Given name.
    #[serde(rename = "First Name", default)]
    pub first_name: String,
    /// Middle name or initial.
    #[serde(rename = "Middle Name", default)]
    pub middle_name: String,
    /// Family name.
    #[serde(rename = "Last Name", default)]
    pub last_name: String,
    /// House number, kept as text (`1234`, `1234A`, `1234-36`).
    #[serde(rename = "House Number", default)]
    pub house_number: String,
    /// Street name.
    #[serde(rename = "Street Name", default)]
    pub street_name: String,
    /// Party code, see [`party`].
    #[serde(rename = "Party Code", default)]
    pub party_code: String,
    /// Last vote date as exported (`MM/DD/YYYY`), may be empty.
    #[serde(rename = "Last Vote Date", default)]
    pub last_vote_date: String,
}

impl NeighborRecord {
    /// The parsed last vote date, `None` if empty or malformed.
    #[must_use]
    pub fn last_vote(&self) -> Option<NaiveDate> {
        parse_last_vote_date(&self.last_vote_date)
    }

    /// Full name with empty parts left out.
    #[must_use]
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parses a voter export.
///
/// Rows without a voter id (such as the empty row a trailing newline can
/// produce) and rows that fail to decode are skipped.
///
/// # Errors
///
/// Returns [`NeighborParseError`] if the header row is unreadable or has no
/// `ID Number` column.
pub fn parse_neighbors_csv(text: &str) -> Result<Vec<NeighborRecord>, NeighborParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    if !reader.headers()?.iter().any(|h| h == VOTER_ID_HEADER) {
        return Err(NeighborParseError::MissingColumn {
            name: VOTER_ID_HEADER,
        });
    }

    let mut records = Vec::new();
    let mut skipped = 0_usize;

    for result in reader.deserialize::<NeighborRecord>() {
        match result {
            Ok(record) if !record.voter_id.trim().is_empty() => records.push(record),
            Ok(_) => skipped += 1,
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
            }
        }
    }

    log::debug!(
        "Parsed {} voter records ({skipped} skipped)",
        records.len()
    );

    Ok(records)
}

/// Parses an export date (`MM/DD/YYYY`).
///
/// Returns `None` for empty input, a different layout, or an impossible
/// calendar date.
#[must_use]
pub fn parse_last_vote_date(value: &str) -> Option<NaiveDate> {
    let caps = LAST_VOTE_RE.captures(value.trim())?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
ID Number,First Name,Middle Name,Last Name,House Number,Street Name,Party Code,Last Vote Date,Precinct
015234567-51,JANE,Q,PUBLIC,1234,S 9TH ST,D,11/02/2021,3927
015234568-51,JOHN,,DOE,1236,S 9TH ST,R,,3927
,,,,,,,,
";

    #[test]
    fn parses_export_and_skips_blank_ids() {
        let records = parse_neighbors_csv(EXPORT).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].voter_id, "015234567-51");
        assert_eq!(records[0].street_name, "S 9TH ST");
        assert_eq!(records[1].last_vote_date, "");
        assert_eq!(records[1].party_code, "R");
    }

    #[test]
    fn missing_columns_are_empty() {
        let records = parse_neighbors_csv("ID Number,Last Name\n42,SMITH\n").unwrap();
        assert_eq!(records[0].last_name, "SMITH");
        assert_eq!(records[0].party_code, "");
        assert!(records[0].last_vote().is_none());
    }

    #[test]
    fn requires_voter_id_column() {
        assert!(matches!(
            parse_neighbors_csv("Name,Party\nJANE,D\n"),
            Err(NeighborParseError::MissingColumn { .. })
        ));
        assert!(parse_neighbors_csv("").is_err());
    }

    #[test]
    fn parses_export_dates() {
        assert_eq!(
            parse_last_vote_date("03/07/2022"),
            NaiveDate::from_ymd_opt(2022, 3, 7)
        );
        assert_eq!(parse_last_vote_date(""), None);
        assert_eq!(parse_last_vote_date("2022-03-07"), None);
        assert_eq!(parse_last_vote_date("3/7/2022"), None);
        assert_eq!(parse_last_vote_date("13/40/2022"), None);
    }

    #[test]
    fn full_name_skips_empty_parts() {
        let records = parse_neighbors_csv(EXPORT).unwrap();
        assert_eq!(records[0].full_name(), "JANE Q PUBLIC");
        assert_eq!(records[1].full_name(), "JOHN DOE");
    }
}
