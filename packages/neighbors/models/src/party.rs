//! Political party table.
//!
//! The table is compiled in from `parties.toml`.

use std::sync::LazyLock;

use serde::Deserialize;

/// Shown when a party code is not in the table.
pub const UNKNOWN_PARTY: &str = "(unknown party)";

/// A party code and its display name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoliticalParty {
    /// Code used in the voter exports.
    pub code: String,
    /// Display name.
    pub name: String,
}

#[derive(Deserialize)]
struct PartyTable {
    parties: Vec<PoliticalParty>,
}

static PARTIES: LazyLock<Vec<PoliticalParty>> = LazyLock::new(|| {
    toml::de::from_str::<PartyTable>(include_str!("../parties.toml"))
        .unwrap_or_else(|e| panic!("Failed to parse parties.toml: {e}"))
        .parties
});

/// All known parties in table order.
///
/// # Panics
///
/// Panics if the embedded table is malformed.
#[must_use]
pub fn political_parties() -> &'static [PoliticalParty] {
    &PARTIES
}

/// Looks up a party by code.
#[must_use]
pub fn find_party(code: &str) -> Option<&'static PoliticalParty> {
    political_parties().iter().find(|p| p.code == code)
}

/// Display name for a party code, [`UNKNOWN_PARTY`] if the code is empty
/// or not in the table.
#[must_use]
pub fn party_name(code: &str) -> &'static str {
    find_party(code).map_or(UNKNOWN_PARTY, |p| p.name.as_str())
}
