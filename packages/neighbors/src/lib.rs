#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighbor panel.
//!
//! Loads the registered voters of one precinct, lists those passing the
//! current [`NeighborFilter`], and shows a map marker for a chosen voter.
//! Geocoded locations are cached per voter id for the lifetime of the
//! panel; voter ids are unique across precincts, so switching precincts
//! keeps the cache.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;
use trail_map_api::{ApiError, Geocoder, PrecinctSource};
use trail_map_config::NeighborsConfig;
use trail_map_map::{MapView, Prompt};
use trail_map_neighbors_models::{
    Locality, NeighborFilter, NeighborListItem, NeighborParseError, NeighborRecord,
    parse_neighbors_csv,
};
use trail_map_trail_models::LatLng;

/// Errors from neighbor panel operations.
#[derive(Debug, Error)]
pub enum NeighborError {
    /// No voter export exists for the precinct.
    #[error("No precinct \"{precinct}\" is available")]
    PrecinctNotFound {
        /// The requested precinct.
        precinct: String,
    },

    /// The voter id is not in the loaded precinct.
    #[error("Voter {voter_id} is not in the loaded precinct")]
    UnknownVoter {
        /// The requested voter id.
        voter_id: String,
    },

    /// Fetching or geocoding failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The voter export could not be parsed.
    #[error(transparent)]
    Parse(#[from] NeighborParseError),
}

/// Alert shown when a precinct has no export.
#[must_use]
pub fn precinct_unavailable_message(precinct: &str) -> String {
    format!("No precinct \"{precinct}\" is available.")
}

/// State of the neighbor panel.
#[derive(Debug)]
pub struct NeighborPanel {
    locality: Locality,
    precinct: Option<String>,
    records: Vec<NeighborRecord>,
    items: BTreeMap<String, NeighborListItem>,
    filter: NeighborFilter,
    visible: Vec<String>,
    markers: BTreeMap<String, LatLng>,
}

impl NeighborPanel {
    /// Creates an empty panel that builds addresses in `locality`.
    #[must_use]
    pub fn new(locality: Locality) -> Self {
        Self {
            locality,
            precinct: None,
            records: Vec::new(),
            items: BTreeMap::new(),
            filter: NeighborFilter::all(),
            visible: Vec::new(),
            markers: BTreeMap::new(),
        }
    }

    /// Creates an empty panel using the configured city, state and ZIP.
    #[must_use]
    pub fn from_config(config: &NeighborsConfig) -> Self {
        Self::new(Locality {
            city: config.city.clone(),
            state: config.state.clone(),
            zip: config.zip.clone(),
        })
    }

    /// The precinct currently shown.
    #[must_use]
    pub fn precinct(&self) -> Option<&str> {
        self.precinct.as_deref()
    }

    /// The current filter.
    #[must_use]
    pub const fn filter(&self) -> &NeighborFilter {
        &self.filter
    }

    /// List entry for a voter of the loaded precinct.
    #[must_use]
    pub fn item(&self, voter_id: &str) -> Option<&NeighborListItem> {
        self.items.get(voter_id)
    }

    /// Entries passing the filter, in export order.
    #[must_use]
    pub fn visible(&self) -> Vec<&NeighborListItem> {
        self.visible
            .iter()
            .filter_map(|id| self.items.get(id))
            .collect()
    }

    /// Number of entries passing the filter.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.visible.len()
    }

    /// Cached location for a voter, if it was geocoded before.
    #[must_use]
    pub fn cached_location(&self, voter_id: &str) -> Option<LatLng> {
        self.markers.get(voter_id).copied()
    }

    /// Loads a precinct's voters and shows them through the current
    /// filter. Returns the number of visible entries.
    ///
    /// If the precinct has no export, the user is alerted and the panel
    /// keeps showing what it showed before.
    ///
    /// # Errors
    ///
    /// * [`NeighborError::PrecinctNotFound`] if there is no export
    /// * [`NeighborError::Api`] if the fetch fails otherwise
    /// * [`NeighborError::Parse`] if the export is not a voter CSV
    pub async fn show_precinct<S, M, P>(
        &mut self,
        precinct: &str,
        source: &S,
        map: &mut M,
        prompt: &P,
    ) -> Result<usize, NeighborError>
    where
        S: PrecinctSource + ?Sized,
        M: MapView + ?Sized,
        P: Prompt + ?Sized,
    {
        let precinct = precinct.trim();

        let text = match source.fetch_precinct_csv(precinct).await {
            Ok(text) => text,
            Err(ApiError::PrecinctNotFound { precinct }) => {
                log::warn!("No voter export for precinct {precinct}");
                prompt.alert(&precinct_unavailable_message(&precinct));
                return Err(NeighborError::PrecinctNotFound { precinct });
            }
            Err(e) => {
                log::error!("Failed to fetch precinct {precinct}: {e}");
                return Err(e.into());
            }
        };

        let records = parse_neighbors_csv(&text)?;

        self.items = records
            .iter()
            .map(|record| {
                (
                    record.voter_id.clone(),
                    NeighborListItem::new(record, &self.locality),
                )
            })
            .collect();
        self.records = records;
        self.precinct = Some(precinct.to_string());
        map.clear_neighbor_markers();
        self.refilter();

        log::info!(
            "Precinct {precinct}: {} voters, {} shown",
            self.records.len(),
            self.count()
        );

        Ok(self.count())
    }

    /// Replaces the whole filter and re-filters the loaded records.
    pub fn set_filter(&mut self, filter: NeighborFilter) -> usize {
        self.filter = filter;
        self.refilter();
        self.count()
    }

    /// Sets or clears the last-vote recency criterion.
    pub fn set_recency(&mut self, recency: Option<NaiveDate>) -> usize {
        self.filter.recency = recency;
        self.refilter();
        self.count()
    }

    /// Sets or clears the party criterion. An empty code clears it.
    pub fn set_party(&mut self, party: Option<&str>) -> usize {
        self.filter.party = party
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(String::from);
        self.refilter();
        self.count()
    }

    /// Shows the marker for a voter and pans the map to it.
    ///
    /// The address is geocoded once per voter; later selections reuse the
    /// cached location. A failed lookup leaves the map untouched.
    ///
    /// # Errors
    ///
    /// * [`NeighborError::UnknownVoter`] if the voter is not loaded
    /// * [`NeighborError::Api`] if geocoding fails
    pub async fn select_neighbor<G, M>(
        &mut self,
        voter_id: &str,
        geocoder: &G,
        map: &mut M,
    ) -> Result<LatLng, NeighborError>
    where
        G: Geocoder + ?Sized,
        M: MapView + ?Sized,
    {
        let item = self
            .items
            .get(voter_id)
            .ok_or_else(|| NeighborError::UnknownVoter {
                voter_id: voter_id.to_string(),
            })?;

        let location = if let Some(cached) = self.markers.get(voter_id) {
            log::debug!("Using cached location for voter {voter_id}");
            *cached
        } else {
            let geocoded = geocoder
                .geocode(&item.address)
                .await
                .inspect_err(|e| log::error!("Failed to geocode \"{}\": {e}", item.address))?;
            log::debug!(
                "Geocoded \"{}\" to {} ({})",
                item.address,
                geocoded.location,
                geocoded.matched_address.as_deref().unwrap_or("no match name")
            );
            self.markers.insert(voter_id.to_string(), geocoded.location);
            geocoded.location
        };

        map.show_neighbor_marker(location);
        map.pan_to(location);

        Ok(location)
    }

    fn refilter(&mut self) {
        self.visible = self
            .filter
            .apply(&self.records)
            .map(|record| record.voter_id.clone())
            .collect();
    }
}
