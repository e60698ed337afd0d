#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Clients for the remote services the trail map talks to.
//!
//! | Service | Trait | Request |
//! |---|---|---|
//! | Issue API | [`IssueStore`] | `GET`/`POST {host}/trail_issues/` |
//! | Trail dataset | [`TrailSource`] | `GET` of a `GeoJSON` `FeatureCollection` |
//! | Voter exports | [`PrecinctSource`] | `GET` of a per-precinct CSV |
//! | Geocoder | [`Geocoder`] | `GET {base}/{address}.json?access_token=...` |
//!
//! [`TrailMapClient`] implements all four over `reqwest`. Consumers take the
//! traits so they can run against in-memory fakes.
//!
//! Requests are sent once: there is no retry, caching, or deduplication at
//! this layer.

pub mod client;
pub mod geocoder;

use std::future::Future;

use thiserror::Error;
use trail_map_trail_models::{IssueReport, LatLng, ModelError, TrailFeature};

pub use client::TrailMapClient;

/// Errors from remote service calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// No voter export exists for the precinct.
    #[error("No data file for precinct \"{precinct}\"")]
    PrecinctNotFound {
        /// The requested precinct.
        precinct: String,
    },

    /// The geocoder returned no features for the address.
    #[error("No geocoding match for \"{address}\"")]
    NoGeocodeMatch {
        /// The address that was looked up.
        address: String,
    },

    /// Response body did not have the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` conversion failed.
    #[error("GeoJSON error: {0}")]
    Model(#[from] ModelError),
}

/// A geocoded address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    /// Coordinates of the best match.
    pub location: LatLng,
    /// Canonical address of the match, if the geocoder returned one.
    pub matched_address: Option<String>,
}

/// Reads and writes trail issue reports.
pub trait IssueStore: Send + Sync {
    /// Fetches all reported issues.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or parsing fails.
    fn list_issues(&self) -> impl Future<Output = Result<Vec<IssueReport>, ApiError>> + Send;

    /// Persists a new issue and returns the stored record as echoed by the
    /// server.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails, the server rejects the
    /// report, or the echo cannot be parsed.
    fn create_issue(
        &self,
        report: &IssueReport,
    ) -> impl Future<Output = Result<IssueReport, ApiError>> + Send;
}

/// Provides trail geometry.
pub trait TrailSource: Send + Sync {
    /// Fetches every trail in the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or parsing fails.
    fn fetch_trails(&self) -> impl Future<Output = Result<Vec<TrailFeature>, ApiError>> + Send;
}

/// Provides per-precinct voter exports.
pub trait PrecinctSource: Send + Sync {
    /// Fetches the raw CSV text for a precinct.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PrecinctNotFound`] if no export exists for the
    /// precinct, or another [`ApiError`] if the request fails.
    fn fetch_precinct_csv(
        &self,
        precinct: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// Forward geocoding of street addresses.
pub trait Geocoder: Send + Sync {
    /// Resolves an address to coordinates using the first match.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoGeocodeMatch`] if nothing matched, or another
    /// [`ApiError`] if the request fails.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<GeocodedLocation, ApiError>> + Send;
}
