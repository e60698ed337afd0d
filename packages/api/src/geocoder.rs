//! Mapbox forward geocoding client.
//!
//! The address is sent as a single path segment:
//! `{base_url}/{address}.json?access_token={token}`. Only the first feature
//! of the response is used.
//!
//! See <https://docs.mapbox.com/api/search/geocoding-v5/>

use reqwest::Url;
use trail_map_trail_models::LatLng;

use crate::{ApiError, GeocodedLocation};

/// Builds the request URL for `address`.
///
/// The address is percent-encoded as one path segment, so slashes and
/// `#` in unit numbers cannot break the path.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] if `base_url` is not an absolute URL that can
/// carry path segments.
pub fn geocode_url(base_url: &str, address: &str, access_token: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(base_url).map_err(|e| ApiError::Parse {
        message: format!("Invalid geocoder base URL {base_url}: {e}"),
    })?;

    url.path_segments_mut()
        .map_err(|()| ApiError::Parse {
            message: format!("Geocoder base URL {base_url} cannot have a path"),
        })?
        .pop_if_empty()
        .push(&format!("{address}.json"));

    url.query_pairs_mut()
        .append_pair("access_token", access_token);

    Ok(url)
}

/// Geocodes `address` and returns the first match.
///
/// # Errors
///
/// Returns [`ApiError::NoGeocodeMatch`] if the response has no features, or
/// another [`ApiError`] if the HTTP request or response parsing fails.
pub async fn geocode(
    client: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    address: &str,
) -> Result<GeocodedLocation, ApiError> {
    let url = geocode_url(base_url, address, access_token)?;
    log::debug!("Geocoding \"{address}\"");

    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            url: base_url.to_string(),
            status: status.as_u16(),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)?.ok_or_else(|| ApiError::NoGeocodeMatch {
        address: address.to_string(),
    })
}

/// Parses a Mapbox `FeatureCollection` response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedLocation>, ApiError> {
    let features = body["features"]
        .as_array()
        .ok_or_else(|| ApiError::Parse {
            message: "Geocoder response has no features array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    // `center` is always present on Mapbox features; fall back to a point
    // geometry for compatible servers that omit it.
    let coords = first["center"]
        .as_array()
        .or_else(|| first["geometry"]["coordinates"].as_array())
        .ok_or_else(|| ApiError::Parse {
            message: "Missing center in geocoder feature".to_string(),
        })?;

    let position: Vec<f64> = coords.iter().filter_map(serde_json::Value::as_f64).collect();
    let location = LatLng::from_position(&position).ok_or_else(|| ApiError::Parse {
        message: format!("Invalid coordinates in geocoder feature: {coords:?}"),
    })?;

    Ok(Some(GeocodedLocation {
        location,
        matched_address: first["place_name"].as_str().map(String::from),
    }))
}
