//! `reqwest` implementation of the service traits.

use std::time::Duration;

use trail_map_config::{AppConfig, NeighborsConfig};
use trail_map_trail_models::{
    IssueReport, TrailFeature, parse_issue_collection, parse_trail_collection,
};

use crate::{
    ApiError, GeocodedLocation, Geocoder, IssueStore, PrecinctSource, TrailSource, geocoder,
};

const USER_AGENT: &str = concat!("trail_map/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for every remote service, configured from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct TrailMapClient {
    http: reqwest::Client,
    issues_url: String,
    trails_url: String,
    trail_id_property: String,
    trail_label_property: String,
    neighbors: NeighborsConfig,
    geocoder_base_url: String,
    geocoder_token: String,
}

impl TrailMapClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_http(http, config))
    }

    /// Creates a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            issues_url: config.api.trail_issues_url(),
            trails_url: config.trails.url.clone(),
            trail_id_property: config.trails.id_property.clone(),
            trail_label_property: config.trails.label_property.clone(),
            neighbors: config.neighbors.clone(),
            geocoder_base_url: config.geocoder.base_url.clone(),
            geocoder_token: config.geocoder.access_token.clone(),
        }
    }

    /// URL of the issue collection endpoint.
    #[must_use]
    pub fn issues_url(&self) -> &str {
        &self.issues_url
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        let resp = self.http.get(url).send().await?;
        let resp = check_status(resp, url)?;
        Ok(resp.json().await?)
    }
}

fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

impl IssueStore for TrailMapClient {
    async fn list_issues(&self) -> Result<Vec<IssueReport>, ApiError> {
        log::info!("Fetching trail issues from {}", self.issues_url);
        let body = self.get_json(&self.issues_url).await?;
        let issues = parse_issue_collection(body)?;
        log::info!("Loaded {} trail issues", issues.len());
        Ok(issues)
    }

    async fn create_issue(&self, report: &IssueReport) -> Result<IssueReport, ApiError> {
        let body = report.to_json()?;
        log::info!(
            "Submitting {} issue on {} at {}",
            report.properties.category,
            report.trail(),
            report.location
        );

        let resp = self.http.post(&self.issues_url).json(&body).send().await?;
        let resp = check_status(resp, &self.issues_url)?;
        let echoed: serde_json::Value = resp.json().await?;
        let stored = IssueReport::from_json(echoed)?;

        log::debug!("Issue stored with id {:?}", stored.id);
        Ok(stored)
    }
}

impl TrailSource for TrailMapClient {
    async fn fetch_trails(&self) -> Result<Vec<TrailFeature>, ApiError> {
        log::info!("Fetching trails from {}", self.trails_url);
        let body = self.get_json(&self.trails_url).await?;
        let trails = parse_trail_collection(
            body,
            &self.trail_id_property,
            &self.trail_label_property,
        )?;
        log::info!("Loaded {} trails", trails.len());
        Ok(trails)
    }
}

impl PrecinctSource for TrailMapClient {
    async fn fetch_precinct_csv(&self, precinct: &str) -> Result<String, ApiError> {
        let url = self.neighbors.precinct_csv_url(precinct);
        log::info!("Fetching voter export for precinct {precinct}");

        let resp = self.http.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::PrecinctNotFound {
                precinct: precinct.to_string(),
            });
        }
        let resp = check_status(resp, &url)?;
        Ok(resp.text().await?)
    }
}

impl Geocoder for TrailMapClient {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, ApiError> {
        geocoder::geocode(
            &self.http,
            &self.geocoder_base_url,
            &self.geocoder_token,
            address,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_config() {
        let mut config = AppConfig::defaults();
        config.api.host = "https://issues.example/".to_string();
        let client = TrailMapClient::with_http(reqwest::Client::new(), &config);
        assert_eq!(client.issues_url(), "https://issues.example/trail_issues/");
        assert_eq!(client.trail_id_property, "OBJECTID");
    }

    #[tokio::test]
    async fn unreachable_precinct_server_is_an_http_error() {
        let mut config = AppConfig::defaults();
        config.neighbors.precinct_url = "http://127.0.0.1:9/precinct{precinct}.csv".to_string();
        let client = TrailMapClient::new(&config).unwrap();
        let err = client.fetch_precinct_csv("3927").await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }
}
