use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::GeocodingConfig;
use crate::error::ChartError;
use crate::types::Coordinates;

/// Turns a free-text place description into coordinates. One outbound call
/// per invocation; zero matches is an error, not an empty result.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, place: &str) -> Result<Coordinates, ChartError>;
}

/// Geocoder backed by the OpenStreetMap Nominatim search API.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .expect("failed to build HTTP client"),
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, place: &str) -> Result<Coordinates, ChartError> {
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[("q", place), ("format", "json"), ("limit", "1")],
        )
        .map_err(|e| ChartError::UpstreamUnavailable(format!("bad geocoding URL: {e}")))?;

        debug!(%place, "querying geocoding service");
        let resp = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| ChartError::UpstreamUnavailable(format!("geocoding request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChartError::UpstreamUnavailable(format!(
                "geocoding service returned HTTP {status}"
            )));
        }

        let matches: Value = resp.json().await.map_err(|e| {
            ChartError::UpstreamUnavailable(format!("malformed geocoding response: {e}"))
        })?;

        let coords = first_match_coordinates(&matches, place)?;
        info!(
            %place,
            latitude = coords.latitude,
            longitude = coords.longitude,
            "birthplace resolved"
        );
        Ok(coords)
    }
}

/// Pull lat/lon out of the first match. Nominatim serializes both as
/// strings; accept raw numbers too.
fn first_match_coordinates(matches: &Value, place: &str) -> Result<Coordinates, ChartError> {
    let first = matches
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| ChartError::LocationNotFound(place.to_string()))?;

    let latitude = json_coordinate(&first["lat"]).ok_or_else(|| {
        ChartError::UpstreamUnavailable("geocoding match is missing a latitude".to_string())
    })?;
    let longitude = json_coordinate(&first["lon"]).ok_or_else(|| {
        ChartError::UpstreamUnavailable("geocoding match is missing a longitude".to_string())
    })?;

    Ok(Coordinates {
        latitude,
        longitude,
    })
}

fn json_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}
