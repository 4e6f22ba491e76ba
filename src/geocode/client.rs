use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use crate::location::Coordinate;
use crate::settings::GeocoderSettings;

use super::GeocodeError;

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinate: Coordinate,
    pub display_name: String,
}

#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    endpoint: String,
}

impl Geocoder {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Upstream(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// Issues exactly one upstream lookup requesting at most one result.
    pub async fn lookup(&self, query: &str) -> Result<GeocodeMatch, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "0"),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("geocode request failed: {e}");
                GeocodeError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!("geocode upstream returned HTTP {}", response.status());
            return Err(GeocodeError::Upstream(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Upstream(format!("invalid response: {e}")))?;

        let matched = first_match(results)?;
        info!("geocoded '{query}' to {}", matched.display_name);
        Ok(matched)
    }
}

fn first_match(results: Vec<NominatimResult>) -> Result<GeocodeMatch, GeocodeError> {
    let row = results.into_iter().next().ok_or(GeocodeError::NoMatch)?;

    let lat = row
        .lat
        .parse::<f64>()
        .map_err(|_| GeocodeError::Upstream(format!("invalid lat '{}'", row.lat)))?;
    let lng = row
        .lon
        .parse::<f64>()
        .map_err(|_| GeocodeError::Upstream(format!("invalid lon '{}'", row.lon)))?;

    Ok(GeocodeMatch {
        coordinate: Coordinate { lat, lng },
        display_name: row.display_name,
    })
}
