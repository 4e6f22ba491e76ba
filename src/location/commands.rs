use serde::{Deserialize, Serialize};

use crate::App;

use super::{Coordinate, LocationSnapshot};

const UNSUPPORTED_MESSAGE: &str = "Thiết bị không hỗ trợ định vị GPS.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeOutcome {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    pub snapshot: LocationSnapshot,
}

pub async fn get_location_state(app: &App) -> LocationSnapshot {
    app.location.snapshot().await
}

/// Starts the GPS watch. This is also the explicit "re-acquire location"
/// action that revokes a manual override.
pub async fn request_location(app: &App) -> LocationSnapshot {
    app.location.start_watch().await
}

/// GPS position callback from the device, tagged with the watch id the
/// subscription was issued under.
pub async fn report_gps_fix(
    app: &App,
    watch_id: u64,
    lat: f64,
    lng: f64,
    accuracy_m: Option<f64>,
) -> LocationSnapshot {
    app.location
        .report_fix(watch_id, Coordinate { lat, lng }, accuracy_m)
        .await
}

pub async fn report_gps_error(app: &App, watch_id: u64, message: String) -> LocationSnapshot {
    app.location.report_error(watch_id, message).await
}

pub async fn report_geolocation_unsupported(
    app: &App,
    message: Option<String>,
) -> LocationSnapshot {
    app.location
        .capability_denied(message.unwrap_or_else(|| UNSUPPORTED_MESSAGE.to_string()))
        .await
}

/// Manual map tap.
pub async fn set_manual_location(app: &App, lat: f64, lng: f64) -> LocationSnapshot {
    app.location.set_manual(Coordinate { lat, lng }).await
}

/// Geocodes a free-text address and, on success, moves the reconciler into
/// ManualLocated at the result.
pub async fn geocode_address(app: &App, query: String) -> Result<GeocodeOutcome, String> {
    let matched = app
        .geocoder
        .lookup(&query)
        .await
        .map_err(|e| e.to_string())?;
    let snapshot = app.location.apply_geocode(matched.coordinate).await;
    Ok(GeocodeOutcome {
        lat: matched.coordinate.lat,
        lng: matched.coordinate.lng,
        display_name: matched.display_name,
        snapshot,
    })
}

/// Session teardown: releases the GPS subscription.
pub async fn stop_location_watch(app: &App) -> LocationSnapshot {
    app.location.stop_watch().await
}
