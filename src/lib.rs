pub mod db;
pub mod events;
pub mod geocode;
pub mod location;
pub mod requests;
pub mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::broadcast;

use db::Database;
use events::{AppEvent, EventBus};
use geocode::Geocoder;
use location::LocationController;
use settings::SettingsStore;

/// One running instance: the request store, the location reconciler, the
/// geocode client, and the event bus the command layer emits on.
pub struct App {
    pub db: Database,
    pub location: LocationController,
    pub geocoder: Geocoder,
    pub settings: SettingsStore,
    pub(crate) events: EventBus,
}

impl App {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let db = Database::new(data_dir.join("flood-rescue.sqlite3"))?;
        let geocoder = Geocoder::new(&settings.geocoder())?;
        let events = EventBus::new(64);
        let location = LocationController::new(events.clone());

        info!("Flood rescue app ready, data dir {}", data_dir.display());

        Ok(Self {
            db,
            location,
            geocoder,
            settings,
            events,
        })
    }

    /// UI collaborators subscribe here for location and request events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    /// Session teardown: releases the GPS subscription. The database worker
    /// shuts down when the last handle drops.
    pub async fn shutdown(&self) {
        self.location.stop_watch().await;
    }
}
