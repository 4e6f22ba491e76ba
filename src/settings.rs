use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::location::Coordinate;

pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_GEOCODER_USER_AGENT: &str = "FloodRescueApp/1.0 (contact: example@example.com)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderSettings {
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_ENDPOINT.into(),
            user_agent: std::env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSettings {
    /// Where the map renderer centers before any location is known.
    pub fallback_center: Coordinate,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            // Đà Nẵng city center.
            fallback_center: Coordinate {
                lat: 16.047079,
                lng: 108.20623,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct UserSettings {
    geocoder: GeocoderSettings,
    map: MapSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn geocoder(&self) -> GeocoderSettings {
        self.data.read().unwrap().geocoder.clone()
    }

    pub fn map(&self) -> MapSettings {
        self.data.read().unwrap().map.clone()
    }

    pub fn update_geocoder(&self, settings: GeocoderSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.geocoder = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_settings_path() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flood-rescue-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("temp dir");
        dir.join("settings.json")
    }

    #[test]
    fn defaults_apply_when_no_file_exists() {
        let store = SettingsStore::new(temp_settings_path()).expect("store");
        assert_eq!(store.geocoder().endpoint, DEFAULT_GEOCODER_ENDPOINT);
        let center = store.map().fallback_center;
        assert_eq!((center.lat, center.lng), (16.047079, 108.20623));
    }

    #[test]
    fn updated_settings_survive_a_reload() {
        let path = temp_settings_path();
        let store = SettingsStore::new(path.clone()).expect("store");
        store
            .update_geocoder(GeocoderSettings {
                endpoint: "http://localhost:8080/search".into(),
                user_agent: "test-agent".into(),
            })
            .expect("update");

        let reloaded = SettingsStore::new(path).expect("reload");
        assert_eq!(reloaded.geocoder().endpoint, "http://localhost:8080/search");
        assert_eq!(reloaded.geocoder().user_agent, "test-agent");
    }
}
