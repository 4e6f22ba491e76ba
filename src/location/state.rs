use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LocationSource {
    Gps,
    Manual,
    Geocode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReading {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub captured_at: DateTime<Utc>,
    pub source: LocationSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LocationPhase {
    /// No coordinate known and no subscription active.
    Unlocated,
    /// A continuous GPS subscription is live; fixes overwrite the coordinate.
    Watching,
    /// The user placed the location by map tap or geocode; GPS is suppressed
    /// until explicitly re-acquired.
    ManualLocated,
}

impl Default for LocationPhase {
    fn default() -> Self {
        LocationPhase::Unlocated
    }
}

/// Inputs to the reconciler. GPS events carry the watch id they were issued
/// under so updates from a cancelled subscription can never write, even when
/// they race the cancellation.
#[derive(Debug, Clone)]
pub enum LocationEvent {
    WatchStarted {
        watch_id: u64,
    },
    GpsFix {
        watch_id: u64,
        coordinate: Coordinate,
        accuracy_m: Option<f64>,
        captured_at: DateTime<Utc>,
    },
    GpsError {
        watch_id: u64,
        message: String,
    },
    CapabilityDenied {
        message: String,
    },
    ManualPick {
        coordinate: Coordinate,
        at: DateTime<Utc>,
    },
    GeocodeResult {
        coordinate: Coordinate,
        at: DateTime<Utc>,
    },
    WatchStopped,
}

/// What a transition did, so callers know whether to notify collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The authoritative coordinate changed.
    Updated,
    /// An error reason was recorded; the coordinate is untouched.
    ErrorRecorded,
    /// The event lost arbitration and left the state untouched.
    Discarded,
    /// Bookkeeping only.
    Unchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    pub phase: LocationPhase,
    pub coordinate: Option<Coordinate>,
    pub accuracy_m: Option<f64>,
    pub captured_at: Option<DateTime<Utc>>,
    pub source: Option<LocationSource>,
    pub last_error: Option<String>,
    #[serde(skip)]
    pub watch_id: Option<u64>,
}

impl Default for LocationState {
    fn default() -> Self {
        Self {
            phase: LocationPhase::Unlocated,
            coordinate: None,
            accuracy_m: None,
            captured_at: None,
            source: None,
            last_error: None,
            watch_id: None,
        }
    }
}

impl LocationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manual_override_active(&self) -> bool {
        self.phase == LocationPhase::ManualLocated
    }

    pub fn reading(&self) -> Option<LocationReading> {
        Some(LocationReading {
            coordinate: self.coordinate?,
            accuracy_m: self.accuracy_m,
            captured_at: self.captured_at?,
            source: self.source?,
        })
    }

    /// The single transition function. Manual intent wins until revoked:
    /// while `ManualLocated`, GPS events must not touch coordinate, accuracy
    /// or timestamp.
    pub fn apply(&mut self, event: LocationEvent) -> Transition {
        match event {
            LocationEvent::WatchStarted { watch_id } => {
                // Also the explicit "re-acquire" path out of ManualLocated.
                self.phase = LocationPhase::Watching;
                self.watch_id = Some(watch_id);
                self.last_error = None;
                Transition::Unchanged
            }
            LocationEvent::GpsFix {
                watch_id,
                coordinate,
                accuracy_m,
                captured_at,
            } => {
                if self.phase != LocationPhase::Watching || self.watch_id != Some(watch_id) {
                    return Transition::Discarded;
                }
                self.coordinate = Some(coordinate);
                self.accuracy_m = accuracy_m;
                self.captured_at = Some(captured_at);
                self.source = Some(LocationSource::Gps);
                self.last_error = None;
                Transition::Updated
            }
            LocationEvent::GpsError { watch_id, message } => {
                if self.phase != LocationPhase::Watching || self.watch_id != Some(watch_id) {
                    return Transition::Discarded;
                }
                // A failed read does not tear the subscription down; a later
                // fix clears the reason.
                self.last_error = Some(message);
                Transition::ErrorRecorded
            }
            LocationEvent::CapabilityDenied { message } => {
                if self.phase == LocationPhase::Watching {
                    self.phase = LocationPhase::Unlocated;
                }
                self.watch_id = None;
                self.last_error = Some(message);
                Transition::ErrorRecorded
            }
            LocationEvent::ManualPick { coordinate, at } => {
                self.enter_manual(coordinate, at, LocationSource::Manual)
            }
            LocationEvent::GeocodeResult { coordinate, at } => {
                self.enter_manual(coordinate, at, LocationSource::Geocode)
            }
            LocationEvent::WatchStopped => {
                self.watch_id = None;
                if self.phase == LocationPhase::Watching {
                    self.phase = LocationPhase::Unlocated;
                }
                Transition::Unchanged
            }
        }
    }

    fn enter_manual(
        &mut self,
        coordinate: Coordinate,
        at: DateTime<Utc>,
        source: LocationSource,
    ) -> Transition {
        self.phase = LocationPhase::ManualLocated;
        self.watch_id = None;
        self.coordinate = Some(coordinate);
        // Manual sources carry no accuracy estimate.
        self.accuracy_m = None;
        self.captured_at = Some(at);
        self.source = Some(source);
        self.last_error = None;
        Transition::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    fn fix(watch_id: u64, lat: f64, lng: f64, accuracy_m: Option<f64>) -> LocationEvent {
        LocationEvent::GpsFix {
            watch_id,
            coordinate: coord(lat, lng),
            accuracy_m,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn gps_fixes_overwrite_while_watching() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });

        assert_eq!(state.apply(fix(1, 16.0, 108.0, Some(25.0))), Transition::Updated);
        assert_eq!(state.apply(fix(1, 16.1, 108.1, Some(8.0))), Transition::Updated);

        assert_eq!(state.phase, LocationPhase::Watching);
        assert_eq!(state.coordinate, Some(coord(16.1, 108.1)));
        assert_eq!(state.accuracy_m, Some(8.0));
        assert_eq!(state.source, Some(LocationSource::Gps));
    }

    #[test]
    fn manual_override_wins_over_later_gps() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });
        state.apply(fix(1, 16.0, 108.0, Some(25.0)));

        let picked = coord(16.5, 108.5);
        let at = Utc::now();
        assert_eq!(
            state.apply(LocationEvent::ManualPick { coordinate: picked, at }),
            Transition::Updated
        );
        assert!(state.manual_override_active());
        assert_eq!(state.coordinate, Some(picked));
        // Manual entry clears the accuracy estimate.
        assert_eq!(state.accuracy_m, None);
        assert_eq!(state.captured_at, Some(at));

        // A racing fix from the still-live subscription must be discarded
        // wholesale: no coordinate, accuracy, or timestamp change.
        assert_eq!(state.apply(fix(1, 17.0, 109.0, Some(3.0))), Transition::Discarded);
        assert_eq!(state.coordinate, Some(picked));
        assert_eq!(state.accuracy_m, None);
        assert_eq!(state.captured_at, Some(at));
    }

    #[test]
    fn reacquire_clears_override_and_accepts_next_fix() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });
        state.apply(LocationEvent::ManualPick {
            coordinate: coord(16.5, 108.5),
            at: Utc::now(),
        });

        state.apply(LocationEvent::WatchStarted { watch_id: 2 });
        assert!(!state.manual_override_active());
        assert_eq!(state.phase, LocationPhase::Watching);

        assert_eq!(state.apply(fix(2, 16.2, 108.2, Some(12.0))), Transition::Updated);
        assert_eq!(state.coordinate, Some(coord(16.2, 108.2)));
        assert_eq!(state.source, Some(LocationSource::Gps));
    }

    #[test]
    fn stale_watch_id_is_discarded() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });
        state.apply(LocationEvent::WatchStarted { watch_id: 2 });

        assert_eq!(state.apply(fix(1, 15.0, 107.0, None)), Transition::Discarded);
        assert_eq!(state.coordinate, None);
        assert_eq!(state.apply(fix(2, 16.0, 108.0, None)), Transition::Updated);
    }

    #[test]
    fn gps_error_keeps_the_watch_alive() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });

        assert_eq!(
            state.apply(LocationEvent::GpsError {
                watch_id: 1,
                message: "timeout".into(),
            }),
            Transition::ErrorRecorded
        );
        assert_eq!(state.phase, LocationPhase::Watching);
        assert_eq!(state.last_error.as_deref(), Some("timeout"));

        // Subsequent updates still arrive and clear the error.
        assert_eq!(state.apply(fix(1, 16.0, 108.0, Some(30.0))), Transition::Updated);
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn gps_error_is_discarded_while_manual_override_active() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::ManualPick {
            coordinate: coord(16.5, 108.5),
            at: Utc::now(),
        });

        assert_eq!(
            state.apply(LocationEvent::GpsError {
                watch_id: 1,
                message: "timeout".into(),
            }),
            Transition::Discarded
        );
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn capability_denied_records_reason_and_stays_unlocated() {
        let mut state = LocationState::new();
        assert_eq!(
            state.apply(LocationEvent::CapabilityDenied {
                message: "Thiết bị không hỗ trợ định vị GPS.".into(),
            }),
            Transition::ErrorRecorded
        );
        assert_eq!(state.phase, LocationPhase::Unlocated);
        assert!(state.last_error.is_some());
        assert_eq!(state.coordinate, None);
    }

    #[test]
    fn capability_denied_does_not_evict_a_manual_location() {
        let mut state = LocationState::new();
        let picked = coord(16.5, 108.5);
        state.apply(LocationEvent::ManualPick {
            coordinate: picked,
            at: Utc::now(),
        });

        state.apply(LocationEvent::CapabilityDenied {
            message: "denied".into(),
        });
        assert!(state.manual_override_active());
        assert_eq!(state.coordinate, Some(picked));
    }

    #[test]
    fn geocode_result_enters_manual_located() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });
        state.apply(fix(1, 16.0, 108.0, Some(20.0)));

        state.apply(LocationEvent::GeocodeResult {
            coordinate: coord(16.07, 108.22),
            at: Utc::now(),
        });
        assert!(state.manual_override_active());
        assert_eq!(state.source, Some(LocationSource::Geocode));
        assert_eq!(state.accuracy_m, None);
    }

    #[test]
    fn stopping_the_watch_keeps_the_last_coordinate() {
        let mut state = LocationState::new();
        state.apply(LocationEvent::WatchStarted { watch_id: 1 });
        state.apply(fix(1, 16.0, 108.0, Some(20.0)));

        state.apply(LocationEvent::WatchStopped);
        assert_eq!(state.phase, LocationPhase::Unlocated);
        assert_eq!(state.watch_id, None);
        assert_eq!(state.coordinate, Some(coord(16.0, 108.0)));
    }
}
