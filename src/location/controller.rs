use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::events::{AppEvent, EventBus};

use super::state::{Coordinate, LocationEvent, LocationPhase, LocationState, Transition};

/// Bounded wait for the first fix after a watch starts; past this the
/// reconciler records a timeout error but leaves the subscription alive.
const FIRST_FIX_TIMEOUT: Duration = Duration::from_secs(15);

const GPS_TIMEOUT_MESSAGE: &str = "Không thể truy cập GPS. Kiểm tra quyền vị trí.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    pub state: LocationState,
    pub manual_override_active: bool,
}

/// The at-most-one GPS subscription. Cancelling the token retires the
/// first-fix watchdog; a new watch id makes late callbacks unmatchable.
struct WatchGuard {
    watch_id: u64,
    cancel_token: CancellationToken,
    watchdog: JoinHandle<()>,
}

impl WatchGuard {
    fn release(self) {
        self.cancel_token.cancel();
        self.watchdog.abort();
    }
}

/// Owns the single authoritative location for a client session and mediates
/// between the continuous GPS watch, manual map picks, and geocode results.
///
/// Lock order is always `watch` before `state`.
#[derive(Clone)]
pub struct LocationController {
    state: Arc<Mutex<LocationState>>,
    events: EventBus,
    watch: Arc<Mutex<Option<WatchGuard>>>,
    next_watch_id: Arc<AtomicU64>,
    first_fix_timeout: Duration,
}

impl LocationController {
    pub fn new(events: EventBus) -> Self {
        Self::with_first_fix_timeout(events, FIRST_FIX_TIMEOUT)
    }

    pub fn with_first_fix_timeout(events: EventBus, first_fix_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(LocationState::new())),
            events,
            watch: Arc::new(Mutex::new(None)),
            next_watch_id: Arc::new(AtomicU64::new(0)),
            first_fix_timeout,
        }
    }

    pub async fn snapshot(&self) -> LocationSnapshot {
        let guard = self.state.lock().await;
        LocationSnapshot {
            manual_override_active: guard.manual_override_active(),
            state: guard.clone(),
        }
    }

    /// Starts the GPS subscription, or re-acquires it after a manual
    /// override (which clears the override). A no-op while a watch is
    /// already live.
    pub async fn start_watch(&self) -> LocationSnapshot {
        let mut watch = self.watch.lock().await;

        {
            let state = self.state.lock().await;
            if watch.is_some() && state.phase == LocationPhase::Watching {
                return LocationSnapshot {
                    manual_override_active: state.manual_override_active(),
                    state: state.clone(),
                };
            }
        }

        // A guard can linger after CapabilityDenied left us Unlocated.
        if let Some(old) = watch.take() {
            old.release();
        }

        let watch_id = self.next_watch_id.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            state.apply(LocationEvent::WatchStarted { watch_id });
        }

        let cancel_token = CancellationToken::new();
        let watchdog = tokio::spawn(first_fix_watchdog(
            self.state.clone(),
            self.events.clone(),
            cancel_token.clone(),
            watch_id,
            self.first_fix_timeout,
        ));
        *watch = Some(WatchGuard {
            watch_id,
            cancel_token,
            watchdog,
        });
        drop(watch);

        info!("GPS watch {watch_id} started");
        self.snapshot().await
    }

    /// Feeds a GPS position callback into the reconciler. Fixes from a
    /// cancelled watch or under an active manual override are discarded.
    pub async fn report_fix(
        &self,
        watch_id: u64,
        coordinate: Coordinate,
        accuracy_m: Option<f64>,
    ) -> LocationSnapshot {
        // Accuracy is kept in whole meters from capture onward.
        let accuracy_m = accuracy_m.map(f64::round);
        let transition = {
            let mut state = self.state.lock().await;
            state.apply(LocationEvent::GpsFix {
                watch_id,
                coordinate,
                accuracy_m,
                captured_at: Utc::now(),
            })
        };

        match transition {
            Transition::Updated => {
                // First accepted fix retires the first-fix watchdog.
                let watch = self.watch.lock().await;
                if let Some(guard) = watch.as_ref() {
                    if guard.watch_id == watch_id {
                        guard.cancel_token.cancel();
                    }
                }
                drop(watch);
                self.emit_location_changed().await;
            }
            Transition::Discarded => {
                debug!("discarded GPS fix from watch {watch_id}");
            }
            _ => {}
        }

        self.snapshot().await
    }

    /// Records a mid-watch read failure. The subscription stays alive;
    /// a later fix clears the reason.
    pub async fn report_error(&self, watch_id: u64, message: String) -> LocationSnapshot {
        let transition = {
            let mut state = self.state.lock().await;
            state.apply(LocationEvent::GpsError {
                watch_id,
                message: message.clone(),
            })
        };
        if transition == Transition::ErrorRecorded {
            warn!("GPS watch {watch_id} error: {message}");
            self.events.emit(AppEvent::LocationError { message });
        }
        self.snapshot().await
    }

    /// The device lacks or denies geolocation. Reported once; manual and
    /// geocode paths remain usable and there is no automatic retry.
    pub async fn capability_denied(&self, message: String) -> LocationSnapshot {
        if let Some(guard) = self.watch.lock().await.take() {
            guard.release();
        }
        {
            let mut state = self.state.lock().await;
            state.apply(LocationEvent::CapabilityDenied {
                message: message.clone(),
            });
        }
        warn!("geolocation unavailable: {message}");
        self.events.emit(AppEvent::LocationError { message });
        self.snapshot().await
    }

    /// Map tap: enters ManualLocated and cancels the GPS subscription.
    pub async fn set_manual(&self, coordinate: Coordinate) -> LocationSnapshot {
        self.enter_manual(LocationEvent::ManualPick {
            coordinate,
            at: Utc::now(),
        })
        .await
    }

    /// Accepted geocode result: same arbitration as a map tap.
    pub async fn apply_geocode(&self, coordinate: Coordinate) -> LocationSnapshot {
        self.enter_manual(LocationEvent::GeocodeResult {
            coordinate,
            at: Utc::now(),
        })
        .await
    }

    /// Session teardown: releases the subscription, keeps the coordinate.
    pub async fn stop_watch(&self) -> LocationSnapshot {
        if let Some(guard) = self.watch.lock().await.take() {
            info!("GPS watch {} stopped", guard.watch_id);
            guard.release();
        }
        {
            let mut state = self.state.lock().await;
            state.apply(LocationEvent::WatchStopped);
        }
        self.snapshot().await
    }

    async fn enter_manual(&self, event: LocationEvent) -> LocationSnapshot {
        if let Some(guard) = self.watch.lock().await.take() {
            guard.release();
        }
        {
            let mut state = self.state.lock().await;
            state.apply(event);
        }
        self.emit_location_changed().await;
        self.snapshot().await
    }

    async fn emit_location_changed(&self) {
        let snapshot = self.snapshot().await;
        self.events.emit(AppEvent::LocationChanged { snapshot });
    }
}

/// Reports a timeout if no fix has been accepted within the bounded wait.
/// Cancelled by the first accepted fix or by watch teardown.
async fn first_fix_watchdog(
    state: Arc<Mutex<LocationState>>,
    events: EventBus,
    cancel_token: CancellationToken,
    watch_id: u64,
    timeout: Duration,
) {
    tokio::select! {
        _ = cancel_token.cancelled() => {}
        _ = time::sleep(timeout) => {
            let transition = {
                let mut guard = state.lock().await;
                guard.apply(LocationEvent::GpsError {
                    watch_id,
                    message: GPS_TIMEOUT_MESSAGE.to_string(),
                })
            };
            if transition == Transition::ErrorRecorded {
                warn!("GPS watch {watch_id} timed out waiting for the first fix");
                events.emit(AppEvent::LocationError {
                    message: GPS_TIMEOUT_MESSAGE.to_string(),
                });
            }
        }
    }
}
