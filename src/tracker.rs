//! Navigation progress along an ordered stop list.
//!
//! ```text
//! idle -> navigating -> arrived(i) -> (completed | skipped) -> navigating
//!                    -> navigating(i = last) -> finished
//! stop() returns to idle from any state
//! ```
//!
//! `start` does not reopen a finished session. Resuming a partly delivered
//! route means building a new session with [`NavigationSession::resume`].
//!
//! The tracker only detects arrivals. Marking a stop completed or skipped is
//! always the caller's decision, passed back through
//! [`NavigationSession::resolve_arrival`].

use std::sync::mpsc::{self, Receiver};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::haversine::distance;
use crate::maneuver::{ManeuverIndicator, classify_maneuver};
use crate::model::{GeoPoint, NavigationStep, Stop, StopStatus};
use crate::traits::{GeolocationProvider, Subscription};

const DEFAULT_ARRIVAL_THRESHOLD_KM: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// A position closer than this to the current stop counts as arrival.
    pub arrival_threshold_km: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_km: DEFAULT_ARRIVAL_THRESHOLD_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Navigating,
    /// Waiting for the caller to resolve the stop at this index.
    Arrived(usize),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// The driver reached a stop that is not the last one.
    Arrived { index: usize, stop_id: String },
    /// The driver reached the final stop.
    Finished { stop_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    Skipped,
}

impl From<Resolution> for StopStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Completed => StopStatus::Completed,
            Resolution::Skipped => StopStatus::Skipped,
        }
    }
}

/// What the caller should persist after resolving an arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopResolution {
    pub stop_id: String,
    pub status: StopStatus,
}

/// Progress state for one driver working through an ordered stop list.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    stops: Vec<Stop>,
    current_index: usize,
    state: SessionState,
    last_position: Option<GeoPoint>,
    config: TrackerConfig,
}

impl NavigationSession {
    pub fn new(stops: Vec<Stop>, config: TrackerConfig) -> Self {
        Self::resume(stops, 0, config)
    }

    /// A session that picks up at `index`, e.g. the first pending stop of a
    /// partially delivered route.
    pub fn resume(stops: Vec<Stop>, index: usize, config: TrackerConfig) -> Self {
        let current_index = index.min(stops.len().saturating_sub(1));
        Self {
            stops,
            current_index,
            state: SessionState::Idle,
            last_position: None,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self.state, SessionState::Navigating | SessionState::Arrived(_))
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_stop(&self) -> Option<&Stop> {
        self.stops.get(self.current_index)
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn last_position(&self) -> Option<GeoPoint> {
        self.last_position
    }

    /// Kilometers from `position` to the current stop.
    pub fn distance_to_current(&self, position: GeoPoint) -> Option<f64> {
        self.current_stop()
            .map(|stop| distance(position, stop.location))
    }

    /// Begins (or resumes) navigating at the current index. No effect once
    /// the session is finished.
    pub fn start(&mut self) {
        match self.state {
            SessionState::Idle if self.stops.is_empty() => {
                self.state = SessionState::Finished;
                info!("no stops to navigate");
            }
            SessionState::Idle => {
                self.state = SessionState::Navigating;
                info!(index = self.current_index, "navigation started");
            }
            SessionState::Finished => debug!("session already finished"),
            _ => debug!(state = ?self.state, "navigation already started"),
        }
    }

    /// Cancels navigation. The index is kept so a later `start` resumes.
    pub fn stop(&mut self) {
        if self.state != SessionState::Idle {
            info!(index = self.current_index, "navigation stopped");
        }
        self.state = SessionState::Idle;
    }

    /// Applies one position update.
    ///
    /// Returns an event the first time the driver comes within the arrival
    /// threshold of the current stop. Lingering near a stop that is awaiting
    /// resolution produces nothing further.
    pub fn update(&mut self, position: GeoPoint) -> Option<TrackerEvent> {
        if !position.is_valid() {
            warn!(%position, "ignoring invalid position update");
            return None;
        }
        self.last_position = Some(position);

        if self.state != SessionState::Navigating {
            return None;
        }

        let stop = self.stops.get(self.current_index)?;
        let d = distance(position, stop.location);
        if !(d < self.config.arrival_threshold_km) {
            return None;
        }

        let stop_id = stop.id.clone();
        if self.current_index + 1 < self.stops.len() {
            info!(index = self.current_index, %stop_id, distance_km = d, "arrived at stop");
            self.state = SessionState::Arrived(self.current_index);
            Some(TrackerEvent::Arrived {
                index: self.current_index,
                stop_id,
            })
        } else {
            info!(%stop_id, "arrived at final stop");
            self.state = SessionState::Finished;
            Some(TrackerEvent::Finished { stop_id })
        }
    }

    /// Records the caller's decision for the stop awaiting resolution and
    /// moves on to the next one. `None` if no arrival is pending.
    pub fn resolve_arrival(&mut self, resolution: Resolution) -> Option<StopResolution> {
        let SessionState::Arrived(index) = self.state else {
            return None;
        };

        let status = StopStatus::from(resolution);
        let stop = self.stops.get_mut(index)?;
        stop.mark(status, None);
        let outcome = StopResolution {
            stop_id: stop.id.clone(),
            status,
        };

        self.current_index = index + 1;
        self.state = SessionState::Navigating;
        info!(stop_id = %outcome.stop_id, status = ?status, next = self.current_index, "stop resolved");

        Some(outcome)
    }
}

/// The step whose start point is closest to `position`, with its index.
/// The earliest step wins a tie.
pub fn find_nearest_step(
    position: GeoPoint,
    steps: &[NavigationStep],
) -> Option<(&NavigationStep, usize)> {
    let mut best: Option<(usize, f64)> = None;

    for (i, step) in steps.iter().enumerate() {
        let d = distance(position, step.start_location);
        let better = match best {
            Some((_, best_distance)) => d < best_distance,
            None => true,
        };
        if better {
            best = Some((i, d));
        }
    }

    best.map(|(i, _)| (&steps[i], i))
}

/// Display-ready guidance for the step nearest to the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance<'a> {
    pub index: usize,
    pub step: &'a NavigationStep,
    pub indicator: ManeuverIndicator,
    /// Kilometers from the driver to the start of the step.
    pub distance_km: f64,
}

pub fn guidance(position: GeoPoint, steps: &[NavigationStep]) -> Option<Guidance<'_>> {
    let (step, index) = find_nearest_step(position, steps)?;
    Some(Guidance {
        index,
        step,
        indicator: classify_maneuver(step.maneuver.as_deref()),
        distance_km: distance(position, step.start_location),
    })
}

/// Couples a [`NavigationSession`] with a live location subscription.
///
/// The subscription exists only while navigating. It is cancelled by
/// [`Navigator::stop_navigation`], by a failed start, and on drop.
pub struct Navigator<G: GeolocationProvider> {
    provider: G,
    session: NavigationSession,
    subscription: Option<Box<dyn Subscription>>,
    updates: Option<Receiver<GeoPoint>>,
}

impl<G: GeolocationProvider> Navigator<G> {
    pub fn new(provider: G, session: NavigationSession) -> Self {
        Self {
            provider,
            session,
            subscription: None,
            updates: None,
        }
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut NavigationSession {
        &mut self.session
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Starts the session and subscribes to position updates.
    ///
    /// The current position is applied immediately; any event it raises is
    /// returned. If that lookup fails the subscription is released again.
    /// A finished session never subscribes.
    pub fn start_navigation(&mut self) -> Result<Option<TrackerEvent>> {
        if self.subscription.is_some() {
            return Ok(None);
        }

        self.session.start();
        if self.session.is_finished() {
            return Ok(None);
        }

        let (sender, receiver) = mpsc::channel();
        let subscription = match self.provider.subscribe(sender) {
            Ok(subscription) => subscription,
            Err(err) => {
                self.session.stop();
                return Err(err);
            }
        };
        self.subscription = Some(subscription);
        self.updates = Some(receiver);

        let position = match self.provider.current_position() {
            Ok(position) => position,
            Err(err) => {
                warn!(error = %err, "could not read initial position");
                self.stop_navigation();
                return Err(err);
            }
        };

        Ok(self.session.update(position))
    }

    /// Applies every queued position update in arrival order.
    pub fn poll(&mut self) -> Vec<TrackerEvent> {
        let Some(updates) = &self.updates else {
            return Vec::new();
        };

        let positions: Vec<GeoPoint> = updates.try_iter().collect();
        positions
            .into_iter()
            .filter_map(|position| self.session.update(position))
            .collect()
    }

    pub fn resolve_arrival(&mut self, resolution: Resolution) -> Option<StopResolution> {
        self.session.resolve_arrival(resolution)
    }

    /// Releases the subscription and returns the session to idle.
    pub fn stop_navigation(&mut self) {
        self.release();
        self.session.stop();
    }

    fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
            debug!("location subscription cancelled");
        }
        self.updates = None;
    }
}

impl<G: GeolocationProvider> Drop for Navigator<G> {
    fn drop(&mut self) {
        self.release();
    }
}
