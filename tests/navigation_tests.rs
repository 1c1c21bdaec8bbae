//! Navigation sessions driven by a scripted location feed.

mod fixtures;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use route_sequencer::sequencer::SequencerConfig;
use route_sequencer::tracker::{
    NavigationSession, Navigator, Resolution, SessionState, TrackerConfig, TrackerEvent,
};
use route_sequencer::traits::{GeolocationProvider, Subscription};
use route_sequencer::{Error, GeoPoint, Result, StopStatus, plan_route};

use fixtures::{DEPOT, client_stops};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Default)]
struct FeedState {
    sender: Option<Sender<GeoPoint>>,
    active: bool,
    subscriptions: usize,
    cancellations: usize,
}

/// A location provider whose updates the test pushes by hand.
#[derive(Clone)]
struct ScriptedFeed {
    state: Rc<RefCell<FeedState>>,
    current: Option<GeoPoint>,
}

impl ScriptedFeed {
    fn at(position: GeoPoint) -> Self {
        Self {
            state: Rc::default(),
            current: Some(position),
        }
    }

    fn without_fix() -> Self {
        Self {
            state: Rc::default(),
            current: None,
        }
    }

    fn push(&self, position: GeoPoint) {
        let state = self.state.borrow();
        if state.active {
            if let Some(sender) = &state.sender {
                let _ = sender.send(position);
            }
        }
    }

    fn active(&self) -> bool {
        self.state.borrow().active
    }

    fn counts(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.subscriptions, state.cancellations)
    }
}

struct ScriptedSubscription {
    state: Rc<RefCell<FeedState>>,
}

impl Subscription for ScriptedSubscription {
    fn cancel(&mut self) {
        let mut state = self.state.borrow_mut();
        state.active = false;
        state.sender = None;
        state.cancellations += 1;
    }
}

impl GeolocationProvider for ScriptedFeed {
    fn current_position(&self) -> Result<GeoPoint> {
        self.current
            .ok_or_else(|| Error::Geolocation("no fix".to_string()))
    }

    fn subscribe(&self, updates: Sender<GeoPoint>) -> Result<Box<dyn Subscription>> {
        let mut state = self.state.borrow_mut();
        state.sender = Some(updates);
        state.active = true;
        state.subscriptions += 1;
        Ok(Box::new(ScriptedSubscription {
            state: Rc::clone(&self.state),
        }))
    }
}

fn planned_session() -> NavigationSession {
    let plan = plan_route(&client_stops(), Some(DEPOT), &SequencerConfig::default());
    NavigationSession::new(plan.stops, TrackerConfig::default())
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn drives_a_whole_route() {
    let feed = ScriptedFeed::at(DEPOT);
    let mut navigator = Navigator::new(feed.clone(), planned_session());

    assert_eq!(navigator.start_navigation().unwrap(), None);
    assert!(feed.active());

    let stops = navigator.session().stops().to_vec();
    let last = stops.len() - 1;
    let mut resolved = Vec::new();

    for (i, stop) in stops.iter().enumerate() {
        // Approach, then linger on the doorstep.
        feed.push(GeoPoint::new(stop.location.latitude + 0.01, stop.location.longitude));
        feed.push(stop.location);
        feed.push(stop.location);

        let events = navigator.poll();
        if i < last {
            assert_eq!(
                events,
                vec![TrackerEvent::Arrived { index: i, stop_id: stop.id.clone() }]
            );
            let resolution = if i % 3 == 0 { Resolution::Skipped } else { Resolution::Completed };
            resolved.push(navigator.resolve_arrival(resolution).unwrap());
        } else {
            assert_eq!(events, vec![TrackerEvent::Finished { stop_id: stop.id.clone() }]);
        }
    }

    assert_eq!(navigator.session().state(), SessionState::Finished);
    assert_eq!(resolved.len(), last);
    assert_eq!(resolved[0].status, StopStatus::Skipped);
    assert_eq!(resolved[1].status, StopStatus::Completed);
}

#[test]
fn stop_navigation_releases_subscription() {
    let feed = ScriptedFeed::at(DEPOT);
    let mut navigator = Navigator::new(feed.clone(), planned_session());

    navigator.start_navigation().unwrap();
    navigator.stop_navigation();

    assert!(!feed.active());
    assert!(!navigator.is_subscribed());
    assert_eq!(feed.counts(), (1, 1));
    assert_eq!(navigator.session().state(), SessionState::Idle);

    // Updates after cancellation go nowhere.
    let first = navigator.session().stops()[0].location;
    feed.push(first);
    assert!(navigator.poll().is_empty());
}

#[test]
fn drop_releases_subscription() {
    let feed = ScriptedFeed::at(DEPOT);
    {
        let mut navigator = Navigator::new(feed.clone(), planned_session());
        navigator.start_navigation().unwrap();
        assert!(feed.active());
    }
    assert!(!feed.active());
    assert_eq!(feed.counts(), (1, 1));
}

#[test]
fn failed_start_releases_subscription() {
    let feed = ScriptedFeed::without_fix();
    let mut navigator = Navigator::new(feed.clone(), planned_session());

    let result = navigator.start_navigation();

    assert!(matches!(result, Err(Error::Geolocation(_))));
    assert!(!feed.active());
    assert!(!navigator.is_subscribed());
    assert_eq!(navigator.session().state(), SessionState::Idle);
}

#[test]
fn starting_twice_subscribes_once() {
    let feed = ScriptedFeed::at(DEPOT);
    let mut navigator = Navigator::new(feed.clone(), planned_session());

    navigator.start_navigation().unwrap();
    navigator.start_navigation().unwrap();
    drop(navigator);

    assert_eq!(feed.counts(), (1, 1));
}

#[test]
fn starting_at_the_first_stop_arrives_immediately() {
    let session = planned_session();
    let first = session.stops()[0].clone();
    let feed = ScriptedFeed::at(first.location);
    let mut navigator = Navigator::new(feed, session);

    let event = navigator.start_navigation().unwrap();

    assert_eq!(event, Some(TrackerEvent::Arrived { index: 0, stop_id: first.id }));
}

#[test]
fn restart_resumes_where_the_driver_left_off() {
    let feed = ScriptedFeed::at(DEPOT);
    let mut navigator = Navigator::new(feed.clone(), planned_session());
    navigator.start_navigation().unwrap();

    let first = navigator.session().stops()[0].location;
    feed.push(first);
    navigator.poll();
    navigator.resolve_arrival(Resolution::Completed).unwrap();
    navigator.stop_navigation();

    navigator.start_navigation().unwrap();
    assert_eq!(navigator.session().current_index(), 1);
    assert_eq!(feed.counts(), (2, 1));
}

#[test]
fn finished_session_does_not_subscribe() {
    let stops = planned_session().stops().to_vec();
    let last = stops.len() - 1;
    let final_stop = stops[last].location;
    let mut session = NavigationSession::resume(stops, last, TrackerConfig::default());
    session.start();
    assert!(session.update(final_stop).is_some());
    assert!(session.is_finished());

    let feed = ScriptedFeed::at(final_stop);
    let mut navigator = Navigator::new(feed.clone(), session);

    assert_eq!(navigator.start_navigation().unwrap(), None);
    assert!(!navigator.is_subscribed());
    assert_eq!(navigator.session().state(), SessionState::Finished);
    drop(navigator);
    assert_eq!(feed.counts(), (0, 0));
}

#[test]
fn empty_session_does_not_subscribe() {
    let feed = ScriptedFeed::at(DEPOT);
    let session = NavigationSession::new(Vec::new(), TrackerConfig::default());
    let mut navigator = Navigator::new(feed.clone(), session);

    assert_eq!(navigator.start_navigation().unwrap(), None);
    assert!(!feed.active());
    assert_eq!(navigator.session().state(), SessionState::Finished);
    assert_eq!(feed.counts(), (0, 0));
}
