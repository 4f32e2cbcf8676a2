//! Tracks the sun's position for the resolved observer location and
//! broadcasts a fresh [`SunState`] once a minute.
//!
//! The monitor resolves the location exactly once, when it starts.
//! The first state goes out together with the resolution; after that a
//! timer drives the updates. Stopping the monitor guarantees no
//! further states are published, even if a resolution was in flight.

use chrono::{DateTime, Utc};
use heliodon_api::{
    geo::ResolvedLocation, provider::Locate, solar, Error,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, info_span, warn};
use tracing_futures::Instrument;

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

// Large enough that a slow subscriber never sees the initial state
// evicted by the first real one.

const CHANNEL_DEPTH: usize = 16;

/// A snapshot of everything the scene layer needs to know about the
/// sun. `position` and `location` are `None` until the first
/// resolution completes or when it failed.

#[derive(Debug, Clone, PartialEq)]
pub struct SunState {
    pub position: Option<solar::Position>,
    pub location: Option<ResolvedLocation>,
    pub intensity: f64,
    pub is_day: bool,
    pub loading: bool,
    pub error: Option<String>,
}

pub type State = Arc<SunState>;

impl SunState {
    // The state subscribers see before the first resolution has
    // finished. Half intensity and daytime give a neutrally lit globe
    // while loading.

    fn initial() -> State {
        Arc::new(SunState {
            position: None,
            location: None,
            intensity: 0.5,
            is_day: true,
            loading: true,
            error: None,
        })
    }

    fn snapshot(loc: &ResolvedLocation, time: &DateTime<Utc>) -> State {
        let position = solar::position(loc.coordinate, time);

        Arc::new(SunState {
            position: Some(position),
            location: Some(loc.clone()),
            intensity: position.altitude.sin().max(0.0),
            is_day: position.altitude > 0.0,
            loading: false,
            error: None,
        })
    }

    fn errored(e: &Error) -> State {
        Arc::new(SunState {
            position: None,
            location: None,
            intensity: 0.5,
            is_day: true,
            loading: false,
            error: Some(e.to_string()),
        })
    }
}

/// Owns the polling task. Dropping the monitor stops it.

pub struct Monitor {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Monitor {
    /// Stops the polling task. No state is published after this
    /// returns, including one from a resolution still in flight.

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        self.task.abort();
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        self.task.abort();
    }
}

async fn run<P: Locate>(
    mut provider: Box<P>,
    tx: broadcast::Sender<State>,
    stop: watch::Receiver<bool>,
) {
    info!("resolving location via '{}' provider", provider.name());

    let loc = match provider.resolve().await {
        Ok(loc) => loc,
        Err(e) => {
            warn!("couldn't resolve a location -- {}", &e);

            let _ = tx.send(SunState::errored(&e));
            return;
        }
    };

    // A stop request may have arrived while the resolution was in
    // flight. A late fix must not be published.

    if *stop.borrow() {
        return;
    }

    if loc.was_fallback {
        warn!("provider fell back to the default location");
    } else {
        info!(
            "observer at {:.4}, {:.4} ({})",
            loc.coordinate.latitude,
            loc.coordinate.longitude,
            &loc.timezone
        );
    }

    // The first real state goes out with the resolution itself, not
    // on the first timer tick.

    if tx.send(SunState::snapshot(&loc, &Utc::now())).is_err() {
        return;
    }

    let mut interval = time::interval(POLL_INTERVAL);

    // The first tick of a fresh interval completes immediately and
    // would duplicate the state just sent.

    let _ = interval.tick().await;

    loop {
        let _ = interval.tick().await;

        if *stop.borrow() {
            break;
        }

        if tx.send(SunState::snapshot(&loc, &Utc::now())).is_err() {
            info!("no remaining clients ... terminating");
            break;
        }
    }
}

/// Starts the monitor. The returned receiver already holds the
/// loading state, so a subscriber's first `recv` never blocks on the
/// provider.

pub fn create_task<P: Locate + 'static>(
    provider: Box<P>,
) -> (Monitor, broadcast::Receiver<State>) {
    let (tx, rx) = broadcast::channel(CHANNEL_DEPTH);
    let (stop_tx, stop_rx) = watch::channel(false);

    // Guaranteed to be buffered for `rx` since it was subscribed
    // above. The task owns the only sender from here on, so the
    // channel closes when the task ends.

    let _ = tx.send(SunState::initial());

    let task = tokio::spawn(
        run(provider, tx, stop_rx).instrument(info_span!("sun")),
    );

    (Monitor { stop_tx, task }, rx)
}
