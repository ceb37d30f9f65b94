//! Geolocation Watch Session
//!
//! Owns at most one continuous position subscription. Updates are pulled
//! from the source and handed to a single handler; anything tagged with a
//! watch id other than the current one (including everything after `stop`)
//! is dropped.

use crate::geo::{PositionError, PositionFix, PositionSource, WatchId, WatchOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchState {
    #[default]
    Stopped,
    Watching(WatchId),
}

/// Handed to the update handler so it can end the watch from inside
#[derive(Debug, Default)]
pub struct WatchControl {
    stop_requested: bool,
}

impl WatchControl {
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeolocationWatchSession {
    state: WatchState,
    options: WatchOptions,
}

impl GeolocationWatchSession {
    pub fn new(options: WatchOptions) -> Self {
        Self {
            state: WatchState::Stopped,
            options,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatchState::Watching(_))
    }

    /// Subscribe. A no-op while already watching.
    pub fn start(&mut self, source: &mut dyn PositionSource) -> Result<(), PositionError> {
        if self.is_watching() {
            return Ok(());
        }
        if !source.is_supported() {
            return Err(PositionError::MissingCapability);
        }
        let id = source.watch_position(&self.options)?;
        self.state = WatchState::Watching(id);
        tracing::info!(watch = id.0, "position watch started");
        Ok(())
    }

    /// Cancel the subscription. A no-op while stopped.
    pub fn stop(&mut self, source: &mut dyn PositionSource) {
        if let WatchState::Watching(id) = self.state {
            source.clear_watch(id);
            self.state = WatchState::Stopped;
            tracing::info!(watch = id.0, "position watch stopped");
        }
    }

    /// Start when stopped, stop when watching. Returns whether it is now watching.
    pub fn toggle(&mut self, source: &mut dyn PositionSource) -> Result<bool, PositionError> {
        if self.is_watching() {
            self.stop(source);
        } else {
            self.start(source)?;
        }
        Ok(self.is_watching())
    }

    /// Whether an update for `id` belongs to the live subscription
    pub fn accepts(&self, id: WatchId) -> bool {
        self.state == WatchState::Watching(id)
    }

    /// Drain pending updates and feed the live ones to `handler`, in order.
    ///
    /// The handler may call `WatchControl::stop`; the subscription is then
    /// cancelled before the next update and the rest of the batch is dropped.
    /// Returns the number of updates delivered.
    pub fn dispatch<F>(&mut self, source: &mut dyn PositionSource, mut handler: F) -> usize
    where
        F: FnMut(&Result<PositionFix, PositionError>, &mut WatchControl),
    {
        let updates = source.poll_updates();
        let mut delivered = 0;

        for update in updates {
            if !self.accepts(update.watch) {
                tracing::trace!(watch = update.watch.0, "dropping stale position update");
                continue;
            }
            let mut control = WatchControl::default();
            handler(&update.result, &mut control);
            delivered += 1;
            if control.stop_requested() {
                self.stop(source);
            }
        }
        delivered
    }
}
