use std::sync::{Mutex, PoisonError};

use tj_core::Route;

/// Where flows send the viewer next.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Keeps every navigation in order. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
