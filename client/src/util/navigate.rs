//! Navigation seam used when the session can no longer be recovered.
//!
//! SYSTEM CONTEXT
//! ==============
//! A browser front end would assign `window.location`; the CLI prints a hint.
//! The API client only ever asks for the login route, and only after a token
//! refresh was rejected with 401.

use std::sync::Mutex;

pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Logs the redirect and otherwise does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, route: &str) {
        tracing::warn!(%route, "session expired; login required");
    }
}

/// Remembers every requested route, for headless embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(route.to_owned());
    }
}
