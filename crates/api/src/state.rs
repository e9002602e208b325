use std::sync::Arc;

use stash_core::EventSource;

use crate::config::ServerConfig;
use crate::engine::Dispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Verifies and decodes webhook deliveries.
    pub source: Arc<dyn EventSource>,
    /// Turns accepted events into pool jobs.
    pub dispatcher: Arc<Dispatcher>,
}
