use std::sync::Arc;

use crate::config::Config;
use crate::screening::pipeline::Screener;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single orchestrator; it owns the screening backend and the current run.
    pub screener: Arc<Screener>,
    pub config: Config,
}
