use std::sync::Arc;

use crate::config::Config;
use crate::dialogue::SessionRegistry;
use crate::generation::Generator;
use crate::storage::JsonStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Picked once at startup: remote when a credential is configured, fallback otherwise.
    pub generator: Arc<dyn Generator>,
    pub store: Arc<JsonStore>,
    pub sessions: SessionRegistry,
}
