use std::sync::Arc;

use crate::db::{ParsedLinkStore, SavedLinkStore};
use crate::resolver::LinkResolver;

/// Shared application state passed to all handlers.
/// The stores sit behind trait objects so tests can run without Postgres.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ParsedLinkStore>,
    pub saved: Arc<dyn SavedLinkStore>,
    pub resolver: LinkResolver,
}
