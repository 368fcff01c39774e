use std::sync::Arc;
use sf_fetch::Ingestor;

/// Handles built once at startup and shared by every request.
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self { ingestor }
    }
}
