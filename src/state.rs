use crate::source::ActivitySource;
use std::sync::Arc;

/// Read-only per-process settings handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<ActivitySource>,
    pub min_trailing_days: usize,
}

impl AppState {
    pub fn new(source: ActivitySource, min_trailing_days: usize) -> Self {
        Self {
            source: Arc::new(source),
            min_trailing_days,
        }
    }
}
