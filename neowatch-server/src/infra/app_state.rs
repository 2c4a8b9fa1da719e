use std::fmt;
use std::sync::Arc;

use neowatch_core::ports::{MessageQueue, ResultStore};

/// Number of rows the dangerous-asteroid listing returns.
pub const DANGEROUS_LISTING_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn MessageQueue>,
    pub results: Arc<dyn ResultStore>,
    pub listing_limit: usize,
}

impl AppState {
    pub fn new(queue: Arc<dyn MessageQueue>, results: Arc<dyn ResultStore>) -> Self {
        Self {
            queue,
            results,
            listing_limit: DANGEROUS_LISTING_LIMIT,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("listing_limit", &self.listing_limit)
            .finish_non_exhaustive()
    }
}
