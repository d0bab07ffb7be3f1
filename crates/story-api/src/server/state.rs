use std::sync::Arc;

use story_core::Catalog;
use tokio::sync::Mutex;

use crate::StoryApi;

/// The catalog is immutable and read without the lock; session operations
/// go through the mutex one at a time.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: Arc<Mutex<StoryApi>>,
    pub(crate) catalog: Arc<Catalog>,
}

impl AppState {
    pub(crate) fn new(api: StoryApi) -> Self {
        let catalog = api.shared_catalog();
        Self {
            api: Arc::new(Mutex::new(api)),
            catalog,
        }
    }
}
