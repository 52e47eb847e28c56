use std::sync::Arc;

use sqldoc::{backend::StoreBackend, store::CollectionStore};

pub type SharedStore = Arc<CollectionStore<Arc<dyn StoreBackend>>>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

impl AppState {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            store: Arc::new(CollectionStore::new(backend)),
        }
    }
}
