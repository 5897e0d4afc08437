use std::sync::Arc;

use crate::config::Config;
use crate::entity::Cabinet;
use crate::error::InvalidCabinetError;
use crate::layout::{Layout, LayoutCache};
use crate::location::LinkBuilder;
use crate::store::RecordStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live record store
    pub store: RecordStore,
    /// Application configuration
    pub config: Arc<Config>,
    /// Builder for QR links
    pub links: LinkBuilder,
    /// Layouts keyed by cabinet content
    pub layouts: Arc<LayoutCache>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: RecordStore, config: Config) -> Self {
        Self {
            store,
            links: config.links(),
            config: Arc::new(config),
            layouts: Arc::new(LayoutCache::new()),
        }
    }

    /// Layout of a cabinet, served from the cache when its content is unchanged
    pub fn layout(&self, cabinet: &Cabinet) -> Result<Arc<Layout>, InvalidCabinetError> {
        self.layouts.get_or_compute(cabinet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySink;

    #[test]
    fn test_state_links_follow_config() {
        let config = Config {
            public_origin: "https://records.example.org".to_string(),
            ..Config::default()
        };
        let state = AppState::new(RecordStore::new(MemorySink::new()), config);
        assert_eq!(
            state.links.item_link("f1"),
            "https://records.example.org/#/file/f1"
        );
    }

    #[test]
    fn test_state_layout_is_cached() {
        let state = AppState::new(RecordStore::new(MemorySink::new()), Config::default());
        let cabinet = Cabinet::new("A", 2, 2);
        let first = state.layout(&cabinet).unwrap();
        let second = state.layout(&cabinet).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
