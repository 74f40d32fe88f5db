//! Open display-surface registry
//!
//! Detail panels showing one block's cost breakdown are owned by the host;
//! the registry keeps a keyed lookup so blocks can be rebound to an already
//! open surface after every tree rebuild. At most one surface exists per
//! block key. Injected into the workspace rather than held as a process-wide
//! singleton.

use crate::models::block::Block;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// An externally owned panel rendering one block's detail view.
pub trait DisplaySurface: Send + Sync {
    /// Replace the surface contents with the given block's current state.
    fn render(&self, block: &Block);

    /// Bring the surface to the foreground.
    fn reveal(&self);
}

/// Creates new surfaces on demand when a block is shown for the first time.
pub type DisplayFactory = dyn Fn(&Block) -> Arc<dyn DisplaySurface> + Send + Sync;

/// Lookup map of open display surfaces, keyed `"{filename}|{block name}"`.
#[derive(Default)]
pub struct DisplayRegistry {
    views: DashMap<String, Arc<dyn DisplaySurface>>,
    factory: Option<Box<DisplayFactory>>,
}

impl DisplayRegistry {
    /// A registry that can only rebind to surfaces registered by the host.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that opens new surfaces through the given factory.
    pub fn with_factory(factory: Box<DisplayFactory>) -> Self {
        Self {
            views: DashMap::new(),
            factory: Some(factory),
        }
    }

    /// Register an externally created surface under a block key.
    pub fn insert(&self, key: impl Into<String>, surface: Arc<dyn DisplaySurface>) {
        self.views.insert(key.into(), surface);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn DisplaySurface>> {
        self.views.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Fetch the surface for a block, opening one through the factory if
    /// nothing is registered under its key.
    pub fn open(&self, block: &Block) -> Option<Arc<dyn DisplaySurface>> {
        let key = block.key();
        if let Some(existing) = self.get(&key) {
            return Some(existing);
        }

        let factory = self.factory.as_ref()?;
        let surface = factory(block);
        debug!(key = %key, "opened display surface");
        self.views.insert(key, Arc::clone(&surface));
        Some(surface)
    }

    /// Remove a surface when the host disposes its panel.
    pub fn dispose(&self, key: &str) {
        if self.views.remove(key).is_some() {
            debug!(key = %key, "disposed display surface");
        }
    }

    /// Keys of all currently open surfaces.
    pub fn keys(&self) -> Vec<String> {
        self.views.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Compose the registry key for a (filename, block name) pair.
pub fn block_key(filename: &str, name: &str) -> String {
    format!("{filename}|{name}")
}

/// Split a registry key back into (filename, block name).
pub fn split_block_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('|')
}
