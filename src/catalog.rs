//! Process-wide mapping registry
//!
//! Type tables are pure functions of a service definition, so they can
//! be computed once and shared across every invocation of that service.
//! The catalog is populate-once/read-many: the first caller for a given
//! service identity computes the table while holding the lock, so
//! concurrent callers never recompute it or observe a partial one.

use crate::mapping::TypeTable;
use crate::schema::WsdlService;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

static GLOBAL: Lazy<MappingCatalog> = Lazy::new(MappingCatalog::new);

/// The process-wide catalog shared by all [`SoapClient`]s
///
/// [`SoapClient`]: crate::client::SoapClient
pub fn global() -> &'static MappingCatalog {
    &GLOBAL
}

/// A registry of derived type tables keyed by service identity
#[derive(Debug, Default)]
pub struct MappingCatalog {
    tables: Mutex<HashMap<String, Arc<TypeTable>>>,
}

impl MappingCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// The mapping for a service, computing and publishing it on first use
    pub fn get_or_build(&self, service: &WsdlService) -> Arc<TypeTable> {
        let mut tables = self.lock();
        tables
            .entry(service.identity())
            .or_insert_with(|| {
                debug!(service = %service.identity(), "deriving type table");
                Arc::new(TypeTable::build(service))
            })
            .clone()
    }

    /// Look up an already published mapping by service identity
    pub fn get(&self, identity: &str) -> Option<Arc<TypeTable>> {
        self.lock().get(identity).cloned()
    }

    /// Number of published mappings
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no mapping has been published yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all published mappings
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<TypeTable>>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself stays consistent
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}
