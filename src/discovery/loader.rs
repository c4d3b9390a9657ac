//! Module loading.
//!
//! Discovery finds files; a [`ModuleLoader`] supplies the code behind them.
//! The default loader, [`ModuleRegistry`], maps each file's module key
//! (`users/:id.rs`) to a factory that builds the module's exports.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::discovery::collector::RouteEntry;
use crate::handler::LoadedModule;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no module registered for {key}")]
    NotRegistered { key: String },

    #[error("module {key} failed to initialize: {source}")]
    Failed {
        key: String,
        #[source]
        source: BoxError,
    },
}

/// Supplies the exports of a discovered file.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, entry: &RouteEntry) -> Result<LoadedModule, LoadError>;
}

type Factory = Box<dyn Fn() -> Result<LoadedModule, BoxError> + Send + Sync>;

/// Module keys mapped to factories.
///
/// ```ignore
/// let modules = ModuleRegistry::new()
///     .module("users.rs", || Ok(LoadedModule::function(list_users)))
///     .module("users/:id.rs", || Ok(LoadedModule::resource::<UserResource>()));
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, Factory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<LoadedModule, BoxError> + Send + Sync + 'static,
    {
        self.insert(key, factory);
        self
    }

    pub fn insert<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<LoadedModule, BoxError> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, entry: &RouteEntry) -> Result<LoadedModule, LoadError> {
        let factory = self
            .factories
            .get(&entry.module_key)
            .ok_or_else(|| LoadError::NotRegistered {
                key: entry.module_key.clone(),
            })?;

        factory().map_err(|source| LoadError::Failed {
            key: entry.module_key.clone(),
            source,
        })
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("ModuleRegistry").field("modules", &keys).finish()
    }
}
