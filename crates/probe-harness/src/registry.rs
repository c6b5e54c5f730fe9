//! In-memory scenario registry with lookup by ID and tag.

use crate::{
    error::{HarnessError, Result},
    loader::ScenarioLoader,
    scenario::Scenario,
};
use probe_core::ScenarioId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Cached scenarios, shareable across tasks.
#[derive(Clone)]
pub struct ScenarioRegistry {
    scenarios: Arc<RwLock<HashMap<ScenarioId, Scenario>>>,
}

impl ScenarioRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenarios: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a registry and load every scenario the loader finds.
    ///
    /// # Errors
    /// Returns error if the scenario directory can't be read.
    pub fn load_from(loader: &ScenarioLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Replace the cache with freshly loaded scenarios.
    ///
    /// # Errors
    /// Returns error if the scenario directory can't be read.
    pub fn reload(&self, loader: &ScenarioLoader) -> Result<()> {
        let scenarios = loader.load_all()?;

        let mut cache = self
            .scenarios
            .write()
            .expect("acquire write lock on scenarios");

        cache.clear();
        for scenario in scenarios {
            cache.insert(scenario.id().clone(), scenario);
        }

        info!(count = cache.len(), "reloaded scenarios");

        Ok(())
    }

    /// Add or replace a scenario after validating it.
    ///
    /// # Errors
    /// Returns error if the scenario is invalid.
    pub fn register(&self, scenario: Scenario) -> Result<()> {
        scenario.validate()?;

        let mut cache = self
            .scenarios
            .write()
            .expect("acquire write lock on scenarios");

        let id = scenario.id().clone();
        cache.insert(id.clone(), scenario);

        debug!(scenario = %id, "registered scenario");

        Ok(())
    }

    /// Get a scenario by ID.
    ///
    /// # Errors
    /// Returns error if the scenario is not registered.
    pub fn get(&self, id: &ScenarioId) -> Result<Scenario> {
        let cache = self
            .scenarios
            .read()
            .expect("acquire read lock on scenarios");

        cache.get(id).cloned().ok_or_else(|| HarnessError::NotFound {
            scenario_id: id.to_string(),
        })
    }

    /// All scenarios, ordered by ID.
    #[must_use]
    pub fn get_all(&self) -> Vec<Scenario> {
        let cache = self
            .scenarios
            .read()
            .expect("acquire read lock on scenarios");

        let mut all: Vec<_> = cache.values().cloned().collect();
        all.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        all
    }

    /// Scenarios carrying a tag, ordered by ID.
    #[must_use]
    pub fn get_by_tag(&self, tag: &str) -> Vec<Scenario> {
        self.get_all()
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect()
    }

    /// Number of registered scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios
            .read()
            .expect("acquire read lock on scenarios")
            .len()
    }

    /// Whether no scenarios are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScenarioRegistry {
    fn default() -> Self {
        Self::new()
    }
}
