//! Scenario loading from TOML files.
//!
//! Scenario files live under a directory (default `scenarios/` at the
//! workspace root) and may be grouped in subdirectories. Each file holds
//! one scenario and is named after its ID.

use crate::{
    error::{HarnessError, Result},
    scenario::Scenario,
};
use probe_core::ScenarioId;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default directory name searched for at the workspace root.
pub const DEFAULT_SCENARIOS_DIR: &str = "scenarios";

/// Loader for scenario definitions from TOML files.
pub struct ScenarioLoader {
    scenarios_dir: PathBuf,
}

impl ScenarioLoader {
    /// Create a new loader with the given scenarios directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(scenarios_dir: impl Into<PathBuf>) -> Result<Self> {
        let scenarios_dir = scenarios_dir.into();

        if !scenarios_dir.is_dir() {
            return Err(HarnessError::DirectoryNotFound {
                path: scenarios_dir.display().to_string(),
            });
        }

        Ok(Self { scenarios_dir })
    }

    /// Create a loader using `scenarios/` relative to the workspace root.
    ///
    /// # Errors
    /// Returns error if the default directory doesn't exist.
    pub fn with_default_dir() -> Result<Self> {
        let mut current_dir = std::env::current_dir()?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if let Ok(contents) = std::fs::read_to_string(&cargo_toml) {
                if contents.contains("[workspace]") {
                    return Self::new(current_dir.join(DEFAULT_SCENARIOS_DIR));
                }
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Self::new(DEFAULT_SCENARIOS_DIR)
    }

    /// Directory this loader reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.scenarios_dir
    }

    /// Load a single scenario by ID.
    ///
    /// # Errors
    /// Returns error if the file doesn't exist, can't be read, or is invalid.
    pub fn load(&self, scenario_id: &ScenarioId) -> Result<Scenario> {
        let filename = format!("{}.toml", scenario_id.as_str());

        let path = Self::find_file_recursive(&self.scenarios_dir, &filename)?.ok_or_else(|| {
            HarnessError::NotFound {
                scenario_id: scenario_id.to_string(),
            }
        })?;

        let scenario = Self::load_from_path(&path)?;
        scenario.validate()?;

        if scenario.id() != scenario_id {
            return Err(HarnessError::invalid(
                scenario_id,
                format!("file {} declares id {}", path.display(), scenario.id()),
            ));
        }

        debug!(
            scenario = %scenario_id,
            steps = scenario.steps.len(),
            "loaded scenario"
        );

        Ok(scenario)
    }

    /// Load all scenarios from the directory.
    ///
    /// Unreadable, unparsable or invalid files are logged and skipped. When
    /// two files declare the same ID the first one found wins.
    ///
    /// # Errors
    /// Returns error if the directory can't be read.
    pub fn load_all(&self) -> Result<Vec<Scenario>> {
        let mut scenarios = Vec::new();
        Self::walk_and_load_recursive(&self.scenarios_dir, &mut scenarios)?;

        let mut seen = HashSet::new();
        scenarios.retain(|scenario: &Scenario| {
            let fresh = seen.insert(scenario.id().clone());
            if !fresh {
                warn!(scenario = %scenario.id(), "duplicate scenario id, keeping first");
            }
            fresh
        });

        info!(
            count = scenarios.len(),
            dir = %self.scenarios_dir.display(),
            "loaded scenarios"
        );

        Ok(scenarios)
    }

    fn walk_and_load_recursive(dir: &Path, scenarios: &mut Vec<Scenario>) -> Result<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // Stable order so duplicate resolution is deterministic
        entries.sort();

        for path in entries {
            if path.is_dir() {
                Self::walk_and_load_recursive(&path, scenarios)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                match Self::load_from_path(&path) {
                    Ok(scenario) => {
                        if let Err(e) = scenario.validate() {
                            warn!(
                                path = %path.display(),
                                error = %e,
                                "skipping invalid scenario"
                            );
                            continue;
                        }
                        scenarios.push(scenario);
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to load scenario"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    fn find_file_recursive(dir: &Path, filename: &str) -> Result<Option<PathBuf>> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                if let Some(found) = Self::find_file_recursive(&path, filename)? {
                    return Ok(Some(found));
                }
            } else if path.file_name().and_then(|s| s.to_str()) == Some(filename) {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    fn load_from_path(path: &Path) -> Result<Scenario> {
        let contents = std::fs::read_to_string(path).map_err(|e| HarnessError::LoadError {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| HarnessError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
    }
}
