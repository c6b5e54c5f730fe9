//! Shared types used across the probe workspace.
//!
//! Newtypes here validate on construction and on deserialization, so a
//! scenario or config that made it into memory is already well-formed.

use crate::error::ProbeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Newtype for scenario identifiers with validation.
///
/// Scenario IDs must be lowercase alphanumeric with hyphens, 3-64 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenarioId(String);

impl ScenarioId {
    /// Create a new `ScenarioId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, ProbeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), ProbeError> {
        static SCENARIO_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = SCENARIO_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$").expect("valid regex"));

        if id.len() < 3 || id.len() > 64 {
            return Err(ProbeError::Validation(format!(
                "invalid scenario ID: must be 3-64 characters, got {} characters",
                id.len()
            )));
        }

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(ProbeError::Validation(format!(
                "invalid scenario ID: must be lowercase alphanumeric with hyphens, got '{id}'"
            )))
        }
    }
}

impl TryFrom<String> for ScenarioId {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScenarioId> for String {
    fn from(id: ScenarioId) -> Self {
        id.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base URL of the application under probe.
///
/// Only `http` and `https` are accepted. Scenario steps name paths relative
/// to this host; [`BaseUrl::resolve`] turns them into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parse and validate a base URL.
    ///
    /// # Errors
    /// Returns error if the string is not an absolute http(s) URL.
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let url = Url::parse(raw)
            .map_err(|e| ProbeError::Validation(format!("invalid base URL '{raw}': {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ProbeError::Validation(format!(
                    "invalid base URL '{raw}': scheme must be http or https, got '{other}'"
                )))
            }
        }

        if url.host_str().is_none() {
            return Err(ProbeError::Validation(format!(
                "invalid base URL '{raw}': no host"
            )));
        }

        Ok(Self(url))
    }

    /// Resolve a step target against this base.
    ///
    /// Paths are joined onto the base URL. Absolute and scheme-relative
    /// targets are accepted only when they stay on the base origin.
    ///
    /// # Errors
    /// Returns error if the target cannot be joined into a valid URL or
    /// resolves to a different scheme, host or port.
    pub fn resolve(&self, target: &str) -> Result<Url, ProbeError> {
        let url = self
            .0
            .join(target)
            .map_err(|e| ProbeError::Validation(format!("cannot resolve '{target}': {e}")))?;

        if !self.same_origin(&url) {
            return Err(ProbeError::Validation(format!(
                "'{target}' leaves the target application at {}",
                self.0.origin().ascii_serialization()
            )));
        }

        Ok(url)
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.0.scheme()
            && url.host_str() == self.0.host_str()
            && url.port_or_known_default() == self.0.port_or_known_default()
    }

    /// Borrow the underlying URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Host name of the target application.
    #[must_use]
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BaseUrl> for String {
    fn from(url: BaseUrl) -> Self {
        url.0.into()
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
