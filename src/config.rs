use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
};

/// How strictly the graph checks incoming data.
///
/// With validation enabled, values of an unexpected type are rejected and self-contradictory
/// remote relationship payloads are dropped (logged and recorded in
/// [crate::graph::Graph::diagnostics]). With it disabled the graph trusts its input and applies
/// payloads as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Disabled,
    Enabled,
}

impl Default for ValidationLevel {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ValidationLevel::Enabled
        } else {
            ValidationLevel::Disabled
        }
    }
}

impl ValidationLevel {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ValidationLevel::Enabled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub validation: ValidationLevel,
}

impl GraphConfig {
    pub fn validating() -> Self {
        GraphConfig {
            validation: ValidationLevel::Enabled,
        }
    }

    pub fn trusting() -> Self {
        GraphConfig {
            validation: ValidationLevel::Disabled,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, GraphError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML config file. A missing file yields the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read graph config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using the default graph config.");
            return Ok(GraphConfig::default());
        }
        GraphConfig::from_toml_str(&read_to_string(path)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        tracing::debug!("Attempting to write graph config to: {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        write(path, toml_string)?;
        Ok(())
    }
}
