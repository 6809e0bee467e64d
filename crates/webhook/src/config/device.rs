use std::path::Path;

use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;

/// Vendor device configuration, usually mounted from a ConfigMap as YAML.
///
/// Every section and field is optional; missing values fall back to the
/// resource names the device plugins advertise by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    pub nvidia: NvidiaConfig,
    pub amd: AmdConfig,
    pub intel: IntelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NvidiaConfig {
    /// Number of whole or shared GPUs
    pub resource_count_name: String,
    /// Absolute device memory, in MiB
    pub resource_memory_name: String,
    /// Device memory as a percentage of the card
    pub resource_memory_percentage_name: String,
    /// Compute share as a percentage of the card
    pub resource_core_name: String,
    /// Task priority passed through to the in-container limiter
    pub resource_priority_name: String,
    /// GPU count assumed when only memory or cores are requested
    pub default_gpu_num: i32,
    /// Hide host GPUs from containers that do not request any
    pub overwrite_env: bool,
}

impl Default for NvidiaConfig {
    fn default() -> Self {
        Self {
            resource_count_name: "nvidia.com/gpu".to_string(),
            resource_memory_name: "nvidia.com/gpumem".to_string(),
            resource_memory_percentage_name: "nvidia.com/gpumem-percentage".to_string(),
            resource_core_name: "nvidia.com/gpucores".to_string(),
            resource_priority_name: "nvidia.com/priority".to_string(),
            default_gpu_num: 1,
            overwrite_env: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmdConfig {
    pub resource_count_name: String,
}

impl Default for AmdConfig {
    fn default() -> Self {
        Self {
            resource_count_name: "amd.com/gpu".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntelConfig {
    pub resource_count_name: String,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            resource_count_name: "intel.com/gpu".to_string(),
        }
    }
}

impl DeviceConfig {
    /// Load the device configuration from a YAML file, or use the defaults
    /// when no file is configured.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ReadFailed`] if the file cannot be read
    /// - [`ConfigError::ParseFailed`] if the file is not valid device configuration
    pub fn load(path: Option<&Path>) -> Result<Self, Report<ConfigError>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content =
            std::fs::read_to_string(path).change_context_lazy(|| ConfigError::ReadFailed {
                path: path.display().to_string(),
            })?;

        Self::from_yaml(&content).attach_printable_lazy(|| format!("file: {}", path.display()))
    }

    /// Parse the device configuration from a YAML document.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ParseFailed`] if the document is not valid device configuration
    pub fn from_yaml(content: &str) -> Result<Self, Report<ConfigError>> {
        // an empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).change_context(ConfigError::ParseFailed {
            message: "invalid device configuration".to_string(),
        })
    }
}
