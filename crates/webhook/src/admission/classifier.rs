use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::Container;

use crate::device::DeviceRegistry;
use crate::quantity;

/// Accelerator resources that make a container a GPU workload.
pub const ACCELERATOR_RESOURCE_NAMES: &[&str] = &[
    "nvidia.com/gpu",
    "nvidia.com/gpucores",
    "nvidia.com/gpumem-percentage",
    "nvidia.com/gpumem",
    "amd.com/gpu",
    "intel.com/gpu",
];

/// Resource names the classifier treats as accelerator requests.
///
/// Always holds [`ACCELERATOR_RESOURCE_NAMES`]; extended with whatever names
/// the registered device handlers are configured to recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorResources {
    names: BTreeSet<String>,
}

impl Default for AcceleratorResources {
    fn default() -> Self {
        Self {
            names: ACCELERATOR_RESOURCE_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl AcceleratorResources {
    pub fn from_registry(devices: &DeviceRegistry) -> Self {
        let mut resources = Self::default();
        resources.names.extend(
            devices
                .iter()
                .flat_map(|handler| handler.resource_names())
                .filter(|name| !name.is_empty()),
        );
        resources
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Whether the container requests any accelerator resource.
///
/// Requests and limits are both considered. A known resource only counts when
/// its quantity is strictly positive.
pub fn has_accelerator_resources(container: &Container, resources: &AcceleratorResources) -> bool {
    let Some(requirements) = container.resources.as_ref() else {
        return false;
    };

    [requirements.requests.as_ref(), requirements.limits.as_ref()]
        .into_iter()
        .flatten()
        .any(|list| {
            list.iter()
                .any(|(name, value)| resources.contains(name) && quantity::is_positive(value))
        })
}

/// Whether the container runs privileged.
pub fn is_privileged(container: &Container) -> bool {
    container
        .security_context
        .as_ref()
        .and_then(|sc| sc.privileged)
        .unwrap_or(false)
}
