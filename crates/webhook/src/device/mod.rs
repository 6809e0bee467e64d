//! Vendor device handlers.
//!
//! Each supported accelerator vendor contributes one [`DeviceHandler`]. The
//! handlers are registered once at startup into a [`DeviceRegistry`] and are
//! invoked in registration order for every eligible container of a pod under
//! admission.

use std::sync::Arc;

use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;

use crate::config::DeviceConfig;
use crate::quantity;

pub mod amd;
pub mod intel;
pub mod nvidia;

pub use amd::AmdDevices;
pub use intel::IntelDevices;
pub use nvidia::NvidiaDevices;

/// Errors raised by device handlers while translating container resources.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Invalid quantity for resource {resource}: {value}")]
    InvalidQuantity { resource: String, value: String },
}

/// A vendor specific admission hook.
///
/// Implementations must be stateless across calls: the same handler instance
/// serves every concurrent admission request.
pub trait DeviceHandler: Send + Sync {
    /// Vendor name used in logs.
    fn vendor(&self) -> &'static str;

    /// Resource names that request a device of this vendor.
    fn resource_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Inspect and possibly rewrite `container`.
    ///
    /// `pod` is the pod the container belongs to, as it stood before container
    /// mutation began.
    ///
    /// Returns `true` when the handler recognized a resource of its vendor in
    /// the container and acted on it.
    ///
    /// # Errors
    ///
    /// - [`DeviceError`] if the container's resources cannot be translated
    fn mutate_admission(
        &self,
        container: &mut Container,
        pod: &Pod,
    ) -> Result<bool, Report<DeviceError>>;
}

/// Ordered set of device handlers shared by all admission requests.
#[derive(Default, Clone)]
pub struct DeviceRegistry {
    handlers: Vec<Arc<dyn DeviceHandler>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in vendor handler in its fixed order.
    pub fn from_config(config: &DeviceConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NvidiaDevices::new(config.nvidia.clone())));
        registry.register(Arc::new(AmdDevices::new(config.amd.clone())));
        registry.register(Arc::new(IntelDevices::new(config.intel.clone())));
        registry
    }

    /// Append a handler; handlers run in registration order.
    pub fn register(&mut self, handler: Arc<dyn DeviceHandler>) {
        self.handlers.push(handler);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DeviceHandler>> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Vendor names in registration order.
    pub fn vendors(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.vendor()).collect()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("vendors", &self.vendors())
            .finish()
    }
}

/// Append an environment variable to the container.
pub(crate) fn push_env(container: &mut Container, name: &str, value: impl Into<String>) {
    container.env.get_or_insert_with(Vec::new).push(EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    });
}

/// Whether the container lists `resource` in its limits, whatever its value.
pub(crate) fn has_limit(container: &Container, resource: &str) -> bool {
    container
        .resources
        .as_ref()
        .and_then(|r| r.limits.as_ref())
        .is_some_and(|limits| limits.contains_key(resource))
}

/// Whether `resource` is limited to a strictly positive, well-formed quantity.
pub(crate) fn positive_limit(container: &Container, resource: &str) -> bool {
    container
        .resources
        .as_ref()
        .and_then(|r| r.limits.as_ref())
        .and_then(|limits| limits.get(resource))
        .is_some_and(quantity::is_positive)
}

/// Claim the container when `resource` is limited to a positive count.
///
/// # Errors
///
/// - [`DeviceError::InvalidQuantity`] if the limit is not a valid quantity
pub(crate) fn count_limit_claimed(
    container: &Container,
    resource: &str,
) -> Result<bool, Report<DeviceError>> {
    let Some(count) = container
        .resources
        .as_ref()
        .and_then(|r| r.limits.as_ref())
        .and_then(|limits| limits.get(resource))
    else {
        return Ok(false);
    };

    let value = quantity::parse_quantity(&count.0).change_context_lazy(|| {
        DeviceError::InvalidQuantity {
            resource: resource.to_string(),
            value: count.0.clone(),
        }
    })?;
    Ok(value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_from_config_keeps_vendor_order() {
        let registry = DeviceRegistry::from_config(&DeviceConfig::default());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.vendors(), vec!["NVIDIA", "AMD", "Intel"]);
    }

    #[test]
    fn empty_registry() {
        let registry = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(format!("{registry:?}"), "DeviceRegistry { vendors: [] }");
    }

    #[test]
    fn push_env_creates_env_list() {
        let mut container = Container::default();
        push_env(&mut container, "A", "1");
        push_env(&mut container, "B", "2");

        let env = container.env.expect("env should exist");
        assert_eq!(env.len(), 2);
        assert_eq!(env[1].name, "B");
        assert_eq!(env[1].value.as_deref(), Some("2"));
    }
}
