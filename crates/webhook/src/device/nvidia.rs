use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;
use tracing::debug;

use super::count_limit_claimed;
use super::has_limit;
use super::positive_limit;
use super::push_env;
use super::DeviceError;
use super::DeviceHandler;
use crate::config::NvidiaConfig;
use crate::quantity;

/// Environment variable carrying the task priority into the container.
pub const TASK_PRIORITY_ENV: &str = "CUDA_TASK_PRIORITY";

/// Environment variable the NVIDIA container runtime reads to expose devices.
pub const VISIBLE_DEVICES_ENV: &str = "NVIDIA_VISIBLE_DEVICES";

/// Shared NVIDIA GPUs (`nvidia.com/*`).
#[derive(Debug, Clone)]
pub struct NvidiaDevices {
    config: NvidiaConfig,
}

impl NvidiaDevices {
    pub fn new(config: NvidiaConfig) -> Self {
        Self { config }
    }

    fn requests_fraction(&self, container: &Container) -> bool {
        [
            &self.config.resource_core_name,
            &self.config.resource_memory_name,
            &self.config.resource_memory_percentage_name,
        ]
        .into_iter()
        .any(|name| positive_limit(container, name))
    }
}

impl DeviceHandler for NvidiaDevices {
    fn vendor(&self) -> &'static str {
        "NVIDIA"
    }

    fn resource_names(&self) -> Vec<String> {
        vec![
            self.config.resource_count_name.clone(),
            self.config.resource_memory_name.clone(),
            self.config.resource_memory_percentage_name.clone(),
            self.config.resource_core_name.clone(),
        ]
    }

    fn mutate_admission(
        &self,
        container: &mut Container,
        pod: &Pod,
    ) -> Result<bool, Report<DeviceError>> {
        let priority = container
            .resources
            .as_ref()
            .and_then(|r| r.limits.as_ref())
            .and_then(|limits| limits.get(&self.config.resource_priority_name))
            .cloned();
        if let Some(priority) = priority {
            let value = quantity::integer_value(&priority).change_context_lazy(|| {
                DeviceError::InvalidQuantity {
                    resource: self.config.resource_priority_name.clone(),
                    value: priority.0.clone(),
                }
            })?;
            push_env(container, TASK_PRIORITY_ENV, value.to_string());
        }

        let claimed = if has_limit(container, &self.config.resource_count_name) {
            count_limit_claimed(container, &self.config.resource_count_name)?
        } else if self.requests_fraction(container) && self.config.default_gpu_num > 0 {
            container
                .resources
                .get_or_insert_with(Default::default)
                .limits
                .get_or_insert_with(Default::default)
                .insert(
                    self.config.resource_count_name.clone(),
                    Quantity(self.config.default_gpu_num.to_string()),
                );
            debug!(
                pod = %pod.name_any(),
                container = %container.name,
                count = self.config.default_gpu_num,
                "Defaulted GPU count for fractional request"
            );
            true
        } else {
            false
        };

        if !claimed && self.config.overwrite_env {
            push_env(container, VISIBLE_DEVICES_ENV, "none");
        }

        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::ResourceRequirements;
    use similar_asserts::assert_eq;

    use super::*;

    fn container_with_limits(limits: &[(&str, &str)]) -> Container {
        let limits: BTreeMap<String, Quantity> = limits
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
            .collect();
        Container {
            name: "cuda".to_string(),
            resources: Some(ResourceRequirements {
                limits: Some(limits),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn env_value<'a>(container: &'a Container, name: &str) -> Option<&'a str> {
        container
            .env
            .as_ref()?
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_deref())
    }

    #[test]
    fn claims_gpu_count() {
        let handler = NvidiaDevices::new(NvidiaConfig::default());
        let mut container = container_with_limits(&[("nvidia.com/gpu", "1")]);

        let claimed = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert!(claimed);
        assert!(container.env.is_none());
    }

    #[test]
    fn defaults_gpu_count_for_fractional_requests() {
        let handler = NvidiaDevices::new(NvidiaConfig::default());
        let mut container = container_with_limits(&[("nvidia.com/gpumem", "3000")]);

        let claimed = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert!(claimed);
        let limits = container.resources.unwrap().limits.unwrap();
        assert_eq!(limits.get("nvidia.com/gpu"), Some(&Quantity("1".to_string())));
    }

    #[test]
    fn zero_gpu_count_is_not_claimed() {
        let handler = NvidiaDevices::new(NvidiaConfig::default());
        let mut container =
            container_with_limits(&[("nvidia.com/gpu", "0"), ("nvidia.com/gpumem", "1024")]);
        let before = container.clone();

        let claimed = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert!(!claimed);
        assert_eq!(container, before, "an explicit zero count is not defaulted");
    }

    #[test]
    fn fractional_request_without_default_count_is_not_claimed() {
        let config = NvidiaConfig {
            default_gpu_num: 0,
            ..Default::default()
        };
        let handler = NvidiaDevices::new(config);
        let mut container = container_with_limits(&[("nvidia.com/gpucores", "30")]);

        let claimed = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert!(!claimed);
        let limits = container.resources.unwrap().limits.unwrap();
        assert!(!limits.contains_key("nvidia.com/gpu"));
    }

    #[test]
    fn priority_is_exported_as_env() {
        let handler = NvidiaDevices::new(NvidiaConfig::default());
        let mut container =
            container_with_limits(&[("nvidia.com/gpu", "1"), ("nvidia.com/priority", "1")]);

        handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert_eq!(env_value(&container, TASK_PRIORITY_ENV), Some("1"));
    }

    #[test]
    fn invalid_priority_is_an_error() {
        let handler = NvidiaDevices::new(NvidiaConfig::default());
        let mut container = container_with_limits(&[("nvidia.com/priority", "high")]);

        let report = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect_err("should fail");

        assert!(matches!(
            report.current_context(),
            DeviceError::InvalidQuantity { .. }
        ));
    }

    #[test]
    fn overwrite_env_hides_devices_from_unclaimed_containers() {
        let config = NvidiaConfig {
            overwrite_env: true,
            ..Default::default()
        };
        let handler = NvidiaDevices::new(config);
        let mut container = Container {
            name: "sidecar".to_string(),
            ..Default::default()
        };

        let claimed = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert!(!claimed);
        assert_eq!(env_value(&container, VISIBLE_DEVICES_ENV), Some("none"));
    }

    #[test]
    fn unrelated_container_is_untouched() {
        let handler = NvidiaDevices::new(NvidiaConfig::default());
        let mut container = container_with_limits(&[("cpu", "2")]);
        let before = container.clone();

        let claimed = handler
            .mutate_admission(&mut container, &Pod::default())
            .expect("should succeed");

        assert!(!claimed);
        assert_eq!(container, before);
    }
}
