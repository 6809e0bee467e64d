use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::info;

use super::classifier::has_accelerator_resources;
use super::classifier::AcceleratorResources;
use super::classifier::is_privileged;
use crate::config::WebhookConfig;

/// Whether the configured runtime class should be injected into `pod`.
///
/// Checks run in order and the first failing one decides:
/// 1. injection is enabled
/// 2. the pod does not already name a runtime class
/// 3. no container is privileged (system pods are left alone)
/// 4. some container requests one of `resources`
pub fn should_inject_runtime_class(
    pod: &Pod,
    config: &WebhookConfig,
    resources: &AcceleratorResources,
) -> bool {
    if !config.enable_runtime_class_injection {
        return false;
    }

    let Some(spec) = pod.spec.as_ref() else {
        return false;
    };

    if spec
        .runtime_class_name
        .as_deref()
        .is_some_and(|name| !name.is_empty())
    {
        return false;
    }

    if spec.containers.iter().any(is_privileged) {
        return false;
    }

    spec.containers
        .iter()
        .any(|container| has_accelerator_resources(container, resources))
}

/// Set the pod's runtime class to the configured one.
///
/// Does nothing when the configured name is empty. Returns whether the pod
/// was changed.
pub fn inject_runtime_class(pod: &mut Pod, config: &WebhookConfig) -> bool {
    if config.runtime_class_name.is_empty() {
        return false;
    }
    let Some(spec) = pod.spec.as_mut() else {
        return false;
    };

    spec.runtime_class_name = Some(config.runtime_class_name.clone());
    info!(
        "Injected runtime class '{}' for GPU pod {}/{}",
        config.runtime_class_name,
        pod.namespace().unwrap_or_default(),
        pod.name_any()
    );
    true
}

/// Inject the runtime class when [`should_inject_runtime_class`] approves.
///
/// Idempotent: once injected the pod names a runtime class and later calls
/// short-circuit.
pub fn apply_runtime_class(
    pod: &mut Pod,
    config: &WebhookConfig,
    resources: &AcceleratorResources,
) -> bool {
    should_inject_runtime_class(pod, config, resources) && inject_runtime_class(pod, config)
}
