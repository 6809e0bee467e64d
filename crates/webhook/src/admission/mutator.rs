use std::sync::Arc;

use api_types::AdmissionRequest;
use error_stack::Report;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::classifier::AcceleratorResources;
use super::dispatcher::mutate_containers;
use super::errors::AdmissionError;
use super::outcome::AdmissionOutcome;
use super::outcome::DenyReason;
use super::patch::create_patch;
use super::patch::decode_pod;
use super::runtime_class::apply_runtime_class;
use crate::config::WebhookConfig;
use crate::device::DeviceRegistry;

/// Mutates pods under admission so that shared GPU allocation can be enforced
/// downstream.
///
/// Holds only read-only state; one instance serves all concurrent requests.
#[derive(Debug, Clone)]
pub struct PodMutator {
    config: Arc<WebhookConfig>,
    devices: Arc<DeviceRegistry>,
    resources: Arc<AcceleratorResources>,
}

impl PodMutator {
    /// The accelerator vocabulary is taken from `devices`, so renamed vendor
    /// resources drive runtime-class injection the same way they drive
    /// device mutation.
    pub fn new(config: Arc<WebhookConfig>, devices: Arc<DeviceRegistry>) -> Self {
        let resources = Arc::new(AcceleratorResources::from_registry(&devices));
        Self {
            config,
            devices,
            resources,
        }
    }

    /// Admit one pod.
    ///
    /// Decodes the pod, rejects pods without containers, injects the runtime
    /// class, runs the device handlers over every container and, when any of
    /// them claimed a resource, hands the pod to the configured scheduler.
    /// The resulting patch is computed against the decoded original.
    #[tracing::instrument(
        skip_all,
        fields(namespace = %request.namespace, name = %request.name, uid = %request.uid)
    )]
    pub fn handle(&self, request: &AdmissionRequest) -> AdmissionOutcome {
        let Some(raw) = request.object.as_ref() else {
            error!("Failed to decode request: missing object");
            return AdmissionOutcome::errored(Report::new(AdmissionError::DecodeFailed {
                reason: "admission request carries no object".to_string(),
            }));
        };

        let original = match decode_pod(raw) {
            Ok(pod) => pod,
            Err(e) => {
                error!("Failed to decode request: {e:?}");
                return AdmissionOutcome::errored(e);
            }
        };

        let container_count = original.spec.as_ref().map_or(0, |spec| spec.containers.len());
        if container_count == 0 {
            warn!("Denying admission as pod has no containers");
            return AdmissionOutcome::denied(DenyReason::NoContainers);
        }

        info!("Processing admission hook for pod");

        let mut pod = original.clone();
        apply_runtime_class(&mut pod, &self.config, &self.resources);

        let has_resource = match mutate_containers(&mut pod, &self.devices) {
            Ok(found) => found,
            Err(e) => return AdmissionOutcome::errored(e),
        };

        if !has_resource {
            info!("Allowing admission for pod: no resource found");
        } else if !self.config.scheduler_name.is_empty() {
            if let Some(spec) = pod.spec.as_mut() {
                if spec.node_name.as_deref().is_some_and(|node| !node.is_empty()) {
                    info!("Pod already has node assigned");
                    return AdmissionOutcome::denied(DenyReason::NodeAssigned);
                }
                spec.scheduler_name = Some(self.config.scheduler_name.clone());
            }
        }

        match create_patch(&original, &pod) {
            Ok(patch) => AdmissionOutcome::allowed(patch),
            Err(e) => {
                error!("Failed to marshal pod, error: {e:?}");
                AdmissionOutcome::errored(e)
            }
        }
    }
}
