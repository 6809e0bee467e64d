use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Pod;
use tracing::error;
use tracing::warn;

use super::classifier::is_privileged;
use super::errors::AdmissionError;
use crate::device::DeviceRegistry;

/// Run every registered device handler against every non-privileged container.
///
/// Returns whether any handler claimed a resource anywhere in the pod. The
/// first handler error aborts the whole pod; containers already rewritten are
/// discarded together with the pod by the caller.
///
/// # Errors
///
/// - [`AdmissionError::DeviceHandlerFailed`] if a handler fails
pub fn mutate_containers(
    pod: &mut Pod,
    devices: &DeviceRegistry,
) -> Result<bool, Report<AdmissionError>> {
    // handlers see the pod as it stood before any container was rewritten
    let snapshot = pod.clone();
    let Some(spec) = pod.spec.as_mut() else {
        return Ok(false);
    };

    let mut claimed = false;
    for container in spec.containers.iter_mut() {
        if is_privileged(container) {
            warn!(
                container = %container.name,
                "Skipping device mutation for privileged container"
            );
            continue;
        }

        for handler in devices.iter() {
            let found = handler
                .mutate_admission(container, &snapshot)
                .change_context_lazy(|| AdmissionError::DeviceHandlerFailed {
                    vendor: handler.vendor().to_string(),
                    container: container.name.clone(),
                })
                .inspect_err(|e| error!("validating pod failed: {e:?}"))?;
            claimed |= found;
        }
    }

    Ok(claimed)
}
