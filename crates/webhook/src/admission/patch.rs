use error_stack::Report;
use error_stack::ResultExt;
use json_patch::Patch;
use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;

use super::errors::AdmissionError;

/// Decode the raw admission object into a pod.
///
/// # Errors
///
/// - [`AdmissionError::DecodeFailed`] if the object is not a valid pod
pub fn decode_pod(raw: &serde_json::Value) -> Result<Pod, Report<AdmissionError>> {
    Pod::deserialize(raw).map_err(|e| {
        Report::new(AdmissionError::DecodeFailed {
            reason: e.to_string(),
        })
    })
}

/// Build the JSON patch turning `original` into `mutated`.
///
/// Both sides go through the same serializer, so the patch only contains the
/// fields the webhook changed and applies cleanly to the raw object the pod
/// was decoded from.
///
/// # Errors
///
/// - [`AdmissionError::EncodeFailed`] if either pod cannot be serialized
pub fn create_patch(original: &Pod, mutated: &Pod) -> Result<Patch, Report<AdmissionError>> {
    let original = serde_json::to_value(original).change_context(AdmissionError::EncodeFailed {
        reason: "failed to marshal original pod".to_string(),
    })?;
    let mutated = serde_json::to_value(mutated).change_context(AdmissionError::EncodeFailed {
        reason: "failed to marshal mutated pod".to_string(),
    })?;

    Ok(json_patch::diff(&original, &mutated))
}
