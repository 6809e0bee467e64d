use api_types::AdmissionResponse;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use error_stack::Report;
use json_patch::Patch;

use super::errors::AdmissionError;

/// Audit annotation carrying the machine-readable [`OutcomeCause`].
///
/// The API server prefixes audit annotation keys with the webhook name and a
/// `/`, and drops keys that end up with more than one, so this must stay a
/// plain name.
pub const OUTCOME_ANNOTATION: &str = "outcome";

/// Policy reasons for rejecting a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DenyReason {
    /// Structural: the pod declares no containers.
    #[display("pod has no containers")]
    NoContainers,
    /// Consistency: the pod is bound to a node but would be handed to a
    /// different scheduler.
    #[display("pod has node assigned")]
    NodeAssigned,
}

/// Machine-readable cause of an admission outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum OutcomeCause {
    #[display("allowed")]
    Allowed,
    #[display("no-containers")]
    NoContainers,
    #[display("node-assigned")]
    NodeAssigned,
    #[display("decode-failure")]
    DecodeFailure,
    #[display("handler-failure")]
    HandlerFailure,
    #[display("encode-failure")]
    EncodeFailure,
}

/// Result of one admission request: exactly one of allowed, denied or errored.
#[derive(Debug)]
pub enum AdmissionOutcome {
    /// Admitted; `patch` may be empty when nothing changed.
    Allowed { patch: Patch },
    /// Rejected by policy.
    Denied { reason: DenyReason },
    /// The request could not be processed.
    Errored { error: Report<AdmissionError> },
}

impl AdmissionOutcome {
    pub fn allowed(patch: Patch) -> Self {
        Self::Allowed { patch }
    }

    pub fn denied(reason: DenyReason) -> Self {
        Self::Denied { reason }
    }

    pub fn errored(error: Report<AdmissionError>) -> Self {
        Self::Errored { error }
    }

    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn cause(&self) -> OutcomeCause {
        match self {
            Self::Allowed { .. } => OutcomeCause::Allowed,
            Self::Denied {
                reason: DenyReason::NoContainers,
            } => OutcomeCause::NoContainers,
            Self::Denied {
                reason: DenyReason::NodeAssigned,
            } => OutcomeCause::NodeAssigned,
            Self::Errored { error } => error.current_context().cause(),
        }
    }

    /// Encode the outcome as the response half of an admission review.
    ///
    /// Denials are reported with status 403 and reason `Forbidden`; errors
    /// with the error's status code and reason `BadRequest` or
    /// `InternalError`, so callers can tell a policy rejection from a failure.
    pub fn into_response(self, uid: &str) -> AdmissionResponse {
        let cause = self.cause();
        let response = match self {
            Self::Allowed { patch } if patch.0.is_empty() => AdmissionResponse::allowed(uid),
            Self::Allowed { patch } => match serde_json::to_vec(&patch) {
                Ok(bytes) => AdmissionResponse::allowed(uid).with_patch(STANDARD.encode(bytes)),
                Err(e) => {
                    tracing::error!("Failed to serialize patch: {e}");
                    return AdmissionResponse::rejected(
                        uid,
                        500,
                        "InternalError",
                        format!("failed to serialize patch: {e}"),
                    )
                    .with_audit_annotation(
                        OUTCOME_ANNOTATION,
                        OutcomeCause::EncodeFailure.to_string(),
                    );
                }
            },
            Self::Denied { reason } => {
                AdmissionResponse::rejected(uid, 403, "Forbidden", reason.to_string())
            }
            Self::Errored { error } => {
                let code = error.current_context().status_code();
                let reason = if code == 400 {
                    "BadRequest"
                } else {
                    "InternalError"
                };
                AdmissionResponse::rejected(uid, code, reason, format!("{error:#}"))
            }
        };

        response.with_audit_annotation(OUTCOME_ANNOTATION, cause.to_string())
    }
}
