//! Shared API type definitions
//!
//! This crate contains the `admission.k8s.io/v1` wire types exchanged between
//! the Kubernetes API server and the GPU admission webhook. Only the fields the
//! webhook reads or writes are modelled; unknown fields are ignored on input.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// API version of the admission review protocol served by the webhook.
pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";

/// Kind of the admission review envelope.
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// Envelope sent by the API server and echoed back with a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

fn default_api_version() -> String {
    ADMISSION_API_VERSION.to_string()
}

fn default_kind() -> String {
    ADMISSION_REVIEW_KIND.to_string()
}

impl AdmissionReview {
    /// Wrap a response into a review envelope of the given API version.
    pub fn from_response(api_version: impl Into<String>, response: AdmissionResponse) -> Self {
        Self {
            api_version: api_version.into(),
            kind: ADMISSION_REVIEW_KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

/// Group/version/kind of the object under admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
}

/// Resource operation being admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Connect => write!(f, "CONNECT"),
        }
    }
}

/// The request half of an admission review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Identifier echoed back in the response
    pub uid: String,
    /// Kind of the object being admitted
    #[serde(default)]
    pub kind: GroupVersionKind,
    /// Object name, empty when the name is generated server-side
    #[serde(default)]
    pub name: String,
    /// Object namespace
    #[serde(default)]
    pub namespace: String,
    pub operation: Operation,
    /// Raw object as submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Patch encoding understood by the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    JsonPatch,
}

/// Status attached to a rejected admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionStatus {
    pub code: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// The response half of an admission review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionStatus>,
    /// Base64 encoded patch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audit_annotations: BTreeMap<String, String>,
}

impl AdmissionResponse {
    /// An allowed response without a patch.
    pub fn allowed(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            ..Default::default()
        }
    }

    /// A rejected response carrying a status code, a reason and a message.
    pub fn rejected(
        uid: impl Into<String>,
        code: u16,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            allowed: false,
            status: Some(AdmissionStatus {
                code,
                message: message.into(),
                reason: reason.into(),
            }),
            ..Default::default()
        }
    }

    /// Attach an already base64 encoded JSON patch.
    pub fn with_patch(mut self, encoded_patch: String) -> Self {
        self.patch = Some(encoded_patch);
        self.patch_type = Some(PatchType::JsonPatch);
        self
    }

    /// Attach an audit annotation.
    pub fn with_audit_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.audit_annotations.insert(key.into(), value.into());
        self
    }
}
