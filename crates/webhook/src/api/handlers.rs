use std::sync::Arc;

use api_types::AdmissionResponse;
use api_types::AdmissionReview;
use api_types::ADMISSION_API_VERSION;
use error_stack::Report;
use poem::handler;
use poem::web::Data;
use poem::web::Json;
use tracing::debug;
use tracing::warn;

use crate::admission::AdmissionError;
use crate::admission::AdmissionOutcome;
use crate::admission::PodMutator;

/// Kind of the only object the webhook mutates.
const POD_KIND: &str = "Pod";

/// Admit a pod through the mutating webhook.
///
/// Reviews for other kinds are allowed unchanged. An envelope that cannot be
/// decoded, or that carries no request, is answered with an errored review
/// (status 400) rather than a bare HTTP error.
#[handler]
pub async fn mutate(
    Data(mutator): Data<&Arc<PodMutator>>,
    body: Vec<u8>,
) -> Json<AdmissionReview> {
    let review = match serde_json::from_slice::<AdmissionReview>(&body) {
        Ok(review) => review,
        Err(e) => {
            warn!("Failed to decode admission review: {e}");
            return Json(bad_request(
                ADMISSION_API_VERSION.to_string(),
                format!("invalid admission review: {e}"),
            ));
        }
    };

    let Some(request) = review.request else {
        warn!("Admission review carries no request");
        return Json(bad_request(
            review.api_version,
            "admission review carries no request".to_string(),
        ));
    };

    let response = if request.kind.kind == POD_KIND {
        mutator.handle(&request).into_response(&request.uid)
    } else {
        debug!(
            kind = %request.kind.kind,
            uid = %request.uid,
            "Allowing non-pod object unchanged"
        );
        AdmissionResponse::allowed(&request.uid)
    };

    Json(AdmissionReview::from_response(review.api_version, response))
}

fn bad_request(api_version: String, reason: String) -> AdmissionReview {
    let outcome = AdmissionOutcome::errored(Report::new(AdmissionError::DecodeFailed { reason }));
    AdmissionReview::from_response(api_version, outcome.into_response(""))
}

/// Liveness probe.
#[handler]
pub fn healthz() -> &'static str {
    "ok"
}
