use core::error::Error;

use crate::admission::outcome::OutcomeCause;

/// Failures that abort an admission request without a policy decision.
#[derive(Debug, derive_more::Display)]
pub enum AdmissionError {
    #[display("Failed to decode pod: {reason}")]
    DecodeFailed { reason: String },
    #[display("Device handler {vendor} failed for container {container}")]
    DeviceHandlerFailed { vendor: String, container: String },
    #[display("Failed to encode patch: {reason}")]
    EncodeFailed { reason: String },
}

impl Error for AdmissionError {}

impl AdmissionError {
    /// HTTP status classification reported back to the API server.
    pub const fn status_code(&self) -> u16 {
        match self {
            AdmissionError::DecodeFailed { .. } => 400,
            AdmissionError::DeviceHandlerFailed { .. } | AdmissionError::EncodeFailed { .. } => 500,
        }
    }

    pub const fn cause(&self) -> OutcomeCause {
        match self {
            AdmissionError::DecodeFailed { .. } => OutcomeCause::DecodeFailure,
            AdmissionError::DeviceHandlerFailed { .. } => OutcomeCause::HandlerFailure,
            AdmissionError::EncodeFailed { .. } => OutcomeCause::EncodeFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_error_display_formatting() {
        let decode = AdmissionError::DecodeFailed {
            reason: "missing field `spec`".to_string(),
        };
        assert_eq!(decode.to_string(), "Failed to decode pod: missing field `spec`");

        let handler = AdmissionError::DeviceHandlerFailed {
            vendor: "NVIDIA".to_string(),
            container: "main".to_string(),
        };
        assert_eq!(
            handler.to_string(),
            "Device handler NVIDIA failed for container main"
        );
    }

    #[test]
    fn decode_failures_are_client_errors() {
        let decode = AdmissionError::DecodeFailed {
            reason: String::new(),
        };
        let encode = AdmissionError::EncodeFailed {
            reason: String::new(),
        };
        let handler = AdmissionError::DeviceHandlerFailed {
            vendor: String::new(),
            container: String::new(),
        };

        assert_eq!(decode.status_code(), 400);
        assert_eq!(encode.status_code(), 500);
        assert_eq!(handler.status_code(), 500);
        assert_eq!(handler.cause(), OutcomeCause::HandlerFailure);
    }
}
