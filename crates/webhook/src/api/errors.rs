use core::error::Error;

/// API errors
#[derive(Debug, derive_more::Display)]
pub enum ApiError {
    #[display("Server error: {message}")]
    ServerError { message: String },
    #[display("Invalid TLS configuration: {reason}")]
    TlsConfig { reason: String },
}

impl Error for ApiError {}
