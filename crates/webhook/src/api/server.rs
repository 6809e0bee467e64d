use std::path::PathBuf;
use std::sync::Arc;

use error_stack::Report;
use error_stack::ResultExt;
use poem::get;
use poem::listener::BoxListener;
use poem::listener::Listener;
use poem::listener::RustlsCertificate;
use poem::listener::RustlsConfig;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::post;
use poem::Endpoint;
use poem::EndpointExt;
use poem::Route;
use poem::Server;
use tokio::sync::oneshot;
use tracing::error;
use tracing::info;

use super::errors::ApiError;
use super::handlers::healthz;
use super::handlers::mutate;
use crate::admission::PodMutator;

/// PEM files served when the webhook terminates TLS itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl TlsFiles {
    fn load(&self) -> Result<RustlsConfig, Report<ApiError>> {
        let cert = std::fs::read(&self.cert).change_context_lazy(|| ApiError::TlsConfig {
            reason: format!("cannot read certificate {}", self.cert.display()),
        })?;
        let key = std::fs::read(&self.key).change_context_lazy(|| ApiError::TlsConfig {
            reason: format!("cannot read private key {}", self.key.display()),
        })?;
        Ok(RustlsConfig::new().fallback(RustlsCertificate::new().cert(cert).key(key)))
    }
}

/// Routes served by the webhook.
pub fn routes(mutator: Arc<PodMutator>) -> impl Endpoint {
    Route::new()
        .at("/webhook", post(mutate))
        .at("/healthz", get(healthz))
        .data(mutator)
        .with(Tracing)
}

/// HTTP(S) server exposing the admission webhook
pub struct ApiServer {
    listen_addr: String,
    tls: Option<TlsFiles>,
    mutator: Arc<PodMutator>,
}

impl ApiServer {
    pub fn new(listen_addr: String, tls: Option<TlsFiles>, mutator: Arc<PodMutator>) -> Self {
        Self {
            listen_addr,
            tls,
            mutator,
        }
    }

    fn listener(&self) -> Result<BoxListener, Report<ApiError>> {
        let listener = TcpListener::bind(self.listen_addr.clone());
        match &self.tls {
            Some(files) => Ok(listener.rustls(files.load()?).boxed()),
            None => Ok(listener.boxed()),
        }
    }

    /// Start the webhook server
    ///
    /// # Errors
    ///
    /// - [`ApiError::TlsConfig`] if the certificate or key cannot be read
    /// - [`ApiError::ServerError`] if the server fails to start or bind to the address
    pub async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<(), Report<ApiError>> {
        info!(
            tls = self.tls.is_some(),
            "Starting admission webhook on {}", self.listen_addr
        );

        let listener = self.listener()?;
        let app = routes(self.mutator);
        let server = Server::new(listener);

        tokio::select! {
            result = server.run(app) => {
                match result {
                    Ok(()) => {
                        info!("Webhook server stopped normally");
                        Ok(())
                    }
                    Err(e) => {
                        error!("Webhook server failed: {e}");
                        Err(Report::new(ApiError::ServerError {
                            message: format!("Server failed: {e}"),
                        }))
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("Webhook server shutdown requested");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use similar_asserts::assert_eq;

    use super::*;
    use crate::config::WebhookConfig;
    use crate::device::DeviceRegistry;

    fn mutator() -> Arc<PodMutator> {
        Arc::new(PodMutator::new(
            Arc::new(WebhookConfig::default()),
            Arc::new(DeviceRegistry::new()),
        ))
    }

    #[test]
    fn api_server_can_be_created() {
        let server = ApiServer::new("127.0.0.1:9443".to_string(), None, mutator());

        assert_eq!(server.listen_addr, "127.0.0.1:9443");
        assert!(server.tls.is_none());
    }

    #[test]
    fn missing_certificate_is_a_tls_error() {
        let files = TlsFiles {
            cert: PathBuf::from("/nonexistent/tls.crt"),
            key: PathBuf::from("/nonexistent/tls.key"),
        };

        let Err(report) = files.load() else {
            panic!("expected TLS error");
        };
        assert!(matches!(
            report.current_context(),
            ApiError::TlsConfig { reason } if reason.contains("tls.crt")
        ));
    }

    #[test]
    fn missing_key_is_a_tls_error() {
        let mut cert = tempfile::NamedTempFile::new().expect("should create temp file");
        cert.write_all(b"-----BEGIN CERTIFICATE-----\n")
            .expect("should write cert");
        let files = TlsFiles {
            cert: cert.path().to_path_buf(),
            key: PathBuf::from("/nonexistent/tls.key"),
        };

        let Err(report) = files.load() else {
            panic!("expected TLS error");
        };
        assert!(matches!(
            report.current_context(),
            ApiError::TlsConfig { reason } if reason.contains("tls.key")
        ));
    }

    #[tokio::test]
    async fn server_stops_on_shutdown_signal() {
        let server = ApiServer::new("127.0.0.1:0".to_string(), None, mutator());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        shutdown_tx.send(()).expect("should send shutdown signal");

        let result = server.run(shutdown_rx).await;
        assert!(result.is_ok(), "shutdown should stop the server cleanly");
    }
}
