use std::sync::Arc;

use anyhow::Result;
use tokio::sync::oneshot;
use utils::logging;
use utils::version;

use crate::admission::PodMutator;
use crate::api::server::TlsFiles;
use crate::api::ApiServer;
use crate::config::DeviceConfig;
use crate::config::ServeArgs;
use crate::config::WebhookConfig;
use crate::device::DeviceRegistry;

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let _guard = logging::init(args.log_file.as_deref());

    tracing::info!("Starting gpu webhook {}", &**version::VERSION);

    let webhook_config = WebhookConfig::from(&args);
    let device_config = DeviceConfig::load(args.device_config_file.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load device config: {e:?}"))?;

    let devices = DeviceRegistry::from_config(&device_config);
    tracing::info!(
        vendors = ?devices.vendors(),
        scheduler = %webhook_config.scheduler_name,
        runtime_class_injection = webhook_config.enable_runtime_class_injection,
        "Registered device handlers"
    );

    let mutator = Arc::new(PodMutator::new(
        Arc::new(webhook_config),
        Arc::new(devices),
    ));
    let tls = match (args.tls_cert_file, args.tls_key_file) {
        (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
        _ => None,
    };
    let server = ApiServer::new(args.listen_addr, tls, mutator);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    spawn_signal_handler(shutdown_tx)?;

    server
        .run(shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!("Webhook server failed: {e:?}"))?;

    tracing::info!("Gpu webhook stopped");
    Ok(())
}

/// Fire `shutdown_tx` on the first SIGTERM or SIGINT.
fn spawn_signal_handler(shutdown_tx: oneshot::Sender<()>) -> Result<()> {
    use tokio::signal::unix::signal;
    use tokio::signal::unix::SignalKind;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
        }
        // the server may already have exited on its own
        let _ = shutdown_tx.send(());
    });

    Ok(())
}
