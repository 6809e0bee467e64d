pub mod cli;
pub mod device;
pub mod serve;

use serde::Serialize;

pub use cli::*;
pub use device::*;
pub use serve::*;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadFailed { path: String },
    #[error("Failed to parse configuration: {message}")]
    ParseFailed { message: String },
}

/// Process-wide admission policy, built once at startup and shared read-only
/// by every admission request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Inject [`WebhookConfig::runtime_class_name`] into GPU pods.
    pub enable_runtime_class_injection: bool,
    /// Runtime class injected into GPU pods; empty disables injection.
    pub runtime_class_name: String,
    /// Scheduler assigned to pods claiming an accelerator; empty disables rerouting.
    pub scheduler_name: String,
}

impl From<&ServeArgs> for WebhookConfig {
    fn from(args: &ServeArgs) -> Self {
        Self {
            enable_runtime_class_injection: args.enable_runtime_class_injection,
            runtime_class_name: args.runtime_class_name.clone(),
            scheduler_name: args.scheduler_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn webhook_config_from_serve_args() {
        let args = ServeArgs::try_parse_from([
            "serve",
            "--scheduler-name",
            "gpu-scheduler",
            "--runtime-class-name",
            "nvidia-cdi",
            "--enable-runtime-class-injection",
            "true",
        ])
        .expect("should parse args");

        let config = WebhookConfig::from(&args);
        assert_eq!(
            config,
            WebhookConfig {
                enable_runtime_class_injection: true,
                runtime_class_name: "nvidia-cdi".to_string(),
                scheduler_name: "gpu-scheduler".to_string(),
            }
        );
    }
}
