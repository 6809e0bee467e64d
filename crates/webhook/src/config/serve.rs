use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
pub struct ServeArgs {
    #[arg(
        long,
        env = "WEBHOOK_LISTEN_ADDR",
        default_value = "0.0.0.0:9443",
        help = "Address the admission webhook listens on"
    )]
    pub listen_addr: String,

    #[arg(
        long,
        env = "WEBHOOK_TLS_CERT_FILE",
        value_hint = clap::ValueHint::FilePath,
        requires = "tls_key_file",
        help = "PEM certificate served to the API server; TLS is enabled when both certificate and key are set"
    )]
    pub tls_cert_file: Option<PathBuf>,

    #[arg(
        long,
        env = "WEBHOOK_TLS_KEY_FILE",
        value_hint = clap::ValueHint::FilePath,
        requires = "tls_cert_file",
        help = "PEM private key matching --tls-cert-file"
    )]
    pub tls_key_file: Option<PathBuf>,

    #[arg(
        long,
        env = "SCHEDULER_NAME",
        default_value = "",
        help = "Scheduler assigned to pods that claim an accelerator (empty keeps the pod's scheduler)"
    )]
    pub scheduler_name: String,

    #[arg(
        long,
        env = "RUNTIME_CLASS_NAME",
        default_value = "nvidia",
        help = "Runtime class injected into GPU pods (empty disables injection)"
    )]
    pub runtime_class_name: String,

    #[arg(
        long,
        env = "ENABLE_RUNTIME_CLASS_INJECTION",
        default_value_t = false,
        action = clap::ArgAction::Set,
        help = "Inject the runtime class into pods requesting GPU resources"
    )]
    pub enable_runtime_class_injection: bool,

    #[arg(
        long,
        env = "DEVICE_CONFIG_FILE",
        value_hint = clap::ValueHint::FilePath,
        help = "Path for vendor device configuration, e.g. /config/device-config.yaml"
    )]
    pub device_config_file: Option<PathBuf>,

    #[arg(
        long,
        env = "WEBHOOK_LOG_FILE",
        value_hint = clap::ValueHint::FilePath,
        help = "Mirror logs to a daily rolling file, e.g. /logs/webhook.log"
    )]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_rerouting_and_injection() {
        let args = ServeArgs::try_parse_from(["serve"]).expect("should parse defaults");

        assert_eq!(args.listen_addr, "0.0.0.0:9443");
        assert_eq!(args.scheduler_name, "");
        assert_eq!(args.runtime_class_name, "nvidia");
        assert!(!args.enable_runtime_class_injection);
        assert!(args.tls_cert_file.is_none());
        assert!(args.device_config_file.is_none());
    }

    #[test]
    fn tls_requires_both_files() {
        let result = ServeArgs::try_parse_from(["serve", "--tls-cert-file", "/tls/tls.crt"]);
        assert!(result.is_err(), "certificate without key must be rejected");

        let args = ServeArgs::try_parse_from([
            "serve",
            "--tls-cert-file",
            "/tls/tls.crt",
            "--tls-key-file",
            "/tls/tls.key",
        ])
        .expect("should parse tls pair");
        assert_eq!(args.tls_key_file, Some(PathBuf::from("/tls/tls.key")));
    }
}
