use anyhow::Context;
use anyhow::Result;
use serde::Serialize;

use crate::config::DeviceConfig;
use crate::config::ServeArgs;
use crate::config::WebhookConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EffectiveConfig {
    webhook: WebhookConfig,
    devices: DeviceConfig,
}

/// Render the configuration `serve` would run with.
pub fn render_config(args: &ServeArgs) -> Result<String> {
    let devices = DeviceConfig::load(args.device_config_file.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load device config: {e:?}"))?;
    let effective = EffectiveConfig {
        webhook: WebhookConfig::from(args),
        devices,
    };
    serde_yaml::to_string(&effective).context("serialize effective config failed")
}

pub fn run_print_config(args: ServeArgs) -> Result<()> {
    print!("{}", render_config(&args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    #[test]
    fn renders_flags_and_device_file() {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        file.write_all(b"nvidia:\n  defaultGpuNum: 2\n")
            .expect("should write config");
        let path = file.path().to_string_lossy().to_string();
        let args = ServeArgs::try_parse_from([
            "print-config",
            "--scheduler-name",
            "gpu-scheduler",
            "--device-config-file",
            &path,
        ])
        .expect("should parse args");

        let rendered = render_config(&args).expect("should render");

        assert!(rendered.contains("schedulerName: gpu-scheduler"));
        assert!(rendered.contains("defaultGpuNum: 2"));
    }

    #[test]
    fn missing_device_file_is_an_error() {
        let args = ServeArgs::try_parse_from([
            "print-config",
            "--device-config-file",
            "/nonexistent/device-config.yaml",
        ])
        .expect("should parse args");

        assert!(render_config(&args).is_err());
    }
}
