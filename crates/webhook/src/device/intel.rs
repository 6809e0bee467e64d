use error_stack::Report;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::api::core::v1::Pod;

use super::count_limit_claimed;
use super::DeviceError;
use super::DeviceHandler;
use crate::config::IntelConfig;

/// Intel GPUs (`intel.com/gpu`).
#[derive(Debug, Clone)]
pub struct IntelDevices {
    config: IntelConfig,
}

impl IntelDevices {
    pub fn new(config: IntelConfig) -> Self {
        Self { config }
    }
}

impl DeviceHandler for IntelDevices {
    fn vendor(&self) -> &'static str {
        "Intel"
    }

    fn resource_names(&self) -> Vec<String> {
        vec![self.config.resource_count_name.clone()]
    }

    fn mutate_admission(
        &self,
        container: &mut Container,
        _pod: &Pod,
    ) -> Result<bool, Report<DeviceError>> {
        count_limit_claimed(container, &self.config.resource_count_name)
    }
}
