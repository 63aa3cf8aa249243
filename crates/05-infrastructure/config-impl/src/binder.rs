//! 模块配置到选项的绑定

use crate::settings::SettingsCollection;
use config_abstractions::OptionsProvider;
use infrastructure_common::ConfigResult;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// 从模块配置提供选项的提供者
///
/// 只响应绑定的选项键：有子节名称时提供模块配置中的该子节，
/// 否则提供整个模块配置。
#[derive(Debug, Clone)]
pub struct SettingsOptionsProvider {
    options_key: String,
    module: String,
    section: Option<String>,
    settings: Arc<SettingsCollection>,
    name: String,
}

impl SettingsOptionsProvider {
    pub fn new(
        options_key: impl Into<String>,
        module: impl Into<String>,
        section: Option<String>,
        settings: Arc<SettingsCollection>,
    ) -> Self {
        let options_key = options_key.into();
        let module = module.into();
        let name = match &section {
            Some(section) => format!("settings:{}.{}", module, section),
            None => format!("settings:{}", module),
        };
        Self {
            options_key,
            module,
            section,
            settings,
            name,
        }
    }
}

impl OptionsProvider for SettingsOptionsProvider {
    fn provide(&self, key: &str) -> ConfigResult<Option<Value>> {
        if key != self.options_key {
            return Ok(None);
        }
        let value = match &self.section {
            Some(section) => self.settings.module_section(&self.module, section),
            None => self.settings.for_module(&self.module),
        };
        trace!("{} 提供选项 {}: {}", self.name, key, value.is_some());
        Ok(value.filter(|value| !value.is_null()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
