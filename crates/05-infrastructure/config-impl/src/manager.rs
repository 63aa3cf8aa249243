//! 选项管理器实现

use config_abstractions::{OptionsProvider, OptionsService, OptionsTransform, OPTIONS_SERVICE};
use dashmap::DashMap;
use di_abstractions::{ServiceFactory, ServiceRegistry};
use infrastructure_common::{fill_defaults, ConfigResult, DependencyResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// 选项管理器
///
/// 持有选项提供者栈和每个选项键的变换链。
#[derive(Default)]
pub struct OptionsManager {
    /// 选项提供者，按注册顺序保存
    providers: RwLock<Vec<Arc<dyn OptionsProvider>>>,
    /// 选项变换链
    transforms: DashMap<String, Vec<OptionsTransform>>,
}

impl OptionsManager {
    /// 创建新的选项管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取选项提供者数量
    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }

    /// 将选项管理器以单例注册到容器的 [`OPTIONS_SERVICE`] 下
    pub fn register_into<R>(self: &Arc<Self>, registry: &R) -> DependencyResult<()>
    where
        R: ServiceRegistry + ?Sized,
    {
        let manager = self.clone();
        registry.register_singleton(
            &OPTIONS_SERVICE,
            ServiceFactory::new(move |_| Ok(manager.clone() as Arc<dyn OptionsService>))
                .named("OptionsManager"),
        )
    }

    fn provided_value(&self, key: &str) -> ConfigResult<Option<Value>> {
        let providers = self.providers.read().clone();
        for provider in providers.iter().rev() {
            if let Some(value) = provider.provide(key)? {
                // null 视为未提供，继续询问更早的提供者
                if value.is_null() {
                    continue;
                }
                trace!("选项 {} 由提供者 {} 提供", key, provider.name());
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl OptionsService for OptionsManager {
    fn add_options_provider(&self, provider: Arc<dyn OptionsProvider>) {
        debug!("注册选项提供者: {}", provider.name());
        self.providers.write().push(provider);
    }

    fn add_options_transform(&self, key: &str, transform: OptionsTransform) {
        debug!("注册选项变换: {}", key);
        self.transforms.entry(key.to_string()).or_default().push(transform);
    }

    fn options_value(&self, key: &str, defaults: &Value) -> ConfigResult<Value> {
        let provided = self.provided_value(key)?.unwrap_or(Value::Null);
        let mut value = fill_defaults(provided, defaults);

        let transforms = self
            .transforms
            .get(key)
            .map(|chain| chain.value().clone())
            .unwrap_or_default();
        for transform in transforms {
            value = transform(value)?;
        }
        Ok(value)
    }
}

impl fmt::Debug for OptionsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsManager")
            .field("providers", &self.provider_count())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}
