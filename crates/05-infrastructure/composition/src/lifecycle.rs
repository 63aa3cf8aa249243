//! 模块生命周期
//!
//! Initialize 阶段通过 [`ModuleInitializer`] 注册配置类型和选项绑定；
//! Configure 阶段每个模块得到一个 [`ModuleConfigurator`]，所有模块共享
//! 同一个配置游标，`next()` 会在返回前先配置后续尚未配置的模块。

use crate::error::{phase_error, LoadError};
use crate::module::ModuleHandle;
use config_abstractions::{OptionsIdentifier, OptionsResolverExt, OptionsService, OptionsType};
use config_impl::{OptionsManager, SettingsCollection, SettingsOptionsProvider};
use di_impl::ServiceCollection;
use infrastructure_common::{empty_settings, ConfigError, ConfigResult, ModuleLoadError, ModuleLoadResult};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// 配置类型标识
///
/// 模块在 Initialize 阶段为配置类型注册回调，依赖它的模块在 Configure
/// 阶段通过 [`ModuleConfigurator::config`] 取得配置 API 对象 `C`。
pub struct ConfigurationType<C> {
    key: &'static str,
    _marker: PhantomData<fn() -> C>,
}

impl<C> ConfigurationType<C> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    pub const fn key(&self) -> &'static str {
        self.key
    }
}

impl<C> fmt::Debug for ConfigurationType<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationType")
            .field("key", &self.key)
            .field("api", &std::any::type_name::<C>())
            .finish()
    }
}

type ConfigurationCallback<C> =
    Arc<dyn Fn(&ModuleConfigurator) -> anyhow::Result<C> + Send + Sync>;

struct ConfigurationEntry {
    owner: String,
    callback: Arc<dyn Any + Send + Sync>,
}

/// 配置类型注册表
#[derive(Default)]
pub(crate) struct ConfigurationRegistry {
    entries: HashMap<&'static str, ConfigurationEntry>,
}

impl ConfigurationRegistry {
    fn register<C: 'static>(
        &mut self,
        key: &'static str,
        owner: &str,
        callback: ConfigurationCallback<C>,
    ) -> ModuleLoadResult<()> {
        if let Some(existing) = self.entries.get(key) {
            return Err(ModuleLoadError::DuplicateConfiguration {
                key: key.to_string(),
                module: owner.to_string(),
                owner: existing.owner.clone(),
            });
        }
        debug!("模块 {} 注册配置类型: {}", owner, key);
        self.entries.insert(
            key,
            ConfigurationEntry {
                owner: owner.to_string(),
                callback: Arc::new(callback),
            },
        );
        Ok(())
    }

    fn lookup<C: 'static>(
        &self,
        key: &'static str,
    ) -> ModuleLoadResult<(&str, ConfigurationCallback<C>)> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| ModuleLoadError::ConfigurationNotFound {
                key: key.to_string(),
            })?;
        let callback = entry
            .callback
            .downcast_ref::<ConfigurationCallback<C>>()
            .cloned()
            .ok_or_else(|| ModuleLoadError::ConfigurationTypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<C>(),
            })?;
        Ok((entry.owner.as_str(), callback))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Initialize 阶段的上下文
pub struct ModuleInitializer<'a> {
    module: &'a str,
    configurations: &'a mut ConfigurationRegistry,
    options: &'a Arc<OptionsManager>,
    settings: &'a Arc<SettingsCollection>,
}

impl<'a> ModuleInitializer<'a> {
    pub(crate) fn new(
        module: &'a str,
        configurations: &'a mut ConfigurationRegistry,
        options: &'a Arc<OptionsManager>,
        settings: &'a Arc<SettingsCollection>,
    ) -> Self {
        Self {
            module,
            configurations,
            options,
            settings,
        }
    }

    /// 当前模块名称
    pub fn module(&self) -> &str {
        self.module
    }

    /// 配置类型注册入口
    pub fn config<'b, C: Send + Sync + 'static>(
        &'b mut self,
        configuration: &ConfigurationType<C>,
    ) -> ConfigurationRegistration<'b, C> {
        ConfigurationRegistration {
            key: configuration.key,
            module: self.module,
            registry: &mut *self.configurations,
            _marker: PhantomData,
        }
    }

    /// 模块配置绑定入口
    pub fn settings(&self) -> SettingsBinder<'_> {
        SettingsBinder {
            module: self.module,
            options: self.options,
            settings: self.settings,
        }
    }
}

/// 配置类型注册
pub struct ConfigurationRegistration<'b, C> {
    key: &'static str,
    module: &'b str,
    registry: &'b mut ConfigurationRegistry,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> ConfigurationRegistration<'_, C> {
    /// 注册配置回调
    ///
    /// 同一个配置类型只能注册一次，重复注册返回
    /// [`ModuleLoadError::DuplicateConfiguration`]。
    pub fn register<F>(self, callback: F) -> ModuleLoadResult<()>
    where
        F: Fn(&ModuleConfigurator) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        let callback: ConfigurationCallback<C> = Arc::new(callback);
        self.registry.register(self.key, self.module, callback)
    }
}

/// 模块配置绑定
pub struct SettingsBinder<'a> {
    module: &'a str,
    options: &'a Arc<OptionsManager>,
    settings: &'a Arc<SettingsCollection>,
}

impl SettingsBinder<'_> {
    /// 当前模块的配置
    pub fn value(&self) -> Value {
        self.settings.for_module(self.module).unwrap_or_else(empty_settings)
    }

    /// 将模块配置（或其中的子节）绑定到选项
    pub fn bind_to_options<T: OptionsType>(&self, options: &OptionsIdentifier<T>, section: Option<&str>) {
        debug!(
            "模块 {} 绑定选项 {} (子节: {})",
            self.module,
            options.key(),
            section.unwrap_or("<全部>")
        );
        self.options.add_options_provider(Arc::new(SettingsOptionsProvider::new(
            options.key(),
            self.module,
            section.map(str::to_string),
            self.settings.clone(),
        )));
    }
}

/// Configure 阶段共享的配置游标
///
/// 所有 `next()` 调用推进同一个游标，游标耗尽后 `next()` 立即返回。
#[derive(Debug, Default)]
pub struct ConfigureCursor {
    position: Mutex<usize>,
    len: usize,
}

impl ConfigureCursor {
    pub fn new(len: usize) -> Self {
        Self {
            position: Mutex::new(0),
            len,
        }
    }

    /// 取出下一个待配置模块的位置
    pub fn advance(&self) -> Option<usize> {
        let mut position = self.position.lock();
        if *position < self.len {
            let current = *position;
            *position += 1;
            Some(current)
        } else {
            None
        }
    }

    pub fn is_exhausted(&self) -> bool {
        *self.position.lock() >= self.len
    }
}

/// Configure 阶段的共享状态
pub(crate) struct ConfigureState {
    pub(crate) modules: Vec<ModuleHandle>,
    pub(crate) services: Arc<ServiceCollection>,
    pub(crate) settings: Arc<SettingsCollection>,
    pub(crate) configurations: ConfigurationRegistry,
    pub(crate) cursor: ConfigureCursor,
}

impl ConfigureState {
    pub(crate) fn new(
        modules: Vec<ModuleHandle>,
        services: Arc<ServiceCollection>,
        settings: Arc<SettingsCollection>,
        configurations: ConfigurationRegistry,
    ) -> Self {
        let cursor = ConfigureCursor::new(modules.len());
        Self {
            modules,
            services,
            settings,
            configurations,
            cursor,
        }
    }

    fn configurator_for(self: &Arc<Self>, module: &str) -> ModuleConfigurator {
        ModuleConfigurator {
            module: Arc::from(module),
            settings: Arc::new(self.settings.for_module(module).unwrap_or_else(empty_settings)),
            state: self.clone(),
        }
    }

    /// 推进游标直到耗尽，依次配置每个模块
    pub(crate) async fn drive(self: &Arc<Self>) -> Result<(), LoadError> {
        while let Some(index) = self.cursor.advance() {
            let handle = &self.modules[index];
            let name = handle.name().to_string();
            let configurator = self.configurator_for(&name);

            debug!("配置模块: {}", name);
            handle
                .module()
                .configure(&configurator)
                .await
                .map_err(|source| {
                    phase_error(source, |source| LoadError::Configure {
                        module: name.clone(),
                        source,
                    })
                })?;
            info!("模块配置完成: {}", name);
        }
        Ok(())
    }
}

/// Configure 阶段模块得到的配置器
#[derive(Clone)]
pub struct ModuleConfigurator {
    module: Arc<str>,
    settings: Arc<Value>,
    state: Arc<ConfigureState>,
}

impl ModuleConfigurator {
    /// 当前模块名称
    pub fn module(&self) -> &str {
        &self.module
    }

    /// 已冻结的服务集合
    pub fn services(&self) -> &Arc<ServiceCollection> {
        &self.state.services
    }

    /// 当前模块的配置
    pub fn settings(&self) -> &Value {
        &self.settings
    }

    /// 将当前模块的配置绑定为具体类型
    pub fn settings_as<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        serde_json::from_value(self.settings.as_ref().clone()).map_err(|source| {
            ConfigError::OptionsBinding {
                key: self.module.to_string(),
                source,
            }
        })
    }

    /// 选项访问
    pub fn options(&self) -> OptionsAccessor<'_> {
        OptionsAccessor {
            services: &self.state.services,
        }
    }

    /// 配置类型访问
    pub fn config(&self) -> ConfigurationAccessor<'_> {
        ConfigurationAccessor { configurator: self }
    }

    /// 先配置后续尚未配置的模块，再返回
    ///
    /// 所有模块共享同一个游标；游标耗尽后立即返回。
    pub async fn next(&self) -> Result<(), LoadError> {
        self.state.drive().await
    }
}

impl fmt::Debug for ModuleConfigurator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfigurator")
            .field("module", &self.module)
            .field("settings", &self.settings)
            .finish()
    }
}

/// 选项访问器
pub struct OptionsAccessor<'a> {
    services: &'a ServiceCollection,
}

impl OptionsAccessor<'_> {
    /// 从容器中的选项服务解析选项
    pub fn get<T: OptionsType>(&self, options: &OptionsIdentifier<T>) -> ConfigResult<T> {
        self.services.get_options(options)
    }
}

/// 配置类型访问器
pub struct ConfigurationAccessor<'a> {
    configurator: &'a ModuleConfigurator,
}

impl ConfigurationAccessor<'_> {
    /// 获取配置 API 对象
    ///
    /// 以拥有该配置类型的模块的配置调用其注册的回调。
    pub fn get<C: Send + Sync + 'static>(
        &self,
        configuration: &ConfigurationType<C>,
    ) -> anyhow::Result<C> {
        let state = &self.configurator.state;
        let (owner, callback) = state.configurations.lookup::<C>(configuration.key)?;
        debug!(
            "模块 {} 获取配置类型 {} (所属模块 {})",
            self.configurator.module, configuration.key, owner
        );
        let owner_configurator = state.configurator_for(owner);
        callback(&owner_configurator)
    }
}
