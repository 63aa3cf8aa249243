//! 模块加载器

use crate::collection::ModuleCollection;
use crate::error::{phase_error, LoadError, LoadResult};
use crate::lifecycle::{ConfigurationRegistry, ConfigureState, ModuleInitializer};
use crate::module::ModuleRef;
use crate::resolver::resolve_modules;
use config_impl::{
    EnvironmentSettingsSource, FileSettingsSource, OptionsManager, SettingsCollection,
    SettingsSource,
};
use di_abstractions::ServiceRegistry;
use di_impl::ServiceCollection;
use infrastructure_common::ConfigResult;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

type ServicesCallback = Box<dyn FnOnce(&ServiceCollection) -> anyhow::Result<()> + Send>;

/// 调用方直接提供的配置
struct InlineSettings {
    value: Value,
}

impl SettingsSource for InlineSettings {
    fn load(&self) -> ConfigResult<Value> {
        Ok(self.value.clone())
    }

    fn name(&self) -> &str {
        "inline"
    }
}

/// 模块加载器
///
/// 使用建造者模式收集模块、配置源和额外的服务注册，`load()` 依次执行：
///
/// 1. 按调用顺序加载并合并配置
/// 2. 解析模块依赖并排序
/// 3. 所有模块的 Initialize
/// 4. 所有模块的 ConfigureServices，然后是加载器上的服务注册回调
/// 5. 冻结服务集合
/// 6. 按顺序执行 Configure
///
/// ```rust,no_run
/// use infrastructure_composition::{ModuleDescriptor, ModuleLoader};
///
/// # async fn run() -> Result<(), infrastructure_composition::LoadError> {
/// let modules = ModuleLoader::new()
///     .use_module(ModuleDescriptor::new("app"))
///     .use_settings_file("config/app.toml")
///     .use_environment("APP")
///     .load()
///     .await?;
/// println!("已加载 {} 个模块", modules.len());
/// # Ok(())
/// # }
/// ```
pub struct ModuleLoader {
    modules: Vec<ModuleRef>,
    settings_sources: Vec<Box<dyn SettingsSource>>,
    service_callbacks: Vec<ServicesCallback>,
    logging_config: Option<LoggingConfig>,
}

impl ModuleLoader {
    /// 创建新的模块加载器
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            settings_sources: Vec::new(),
            service_callbacks: Vec::new(),
            logging_config: None,
        }
    }

    /// 加载模块列表并使用给定的配置
    pub async fn load_modules(modules: Vec<ModuleRef>, settings: Value) -> LoadResult<ModuleCollection> {
        Self::new().use_modules(modules).use_settings(settings).load().await
    }

    /// 添加模块
    pub fn use_modules(mut self, modules: impl IntoIterator<Item = ModuleRef>) -> Self {
        self.modules.extend(modules);
        self
    }

    pub fn use_module(mut self, module: impl Into<ModuleRef>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// 添加以模块名称为顶层键的配置
    pub fn use_settings(self, settings: Value) -> Self {
        self.use_settings_source(InlineSettings { value: settings })
    }

    /// 添加配置文件，按扩展名识别 TOML、JSON 和 YAML
    pub fn use_settings_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.use_settings_source(FileSettingsSource::new(path))
    }

    /// 添加环境变量配置源
    pub fn use_environment(self, prefix: impl Into<String>) -> Self {
        self.use_settings_source(EnvironmentSettingsSource::new(prefix))
    }

    /// 添加自定义配置源
    pub fn use_settings_source<S: SettingsSource + 'static>(mut self, source: S) -> Self {
        info!("添加配置源: {}", source.name());
        self.settings_sources.push(Box::new(source));
        self
    }

    /// 在所有模块的 ConfigureServices 之后执行额外的服务注册
    pub fn configure_services<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&ServiceCollection) -> anyhow::Result<()> + Send + 'static,
    {
        self.service_callbacks.push(Box::new(callback));
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 加载所有模块
    pub async fn load(self) -> LoadResult<ModuleCollection> {
        // 只有在明确配置了日志时才初始化，避免测试中重复初始化
        if let Some(config) = &self.logging_config {
            config.initialize()?;
        }
        info!("开始加载模块");

        let settings = Arc::new(SettingsCollection::new());
        for source in &self.settings_sources {
            debug!("读取配置源: {}", source.name());
            settings.merge(&source.load()?);
        }

        let modules = resolve_modules(self.modules).await?;

        let services = Arc::new(ServiceCollection::new());
        let options = Arc::new(OptionsManager::new());
        options.register_into(services.as_ref())?;

        let mut configurations = ConfigurationRegistry::default();
        for handle in &modules {
            let name = handle.name();
            debug!("Initialize: {}", name);
            let mut initializer = ModuleInitializer::new(name, &mut configurations, &options, &settings);
            handle.module().initialize(&mut initializer).map_err(|source| {
                phase_error(source, |source| LoadError::Initialize {
                    module: name.to_string(),
                    source,
                })
            })?;
        }

        for handle in &modules {
            let name = handle.name();
            debug!("ConfigureServices: {}", name);
            handle.module().configure_services(&services).map_err(|source| {
                phase_error(source, |source| LoadError::ConfigureServices {
                    module: name.to_string(),
                    source,
                })
            })?;
        }
        for callback in self.service_callbacks {
            callback(&services).map_err(|source| {
                phase_error(source, |source| LoadError::ConfigureServices {
                    module: "<loader>".to_string(),
                    source,
                })
            })?;
        }

        services.freeze();
        info!("服务注册完成，共 {} 个服务", services.len());

        let state = Arc::new(ConfigureState::new(
            modules.clone(),
            services.clone(),
            settings,
            configurations,
        ));
        state.drive().await?;

        info!("模块加载完成: {} 个模块", modules.len());
        Ok(ModuleCollection::new(modules, services))
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            ..Self::default()
        }
    }

    /// 生产环境日志配置
    pub fn production() -> Self {
        Self {
            show_target: false,
            json_format: true,
            ..Self::default()
        }
    }

    /// 安装全局日志订阅者
    pub fn initialize(&self) -> LoadResult<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| LoadError::Logging {
            message: e.to_string(),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
