//! 配置源实现
//!
//! 基于 `config` crate 读取文件和环境变量，统一转换为 `serde_json::Value`。

use config::{Config, Environment, File, FileFormat};
use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 配置源 trait
pub trait SettingsSource: Send + Sync {
    /// 加载配置
    fn load(&self) -> ConfigResult<Value>;

    /// 获取配置源名称
    fn name(&self) -> &str;
}

fn build(name: &str, builder: config::ConfigBuilder<config::builder::DefaultState>) -> ConfigResult<Value> {
    builder
        .build()
        .and_then(|config: Config| config.try_deserialize::<Value>())
        .map_err(|e| ConfigError::SettingsSource {
            name: name.to_string(),
            source: Box::new(e),
        })
}

/// 文件配置源
///
/// 按扩展名识别 TOML、JSON 和 YAML 格式。
#[derive(Debug, Clone)]
pub struct FileSettingsSource {
    path: PathBuf,
    name: String,
    required: bool,
}

impl FileSettingsSource {
    /// 创建新的文件配置源
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("file:{}", path.display()),
            path,
            required: true,
        }
    }

    /// 设置文件是否必须存在
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    fn format(&self) -> ConfigResult<FileFormat> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(FileFormat::Toml),
            Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            other => Err(ConfigError::SettingsSource {
                name: self.name.clone(),
                source: format!("不支持的配置文件格式: {}", other.unwrap_or("<none>")).into(),
            }),
        }
    }
}

impl SettingsSource for FileSettingsSource {
    fn load(&self) -> ConfigResult<Value> {
        debug!("加载配置文件: {}", self.path.display());
        let format = self.format()?;
        let builder = Config::builder()
            .add_source(File::from(self.path.as_path()).format(format).required(self.required));
        build(&self.name, builder)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 环境变量配置源
///
/// `APP__DATABASE__URL=x` 映射为 `{ "database": { "url": "x" } }`。
#[derive(Debug, Clone)]
pub struct EnvironmentSettingsSource {
    prefix: String,
    separator: String,
    name: String,
}

impl EnvironmentSettingsSource {
    /// 创建新的环境变量配置源
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("env:{}", prefix),
            prefix,
            separator: "__".to_string(),
        }
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl SettingsSource for EnvironmentSettingsSource {
    fn load(&self) -> ConfigResult<Value> {
        debug!("加载环境变量配置: 前缀 {}", self.prefix);
        let builder = Config::builder().add_source(
            Environment::with_prefix(&self.prefix)
                .prefix_separator(&self.separator)
                .separator(&self.separator)
                .try_parsing(true),
        );
        build(&self.name, builder)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
