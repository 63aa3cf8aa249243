//! 选项标识
//!
//! 选项标识描述一个可配置的选项类型：键、默认值以及验证器。
//! 通常声明为 `Lazy` 静态变量：
//!
//! ```rust
//! use config_abstractions::{create_options, OptionsIdentifier};
//! use once_cell::sync::Lazy;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct DatabaseOptions {
//!     pub url: Option<String>,
//!     pub pool_size: u32,
//! }
//!
//! pub static DATABASE_OPTIONS: Lazy<OptionsIdentifier<DatabaseOptions>> = Lazy::new(|| {
//!     create_options("database", DatabaseOptions { url: None, pool_size: 8 }).require(&["url"])
//! });
//!
//! assert_eq!(DATABASE_OPTIONS.key(), "database");
//! ```

use crate::validator::{FnValidator, OptionsValidator, RequiredProperties};
use infrastructure_common::{ConfigError, ConfigResult, ValidationResult};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// 选项类型需要满足的约束
pub trait OptionsType: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> OptionsType for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

struct OptionsInner<T> {
    key: String,
    defaults: Value,
    validators: RwLock<Vec<Arc<dyn OptionsValidator<T>>>>,
}

/// 类型化的选项标识
pub struct OptionsIdentifier<T> {
    inner: Arc<OptionsInner<T>>,
}

/// 创建带默认值的选项标识
pub fn create_options<T: OptionsType>(key: impl Into<String>, default: T) -> OptionsIdentifier<T> {
    let key = key.into();
    let defaults = serde_json::to_value(&default).unwrap_or_else(|err| {
        warn!("选项 {} 的默认值无法序列化，将不使用默认值: {}", key, err);
        Value::Null
    });
    OptionsIdentifier::with_defaults(key, defaults)
}

impl<T: OptionsType> OptionsIdentifier<T> {
    /// 创建不带默认值的选项标识
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_defaults(key, Value::Null)
    }

    fn with_defaults(key: impl Into<String>, defaults: Value) -> Self {
        Self {
            inner: Arc::new(OptionsInner {
                key: key.into(),
                defaults,
                validators: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// 默认值的原始形式
    pub fn default_value(&self) -> &Value {
        &self.inner.defaults
    }

    /// 默认选项
    pub fn default_options(&self) -> ConfigResult<T> {
        self.bind(self.inner.defaults.clone())
    }

    /// 注册验证器，按注册顺序执行
    pub fn register(self, validator: impl OptionsValidator<T> + 'static) -> Self {
        self.add_validator(validator);
        self
    }

    /// 在已经共享的标识上追加验证器
    pub fn add_validator(&self, validator: impl OptionsValidator<T> + 'static) {
        self.inner.validators.write().push(Arc::new(validator));
    }

    /// 注册闭包验证器
    pub fn validate_with<F>(self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&T) -> ValidationResult<()> + Send + Sync + 'static,
    {
        self.register(FnValidator::new(name, check))
    }

    /// 要求指定属性存在且不为 `null`
    pub fn require(self, properties: &[&str]) -> Self {
        self.register(RequiredProperties::new(properties.iter().copied()))
    }

    /// 验证器数量
    pub fn validator_count(&self) -> usize {
        self.inner.validators.read().len()
    }

    /// 将原始值绑定为选项类型
    pub fn bind(&self, value: Value) -> ConfigResult<T> {
        serde_json::from_value(value).map_err(|source| ConfigError::OptionsBinding {
            key: self.key().to_string(),
            source,
        })
    }

    /// 按注册顺序执行验证器，遇到第一个失败立即返回
    pub fn validate(&self, options: &T, raw: &Value) -> ConfigResult<()> {
        let validators = self.inner.validators.read().clone();
        for validator in validators {
            validator
                .validate(options, raw)
                .map_err(|source| ConfigError::OptionsValidation {
                    key: self.key().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl<T> Clone for OptionsIdentifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for OptionsIdentifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsIdentifier")
            .field("key", &self.inner.key)
            .field("defaults", &self.inner.defaults)
            .field("validators", &self.inner.validators.read().len())
            .finish()
    }
}
