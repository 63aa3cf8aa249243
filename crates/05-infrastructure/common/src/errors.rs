//! 错误类型定义

use thiserror::Error;

/// 装箱的通用错误类型，用于构造函数和工厂返回的错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("选项验证失败: {key}, 原因: {source}")]
    OptionsValidation {
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("选项绑定失败: {key}, 原因: {source}")]
    OptionsBinding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("选项服务不可用: {source}")]
    ServiceUnavailable {
        #[from]
        source: DependencyError,
    },

    #[error("配置源加载失败: {name}, 原因: {source}")]
    SettingsSource { name: String, source: BoxError },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("服务未注册: {key}")]
    ServiceNotRegistered { key: String },

    #[error("服务注册表已冻结，无法注册: {key}")]
    RegistryFrozen { key: String },

    #[error("检测到循环依赖: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("无效的生命周期引用: 单例服务 {singleton} 不能依赖作用域服务 {scoped}")]
    InvalidLifetimeReference { singleton: String, scoped: String },

    #[error("对象创建失败: {type_name}, 原因: {inner}")]
    ObjectCreate {
        type_name: String,
        #[source]
        inner: BoxError,
    },

    #[error("未声明生命周期: {type_name}，请使用显式的 register_* 方法注册")]
    LifetimeNotDeclared { type_name: String },

    #[error("作用域不匹配: {type_name} 要求 {required}, 实际注册为 {actual}")]
    ScopeMismatch {
        type_name: String,
        required: crate::lifecycle::Lifetime,
        actual: crate::lifecycle::Lifetime,
    },

    #[error("构造函数参数 {index} 不可注入: {type_name}（所有构造函数参数都必须可注入）")]
    NonInjectableParameter { type_name: String, index: usize },

    #[error("服务类型不匹配: {key}, 期望 {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("服务标识没有默认工厂: {key}")]
    MissingFactory { key: String },
}

impl DependencyError {
    /// 创建服务未注册错误
    pub fn not_registered(key: impl Into<String>) -> Self {
        Self::ServiceNotRegistered { key: key.into() }
    }

    /// 将构造函数或工厂返回的错误包装为 [`DependencyError::ObjectCreate`]。
    ///
    /// 嵌套解析产生的依赖注入错误原样返回，不再重复包装。
    pub fn object_create(type_name: impl Into<String>, inner: BoxError) -> Self {
        match inner.downcast::<DependencyError>() {
            Ok(dependency) => *dependency,
            Err(inner) => Self::ObjectCreate {
                type_name: type_name.into(),
                inner,
            },
        }
    }
}

/// 模块加载错误类型
#[derive(Error, Debug)]
pub enum ModuleLoadError {
    #[error("Duplicate module instances: {module}")]
    DuplicateInstances { module: String },

    #[error("Circular dependency detected in modules: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("模块名称冲突: {name} 被不同的模块类型使用 ({first}, {second})")]
    NameConflict {
        name: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("配置类型重复注册: {key}, 模块 {module}（已由 {owner} 注册）")]
    DuplicateConfiguration {
        key: String,
        module: String,
        owner: String,
    },

    #[error("配置类型未注册: {key}")]
    ConfigurationNotFound { key: String },

    #[error("配置类型不匹配: {key}, 期望 {expected}")]
    ConfigurationTypeMismatch { key: String, expected: &'static str },

    #[error("延迟模块解析失败: {source}")]
    DeferredModule {
        #[source]
        source: anyhow::Error,
    },
}

/// 验证错误类型
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("验证失败: {message}")]
    ValidationFailed { message: String },

    #[error("必需字段缺失: {field_name}")]
    RequiredFieldMissing { field_name: String },

    #[error("字段值无效: {field_name}, 值: {value}, 原因: {reason}")]
    InvalidFieldValue {
        field_name: String,
        value: String,
        reason: String,
    },

    #[error("字段值超出范围: {field_name}, 值: {value}, 范围: {range}")]
    ValueOutOfRange {
        field_name: String,
        value: String,
        range: String,
    },
}

impl ValidationError {
    /// 创建新的验证错误
    pub fn new(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// 创建必需字段缺失错误
    pub fn required_field_missing(field_name: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field_name: field_name.into(),
        }
    }

    /// 创建字段值无效错误
    pub fn invalid_field_value(
        field_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            field_name: field_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 创建值超出范围错误
    pub fn value_out_of_range(
        field_name: impl Into<String>,
        value: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self::ValueOutOfRange {
            field_name: field_name.into(),
            value: value.into(),
            range: range.into(),
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ModuleLoadResult<T> = Result<T, ModuleLoadError>;
