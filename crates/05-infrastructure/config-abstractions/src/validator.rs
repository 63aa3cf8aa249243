//! 选项验证抽象接口

use infrastructure_common::{ValidationError, ValidationResult};
use serde_json::Value;
use std::fmt;

/// 选项验证器 trait
///
/// `options` 是反序列化后的选项，`raw` 是合并默认值并应用变换后的原始值。
pub trait OptionsValidator<T>: Send + Sync {
    /// 验证选项
    fn validate(&self, options: &T, raw: &Value) -> ValidationResult<()>;

    /// 获取验证器名称
    fn name(&self) -> &str;
}

/// 必需属性验证器
///
/// 任一属性缺失或为 `null` 时验证失败。
#[derive(Debug, Clone)]
pub struct RequiredProperties {
    properties: Vec<String>,
}

impl RequiredProperties {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}

impl<T> OptionsValidator<T> for RequiredProperties {
    fn validate(&self, _options: &T, raw: &Value) -> ValidationResult<()> {
        for property in &self.properties {
            match raw.get(property) {
                None | Some(Value::Null) => {
                    return Err(ValidationError::required_field_missing(property.as_str()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "required"
    }
}

/// 基于闭包的验证器
pub struct FnValidator<F> {
    name: String,
    check: F,
}

impl<F> FnValidator<F> {
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("name", &self.name).finish()
    }
}

impl<T, F> OptionsValidator<T> for FnValidator<F>
where
    F: Fn(&T) -> ValidationResult<()> + Send + Sync,
{
    fn validate(&self, options: &T, _raw: &Value) -> ValidationResult<()> {
        (self.check)(options)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
