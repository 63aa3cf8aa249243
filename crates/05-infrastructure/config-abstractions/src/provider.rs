//! 选项提供者抽象接口

use infrastructure_common::ConfigResult;
use serde_json::Value;
use std::collections::HashMap;

/// 选项提供者 trait
///
/// 按选项键提供原始选项值。返回 `Ok(None)` 表示该提供者不认识这个键，
/// 选项服务会继续询问更早注册的提供者。
pub trait OptionsProvider: Send + Sync {
    /// 获取选项值
    fn provide(&self, key: &str) -> ConfigResult<Option<Value>>;

    /// 获取提供者名称
    fn name(&self) -> &str;
}

/// 内存选项提供者
///
/// 持有固定的 `{ 选项键 -> 值 }` 映射。
#[derive(Debug, Clone, Default)]
pub struct MemoryOptionsProvider {
    name: String,
    values: HashMap<String, Value>,
}

impl MemoryOptionsProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    /// 设置某个选项键的值
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl OptionsProvider for MemoryOptionsProvider {
    fn provide(&self, key: &str) -> ConfigResult<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
