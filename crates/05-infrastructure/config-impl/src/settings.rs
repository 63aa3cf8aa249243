//! 模块配置存储

use infrastructure_common::{empty_settings, merge_settings, section};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

/// 模块配置集合
///
/// 以模块名称为顶层键的 JSON 对象。多次合并时对象递归合并，
/// 数组和标量直接替换，`null` 被视为未定义而跳过。
#[derive(Debug)]
pub struct SettingsCollection {
    root: RwLock<Value>,
}

impl SettingsCollection {
    /// 创建空的配置集合
    pub fn new() -> Self {
        Self {
            root: RwLock::new(empty_settings()),
        }
    }

    /// 从已有配置创建
    pub fn from_value(settings: Value) -> Self {
        let collection = Self::new();
        collection.merge(&settings);
        collection
    }

    /// 合并新的配置
    pub fn merge(&self, settings: &Value) {
        debug!("合并模块配置");
        merge_settings(&mut self.root.write(), settings);
    }

    /// 获取模块的配置，模块没有配置时返回 `None`
    pub fn for_module(&self, module: &str) -> Option<Value> {
        section(&self.root.read(), module).cloned()
    }

    /// 获取模块配置中的子节
    pub fn module_section(&self, module: &str, name: &str) -> Option<Value> {
        let root = self.root.read();
        section(&root, module)
            .and_then(|settings| section(settings, name))
            .cloned()
    }

    /// 当前配置的快照
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }
}

impl Default for SettingsCollection {
    fn default() -> Self {
        Self::new()
    }
}
