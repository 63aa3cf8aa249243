//! 配置值合并工具
//!
//! 配置以 `serde_json::Value` 表示。`null` 在这里等同于“未定义”。

use serde_json::{Map, Value};

/// 将 `source` 深度合并到 `target`
///
/// - 对象按键递归合并
/// - 数组和标量直接替换
/// - `source` 中的 `null` 值被跳过
pub fn merge_settings(target: &mut Value, source: &Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                if value.is_null() {
                    continue;
                }
                let nested = value.is_object()
                    && target_map.get(key).map_or(false, Value::is_object);
                if nested {
                    if let Some(existing) = target_map.get_mut(key) {
                        merge_settings(existing, value);
                    }
                } else {
                    target_map.insert(key.clone(), strip_nulls(value));
                }
            }
        }
        (target, source) => {
            *target = strip_nulls(source);
        }
    }
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// 用默认值填充未定义的键
///
/// 只填充 `provided` 中缺失或为 `null` 的顶层键，已提供的值从不被覆盖。
/// `provided` 为 `null` 时直接返回默认值，不是对象时原样返回。
pub fn fill_defaults(provided: Value, defaults: &Value) -> Value {
    match (provided, defaults) {
        (Value::Null, defaults) => defaults.clone(),
        (Value::Object(mut map), Value::Object(default_map)) => {
            for (key, value) in default_map {
                if map.get(key).map_or(true, Value::is_null) {
                    map.insert(key.clone(), value.clone());
                }
            }
            Value::Object(map)
        }
        (provided, _) => provided,
    }
}

/// 获取配置中的子节
pub fn section<'a>(settings: &'a Value, name: &str) -> Option<&'a Value> {
    settings.as_object().and_then(|map| map.get(name))
}

/// 空配置对象
pub fn empty_settings() -> Value {
    Value::Object(Map::new())
}
