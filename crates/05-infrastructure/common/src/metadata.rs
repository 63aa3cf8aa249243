//! 元数据定义
//!
//! 提供服务和实现类型的元数据信息

use crate::lifecycle::Lifetime;
use std::any::TypeId;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称（不含模块路径）
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        Self {
            name: short_type_name(full).to_string(),
            id: TypeId::of::<T>(),
            module_path: full.to_string(),
        }
    }

    /// 获取简短的类型名称
    pub fn short_name(&self) -> &str {
        &self.name
    }
}

/// 去掉模块路径的类型名，保留泛型参数
pub fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// 服务注册描述符
///
/// 用于注册表的内省与日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// 服务键
    pub key: String,
    /// 注册的生命周期
    pub lifetime: Lifetime,
    /// 实现类型名称
    pub implementation: String,
    /// 是否已经创建了缓存实例
    pub activated: bool,
}
