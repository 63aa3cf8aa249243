//! 服务生命周期管理

use std::fmt;

/// 服务生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// 外部提供的实例，容器从不创建也从不释放
    Instance,
    /// 单例模式 - 注册表及其所有子作用域共享一个实例
    Singleton,
    /// 作用域模式 - 每个作用域一个实例，`create_scope` 时重新创建
    Scoped,
    /// 瞬时模式 - 每次解析都创建新实例
    Transient,
}

impl Lifetime {
    /// 该生命周期的实例是否在子作用域之间共享
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Instance | Self::Singleton)
    }

    /// 该生命周期的实例是否被缓存
    pub fn is_cached(self) -> bool {
        !matches!(self, Self::Transient)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "instance",
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

/// 可释放资源 trait
///
/// 作用域释放时，会对其自身创建的作用域服务实例调用 `dispose`。
pub trait Disposable: Send + Sync {
    /// 释放资源
    fn dispose(&self);
}

/// 作用域信息
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    pub id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ScopeInfo {
    /// 创建新作用域
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建根作用域
    pub fn root() -> Self {
        Self::new("root")
    }

    /// 创建子作用域
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", self.name, name.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_lifetimes() {
        assert!(Lifetime::Instance.is_shared());
        assert!(Lifetime::Singleton.is_shared());
        assert!(!Lifetime::Scoped.is_shared());
        assert!(!Lifetime::Transient.is_cached());
    }

    #[test]
    fn child_scope_names_are_nested() {
        let root = ScopeInfo::root();
        let child = root.child("request");
        assert_eq!(child.name, "root.request");
        assert_ne!(root.id, child.id);
    }
}
