//! 服务标识
//!
//! 服务标识是描述能力契约的不透明令牌，与具体实现无关。

use crate::resolver::ServiceResolver;
use infrastructure_common::BoxError;
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 服务键，在同一注册表内唯一
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey(Arc<str>);

impl ServiceKey {
    /// 创建新的服务键
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.0)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ServiceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// 服务标识自带的默认工厂
pub type DefaultFactory<T> = fn(&dyn ServiceResolver) -> Result<Arc<T>, BoxError>;

/// 类型化的服务标识
///
/// 可以在常量上下文中创建，通常声明为 `static`：
///
/// ```rust
/// use di_abstractions::ServiceIdentifier;
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// pub static CLOCK: ServiceIdentifier<dyn Clock> = ServiceIdentifier::new("clock");
/// assert_eq!(CLOCK.key(), "clock");
/// ```
pub struct ServiceIdentifier<T: ?Sized + 'static> {
    key: &'static str,
    factory: Option<DefaultFactory<T>>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + 'static> ServiceIdentifier<T> {
    /// 创建新的服务标识
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            factory: None,
            _marker: PhantomData,
        }
    }

    /// 创建带默认工厂的服务标识
    pub const fn with_factory(key: &'static str, factory: DefaultFactory<T>) -> Self {
        Self {
            key,
            factory: Some(factory),
            _marker: PhantomData,
        }
    }

    pub const fn key(&self) -> &'static str {
        self.key
    }

    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(self.key)
    }

    pub fn default_factory(&self) -> Option<DefaultFactory<T>> {
        self.factory
    }
}

impl<T: ?Sized + 'static> Clone for ServiceIdentifier<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + 'static> Copy for ServiceIdentifier<T> {}

impl<T: ?Sized + 'static> fmt::Debug for ServiceIdentifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceIdentifier")
            .field("key", &self.key)
            .field("contract", &std::any::type_name::<T>())
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// 实现类型到契约类型的转换
///
/// 每个类型都自动实现了 `Implements<Self>`；对 trait 对象契约，
/// 使用 [`implements!`](crate::implements) 宏声明。
pub trait Implements<T: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<T>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 声明实现类型满足一个或多个 trait 对象契约
///
/// ```rust
/// use di_abstractions::implements;
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// pub struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// implements!(English: dyn Greeter);
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty : $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $ty {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}
