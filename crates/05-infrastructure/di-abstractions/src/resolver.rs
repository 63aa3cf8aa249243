//! 服务解析器抽象接口
//!
//! 提供依赖解析的核心契约和解析上下文

use crate::identifier::{ServiceIdentifier, ServiceKey};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime};
use std::any::Any;
use std::sync::Arc;

/// 类型擦除后的服务实例
///
/// 内部始终保存一个 `Arc<T>`，其中 `T` 是服务标识的契约类型。
pub type AnyService = Arc<dyn Any + Send + Sync>;

/// 将契约实例包装为类型擦除的服务
pub fn wrap_service<T: ?Sized + Send + Sync + 'static>(service: Arc<T>) -> AnyService {
    Arc::new(service)
}

/// 将类型擦除的服务还原为契约实例
pub fn downcast_service<T: ?Sized + Send + Sync + 'static>(
    key: &str,
    service: &AnyService,
) -> DependencyResult<Arc<T>> {
    service
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| DependencyError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

/// 服务解析器 trait
///
/// 对象安全的底层接口，按服务键解析类型擦除的实例。
pub trait ServiceResolver: Send + Sync {
    /// 按服务键解析实例
    fn resolve_key(&self, key: &ServiceKey) -> DependencyResult<AnyService>;

    /// 检查服务键是否已注册
    fn contains_key(&self, key: &str) -> bool;
}

/// 类型化的解析扩展
pub trait ServiceResolverExt: ServiceResolver {
    /// 解析服务，未注册时返回 [`DependencyError::ServiceNotRegistered`]
    fn get<T: ?Sized + Send + Sync + 'static>(
        &self,
        id: &ServiceIdentifier<T>,
    ) -> DependencyResult<Arc<T>> {
        let service = self.resolve_key(&id.service_key())?;
        downcast_service::<T>(id.key(), &service)
    }

    /// 可选解析：未注册时返回 `None`，构造失败仍然返回错误
    fn try_get<T: ?Sized + Send + Sync + 'static>(
        &self,
        id: &ServiceIdentifier<T>,
    ) -> DependencyResult<Option<Arc<T>>> {
        if self.contains_key(id.key()) {
            self.get(id).map(Some)
        } else {
            Ok(None)
        }
    }

    /// 检查服务是否已注册
    fn has<T: ?Sized + 'static>(&self, id: &ServiceIdentifier<T>) -> bool {
        self.contains_key(id.key())
    }
}

impl<R: ServiceResolver + ?Sized> ServiceResolverExt for R {}

/// 解析链中的一帧
#[derive(Debug, Clone)]
pub struct ResolveFrame {
    pub key: ServiceKey,
    pub implementation: String,
    pub lifetime: Lifetime,
    /// 多个服务键共享同一个实例来源时的来源标识，见 [`ServiceActivator::shared_source`]
    ///
    /// [`ServiceActivator::shared_source`]: crate::ServiceActivator::shared_source
    pub shared_source: Option<usize>,
}

/// 解析上下文
///
/// 保存一次解析过程中的祖先链，用于检测循环依赖和跨生命周期引用。
/// 上下文属于单次解析调用，失败不会影响之后的解析。
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链
    resolution_chain: Vec<ResolveFrame>,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 将服务压入解析链
    ///
    /// - 服务（或与它共享实例来源的服务）已在链上时返回
    ///   [`DependencyError::CircularDependency`]，附带完整的环路径
    /// - 作用域服务被某个单例祖先引用时返回 [`DependencyError::InvalidLifetimeReference`]
    pub fn push(&mut self, frame: ResolveFrame) -> DependencyResult<()> {
        if let Some(start) = self
            .resolution_chain
            .iter()
            .position(|ancestor| {
                ancestor.key == frame.key
                    || (frame.shared_source.is_some() && ancestor.shared_source == frame.shared_source)
            })
        {
            let mut path: Vec<String> = self.resolution_chain[start..]
                .iter()
                .map(|ancestor| ancestor.key.to_string())
                .collect();
            path.push(frame.key.to_string());
            return Err(DependencyError::CircularDependency { path });
        }

        if frame.lifetime == Lifetime::Scoped {
            if let Some(singleton) = self
                .resolution_chain
                .iter()
                .find(|ancestor| ancestor.lifetime == Lifetime::Singleton)
            {
                return Err(DependencyError::InvalidLifetimeReference {
                    singleton: singleton.key.to_string(),
                    scoped: frame.key.to_string(),
                });
            }
        }

        self.resolution_chain.push(frame);
        Ok(())
    }

    /// 从解析链中移除最近的一帧
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }
}
