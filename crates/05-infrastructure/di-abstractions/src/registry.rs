//! 服务注册表抽象接口

use crate::factory::{default_activator, Constructor, Injectable, IntoActivator, ServiceActivator};
use crate::identifier::{Implements, ServiceIdentifier, ServiceKey};
use crate::resolver::{wrap_service, AnyService, ServiceResolver};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, ServiceDescriptor};
use std::sync::Arc;

/// 服务注册表 trait
///
/// 实现者只需要提供类型擦除的注册入口，类型化的注册方法都基于它们实现。
/// 同一个服务键重复注册时，后注册的覆盖先注册的。
pub trait ServiceRegistry: ServiceResolver {
    /// 以指定生命周期注册激活器
    fn register_activator(
        &self,
        key: ServiceKey,
        lifetime: Lifetime,
        activator: Arc<dyn ServiceActivator>,
    ) -> DependencyResult<()>;

    /// 注册一个已经存在的实例
    fn register_erased_instance(
        &self,
        key: ServiceKey,
        implementation: &str,
        instance: AnyService,
    ) -> DependencyResult<()>;

    /// 冻结注册表，之后的注册都会失败
    fn freeze(&self);

    /// 注册表是否已冻结
    fn is_frozen(&self) -> bool;

    /// 已注册服务的描述符
    fn descriptors(&self) -> Vec<ServiceDescriptor>;

    /// 注册可注入类型，生命周期取自类型声明
    ///
    /// 类型未声明生命周期时返回 [`DependencyError::LifetimeNotDeclared`]。
    fn register<T, C>(&self, id: &ServiceIdentifier<T>, constructor: Constructor<C>) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<T>,
    {
        let descriptor = C::descriptor();
        let lifetime = descriptor
            .required_lifetime()
            .ok_or_else(|| DependencyError::LifetimeNotDeclared {
                type_name: descriptor.type_name().to_string(),
            })?;
        self.register_with(id, lifetime, constructor)
    }

    /// 注册实例，生命周期为 [`Lifetime::Instance`]
    fn register_instance<T>(&self, id: &ServiceIdentifier<T>, instance: Arc<T>) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_erased_instance(
            id.service_key(),
            std::any::type_name::<T>(),
            wrap_service(instance),
        )
    }

    /// 注册单例服务
    fn register_singleton<T>(
        &self,
        id: &ServiceIdentifier<T>,
        activator: impl IntoActivator<T>,
    ) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_with(id, Lifetime::Singleton, activator)
    }

    /// 注册作用域服务
    fn register_scoped<T>(
        &self,
        id: &ServiceIdentifier<T>,
        activator: impl IntoActivator<T>,
    ) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_with(id, Lifetime::Scoped, activator)
    }

    /// 注册瞬态服务
    fn register_transient<T>(
        &self,
        id: &ServiceIdentifier<T>,
        activator: impl IntoActivator<T>,
    ) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_with(id, Lifetime::Transient, activator)
    }

    /// 以指定生命周期注册
    ///
    /// 实现类型声明的生命周期与注册生命周期不一致时返回
    /// [`DependencyError::ScopeMismatch`]。
    fn register_with<T>(
        &self,
        id: &ServiceIdentifier<T>,
        lifetime: Lifetime,
        activator: impl IntoActivator<T>,
    ) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let activator = activator.into_activator();
        if let Some(required) = activator.required_lifetime() {
            if required != lifetime {
                return Err(DependencyError::ScopeMismatch {
                    type_name: activator.implementation().to_string(),
                    required,
                    actual: lifetime,
                });
            }
        }
        self.register_activator(id.service_key(), lifetime, activator)
    }

    /// 使用服务标识自带的工厂注册
    fn register_default<T>(&self, id: &ServiceIdentifier<T>, lifetime: Lifetime) -> DependencyResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_activator(id.service_key(), lifetime, default_activator(id)?)
    }
}

/// 作用域工厂 trait
pub trait ScopeFactory {
    type Scope: ServiceRegistry;

    /// 创建子作用域
    ///
    /// 子作用域共享单例和实例注册，作用域和瞬态服务重新创建；
    /// 子作用域创建后立即冻结。
    fn create_scope(&self) -> Self::Scope;
}
