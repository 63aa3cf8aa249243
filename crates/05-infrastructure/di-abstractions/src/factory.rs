//! 服务工厂抽象
//!
//! 构造函数注入通过 [`Injectable`] 完成：每个可注入类型提供一个静态的
//! [`InjectableDescriptor`]，声明构造参数到服务标识的映射以及可选的
//! 生命周期要求。闭包工厂使用 [`ServiceFactory`]，跨多个服务标识共享
//! 同一个实例时使用 [`SingletonServiceFactory`]。

use crate::identifier::{Implements, ServiceIdentifier, ServiceKey};
use crate::resolver::{downcast_service, wrap_service, AnyService, ServiceResolver};
use infrastructure_common::{
    BoxError, DependencyError, DependencyResult, Disposable, Lifetime, TypeInfo,
};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type DisposerFn = fn(Arc<dyn Any + Send + Sync>) -> Option<Arc<dyn Disposable>>;

fn as_disposable<T: Disposable + 'static>(
    instance: Arc<dyn Any + Send + Sync>,
) -> Option<Arc<dyn Disposable>> {
    instance
        .downcast::<T>()
        .ok()
        .map(|instance| instance as Arc<dyn Disposable>)
}

/// 一次激活的结果
pub struct Activation {
    /// 类型擦除后的服务实例
    pub service: AnyService,
    /// 实例可释放时的释放句柄
    pub disposable: Option<Arc<dyn Disposable>>,
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("disposable", &self.disposable.is_some())
            .finish()
    }
}

/// 服务激活器 trait
///
/// 注册表保存的类型擦除激活器。
pub trait ServiceActivator: Send + Sync {
    /// 实现类型名称
    fn implementation(&self) -> &str;

    /// 实现类型声明的生命周期要求
    fn required_lifetime(&self) -> Option<Lifetime> {
        None
    }

    /// 创建实例
    ///
    /// `resolver` 携带当前解析上下文，依赖必须通过它解析。
    fn activate(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Activation>;

    /// 实例来源标识
    ///
    /// 不同服务键的激活器返回相同标识时，它们创建的是同一个对象，
    /// 解析链上出现两次即视为循环依赖。
    fn shared_source(&self) -> Option<usize> {
        None
    }
}

/// 转换为服务激活器
pub trait IntoActivator<T: ?Sized> {
    fn into_activator(self) -> Arc<dyn ServiceActivator>;
}

/// 可注入类型 trait
///
/// ```rust
/// use di_abstractions::{Injectable, InjectableDescriptor, InjectionArgs, ServiceIdentifier};
/// use infrastructure_common::{BoxError, Lifetime};
/// use std::sync::Arc;
///
/// pub struct Settings {
///     pub url: String,
/// }
///
/// pub static SETTINGS: ServiceIdentifier<Settings> = ServiceIdentifier::new("settings");
///
/// pub struct Repository {
///     settings: Arc<Settings>,
/// }
///
/// impl Injectable for Repository {
///     fn descriptor() -> InjectableDescriptor {
///         InjectableDescriptor::builder::<Self>()
///             .lifetime(Lifetime::Scoped)
///             .inject(0, &SETTINGS)
///             .build()
///     }
///
///     fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
///         Ok(Self { settings: args.get(0)? })
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// 注入描述符
    fn descriptor() -> InjectableDescriptor;

    /// 使用已解析的参数构造实例
    fn construct(args: InjectionArgs) -> Result<Self, BoxError>;

    /// 获取该类型的构造器，用于注册
    fn constructor() -> Constructor<Self> {
        Constructor::new()
    }
}

/// 注入描述符
///
/// 声明 `{ 参数位置 -> 服务标识 }` 映射、构造参数个数以及可选的生命周期要求。
#[derive(Clone)]
pub struct InjectableDescriptor {
    type_info: TypeInfo,
    required_lifetime: Option<Lifetime>,
    parameters: BTreeMap<usize, ServiceKey>,
    arity: Option<usize>,
    disposer: Option<DisposerFn>,
}

impl InjectableDescriptor {
    /// 创建描述符构建器
    pub fn builder<T: Send + Sync + 'static>() -> InjectableDescriptorBuilder<T> {
        InjectableDescriptorBuilder {
            descriptor: Self {
                type_info: TypeInfo::of::<T>(),
                required_lifetime: None,
                parameters: BTreeMap::new(),
                arity: None,
                disposer: None,
            },
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &str {
        self.type_info.short_name()
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    pub fn required_lifetime(&self) -> Option<Lifetime> {
        self.required_lifetime
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    /// 按参数位置排列的服务键
    ///
    /// 参数个数超过已声明的注入参数，或者参数位置不连续时返回
    /// [`DependencyError::NonInjectableParameter`]。
    pub fn parameters(&self) -> DependencyResult<Vec<ServiceKey>> {
        let arity = self.arity.unwrap_or_else(|| {
            self.parameters
                .keys()
                .next_back()
                .map_or(0, |last| last + 1)
        });

        (0..arity)
            .map(|index| {
                self.parameters.get(&index).cloned().ok_or_else(|| {
                    DependencyError::NonInjectableParameter {
                        type_name: self.type_name().to_string(),
                        index,
                    }
                })
            })
            .collect()
    }
}

impl fmt::Debug for InjectableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableDescriptor")
            .field("type", &self.type_info.name)
            .field("required_lifetime", &self.required_lifetime)
            .field("parameters", &self.parameters)
            .field("arity", &self.arity)
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}

/// 注入描述符构建器
pub struct InjectableDescriptorBuilder<T> {
    descriptor: InjectableDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> InjectableDescriptorBuilder<T> {
    /// 声明实现类型要求的生命周期
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.descriptor.required_lifetime = Some(lifetime);
        self
    }

    /// 声明位置 `index` 的参数由 `id` 注入
    pub fn inject<S: ?Sized + 'static>(mut self, index: usize, id: &ServiceIdentifier<S>) -> Self {
        self.descriptor.parameters.insert(index, id.service_key());
        self
    }

    /// 按服务键声明注入参数
    pub fn inject_key(mut self, index: usize, key: impl Into<ServiceKey>) -> Self {
        self.descriptor.parameters.insert(index, key.into());
        self
    }

    /// 声明构造参数个数
    pub fn arity(mut self, arity: usize) -> Self {
        self.descriptor.arity = Some(arity);
        self
    }

    pub fn build(self) -> InjectableDescriptor {
        self.descriptor
    }
}

impl<T: Disposable + Send + Sync + 'static> InjectableDescriptorBuilder<T> {
    /// 声明实例在作用域释放时需要调用 [`Disposable::dispose`]
    pub fn disposable(mut self) -> Self {
        self.descriptor.disposer = Some(as_disposable::<T>);
        self
    }
}

/// 构造参数
///
/// 按描述符中声明的顺序保存已经解析好的依赖。
pub struct InjectionArgs {
    type_name: String,
    services: Vec<(ServiceKey, AnyService)>,
}

impl InjectionArgs {
    pub fn new(type_name: impl Into<String>, services: Vec<(ServiceKey, AnyService)>) -> Self {
        Self {
            type_name: type_name.into(),
            services,
        }
    }

    /// 获取位置 `index` 的参数
    pub fn get<S: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DependencyResult<Arc<S>> {
        let (key, service) =
            self.services
                .get(index)
                .ok_or_else(|| DependencyError::NonInjectableParameter {
                    type_name: self.type_name.clone(),
                    index,
                })?;
        downcast_service::<S>(key.as_str(), service)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// 构造实现类型的实例，依赖通过 `resolver` 解析
fn construct_arc<C: Injectable>(
    descriptor: &InjectableDescriptor,
    resolver: &dyn ServiceResolver,
) -> DependencyResult<Arc<C>> {
    let mut services = Vec::new();
    for key in descriptor.parameters()? {
        let service = resolver.resolve_key(&key)?;
        services.push((key, service));
    }
    let args = InjectionArgs::new(descriptor.type_name(), services);
    C::construct(args)
        .map(Arc::new)
        .map_err(|inner| DependencyError::object_create(descriptor.type_name(), inner))
}

/// 可注入类型的构造器
pub struct Constructor<C> {
    _marker: PhantomData<fn() -> C>,
}

impl<C: Injectable> Constructor<C> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C: Injectable> Default for Constructor<C> {
    fn default() -> Self {
        Self::new()
    }
}

struct ConstructorActivator<C, T: ?Sized> {
    descriptor: InjectableDescriptor,
    _marker: PhantomData<fn() -> (Arc<C>, Arc<T>)>,
}

impl<C, T> ServiceActivator for ConstructorActivator<C, T>
where
    C: Injectable + Implements<T>,
    T: ?Sized + Send + Sync + 'static,
{
    fn implementation(&self) -> &str {
        self.descriptor.type_name()
    }

    fn required_lifetime(&self) -> Option<Lifetime> {
        self.descriptor.required_lifetime()
    }

    fn activate(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Activation> {
        let instance = construct_arc::<C>(&self.descriptor, resolver)?;
        let disposable = self
            .descriptor
            .disposer
            .and_then(|disposer| disposer(instance.clone() as Arc<dyn Any + Send + Sync>));
        Ok(Activation {
            service: wrap_service::<T>(instance.upcast()),
            disposable,
        })
    }
}

impl<C, T> IntoActivator<T> for Constructor<C>
where
    C: Injectable + Implements<T>,
    T: ?Sized + Send + Sync + 'static,
{
    fn into_activator(self) -> Arc<dyn ServiceActivator> {
        Arc::new(ConstructorActivator::<C, T> {
            descriptor: C::descriptor(),
            _marker: PhantomData,
        })
    }
}

type FactoryFn<T> = dyn Fn(&dyn ServiceResolver) -> Result<Arc<T>, BoxError> + Send + Sync;
type FactoryDisposer<T> = dyn Fn(&Arc<T>) -> Arc<dyn Disposable> + Send + Sync;

/// 闭包服务工厂
pub struct ServiceFactory<T: ?Sized> {
    name: String,
    create: Arc<FactoryFn<T>>,
    disposer: Option<Arc<FactoryDisposer<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> ServiceFactory<T> {
    /// 使用闭包创建服务工厂
    pub fn new<F>(create: F) -> Self
    where
        F: Fn(&dyn ServiceResolver) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: format!("factory<{}>", std::any::type_name::<T>()),
            create: Arc::new(create),
            disposer: None,
        }
    }

    /// 设置工厂名称（用于日志和错误信息）
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn create(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Arc<T>> {
        (self.create)(resolver).map_err(|inner| DependencyError::object_create(&self.name, inner))
    }
}

impl<T: Disposable + Send + Sync + 'static> ServiceFactory<T> {
    /// 创建实例可释放的服务工厂
    pub fn disposable<F>(create: F) -> Self
    where
        F: Fn(&dyn ServiceResolver) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let mut factory = Self::new(create);
        factory.disposer = Some(Arc::new(|instance: &Arc<T>| {
            instance.clone() as Arc<dyn Disposable>
        }));
        factory
    }
}

impl<T: ?Sized> Clone for ServiceFactory<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            create: self.create.clone(),
            disposer: self.disposer.clone(),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> ServiceActivator for ServiceFactory<T> {
    fn implementation(&self) -> &str {
        &self.name
    }

    fn activate(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Activation> {
        let instance = self.create(resolver)?;
        let disposable = self.disposer.as_ref().map(|disposer| disposer(&instance));
        Ok(Activation {
            service: wrap_service::<T>(instance),
            disposable,
        })
    }
}

impl<T: ?Sized + Send + Sync + 'static> IntoActivator<T> for ServiceFactory<T> {
    fn into_activator(self) -> Arc<dyn ServiceActivator> {
        Arc::new(self)
    }
}

/// 服务标识默认工厂的激活器
pub(crate) struct DefaultFactoryActivator<T: ?Sized + 'static> {
    pub(crate) id: ServiceIdentifier<T>,
    pub(crate) factory: crate::identifier::DefaultFactory<T>,
}

impl<T: ?Sized + Send + Sync + 'static> ServiceActivator for DefaultFactoryActivator<T> {
    fn implementation(&self) -> &str {
        self.id.key()
    }

    fn activate(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Activation> {
        let instance = (self.factory)(resolver)
            .map_err(|inner| DependencyError::object_create(self.id.key(), inner))?;
        Ok(Activation {
            service: wrap_service::<T>(instance),
            disposable: None,
        })
    }
}

/// 获取服务标识自带工厂的激活器
pub fn default_activator<T: ?Sized + Send + Sync + 'static>(
    id: &ServiceIdentifier<T>,
) -> DependencyResult<Arc<dyn ServiceActivator>> {
    let factory = id
        .default_factory()
        .ok_or_else(|| DependencyError::MissingFactory {
            key: id.key().to_string(),
        })?;
    Ok(Arc::new(DefaultFactoryActivator { id: *id, factory }))
}

type SingletonCreateFn<C> = dyn Fn(&dyn ServiceResolver) -> DependencyResult<Arc<C>> + Send + Sync;

struct SingletonState<C> {
    name: String,
    create: Box<SingletonCreateFn<C>>,
    instance: OnceCell<Arc<C>>,
    disposer: Option<DisposerFn>,
}

/// 单例服务工厂
///
/// 包装一个构造器或另一个工厂，在多个服务标识之间缓存并共享同一个实例，
/// 使一个具体类型以同一对象满足多个契约。
pub struct SingletonServiceFactory<C> {
    state: Arc<SingletonState<C>>,
}

impl<C: Send + Sync + 'static> SingletonServiceFactory<C> {
    /// 包装可注入类型的构造器
    pub fn new() -> Self
    where
        C: Injectable,
    {
        let descriptor = C::descriptor();
        let name = descriptor.type_name().to_string();
        let disposer = descriptor.disposer;
        Self {
            state: Arc::new(SingletonState {
                name,
                create: Box::new(move |resolver| construct_arc::<C>(&descriptor, resolver)),
                instance: OnceCell::new(),
                disposer,
            }),
        }
    }

    /// 包装闭包工厂
    pub fn from_factory(factory: ServiceFactory<C>) -> Self {
        Self {
            state: Arc::new(SingletonState {
                name: factory.name.clone(),
                create: Box::new(move |resolver| factory.create(resolver)),
                instance: OnceCell::new(),
                disposer: None,
            }),
        }
    }

    /// 绑定到契约 `T`，得到可注册的激活器
    pub fn bind<T>(&self) -> SingletonBinding<C, T>
    where
        T: ?Sized + Send + Sync + 'static,
        C: Implements<T>,
    {
        SingletonBinding {
            state: self.state.clone(),
            _marker: PhantomData,
        }
    }

    /// 获取（必要时创建）共享实例
    pub fn instance(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Arc<C>> {
        self.state.instance(resolver)
    }

    /// 共享实例是否已经创建
    pub fn is_created(&self) -> bool {
        self.state.instance.get().is_some()
    }
}

impl<C: Send + Sync + 'static> SingletonState<C> {
    fn instance(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Arc<C>> {
        self.instance
            .get_or_try_init(|| (self.create)(resolver))
            .cloned()
    }
}

impl<C> Clone for SingletonServiceFactory<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<C: Injectable> Default for SingletonServiceFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// 单例工厂到某个契约的绑定
pub struct SingletonBinding<C, T: ?Sized> {
    state: Arc<SingletonState<C>>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<C, T> ServiceActivator for SingletonBinding<C, T>
where
    C: Implements<T>,
    T: ?Sized + Send + Sync + 'static,
{
    fn implementation(&self) -> &str {
        &self.state.name
    }

    fn required_lifetime(&self) -> Option<Lifetime> {
        Some(Lifetime::Singleton)
    }

    fn shared_source(&self) -> Option<usize> {
        Some(Arc::as_ptr(&self.state) as *const () as usize)
    }

    fn activate(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Activation> {
        let instance = self.state.instance(resolver)?;
        let disposable = self
            .state
            .disposer
            .and_then(|disposer| disposer(instance.clone() as Arc<dyn Any + Send + Sync>));
        Ok(Activation {
            service: wrap_service::<T>(instance.upcast()),
            disposable,
        })
    }
}

impl<C, T> IntoActivator<T> for SingletonBinding<C, T>
where
    C: Implements<T>,
    T: ?Sized + Send + Sync + 'static,
{
    fn into_activator(self) -> Arc<dyn ServiceActivator> {
        Arc::new(self)
    }
}
