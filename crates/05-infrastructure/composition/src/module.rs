//! 模块定义
//!
//! 模块是应用的组合单元：声明依赖的其他模块，并参与三个生命周期阶段
//! Initialize → ConfigureServices → Configure。

use crate::lifecycle::{ModuleConfigurator, ModuleInitializer};
use async_trait::async_trait;
use di_impl::ServiceCollection;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 模块 trait
///
/// 所有生命周期钩子都有空的默认实现，未实现的阶段直接跳过。
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// 模块名称，在一次加载中唯一
    fn name(&self) -> &str;

    /// 依赖的模块
    fn dependencies(&self) -> Vec<ModuleRef> {
        Vec::new()
    }

    /// Initialize 阶段：注册配置类型和选项绑定
    fn initialize(&self, _initializer: &mut ModuleInitializer<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// ConfigureServices 阶段：向服务集合注册服务
    fn configure_services(&self, _services: &ServiceCollection) -> anyhow::Result<()> {
        Ok(())
    }

    /// Configure 阶段
    async fn configure(&self, _configurator: &ModuleConfigurator) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 模块身份
///
/// 类型模块以 `TypeId` 识别，描述符模块以名称识别。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ModuleIdentity {
    Type(TypeId),
    Descriptor(String),
}

/// 已创建的模块实例
#[derive(Clone)]
pub struct ModuleHandle {
    pub(crate) module: Arc<dyn Module>,
    pub(crate) any: Arc<dyn Any + Send + Sync>,
    pub(crate) identity: ModuleIdentity,
    pub(crate) type_name: &'static str,
}

impl ModuleHandle {
    fn new<M: Module>(module: Arc<M>) -> Self {
        Self {
            module: module.clone(),
            any: module,
            identity: ModuleIdentity::Type(TypeId::of::<M>()),
            type_name: std::any::type_name::<M>(),
        }
    }

    fn descriptor(descriptor: ModuleDescriptor) -> Self {
        let identity = ModuleIdentity::Descriptor(descriptor.name.clone());
        let module = Arc::new(descriptor);
        Self {
            module: module.clone(),
            any: module,
            identity,
            type_name: std::any::type_name::<ModuleDescriptor>(),
        }
    }

    /// 模块名称
    pub fn name(&self) -> &str {
        self.module.name()
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    /// 尝试转换为具体模块类型
    pub fn downcast<M: Module>(&self) -> Option<Arc<M>> {
        self.any.clone().downcast::<M>().ok()
    }

    pub(crate) fn same_instance(&self, other: &ModuleHandle) -> bool {
        Arc::ptr_eq(&self.any, &other.any)
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name())
            .field("type", &self.type_name)
            .finish()
    }
}

type ModuleCreateFn = Arc<dyn Fn() -> ModuleHandle + Send + Sync>;

/// 模块引用
///
/// 可以是模块构造器（同一次加载中最多创建一次）、已有的模块实例，
/// 或者异步得到的另一个模块引用。
pub enum ModuleRef {
    Constructor {
        identity: ModuleIdentityKey,
        create: ModuleCreateFn,
    },
    Instance(ModuleHandle),
    Deferred(BoxFuture<'static, anyhow::Result<ModuleRef>>),
}

/// 模块构造器的身份
#[derive(Debug, Clone)]
pub struct ModuleIdentityKey {
    pub(crate) identity: ModuleIdentity,
    pub(crate) type_name: &'static str,
}

impl ModuleRef {
    /// 使用 `Default` 构造的模块
    pub fn of<M: Module + Default>() -> Self {
        Self::constructor(M::default)
    }

    /// 使用构造函数创建的模块
    pub fn constructor<M, F>(create: F) -> Self
    where
        M: Module,
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self::Constructor {
            identity: ModuleIdentityKey {
                identity: ModuleIdentity::Type(TypeId::of::<M>()),
                type_name: std::any::type_name::<M>(),
            },
            create: Arc::new(move || ModuleHandle::new(Arc::new(create()))),
        }
    }

    /// 已有的模块实例
    pub fn instance<M: Module>(module: M) -> Self {
        Self::shared(Arc::new(module))
    }

    /// 共享的模块实例
    pub fn shared<M: Module>(module: Arc<M>) -> Self {
        Self::Instance(ModuleHandle::new(module))
    }

    /// 描述符模块
    pub fn descriptor(descriptor: ModuleDescriptor) -> Self {
        Self::Instance(ModuleHandle::descriptor(descriptor))
    }

    /// 异步得到的模块引用
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<ModuleRef>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }
}

impl From<ModuleDescriptor> for ModuleRef {
    fn from(descriptor: ModuleDescriptor) -> Self {
        Self::descriptor(descriptor)
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor { identity, .. } => {
                f.debug_tuple("Constructor").field(&identity.type_name).finish()
            }
            Self::Instance(handle) => f.debug_tuple("Instance").field(handle).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

type InitializeHook = Arc<dyn Fn(&mut ModuleInitializer<'_>) -> anyhow::Result<()> + Send + Sync>;
type ServicesHook = Arc<dyn Fn(&ServiceCollection) -> anyhow::Result<()> + Send + Sync>;
type ConfigureHook =
    Arc<dyn Fn(ModuleConfigurator) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
type DependencyFn = Arc<dyn Fn() -> ModuleRef + Send + Sync>;

/// 描述符模块
///
/// 不定义新类型，直接用闭包描述模块的依赖和生命周期钩子。
///
/// ```rust
/// use infrastructure_composition::{ModuleDescriptor, ModuleRef};
///
/// let logging = ModuleDescriptor::new("logging")
///     .on_configure(|configurator| async move {
///         configurator.next().await?;
///         Ok(())
///     });
/// let module: ModuleRef = logging.into();
/// ```
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: String,
    dependencies: Vec<DependencyFn>,
    initialize: Option<InitializeHook>,
    configure_services: Option<ServicesHook>,
    configure: Option<ConfigureHook>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            initialize: None,
            configure_services: None,
            configure: None,
        }
    }

    /// 依赖一个类型模块
    pub fn depends_on<M: Module + Default>(mut self) -> Self {
        self.dependencies.push(Arc::new(ModuleRef::of::<M>));
        self
    }

    /// 依赖一个已有的模块实例
    pub fn depends_on_instance<M: Module>(mut self, module: Arc<M>) -> Self {
        self.dependencies
            .push(Arc::new(move || ModuleRef::shared(module.clone())));
        self
    }

    /// 依赖另一个描述符模块
    pub fn depends_on_descriptor(mut self, dependency: ModuleDescriptor) -> Self {
        self.dependencies
            .push(Arc::new(move || ModuleRef::descriptor(dependency.clone())));
        self
    }

    pub fn on_initialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ModuleInitializer<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.initialize = Some(Arc::new(hook));
        self
    }

    pub fn on_configure_services<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ServiceCollection) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.configure_services = Some(Arc::new(hook));
        self
    }

    pub fn on_configure<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModuleConfigurator) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.configure = Some(Arc::new(
            move |configurator| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(hook(configurator))
            },
        ));
        self
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies.len())
            .finish()
    }
}

#[async_trait]
impl Module for ModuleDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<ModuleRef> {
        self.dependencies.iter().map(|dependency| dependency()).collect()
    }

    fn initialize(&self, initializer: &mut ModuleInitializer<'_>) -> anyhow::Result<()> {
        match &self.initialize {
            Some(hook) => hook(initializer),
            None => Ok(()),
        }
    }

    fn configure_services(&self, services: &ServiceCollection) -> anyhow::Result<()> {
        match &self.configure_services {
            Some(hook) => hook(services),
            None => Ok(()),
        }
    }

    async fn configure(&self, configurator: &ModuleConfigurator) -> anyhow::Result<()> {
        match &self.configure {
            Some(hook) => hook(configurator.clone()).await,
            None => Ok(()),
        }
    }
}
