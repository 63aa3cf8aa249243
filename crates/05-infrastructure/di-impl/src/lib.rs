//! # 依赖注入具体实现
//!
//! 提供服务集合 [`ServiceCollection`]：服务注册、按生命周期解析、
//! 子作用域以及作用域释放。

use di_abstractions::{
    Activation, AnyService, ResolveContext, ResolveFrame, ScopeFactory, ServiceActivator,
    ServiceKey, ServiceRegistry, ServiceResolver,
};
use infrastructure_common::{
    DependencyError, DependencyResult, Disposable, Lifetime, ScopeInfo, ServiceDescriptor,
};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use di_abstractions::{
    Constructor, Injectable, InjectableDescriptor, InjectionArgs, IntoActivator, ServiceFactory,
    ServiceIdentifier, ServiceResolverExt, SingletonServiceFactory,
};

/// 服务注册项
struct ServiceEntry {
    key: ServiceKey,
    lifetime: Lifetime,
    implementation: String,
    /// 实例注册没有激活器
    activator: Option<Arc<dyn ServiceActivator>>,
    /// 缓存的实例（单例、作用域和实例注册）
    instance: OnceCell<Activation>,
    /// 创建该注册项的作用域
    owner: uuid::Uuid,
}

impl ServiceEntry {
    /// 为子作用域创建不带实例的新注册项
    fn fresh(&self, owner: uuid::Uuid) -> Self {
        Self {
            key: self.key.clone(),
            lifetime: self.lifetime,
            implementation: self.implementation.clone(),
            activator: self.activator.clone(),
            instance: OnceCell::new(),
            owner,
        }
    }

    fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            key: self.key.to_string(),
            lifetime: self.lifetime,
            implementation: self.implementation.clone(),
            activated: self.instance.get().is_some(),
        }
    }

    fn activate(&self, resolver: &dyn ServiceResolver) -> DependencyResult<Activation> {
        match &self.activator {
            Some(activator) => activator.activate(resolver),
            None => Err(DependencyError::MissingFactory {
                key: self.key.to_string(),
            }),
        }
    }
}

/// 服务集合
///
/// 根集合由调用方创建并注册服务；[`ScopeFactory::create_scope`] 创建的
/// 子作用域共享单例和实例注册，作用域服务在每个作用域内各有一份。
///
/// 循环依赖只在单次解析调用的祖先链内检测。两个线程同时从相反方向
/// 首次解析互相依赖的单例（A→B 与 B→A）时，会在各自等待的实例缓存上互相阻塞；
/// 这类单例应在单线程中预先解析。
pub struct ServiceCollection {
    /// 服务注册项
    entries: RwLock<HashMap<ServiceKey, Arc<ServiceEntry>>>,
    /// 是否已冻结
    frozen: AtomicBool,
    /// 作用域信息
    scope: ScopeInfo,
}

impl ServiceCollection {
    /// 创建新的根服务集合
    pub fn new() -> Self {
        Self::with_scope(ScopeInfo::root())
    }

    fn with_scope(scope: ScopeInfo) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            frozen: AtomicBool::new(false),
            scope,
        }
    }

    /// 当前作用域信息
    pub fn scope_info(&self) -> &ScopeInfo {
        &self.scope
    }

    /// 已注册的服务键，按字母顺序排列
    pub fn registered_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().map(|k| k.to_string()).collect();
        keys.sort();
        keys
    }

    /// 已注册服务的数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 按服务键解析类型擦除的实例
    pub fn get_by_key(&self, key: &str) -> DependencyResult<AnyService> {
        self.resolve_key(&ServiceKey::from(key))
    }

    fn insert(&self, entry: ServiceEntry) -> DependencyResult<()> {
        if self.is_frozen() {
            return Err(DependencyError::RegistryFrozen {
                key: entry.key.to_string(),
            });
        }

        debug!(
            "注册服务: {} -> {} ({})",
            entry.key, entry.implementation, entry.lifetime
        );

        let mut entries = self.entries.write();
        if let Some(previous) = entries.insert(entry.key.clone(), Arc::new(entry)) {
            warn!(
                "服务 {} 已注册为 {}，新的注册将覆盖它",
                previous.key, previous.implementation
            );
        }
        Ok(())
    }

    fn lookup(&self, key: &ServiceKey) -> DependencyResult<Arc<ServiceEntry>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| DependencyError::not_registered(key.as_str()))
    }

    /// 在给定的解析上下文中解析服务
    fn resolve_in(
        &self,
        key: &ServiceKey,
        resolver: &ContextualResolver<'_>,
    ) -> DependencyResult<AnyService> {
        let entry = self.lookup(key)?;

        resolver.context.lock().push(ResolveFrame {
            key: entry.key.clone(),
            implementation: entry.implementation.clone(),
            lifetime: entry.lifetime,
            shared_source: entry.activator.as_ref().and_then(|a| a.shared_source()),
        })?;

        let result = if entry.lifetime.is_cached() {
            entry
                .instance
                .get_or_try_init(|| {
                    debug!(
                        "创建{}服务实例: {} (作用域 {})",
                        entry.lifetime, entry.key, self.scope.name
                    );
                    entry.activate(resolver)
                })
                .map(|activation| activation.service.clone())
        } else {
            entry.activate(resolver).map(|activation| activation.service)
        };

        resolver.context.lock().pop();
        result
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("scope", &self.scope.name)
            .field("services", &self.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

/// 携带解析上下文的解析器，传给激活器用于解析依赖
struct ContextualResolver<'a> {
    collection: &'a ServiceCollection,
    context: Mutex<ResolveContext>,
}

impl ServiceResolver for ContextualResolver<'_> {
    fn resolve_key(&self, key: &ServiceKey) -> DependencyResult<AnyService> {
        self.collection.resolve_in(key, self)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.collection.contains_key(key)
    }
}

impl ServiceResolver for ServiceCollection {
    fn resolve_key(&self, key: &ServiceKey) -> DependencyResult<AnyService> {
        let resolver = ContextualResolver {
            collection: self,
            context: Mutex::new(ResolveContext::new()),
        };
        self.resolve_in(key, &resolver)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl ServiceRegistry for ServiceCollection {
    fn register_activator(
        &self,
        key: ServiceKey,
        lifetime: Lifetime,
        activator: Arc<dyn ServiceActivator>,
    ) -> DependencyResult<()> {
        self.insert(ServiceEntry {
            key,
            lifetime,
            implementation: activator.implementation().to_string(),
            activator: Some(activator),
            instance: OnceCell::new(),
            owner: self.scope.id,
        })
    }

    fn register_erased_instance(
        &self,
        key: ServiceKey,
        implementation: &str,
        instance: AnyService,
    ) -> DependencyResult<()> {
        self.insert(ServiceEntry {
            key,
            lifetime: Lifetime::Instance,
            implementation: implementation.to_string(),
            activator: None,
            instance: OnceCell::with_value(Activation {
                service: instance,
                disposable: None,
            }),
            owner: self.scope.id,
        })
    }

    fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::SeqCst) {
            info!("服务集合已冻结: {} 个服务 (作用域 {})", self.len(), self.scope.name);
        }
    }

    fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> =
            self.entries.read().values().map(|e| e.descriptor()).collect();
        descriptors.sort_by(|a, b| a.key.cmp(&b.key));
        descriptors
    }
}

impl ScopeFactory for ServiceCollection {
    type Scope = ServiceCollection;

    fn create_scope(&self) -> ServiceCollection {
        let scope = Self::with_scope(self.scope.child("scope"));

        {
            let source = self.entries.read();
            let mut target = scope.entries.write();
            for (key, entry) in source.iter() {
                let copied = if entry.lifetime.is_shared() {
                    entry.clone()
                } else {
                    Arc::new(entry.fresh(scope.scope.id))
                };
                target.insert(key.clone(), copied);
            }
        }
        scope.frozen.store(true, Ordering::SeqCst);

        debug!(
            "创建作用域: {} ({}), 继承 {} 个服务",
            scope.scope.name,
            scope.scope.id,
            scope.len()
        );
        scope
    }
}

impl Disposable for ServiceCollection {
    /// 释放当前作用域
    ///
    /// 释放本作用域创建的作用域服务实例，以及本作用域拥有的单例实例；
    /// 继承的单例和实例注册不会被释放。释放后注册项被清空。
    fn dispose(&self) {
        let entries = std::mem::take(&mut *self.entries.write());
        let mut disposed = 0usize;
        // 同一对象可能绑定在多个服务键下，只释放一次
        let mut seen: HashSet<*const ()> = HashSet::new();

        for entry in entries.values() {
            let owned = match entry.lifetime {
                Lifetime::Scoped => true,
                Lifetime::Singleton => entry.owner == self.scope.id,
                Lifetime::Instance | Lifetime::Transient => false,
            };
            if !owned {
                continue;
            }
            if let Some(disposable) = entry.instance.get().and_then(|a| a.disposable.as_ref()) {
                if !seen.insert(Arc::as_ptr(disposable) as *const ()) {
                    continue;
                }
                debug!("释放服务: {} ({})", entry.key, entry.implementation);
                disposable.dispose();
                disposed += 1;
            }
        }

        if !entries.is_empty() {
            info!(
                "作用域已释放: {} ({}), 释放了 {} 个实例",
                self.scope.name, self.scope.id, disposed
            );
        }
    }
}
