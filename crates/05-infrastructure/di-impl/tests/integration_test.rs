//! 服务集合的集成测试

use di_abstractions::{ScopeFactory, ServiceRegistry, ServiceResolver};
use di_impl::{
    Injectable, InjectableDescriptor, InjectionArgs, ServiceCollection, ServiceFactory,
    ServiceIdentifier, ServiceResolverExt, SingletonServiceFactory,
};
use infrastructure_common::{BoxError, DependencyError, Disposable, Lifetime};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// 计数器，记录释放次数
#[derive(Default)]
struct DisposeCounter(AtomicUsize);

impl DisposeCounter {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

static COUNTER: ServiceIdentifier<DisposeCounter> = ServiceIdentifier::new("dispose-counter");

/// 请求级服务
struct RequestContext {
    counter: Arc<DisposeCounter>,
}

impl Injectable for RequestContext {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .lifetime(Lifetime::Scoped)
            .inject(0, &COUNTER)
            .disposable()
            .build()
    }

    fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self {
            counter: args.get(0)?,
        })
    }
}

impl Disposable for RequestContext {
    fn dispose(&self) {
        self.counter.0.fetch_add(1, Ordering::SeqCst);
    }
}

static REQUEST: ServiceIdentifier<RequestContext> = ServiceIdentifier::new("request-context");

/// 单例缓存，也可释放
struct Cache {
    counter: Arc<DisposeCounter>,
}

impl Injectable for Cache {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .lifetime(Lifetime::Singleton)
            .inject(0, &COUNTER)
            .disposable()
            .build()
    }

    fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self {
            counter: args.get(0)?,
        })
    }
}

impl Disposable for Cache {
    fn dispose(&self) {
        self.counter.0.fetch_add(100, Ordering::SeqCst);
    }
}

static CACHE: ServiceIdentifier<Cache> = ServiceIdentifier::new("cache");

fn container() -> (ServiceCollection, Arc<DisposeCounter>) {
    init_tracing();
    let services = ServiceCollection::new();
    let counter = Arc::new(DisposeCounter::default());
    services.register_instance(&COUNTER, counter.clone()).unwrap();
    (services, counter)
}

#[test]
fn test_singleton_returns_identical_instance() {
    let (services, _) = container();
    services.register(&CACHE, Cache::constructor()).unwrap();

    let first = services.get(&CACHE).unwrap();
    let second = services.get(&CACHE).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_transient_returns_distinct_instances() {
    static ID: ServiceIdentifier<String> = ServiceIdentifier::new("transient");
    let (services, _) = container();
    services
        .register_transient(&ID, ServiceFactory::new(|_| Ok(Arc::new("t".to_string()))))
        .unwrap();

    let first = services.get(&ID).unwrap();
    let second = services.get(&ID).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);
}

#[test]
fn test_scope_shares_singletons_and_separates_scoped() {
    let (services, _) = container();
    services.register(&CACHE, Cache::constructor()).unwrap();
    services.register(&REQUEST, RequestContext::constructor()).unwrap();

    let root_cache = services.get(&CACHE).unwrap();
    let root_request = services.get(&REQUEST).unwrap();

    let scope_a = services.create_scope();
    let scope_b = services.create_scope();

    assert!(Arc::ptr_eq(&root_cache, &scope_a.get(&CACHE).unwrap()));
    assert!(Arc::ptr_eq(&root_cache, &scope_b.get(&CACHE).unwrap()));

    let a = scope_a.get(&REQUEST).unwrap();
    let b = scope_b.get(&REQUEST).unwrap();
    assert!(!Arc::ptr_eq(&root_request, &a));
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &scope_a.get(&REQUEST).unwrap()));
    assert!(Arc::ptr_eq(&root_request.counter, &a.counter));
}

#[test]
fn test_scope_dispose_only_touches_own_scoped_instances() {
    let (services, counter) = container();
    services.register(&CACHE, Cache::constructor()).unwrap();
    services.register(&REQUEST, RequestContext::constructor()).unwrap();

    let scope = services.create_scope();
    scope.get(&CACHE).unwrap();
    scope.get(&REQUEST).unwrap();

    scope.dispose();
    assert_eq!(counter.count(), 1, "singleton must not be disposed by a child scope");

    scope.dispose();
    assert_eq!(counter.count(), 1, "second dispose is a no-op");
    assert!(scope.is_empty());

    // 根作用域拥有单例
    services.dispose();
    assert_eq!(counter.count(), 101);
}

#[test]
fn test_scope_without_activation_disposes_nothing() {
    let (services, counter) = container();
    services.register(&REQUEST, RequestContext::constructor()).unwrap();

    let scope = services.create_scope();
    scope.dispose();
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_scope_is_frozen() {
    let (services, _) = container();
    let scope = services.create_scope();
    let err = scope
        .register_instance(&COUNTER, Arc::new(DisposeCounter::default()))
        .unwrap_err();
    assert!(matches!(err, DependencyError::RegistryFrozen { .. }));
}

mod cycle {
    use super::*;

    pub static A: ServiceIdentifier<ServiceA> = ServiceIdentifier::new("a");
    pub static B: ServiceIdentifier<ServiceB> = ServiceIdentifier::new("b");

    #[derive(Debug)]
    pub struct ServiceA {
        pub b: Arc<ServiceB>,
    }

    #[derive(Debug)]
    pub struct ServiceB;

    impl Injectable for ServiceA {
        fn descriptor() -> InjectableDescriptor {
            InjectableDescriptor::builder::<Self>()
                .lifetime(Lifetime::Transient)
                .inject(0, &B)
                .build()
        }

        fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
            Ok(Self { b: args.get(0)? })
        }
    }

    pub fn broken_b() -> ServiceFactory<ServiceB> {
        ServiceFactory::new(|resolver| {
            resolver.get(&A)?;
            Ok(Arc::new(ServiceB))
        })
    }
}

#[test]
fn test_circular_dependency_reports_path_and_recovers() {
    let (services, _) = container();
    services.register(&cycle::A, cycle::ServiceA::constructor()).unwrap();
    services.register_transient(&cycle::B, cycle::broken_b()).unwrap();

    let err = services.get(&cycle::A).unwrap_err();
    match &err {
        DependencyError::CircularDependency { path } => {
            assert_eq!(path, &vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        }
        other => panic!("expected CircularDependency, got: {other:?}"),
    }
    assert!(err.to_string().contains("a -> b -> a"));

    // 修复注册后可以正常解析
    services
        .register_transient(&cycle::B, ServiceFactory::new(|_| Ok(Arc::new(cycle::ServiceB))))
        .unwrap();
    assert!(services.get(&cycle::A).is_ok());
}

/// 错误地依赖作用域服务的单例
struct LeakyCache {
    _request: Arc<RequestContext>,
}

impl std::fmt::Debug for LeakyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeakyCache").finish_non_exhaustive()
    }
}

impl Injectable for LeakyCache {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .lifetime(Lifetime::Singleton)
            .inject(0, &REQUEST)
            .build()
    }

    fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self {
            _request: args.get(0)?,
        })
    }
}

#[test]
fn test_singleton_capturing_scoped_fails() {
    static LEAKY: ServiceIdentifier<LeakyCache> = ServiceIdentifier::new("leaky-cache");
    let (services, _) = container();
    services.register(&REQUEST, RequestContext::constructor()).unwrap();
    services.register(&LEAKY, LeakyCache::constructor()).unwrap();

    let err = services.get(&LEAKY).unwrap_err();
    assert!(matches!(
        err,
        DependencyError::InvalidLifetimeReference { ref singleton, ref scoped }
            if singleton == "leaky-cache" && scoped == "request-context"
    ));

    // 从子作用域解析同样失败
    let scope = services.create_scope();
    assert!(matches!(
        scope.get(&LEAKY),
        Err(DependencyError::InvalidLifetimeReference { .. })
    ));
}

#[test]
fn test_constructor_failure_is_wrapped() {
    struct Broken;

    impl Injectable for Broken {
        fn descriptor() -> InjectableDescriptor {
            InjectableDescriptor::builder::<Self>()
                .lifetime(Lifetime::Transient)
                .build()
        }

        fn construct(_args: InjectionArgs) -> Result<Self, BoxError> {
            Err("connection refused".into())
        }
    }

    static BROKEN: ServiceIdentifier<Broken> = ServiceIdentifier::new("broken");
    let (services, _) = container();
    services.register(&BROKEN, Broken::constructor()).unwrap();

    match services.get(&BROKEN) {
        Err(DependencyError::ObjectCreate { type_name, inner }) => {
            assert_eq!(type_name, "Broken");
            assert_eq!(inner.to_string(), "connection refused");
        }
        Err(other) => panic!("expected ObjectCreate, got: {other:?}"),
        Ok(_) => panic!("expected ObjectCreate"),
    }
}

#[test]
fn test_nested_dependency_errors_pass_through() {
    let (services, _) = container();
    services.register(&cycle::A, cycle::ServiceA::constructor()).unwrap();

    let err = services.get(&cycle::A).unwrap_err();
    assert!(matches!(err, DependencyError::ServiceNotRegistered { ref key } if key == "b"));
}

#[test]
fn test_register_requires_declared_lifetime() {
    struct Undeclared;

    impl Injectable for Undeclared {
        fn descriptor() -> InjectableDescriptor {
            InjectableDescriptor::builder::<Self>().build()
        }

        fn construct(_args: InjectionArgs) -> Result<Self, BoxError> {
            Ok(Self)
        }
    }

    static ID: ServiceIdentifier<Undeclared> = ServiceIdentifier::new("undeclared");
    let (services, _) = container();
    assert!(matches!(
        services.register(&ID, Undeclared::constructor()),
        Err(DependencyError::LifetimeNotDeclared { .. })
    ));
    services.register_transient(&ID, Undeclared::constructor()).unwrap();
    assert!(services.get(&ID).is_ok());
}

#[test]
fn test_incompatible_declared_lifetime_fails_fast() {
    let (services, _) = container();
    let err = services
        .register_singleton(&REQUEST, RequestContext::constructor())
        .unwrap_err();
    assert!(matches!(
        err,
        DependencyError::ScopeMismatch {
            required: Lifetime::Scoped,
            actual: Lifetime::Singleton,
            ..
        }
    ));
    assert!(!services.has(&REQUEST));
}

#[test]
fn test_non_injectable_parameter_is_rejected() {
    struct Partial;

    impl Injectable for Partial {
        fn descriptor() -> InjectableDescriptor {
            InjectableDescriptor::builder::<Self>()
                .lifetime(Lifetime::Transient)
                .inject(0, &COUNTER)
                .arity(2)
                .build()
        }

        fn construct(_args: InjectionArgs) -> Result<Self, BoxError> {
            Ok(Self)
        }
    }

    static PARTIAL: ServiceIdentifier<Partial> = ServiceIdentifier::new("partial");
    let (services, _) = container();
    services.register(&PARTIAL, Partial::constructor()).unwrap();
    assert!(matches!(
        services.get(&PARTIAL),
        Err(DependencyError::NonInjectableParameter { index: 1, .. })
    ));
}

trait Reader: Send + Sync {
    fn read(&self) -> String;
}

trait Writer: Send + Sync {
    fn write(&self, value: &str);
}

#[derive(Default)]
struct MemoryStore {
    value: Mutex<String>,
}

impl Reader for MemoryStore {
    fn read(&self) -> String {
        self.value.lock().unwrap().clone()
    }
}

impl Writer for MemoryStore {
    fn write(&self, value: &str) {
        *self.value.lock().unwrap() = value.to_string();
    }
}

impl Injectable for MemoryStore {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>().build()
    }

    fn construct(_args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self::default())
    }
}

di_abstractions::implements!(MemoryStore: dyn Reader, dyn Writer);

#[test]
fn test_singleton_factory_serves_multiple_identifiers() {
    static READER: ServiceIdentifier<dyn Reader> = ServiceIdentifier::new("reader");
    static WRITER: ServiceIdentifier<dyn Writer> = ServiceIdentifier::new("writer");

    let (services, _) = container();
    let store = SingletonServiceFactory::<MemoryStore>::new();
    services.register_singleton(&READER, store.bind::<dyn Reader>()).unwrap();
    services.register_singleton(&WRITER, store.bind::<dyn Writer>()).unwrap();

    services.get(&WRITER).unwrap().write("shared");
    assert_eq!(services.get(&READER).unwrap().read(), "shared");
    assert!(store.is_created());

    // 单例工厂不能注册为其他生命周期
    assert!(matches!(
        services.register_transient(&READER, store.bind::<dyn Reader>()),
        Err(DependencyError::ScopeMismatch { .. })
    ));
}

#[test]
fn test_identifier_default_factory() {
    fn greeting(_: &dyn ServiceResolver) -> Result<Arc<String>, BoxError> {
        Ok(Arc::new("hello".to_string()))
    }

    static GREETING: ServiceIdentifier<String> = ServiceIdentifier::with_factory("greeting", greeting);
    static PLAIN: ServiceIdentifier<String> = ServiceIdentifier::new("plain");

    let (services, _) = container();
    services.register_default(&GREETING, Lifetime::Singleton).unwrap();
    assert_eq!(services.get(&GREETING).unwrap().as_str(), "hello");

    assert!(matches!(
        services.register_default(&PLAIN, Lifetime::Singleton),
        Err(DependencyError::MissingFactory { .. })
    ));
}

#[test]
fn test_frozen_collection_is_shared_across_threads() {
    let (services, _) = container();
    services.register(&CACHE, Cache::constructor()).unwrap();
    services.freeze();

    let services = Arc::new(services);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let services = services.clone();
            std::thread::spawn(move || services.get(&CACHE).map(|cache| Arc::as_ptr(&cache) as usize))
        })
        .collect();

    let pointers: Vec<usize> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();
    assert!(pointers.windows(2).all(|pair| pair[0] == pair[1]));
}

trait Upstream: Send + Sync {}

trait Downstream: Send + Sync {}

static UPSTREAM: ServiceIdentifier<dyn Upstream> = ServiceIdentifier::new("upstream");
static DOWNSTREAM: ServiceIdentifier<dyn Downstream> = ServiceIdentifier::new("downstream");

/// 以两个契约注册，并依赖其中之一
struct Relay {
    _downstream: Arc<dyn Downstream>,
}

impl Upstream for Relay {}
impl Downstream for Relay {}

impl Injectable for Relay {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .inject(0, &DOWNSTREAM)
            .build()
    }

    fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self {
            _downstream: args.get(0)?,
        })
    }
}

di_abstractions::implements!(Relay: dyn Upstream, dyn Downstream);

#[test]
fn test_cycle_through_shared_singleton_factory_is_detected() {
    let (services, _) = container();
    let relay = SingletonServiceFactory::<Relay>::new();
    services.register_singleton(&UPSTREAM, relay.bind::<dyn Upstream>()).unwrap();
    services.register_singleton(&DOWNSTREAM, relay.bind::<dyn Downstream>()).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let services = Arc::new(services);
    let worker = services.clone();
    std::thread::spawn(move || {
        let _ = tx.send(worker.get(&UPSTREAM).err());
    });

    let err = rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("resolution did not finish");
    match err {
        Some(DependencyError::CircularDependency { path }) => {
            assert_eq!(path, vec!["upstream", "downstream"]);
        }
        other => panic!("expected CircularDependency, got: {other:?}"),
    }
    assert!(!relay.is_created());
}

/// 可释放的共享存储
struct SharedStore {
    counter: Arc<DisposeCounter>,
}

impl Reader for SharedStore {
    fn read(&self) -> String {
        "shared".to_string()
    }
}

impl Writer for SharedStore {
    fn write(&self, _value: &str) {}
}

impl Injectable for SharedStore {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .inject(0, &COUNTER)
            .disposable()
            .build()
    }

    fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self {
            counter: args.get(0)?,
        })
    }
}

impl Disposable for SharedStore {
    fn dispose(&self) {
        self.counter.0.fetch_add(1, Ordering::SeqCst);
    }
}

di_abstractions::implements!(SharedStore: dyn Reader, dyn Writer);

#[test]
fn test_shared_singleton_is_disposed_once() {
    static READER: ServiceIdentifier<dyn Reader> = ServiceIdentifier::new("shared-reader");
    static WRITER: ServiceIdentifier<dyn Writer> = ServiceIdentifier::new("shared-writer");

    let (services, counter) = container();
    let store = SingletonServiceFactory::<SharedStore>::new();
    services.register_singleton(&READER, store.bind::<dyn Reader>()).unwrap();
    services.register_singleton(&WRITER, store.bind::<dyn Writer>()).unwrap();

    services.get(&READER).unwrap();
    services.get(&WRITER).unwrap();
    services.dispose();
    assert_eq!(counter.count(), 1);
}
