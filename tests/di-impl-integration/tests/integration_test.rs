//! Centralized integration tests for di-impl crate
use di_abstractions::{implements, ScopeFactory, ServiceRegistry};
use di_impl::{
    Injectable, InjectableDescriptor, InjectionArgs, ServiceCollection, ServiceFactory,
    ServiceIdentifier, ServiceResolverExt,
};
use infrastructure_common::{BoxError, DependencyError, Disposable, Lifetime};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 日志契约
trait Logger: Send + Sync {
    fn prefix(&self) -> String;
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn prefix(&self) -> String {
        "console".to_string()
    }
}

impl Injectable for ConsoleLogger {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .lifetime(Lifetime::Singleton)
            .build()
    }

    fn construct(_args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self)
    }
}

implements!(ConsoleLogger: dyn Logger);

static LOGGER: ServiceIdentifier<dyn Logger> = ServiceIdentifier::new("logger");

/// 依赖日志契约的作用域服务
struct OrderHandler {
    logger: Arc<dyn Logger>,
    disposed: Arc<AtomicUsize>,
}

static DISPOSED: ServiceIdentifier<AtomicUsize> = ServiceIdentifier::new("disposed");

impl Injectable for OrderHandler {
    fn descriptor() -> InjectableDescriptor {
        InjectableDescriptor::builder::<Self>()
            .lifetime(Lifetime::Scoped)
            .inject(0, &LOGGER)
            .inject(1, &DISPOSED)
            .disposable()
            .build()
    }

    fn construct(args: InjectionArgs) -> Result<Self, BoxError> {
        Ok(Self {
            logger: args.get(0)?,
            disposed: args.get(1)?,
        })
    }
}

impl Disposable for OrderHandler {
    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

static HANDLER: ServiceIdentifier<OrderHandler> = ServiceIdentifier::new("order-handler");

fn root() -> anyhow::Result<(ServiceCollection, Arc<AtomicUsize>)> {
    let services = ServiceCollection::new();
    let disposed = Arc::new(AtomicUsize::new(0));
    services.register(&LOGGER, ConsoleLogger::constructor())?;
    services.register_instance(&DISPOSED, disposed.clone())?;
    services.register(&HANDLER, OrderHandler::constructor())?;
    services.freeze();
    Ok((services, disposed))
}

#[test]
fn test_trait_contract_injection() -> anyhow::Result<()> {
    let (services, _) = root()?;
    let scope = services.create_scope();
    let handler = scope.get(&HANDLER)?;
    assert_eq!(handler.logger.prefix(), "console");
    assert!(Arc::ptr_eq(&handler.logger, &services.get(&LOGGER)?));
    Ok(())
}

#[test]
fn test_nested_scopes_keep_their_own_instances() -> anyhow::Result<()> {
    let (services, disposed) = root()?;
    let outer = services.create_scope();
    let inner = outer.create_scope();

    let outer_handler = outer.get(&HANDLER)?;
    let inner_handler = inner.get(&HANDLER)?;
    assert!(!Arc::ptr_eq(&outer_handler, &inner_handler));
    assert!(inner.scope_info().name.starts_with("root.scope"));

    inner.dispose();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    outer.dispose();
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_disposed_scope_no_longer_resolves() -> anyhow::Result<()> {
    let (services, _) = root()?;
    let scope = services.create_scope();
    scope.get(&HANDLER)?;
    scope.dispose();
    assert!(matches!(
        scope.get(&HANDLER),
        Err(DependencyError::ServiceNotRegistered { .. })
    ));
    // 根集合不受影响
    assert!(services.get(&LOGGER).is_ok());
    Ok(())
}

#[test]
fn test_try_get_still_reports_construction_errors() -> anyhow::Result<()> {
    static FLAKY: ServiceIdentifier<String> = ServiceIdentifier::new("flaky");
    let services = ServiceCollection::new();
    services.register_transient(&FLAKY, ServiceFactory::new(|_| Err("offline".into())))?;

    assert!(matches!(
        services.try_get(&FLAKY),
        Err(DependencyError::ObjectCreate { .. })
    ));
    Ok(())
}

#[test]
fn test_registration_after_freeze_fails() -> anyhow::Result<()> {
    let (services, _) = root()?;
    let err = services
        .register_instance(&DISPOSED, Arc::new(AtomicUsize::new(0)))
        .unwrap_err();
    assert!(matches!(err, DependencyError::RegistryFrozen { ref key } if key == "disposed"));
    Ok(())
}
