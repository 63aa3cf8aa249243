//! Injectable 派生宏集成测试

use component_macros::Injectable;
use di_abstractions::{
    Injectable, ScopeFactory, ServiceIdentifier, ServiceRegistry, ServiceResolverExt,
};
use di_impl::ServiceCollection;
use infrastructure_common::{DependencyError, Disposable, Lifetime};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

pub struct Settings {
    pub prefix: String,
}

static CLOCK: ServiceIdentifier<dyn Clock> = ServiceIdentifier::new("clock");
static SETTINGS: ServiceIdentifier<Settings> = ServiceIdentifier::new("settings");
static STAMPER: ServiceIdentifier<Stamper> = ServiceIdentifier::new("stamper");
static SESSION: ServiceIdentifier<Session> = ServiceIdentifier::new("session");
static LABEL: ServiceIdentifier<dyn Label> = ServiceIdentifier::new("label");

#[derive(Injectable)]
#[injectable(singleton)]
pub struct Stamper {
    #[inject(CLOCK)]
    clock: Arc<dyn Clock>,
    #[inject(SETTINGS)]
    settings: Arc<Settings>,
}

impl std::fmt::Debug for Stamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stamper").finish_non_exhaustive()
    }
}

impl Stamper {
    fn stamp(&self, message: &str) -> String {
        format!("{}[{}] {}", self.settings.prefix, self.clock.now(), message)
    }
}

static DISPOSED: AtomicUsize = AtomicUsize::new(0);

#[derive(Injectable)]
#[injectable(scoped, disposable)]
pub struct Session(#[inject(STAMPER)] Arc<Stamper>);

impl Disposable for Session {
    fn dispose(&self) {
        DISPOSED.fetch_add(1, Ordering::SeqCst);
    }
}

pub trait Label: Send + Sync {
    fn label(&self) -> &'static str;
}

#[derive(Injectable)]
#[injectable(transient, implements(dyn Label))]
pub struct StaticLabel;

impl Label for StaticLabel {
    fn label(&self) -> &'static str {
        "static"
    }
}

fn services() -> ServiceCollection {
    let services = ServiceCollection::new();
    services
        .register_instance(&CLOCK, Arc::new(FixedClock(42)) as Arc<dyn Clock>)
        .unwrap();
    services
        .register_instance(
            &SETTINGS,
            Arc::new(Settings {
                prefix: "> ".to_string(),
            }),
        )
        .unwrap();
    services
}

#[test]
fn descriptor_lists_injected_fields_in_order() {
    let descriptor = Stamper::descriptor();
    assert_eq!(descriptor.required_lifetime(), Some(Lifetime::Singleton));
    let parameters = descriptor.parameters().unwrap();
    assert_eq!(parameters.len(), 2);
    assert_eq!(parameters[0].as_str(), "clock");
    assert_eq!(parameters[1].as_str(), "settings");
}

#[test]
fn derived_constructor_resolves_dependencies() {
    let services = services();
    services.register(&STAMPER, Stamper::constructor()).unwrap();

    let stamper = services.get(&STAMPER).unwrap();
    assert_eq!(stamper.stamp("ready"), "> [42] ready");
    assert!(Arc::ptr_eq(&stamper, &services.get(&STAMPER).unwrap()));
}

#[test]
fn disposable_scoped_service_is_disposed_with_scope() {
    let services = services();
    services.register(&STAMPER, Stamper::constructor()).unwrap();
    services.register(&SESSION, Session::constructor()).unwrap();
    services.freeze();

    let before = DISPOSED.load(Ordering::SeqCst);
    let scope = services.create_scope();
    let session = scope.get(&SESSION).unwrap();
    assert_eq!(session.0.stamp("x"), "> [42] x");
    scope.dispose();
    assert_eq!(DISPOSED.load(Ordering::SeqCst), before + 1);
}

#[test]
fn implements_registers_trait_contract() {
    let services = ServiceCollection::new();
    services.register(&LABEL, StaticLabel::constructor()).unwrap();

    let first = services.get(&LABEL).unwrap();
    let second = services.get(&LABEL).unwrap();
    assert_eq!(first.label(), "static");
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn missing_dependency_surfaces_at_resolution() {
    let services = ServiceCollection::new();
    services.register(&STAMPER, Stamper::constructor()).unwrap();

    let err = services.get(&STAMPER).unwrap_err();
    assert!(matches!(err, DependencyError::ServiceNotRegistered { ref key } if key == "clock"));
}
