//! Injectable 派生类型在模块加载中的集成测试

use component_macros::Injectable;
use di_abstractions::{Injectable, ServiceIdentifier, ServiceRegistry, ServiceResolverExt};
use di_impl::ServiceCollection;
use infrastructure_common::{DependencyError, Lifetime};
use infrastructure_composition::{LoadError, ModuleDescriptor, ModuleLoader};
use serde_json::json;
use std::sync::Arc;

pub struct Greeting(String);

static GREETING: ServiceIdentifier<Greeting> = ServiceIdentifier::new("greeting");
static GREETER: ServiceIdentifier<Greeter> = ServiceIdentifier::new("greeter");
static REQUEST: ServiceIdentifier<RequestContext> = ServiceIdentifier::new("request-context");
static LEAKY: ServiceIdentifier<LeakyCache> = ServiceIdentifier::new("leaky-cache");

#[derive(Injectable)]
#[injectable(singleton)]
pub struct Greeter {
    #[inject(GREETING)]
    greeting: Arc<Greeting>,
}

#[derive(Injectable)]
#[injectable(scoped)]
pub struct RequestContext;

#[derive(Injectable)]
#[injectable(singleton)]
pub struct LeakyCache {
    #[inject(REQUEST)]
    _request: Arc<RequestContext>,
}

fn greeter_module() -> ModuleDescriptor {
    ModuleDescriptor::new("greeter").on_configure_services(|services: &ServiceCollection| {
        services.register_instance(&GREETING, Arc::new(Greeting("hello".to_string())))?;
        services.register(&GREETER, Greeter::constructor())?;
        Ok(())
    })
}

#[tokio::test]
async fn derived_services_resolve_after_load() {
    let modules = ModuleLoader::load_modules(vec![greeter_module().into()], json!({}))
        .await
        .unwrap();

    let greeter = modules.services().get(&GREETER).unwrap();
    assert_eq!(greeter.greeting.0, "hello");
    assert_eq!(Greeter::descriptor().required_lifetime(), Some(Lifetime::Singleton));
}

#[tokio::test]
async fn singleton_capturing_scoped_service_fails_configure() {
    let app = ModuleDescriptor::new("app")
        .on_configure_services(|services: &ServiceCollection| {
            services.register(&REQUEST, RequestContext::constructor())?;
            services.register(&LEAKY, LeakyCache::constructor())?;
            Ok(())
        })
        .on_configure(|configurator| async move {
            configurator.services().get(&LEAKY)?;
            Ok(())
        });

    let err = ModuleLoader::new().use_module(app).load().await.unwrap_err();
    match err {
        LoadError::Configure { module, source } => {
            assert_eq!(module, "app");
            assert!(matches!(
                source.downcast_ref::<DependencyError>(),
                Some(DependencyError::InvalidLifetimeReference { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}
