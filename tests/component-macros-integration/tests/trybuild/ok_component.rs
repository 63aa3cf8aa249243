use component_macros::Injectable;
use di_abstractions::{Injectable, ServiceIdentifier};
use infrastructure_common::Lifetime;
use std::sync::Arc;

pub struct Config;

static CONFIG: ServiceIdentifier<Config> = ServiceIdentifier::new("config");

#[derive(Injectable)]
#[injectable(scoped)]
struct Named {
    #[inject(CONFIG)]
    config: Arc<Config>,
}

#[derive(Injectable)]
struct Tuple(#[inject(CONFIG)] Arc<Config>, #[inject(CONFIG)] Arc<Config>);

#[derive(Injectable)]
#[injectable(transient)]
struct Unit;

fn main() {
    // Ensure the generated descriptors carry the declared lifetime and parameters
    assert_eq!(Named::descriptor().required_lifetime(), Some(Lifetime::Scoped));
    assert_eq!(Tuple::descriptor().required_lifetime(), None);
    assert_eq!(Tuple::descriptor().parameters().unwrap().len(), 2);
    assert!(Unit::descriptor().parameters().unwrap().is_empty());
}
