//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ServiceIdentifier`] - 类型化的服务标识
//! - [`ServiceRegistry`] - 服务注册表接口
//! - [`ServiceResolver`] - 服务解析器接口
//! - [`Injectable`] - 构造函数注入
//! - [`ServiceFactory`] / [`SingletonServiceFactory`] - 服务工厂

pub mod factory;
pub mod identifier;
pub mod registry;
pub mod resolver;

pub use factory::*;
pub use identifier::*;
pub use registry::*;
pub use resolver::*;
