//! # Infrastructure Common
//!
//! 这个 crate 提供了基础设施层的公共类型：错误分类、服务生命周期、
//! 元数据以及配置值合并工具。
//!
//! ## 核心类型
//!
//! - [`Lifetime`] - 服务生命周期
//! - [`Disposable`] - 作用域释放时的资源清理
//! - [`DependencyError`] / [`ModuleLoadError`] / [`ConfigError`] - 错误分类
//! - [`merge_settings`] - 配置深度合并
//!
//! ## 设计原则
//!
//! - 没有进程级的全局状态，所有注册都由调用方显式完成
//! - 错误在核心内部不做恢复，直接传递给加载调用方

pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
