//! # Configuration Abstractions
//!
//! 选项系统抽象层，定义选项标识、选项提供者和选项服务的核心接口。
//!
//! ## 核心接口
//!
//! - [`OptionsIdentifier`] - 选项标识，由 [`create_options`] 创建
//! - [`OptionsProvider`] - 选项提供者接口
//! - [`OptionsService`] - 选项服务接口
//! - [`OptionsValidator`] - 选项验证接口

pub mod manager;
pub mod options;
pub mod provider;
pub mod validator;

pub use manager::*;
pub use options::*;
pub use provider::*;
pub use validator::*;
