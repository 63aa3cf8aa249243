//! # Configuration Implementation
//!
//! 选项系统和模块配置的具体实现。
//!
//! ## 主要组件
//!
//! - [`OptionsManager`] - 选项服务实现
//! - [`SettingsCollection`] - 模块配置存储
//! - [`FileSettingsSource`] / [`EnvironmentSettingsSource`] - 配置源
//! - [`SettingsOptionsProvider`] - 模块配置到选项的绑定

pub mod binder;
pub mod manager;
pub mod providers;
pub mod settings;

pub use binder::*;
pub use manager::*;
pub use providers::*;
pub use settings::*;
