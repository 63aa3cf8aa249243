//! # 模块组合层
//!
//! 将模块组合成可运行的应用：解析模块依赖并排序，依次执行
//! Initialize → ConfigureServices → Configure 三个生命周期阶段。
//!
//! ## 主要功能
//!
//! - **模块定义**: [`Module`] trait 和闭包形式的 [`ModuleDescriptor`]
//! - **依赖解析**: [`resolve_modules`] 按依赖优先的顺序展开模块列表
//! - **配置绑定**: 模块配置绑定到选项，配置类型在模块之间共享配置 API
//! - **生命周期**: [`ModuleConfigurator::next`] 让模块先等待后续模块完成配置
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{Module, ModuleConfigurator, ModuleLoader, ModuleRef};
//! use async_trait::async_trait;
//!
//! #[derive(Default)]
//! struct WebModule;
//!
//! #[async_trait]
//! impl Module for WebModule {
//!     fn name(&self) -> &str {
//!         "web"
//!     }
//!
//!     async fn configure(&self, configurator: &ModuleConfigurator) -> anyhow::Result<()> {
//!         configurator.next().await?;
//!         println!("web settings: {}", configurator.settings());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let modules = ModuleLoader::new()
//!         .use_module(ModuleRef::of::<WebModule>())
//!         .use_settings(serde_json::json!({ "web": { "port": 8080 } }))
//!         .load()
//!         .await?;
//!
//!     println!("modules: {:?}", modules.module_names());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod collection;
pub mod error;
pub mod lifecycle;
pub mod module;
pub mod resolver;

// 重新导出主要类型
pub use builder::{LoggingConfig, ModuleLoader};
pub use collection::ModuleCollection;
pub use error::{LoadError, LoadResult};
pub use lifecycle::{
    ConfigurationAccessor, ConfigurationRegistration, ConfigurationType, ConfigureCursor,
    ModuleConfigurator, ModuleInitializer, OptionsAccessor, SettingsBinder,
};
pub use module::{Module, ModuleDescriptor, ModuleHandle, ModuleIdentityKey, ModuleRef};
pub use resolver::resolve_modules;
