//! # 示例应用程序
//!
//! 演示模块加载：配置文件和环境变量合并、模块依赖排序、
//! 配置类型共享以及 `next()` 延后配置。

use async_trait::async_trait;
use clap::Parser;
use component_macros::Injectable;
use config_abstractions::{create_options, OptionsIdentifier};
use di_abstractions::{Injectable, ServiceIdentifier, ServiceRegistry, ServiceResolverExt};
use di_impl::ServiceCollection;
use infrastructure_composition::{
    ConfigurationType, LoggingConfig, Module, ModuleConfigurator, ModuleInitializer, ModuleLoader,
    ModuleRef,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 模块加载示例")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/app.toml")]
    config: String,

    /// 环境变量前缀
    #[arg(long, default_value = "ADSP")]
    env_prefix: String,

    /// 使用开发环境日志配置
    #[arg(long)]
    dev: bool,
}

/// HTTP 服务选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
}

static SERVER_OPTIONS: Lazy<OptionsIdentifier<ServerOptions>> = Lazy::new(|| {
    create_options(
        "server",
        ServerOptions {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
    )
    .validate_with("port", |options: &ServerOptions| {
        if options.port == 0 {
            Err(infrastructure_common::ValidationError::ValidationFailed {
                message: "端口不能为 0".to_string(),
            })
        } else {
            Ok(())
        }
    })
});

/// 路由表，由 web 模块提供，其他模块在 Configure 阶段追加路由
#[derive(Debug, Default)]
pub struct Routes {
    paths: Mutex<Vec<String>>,
}

impl Routes {
    pub fn add(&self, path: impl Into<String>) {
        self.paths.lock().push(path.into());
    }
}

static ROUTES: ConfigurationType<Arc<Routes>> = ConfigurationType::new("routes");

pub struct Banner(String);

static BANNER: ServiceIdentifier<Banner> = ServiceIdentifier::new("banner");
static GREETER: ServiceIdentifier<Greeter> = ServiceIdentifier::new("greeter");

#[derive(Injectable)]
#[injectable(singleton)]
pub struct Greeter {
    #[inject(BANNER)]
    banner: Arc<Banner>,
}

/// web 模块：注册路由配置类型，等待依赖它的模块追加路由后再输出
#[derive(Default)]
struct WebModule {
    routes: Arc<Routes>,
}

#[async_trait]
impl Module for WebModule {
    fn name(&self) -> &str {
        "web"
    }

    fn initialize(&self, initializer: &mut ModuleInitializer<'_>) -> anyhow::Result<()> {
        initializer
            .settings()
            .bind_to_options(&SERVER_OPTIONS, Some("server"));
        let routes = self.routes.clone();
        initializer.config(&ROUTES).register(move |_| Ok(routes.clone()))?;
        Ok(())
    }

    fn configure_services(&self, services: &ServiceCollection) -> anyhow::Result<()> {
        services.register_instance(&BANNER, Arc::new(Banner("Lorn ADSP".to_string())))?;
        services.register(&GREETER, Greeter::constructor())?;
        Ok(())
    }

    async fn configure(&self, configurator: &ModuleConfigurator) -> anyhow::Result<()> {
        configurator.next().await?;

        let server = configurator.options().get(&SERVER_OPTIONS)?;
        let greeter = configurator.services().get(&GREETER)?;
        info!(
            "{} 监听 {}:{}，路由: {:?}",
            greeter.banner.0,
            server.host,
            server.port,
            self.routes.paths.lock()
        );
        Ok(())
    }
}

/// 报表模块：依赖 web 模块，向路由表追加自己的路由
#[derive(Default)]
struct ReportsModule;

#[async_trait]
impl Module for ReportsModule {
    fn name(&self) -> &str {
        "reports"
    }

    fn dependencies(&self) -> Vec<ModuleRef> {
        vec![ModuleRef::of::<WebModule>()]
    }

    async fn configure(&self, configurator: &ModuleConfigurator) -> anyhow::Result<()> {
        let prefix = configurator.settings()["prefix"]
            .as_str()
            .unwrap_or("/reports")
            .to_string();
        let routes = configurator.config().get(&ROUTES)?;
        routes.add(format!("{}/daily", prefix));
        routes.add(format!("{}/monthly", prefix));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = if args.dev {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };

    let mut loader = ModuleLoader::new()
        .with_logging(logging)
        .use_module(ModuleRef::of::<ReportsModule>());

    // 添加配置文件（如果存在）
    if std::path::Path::new(&args.config).exists() {
        loader = loader.use_settings_file(&args.config);
    } else {
        info!("配置文件不存在，将使用默认配置和环境变量");
    }
    loader = loader.use_environment(args.env_prefix);

    let modules = loader.load().await?;
    info!("已加载模块: {:?}", modules.module_names());
    Ok(())
}
