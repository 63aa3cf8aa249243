//! 模块加载错误

use infrastructure_common::{ConfigError, DependencyError, ModuleLoadError};
use thiserror::Error;

/// 模块加载过程中的错误
///
/// 生命周期阶段的错误带有出错的模块名称，原始错误作为 source 保留。
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Resolution(#[from] ModuleLoadError),

    #[error(transparent)]
    Settings(#[from] ConfigError),

    #[error(transparent)]
    Container(#[from] DependencyError),

    #[error("Initialize failed for module '{module}'")]
    Initialize {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("ConfigureServices failed for module '{module}'")]
    ConfigureServices {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configure failed for module '{module}'")]
    Configure {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("日志初始化失败: {message}")]
    Logging { message: String },
}

impl LoadError {
    /// 出错的模块名称，非生命周期阶段的错误返回 `None`
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Initialize { module, .. }
            | Self::ConfigureServices { module, .. }
            | Self::Configure { module, .. } => Some(module),
            _ => None,
        }
    }
}

/// 转换生命周期钩子返回的错误
///
/// 钩子内部传出的加载错误和模块解析错误原样保留，其他错误由 `wrap` 附加模块上下文。
pub(crate) fn phase_error(
    source: anyhow::Error,
    wrap: impl FnOnce(anyhow::Error) -> LoadError,
) -> LoadError {
    match source.downcast::<LoadError>() {
        Ok(inner) => inner,
        Err(source) => match source.downcast::<ModuleLoadError>() {
            Ok(inner) => LoadError::Resolution(inner),
            Err(source) => wrap(source),
        },
    }
}

/// 加载结果类型别名
pub type LoadResult<T> = Result<T, LoadError>;
