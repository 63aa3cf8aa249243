//! 选项服务抽象接口

use crate::options::{OptionsIdentifier, OptionsType};
use crate::provider::OptionsProvider;
use di_abstractions::{ServiceIdentifier, ServiceResolver, ServiceResolverExt};
use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::Value;
use std::sync::Arc;

/// 类型擦除的选项变换
pub type OptionsTransform = Arc<dyn Fn(Value) -> ConfigResult<Value> + Send + Sync>;

/// 选项服务在容器中的标识
pub static OPTIONS_SERVICE: ServiceIdentifier<dyn OptionsService> =
    ServiceIdentifier::new("options-service");

/// 选项服务 trait
///
/// 解析顺序：
/// 1. 从最近注册的提供者开始询问，第一个给出值的提供者胜出
/// 2. 用默认值补齐缺失的键
/// 3. 按注册顺序应用变换
///
/// 验证由 [`OptionsServiceExt::get_options`] 在绑定为具体类型后执行。
pub trait OptionsService: Send + Sync {
    /// 注册选项提供者，后注册的优先
    fn add_options_provider(&self, provider: Arc<dyn OptionsProvider>);

    /// 为选项键追加变换
    fn add_options_transform(&self, key: &str, transform: OptionsTransform);

    /// 解析合并默认值并应用变换后的原始选项值
    fn options_value(&self, key: &str, defaults: &Value) -> ConfigResult<Value>;
}

/// 类型化的选项访问扩展
pub trait OptionsServiceExt: OptionsService {
    /// 解析并验证选项
    fn get_options<T: OptionsType>(&self, id: &OptionsIdentifier<T>) -> ConfigResult<T> {
        let raw = self.options_value(id.key(), id.default_value())?;
        let options = id.bind(raw.clone())?;
        id.validate(&options, &raw)?;
        Ok(options)
    }

    /// 为选项追加变换，先注册的变换先执行
    fn configure_options<T, F>(&self, id: &OptionsIdentifier<T>, transform: F)
    where
        T: OptionsType,
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        let binder = id.clone();
        self.add_options_transform(
            id.key(),
            Arc::new(move |value| {
                let options = transform(binder.bind(value)?);
                serde_json::to_value(options).map_err(|source| ConfigError::OptionsBinding {
                    key: binder.key().to_string(),
                    source,
                })
            }),
        );
    }
}

impl<S: OptionsService + ?Sized> OptionsServiceExt for S {}

/// 通过服务解析器访问选项
pub trait OptionsResolverExt: ServiceResolver {
    /// 从容器中的选项服务解析选项
    fn get_options<T: OptionsType>(&self, id: &OptionsIdentifier<T>) -> ConfigResult<T> {
        let service = self.get(&OPTIONS_SERVICE)?;
        service.get_options(id)
    }
}

impl<R: ServiceResolver + ?Sized> OptionsResolverExt for R {}
