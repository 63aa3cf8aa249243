//! 加载完成的模块集合

use crate::module::{Module, ModuleHandle};
use di_impl::ServiceCollection;
use std::fmt;
use std::sync::Arc;

/// 加载完成的模块集合
///
/// 持有按依赖顺序排列的模块实例和已冻结的根服务集合。
pub struct ModuleCollection {
    modules: Vec<ModuleHandle>,
    services: Arc<ServiceCollection>,
}

impl ModuleCollection {
    pub(crate) fn new(modules: Vec<ModuleHandle>, services: Arc<ServiceCollection>) -> Self {
        Self { modules, services }
    }

    /// 根服务集合
    pub fn services(&self) -> &Arc<ServiceCollection> {
        &self.services
    }

    /// 获取指定类型的模块实例
    pub fn get_instance<M: Module>(&self) -> Option<Arc<M>> {
        self.modules.iter().find_map(ModuleHandle::downcast::<M>)
    }

    /// 按名称获取模块
    pub fn get(&self, name: &str) -> Option<&ModuleHandle> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// 依赖顺序的模块名称
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(ModuleHandle::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleHandle> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCollection")
            .field("modules", &self.module_names())
            .field("services", &self.services.len())
            .finish()
    }
}
