//! 模块依赖解析
//!
//! 把模块引用列表展开成依赖闭包，并按依赖优先的深度优先顺序排序。

use crate::module::{ModuleHandle, ModuleIdentity, ModuleRef};
use futures::future::{BoxFuture, FutureExt};
use infrastructure_common::{ModuleLoadError, ModuleLoadResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// 解析模块列表，返回依赖优先的模块顺序
///
/// - 同一个模块类型在一次解析中最多创建一个实例
/// - 同一个模块类型的两个不同实例返回 [`ModuleLoadError::DuplicateInstances`]
/// - 循环依赖返回 [`ModuleLoadError::CircularDependency`]，带有完整的循环路径
pub async fn resolve_modules(modules: Vec<ModuleRef>) -> ModuleLoadResult<Vec<ModuleHandle>> {
    let mut resolver = ModuleResolver::default();

    let mut roots = Vec::with_capacity(modules.len());
    for module in modules {
        roots.push(resolver.settle(module).await?);
    }

    // 先登记调用方直接提供的实例，构造器引用会复用它们
    for root in &roots {
        if let ModuleRef::Instance(handle) = root {
            resolver.claim(handle.clone())?;
        }
    }

    for root in roots {
        let handle = resolver.materialize(root).await?;
        let mut ancestors = Vec::new();
        resolver.visit(handle, &mut ancestors).await?;
    }

    info!(
        "模块解析完成: [{}]",
        resolver
            .sorted
            .iter()
            .map(ModuleHandle::name)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(resolver.sorted)
}

#[derive(Default)]
struct ModuleResolver {
    instances: HashMap<ModuleIdentity, ModuleHandle>,
    names: HashMap<String, ModuleHandle>,
    visited: HashSet<String>,
    sorted: Vec<ModuleHandle>,
}

impl ModuleResolver {
    /// 等待延迟引用，得到构造器或实例引用
    fn settle(&mut self, module: ModuleRef) -> BoxFuture<'_, ModuleLoadResult<ModuleRef>> {
        async move {
            match module {
                ModuleRef::Deferred(future) => {
                    let inner = future
                        .await
                        .map_err(|source| ModuleLoadError::DeferredModule { source })?;
                    self.settle(inner).await
                }
                other => Ok(other),
            }
        }
        .boxed()
    }

    fn claim(&mut self, handle: ModuleHandle) -> ModuleLoadResult<ModuleHandle> {
        match self.instances.get(&handle.identity) {
            Some(existing) => {
                let duplicate = matches!(handle.identity, ModuleIdentity::Type(_))
                    && !existing.same_instance(&handle);
                if duplicate {
                    return Err(ModuleLoadError::DuplicateInstances {
                        module: handle.name().to_string(),
                    });
                }
                Ok(existing.clone())
            }
            None => {
                self.instances.insert(handle.identity.clone(), handle.clone());
                Ok(handle)
            }
        }
    }

    fn materialize(&mut self, module: ModuleRef) -> BoxFuture<'_, ModuleLoadResult<ModuleHandle>> {
        async move {
            match module {
                ModuleRef::Deferred(future) => {
                    let inner = future
                        .await
                        .map_err(|source| ModuleLoadError::DeferredModule { source })?;
                    self.materialize(inner).await
                }
                ModuleRef::Constructor { identity, create } => {
                    if let Some(existing) = self.instances.get(&identity.identity) {
                        return Ok(existing.clone());
                    }
                    debug!("创建模块实例: {}", identity.type_name);
                    let handle = create();
                    self.instances.insert(identity.identity, handle.clone());
                    Ok(handle)
                }
                ModuleRef::Instance(handle) => self.claim(handle),
            }
        }
        .boxed()
    }

    fn visit<'a>(
        &'a mut self,
        handle: ModuleHandle,
        ancestors: &'a mut Vec<String>,
    ) -> BoxFuture<'a, ModuleLoadResult<()>> {
        async move {
            let name = handle.name().to_string();

            if let Some(position) = ancestors.iter().position(|ancestor| *ancestor == name) {
                let mut path = ancestors[position..].to_vec();
                path.push(name);
                return Err(ModuleLoadError::CircularDependency { path });
            }

            if let Some(existing) = self.names.get(&name) {
                if existing.identity != handle.identity {
                    return Err(ModuleLoadError::NameConflict {
                        name,
                        first: existing.type_name,
                        second: handle.type_name,
                    });
                }
            }

            if self.visited.contains(&name) {
                return Ok(());
            }

            ancestors.push(name.clone());
            for dependency in handle.module().dependencies() {
                let dependency = self.materialize(dependency).await?;
                self.visit(dependency, ancestors).await?;
            }
            ancestors.pop();

            debug!("模块已排序: {}", name);
            self.names.insert(name.clone(), handle.clone());
            self.visited.insert(name);
            self.sorted.push(handle);
            Ok(())
        }
        .boxed()
    }
}
