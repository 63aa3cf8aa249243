//! # Component Macros
//!
//! 这个 crate 提供了生成构造函数注入描述符的过程宏。
//!
//! ## 核心宏
//!
//! - [`Injectable`](derive@Injectable) - 为结构体实现 `di_abstractions::Injectable`
//!
//! ## 使用示例
//!
//! ```rust
//! use component_macros::Injectable;
//! use di_abstractions::ServiceIdentifier;
//! use std::sync::Arc;
//!
//! pub struct Settings {
//!     pub url: String,
//! }
//!
//! pub static SETTINGS: ServiceIdentifier<Settings> = ServiceIdentifier::new("settings");
//!
//! #[derive(Injectable)]
//! #[injectable(scoped)]
//! pub struct Repository {
//!     #[inject(SETTINGS)]
//!     settings: Arc<Settings>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod injectable;
mod utils;

/// 可注入类型派生宏
///
/// 每个字段都必须是 `Arc<S>` 并带有 `#[inject(IDENT)]`，字段顺序即参数位置。
/// 缺少 `#[inject]` 的字段会产生编译错误 `all constructor parameters must be injectable`。
///
/// # 类型参数
///
/// - `singleton` / `scoped` / `transient` - 要求的生命周期
/// - `disposable` - 实例在作用域释放时调用 `Disposable::dispose`
/// - `implements(dyn Trait, ..)` - 可以注册到这些 trait 对象契约下
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// #[injectable(singleton, implements(dyn Cache))]
/// pub struct MemoryCache {
///     #[inject(CLOCK)]
///     clock: Arc<dyn Clock>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
