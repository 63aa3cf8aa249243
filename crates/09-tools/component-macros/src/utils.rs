//! 宏工具函数

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{Error, Expr, Field, Index, Result};

/// 读取字段上的 `#[inject(IDENT)]`，返回服务标识表达式
pub fn inject_target(field: &Field) -> Result<Option<Expr>> {
    let mut target = None;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        if target.is_some() {
            return Err(Error::new_spanned(attr, "duplicate #[inject] attribute"));
        }
        target = Some(attr.parse_args::<Expr>()?);
    }
    Ok(target)
}

/// 字段在结构体表达式中的名称，元组结构体使用位置索引
pub fn field_accessor(field: &Field, index: usize) -> TokenStream {
    match &field.ident {
        Some(ident) => ident.to_token_stream(),
        None => {
            let index = Index::from(index);
            quote!(#index)
        }
    }
}
