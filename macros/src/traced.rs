//! Code generation for `#[test_traced]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{AttributeArgs, Error, ItemFn, Lit, Meta, NestedMeta, Result};

const LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

pub(crate) fn generate(args: AttributeArgs, item: ItemFn) -> Result<TokenStream> {
    let mut level = String::from("DEBUG");
    for arg in args {
        match arg {
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("level") => match &nv.lit {
                Lit::Str(s) if LEVELS.contains(&s.value().to_uppercase().as_str()) => {
                    level = s.value().to_uppercase();
                }
                other => {
                    return Err(Error::new_spanned(
                        other,
                        "expected one of \"TRACE\", \"DEBUG\", \"INFO\", \"WARN\" or \"ERROR\"",
                    ));
                }
            },
            other => return Err(Error::new_spanned(other, "unknown test_traced argument")),
        }
    }
    let level = format_ident!("{}", level);

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item;
    Ok(quote! {
        #[test]
        #(#attrs)*
        #vis #sig {
            let _ = ::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(::tracing::Level::#level)
                .try_init();
            #block
        }
    })
}
