//! Procedural macros for `structpack-codec`.
//!
//! Use the macros through `structpack_codec`, which re-exports [macro@Pack].

use proc_macro::TokenStream;
use syn::{parse_macro_input, AttributeArgs, DeriveInput, ItemFn};

mod attr;
mod pack;
mod traced;

/// Derive `Describe`, `EncodeSize`, `Write` and `Read` for a struct or enum.
///
/// Structs are encoded as their fields in declaration order. Each field `I` also gets a
/// `FieldAt<I>` implementation, used by `get_field`. `Compatible` fields must come last.
///
/// Enums are encoded as a one-byte variant index followed by the variant's fields.
///
/// # Attributes
///
/// - `#[structpack(config = "...")]`: constant expression used as `Describe::CONFIG`. Combine
///   flags with `Config::union`, as `|` is not available in constants.
/// - `#[structpack(derived)]`: the enum is a closed set of derived types. Every variant must
///   wrap exactly one type and is encoded as that type's id followed by its encoding.
/// - `#[structpack(derived, base = "dyn Trait")]`: additionally generates `as_base`,
///   `as_base_mut` and `Deref` to the shared interface.
///
/// # Example
///
/// ```ignore
/// #[derive(Pack)]
/// #[structpack(config = "Config::DISABLE_ALL_META_INFO.union(Config::ENCODING_WITH_VARINT)")]
/// struct Rect {
///     x: i32,
///     y: i32,
///     w: u32,
///     h: u32,
/// }
/// ```
#[proc_macro_derive(Pack, attributes(structpack))]
pub fn derive_pack(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    pack::generate(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Run a test with a `tracing` subscriber that writes to the test output.
///
/// The subscriber records events at `level` and above (`DEBUG` by default). Requires `tracing`
/// and `tracing-subscriber` in the calling crate.
///
/// # Example
///
/// ```ignore
/// #[test_traced(level = "INFO")]
/// fn test_decode() {
///     tracing::info!("visible");
/// }
/// ```
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let item = parse_macro_input!(item as ItemFn);
    traced::generate(args, item)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
