//! Parsing of `#[structpack(...)]` container attributes.

use syn::{parse::Parse, Attribute, Error, Expr, Lit, Meta, NestedMeta, Result, Type};

/// Options set on the deriving type.
#[derive(Default)]
pub(crate) struct Container {
    /// Expression for `Describe::CONFIG`.
    pub(crate) config: Option<Expr>,
    /// The enum is a closed set of derived types.
    pub(crate) derived: bool,
    /// Interface shared by every member of a derived set.
    pub(crate) base: Option<Type>,
}

impl Container {
    pub(crate) fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut container = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path.is_ident("structpack")) {
            let Meta::List(list) = attr.parse_meta()? else {
                return Err(Error::new_spanned(attr, "expected #[structpack(...)]"));
            };
            for nested in list.nested {
                match nested {
                    NestedMeta::Meta(Meta::Path(path)) if path.is_ident("derived") => {
                        container.derived = true;
                    }
                    NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("config") => {
                        container.config = Some(parse_lit(&nv.lit)?);
                    }
                    NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("base") => {
                        container.base = Some(parse_lit(&nv.lit)?);
                    }
                    other => {
                        return Err(Error::new_spanned(other, "unknown structpack attribute"));
                    }
                }
            }
        }
        if container.base.is_some() && !container.derived {
            return Err(Error::new_spanned(
                &attrs[0],
                "`base` requires `derived`",
            ));
        }
        Ok(container)
    }
}

/// Rejects `#[structpack]` on fields and variants, where no options exist.
pub(crate) fn reject(attrs: &[Attribute]) -> Result<()> {
    match attrs.iter().find(|attr| attr.path.is_ident("structpack")) {
        Some(attr) => Err(Error::new_spanned(
            attr,
            "structpack attributes are only supported on the type",
        )),
        None => Ok(()),
    }
}

fn parse_lit<T: Parse>(lit: &Lit) -> Result<T> {
    match lit {
        Lit::Str(s) => s.parse(),
        other => Err(Error::new_spanned(other, "expected a string literal")),
    }
}
