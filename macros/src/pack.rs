//! Code generation for `#[derive(Pack)]`.

use crate::attr::{self, Container};
use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    parse_quote, Data, DataEnum, DeriveInput, Error, Fields, GenericParam, Generics, Ident,
    Index, LitStr, Member, Result, Type,
};

/// Largest number of variants a plain enum may have (its tag is one byte).
const MAX_VARIANTS: usize = 256;

pub(crate) fn generate(input: DeriveInput) -> Result<TokenStream> {
    let container = Container::from_attrs(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => {
            if container.derived {
                return Err(Error::new_spanned(
                    &input.ident,
                    "`derived` is only supported on enums",
                ));
            }
            generate_struct(&input, &container, &data.fields)
        }
        Data::Enum(data) if container.derived => generate_derived(&input, &container, data),
        Data::Enum(data) => generate_enum(&input, &container, data),
        Data::Union(_) => Err(Error::new_spanned(
            &input.ident,
            "unions cannot derive Pack",
        )),
    }
}

/// A field of a struct or variant.
struct FieldInfo {
    member: Member,
    name: LitStr,
    ty: Type,
    /// Binding used when the field is destructured in a match arm.
    binding: Ident,
}

fn field_infos(fields: &Fields) -> Result<Vec<FieldInfo>> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            attr::reject(&field.attrs)?;
            let (member, name) = match &field.ident {
                Some(ident) => (
                    Member::Named(ident.clone()),
                    LitStr::new(&ident.to_string(), ident.span()),
                ),
                None => (
                    Member::Unnamed(Index::from(i)),
                    LitStr::new(&i.to_string(), Span::call_site()),
                ),
            };
            Ok(FieldInfo {
                member,
                name,
                ty: field.ty.clone(),
                binding: format_ident!("__field{}", i),
            })
        })
        .collect()
}

/// Adds `bound` to every type parameter.
fn with_bound(generics: &Generics, bound: TokenStream) -> Generics {
    let mut generics = generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(param) = param {
            param.bounds.push(parse_quote!(#bound));
        }
    }
    generics
}

fn config_item(container: &Container) -> TokenStream {
    match &container.config {
        Some(config) => quote! {
            const CONFIG: ::structpack_codec::Config = #config;
        },
        None => TokenStream::new(),
    }
}

fn struct_schema(fields: &[FieldInfo]) -> TokenStream {
    let names = fields.iter().map(|f| &f.name);
    let tys = fields.iter().map(|f| &f.ty);
    quote! {
        ::structpack_codec::Schema::Struct {
            fields: &[#(::structpack_codec::Field {
                name: #names,
                schema: <#tys as ::structpack_codec::Describe>::SCHEMA,
            },)*],
        }
    }
}

/// Pattern destructuring `path` into the bindings of `fields`.
fn pattern(path: TokenStream, fields: &[FieldInfo]) -> TokenStream {
    let members = fields.iter().map(|f| &f.member);
    let bindings = fields.iter().map(|f| &f.binding);
    quote!(#path { #(#members: #bindings,)* })
}

fn generate_struct(
    input: &DeriveInput,
    container: &Container,
    fields: &Fields,
) -> Result<TokenStream> {
    let name = &input.ident;
    let fields = field_infos(fields)?;
    let schema = struct_schema(&fields);
    let config = config_item(container);

    let members: Vec<_> = fields.iter().map(|f| &f.member).collect();
    let tys: Vec<_> = fields.iter().map(|f| &f.ty).collect();

    let describe = with_bound(&input.generics, quote!(::structpack_codec::Describe));
    let (impl_generics, ty_generics, where_clause) = describe.split_for_impl();
    let describe_impl = quote! {
        impl #impl_generics ::structpack_codec::Describe for #name #ty_generics #where_clause {
            const SCHEMA: &'static ::structpack_codec::Schema = &#schema;
            #config
        }
    };

    let encode_size = with_bound(&input.generics, quote!(::structpack_codec::EncodeSize));
    let (impl_generics, ty_generics, where_clause) = encode_size.split_for_impl();
    let encode_size_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::EncodeSize for #name #ty_generics #where_clause {
            #[inline]
            fn scan(&self, plan: &mut ::structpack_codec::layout::Plan) {
                #(<#tys as ::structpack_codec::EncodeSize>::scan(&self.#members, plan);)*
            }

            #[inline]
            fn encode_size(&self, layout: &::structpack_codec::layout::Layout) -> usize {
                0 #(+ <#tys as ::structpack_codec::EncodeSize>::encode_size(&self.#members, layout))*
            }
        }
    };

    let write = with_bound(&input.generics, quote!(::structpack_codec::Write));
    let (impl_generics, ty_generics, where_clause) = write.split_for_impl();
    let write_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::Write for #name #ty_generics #where_clause {
            #[inline]
            fn write(
                &self,
                buf: &mut impl ::structpack_codec::bytes::BufMut,
                layout: &::structpack_codec::layout::Layout,
            ) {
                #(<#tys as ::structpack_codec::Write>::write(&self.#members, buf, layout);)*
            }
        }
    };

    let read = with_bound(&input.generics, quote!(::structpack_codec::Read));
    let (impl_generics, ty_generics, where_clause) = read.split_for_impl();
    let read_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::Read for #name #ty_generics #where_clause {
            #[inline]
            fn read_cfg(
                buf: &mut impl ::structpack_codec::bytes::Buf,
                layout: &::structpack_codec::layout::Layout,
            ) -> ::core::result::Result<Self, ::structpack_codec::Error> {
                ::core::result::Result::Ok(Self {
                    #(#members: <#tys as ::structpack_codec::Read>::read_cfg(buf, layout)?,)*
                })
            }

            #[inline]
            fn read_into(
                &mut self,
                buf: &mut impl ::structpack_codec::bytes::Buf,
                layout: &::structpack_codec::layout::Layout,
            ) -> ::core::result::Result<(), ::structpack_codec::Error> {
                #(<#tys as ::structpack_codec::Read>::read_into(&mut self.#members, buf, layout)?;)*
                ::core::result::Result::Ok(())
            }
        }
    };

    let field_impls = (0..fields.len()).map(|i| {
        let index = Literal::usize_unsuffixed(i);
        let ty = tys[i];
        let skipped = &tys[..i];
        quote! {
            impl #impl_generics ::structpack_codec::FieldAt<#index> for #name #ty_generics #where_clause {
                type Value = #ty;

                fn read_field(
                    buf: &mut impl ::structpack_codec::bytes::Buf,
                    layout: &::structpack_codec::layout::Layout,
                ) -> ::core::result::Result<#ty, ::structpack_codec::Error> {
                    #(<#skipped as ::structpack_codec::Read>::skip(buf, layout)?;)*
                    <#ty as ::structpack_codec::Read>::read_cfg(buf, layout)
                }
            }
        }
    });

    // Generic structs are checked when their schema is used as a root.
    let trailing_check = if input.generics.params.is_empty() {
        quote! {
            const _: () = ::core::assert!(
                <#name as ::structpack_codec::Describe>::SCHEMA.compatible_fields_trail(),
                "Compatible fields must follow every other field",
            );
        }
    } else {
        TokenStream::new()
    };

    Ok(quote! {
        #describe_impl
        #encode_size_impl
        #write_impl
        #read_impl
        #(#field_impls)*
        #trailing_check
    })
}

fn generate_enum(
    input: &DeriveInput,
    container: &Container,
    data: &DataEnum,
) -> Result<TokenStream> {
    let name = &input.ident;
    if data.variants.is_empty() {
        return Err(Error::new_spanned(name, "enums without variants cannot derive Pack"));
    }
    if data.variants.len() > MAX_VARIANTS {
        return Err(Error::new_spanned(
            name,
            "enums with more than 256 variants cannot derive Pack",
        ));
    }

    let mut alternatives = Vec::new();
    let mut patterns = Vec::new();
    let mut tags = Vec::new();
    let mut scans = Vec::new();
    let mut sizes = Vec::new();
    let mut writes = Vec::new();
    let mut reads = Vec::new();
    for (i, variant) in data.variants.iter().enumerate() {
        attr::reject(&variant.attrs)?;
        let ident = &variant.ident;
        let fields = field_infos(&variant.fields)?;
        alternatives.push(if fields.is_empty() {
            quote!(&::structpack_codec::Schema::Unit)
        } else {
            let schema = struct_schema(&fields);
            quote!(&#schema)
        });
        patterns.push(pattern(quote!(Self::#ident), &fields));
        tags.push(Literal::u8_suffixed(i as u8));

        let tys: Vec<_> = fields.iter().map(|f| &f.ty).collect();
        let bindings: Vec<_> = fields.iter().map(|f| &f.binding).collect();
        let members = fields.iter().map(|f| &f.member);
        scans.push(quote! {
            #(<#tys as ::structpack_codec::EncodeSize>::scan(#bindings, plan);)*
        });
        sizes.push(quote! {
            0 #(+ <#tys as ::structpack_codec::EncodeSize>::encode_size(#bindings, layout))*
        });
        writes.push(quote! {
            #(<#tys as ::structpack_codec::Write>::write(#bindings, buf, layout);)*
        });
        reads.push(quote! {
            Self::#ident {
                #(#members: <#tys as ::structpack_codec::Read>::read_cfg(buf, layout)?,)*
            }
        });
    }
    let config = config_item(container);

    let describe = with_bound(&input.generics, quote!(::structpack_codec::Describe));
    let (impl_generics, ty_generics, where_clause) = describe.split_for_impl();
    let describe_impl = quote! {
        impl #impl_generics ::structpack_codec::Describe for #name #ty_generics #where_clause {
            const SCHEMA: &'static ::structpack_codec::Schema = &::structpack_codec::Schema::Variant {
                alternatives: &[#(#alternatives,)*],
            };
            #config
        }
    };

    let encode_size = with_bound(&input.generics, quote!(::structpack_codec::EncodeSize));
    let (impl_generics, ty_generics, where_clause) = encode_size.split_for_impl();
    let encode_size_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::EncodeSize for #name #ty_generics #where_clause {
            fn scan(&self, plan: &mut ::structpack_codec::layout::Plan) {
                match self {
                    #(#patterns => { #scans })*
                }
            }

            fn encode_size(&self, layout: &::structpack_codec::layout::Layout) -> usize {
                1 + match self {
                    #(#patterns => { #sizes })*
                }
            }
        }
    };

    let write = with_bound(&input.generics, quote!(::structpack_codec::Write));
    let (impl_generics, ty_generics, where_clause) = write.split_for_impl();
    let write_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::Write for #name #ty_generics #where_clause {
            fn write(
                &self,
                buf: &mut impl ::structpack_codec::bytes::BufMut,
                layout: &::structpack_codec::layout::Layout,
            ) {
                match self {
                    #(#patterns => {
                        <u8 as ::structpack_codec::Write>::write(&#tags, buf, layout);
                        #writes
                    })*
                }
            }
        }
    };

    let read = with_bound(&input.generics, quote!(::structpack_codec::Read));
    let (impl_generics, ty_generics, where_clause) = read.split_for_impl();
    let read_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::Read for #name #ty_generics #where_clause {
            fn read_cfg(
                buf: &mut impl ::structpack_codec::bytes::Buf,
                layout: &::structpack_codec::layout::Layout,
            ) -> ::core::result::Result<Self, ::structpack_codec::Error> {
                let tag = <u8 as ::structpack_codec::Read>::read_cfg(buf, layout)?;
                ::core::result::Result::Ok(match tag {
                    #(#tags => #reads,)*
                    #[allow(unreachable_patterns)]
                    other => {
                        return ::core::result::Result::Err(::structpack_codec::Error::InvalidArgument(
                            ::std::format!("invalid variant index {} for {}", other, ::core::stringify!(#name)),
                        ));
                    }
                })
            }
        }
    };

    Ok(quote! {
        #describe_impl
        #encode_size_impl
        #write_impl
        #read_impl
    })
}

fn generate_derived(
    input: &DeriveInput,
    container: &Container,
    data: &DataEnum,
) -> Result<TokenStream> {
    let name = &input.ident;
    if data.variants.is_empty() {
        return Err(Error::new_spanned(name, "derived sets need at least one member"));
    }

    let mut idents = Vec::new();
    let mut tys = Vec::new();
    for variant in &data.variants {
        attr::reject(&variant.attrs)?;
        let field = match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0],
            _ => {
                return Err(Error::new_spanned(
                    variant,
                    "members of a derived set must wrap exactly one type, as in `Name(Type)`",
                ));
            }
        };
        attr::reject(&field.attrs)?;
        idents.push(&variant.ident);
        tys.push(&field.ty);
    }
    let positions = (0..idents.len()).map(Literal::usize_unsuffixed);
    let config = config_item(container);

    let describe = with_bound(&input.generics, quote!(::structpack_codec::Describe));
    let (impl_generics, ty_generics, where_clause) = describe.split_for_impl();
    let describe_impl = quote! {
        impl #impl_generics ::structpack_codec::Describe for #name #ty_generics #where_clause {
            const SCHEMA: &'static ::structpack_codec::Schema = &::structpack_codec::Schema::Derived {
                types: &[#(<#tys as ::structpack_codec::Describe>::SCHEMA,)*],
            };
            #config
        }

        impl #impl_generics ::structpack_codec::DerivedSet for #name #ty_generics #where_clause {
            const IDS: &'static [u32] = &[
                #(<#tys as ::structpack_codec::Describe>::SCHEMA.derived_id(),)*
            ];

            fn derived_id(&self) -> u32 {
                match self {
                    #(Self::#idents(_) => Self::IDS[#positions],)*
                }
            }
        }
    };

    let encode_size = with_bound(&input.generics, quote!(::structpack_codec::EncodeSize));
    let (impl_generics, ty_generics, where_clause) = encode_size.split_for_impl();
    let encode_size_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::EncodeSize for #name #ty_generics #where_clause {
            fn scan(&self, plan: &mut ::structpack_codec::layout::Plan) {
                match self {
                    #(Self::#idents(value) => <#tys as ::structpack_codec::EncodeSize>::scan(value, plan),)*
                }
            }

            fn encode_size(&self, layout: &::structpack_codec::layout::Layout) -> usize {
                ::structpack_codec::derived::ID_SIZE + match self {
                    #(Self::#idents(value) => <#tys as ::structpack_codec::EncodeSize>::encode_size(value, layout),)*
                }
            }
        }
    };

    let write = with_bound(&input.generics, quote!(::structpack_codec::Write));
    let (impl_generics, ty_generics, where_clause) = write.split_for_impl();
    let write_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::Write for #name #ty_generics #where_clause {
            fn write(
                &self,
                buf: &mut impl ::structpack_codec::bytes::BufMut,
                layout: &::structpack_codec::layout::Layout,
            ) {
                ::structpack_codec::derived::write_id(
                    <Self as ::structpack_codec::DerivedSet>::derived_id(self),
                    buf,
                );
                match self {
                    #(Self::#idents(value) => <#tys as ::structpack_codec::Write>::write(value, buf, layout),)*
                }
            }
        }
    };

    let positions = (0..idents.len()).map(Literal::usize_unsuffixed);
    let read = with_bound(&input.generics, quote!(::structpack_codec::Read));
    let (impl_generics, ty_generics, where_clause) = read.split_for_impl();
    let read_impl = quote! {
        #[allow(unused_variables)]
        impl #impl_generics ::structpack_codec::Read for #name #ty_generics #where_clause {
            fn read_cfg(
                buf: &mut impl ::structpack_codec::bytes::Buf,
                layout: &::structpack_codec::layout::Layout,
            ) -> ::core::result::Result<Self, ::structpack_codec::Error> {
                let id = ::structpack_codec::derived::read_id(buf)?;
                let ids = <Self as ::structpack_codec::DerivedSet>::IDS;
                #(
                    if id == ids[#positions] {
                        return ::core::result::Result::Ok(Self::#idents(
                            <#tys as ::structpack_codec::Read>::read_cfg(buf, layout)?,
                        ));
                    }
                )*
                ::core::result::Result::Err(::structpack_codec::derived::unknown_id(id))
            }
        }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let from_impls = idents.iter().zip(&tys).map(|(ident, ty)| {
        quote! {
            impl #impl_generics ::core::convert::From<#ty> for #name #ty_generics #where_clause {
                fn from(value: #ty) -> Self {
                    Self::#ident(value)
                }
            }
        }
    });

    let base_impl = match &container.base {
        Some(base) => quote! {
            impl #impl_generics #name #ty_generics #where_clause {
                /// Returns the member as its shared interface.
                pub fn as_base(&self) -> &<Self as ::core::ops::Deref>::Target {
                    match self {
                        #(Self::#idents(value) => value,)*
                    }
                }

                /// Returns the member as its shared interface, mutably.
                pub fn as_base_mut(&mut self) -> &mut <Self as ::core::ops::Deref>::Target {
                    match self {
                        #(Self::#idents(value) => value,)*
                    }
                }
            }

            impl #impl_generics ::core::ops::Deref for #name #ty_generics #where_clause {
                type Target = #base;

                fn deref(&self) -> &Self::Target {
                    self.as_base()
                }
            }

            impl #impl_generics ::core::ops::DerefMut for #name #ty_generics #where_clause {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    self.as_base_mut()
                }
            }
        },
        None => TokenStream::new(),
    };

    let distinct_check = if input.generics.params.is_empty() {
        quote! {
            const _: () = ::core::assert!(
                ::structpack_codec::derived::ids_are_distinct(&[
                    #(<#tys as ::structpack_codec::Describe>::SCHEMA,)*
                ]),
                "members of a derived set must have distinct ids",
            );
        }
    } else {
        TokenStream::new()
    };

    Ok(quote! {
        #describe_impl
        #encode_size_impl
        #write_impl
        #read_impl
        #(#from_impls)*
        #base_impl
        #distinct_check
    })
}
