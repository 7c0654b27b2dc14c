use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Attribute, Expr, Field, Ident, Token, Type};

enum Read {
    /// `T::parse`
    Value(Type),
    /// `sized_utf8_string = len`
    Utf8(Expr),
    /// `sized_buf = len`
    Bytes(Expr),
    /// `rest_of_buf`
    Rest,
    /// `collection: Item = count`
    Many {
        item: Type,
        count: Expr,
        collection: Type,
    },
}

/// How one named field is read, built from its type and `#[parse(...)]` attributes.
pub struct FieldRead {
    name: Ident,
    read: Read,
    only_if: Option<Expr>,
}

pub fn is_parse_attr(attr: &Attribute) -> bool {
    attr.path().is_ident("parse")
}

impl FieldRead {
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let name = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "only named fields can be parsed"))?;
        let mut out = Self {
            name,
            read: Read::Value(field.ty.clone()),
            only_if: None,
        };
        for attr in field.attrs.iter().filter(|attr| is_parse_attr(attr)) {
            out.apply(attr, &field.ty)?;
        }
        Ok(out)
    }

    fn apply(&mut self, attr: &Attribute, field_ty: &Type) -> syn::Result<()> {
        attr.parse_nested_meta(|meta| {
            let Some(key) = meta.path.get_ident().map(Ident::to_string) else {
                return Err(meta.error("expected a parse option"));
            };
            match key.as_str() {
                "sized_utf8_string" => self.read = Read::Utf8(meta.value()?.parse()?),
                "sized_buf" => self.read = Read::Bytes(meta.value()?.parse()?),
                "rest_of_buf" => self.read = Read::Rest,
                "collection" => {
                    meta.input.parse::<Token![:]>()?;
                    let item = meta.input.parse()?;
                    let count = meta.value()?.parse()?;
                    self.read = Read::Many {
                        item,
                        count,
                        collection: field_ty.clone(),
                    };
                }
                "option_if" => {
                    meta.input.parse::<Token![:]>()?;
                    self.read = Read::Value(meta.input.parse()?);
                    self.only_if = Some(meta.value()?.parse()?);
                }
                _ => return Err(meta.error(format!("unsupported parse option `{key}`"))),
            }
            Ok(())
        })
    }

    pub fn to_tokens(&self, order: &TokenStream) -> TokenStream {
        let value = match &self.read {
            Read::Value(ty) => quote! { input.read_type::<#order, #ty>()? },
            Read::Utf8(len) => quote! {
                ::core::str::from_utf8(input.read_bytes((#len) as usize)?)?.into()
            },
            Read::Bytes(len) => quote! { input.read_bytes((#len) as usize)?.into() },
            Read::Rest => quote! { input.read_rest().into() },
            Read::Many {
                item,
                count,
                collection,
            } => quote! {
                (0..(#count))
                    .map(|_| input.read_type::<#order, #item>())
                    .collect::<::parsing::Result<#collection>>()?
            },
        };

        let name = &self.name;
        match &self.only_if {
            Some(condition) => quote! {
                let #name = if #condition { Some(#value) } else { None };
            },
            None => quote! {
                let #name = #value;
            },
        }
    }
}
