use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    bracketed,
    parse::{Parse, ParseStream},
    token, Expr, Ident, Token, Type,
};

/// A `[[name ...]]` step that reads from the input without producing a field.
pub enum Directive {
    /// `[[magic: T = value]]`
    Magic { ty: Type, value: Expr },
    /// `[[padding_bytes = n]]`
    Skip(Expr),
    /// `[[ignore: T]]`
    Discard(Type),
    /// `[[param: T = name]]`, a local visible to later steps
    Bind { ty: Type, name: Ident },
    /// `[[limit_buffer = n]]`
    Window(Expr),
    /// `[[enum_type = expr]]`, only meaningful for enums
    Select(Expr),
}

impl Directive {
    pub fn peek(input: ParseStream) -> bool {
        input.peek(token::Bracket)
    }

    pub fn to_tokens(&self, order: &TokenStream) -> TokenStream {
        match self {
            Directive::Magic { ty, value } => quote! {
                {
                    let found = input.read_type::<#order, #ty>()?;
                    if found != (#value) {
                        return Err(::parsing::Error::BadMagic {
                            expected: (#value) as u64,
                            found: found as u64,
                        });
                    }
                }
            },
            Directive::Skip(len) => quote! {
                input.skip((#len) as usize)?;
            },
            Directive::Discard(ty) => quote! {
                input.read_type::<#order, #ty>()?;
            },
            Directive::Bind { ty, name } => quote! {
                let #name = input.read_type::<#order, #ty>()?;
            },
            Directive::Window(len) => quote! {
                #[allow(unused_mut)]
                let mut input = input.read_bytes((#len) as usize)?;
            },
            Directive::Select(_) => TokenStream::new(),
        }
    }
}

fn after_colon(input: ParseStream) -> syn::Result<Type> {
    input.parse::<Token![:]>()?;
    input.parse()
}

fn after_eq<T: Parse>(input: ParseStream) -> syn::Result<T> {
    input.parse::<Token![=]>()?;
    input.parse()
}

impl Parse for Directive {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let outer;
        bracketed!(outer in input);
        let inner;
        bracketed!(inner in outer);
        if !outer.is_empty() {
            return Err(outer.error("expected `]]`"));
        }

        let name: Ident = inner.parse()?;
        let directive = match name.to_string().as_str() {
            "magic" => Directive::Magic {
                ty: after_colon(&inner)?,
                value: after_eq(&inner)?,
            },
            "padding_bytes" => Directive::Skip(after_eq(&inner)?),
            "ignore" => Directive::Discard(after_colon(&inner)?),
            "param" => Directive::Bind {
                ty: after_colon(&inner)?,
                name: after_eq(&inner)?,
            },
            "limit_buffer" => Directive::Window(after_eq(&inner)?),
            "enum_type" => Directive::Select(after_eq(&inner)?),
            other => {
                return Err(syn::Error::new(
                    name.span(),
                    format!("unknown parsing directive `{other}`"),
                ))
            }
        };
        if !inner.is_empty() {
            return Err(inner.error("unexpected tokens after directive"));
        }
        Ok(directive)
    }
}
