//! Code generation for `parsing::Parse`.
//!
//! Each macro turns a declarative wire layout into two `Parse` impls, one per
//! byte order. Layouts are a sequence of steps run top to bottom: named fields
//! become struct fields, `[[directives]]` only move the input along.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    braced, parse::Parse, parse::ParseStream, parse_macro_input, parse_quote,
    punctuated::Punctuated, spanned::Spanned, Attribute, Field, Fields, FieldsNamed, GenericParam,
    Generics, Ident, ItemEnum, ItemStruct, Lifetime, LifetimeParam, Token, Variant, Visibility,
};

mod directive;
mod field;

use directive::Directive;
use field::{is_parse_attr, FieldRead};

enum Step {
    Directive(Directive),
    Field(FieldRead),
}

impl Step {
    fn to_tokens(&self, order: &proc_macro2::TokenStream) -> proc_macro2::TokenStream {
        match self {
            Step::Directive(directive) => directive.to_tokens(order),
            Step::Field(field) => field.to_tokens(order),
        }
    }
}

/// Emits a `Parse` impl for little and big endian.
///
/// The input lifetime outlives every lifetime of the target type, so borrowed
/// fields can point straight into the input.
fn impl_parse(
    ident: &Ident,
    generics: &Generics,
    body: impl Fn(&proc_macro2::TokenStream) -> proc_macro2::TokenStream,
) -> proc_macro2::TokenStream {
    let input_lifetime = Lifetime::new("'input", Span::call_site());

    let mut impl_generics = generics.clone();
    impl_generics.params.insert(
        0,
        GenericParam::Lifetime(LifetimeParam::new(input_lifetime.clone())),
    );
    let outlived: Punctuated<Lifetime, Token![+]> = generics
        .lifetimes()
        .map(|param| param.lifetime.clone())
        .collect();
    if !outlived.is_empty() {
        impl_generics
            .make_where_clause()
            .predicates
            .push(parse_quote!(#input_lifetime: #outlived));
    }
    let (impl_params, _, where_clause) = impl_generics.split_for_impl();
    let (_, type_params, _) = generics.split_for_impl();

    let impls = [quote!(::parsing::LE), quote!(::parsing::BE)]
        .into_iter()
        .map(|order| {
            let body = body(&order);
            quote! {
                impl #impl_params ::parsing::Parse<#input_lifetime, #order> for #ident #type_params #where_clause {
                    fn parse(input: &mut impl ::parsing::ReadBytes<#input_lifetime>) -> ::parsing::Result<Self> {
                        #[allow(unused_imports)]
                        use ::parsing::ReadBytes as _;
                        #body
                    }
                }
            }
        });
    quote! { #(#impls)* }
}

fn struct_impl(item: &ItemStruct, steps: &[Step]) -> proc_macro2::TokenStream {
    let names: Vec<_> = item.fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    impl_parse(&item.ident, &item.generics, |order| {
        let steps = steps.iter().map(|step| step.to_tokens(order));
        quote! {
            #(#steps)*
            Ok(Self { #(#names),* })
        }
    })
}

struct WireStruct {
    item: ItemStruct,
    steps: Vec<Step>,
}

impl Parse for WireStruct {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        let struct_token = input.parse()?;
        let ident = input.parse()?;
        let mut generics: Generics = input.parse()?;
        generics.where_clause = input.parse()?;

        let body;
        let brace_token = braced!(body in input);
        let mut named = Punctuated::new();
        let mut steps = Vec::new();
        while !body.is_empty() {
            if Directive::peek(&body) {
                match body.parse::<Directive>()? {
                    Directive::Select(expr) => {
                        return Err(syn::Error::new(
                            expr.span(),
                            "`enum_type` is only valid in parsable_enum!",
                        ))
                    }
                    directive => steps.push(Step::Directive(directive)),
                }
                continue;
            }

            let mut field = body.call(Field::parse_named)?;
            steps.push(Step::Field(FieldRead::from_field(&field)?));
            field.attrs.retain(|attr| !is_parse_attr(attr));
            named.push(field);
            if body.peek(Token![,]) {
                body.parse::<Token![,]>()?;
            }
        }

        let item = ItemStruct {
            attrs,
            vis,
            struct_token,
            ident,
            generics,
            fields: Fields::Named(FieldsNamed { brace_token, named }),
            semi_token: None,
        };
        Ok(Self { item, steps })
    }
}

/// Declares a struct together with its `Parse` impls.
///
/// ```ignore
/// parsing::parsable_struct! {
///     pub struct Record<'a> {
///         [[magic: u16 = 0xBEEF]]
///         pub id: u32,
///         [[padding_bytes = 2]]
///         [[param: u16 = name_len]]
///         #[parse(sized_utf8_string = name_len)]
///         pub name: &'a str,
///     }
/// }
/// ```
///
/// Directives, none of which add a field:
/// - `[[magic: T = value]]` reads a `T` and fails with `Error::BadMagic`
///   unless it equals `value`.
/// - `[[padding_bytes = n]]` skips `n` bytes, `[[ignore: T]]` reads and drops a `T`.
/// - `[[param: T = name]]` reads a `T` into a local usable by later steps,
///   typically a length that should not show up in the struct.
/// - `[[limit_buffer = n]]` splits `n` bytes off the input. Later steps only
///   see that span and the whole span is consumed whether they read it all or not.
///
/// Field attributes:
/// - `#[parse(sized_utf8_string = n)]` / `#[parse(sized_buf = n)]` take `n`
///   bytes and call `.into()`, so owned `String`/`Vec<u8>` work as well as borrows.
/// - `#[parse(rest_of_buf)]` takes whatever is left.
/// - `#[parse(collection: Item = n)]` reads `n` items and collects them into
///   the field type.
/// - `#[parse(option_if: T = condition)]` reads a `T` only when `condition`
///   holds, the field is an `Option<T>`.
///
/// Any earlier field or param can be used in the expressions.
#[proc_macro]
pub fn parsable_struct(input: TokenStream) -> TokenStream {
    let WireStruct { item, steps } = parse_macro_input!(input as WireStruct);
    let impls = struct_impl(&item, &steps);
    quote! {
        #item
        #impls
    }
    .into()
}

/// `Parse` for a plain struct whose fields are read in declaration order.
/// Field level `#[parse(...)]` attributes work like in [`parsable_struct!`].
#[proc_macro_derive(Parse, attributes(parse))]
pub fn parse_derive(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    let steps = item
        .fields
        .iter()
        .map(|field| FieldRead::from_field(field).map(Step::Field))
        .collect::<syn::Result<Vec<_>>>();
    match steps {
        Ok(steps) => struct_impl(&item, &steps).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct WireEnum {
    item: ItemEnum,
    directives: Vec<Directive>,
    selector: syn::Expr,
}

impl Parse for WireEnum {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse()?;
        let enum_token = input.parse()?;
        let ident = input.parse()?;
        let mut generics: Generics = input.parse()?;
        generics.where_clause = input.parse()?;

        let body;
        let brace_token = braced!(body in input);
        let mut directives = Vec::new();
        let mut selector = None;
        while Directive::peek(&body) {
            match body.parse::<Directive>()? {
                Directive::Select(expr) => selector = Some(expr),
                directive => directives.push(directive),
            }
        }
        let selector =
            selector.ok_or_else(|| body.error("missing `[[enum_type = <expr>]]` directive"))?;

        let variants: Punctuated<Variant, Token![,]> =
            body.parse_terminated(Variant::parse, Token![,])?;
        for variant in &variants {
            if variant.discriminant.is_none() {
                return Err(syn::Error::new(
                    variant.ident.span(),
                    "each variant needs the type value it is selected by, e.g. `= 0x10`",
                ));
            }
            if !matches!(&variant.fields, Fields::Unnamed(fields) if fields.unnamed.len() == 1) {
                return Err(syn::Error::new(
                    variant.fields.span(),
                    "each variant must wrap exactly one parsable value",
                ));
            }
        }

        let item = ItemEnum {
            attrs,
            vis,
            enum_token,
            ident,
            generics,
            brace_token,
            variants,
        };
        Ok(Self {
            item,
            directives,
            selector,
        })
    }
}

/// Declares an enum whose variant is picked by a value read from the input.
///
/// ```ignore
/// parsing::parsable_enum! {
///     #[repr(u8)]
///     pub enum Message<'a> {
///         [[param: u8 = kind]]
///         [[enum_type = kind]]
///         Ping(u32) = 1,
///         Text(TextBody<'a>) = 2,
///     }
/// }
/// ```
///
/// Directives run first, in order, then the variant's value is parsed.
/// An unmatched type value fails with `Error::UnknownVariant` only after every
/// directive ran, so a `[[limit_buffer]]` span is already consumed by then.
#[proc_macro]
pub fn parsable_enum(input: TokenStream) -> TokenStream {
    let WireEnum {
        item,
        directives,
        selector,
    } = parse_macro_input!(input as WireEnum);

    let arms: Vec<_> = item
        .variants
        .iter()
        .filter_map(|variant| {
            let (_, value) = variant.discriminant.as_ref()?;
            Some((&variant.ident, value))
        })
        .collect();

    let impls = impl_parse(&item.ident, &item.generics, |order| {
        let directives = directives.iter().map(|d| d.to_tokens(order));
        let arms = arms.iter().map(|(ident, value)| {
            quote! { #value => Self::#ident(input.read_type::<#order, _>()?), }
        });
        quote! {
            #(#directives)*
            Ok(match #selector {
                #(#arms)*
                _ => {
                    return Err(::parsing::Error::UnknownVariant {
                        value: (#selector) as u64,
                    })
                }
            })
        }
    });

    quote! {
        #item
        #impls
    }
    .into()
}
