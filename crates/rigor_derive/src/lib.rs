//! Registration macro for rigor test fixtures.
//!
//! `#[rigor::fixture]` goes on an inherent `impl` block. It strips the rigor tag attributes from the methods and emits
//! an `impl rigor::describe::Describe` that builds the type's `TypeDescriptor`: one `MethodDescriptor` per tagged
//! method, the constructor, and the optional base link.
//!
//! # Example
//! ```ignore
//! #[derive(Default)]
//! struct Calc;
//!
//! #[rigor::fixture]
//! impl Calc {
//!     #[test_case]
//!     fn add_ok(&mut self) -> rigor::TestResult {
//!         rigor::check::equal(4, 2 + 2)
//!     }
//!
//!     #[test_case]
//!     #[expected_error(rigor::kinds::ZERO_DIVISION_ERROR)]
//!     fn div_zero(&mut self) {
//!         let zero = 0;
//!         let _ = 1 / zero;
//!     }
//! }
//! ```
//!
//! Type-level arguments:
//! - `base = Type`: the base fixture. The type must implement `AsMut<Type>`, and `Type` must itself be registered
//!   with `#[rigor::fixture]` (usually with `support`).
//! - `constructor = path`: a `fn() -> Self` used instead of `Default::default`.
//! - `no_constructor`: the type cannot be instantiated (reported as such at run time).
//! - `support`: register the type without the `test_class` tag.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::parse::ParseStream;
use syn::{
    Attribute, Expr, FnArg, GenericParam, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta, Path, Token, Type,
    parse_macro_input,
};

use rigor_core::lang::tags::{self, TagId};

#[derive(Default)]
struct FixtureArgs {
    base: Option<Type>,
    constructor: Option<Expr>,
    no_constructor: bool,
    support: bool,
}

impl FixtureArgs {
    fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident(tags::FIXTURE_BASE_ARG) {
            self.base = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident(tags::FIXTURE_CONSTRUCTOR_ARG) {
            self.constructor = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident(tags::FIXTURE_NO_CONSTRUCTOR_ARG) {
            self.no_constructor = true;
        } else if meta.path.is_ident(tags::FIXTURE_SUPPORT_ARG) {
            self.support = true;
        } else {
            return Err(meta.error("unsupported fixture argument; expected `base`, `constructor`, `no_constructor` or `support`"));
        }
        Ok(())
    }
}

/// Register the methods of an `impl` block as a rigor fixture.
#[proc_macro_attribute]
pub fn fixture(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = FixtureArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemImpl);

    expand(args, item).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(args: FixtureArgs, mut item: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[rigor::fixture] goes on an inherent `impl` block, not a trait impl",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item.generics, "fixture types cannot be generic"));
    }
    if args.no_constructor && args.constructor.is_some() {
        return Err(syn::Error::new_spanned(
            args.constructor.as_ref(),
            "`constructor` and `no_constructor` are mutually exclusive",
        ));
    }

    let self_ty = (*item.self_ty).clone();
    let type_name = type_name(&self_ty)?;

    let mut methods = Vec::new();
    let mut errors: Option<syn::Error> = None;
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else { continue };
        match registration(&self_ty, method) {
            Ok(Some(tokens)) => methods.push(tokens),
            Ok(None) => {}
            Err(e) => combine(&mut errors, e),
        }
    }
    if let Some(e) = errors {
        return Err(e);
    }

    let support = args.support.then(|| quote!(.support()));
    let constructor = if args.no_constructor {
        None
    } else if let Some(make) = &args.constructor {
        Some(quote!(.constructed_by::<#self_ty>(#make)))
    } else {
        Some(quote!(.default_constructor::<#self_ty>()))
    };
    let base = args.base.as_ref().map(|base| {
        quote! {
            .base::<#base>({
                fn __rigor_upcast(
                    any: &mut dyn ::std::any::Any,
                ) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                    any.downcast_mut::<#self_ty>()
                        .map(|this| ::std::convert::AsMut::<#base>::as_mut(this) as &mut dyn ::std::any::Any)
                }
                __rigor_upcast
            })
        }
    });

    Ok(quote! {
        #item

        impl ::rigor::describe::Describe for #self_ty {
            const TYPE_NAME: &'static str = #type_name;

            fn descriptor() -> ::rigor::describe::TypeDescriptor {
                ::rigor::describe::TypeDescriptor::new(#type_name)
                    #support
                    #constructor
                    #base
                    #( .method(#methods) )*
            }
        }
    })
}

fn type_name(ty: &Type) -> syn::Result<String> {
    let Type::Path(path) = ty else {
        return Err(syn::Error::new_spanned(ty, "fixture type must be a named type"));
    };
    let last = path
        .path
        .segments
        .last()
        .ok_or_else(|| syn::Error::new_spanned(ty, "fixture type must be a named type"))?;
    if !last.arguments.is_empty() {
        return Err(syn::Error::new_spanned(ty, "fixture types cannot be generic"));
    }
    Ok(last.ident.to_string())
}

struct ExpectedSpec {
    kind: Path,
    message: Option<LitStr>,
}

fn parse_expected(attr: &Attribute) -> syn::Result<ExpectedSpec> {
    attr.parse_args_with(|input: ParseStream| {
        let kind: Path = input.parse()?;
        let mut message = None;
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if !input.is_empty() {
                let name: Ident = input.parse()?;
                if name != tags::EXPECTED_ERROR_MESSAGE_ARG {
                    return Err(syn::Error::new(name.span(), "expected `message = \"...\"`"));
                }
                input.parse::<Token![=]>()?;
                message = Some(input.parse::<LitStr>()?);
                let _ = input.parse::<Option<Token![,]>>()?;
            }
        }
        Ok(ExpectedSpec { kind, message })
    })
}

/// Strip rigor tags from `method` and build its `MethodDescriptor` expression, or `None` if it carries no tag.
fn registration(self_ty: &Type, method: &mut ImplItemFn) -> syn::Result<Option<TokenStream2>> {
    let mut tag_ids: Vec<TagId> = Vec::new();
    let mut expected: Option<ExpectedSpec> = None;
    let mut errors: Option<syn::Error> = None;

    method.attrs.retain(|attr| {
        let Some(id) = attr.path().get_ident().and_then(|i| tags::from_str(&i.to_string())) else {
            return true;
        };
        match id {
            TagId::TestClass => combine(
                &mut errors,
                syn::Error::new_spanned(attr, "`test_class` is a type-level tag implied by #[rigor::fixture]"),
            ),
            TagId::ExpectedError => match parse_expected(attr) {
                Ok(spec) => expected = Some(spec),
                Err(e) => combine(&mut errors, e),
            },
            _ if !matches!(attr.meta, Meta::Path(_)) => combine(
                &mut errors,
                syn::Error::new_spanned(attr, format!("`#[{}]` takes no arguments", tags::as_str(id))),
            ),
            _ => tag_ids.push(id),
        }
        false
    });
    if let Some(e) = errors {
        return Err(e);
    }
    if tag_ids.is_empty() && expected.is_none() {
        return Ok(None);
    }

    let sig = &method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "fixture methods cannot be async"));
    }
    if sig
        .generics
        .params
        .iter()
        .any(|p| !matches!(p, GenericParam::Lifetime(_)))
    {
        return Err(syn::Error::new_spanned(&sig.generics, "fixture methods cannot be generic"));
    }
    let is_instance = match sig.receiver() {
        None => false,
        Some(r) if r.reference.is_some() && r.colon_token.is_none() => true,
        Some(r) => {
            return Err(syn::Error::new_spanned(
                r,
                "fixture methods take `&self`, `&mut self`, or no receiver",
            ));
        }
    };
    let param_count = sig.inputs.iter().filter(|a| matches!(a, FnArg::Typed(_))).count();

    let ident = &sig.ident;
    let name = ident.to_string();
    let descriptor = if param_count > 0 {
        let receiver = if is_instance {
            quote!(::rigor::describe::Receiver::Instance)
        } else {
            quote!(::rigor::describe::Receiver::Static)
        };
        quote!(::rigor::describe::MethodDescriptor::uninvokable(#name, #receiver, #param_count))
    } else if is_instance {
        quote! {
            ::rigor::describe::MethodDescriptor::instance::<#self_ty>(#name, |this: &mut #self_ty| {
                ::rigor::describe::IntoTestResult::into_test_result(<#self_ty>::#ident(this))
            })
        }
    } else {
        quote! {
            ::rigor::describe::MethodDescriptor::function(#name, || {
                ::rigor::describe::IntoTestResult::into_test_result(<#self_ty>::#ident())
            })
        }
    };

    let tag_calls = tag_ids.iter().map(|id| {
        let variant = match id {
            TagId::TestCase => quote!(TestCase),
            TagId::SetUp => quote!(SetUp),
            TagId::TearDown => quote!(TearDown),
            TagId::OneTimeSetUp => quote!(OneTimeSetUp),
            TagId::OneTimeTearDown => quote!(OneTimeTearDown),
            // Filtered out above.
            TagId::TestClass | TagId::ExpectedError => unreachable!(),
        };
        quote!(.tag(::rigor::describe::Tag::#variant))
    });
    let expect_call = expected.map(|spec| {
        let kind = spec.kind;
        let message = match spec.message {
            Some(lit) => quote!(::std::option::Option::Some(#lit)),
            None => quote!(::std::option::Option::None),
        };
        quote!(.expect_error(&#kind, #message))
    });

    Ok(Some(quote! {
        #descriptor #( #tag_calls )* #expect_call
    }))
}

fn combine(slot: &mut Option<syn::Error>, error: syn::Error) {
    match slot {
        Some(existing) => existing.combine(error),
        None => *slot = Some(error),
    }
}
