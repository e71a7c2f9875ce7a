//! Procedural macros for testkit-deferred
//!
//! This crate provides the `#[testkit_deferred::test]` attribute macro, which
//! scopes a mock controller to one test case and verifies it when the test
//! body finishes.
//!
//! # Example
//!
//! ```rust,ignore
//! use testkit_deferred::prelude::*;
//!
//! #[testkit_deferred::test]
//! fn my_test(control: MockControl) {
//!     let on_done = AsyncMockControl::new(&control).create_callback_mock("on_done", |(): ()| {});
//!     on_done(());
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, ItemFn, Lit, Token, Type,
};

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Whether to verify the injected controller after the body (default: true)
    verify: Option<bool>,
    /// Which async runtime to use for async bodies ("tokio" or "async-std")
    runtime: Option<String>,
    /// Flavor for tokio runtime ("current_thread" or "multi_thread")
    flavor: Option<String>,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "verify" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.verify = Some(b.value());
                    }
                }
                "runtime" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        config.runtime = Some(s.value());
                    }
                }
                "flavor" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        config.flavor = Some(s.value());
                    }
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Determines if a function parameter is requesting a MockControl.
fn is_control_param(arg: &FnArg) -> bool {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return segment.ident == "MockControl";
            }
        }
    }
    false
}

/// Test attribute macro binding a mock controller to one test case.
///
/// Add a `control: MockControl` parameter to receive a fresh controller.
/// When the body returns, the macro calls `verify_all()` on it and fails the
/// test with the verification error if any expectation was not met.
///
/// Works on both plain and `async` test functions. Async bodies run on tokio
/// by default. A test may return a `Result`; its value is returned after
/// verification, so an `Err` still fails the test.
///
/// ```rust,ignore
/// use testkit_deferred::prelude::*;
///
/// #[testkit_deferred::test]
/// async fn test_load(control: MockControl) {
///     let page = Deferred::<String, String>::new();
///     AsyncMockControl::new(&control)
///         .assert_deferred_equals("body", DeferredOr::value("ok".to_string()), &page)
///         .unwrap();
///     page.resolve("ok".to_string()).unwrap();
/// }
/// ```
///
/// # Configuration Options
///
/// - `verify = false` - Skip the automatic `verify_all()`
/// - `runtime = "tokio"` or `runtime = "async-std"` - Runtime for async bodies
/// - `flavor = "multi_thread"` - Tokio runtime flavor
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(config, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: TestConfig, input: ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let output = &input.sig.output;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;

    if let Some(arg) = input.sig.inputs.iter().find(|arg| !is_control_param(arg)) {
        return Err(syn::Error::new_spanned(
            arg,
            "only a `MockControl` parameter can be injected",
        ));
    }
    if input.sig.inputs.len() > 1 {
        return Err(syn::Error::new_spanned(
            &input.sig.inputs,
            "at most one `MockControl` parameter can be injected",
        ));
    }

    let verify = config.verify.unwrap_or(true);
    let control = format_ident!("__testkit_control");

    // The body keeps its own signature in an inner function, so an early
    // `return` or `?` hands its value back here, after which the controller
    // is verified and the value becomes the test's result.
    let mut inner_sig = input.sig.clone();
    inner_sig.ident = format_ident!("__testkit_body");
    let inner_name = &inner_sig.ident;

    let (control_init, control_arg, control_verify) = if input.sig.inputs.is_empty() {
        (quote! {}, quote! {}, quote! {})
    } else {
        let init = quote! {
            let #control = ::testkit_deferred::mock::MockControl::new();
        };
        let check = if verify {
            quote! {
                if let ::std::result::Result::Err(err) = #control.verify_all() {
                    panic!("{}", err);
                }
            }
        } else {
            quote! {}
        };
        (init, quote! { ::std::clone::Clone::clone(&#control) }, check)
    };

    if input.sig.asyncness.is_none() {
        return Ok(quote! {
            #[::core::prelude::v1::test]
            #(#attrs)*
            #vis fn #name() #output {
                #inner_sig #body

                #control_init
                let result = #inner_name(#control_arg);
                #control_verify
                result
            }
        });
    }

    let runtime = config.runtime.as_deref().unwrap_or("tokio");
    let flavor = config.flavor.as_deref().unwrap_or("current_thread");

    let runtime_attr = match runtime {
        "tokio" => match flavor {
            "current_thread" => quote! { #[::tokio::test] },
            "multi_thread" => quote! { #[::tokio::test(flavor = "multi_thread")] },
            _ => {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!(
                        "unsupported flavor: {flavor}. Use \"current_thread\" or \"multi_thread\""
                    ),
                ));
            }
        },
        "async-std" => quote! { #[::async_std::test] },
        _ => {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                format!("unsupported runtime: {runtime}. Use \"tokio\" or \"async-std\""),
            ));
        }
    };

    Ok(quote! {
        #runtime_attr
        #(#attrs)*
        #vis async fn #name() #output {
            #inner_sig #body

            #control_init
            let result = #inner_name(#control_arg).await;
            #control_verify
            result
        }
    })
}
