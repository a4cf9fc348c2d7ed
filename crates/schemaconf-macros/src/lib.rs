//! Procedural macros for schemaconf.
//!
//! This crate provides:
//!
//! - `#[derive(Validate)]` - Generates `schemaconf_core::Validate` from
//!   declarative field constraints
//!
//! The generated code refers to `::schemaconf_core`, so the deriving crate
//! must depend on `schemaconf-core` directly.

mod validate;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `schemaconf_core::Validate` for a struct with named fields.
///
/// Every field is recursed into (nested messages validate with their own
/// rules) unless marked `#[validate(skip)]`. Rules are attached per field:
///
/// - `#[validate(required)]` - the field must hold a non-zero value
/// - `#[validate(min_len = N, max_len = N)]` - string length bounds
/// - `#[validate(pattern = "...")]` - string must match the regex
/// - `#[validate(one_of = ["a", "b"])]` - string must be one of the values
/// - `#[validate(gt = X, gte = X, lt = X, lte = X)]` - numeric bounds
/// - `#[validate(min_items = N, max_items = N)]` - repeated field bounds
///
/// # Example
///
/// ```rust,ignore
/// use schemaconf_macros::Validate;
///
/// #[derive(serde::Deserialize, Default, Validate)]
/// pub struct Http {
///     #[validate(required)]
///     pub addr: String,
///     #[validate(gt = 0, lte = 65535)]
///     pub port: u32,
/// }
/// ```
#[proc_macro_derive(Validate, attributes(validate))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match validate::derive_validate(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
