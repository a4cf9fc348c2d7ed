//! `#[derive(Validate)]` implementation.
//!
//! # Field-level attributes `#[validate(...)]`
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `required` | | Field must hold a non-zero value |
//! | `min_len` / `max_len` | `min_len = 3` | String length bounds (characters) |
//! | `pattern` | `pattern = "^[a-z]+$"` | String must match the regex |
//! | `one_of` | `one_of = ["mysql", "postgres"]` | String must be one of the listed values |
//! | `gt` / `gte` / `lt` / `lte` | `gte = 1` | Numeric bounds |
//! | `min_items` / `max_items` | `min_items = 1` | Length bounds for repeated fields |
//! | `skip` | | Do not recurse into or check this field |
//!
//! Every field that is not skipped is recursed into, so nested messages
//! are validated with their own rules. Field paths follow serde naming:
//! a field's `rename`, else the container's `rename_all`, else the Rust
//! name; `flatten` fields validate at their parent's path.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, GenericParam, Lit, LitStr,
    Token, UnOp, parse_quote, spanned::Spanned,
};

// ============================================================================
// Attribute structures
// ============================================================================

/// A numeric comparison from `gt`/`gte`/`lt`/`lte`.
struct BoundRule {
    kind: &'static str,
    limit: f64,
    shown: String,
}

/// Per-field `#[validate(...)]` rules.
#[derive(Default)]
struct FieldRules {
    skip: bool,
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<LitStr>,
    one_of: Option<Vec<LitStr>>,
    bounds: Vec<BoundRule>,
    min_items: Option<usize>,
    max_items: Option<usize>,
}

/// The serde attributes that affect field paths.
#[derive(Default)]
struct SerdeField {
    rename: Option<String>,
    flatten: bool,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_validate(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "Validate can only be derived for structs with named fields",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Validate does not support enums. Implement it by hand instead.",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Validate cannot be derived for unions",
            ));
        }
    };

    let rename_all = parse_rename_all(&input.attrs)?;

    let mut checks = Vec::new();
    for field in fields {
        let rules = parse_field_rules(&field.attrs)?;
        if rules.skip {
            continue;
        }
        let ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new(field.span(), "Validate requires named fields")
        })?;
        let serde = parse_serde_field(&field.attrs)?;

        let path_expr = if serde.flatten {
            quote! { path.clone() }
        } else {
            let name = serde.rename.unwrap_or_else(|| {
                apply_rename_all(&ident.to_string(), rename_all.as_deref())
            });
            quote! { path.field(#name) }
        };

        let rule_checks = generate_rule_checks(ident, &rules);
        checks.push(quote! {
            if report.is_done() {
                return;
            }
            {
                let field_path = #path_expr;
                #(#rule_checks)*
                ::schemaconf_core::Validate::validate_into(&self.#ident, &field_path, report);
            }
        });
    }

    let name = &input.ident;
    let mut generics = input.generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::schemaconf_core::Validate));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::schemaconf_core::Validate for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn validate_into(
                &self,
                path: &::schemaconf_core::FieldPath,
                report: &mut ::schemaconf_core::Report,
            ) {
                #(#checks)*
            }
        }
    })
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_field_rules(attrs: &[Attribute]) -> syn::Result<FieldRules> {
    let mut rules = FieldRules::default();

    for attr in attrs {
        if !attr.path().is_ident("validate") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(ToString::to_string)
                .unwrap_or_default();
            match key.as_str() {
                "skip" => rules.skip = true,
                "required" => rules.required = true,
                "min_len" => rules.min_len = Some(parse_usize(&meta)?),
                "max_len" => rules.max_len = Some(parse_usize(&meta)?),
                "min_items" => rules.min_items = Some(parse_usize(&meta)?),
                "max_items" => rules.max_items = Some(parse_usize(&meta)?),
                "pattern" => {
                    let lit: LitStr = meta.value()?.parse()?;
                    if let Err(err) = regex::Regex::new(&lit.value()) {
                        return Err(syn::Error::new(lit.span(), format!("invalid pattern: {err}")));
                    }
                    rules.pattern = Some(lit);
                }
                "one_of" => {
                    let array: syn::ExprArray = meta.value()?.parse()?;
                    let mut allowed = Vec::new();
                    for elem in array.elems {
                        match elem {
                            Expr::Lit(ExprLit {
                                lit: Lit::Str(s), ..
                            }) => allowed.push(s),
                            other => {
                                return Err(syn::Error::new(
                                    other.span(),
                                    "one_of expects string literals",
                                ));
                            }
                        }
                    }
                    rules.one_of = Some(allowed);
                }
                "gt" | "gte" | "lt" | "lte" => {
                    let expr: Expr = meta.value()?.parse()?;
                    let (limit, shown) = parse_number(&expr)?;
                    let kind = match key.as_str() {
                        "gt" => "Gt",
                        "gte" => "Gte",
                        "lt" => "Lt",
                        _ => "Lte",
                    };
                    rules.bounds.push(BoundRule { kind, limit, shown });
                }
                _ => return Err(meta.error("unknown validate rule")),
            }
            Ok(())
        })?;
    }

    Ok(rules)
}

fn parse_usize(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<usize> {
    meta.value()?.parse::<syn::LitInt>()?.base10_parse()
}

/// Reads a possibly negated integer or float literal.
fn parse_number(expr: &Expr) -> syn::Result<(f64, String)> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Int(int) => Ok((int.base10_parse::<f64>()?, int.base10_digits().to_string())),
            Lit::Float(float) => Ok((
                float.base10_parse::<f64>()?,
                float.base10_digits().to_string(),
            )),
            other => Err(syn::Error::new(other.span(), "expected a number")),
        },
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => {
            let (limit, shown) = parse_number(expr)?;
            Ok((-limit, format!("-{shown}")))
        }
        other => Err(syn::Error::new(other.span(), "expected a number")),
    }
}

fn parse_serde_field(attrs: &[Attribute]) -> syn::Result<SerdeField> {
    let mut result = SerdeField::default();

    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    result.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        let value = inner.value()?.parse::<LitStr>()?.value();
                        if inner.path.is_ident("deserialize") {
                            result.rename = Some(value);
                        }
                        Ok(())
                    })?;
                }
            } else if meta.path.is_ident("flatten") {
                result.flatten = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn parse_rename_all(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename_all = None;

    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                if meta.input.peek(Token![=]) {
                    rename_all = Some(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        let value = inner.value()?.parse::<LitStr>()?.value();
                        if inner.path.is_ident("deserialize") {
                            rename_all = Some(value);
                        }
                        Ok(())
                    })?;
                }
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(rename_all)
}

/// Consumes the value of a serde key this derive does not care about.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta_value(&inner))?;
    }
    Ok(())
}

fn apply_rename_all(field: &str, rule: Option<&str>) -> String {
    let words: Vec<&str> = field.split('_').filter(|w| !w.is_empty()).collect();
    let capitalize = |w: &str| {
        let mut chars = w.chars();
        chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default()
    };
    match rule {
        Some("lowercase") => field.to_lowercase(),
        Some("UPPERCASE") => field.to_uppercase(),
        Some("PascalCase") => words.iter().map(|w| capitalize(w)).collect(),
        Some("camelCase") => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_string() } else { capitalize(w) })
            .collect(),
        Some("SCREAMING_SNAKE_CASE") => field.to_uppercase(),
        Some("kebab-case") => words.join("-"),
        Some("SCREAMING-KEBAB-CASE") => words.join("-").to_uppercase(),
        _ => field.to_string(),
    }
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_rule_checks(ident: &syn::Ident, rules: &FieldRules) -> Vec<TokenStream> {
    let rules_path = quote!(::schemaconf_core::validate::rules);
    let mut checks = Vec::new();

    if rules.required {
        checks.push(quote! {
            #rules_path::required(&self.#ident, &field_path, report);
        });
    }
    if let Some(min) = rules.min_len {
        checks.push(quote! {
            #rules_path::min_len(&self.#ident, #min, &field_path, report);
        });
    }
    if let Some(max) = rules.max_len {
        checks.push(quote! {
            #rules_path::max_len(&self.#ident, #max, &field_path, report);
        });
    }
    if let Some(pattern) = &rules.pattern {
        checks.push(quote! {
            {
                static PATTERN: ::schemaconf_core::__private::OnceLock<
                    ::core::option::Option<::schemaconf_core::__private::Regex>,
                > = ::schemaconf_core::__private::OnceLock::new();
                #rules_path::pattern(&self.#ident, #pattern, &PATTERN, &field_path, report);
            }
        });
    }
    if let Some(allowed) = &rules.one_of {
        checks.push(quote! {
            #rules_path::one_of(&self.#ident, &[#(#allowed),*], &field_path, report);
        });
    }
    for bound in &rules.bounds {
        let kind = syn::Ident::new(bound.kind, ident.span());
        let magnitude = bound.limit.abs();
        let limit = if bound.limit < 0.0 {
            quote!(-#magnitude)
        } else {
            quote!(#magnitude)
        };
        let shown = &bound.shown;
        checks.push(quote! {
            #rules_path::bound(
                &self.#ident,
                #rules_path::Bound::#kind,
                #limit,
                #shown,
                &field_path,
                report,
            );
        });
    }
    if let Some(min) = rules.min_items {
        checks.push(quote! {
            #rules_path::min_items(&self.#ident, #min, &field_path, report);
        });
    }
    if let Some(max) = rules.max_items {
        checks.push(quote! {
            #rules_path::max_items(&self.#ident, #max, &field_path, report);
        });
    }

    checks
}
