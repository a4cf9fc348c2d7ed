//! Declarative field constraints and the validator boundary.
//!
//! Schema types implement [`Validate`], normally through
//! `#[derive(Validate)]`, which recurses into every field and checks the
//! rules attached with `#[validate(...)]`. The helpers in [`rules`] are
//! what the derive expands to.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{ValidationError, Violation};
use crate::path::FieldPath;

/// Something whose constraints can be checked.
pub trait Validate {
    /// Reports every violation found at or below `path`.
    fn validate_into(&self, path: &FieldPath, report: &mut Report);

    /// Validates from the root, collecting every violation.
    fn validate(&self) -> Result<(), ValidationError> {
        let mut report = Report::new();
        self.validate_into(&FieldPath::root(), &mut report);
        report.into_result()
    }
}

/// Checks a bound message.
pub trait Validator: Send + Sync {
    fn validate(&self, message: &dyn Validate) -> Result<(), ValidationError>;
}

/// Boxed validator.
pub type BoxedValidator = Box<dyn Validator>;

/// Collects violations in the order they are found.
#[derive(Debug, Default)]
pub struct Report {
    violations: Vec<Violation>,
    fail_fast: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report that stops accepting violations after the first one.
    pub fn fail_fast() -> Self {
        Self {
            violations: Vec::new(),
            fail_fast: true,
        }
    }

    /// Records a violation at `path`.
    pub fn push(&mut self, path: &FieldPath, constraint_id: &str, message: impl Into<String>) {
        if self.is_done() {
            return;
        }
        self.violations
            .push(Violation::new(path.to_string(), constraint_id, message));
    }

    /// Returns `true` once a fail-fast report holds a violation.
    pub fn is_done(&self) -> bool {
        self.fail_fast && !self.violations.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }
}

// =============================================================================
// Leaf and Container Implementations
// =============================================================================

macro_rules! impl_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Validate for $ty {
                fn validate_into(&self, _path: &FieldPath, _report: &mut Report) {}
            }
        )*
    };
}

impl_leaf!(
    bool, char, String, PathBuf, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    f32, f64, std::time::Duration, crate::value::Value,
);

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate_into(&self, path: &FieldPath, report: &mut Report) {
        (**self).validate_into(path, report);
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_into(&self, path: &FieldPath, report: &mut Report) {
        if let Some(inner) = self {
            inner.validate_into(path, report);
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_into(&self, path: &FieldPath, report: &mut Report) {
        for (i, item) in self.iter().enumerate() {
            if report.is_done() {
                return;
            }
            item.validate_into(&path.index(i), report);
        }
    }
}

macro_rules! impl_string_map {
    ($($map:ident),*) => {
        $(
            impl<V: Validate, S> Validate for $map<String, V, S> {
                fn validate_into(&self, path: &FieldPath, report: &mut Report) {
                    for (key, value) in self {
                        if report.is_done() {
                            return;
                        }
                        value.validate_into(&path.key(key.as_str()), report);
                    }
                }
            }
        )*
    };
}

impl_string_map!(HashMap, IndexMap);

impl<V: Validate> Validate for BTreeMap<String, V> {
    fn validate_into(&self, path: &FieldPath, report: &mut Report) {
        for (key, value) in self {
            if report.is_done() {
                return;
            }
            value.validate_into(&path.key(key.as_str()), report);
        }
    }
}

// =============================================================================
// Rule Helpers
// =============================================================================

/// Rule checks used by `#[derive(Validate)]`.
///
/// Each helper reports at most one violation and returns nothing; absent
/// optional values satisfy every rule except `required`.
pub mod rules {
    use std::sync::OnceLock;

    use regex::Regex;

    use super::Report;
    use crate::path::FieldPath;

    /// Whether a field holds a value other than its zero value.
    pub trait HasValue {
        fn has_value(&self) -> bool;
    }

    /// Read access to a string field.
    pub trait AsText {
        fn as_text(&self) -> Option<&str>;
    }

    /// Read access to a numeric field.
    pub trait AsNumber {
        fn as_number(&self) -> Option<f64>;
    }

    /// Read access to a repeated field's length.
    pub trait ItemCount {
        fn item_count(&self) -> Option<usize>;
    }

    impl HasValue for String {
        fn has_value(&self) -> bool {
            !self.is_empty()
        }
    }

    impl HasValue for bool {
        fn has_value(&self) -> bool {
            *self
        }
    }

    impl HasValue for std::time::Duration {
        fn has_value(&self) -> bool {
            !self.is_zero()
        }
    }

    impl HasValue for std::path::PathBuf {
        fn has_value(&self) -> bool {
            !self.as_os_str().is_empty()
        }
    }

    impl<T> HasValue for Option<T> {
        fn has_value(&self) -> bool {
            self.is_some()
        }
    }

    impl<T> HasValue for Vec<T> {
        fn has_value(&self) -> bool {
            !self.is_empty()
        }
    }

    impl<K, V, S> HasValue for std::collections::HashMap<K, V, S> {
        fn has_value(&self) -> bool {
            !self.is_empty()
        }
    }

    impl<K, V> HasValue for std::collections::BTreeMap<K, V> {
        fn has_value(&self) -> bool {
            !self.is_empty()
        }
    }

    impl<T: HasValue + ?Sized> HasValue for Box<T> {
        fn has_value(&self) -> bool {
            (**self).has_value()
        }
    }

    impl AsText for String {
        fn as_text(&self) -> Option<&str> {
            Some(self)
        }
    }

    impl AsText for Option<String> {
        fn as_text(&self) -> Option<&str> {
            self.as_deref()
        }
    }

    impl<T> ItemCount for Vec<T> {
        fn item_count(&self) -> Option<usize> {
            Some(self.len())
        }
    }

    impl<T> ItemCount for Option<Vec<T>> {
        fn item_count(&self) -> Option<usize> {
            self.as_ref().map(Vec::len)
        }
    }

    impl<K, V, S> ItemCount for std::collections::HashMap<K, V, S> {
        fn item_count(&self) -> Option<usize> {
            Some(self.len())
        }
    }

    macro_rules! impl_numeric {
        ($($ty:ty),*) => {
            $(
                impl HasValue for $ty {
                    #[allow(clippy::float_cmp)]
                    fn has_value(&self) -> bool {
                        *self != (0 as $ty)
                    }
                }

                impl AsNumber for $ty {
                    #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
                    fn as_number(&self) -> Option<f64> {
                        Some(*self as f64)
                    }
                }

                impl AsNumber for Option<$ty> {
                    fn as_number(&self) -> Option<f64> {
                        self.as_ref().and_then(AsNumber::as_number)
                    }
                }
            )*
        };
    }

    impl_numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

    pub fn required<T: HasValue + ?Sized>(value: &T, path: &FieldPath, report: &mut Report) {
        if !value.has_value() {
            report.push(path, "required", "value is required");
        }
    }

    pub fn min_len<T: AsText + ?Sized>(value: &T, min: usize, path: &FieldPath, report: &mut Report) {
        if let Some(text) = value.as_text() {
            if text.chars().count() < min {
                report.push(
                    path,
                    "string.min_len",
                    format!("value length must be at least {min} characters"),
                );
            }
        }
    }

    pub fn max_len<T: AsText + ?Sized>(value: &T, max: usize, path: &FieldPath, report: &mut Report) {
        if let Some(text) = value.as_text() {
            if text.chars().count() > max {
                report.push(
                    path,
                    "string.max_len",
                    format!("value length must be at most {max} characters"),
                );
            }
        }
    }

    /// Checks `value` against a pattern compiled once into `cache`.
    ///
    /// The derive validates patterns at compile time; a pattern that still
    /// fails to compile here is reported as a violation.
    pub fn pattern<T: AsText + ?Sized>(
        value: &T,
        pattern: &'static str,
        cache: &'static OnceLock<Option<Regex>>,
        path: &FieldPath,
        report: &mut Report,
    ) {
        let Some(text) = value.as_text() else {
            return;
        };
        match cache.get_or_init(|| Regex::new(pattern).ok()) {
            Some(re) if re.is_match(text) => {}
            _ => report.push(
                path,
                "string.pattern",
                format!("value does not match regex pattern `{pattern}`"),
            ),
        }
    }

    pub fn one_of<T: AsText + ?Sized>(
        value: &T,
        allowed: &[&str],
        path: &FieldPath,
        report: &mut Report,
    ) {
        if let Some(text) = value.as_text() {
            if !allowed.contains(&text) {
                report.push(
                    path,
                    "string.in",
                    format!("value must be in list [{}]", allowed.join(", ")),
                );
            }
        }
    }

    /// Numeric comparison kinds supported by the derive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Bound {
        Gt,
        Gte,
        Lt,
        Lte,
    }

    impl Bound {
        fn holds(self, value: f64, limit: f64) -> bool {
            match self {
                Self::Gt => value > limit,
                Self::Gte => value >= limit,
                Self::Lt => value < limit,
                Self::Lte => value <= limit,
            }
        }

        fn constraint_id(self) -> &'static str {
            match self {
                Self::Gt => "number.gt",
                Self::Gte => "number.gte",
                Self::Lt => "number.lt",
                Self::Lte => "number.lte",
            }
        }

        fn phrase(self) -> &'static str {
            match self {
                Self::Gt => "greater than",
                Self::Gte => "greater than or equal to",
                Self::Lt => "less than",
                Self::Lte => "less than or equal to",
            }
        }
    }

    /// Compares a number against `limit`; `shown` is the limit as written
    /// in the schema.
    pub fn bound<T: AsNumber + ?Sized>(
        value: &T,
        bound: Bound,
        limit: f64,
        shown: &str,
        path: &FieldPath,
        report: &mut Report,
    ) {
        if let Some(number) = value.as_number() {
            if !bound.holds(number, limit) {
                report.push(
                    path,
                    bound.constraint_id(),
                    format!("value must be {} {shown}", bound.phrase()),
                );
            }
        }
    }

    pub fn min_items<T: ItemCount + ?Sized>(
        value: &T,
        min: usize,
        path: &FieldPath,
        report: &mut Report,
    ) {
        if let Some(count) = value.item_count() {
            if count < min {
                report.push(
                    path,
                    "repeated.min_items",
                    format!("value must contain at least {min} item(s)"),
                );
            }
        }
    }

    pub fn max_items<T: ItemCount + ?Sized>(
        value: &T,
        max: usize,
        path: &FieldPath,
        report: &mut Report,
    ) {
        if let Some(count) = value.item_count() {
            if count > max {
                report.push(
                    path,
                    "repeated.max_items",
                    format!("value must contain at most {max} item(s)"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use regex::Regex;

    use super::rules::{self, Bound};
    use super::*;

    struct Http {
        addr: String,
        port: u16,
    }

    impl Validate for Http {
        fn validate_into(&self, path: &FieldPath, report: &mut Report) {
            let addr = path.field("addr");
            rules::required(&self.addr, &addr, report);
            let port = path.field("port");
            rules::bound(&self.port, Bound::Gt, 0.0, "0", &port, report);
        }
    }

    #[test]
    fn test_nested_paths_in_sequences() {
        let servers = vec![
            Http {
                addr: "a".into(),
                port: 1,
            },
            Http {
                addr: String::new(),
                port: 0,
            },
        ];
        let mut report = Report::new();
        servers.validate_into(&FieldPath::root().field("servers"), &mut report);

        let paths: Vec<_> = report.violations().iter().map(|v| v.field_path()).collect();
        assert_eq!(paths, ["servers[1].addr", "servers[1].port"]);
    }

    #[test]
    fn test_fail_fast_keeps_first() {
        let http = Http {
            addr: String::new(),
            port: 0,
        };
        let mut report = Report::fail_fast();
        http.validate_into(&FieldPath::root(), &mut report);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].constraint_id(), "required");
    }

    #[test]
    fn test_absent_optionals_satisfy_rules() {
        let mut report = Report::new();
        let path = FieldPath::root().field("name");
        rules::min_len(&None::<String>, 3, &path, &mut report);
        rules::bound(&None::<u32>, Bound::Gte, 1.0, "1", &path, &mut report);
        assert!(report.is_empty());

        rules::required(&None::<String>, &path, &mut report);
        assert_eq!(report.violations()[0].message(), "value is required");
    }

    #[test]
    fn test_pattern_and_one_of_messages() {
        static RE: OnceLock<Option<Regex>> = OnceLock::new();
        let mut report = Report::new();
        let path = FieldPath::root().field("driver");
        rules::pattern(&"MySQL".to_string(), "^[a-z]+$", &RE, &path, &mut report);
        rules::one_of(&"oracle".to_string(), &["mysql", "postgres"], &path, &mut report);

        let messages: Vec<_> = report.violations().iter().map(|v| v.message()).collect();
        assert_eq!(
            messages,
            [
                "value does not match regex pattern `^[a-z]+$`",
                "value must be in list [mysql, postgres]",
            ]
        );
    }
}
