//! Default [`Validator`]: runs the declarative constraints of the message.

use schemaconf_core::{FieldPath, Report, Validate, ValidationError, Validator};
use tracing::debug;

/// Checks `#[validate(...)]` rules from the message root.
///
/// Collects every violation by default; [`fail_fast`](Self::fail_fast)
/// stops at the first one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator {
    fail_fast: bool,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }
}

impl Validator for ConstraintValidator {
    fn validate(&self, message: &dyn Validate) -> Result<(), ValidationError> {
        let mut report = if self.fail_fast {
            Report::fail_fast()
        } else {
            Report::new()
        };
        message.validate_into(&FieldPath::root(), &mut report);
        debug!(
            violations = report.violations().len(),
            fail_fast = self.fail_fast,
            "Validated configuration"
        );
        report.into_result()
    }
}

#[cfg(test)]
mod tests {
    use schemaconf_macros::Validate;

    use super::*;

    #[derive(Default, Validate)]
    struct Server {
        #[validate(required)]
        name: String,
        #[validate(gt = 0)]
        port: u32,
    }

    #[test]
    fn test_collects_all_violations() {
        let err = ConstraintValidator::new()
            .validate(&Server::default())
            .unwrap_err();
        let paths: Vec<_> = err.violations.iter().map(|v| v.field_path()).collect();
        assert_eq!(paths, ["name", "port"]);
    }

    #[test]
    fn test_fail_fast_stops_at_first() {
        let err = ConstraintValidator::new()
            .fail_fast(true)
            .validate(&Server::default())
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].constraint_id(), "required");
    }

    #[test]
    fn test_valid_message_passes() {
        let server = Server {
            name: "api".to_string(),
            port: 8080,
        };
        assert!(ConstraintValidator::new().validate(&server).is_ok());
    }
}
