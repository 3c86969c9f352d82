//! Validation chain for options structs.
//!
//! Options structs implement [`Validate`] by running a [`Validator`] over their
//! fields before they are allowed to become SQL. Every rule failure is kept,
//! so a caller sees all problems at once rather than just the first.
//!
//! # Example
//!
//! ```
//! use snowflake_provider_sdk::identifiers::DatabaseObjectIdentifier;
//! use snowflake_provider_sdk::validation::{flag, Validator};
//!
//! let name = DatabaseObjectIdentifier::new("", "ROLE1");
//! let or_replace = Some(true);
//! let if_not_exists = Some(true);
//!
//! let result = Validator::new("CreateDatabaseRoleOptions")
//!     .valid_identifier("name", &name)
//!     .conflicting_fields(&[
//!         ("OrReplace", flag(or_replace)),
//!         ("IfNotExists", flag(if_not_exists)),
//!     ])
//!     .finish();
//!
//! let err = result.unwrap_err();
//! assert_eq!(err.leaves().len(), 2);
//! ```

use crate::error::{SdkError, SdkResult};
use crate::identifiers::ObjectIdentifier;
use crate::schema::Diagnostic;

/// Something that can check its own structural invariants.
pub trait Validate {
    /// Return `Ok(())` if the value may be rendered, else every violation found.
    fn validate(&self) -> SdkResult<()>;
}

/// Whether a keyword flag is switched on.
pub fn flag(value: Option<bool>) -> bool {
    value == Some(true)
}

/// Accumulates rule violations for one options struct.
#[derive(Debug)]
pub struct Validator {
    structure: &'static str,
    errors: Vec<SdkError>,
}

impl Validator {
    /// Start validating the named struct.
    pub fn new(structure: &'static str) -> Self {
        Self {
            structure,
            errors: Vec::new(),
        }
    }

    /// The identifier must have every component filled in.
    pub fn valid_identifier(mut self, field: &str, id: &impl ObjectIdentifier) -> Self {
        if !id.is_valid() {
            self.errors.push(SdkError::InvalidObjectIdentifier {
                field: field.to_string(),
            });
        }
        self
    }

    /// Like [`Validator::valid_identifier`], but only when the identifier is given.
    pub fn valid_optional_identifier<I: ObjectIdentifier>(
        self,
        field: &str,
        id: Option<&I>,
    ) -> Self {
        match id {
            Some(id) => self.valid_identifier(field, id),
            None => self,
        }
    }

    /// The fields must not all be set at once.
    pub fn conflicting_fields(mut self, fields: &[(&str, bool)]) -> Self {
        if fields.iter().all(|(_, set)| *set) {
            self.errors.push(SdkError::ConflictingFields {
                structure: self.structure.to_string(),
                fields: names(fields),
            });
        }
        self
    }

    /// Exactly one of the fields must be set.
    pub fn exactly_one_of(mut self, fields: &[(&str, bool)]) -> Self {
        if fields.iter().filter(|(_, set)| *set).count() != 1 {
            self.errors.push(SdkError::ExactlyOneOf {
                structure: self.structure.to_string(),
                fields: names(fields),
            });
        }
        self
    }

    /// At least one of the fields must be set.
    pub fn at_least_one_of(mut self, fields: &[(&str, bool)]) -> Self {
        if !fields.iter().any(|(_, set)| *set) {
            self.errors.push(SdkError::AtLeastOneOf {
                structure: self.structure.to_string(),
                fields: names(fields),
            });
        }
        self
    }

    /// Validate a nested sub-clause if present, remembering which field it came from.
    pub fn nested<T: Validate>(mut self, field: &str, value: Option<&T>) -> Self {
        if let Some(Err(err)) = value.map(Validate::validate) {
            self.errors.push(SdkError::Nested {
                field: field.to_string(),
                source: Box::new(err),
            });
        }
        self
    }

    /// Record an arbitrary violation when `violated` holds.
    pub fn check(mut self, violated: bool, err: impl FnOnce() -> SdkError) -> Self {
        if violated {
            self.errors.push(err());
        }
        self
    }

    /// Finish the chain: no errors, one error, or all of them joined.
    pub fn finish(mut self) -> SdkResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(SdkError::Multiple(self.errors)),
        }
    }
}

fn names(fields: &[(&str, bool)]) -> Vec<String> {
    fields.iter().map(|(name, _)| name.to_string()).collect()
}

/// Validate a value and turn every violation into an error diagnostic.
///
/// An empty list means the value is valid.
pub fn validate<T: Validate>(value: &T) -> Vec<Diagnostic> {
    match value.validate() {
        Ok(()) => Vec::new(),
        Err(err) => diagnostics(&err),
    }
}

/// Check if a value passes validation.
pub fn is_valid<T: Validate>(value: &T) -> bool {
    value.validate().is_ok()
}

/// Turn an error into diagnostics, one per leaf violation.
///
/// Nested errors carry the dotted field path as the diagnostic attribute.
pub fn diagnostics(err: &SdkError) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    collect_diagnostics(err, "", &mut out);
    out
}

fn collect_diagnostics(err: &SdkError, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    match err {
        SdkError::Multiple(errs) => {
            for err in errs {
                collect_diagnostics(err, path, diagnostics);
            }
        },
        SdkError::Nested { field, source } => {
            collect_diagnostics(source, &join_path(path, field), diagnostics);
        },
        SdkError::InvalidObjectIdentifier { field } => {
            diagnostics.push(
                Diagnostic::error(err.to_string()).with_attribute(join_path(path, field)),
            );
        },
        other => {
            let diagnostic = Diagnostic::error(other.to_string());
            diagnostics.push(if path.is_empty() {
                diagnostic
            } else {
                diagnostic.with_attribute(path)
            });
        },
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{AccountObjectIdentifier, DatabaseObjectIdentifier};

    struct Unset {
        comment: Option<bool>,
        auto_suspend: Option<bool>,
    }

    impl Validate for Unset {
        fn validate(&self) -> SdkResult<()> {
            Validator::new("UnsetOptions")
                .at_least_one_of(&[
                    ("Comment", flag(self.comment)),
                    ("AutoSuspend", flag(self.auto_suspend)),
                ])
                .finish()
        }
    }

    #[test]
    fn test_valid_identifier() {
        let ok = Validator::new("Opts")
            .valid_identifier("name", &AccountObjectIdentifier::new("WH"))
            .finish();
        assert!(ok.is_ok());

        let err = Validator::new("Opts")
            .valid_identifier("name", &DatabaseObjectIdentifier::new("DB", ""))
            .finish()
            .unwrap_err();
        assert!(matches!(err, SdkError::InvalidObjectIdentifier { ref field } if field == "name"));
    }

    #[test]
    fn test_optional_identifier_only_checked_when_present() {
        let ok = Validator::new("Opts")
            .valid_optional_identifier("rename", None::<&AccountObjectIdentifier>)
            .finish();
        assert!(ok.is_ok());

        let err = Validator::new("Opts")
            .valid_optional_identifier("rename", Some(&AccountObjectIdentifier::new(" ")))
            .finish();
        assert!(err.is_err());
    }

    #[test]
    fn test_conflicting_fields_requires_all_set() {
        assert!(Validator::new("Opts")
            .conflicting_fields(&[("A", true), ("B", false)])
            .finish()
            .is_ok());

        let err = Validator::new("Opts")
            .conflicting_fields(&[("A", true), ("B", true)])
            .finish()
            .unwrap_err();
        match err {
            SdkError::ConflictingFields { structure, fields } => {
                assert_eq!(structure, "Opts");
                assert_eq!(fields, vec!["A".to_string(), "B".to_string()]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exactly_one_of() {
        let rule = |a, b| {
            Validator::new("Opts")
                .exactly_one_of(&[("A", a), ("B", b)])
                .finish()
        };
        assert!(rule(true, false).is_ok());
        assert!(rule(false, true).is_ok());
        assert!(matches!(rule(false, false), Err(SdkError::ExactlyOneOf { .. })));
        assert!(matches!(rule(true, true), Err(SdkError::ExactlyOneOf { .. })));
    }

    #[test]
    fn test_at_least_one_of() {
        let unset = Unset {
            comment: None,
            auto_suspend: Some(false),
        };
        assert!(matches!(unset.validate(), Err(SdkError::AtLeastOneOf { .. })));

        let unset = Unset {
            comment: Some(true),
            auto_suspend: None,
        };
        assert!(unset.validate().is_ok());
    }

    #[test]
    fn test_errors_are_aggregated() {
        let err = Validator::new("Opts")
            .valid_identifier("name", &AccountObjectIdentifier::new(""))
            .conflicting_fields(&[("OrReplace", true), ("IfNotExists", true)])
            .exactly_one_of(&[("Set", false), ("Unset", false)])
            .finish()
            .unwrap_err();

        let leaves = err.leaves();
        assert_eq!(leaves.len(), 3);
        assert!(matches!(leaves[0], SdkError::InvalidObjectIdentifier { .. }));
        assert!(matches!(leaves[1], SdkError::ConflictingFields { .. }));
        assert!(matches!(leaves[2], SdkError::ExactlyOneOf { .. }));
    }

    #[test]
    fn test_nested_errors_are_wrapped() {
        let unset = Unset {
            comment: None,
            auto_suspend: None,
        };
        let err = Validator::new("AlterOptions")
            .nested("Unset", Some(&unset))
            .finish()
            .unwrap_err();
        assert!(matches!(err, SdkError::Nested { ref field, .. } if field == "Unset"));
        assert!(err.to_string().starts_with("validation of Unset failed"));

        assert!(Validator::new("AlterOptions")
            .nested("Unset", None::<&Unset>)
            .finish()
            .is_ok());
    }

    #[test]
    fn test_check_custom_rule() {
        let err = Validator::new("Opts")
            .check(true, || SdkError::NilOptions)
            .check(false, || unreachable!())
            .finish()
            .unwrap_err();
        assert!(matches!(err, SdkError::NilOptions));
    }

    #[test]
    fn test_diagnostics_carry_paths() {
        let unset = Unset {
            comment: None,
            auto_suspend: None,
        };
        let err = Validator::new("AlterOptions")
            .valid_identifier("name", &AccountObjectIdentifier::new(""))
            .nested("Unset", Some(&unset))
            .finish()
            .unwrap_err();

        let diagnostics = diagnostics(&err);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));
        assert_eq!(diagnostics[1].attribute, Some("Unset".to_string()));
        assert!(diagnostics[1].summary.contains("at least one of"));
    }

    #[test]
    fn test_validate_and_is_valid_helpers() {
        let good = Unset {
            comment: Some(true),
            auto_suspend: None,
        };
        let bad = Unset {
            comment: None,
            auto_suspend: None,
        };
        assert!(validate(&good).is_empty());
        assert!(is_valid(&good));
        assert_eq!(validate(&bad).len(), 1);
        assert!(!is_valid(&bad));
    }
}
