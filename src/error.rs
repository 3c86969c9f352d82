//! Error types for the Snowflake provider SDK.
//!
//! [`SdkError`] covers everything that can go wrong between a typed options
//! struct and a typed domain object: validation, rendering, execution and
//! row mapping. [`ProviderError`] is what resource callbacks hand back to the
//! plugin host.

use thiserror::Error;

use crate::identifiers::ObjectType;

/// Result alias used throughout the SQL layer.
pub type SdkResult<T> = Result<T, SdkError>;

/// Errors produced by the request builders, the validation chain and the row mapper.
#[derive(Debug, Error)]
pub enum SdkError {
    /// An operation that needs an options struct was given none.
    #[error("options cannot be nil")]
    NilOptions,

    /// A required identifier is empty or malformed.
    #[error("invalid object identifier in field {field}")]
    InvalidObjectIdentifier {
        /// Name of the field holding the identifier.
        field: String,
    },

    /// All fields of a mutually exclusive set were given at once.
    #[error("{structure} fields: {fields:?} are incompatible and cannot be set at the same time")]
    ConflictingFields {
        /// The options struct being validated.
        structure: String,
        /// The conflicting field names.
        fields: Vec<String>,
    },

    /// None, or more than one, of a set of fields was given.
    #[error("exactly one of {structure} fields {fields:?} must be set")]
    ExactlyOneOf {
        /// The options struct being validated.
        structure: String,
        /// The candidate field names.
        fields: Vec<String>,
    },

    /// None of a set of fields was given.
    #[error("at least one of {structure} fields {fields:?} must be set")]
    AtLeastOneOf {
        /// The options struct being validated.
        structure: String,
        /// The candidate field names.
        fields: Vec<String>,
    },

    /// A request-specific rule that fits none of the generic rules failed.
    #[error("{structure}: {reason}")]
    Invalid {
        /// The options struct being validated.
        structure: String,
        /// The violated rule.
        reason: String,
    },

    /// A nested sub-clause failed validation.
    #[error("validation of {field} failed: {source}")]
    Nested {
        /// Field name of the nested sub-clause.
        field: String,
        /// The nested error.
        #[source]
        source: Box<SdkError>,
    },

    /// Several independent validation failures.
    #[error("{}", join_messages(.0))]
    Multiple(Vec<SdkError>),

    /// A result row could not be converted into a domain struct.
    #[error("cannot map column {column}: {reason}")]
    Mapping {
        /// The offending column.
        column: String,
        /// What went wrong.
        reason: String,
    },

    /// A raw identifier string could not be parsed.
    #[error("unable to parse identifier {input:?}: {reason}")]
    Parse {
        /// The raw input.
        input: String,
        /// What went wrong, naming the malformed segment.
        reason: String,
    },

    /// A `SHOW ... LIKE` lookup returned no exactly matching row.
    #[error("{object_type} {id} does not exist or not authorized")]
    ObjectNotFound {
        /// Kind of object that was looked up.
        object_type: ObjectType,
        /// Fully qualified name that was looked up.
        id: String,
    },

    /// The SQL executor rejected a statement.
    #[error("execution of {statement:?} failed: {message}")]
    Execution {
        /// The statement that was sent.
        statement: String,
        /// The driver's message.
        message: String,
    },
}

impl SdkError {
    /// Create a mapping error for a column.
    pub fn mapping(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Mapping {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create an identifier parse error.
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from the validation chain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NilOptions
                | Self::InvalidObjectIdentifier { .. }
                | Self::ConflictingFields { .. }
                | Self::ExactlyOneOf { .. }
                | Self::AtLeastOneOf { .. }
                | Self::Invalid { .. }
                | Self::Nested { .. }
                | Self::Multiple(_)
        )
    }

    /// Flatten aggregated and nested errors into their leaf errors.
    ///
    /// Nested errors are kept wrapped so the field path survives.
    pub fn leaves(&self) -> Vec<&SdkError> {
        match self {
            Self::Multiple(errs) => errs.iter().flat_map(SdkError::leaves).collect(),
            other => vec![other],
        }
    }
}

fn join_messages(errs: &[SdkError]) -> String {
    errs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors returned from resource and data source callbacks.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The planned state did not pass validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The SQL layer failed.
    #[error("SDK error: {0}")]
    Sdk(String),

    /// The provider is not, or cannot be, configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// State could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The host sent a request that cannot be served.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Sdk(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::InvalidRequest(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
        }
    }

    /// Whether the object behind the callback is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<SdkError> for ProviderError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::ObjectNotFound { .. } => ProviderError::NotFound(err.to_string()),
            SdkError::Parse { .. } => ProviderError::InvalidRequest(err.to_string()),
            err if err.is_validation() => ProviderError::Validation(err.to_string()),
            err => ProviderError::Sdk(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_error_display() {
        let err = SdkError::ConflictingFields {
            structure: "CreateDatabaseRoleOptions".to_string(),
            fields: vec!["OrReplace".to_string(), "IfNotExists".to_string()],
        };
        assert_eq!(
            err.to_string(),
            concat!(
                "CreateDatabaseRoleOptions fields: [\"OrReplace\", \"IfNotExists\"] ",
                "are incompatible and cannot be set at the same time",
            )
        );

        let err = SdkError::mapping("created_on", "not a timestamp");
        assert_eq!(err.to_string(), "cannot map column created_on: not a timestamp");
    }

    #[test]
    fn test_multiple_joins_messages() {
        let err = SdkError::Multiple(vec![
            SdkError::InvalidObjectIdentifier {
                field: "name".to_string(),
            },
            SdkError::NilOptions,
        ]);
        assert_eq!(
            err.to_string(),
            "invalid object identifier in field name\noptions cannot be nil"
        );
        assert_eq!(err.leaves().len(), 2);
    }

    #[test]
    fn test_leaves_keep_nested_wrapping() {
        let err = SdkError::Multiple(vec![
            SdkError::Nested {
                field: "Set".to_string(),
                source: Box::new(SdkError::NilOptions),
            },
            SdkError::Multiple(vec![SdkError::NilOptions]),
        ]);
        let leaves = err.leaves();
        assert_eq!(leaves.len(), 2);
        assert!(matches!(leaves[0], SdkError::Nested { .. }));
    }

    #[test]
    fn test_provider_error_from_sdk_error() {
        let err: ProviderError = SdkError::ObjectNotFound {
            object_type: ObjectType::Warehouse,
            id: "\"WH\"".to_string(),
        }
        .into();
        assert!(err.is_not_found());

        let err: ProviderError = SdkError::NilOptions.into();
        assert!(matches!(err, ProviderError::Validation(_)));

        let err: ProviderError = SdkError::parse("a.b", "too many segments").into();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));

        let err: ProviderError = SdkError::Execution {
            statement: "DROP ROLE \"R\"".to_string(),
            message: "insufficient privileges".to_string(),
        }
        .into();
        assert!(matches!(err, ProviderError::Sdk(_)));
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("resource-123".to_string());
        assert_eq!(err.message(), "resource-123");

        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid config");
    }
}
