//! Per-object request builders, domain structs and client handles.
//!
//! Each submodule follows the same layout:
//!
//! - `Create*Options`, `Alter*Options`, `Drop*Options`, `Show*Options`: one
//!   struct per statement, with `with_*` builders, [`Validate`] and [`ToSql`].
//! - A domain struct implementing [`FromRow`](crate::row::FromRow) for one
//!   `SHOW` row.
//! - A handle borrowed from [`Client`](crate::client::Client) that runs them.
//!
//! Shared clause types live here.

use crate::error::SdkResult;
use crate::identifiers::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier,
};
use crate::sql::{single_quote, ListOptions, ParameterOptions, Separator, StatementBuilder, ToSql};
use crate::validation::{Validate, Validator};

pub mod database;
pub mod database_role;
pub mod function;
pub mod role;
pub mod schema;
pub mod stream;
pub mod warehouse;

/// Declare an enum whose values are SQL keywords.
///
/// Generates `as_sql`, `Display`, a forgiving `FromStr` (case-insensitive,
/// with aliases) and serde support using the SQL spelling.
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $sql:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The SQL spelling.
            pub fn as_sql(&self) -> &'static str {
                match self {
                    $($name::$variant => $sql,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_sql())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_uppercase();
                $(
                    if normalized == $sql $(|| normalized == $alias)* {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("unknown {} {:?}", stringify!($name), s))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_sql())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use sql_enum;

/// `LIKE '<pattern>'` filter for `SHOW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    /// The pattern; `%` and `_` are wildcards.
    pub pattern: String,
}

impl Like {
    /// Create a filter.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl ToSql for Like {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().parameter(
            "LIKE",
            Some(&self.pattern),
            ParameterOptions::single_quotes().without_equals(),
        )
    }
}

/// `IN ...` scope for `SHOW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum In {
    /// `IN ACCOUNT`
    Account,
    /// `IN DATABASE "DB"`
    Database(AccountObjectIdentifier),
    /// `IN SCHEMA "DB"."SCHEMA"`
    Schema(DatabaseObjectIdentifier),
}

impl ToSql for In {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new().static_keyword("IN");
        match self {
            In::Account => builder.static_keyword("ACCOUNT"),
            In::Database(id) => builder.static_keyword("DATABASE").identifier(id),
            In::Schema(id) => builder.static_keyword("SCHEMA").identifier(id),
        }
    }
}

impl Validate for In {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("In");
        match self {
            In::Account => validator,
            In::Database(id) => validator.valid_identifier("Database", id),
            In::Schema(id) => validator.valid_identifier("Schema", id),
        }
        .finish()
    }
}

/// `LIMIT <rows> [FROM '<name>']` for `SHOW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitFrom {
    /// Maximum number of rows.
    pub rows: u32,
    /// Start after this name.
    pub from: Option<String>,
}

impl LimitFrom {
    /// Limit to `rows` rows.
    pub fn new(rows: u32) -> Self {
        Self { rows, from: None }
    }

    /// Start listing after `name`.
    pub fn with_from(mut self, name: impl Into<String>) -> Self {
        self.from = Some(name.into());
        self
    }
}

impl ToSql for LimitFrom {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .parameter("LIMIT", Some(self.rows), ParameterOptions::bare().without_equals())
            .parameter(
                "FROM",
                self.from.as_ref(),
                ParameterOptions::single_quotes().without_equals(),
            )
    }
}

/// A tag assignment: `"DB"."SCHEMA"."TAG" = 'value'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAssociation {
    /// The tag.
    pub name: SchemaObjectIdentifier,
    /// The value assigned.
    pub value: String,
}

impl TagAssociation {
    /// Create a tag assignment.
    pub fn new(name: SchemaObjectIdentifier, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

impl ToSql for TagAssociation {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().raw(format!(
            "{} = {}",
            self.name.fully_qualified_name(),
            single_quote(&self.value)
        ))
    }
}

/// `WITH TAG ("T1" = 'a', ...)` as used by `CREATE`.
pub(crate) fn with_tags(
    builder: StatementBuilder,
    tags: Option<&Vec<TagAssociation>>,
) -> StatementBuilder {
    builder.nested_list(
        Some("WITH TAG"),
        tags.map(Vec::as_slice),
        ListOptions::parenthesized().with_empty(crate::sql::EmptyList::Omit),
    )
}

/// `SET TAG "T1" = 'a', ...` as used by `ALTER`.
pub(crate) fn set_tags(
    builder: StatementBuilder,
    tags: Option<&Vec<TagAssociation>>,
) -> StatementBuilder {
    builder.nested_list(Some("SET TAG"), tags.map(Vec::as_slice), ListOptions::bare())
}

/// `UNSET TAG "T1", ...` as used by `ALTER`.
pub(crate) fn unset_tags(
    builder: StatementBuilder,
    tags: Option<&Vec<SchemaObjectIdentifier>>,
) -> StatementBuilder {
    builder.optional_list(
        Some("UNSET TAG"),
        tags.map(|tags| tags.iter().map(ObjectIdentifier::fully_qualified_name)),
        ListOptions::bare().with_separator(Separator::Comma),
    )
}

/// Validate every tag name in a list.
pub(crate) fn validate_tags(
    validator: Validator,
    field: &str,
    tags: Option<&Vec<TagAssociation>>,
) -> Validator {
    tags.into_iter()
        .flatten()
        .fold(validator, |v, tag| v.valid_identifier(field, &tag.name))
}

/// Names of the keyword flags that are switched on, for `UNSET a, b` clauses.
pub(crate) fn set_flags<'a>(flags: &[(&'a str, Option<bool>)]) -> Vec<&'a str> {
    flags
        .iter()
        .filter(|(_, value)| *value == Some(true))
        .map(|(name, _)| *name)
        .collect()
}
