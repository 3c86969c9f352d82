//! Statement builder.
//!
//! Every options struct lists its clauses, in grammar order, through a
//! [`StatementBuilder`]. The builder is the only place that knows how a clause
//! kind turns into SQL text:
//!
//! | Clause       | Rendered as                                            |
//! |--------------|--------------------------------------------------------|
//! | static       | the token, always                                      |
//! | keyword      | the token, only for `Some(true)`                       |
//! | identifier   | the identifier's fully qualified name                  |
//! | parameter    | `KEY = value`, quoting per [`ParameterOptions`]        |
//! | list         | `KEY (a, b)`, layout per [`ListOptions`]               |
//! | nested       | `PREFIX <rendered sub-struct>`, optionally in `( )`    |
//!
//! A `None` anywhere means the clause is left out entirely.
//!
//! # Example
//!
//! ```
//! use snowflake_provider_sdk::sql::{ParameterOptions, StatementBuilder};
//!
//! let sql = StatementBuilder::new()
//!     .static_keyword("ALTER WAREHOUSE")
//!     .keyword(Some(true), "IF EXISTS")
//!     .raw("\"WH\"")
//!     .static_keyword("SET")
//!     .parameter("AUTO_SUSPEND", Some(60), ParameterOptions::bare())
//!     .parameter("COMMENT", None::<&str>, ParameterOptions::single_quotes())
//!     .build();
//! assert_eq!(sql, r#"ALTER WAREHOUSE IF EXISTS "WH" SET AUTO_SUSPEND = 60"#);
//! ```

use std::fmt;

use tracing::debug;

use crate::error::{SdkError, SdkResult};
use crate::identifiers::ObjectIdentifier;
use crate::validation::Validate;

/// How a parameter value is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quote {
    /// Rendered bare (numbers, booleans, enum keywords).
    #[default]
    None,
    /// Rendered as a string literal, `'` and `\` escaped.
    Single,
    /// Rendered as a quoted name, `"` doubled.
    Double,
}

impl Quote {
    /// Apply this quoting to a value.
    pub fn apply(&self, value: &str) -> String {
        match self {
            Quote::None => value.to_string(),
            Quote::Single => single_quote(value),
            Quote::Double => crate::identifiers::quote(value),
        }
    }
}

/// Render a string literal: `'it\'s'`.
pub fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Layout of a `KEY = value` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterOptions {
    quote: Quote,
    parentheses: bool,
    no_equals: bool,
}

impl ParameterOptions {
    /// `KEY = value`
    pub const fn bare() -> Self {
        Self {
            quote: Quote::None,
            parentheses: false,
            no_equals: false,
        }
    }

    /// `KEY = 'value'`
    pub const fn single_quotes() -> Self {
        Self {
            quote: Quote::Single,
            parentheses: false,
            no_equals: false,
        }
    }

    /// `KEY = "value"`
    pub const fn double_quotes() -> Self {
        Self {
            quote: Quote::Double,
            parentheses: false,
            no_equals: false,
        }
    }

    /// Wrap the value in parentheses: `KEY = (value)`.
    pub const fn with_parentheses(mut self) -> Self {
        self.parentheses = true;
        self
    }

    /// Drop the equals sign: `KEY value`.
    pub const fn without_equals(mut self) -> Self {
        self.no_equals = true;
        self
    }
}

/// What an empty list renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyList {
    /// `KEY ()`
    #[default]
    Parens,
    /// Nothing at all.
    Omit,
}

/// Separator between list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// `a, b`
    #[default]
    Comma,
    /// `a b`
    Space,
}

/// Layout of a list clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    parentheses: bool,
    separator: Separator,
    empty: EmptyList,
    equals: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::parenthesized()
    }
}

impl ListOptions {
    /// `KEY (a, b)`, empty renders `KEY ()`.
    pub const fn parenthesized() -> Self {
        Self {
            parentheses: true,
            separator: Separator::Comma,
            empty: EmptyList::Parens,
            equals: false,
        }
    }

    /// `KEY a, b`, empty lists are omitted.
    pub const fn bare() -> Self {
        Self {
            parentheses: false,
            separator: Separator::Comma,
            empty: EmptyList::Omit,
            equals: false,
        }
    }

    /// Set the empty-list policy.
    pub const fn with_empty(mut self, empty: EmptyList) -> Self {
        self.empty = empty;
        self
    }

    /// Set the item separator.
    pub const fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Render as `KEY = (a, b)`.
    pub const fn with_equals(mut self) -> Self {
        self.equals = true;
        self
    }
}

/// A single rendered unit of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A fixed token.
    Static(&'static str),
    /// A token emitted because its flag was set.
    Keyword(&'static str),
    /// An identifier, already in canonical form.
    Identifier(String),
    /// `KEY = value`.
    Parameter {
        /// Parameter keyword.
        key: &'static str,
        /// Unquoted value.
        value: String,
        /// Layout.
        options: ParameterOptions,
    },
    /// A list of already rendered items.
    List {
        /// Optional leading keyword.
        key: Option<&'static str>,
        /// Rendered items, in order.
        items: Vec<String>,
        /// Layout.
        options: ListOptions,
    },
    /// A rendered sub-struct.
    Nested {
        /// Optional leading keyword.
        prefix: Option<&'static str>,
        /// The sub-struct's rendered SQL.
        body: String,
        /// Whether the body is wrapped in parentheses.
        parentheses: bool,
    },
    /// Text that was rendered elsewhere.
    Raw(String),
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Static(token) | Clause::Keyword(token) => f.write_str(token),
            Clause::Identifier(id) | Clause::Raw(id) => f.write_str(id),
            Clause::Parameter {
                key,
                value,
                options,
            } => {
                let mut value = options.quote.apply(value);
                if options.parentheses {
                    value = format!("({value})");
                }
                if options.no_equals {
                    write!(f, "{key} {value}")
                } else {
                    write!(f, "{key} = {value}")
                }
            },
            Clause::List {
                key,
                items,
                options,
            } => {
                let separator = match options.separator {
                    Separator::Comma => ", ",
                    Separator::Space => " ",
                };
                let mut body = items.join(separator);
                if options.parentheses {
                    body = format!("({body})");
                }
                match (key, options.equals) {
                    (Some(key), true) => write!(f, "{key} = {body}"),
                    (Some(key), false) => write!(f, "{key} {body}"),
                    (None, _) => f.write_str(&body),
                }
            },
            Clause::Nested {
                prefix,
                body,
                parentheses,
            } => {
                let body = if *parentheses {
                    format!("({body})")
                } else {
                    body.clone()
                };
                match prefix {
                    Some(prefix) if body.is_empty() => f.write_str(prefix),
                    Some(prefix) => write!(f, "{prefix} {body}"),
                    None => f.write_str(&body),
                }
            },
        }
    }
}

/// Collects clauses in grammar order and joins them into one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBuilder {
    clauses: Vec<Clause>,
}

impl StatementBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Always emit `token`.
    pub fn static_keyword(self, token: &'static str) -> Self {
        self.push(Clause::Static(token))
    }

    /// Emit `token` only when the flag is `Some(true)`.
    pub fn keyword(self, flag: Option<bool>, token: &'static str) -> Self {
        if flag == Some(true) {
            self.push(Clause::Keyword(token))
        } else {
            self
        }
    }

    /// Emit the identifier's canonical form.
    pub fn identifier(self, id: &impl ObjectIdentifier) -> Self {
        self.push(Clause::Identifier(id.fully_qualified_name()))
    }

    /// Emit the identifier's canonical form if present.
    pub fn optional_identifier<I: ObjectIdentifier>(self, id: Option<&I>) -> Self {
        match id {
            Some(id) => self.identifier(id),
            None => self,
        }
    }

    /// Emit `key id` if the identifier is present, e.g. `RENAME TO "NEW"`.
    pub fn identifier_parameter<I: ObjectIdentifier>(
        self,
        key: &'static str,
        id: Option<&I>,
    ) -> Self {
        match id {
            Some(id) => self
                .push(Clause::Static(key))
                .push(Clause::Identifier(id.fully_qualified_name())),
            None => self,
        }
    }

    /// Emit `key = value` if the value is present.
    pub fn parameter<V: fmt::Display>(
        self,
        key: &'static str,
        value: Option<V>,
        options: ParameterOptions,
    ) -> Self {
        match value {
            Some(value) => self.push(Clause::Parameter {
                key,
                value: value.to_string(),
                options,
            }),
            None => self,
        }
    }

    /// Emit a list of rendered items.
    pub fn list<I>(self, key: Option<&'static str>, items: I, options: ListOptions) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() && options.empty == EmptyList::Omit {
            return self;
        }
        self.push(Clause::List {
            key,
            items,
            options,
        })
    }

    /// Emit a list if present; `None` is always omitted regardless of the empty policy.
    pub fn optional_list<I>(
        self,
        key: Option<&'static str>,
        items: Option<I>,
        options: ListOptions,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        match items {
            Some(items) => self.list(key, items, options),
            None => self,
        }
    }

    /// Emit a list whose items are themselves rendered through [`ToSql`].
    pub fn nested_list<T: ToSql>(
        self,
        key: Option<&'static str>,
        items: Option<&[T]>,
        options: ListOptions,
    ) -> Self {
        self.optional_list(key, items.map(|items| items.iter().map(ToSql::to_sql)), options)
    }

    /// Emit a rendered sub-struct if present.
    pub fn nested<T: ToSql>(
        self,
        prefix: Option<&'static str>,
        value: Option<&T>,
        parentheses: bool,
    ) -> Self {
        match value {
            Some(value) => self.push(Clause::Nested {
                prefix,
                body: value.to_sql(),
                parentheses,
            }),
            None => self,
        }
    }

    /// Emit already rendered text.
    pub fn raw(self, text: impl Into<String>) -> Self {
        self.push(Clause::Raw(text.into()))
    }

    /// The clauses collected so far.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Join all clauses with single spaces.
    pub fn build(&self) -> String {
        self.clauses
            .iter()
            .map(ToString::to_string)
            .filter(|clause| !clause.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Something that renders into SQL text through a [`StatementBuilder`].
pub trait ToSql {
    /// List this value's clauses in grammar order.
    fn clauses(&self) -> StatementBuilder;

    /// Render this value.
    fn to_sql(&self) -> String {
        self.clauses().build()
    }
}

/// Validate an options struct and render it.
///
/// `None` is a caller bug and yields [`SdkError::NilOptions`].
pub fn build<T: ToSql + Validate>(opts: Option<&T>) -> SdkResult<String> {
    let opts = opts.ok_or(SdkError::NilOptions)?;
    opts.validate()?;
    let sql = opts.to_sql();
    debug!(%sql, "rendered statement");
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{AccountObjectIdentifier, DatabaseObjectIdentifier};

    #[derive(Default)]
    struct Inner {
        comment: Option<String>,
        size: Option<u32>,
    }

    impl ToSql for Inner {
        fn clauses(&self) -> StatementBuilder {
            StatementBuilder::new()
                .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes())
                .parameter("SIZE", self.size, ParameterOptions::bare())
        }
    }

    impl Validate for Inner {
        fn validate(&self) -> SdkResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_keyword_only_for_true() {
        let render = |flag| StatementBuilder::new().keyword(flag, "OR REPLACE").build();
        assert_eq!(render(Some(true)), "OR REPLACE");
        assert_eq!(render(Some(false)), "");
        assert_eq!(render(None), "");
    }

    #[test]
    fn test_parameter_quoting() {
        let sql = StatementBuilder::new()
            .parameter("COMMENT", Some("it's a \\ test"), ParameterOptions::single_quotes())
            .parameter("OWNER", Some("Role\"1"), ParameterOptions::double_quotes())
            .parameter("MAX", Some(10), ParameterOptions::bare().with_parentheses())
            .parameter("LIKE", Some("WH%"), ParameterOptions::single_quotes().without_equals())
            .build();
        assert_eq!(
            sql,
            r#"COMMENT = 'it\'s a \\ test' OWNER = "Role""1" MAX = (10) LIKE 'WH%'"#
        );
    }

    #[test]
    fn test_list_rendering_preserves_order() {
        let sql = StatementBuilder::new()
            .list(None, ["a", "b", "c"], ListOptions::parenthesized())
            .build();
        assert_eq!(sql, "(a, b, c)");

        let sql = StatementBuilder::new()
            .list(
                Some("UNSET"),
                ["COMMENT", "AUTO_SUSPEND"],
                ListOptions::bare(),
            )
            .build();
        assert_eq!(sql, "UNSET COMMENT, AUTO_SUSPEND");

        let sql = StatementBuilder::new()
            .list(
                Some("ARGS"),
                ["x", "y"],
                ListOptions::parenthesized()
                    .with_separator(Separator::Space)
                    .with_equals(),
            )
            .build();
        assert_eq!(sql, "ARGS = (x y)");
    }

    #[test]
    fn test_empty_list_policy() {
        let empty: Vec<String> = Vec::new();
        let parens = StatementBuilder::new()
            .list(Some("TAGS"), empty.clone(), ListOptions::parenthesized())
            .build();
        assert_eq!(parens, "TAGS ()");

        let omitted = StatementBuilder::new()
            .static_keyword("X")
            .list(
                Some("TAGS"),
                empty.clone(),
                ListOptions::parenthesized().with_empty(EmptyList::Omit),
            )
            .build();
        assert_eq!(omitted, "X");

        let absent = StatementBuilder::new()
            .optional_list(Some("TAGS"), None::<Vec<String>>, ListOptions::parenthesized())
            .build();
        assert_eq!(absent, "");
    }

    #[test]
    fn test_identifiers() {
        let role = DatabaseObjectIdentifier::new("DB", "ROLE1");
        let sql = StatementBuilder::new()
            .static_keyword("ALTER DATABASE ROLE")
            .identifier(&role)
            .identifier_parameter("RENAME TO", Some(&DatabaseObjectIdentifier::new("DB", "ROLE2")))
            .optional_identifier(None::<&AccountObjectIdentifier>)
            .build();
        assert_eq!(sql, r#"ALTER DATABASE ROLE "DB"."ROLE1" RENAME TO "DB"."ROLE2""#);
    }

    #[test]
    fn test_nested_rendering() {
        let inner = Inner {
            comment: Some("hi".to_string()),
            size: Some(3),
        };
        let sql = StatementBuilder::new()
            .static_keyword("ALTER")
            .nested(Some("SET"), Some(&inner), false)
            .build();
        assert_eq!(sql, "ALTER SET COMMENT = 'hi' SIZE = 3");

        let sql = StatementBuilder::new()
            .nested(Some("WITH"), Some(&inner), true)
            .build();
        assert_eq!(sql, "WITH (COMMENT = 'hi' SIZE = 3)");

        let empty = Inner::default();
        let sql = StatementBuilder::new()
            .nested(Some("SET"), Some(&empty), false)
            .build();
        assert_eq!(sql, "SET");

        let sql = StatementBuilder::new()
            .nested(Some("SET"), None::<&Inner>, false)
            .build();
        assert_eq!(sql, "");
    }

    #[test]
    fn test_nested_list() {
        let items = vec![
            Inner {
                comment: Some("a".to_string()),
                size: None,
            },
            Inner {
                comment: None,
                size: Some(2),
            },
        ];
        let sql = StatementBuilder::new()
            .nested_list(Some("ITEMS"), Some(items.as_slice()), ListOptions::parenthesized())
            .build();
        assert_eq!(sql, "ITEMS (COMMENT = 'a', SIZE = 2)");
    }

    #[test]
    fn test_omission_law() {
        let without = Inner {
            comment: None,
            size: Some(1),
        };
        let with = Inner {
            comment: Some("c".to_string()),
            size: Some(1),
        };
        assert_eq!(without.to_sql(), "SIZE = 1");
        assert_eq!(with.to_sql(), "COMMENT = 'c' SIZE = 1");
        assert!(!without.to_sql().contains("COMMENT"));
    }

    #[test]
    fn test_build_rejects_missing_options() {
        let err = build::<Inner>(None).unwrap_err();
        assert!(matches!(err, SdkError::NilOptions));

        let sql = build(Some(&Inner::default())).unwrap();
        assert_eq!(sql, "");
    }

    #[test]
    fn test_clauses_are_recorded() {
        let builder = StatementBuilder::new()
            .static_keyword("DROP")
            .keyword(Some(true), "IF EXISTS");
        assert_eq!(
            builder.clauses(),
            &[Clause::Static("DROP"), Clause::Keyword("IF EXISTS")]
        );
    }
}
