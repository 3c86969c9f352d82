//! Identifier value types.
//!
//! Every managed object is addressed by one of four identifier kinds, ordered
//! by qualification depth:
//!
//! | Type                                   | Canonical form                    |
//! |----------------------------------------|-----------------------------------|
//! | [`AccountObjectIdentifier`]            | `"NAME"`                          |
//! | [`DatabaseObjectIdentifier`]           | `"DB"."NAME"`                     |
//! | [`SchemaObjectIdentifier`]             | `"DB"."SCHEMA"."NAME"`            |
//! | [`SchemaObjectIdentifierWithArguments`]| `"DB"."SCHEMA"."NAME"(VARCHAR)`   |
//!
//! Segments are stored exactly as given; no case folding happens here. The
//! canonical form quotes every segment and doubles embedded `"`, so two
//! identifiers are equal exactly when their canonical strings are equal.
//!
//! # Example
//!
//! ```
//! use snowflake_provider_sdk::identifiers::{ObjectIdentifier, SchemaObjectIdentifier};
//!
//! let id: SchemaObjectIdentifier = "DB.\"my.schema\".T1".parse().unwrap();
//! assert_eq!(id.schema_name(), "my.schema");
//! assert_eq!(id.fully_qualified_name(), r#""DB"."my.schema"."T1""#);
//! assert_eq!(id.fully_qualified_name().parse::<SchemaObjectIdentifier>().unwrap(), id);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SdkError, SdkResult};

/// Common behaviour of all identifier kinds.
pub trait ObjectIdentifier: fmt::Debug + Clone + Send + Sync {
    /// The object's own (last) name segment, unquoted.
    fn name(&self) -> &str;

    /// All name segments from outermost to innermost, unquoted.
    fn parts(&self) -> Vec<&str>;

    /// The canonical, quoted, dot-joined form.
    fn fully_qualified_name(&self) -> String {
        self.parts()
            .into_iter()
            .map(quote)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether every segment is non-blank.
    fn is_valid(&self) -> bool {
        self.parts().iter().all(|part| !part.trim().is_empty())
    }
}

/// Quote a single segment, doubling embedded double quotes.
pub fn quote(segment: &str) -> String {
    format!("\"{}\"", segment.replace('"', "\"\""))
}

/// An object that lives directly in the account (warehouse, database, role).
///
/// The default value has an empty name and fails validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountObjectIdentifier {
    name: String,
}

impl AccountObjectIdentifier {
    /// Create an identifier from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ObjectIdentifier for AccountObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

/// An object that lives in a database (schema, database role).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseObjectIdentifier {
    database: String,
    name: String,
}

impl DatabaseObjectIdentifier {
    /// Create an identifier from its database and name.
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    /// The containing database's name.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// The containing database's identifier.
    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.database.clone())
    }
}

impl ObjectIdentifier for DatabaseObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> Vec<&str> {
        vec![self.database.as_str(), self.name.as_str()]
    }
}

/// An object that lives in a schema (table, stream, view).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaObjectIdentifier {
    database: String,
    schema: String,
    name: String,
}

impl SchemaObjectIdentifier {
    /// Create an identifier from its database, schema and name.
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// The containing database's name.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// The containing schema's name.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// The containing database's identifier.
    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.database.clone())
    }

    /// The containing schema's identifier.
    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(self.database.clone(), self.schema.clone())
    }

    /// Attach an argument signature, producing a callable identifier.
    pub fn with_arguments<I, S>(self, arguments: I) -> SchemaObjectIdentifierWithArguments
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SchemaObjectIdentifierWithArguments {
            arguments: arguments
                .into_iter()
                .map(|arg| normalize_data_type(arg.as_ref()))
                .collect(),
            inner: self,
        }
    }
}

impl ObjectIdentifier for SchemaObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> Vec<&str> {
        vec![self.database.as_str(), self.schema.as_str(), self.name.as_str()]
    }
}

/// A callable schema object (function, procedure) whose argument types are part of its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaObjectIdentifierWithArguments {
    inner: SchemaObjectIdentifier,
    arguments: Vec<String>,
}

impl SchemaObjectIdentifierWithArguments {
    /// Create an identifier from its components and argument data types.
    pub fn new<I, S>(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
        arguments: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SchemaObjectIdentifier::new(database, schema, name).with_arguments(arguments)
    }

    /// The argument data types, upper-cased.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// The identifier without its signature.
    pub fn schema_object_id(&self) -> &SchemaObjectIdentifier {
        &self.inner
    }

    /// The containing schema's identifier.
    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        self.inner.schema_id()
    }

    /// The signature rendered as `(TYPE, TYPE)`.
    pub fn arguments_signature(&self) -> String {
        format!("({})", self.arguments.join(", "))
    }
}

impl ObjectIdentifier for SchemaObjectIdentifierWithArguments {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn parts(&self) -> Vec<&str> {
        self.inner.parts()
    }

    fn fully_qualified_name(&self) -> String {
        format!(
            "{}{}",
            self.inner.fully_qualified_name(),
            self.arguments_signature()
        )
    }
}

fn normalize_data_type(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Split a dotted identifier into unquoted segments.
///
/// Quoted segments may contain dots and doubled quotes; unquoted segments may
/// contain neither quotes nor dots.
fn split_segments(input: &str) -> SdkResult<Vec<String>> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        let index = segments.len() + 1;
        let mut segment = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        segment.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    segment.push(c);
                }
            }
            if !closed {
                return Err(SdkError::parse(
                    input,
                    format!("segment {index} has an unterminated quote"),
                ));
            }
            match chars.peek() {
                None | Some('.') => {},
                Some(c) => {
                    return Err(SdkError::parse(
                        input,
                        format!("unexpected {c:?} after quoted segment {index}"),
                    ));
                },
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                if c == '"' {
                    return Err(SdkError::parse(
                        input,
                        format!("segment {index} contains a stray quote"),
                    ));
                }
                segment.push(c);
                chars.next();
            }
        }

        if segment.is_empty() {
            return Err(SdkError::parse(input, format!("segment {index} is empty")));
        }
        segments.push(segment);

        match chars.next() {
            None => return Ok(segments),
            Some('.') => continue,
            Some(c) => {
                return Err(SdkError::parse(
                    input,
                    format!("unexpected {c:?} after segment {index}"),
                ));
            },
        }
    }
}

fn split_exact<const N: usize>(input: &str) -> SdkResult<[String; N]> {
    let segments = split_segments(input)?;
    let found = segments.len();
    segments.try_into().map_err(|_| {
        SdkError::parse(
            input,
            format!("expected {N} segment(s), found {found}"),
        )
    })
}

/// Split `prefix(args)` at the first parenthesis outside quotes.
pub(crate) fn split_arguments(input: &str) -> SdkResult<(&str, Vec<String>)> {
    let mut in_quotes = false;
    let mut open = None;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => {
                open = Some(i);
                break;
            },
            _ => {},
        }
    }

    let open = open.ok_or_else(|| SdkError::parse(input, "missing argument list"))?;
    let body = input[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| SdkError::parse(input, "argument list is not closed"))?;

    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            },
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SdkError::parse(input, "unbalanced parentheses in arguments"))?;
                current.push(c);
            },
            ',' if depth == 0 => {
                arguments.push(std::mem::take(&mut current));
            },
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(SdkError::parse(input, "unbalanced parentheses in arguments"));
    }
    if !current.trim().is_empty() || !arguments.is_empty() {
        arguments.push(current);
    }

    for (i, arg) in arguments.iter().enumerate() {
        if arg.trim().is_empty() {
            return Err(SdkError::parse(input, format!("argument {} is empty", i + 1)));
        }
    }

    Ok((&input[..open], arguments))
}

impl FromStr for AccountObjectIdentifier {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [name] = split_exact::<1>(s)?;
        Ok(Self { name })
    }
}

impl FromStr for DatabaseObjectIdentifier {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [database, name] = split_exact::<2>(s)?;
        Ok(Self { database, name })
    }
}

impl FromStr for SchemaObjectIdentifier {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [database, schema, name] = split_exact::<3>(s)?;
        Ok(Self {
            database,
            schema,
            name,
        })
    }
}

impl FromStr for SchemaObjectIdentifierWithArguments {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, arguments) = split_arguments(s)?;
        let inner: SchemaObjectIdentifier = prefix.parse().map_err(|err| match err {
            SdkError::Parse { reason, .. } => SdkError::parse(s, reason),
            other => other,
        })?;
        Ok(inner.with_arguments(arguments))
    }
}

macro_rules! identifier_impls {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.fully_qualified_name())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(de::Error::custom)
                }
            }
        )+
    };
}

identifier_impls!(
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    SchemaObjectIdentifierWithArguments,
);

/// Kinds of managed objects, spelled the way SQL spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// `DATABASE`
    Database,
    /// `DATABASE ROLE`
    DatabaseRole,
    /// `ROLE`
    Role,
    /// `WAREHOUSE`
    Warehouse,
    /// `SCHEMA`
    Schema,
    /// `STREAM`
    Stream,
    /// `FUNCTION`
    Function,
    /// `TABLE`
    Table,
    /// `TAG`
    Tag,
}

impl ObjectType {
    /// Singular SQL keyword(s).
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Database => "DATABASE",
            Self::DatabaseRole => "DATABASE ROLE",
            Self::Role => "ROLE",
            Self::Warehouse => "WAREHOUSE",
            Self::Schema => "SCHEMA",
            Self::Stream => "STREAM",
            Self::Function => "FUNCTION",
            Self::Table => "TABLE",
            Self::Tag => "TAG",
        }
    }

    /// Plural form used by `SHOW`.
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Database => "DATABASES",
            Self::DatabaseRole => "DATABASE ROLES",
            Self::Role => "ROLES",
            Self::Warehouse => "WAREHOUSES",
            Self::Schema => "SCHEMAS",
            Self::Stream => "STREAMS",
            Self::Function => "FUNCTIONS",
            Self::Table => "TABLES",
            Self::Tag => "TAGS",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_qualified_names() {
        assert_eq!(
            AccountObjectIdentifier::new("WH").fully_qualified_name(),
            r#""WH""#
        );
        assert_eq!(
            DatabaseObjectIdentifier::new("DB", "ROLE1").fully_qualified_name(),
            r#""DB"."ROLE1""#
        );
        assert_eq!(
            SchemaObjectIdentifier::new("DB", "SCHEMA", "OBJECT").fully_qualified_name(),
            r#""DB"."SCHEMA"."OBJECT""#
        );
        assert_eq!(
            SchemaObjectIdentifierWithArguments::new("DB", "S", "F", ["varchar", "number(38, 0)"])
                .fully_qualified_name(),
            r#""DB"."S"."F"(VARCHAR, NUMBER(38, 0))"#
        );
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let id = AccountObjectIdentifier::new(r#"a"b"#);
        assert_eq!(id.fully_qualified_name(), r#""a""b""#);
        assert_eq!(id.to_string().parse::<AccountObjectIdentifier>().unwrap(), id);
    }

    #[test]
    fn test_parse_quoted_and_unquoted() {
        let quoted: SchemaObjectIdentifier = r#""DB"."SCHEMA"."NAME""#.parse().unwrap();
        let unquoted: SchemaObjectIdentifier = "DB.SCHEMA.NAME".parse().unwrap();
        assert_eq!(quoted, unquoted);
        assert_eq!(quoted.database_name(), "DB");
        assert_eq!(quoted.schema_name(), "SCHEMA");
        assert_eq!(quoted.name(), "NAME");
    }

    #[test]
    fn test_parse_preserves_case() {
        let id: DatabaseObjectIdentifier = "db.\"MixedCase\"".parse().unwrap();
        assert_eq!(id.database_name(), "db");
        assert_eq!(id.name(), "MixedCase");
    }

    #[test]
    fn test_parse_quoted_segment_with_dot() {
        let id: DatabaseObjectIdentifier = r#""my.db"."role""#.parse().unwrap();
        assert_eq!(id.database_name(), "my.db");
        assert_eq!(id.fully_qualified_name(), r#""my.db"."role""#);
    }

    #[test]
    fn test_parse_errors_name_the_segment() {
        let err = "DB..NAME".parse::<SchemaObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("segment 2 is empty"), "{err}");

        let err = "DB.NAME".parse::<SchemaObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("expected 3 segment(s), found 2"), "{err}");

        let err = r#""DB"#.parse::<AccountObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("unterminated quote"), "{err}");

        let err = r#""DB"x.NAME"#.parse::<DatabaseObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("after quoted segment 1"), "{err}");

        let err = r#"DB.NA"ME"#.parse::<DatabaseObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("segment 2 contains a stray quote"), "{err}");

        assert!("".parse::<AccountObjectIdentifier>().is_err());
    }

    #[test]
    fn test_parse_with_arguments() {
        let id: SchemaObjectIdentifierWithArguments =
            r#""DB"."S"."F"(varchar, NUMBER(38,0))"#.parse().unwrap();
        assert_eq!(id.name(), "F");
        assert_eq!(id.arguments(), &["VARCHAR".to_string(), "NUMBER(38,0)".to_string()]);

        let no_args: SchemaObjectIdentifierWithArguments = "DB.S.F()".parse().unwrap();
        assert!(no_args.arguments().is_empty());
        assert_eq!(no_args.fully_qualified_name(), r#""DB"."S"."F"()"#);

        let quoted_paren: SchemaObjectIdentifierWithArguments =
            r#""DB"."S"."f(x)"(INT)"#.parse().unwrap();
        assert_eq!(quoted_paren.name(), "f(x)");
        assert_eq!(quoted_paren.arguments(), &["INT".to_string()]);
    }

    #[test]
    fn test_parse_with_arguments_errors() {
        assert!("DB.S.F".parse::<SchemaObjectIdentifierWithArguments>().is_err());
        assert!("DB.S.F(INT".parse::<SchemaObjectIdentifierWithArguments>().is_err());
        assert!("DB.S.F(INT,)".parse::<SchemaObjectIdentifierWithArguments>().is_err());
        assert!("DB.F(INT)".parse::<SchemaObjectIdentifierWithArguments>().is_err());
    }

    #[test]
    fn test_round_trip_law() {
        let account = AccountObjectIdentifier::new("wh \"1\"");
        assert_eq!(
            account.fully_qualified_name().parse::<AccountObjectIdentifier>().unwrap(),
            account
        );

        let database = DatabaseObjectIdentifier::new("DB", "role.with.dots");
        assert_eq!(
            database.fully_qualified_name().parse::<DatabaseObjectIdentifier>().unwrap(),
            database
        );

        let schema = SchemaObjectIdentifier::new("a", "b", "c");
        assert_eq!(
            schema.fully_qualified_name().parse::<SchemaObjectIdentifier>().unwrap(),
            schema
        );

        let callable = schema.clone().with_arguments(["VARCHAR", "NUMBER(10, 2)"]);
        assert_eq!(
            callable
                .fully_qualified_name()
                .parse::<SchemaObjectIdentifierWithArguments>()
                .unwrap(),
            callable
        );
    }

    #[test]
    fn test_validity() {
        assert!(AccountObjectIdentifier::new("WH").is_valid());
        assert!(!AccountObjectIdentifier::new("").is_valid());
        assert!(!DatabaseObjectIdentifier::new(" ", "R").is_valid());
        assert!(!SchemaObjectIdentifier::new("DB", "", "T").is_valid());
    }

    #[test]
    fn test_container_ids() {
        let id = SchemaObjectIdentifier::new("DB", "S", "T");
        assert_eq!(id.schema_id(), DatabaseObjectIdentifier::new("DB", "S"));
        assert_eq!(id.database_id(), AccountObjectIdentifier::new("DB"));
    }

    #[test]
    fn test_serde_uses_canonical_form() {
        let id = DatabaseObjectIdentifier::new("DB", "R");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!(r#""DB"."R""#));

        let back: DatabaseObjectIdentifier = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);

        let three_parts = serde_json::json!("a.b.c");
        assert!(serde_json::from_value::<DatabaseObjectIdentifier>(three_parts).is_err());
    }

    #[test]
    fn test_object_type_spelling() {
        assert_eq!(ObjectType::DatabaseRole.to_string(), "DATABASE ROLE");
        assert_eq!(ObjectType::DatabaseRole.plural(), "DATABASE ROLES");
    }
}
