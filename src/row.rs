//! Result row mapper.
//!
//! The SQL executor hands back rows as column name to [`SqlValue`] maps. Each
//! domain struct implements [`FromRow`] by reading the columns it needs through
//! the typed getters on [`Row`]. Columns are looked up by name, never by
//! position, and names match case-insensitively.
//!
//! Required getters fail with [`SdkError::Mapping`] when the column is missing
//! or `NULL`; optional getters return `None` instead.
//!
//! # Example
//!
//! ```
//! use snowflake_provider_sdk::row::{Row, SqlValue};
//!
//! let row = Row::from_iter([
//!     ("NAME", SqlValue::from("WH1")),
//!     ("COMMENT", SqlValue::Null),
//! ]);
//! assert_eq!(row.string("name").unwrap(), "WH1");
//! assert_eq!(row.optional_string("comment"), None);
//! assert!(row.string("owner").is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{SdkError, SdkResult};
use crate::identifiers::{AccountObjectIdentifier, DatabaseObjectIdentifier};

/// A single driver-native value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// A timestamp already decoded by the driver.
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Whether this is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s),
            other => SqlValue::Text(other.to_string()),
        }
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, SqlValue>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column.
    pub fn with(mut self, column: impl AsRef<str>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column, replacing any previous value.
    pub fn insert(&mut self, column: impl AsRef<str>, value: impl Into<SqlValue>) {
        self.columns
            .insert(column.as_ref().to_lowercase(), value.into());
    }

    /// Build a row from a JSON object, as some drivers return.
    pub fn from_json(value: serde_json::Value) -> SdkResult<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(SdkError::mapping(
                "<row>",
                format!("expected a JSON object, got {other}"),
            )),
        }
    }

    /// Raw access; `None` only when the column is absent.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(&column.to_lowercase())
    }

    /// Column names in the row, lowercased.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    fn present(&self, column: &str) -> Option<&SqlValue> {
        self.get(column).filter(|value| !value.is_null())
    }

    fn required(&self, column: &str) -> SdkResult<&SqlValue> {
        self.present(column)
            .ok_or_else(|| SdkError::mapping(column, "missing required column"))
    }

    /// A required column rendered as text.
    pub fn string(&self, column: &str) -> SdkResult<String> {
        self.required(column).map(ToString::to_string)
    }

    /// An optional column rendered as text; empty strings are kept.
    pub fn optional_string(&self, column: &str) -> Option<String> {
        self.present(column).map(ToString::to_string)
    }

    /// An optional column rendered as text, with empty strings treated as absent.
    pub fn optional_non_empty_string(&self, column: &str) -> Option<String> {
        self.optional_string(column).filter(|s| !s.is_empty())
    }

    /// A required boolean column.
    pub fn bool(&self, column: &str) -> SdkResult<bool> {
        to_bool(column, self.required(column)?)
    }

    /// An optional boolean column.
    pub fn optional_bool(&self, column: &str) -> SdkResult<Option<bool>> {
        self.present(column).map(|v| to_bool(column, v)).transpose()
    }

    /// A required integer column.
    pub fn int(&self, column: &str) -> SdkResult<i64> {
        to_int(column, self.required(column)?)
    }

    /// An optional integer column; empty text counts as absent.
    pub fn optional_int(&self, column: &str) -> SdkResult<Option<i64>> {
        self.present(column)
            .filter(|v| !is_blank(v))
            .map(|v| to_int(column, v))
            .transpose()
    }

    /// A required floating point column.
    pub fn float(&self, column: &str) -> SdkResult<f64> {
        to_float(column, self.required(column)?)
    }

    /// An optional floating point column; empty text counts as absent.
    pub fn optional_float(&self, column: &str) -> SdkResult<Option<f64>> {
        self.present(column)
            .filter(|v| !is_blank(v))
            .map(|v| to_float(column, v))
            .transpose()
    }

    /// A required timestamp column.
    pub fn timestamp(&self, column: &str) -> SdkResult<DateTime<Utc>> {
        to_timestamp(column, self.required(column)?)
    }

    /// An optional timestamp column; empty text counts as absent.
    pub fn optional_timestamp(&self, column: &str) -> SdkResult<Option<DateTime<Utc>>> {
        self.present(column)
            .filter(|v| !is_blank(v))
            .map(|v| to_timestamp(column, v))
            .transpose()
    }

    /// A required column parsed through [`FromStr`], for enum-like types.
    pub fn parse<T>(&self, column: &str) -> SdkResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        parse_value(column, self.required(column)?)
    }

    /// An optional column parsed through [`FromStr`]; empty text counts as absent.
    pub fn optional_parse<T>(&self, column: &str) -> SdkResult<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.present(column)
            .filter(|v| !is_blank(v))
            .map(|v| parse_value(column, v))
            .transpose()
    }

    /// An account-level identifier built from a name column.
    pub fn account_identifier(&self, name_column: &str) -> SdkResult<AccountObjectIdentifier> {
        Ok(AccountObjectIdentifier::new(self.string(name_column)?))
    }

    /// A database-level identifier built from a database column and a name column.
    pub fn database_identifier(
        &self,
        database_column: &str,
        name_column: &str,
    ) -> SdkResult<DatabaseObjectIdentifier> {
        Ok(DatabaseObjectIdentifier::new(
            self.string(database_column)?,
            self.string(name_column)?,
        ))
    }
}

impl<K: AsRef<str>, V: Into<SqlValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

fn is_blank(value: &SqlValue) -> bool {
    matches!(value, SqlValue::Text(s) if s.trim().is_empty())
}

fn to_bool(column: &str, value: &SqlValue) -> SdkResult<bool> {
    match value {
        SqlValue::Bool(b) => Ok(*b),
        SqlValue::Int(0) => Ok(false),
        SqlValue::Int(1) => Ok(true),
        SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "yes" | "on" => Ok(true),
            "false" | "n" | "no" | "off" => Ok(false),
            _ => Err(SdkError::mapping(column, format!("{s:?} is not a boolean"))),
        },
        other => Err(SdkError::mapping(
            column,
            format!("expected bool, got {}", other.type_name()),
        )),
    }
}

/// Exact conversion; `None` for fractional, non-finite or out-of-range values.
fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

fn to_int(column: &str, value: &SqlValue) -> SdkResult<i64> {
    match value {
        SqlValue::Int(i) => Ok(*i),
        SqlValue::Float(f) => float_to_int(*f).ok_or_else(|| {
            SdkError::mapping(column, format!("{f} is not representable as an integer"))
        }),
        SqlValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| SdkError::mapping(column, format!("{s:?} is not an integer"))),
        other => Err(SdkError::mapping(
            column,
            format!("expected int, got {}", other.type_name()),
        )),
    }
}

fn to_float(column: &str, value: &SqlValue) -> SdkResult<f64> {
    match value {
        SqlValue::Float(f) => Ok(*f),
        SqlValue::Int(i) => Ok(*i as f64),
        SqlValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| SdkError::mapping(column, format!("{s:?} is not a number"))),
        other => Err(SdkError::mapping(
            column,
            format!("expected float, got {}", other.type_name()),
        )),
    }
}

/// Timestamp layouts accepted besides RFC 3339, as `SHOW` output prints them.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%:z"];
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a timestamp in any of the layouts the platform emits.
///
/// Timestamps without an offset are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| {
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| DateTime::<FixedOffset>::parse_from_str(raw, format).ok())
        })
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn to_timestamp(column: &str, value: &SqlValue) -> SdkResult<DateTime<Utc>> {
    match value {
        SqlValue::Timestamp(ts) => Ok(*ts),
        SqlValue::Text(s) => parse_timestamp(s)
            .ok_or_else(|| SdkError::mapping(column, format!("{s:?} is not a timestamp"))),
        other => Err(SdkError::mapping(
            column,
            format!("expected timestamp, got {}", other.type_name()),
        )),
    }
}

fn parse_value<T>(column: &str, value: &SqlValue) -> SdkResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .to_string()
        .trim()
        .parse()
        .map_err(|err: T::Err| SdkError::mapping(column, err.to_string()))
}

/// A domain struct that can be read from one result row.
pub trait FromRow: Sized {
    /// Map the row, failing on missing required columns or unparseable values.
    fn from_row(row: &Row) -> SdkResult<Self>;
}

/// Map every row, stopping at the first malformed one.
pub fn map_rows<T: FromRow>(rows: &[Row]) -> SdkResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// Convert a domain struct into a state value.
///
/// Identifiers become their fully qualified names, timestamps RFC 3339
/// strings and enums their SQL spelling.
pub fn to_state<T: Serialize>(value: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_identifier_getters() {
        let row = Row::new().with("DATABASE_NAME", "DB").with("NAME", "my role");
        assert_eq!(
            row.database_identifier("database_name", "name").unwrap(),
            DatabaseObjectIdentifier::new("DB", "my role")
        );
        assert_eq!(
            row.account_identifier("database_name").unwrap(),
            AccountObjectIdentifier::new("DB")
        );
        assert!(matches!(
            row.database_identifier("catalog_name", "name"),
            Err(SdkError::Mapping { .. })
        ));
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let row = Row::new().with("CREATED_ON", "x");
        assert!(row.get("created_on").is_some());
        assert!(row.get("Created_On").is_some());
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["created_on"]);
    }

    #[test]
    fn test_required_vs_optional() {
        let row = Row::from_iter([("a", SqlValue::Null), ("b", SqlValue::from(""))]);
        assert!(matches!(row.string("a"), Err(SdkError::Mapping { .. })));
        assert!(matches!(row.string("missing"), Err(SdkError::Mapping { .. })));
        assert_eq!(row.optional_string("a"), None);
        assert_eq!(row.optional_string("b"), Some(String::new()));
        assert_eq!(row.optional_non_empty_string("b"), None);
    }

    #[test]
    fn test_bool_conversions() {
        let row = Row::from_iter([
            ("a", SqlValue::from("Y")),
            ("b", SqlValue::from("false")),
            ("c", SqlValue::from(true)),
            ("d", SqlValue::from(1i64)),
            ("e", SqlValue::from("maybe")),
        ]);
        assert!(row.bool("a").unwrap());
        assert!(!row.bool("b").unwrap());
        assert!(row.bool("c").unwrap());
        assert!(row.bool("d").unwrap());
        assert!(row.bool("e").is_err());
        assert_eq!(row.optional_bool("missing").unwrap(), None);
    }

    #[test]
    fn test_numeric_conversions() {
        let row = Row::from_iter([
            ("a", SqlValue::from("42")),
            ("b", SqlValue::from(3.0)),
            ("c", SqlValue::from("")),
            ("d", SqlValue::from("x")),
            ("e", SqlValue::from(1.5)),
        ]);
        assert_eq!(row.int("a").unwrap(), 42);
        assert_eq!(row.int("b").unwrap(), 3);
        assert_eq!(row.optional_int("c").unwrap(), None);
        assert!(row.int("d").is_err());
        assert!(row.int("e").is_err());
        assert_eq!(row.float("a").unwrap(), 42.0);
        assert_eq!(row.optional_float("e").unwrap(), Some(1.5));
    }

    #[test]
    fn test_int_rejects_floats_that_do_not_fit() {
        let row = Row::from_iter([
            ("huge", SqlValue::from(1e19)),
            ("negative_huge", SqlValue::from(-1e19)),
            ("nan", SqlValue::from(f64::NAN)),
            ("inf", SqlValue::from(f64::INFINITY)),
            ("min", SqlValue::from(-9_223_372_036_854_775_808.0)),
        ]);
        for column in ["huge", "negative_huge", "nan", "inf"] {
            let err = row.int(column).unwrap_err();
            assert!(matches!(err, SdkError::Mapping { .. }), "{column}: {err:?}");
        }
        assert_eq!(row.int("min").unwrap(), i64::MIN);
    }

    #[test]
    fn test_timestamp_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2023-12-31 16:00:00.000 -0800"),
            Some(expected)
        );
        assert_eq!(parse_timestamp("2024-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);

        let row = Row::from_iter([
            ("ts", SqlValue::from(expected)),
            ("bad", SqlValue::from("soon")),
        ]);
        assert_eq!(row.timestamp("ts").unwrap(), expected);
        let err = row.timestamp("bad").unwrap_err();
        assert!(err.to_string().contains("is not a timestamp"), "{err}");
        assert_eq!(row.optional_timestamp("missing").unwrap(), None);
    }

    #[test]
    fn test_parse_enum_like() {
        #[derive(Debug, PartialEq)]
        enum State {
            Started,
        }

        impl FromStr for State {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    "STARTED" => Ok(State::Started),
                    other => Err(format!("unknown state {other}")),
                }
            }
        }

        let row = Row::from_iter([("state", "STARTED"), ("other", "BROKEN"), ("blank", "")]);
        assert_eq!(row.parse::<State>("state").unwrap(), State::Started);
        let err = row.parse::<State>("other").unwrap_err();
        assert_eq!(err.to_string(), "cannot map column other: unknown state BROKEN");
        assert_eq!(row.optional_parse::<State>("blank").unwrap(), None);
    }

    #[test]
    fn test_from_json() {
        let row = Row::from_json(json!({"NAME": "WH1", "SIZE": 3, "AUTO": true, "C": null}))
            .unwrap();
        assert_eq!(row.get("name"), Some(&SqlValue::Text("WH1".to_string())));
        assert_eq!(row.get("size"), Some(&SqlValue::Int(3)));
        assert_eq!(row.get("auto"), Some(&SqlValue::Bool(true)));
        assert_eq!(row.get("c"), Some(&SqlValue::Null));

        assert!(Row::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_map_rows_stops_at_first_error() {
        struct Named(String);

        impl FromRow for Named {
            fn from_row(row: &Row) -> SdkResult<Self> {
                Ok(Named(row.string("name")?))
            }
        }

        let rows = vec![Row::new().with("name", "a"), Row::new().with("name", "b")];
        let mapped: Vec<Named> = map_rows(&rows).unwrap();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[1].0, "b");

        let rows = vec![Row::new().with("name", "a"), Row::new()];
        assert!(map_rows::<Named>(&rows).is_err());
    }
}
