//! User-defined functions: `DROP FUNCTION` and `SHOW USER FUNCTIONS`.
//!
//! Functions are overloaded by argument types, so their identity is a
//! [`SchemaObjectIdentifierWithArguments`]. `SHOW` prints the signature as
//! `NAME(TYPE, TYPE) RETURN TYPE`; the argument types are parsed back out so
//! [`Functions::show_by_id`] can match an overload exactly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{In, Like};
use crate::client::{not_found, Client};
use crate::error::{SdkError, SdkResult};
use crate::identifiers::{
    split_arguments, ObjectIdentifier, ObjectType, SchemaObjectIdentifierWithArguments,
};
use crate::row::{FromRow, Row};
use crate::sql::{StatementBuilder, ToSql};
use crate::validation::{Validate, Validator};

/// `DROP FUNCTION [IF EXISTS] <name>(<arg types>)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropFunctionOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Function and argument types.
    pub name: SchemaObjectIdentifierWithArguments,
}

impl DropFunctionOptions {
    /// Drop `name`; its argument types select the overload.
    pub fn new(name: SchemaObjectIdentifierWithArguments) -> Self {
        Self {
            if_exists: None,
            name,
        }
    }

    /// See [`if_exists`](Self::if_exists).
    pub fn with_if_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = Some(if_exists);
        self
    }
}

impl ToSql for DropFunctionOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP FUNCTION")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
    }
}

impl Validate for DropFunctionOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropFunctionOptions")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// `SHOW USER FUNCTIONS [LIKE '<pattern>'] [IN ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowFunctionOptions {
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
    /// `IN ACCOUNT | DATABASE <db> | SCHEMA <schema>`
    pub in_scope: Option<In>,
}

impl ShowFunctionOptions {
    /// `SHOW USER FUNCTIONS` without filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`like`](Self::like).
    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    /// See [`in_scope`](Self::in_scope).
    pub fn with_in(mut self, scope: In) -> Self {
        self.in_scope = Some(scope);
        self
    }
}

impl ToSql for ShowFunctionOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW USER FUNCTIONS")
            .nested(None, self.like.as_ref(), false)
            .nested(None, self.in_scope.as_ref(), false)
    }
}

impl Validate for ShowFunctionOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("ShowFunctionOptions")
            .nested("In", self.in_scope.as_ref())
            .finish()
    }
}

/// One row of `SHOW USER FUNCTIONS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Function name, without arguments.
    pub name: String,
    /// Parent schema.
    pub schema_name: String,
    /// Parent database.
    pub catalog_name: String,
    /// Provided by the platform.
    pub is_builtin: Option<bool>,
    /// Aggregate function.
    pub is_aggregate: Option<bool>,
    /// Part of the ANSI standard.
    pub is_ansi: Option<bool>,
    /// Fewest arguments accepted.
    pub min_num_arguments: Option<i64>,
    /// Most arguments accepted.
    pub max_num_arguments: Option<i64>,
    /// The raw signature, e.g. `ADD(NUMBER, NUMBER) RETURN NUMBER`.
    pub arguments_raw: String,
    /// Upper-cased argument types parsed from the signature.
    pub argument_types: Vec<String>,
    /// Return type as reported.
    pub return_type: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Returns a table.
    pub is_table_function: Option<bool>,
    /// Usable in a clustering key.
    pub valid_for_clustering: Option<bool>,
    /// Secure function; definition hidden from non-owners.
    pub is_secure: Option<bool>,
    /// Calls out to a remote service.
    pub is_external_function: Option<bool>,
    /// Implementation language.
    pub language: Option<String>,
    /// Results are cached per query.
    pub is_memoizable: Option<bool>,
}

impl Function {
    /// The identifier this row describes.
    pub fn id(&self) -> SchemaObjectIdentifierWithArguments {
        SchemaObjectIdentifierWithArguments::new(
            self.catalog_name.clone(),
            self.schema_name.clone(),
            self.name.clone(),
            &self.argument_types,
        )
    }
}

/// Split `NAME(A, B) RETURN T` into argument types and return type.
fn parse_signature(column: &str, raw: &str) -> SdkResult<(Vec<String>, Option<String>)> {
    let raw = raw.trim();
    let (call, return_type) = match raw.rfind(") RETURN ") {
        Some(end) => (&raw[..=end], Some(raw[end + ") RETURN ".len()..].trim().to_string())),
        None => (raw, None),
    };
    let (_, arguments) = split_arguments(call).map_err(|err| match err {
        SdkError::Parse { reason, .. } => SdkError::mapping(column, reason),
        other => other,
    })?;
    let arguments = arguments
        .iter()
        .map(|arg| arg.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase())
        .collect();
    Ok((arguments, return_type))
}

impl FromRow for Function {
    fn from_row(row: &Row) -> SdkResult<Self> {
        let arguments_raw = row.string("arguments")?;
        let (argument_types, return_type) = parse_signature("arguments", &arguments_raw)?;
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            schema_name: row.string("schema_name")?,
            catalog_name: row.string("catalog_name")?,
            is_builtin: row.optional_bool("is_builtin")?,
            is_aggregate: row.optional_bool("is_aggregate")?,
            is_ansi: row.optional_bool("is_ansi")?,
            min_num_arguments: row.optional_int("min_num_arguments")?,
            max_num_arguments: row.optional_int("max_num_arguments")?,
            arguments_raw,
            argument_types,
            return_type,
            description: row.optional_string("description"),
            is_table_function: row.optional_bool("is_table_function")?,
            valid_for_clustering: row.optional_bool("valid_for_clustering")?,
            is_secure: row.optional_bool("is_secure")?,
            is_external_function: row.optional_bool("is_external_function")?,
            language: row.optional_non_empty_string("language"),
            is_memoizable: row.optional_bool("is_memoizable")?,
        })
    }
}

/// Function operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Functions<'a> {
    client: &'a Client,
}

impl<'a> Functions<'a> {
    /// Borrow `client` for function operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropFunctionOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `SHOW` and map every row.
    pub async fn show(&self, opts: &ShowFunctionOptions) -> SdkResult<Vec<Function>> {
        self.client.query_opts(Some(opts)).await
    }

    /// Find the overload whose name and argument types both match.
    pub async fn show_by_id(
        &self,
        id: &SchemaObjectIdentifierWithArguments,
    ) -> SdkResult<Function> {
        let opts = ShowFunctionOptions::new()
            .with_like(Like::new(id.name()))
            .with_in(In::Schema(id.schema_id()));
        self.show(&opts)
            .await?
            .into_iter()
            .find(|f| f.name == id.name() && f.argument_types == id.arguments())
            .ok_or_else(|| not_found(ObjectType::Function, id))
    }
}
