//! Schemas: `CREATE/ALTER/DROP/SHOW SCHEMA`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use super::{
    set_flags, set_tags, unset_tags, validate_tags, with_tags, In, Like, LimitFrom, TagAssociation,
};
use crate::client::{find_exact, not_found, Client};
use crate::error::{SdkError, SdkResult};
use crate::identifiers::{
    DatabaseObjectIdentifier, ObjectIdentifier, ObjectType, SchemaObjectIdentifier,
};
use crate::row::{FromRow, Row};
use crate::sql::{ListOptions, ParameterOptions, StatementBuilder, ToSql};
use crate::validation::{flag, Validate, Validator};

/// `CREATE [OR REPLACE] [TRANSIENT] SCHEMA [IF NOT EXISTS] <name>`
/// `[WITH MANAGED ACCESS] [<params>] [WITH TAG (...)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSchemaOptions {
    /// `OR REPLACE`: replace an existing object of the same name.
    pub or_replace: Option<bool>,
    /// `TRANSIENT`: no fail-safe period.
    pub transient: Option<bool>,
    /// `IF NOT EXISTS`: succeed without changes when the object exists.
    pub if_not_exists: Option<bool>,
    /// Object to act on.
    pub name: DatabaseObjectIdentifier,
    /// `WITH MANAGED ACCESS`: only the schema owner can grant on its objects.
    pub with_managed_access: Option<bool>,
    /// `DATA_RETENTION_TIME_IN_DAYS`: Time Travel retention.
    pub data_retention_time_in_days: Option<u32>,
    /// `MAX_DATA_EXTENSION_TIME_IN_DAYS`: how far retention may stretch for streams.
    pub max_data_extension_time_in_days: Option<u32>,
    /// `DEFAULT_DDL_COLLATION` for new tables.
    pub default_ddl_collation: Option<String>,
    /// `COMMENT`
    pub comment: Option<String>,
    /// `WITH TAG (...)`
    pub tag: Option<Vec<TagAssociation>>,
}

impl CreateSchemaOptions {
    /// Create `name`, leaving every optional clause out.
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            or_replace: None,
            transient: None,
            if_not_exists: None,
            name,
            with_managed_access: None,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            default_ddl_collation: None,
            comment: None,
            tag: None,
        }
    }

    /// See [`or_replace`](Self::or_replace).
    pub fn with_or_replace(mut self, or_replace: bool) -> Self {
        self.or_replace = Some(or_replace);
        self
    }

    /// See [`transient`](Self::transient).
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = Some(transient);
        self
    }

    /// See [`if_not_exists`](Self::if_not_exists).
    pub fn with_if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = Some(if_not_exists);
        self
    }

    /// Set the `WITH MANAGED ACCESS` flag.
    pub fn with_managed_access(mut self, managed: bool) -> Self {
        self.with_managed_access = Some(managed);
        self
    }

    /// See [`data_retention_time_in_days`](Self::data_retention_time_in_days).
    pub fn with_data_retention_time_in_days(mut self, days: u32) -> Self {
        self.data_retention_time_in_days = Some(days);
        self
    }

    /// See [`max_data_extension_time_in_days`](Self::max_data_extension_time_in_days).
    pub fn with_max_data_extension_time_in_days(mut self, days: u32) -> Self {
        self.max_data_extension_time_in_days = Some(days);
        self
    }

    /// See [`default_ddl_collation`](Self::default_ddl_collation).
    pub fn with_default_ddl_collation(mut self, collation: impl Into<String>) -> Self {
        self.default_ddl_collation = Some(collation.into());
        self
    }

    /// See [`comment`](Self::comment).
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// See [`tag`](Self::tag).
    pub fn with_tag(mut self, tag: Vec<TagAssociation>) -> Self {
        self.tag = Some(tag);
        self
    }
}

impl ToSql for CreateSchemaOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("CREATE")
            .keyword(self.or_replace, "OR REPLACE")
            .keyword(self.transient, "TRANSIENT")
            .static_keyword("SCHEMA")
            .keyword(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.name)
            .keyword(self.with_managed_access, "WITH MANAGED ACCESS")
            .parameter(
                "DATA_RETENTION_TIME_IN_DAYS",
                self.data_retention_time_in_days,
                ParameterOptions::bare(),
            )
            .parameter(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days,
                ParameterOptions::bare(),
            )
            .parameter(
                "DEFAULT_DDL_COLLATION",
                self.default_ddl_collation.as_ref(),
                ParameterOptions::single_quotes(),
            )
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes());
        with_tags(builder, self.tag.as_ref())
    }
}

impl Validate for CreateSchemaOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("CreateSchemaOptions")
            .valid_identifier("name", &self.name)
            .conflicting_fields(&[
                ("OrReplace", flag(self.or_replace)),
                ("IfNotExists", flag(self.if_not_exists)),
            ]);
        validate_tags(validator, "tag", self.tag.as_ref()).finish()
    }
}

/// `ALTER SCHEMA [IF EXISTS] <name> <action>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterSchemaOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: DatabaseObjectIdentifier,
    /// `RENAME TO <name>`; must stay in the same database.
    pub new_name: Option<DatabaseObjectIdentifier>,
    /// `SWAP WITH <name>`
    pub swap_with: Option<DatabaseObjectIdentifier>,
    /// `SET <properties>`
    pub set: Option<SchemaSet>,
    /// `UNSET <properties>`
    pub unset: Option<SchemaUnset>,
    /// `SET TAG ...`
    pub set_tags: Option<Vec<TagAssociation>>,
    /// `UNSET TAG ...`
    pub unset_tags: Option<Vec<SchemaObjectIdentifier>>,
    /// `ENABLE MANAGED ACCESS`
    pub enable_managed_access: Option<bool>,
    /// `DISABLE MANAGED ACCESS`
    pub disable_managed_access: Option<bool>,
}

impl AlterSchemaOptions {
    /// Start an `ALTER` of `name`; add exactly one action.
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            if_exists: None,
            name,
            new_name: None,
            swap_with: None,
            set: None,
            unset: None,
            set_tags: None,
            unset_tags: None,
            enable_managed_access: None,
            disable_managed_access: None,
        }
    }

    /// See [`if_exists`](Self::if_exists).
    pub fn with_if_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = Some(if_exists);
        self
    }

    /// See [`new_name`](Self::new_name).
    pub fn with_new_name(mut self, name: DatabaseObjectIdentifier) -> Self {
        self.new_name = Some(name);
        self
    }

    /// See [`swap_with`](Self::swap_with).
    pub fn with_swap_with(mut self, name: DatabaseObjectIdentifier) -> Self {
        self.swap_with = Some(name);
        self
    }

    /// See [`set`](Self::set).
    pub fn with_set(mut self, set: SchemaSet) -> Self {
        self.set = Some(set);
        self
    }

    /// See [`unset`](Self::unset).
    pub fn with_unset(mut self, unset: SchemaUnset) -> Self {
        self.unset = Some(unset);
        self
    }

    /// See [`set_tags`](Self::set_tags).
    pub fn with_set_tags(mut self, tags: Vec<TagAssociation>) -> Self {
        self.set_tags = Some(tags);
        self
    }

    /// See [`unset_tags`](Self::unset_tags).
    pub fn with_unset_tags(mut self, tags: Vec<SchemaObjectIdentifier>) -> Self {
        self.unset_tags = Some(tags);
        self
    }

    /// `ENABLE MANAGED ACCESS` for `true`, `DISABLE MANAGED ACCESS` for `false`.
    pub fn with_managed_access(mut self, enabled: bool) -> Self {
        if enabled {
            self.enable_managed_access = Some(true);
        } else {
            self.disable_managed_access = Some(true);
        }
        self
    }
}

impl ToSql for AlterSchemaOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("ALTER SCHEMA")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .identifier_parameter("RENAME TO", self.new_name.as_ref())
            .identifier_parameter("SWAP WITH", self.swap_with.as_ref())
            .nested(Some("SET"), self.set.as_ref(), false)
            .nested(Some("UNSET"), self.unset.as_ref(), false);
        unset_tags(set_tags(builder, self.set_tags.as_ref()), self.unset_tags.as_ref())
            .keyword(self.enable_managed_access, "ENABLE MANAGED ACCESS")
            .keyword(self.disable_managed_access, "DISABLE MANAGED ACCESS")
    }
}

impl Validate for AlterSchemaOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("AlterSchemaOptions")
            .valid_identifier("name", &self.name)
            .valid_optional_identifier("new_name", self.new_name.as_ref())
            .valid_optional_identifier("swap_with", self.swap_with.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SwapWith", self.swap_with.is_some()),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
                ("SetTags", self.set_tags.is_some()),
                ("UnsetTags", self.unset_tags.is_some()),
                ("EnableManagedAccess", flag(self.enable_managed_access)),
                ("DisableManagedAccess", flag(self.disable_managed_access)),
            ])
            .nested("Set", self.set.as_ref())
            .nested("Unset", self.unset.as_ref());
        validate_tags(validator, "set_tags", self.set_tags.as_ref()).finish()
    }
}

/// `SET` properties for `ALTER SCHEMA`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    /// `DATA_RETENTION_TIME_IN_DAYS`: Time Travel retention.
    pub data_retention_time_in_days: Option<u32>,
    /// `MAX_DATA_EXTENSION_TIME_IN_DAYS`: how far retention may stretch for streams.
    pub max_data_extension_time_in_days: Option<u32>,
    /// `DEFAULT_DDL_COLLATION` for new tables.
    pub default_ddl_collation: Option<String>,
    /// `COMMENT`
    pub comment: Option<String>,
}

impl ToSql for SchemaSet {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .parameter(
                "DATA_RETENTION_TIME_IN_DAYS",
                self.data_retention_time_in_days,
                ParameterOptions::bare(),
            )
            .parameter(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days,
                ParameterOptions::bare(),
            )
            .parameter(
                "DEFAULT_DDL_COLLATION",
                self.default_ddl_collation.as_ref(),
                ParameterOptions::single_quotes(),
            )
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes())
    }
}

impl Validate for SchemaSet {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("SchemaSet")
            .at_least_one_of(&[
                ("DataRetentionTimeInDays", self.data_retention_time_in_days.is_some()),
                ("MaxDataExtensionTimeInDays", self.max_data_extension_time_in_days.is_some()),
                ("DefaultDdlCollation", self.default_ddl_collation.is_some()),
                ("Comment", self.comment.is_some()),
            ])
            .finish()
    }
}

/// `UNSET` properties for `ALTER SCHEMA`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaUnset {
    /// Reset `DATA_RETENTION_TIME_IN_DAYS`.
    pub data_retention_time_in_days: Option<bool>,
    /// Reset `MAX_DATA_EXTENSION_TIME_IN_DAYS`.
    pub max_data_extension_time_in_days: Option<bool>,
    /// Reset `DEFAULT_DDL_COLLATION`.
    pub default_ddl_collation: Option<bool>,
    /// Reset `COMMENT`.
    pub comment: Option<bool>,
}

impl SchemaUnset {
    fn properties(&self) -> [(&'static str, Option<bool>); 4] {
        [
            ("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days),
            ("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days),
            ("DEFAULT_DDL_COLLATION", self.default_ddl_collation),
            ("COMMENT", self.comment),
        ]
    }
}

impl ToSql for SchemaUnset {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().list(None, set_flags(&self.properties()), ListOptions::bare())
    }
}

impl Validate for SchemaUnset {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("SchemaUnset")
            .at_least_one_of(&[
                ("DataRetentionTimeInDays", flag(self.data_retention_time_in_days)),
                ("MaxDataExtensionTimeInDays", flag(self.max_data_extension_time_in_days)),
                ("DefaultDdlCollation", flag(self.default_ddl_collation)),
                ("Comment", flag(self.comment)),
            ])
            .finish()
    }
}

/// `DROP SCHEMA [IF EXISTS] <name> [CASCADE | RESTRICT]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropSchemaOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: DatabaseObjectIdentifier,
    /// `CASCADE`: drop dependent objects too.
    pub cascade: Option<bool>,
    /// `RESTRICT`: fail when dependent objects exist.
    pub restrict: Option<bool>,
}

impl DropSchemaOptions {
    /// Drop `name`.
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            if_exists: None,
            name,
            cascade: None,
            restrict: None,
        }
    }

    /// See [`if_exists`](Self::if_exists).
    pub fn with_if_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = Some(if_exists);
        self
    }

    /// See [`cascade`](Self::cascade).
    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade = Some(cascade);
        self
    }

    /// See [`restrict`](Self::restrict).
    pub fn with_restrict(mut self, restrict: bool) -> Self {
        self.restrict = Some(restrict);
        self
    }
}

impl ToSql for DropSchemaOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP SCHEMA")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .keyword(self.cascade, "CASCADE")
            .keyword(self.restrict, "RESTRICT")
    }
}

impl Validate for DropSchemaOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropSchemaOptions")
            .valid_identifier("name", &self.name)
            .conflicting_fields(&[
                ("Cascade", flag(self.cascade)),
                ("Restrict", flag(self.restrict)),
            ])
            .finish()
    }
}

/// `SHOW [TERSE] SCHEMAS [HISTORY] [LIKE '...'] [IN { ACCOUNT | DATABASE <db> }]`
/// `[STARTS WITH '...'] [LIMIT ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowSchemaOptions {
    /// `TERSE`: return only the basic columns.
    pub terse: Option<bool>,
    /// `HISTORY`: include dropped objects still within retention.
    pub history: Option<bool>,
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
    /// `IN ACCOUNT | DATABASE <db> | SCHEMA <schema>`
    pub in_scope: Option<In>,
    /// `STARTS WITH '<prefix>'`, case-sensitive.
    pub starts_with: Option<String>,
    /// `LIMIT <rows> [FROM '<name>']`
    pub limit: Option<LimitFrom>,
}

impl ShowSchemaOptions {
    /// `SHOW SCHEMAS` without filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`terse`](Self::terse).
    pub fn with_terse(mut self, terse: bool) -> Self {
        self.terse = Some(terse);
        self
    }

    /// See [`history`](Self::history).
    pub fn with_history(mut self, history: bool) -> Self {
        self.history = Some(history);
        self
    }

    /// See [`like`](Self::like).
    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    /// See [`in_scope`](Self::in_scope). `IN SCHEMA` is rejected.
    pub fn with_in(mut self, scope: In) -> Self {
        self.in_scope = Some(scope);
        self
    }

    /// See [`starts_with`](Self::starts_with).
    pub fn with_starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    /// See [`limit`](Self::limit).
    pub fn with_limit(mut self, limit: LimitFrom) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl ToSql for ShowSchemaOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW")
            .keyword(self.terse, "TERSE")
            .static_keyword("SCHEMAS")
            .keyword(self.history, "HISTORY")
            .nested(None, self.like.as_ref(), false)
            .nested(None, self.in_scope.as_ref(), false)
            .parameter(
                "STARTS WITH",
                self.starts_with.as_ref(),
                ParameterOptions::single_quotes().without_equals(),
            )
            .nested(None, self.limit.as_ref(), false)
    }
}

impl Validate for ShowSchemaOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("ShowSchemaOptions")
            .nested("In", self.in_scope.as_ref())
            .check(matches!(self.in_scope, Some(In::Schema(_))), || SdkError::Invalid {
                structure: "ShowSchemaOptions".to_string(),
                reason: "schemas can only be listed in an account or a database".to_string(),
            })
            .finish()
    }
}

/// One row of `SHOW SCHEMAS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Object name as stored.
    pub name: String,
    /// Parent database.
    pub database_name: String,
    /// Default for the current user.
    pub is_default: Option<bool>,
    /// In use by the current session.
    pub is_current: Option<bool>,
    /// Owning role.
    pub owner: Option<String>,
    /// Comment; empty text when none was set.
    pub comment: Option<String>,
    /// Comma separated flags such as `TRANSIENT` or `MANAGED ACCESS`.
    pub options: Option<String>,
    /// Time Travel retention in days.
    pub retention_time: Option<i64>,
    /// Drop time, for rows listed with `HISTORY`.
    pub dropped_on: Option<DateTime<Utc>>,
    /// `ROLE` or `DATABASE_ROLE`.
    pub owner_role_type: Option<String>,
}

impl Schema {
    /// The identifier this row describes.
    pub fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(self.database_name.clone(), self.name.clone())
    }

    fn has_option(&self, option: &str) -> bool {
        self.options
            .as_deref()
            .is_some_and(|options| options.to_uppercase().contains(option))
    }

    /// Whether the schema was created `TRANSIENT`.
    pub fn is_transient(&self) -> bool {
        self.has_option("TRANSIENT")
    }

    /// Whether the schema uses managed access.
    pub fn is_managed_access(&self) -> bool {
        self.has_option("MANAGED ACCESS")
    }
}

impl FromRow for Schema {
    fn from_row(row: &Row) -> SdkResult<Self> {
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            is_default: row.optional_bool("is_default")?,
            is_current: row.optional_bool("is_current")?,
            owner: row.optional_non_empty_string("owner"),
            comment: row.optional_string("comment"),
            options: row.optional_non_empty_string("options"),
            retention_time: row.optional_int("retention_time")?,
            dropped_on: row.optional_timestamp("dropped_on")?,
            owner_role_type: row.optional_non_empty_string("owner_role_type"),
        })
    }
}

/// Schema operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Schemas<'a> {
    client: &'a Client,
}

impl<'a> Schemas<'a> {
    /// Borrow `client` for schema operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `CREATE`.
    pub async fn create(&self, opts: &CreateSchemaOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `ALTER`.
    pub async fn alter(&self, opts: &AlterSchemaOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropSchemaOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `SHOW` and map every row.
    pub async fn show(&self, opts: &ShowSchemaOptions) -> SdkResult<Vec<Schema>> {
        self.client.query_opts(Some(opts)).await
    }

    /// Find one object by identifier.
    ///
    /// Fails with [`SdkError::NotFound`](crate::error::SdkError::NotFound) when absent.
    #[instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> SdkResult<Schema> {
        let opts = ShowSchemaOptions::new()
            .with_like(Like::new(id.name()))
            .with_in(In::Database(id.database_id()));
        let schemas = self.show(&opts).await?;
        find_exact(schemas, |s| s.name.as_str(), id.name())
            .ok_or_else(|| not_found(ObjectType::Schema, id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::identifiers::AccountObjectIdentifier;
    use crate::testing::RecordingExecutor;

    fn schema_id() -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new("DB", "RAW")
    }

    #[test]
    fn test_create() {
        let opts = CreateSchemaOptions::new(schema_id())
            .with_or_replace(true)
            .with_transient(true)
            .with_managed_access(true)
            .with_max_data_extension_time_in_days(14)
            .with_comment("landing zone");
        assert_eq!(
            crate::sql::build(Some(&opts)).unwrap(),
            concat!(
                r#"CREATE OR REPLACE TRANSIENT SCHEMA "DB"."RAW" WITH MANAGED ACCESS "#,
                r#"MAX_DATA_EXTENSION_TIME_IN_DAYS = 14 COMMENT = 'landing zone'"#,
            )
        );
    }

    #[test]
    fn test_alter() {
        let rename = AlterSchemaOptions::new(schema_id())
            .with_new_name(DatabaseObjectIdentifier::new("DB", "BRONZE"));
        assert_eq!(rename.to_sql(), r#"ALTER SCHEMA "DB"."RAW" RENAME TO "DB"."BRONZE""#);

        let swap = AlterSchemaOptions::new(schema_id())
            .with_if_exists(true)
            .with_swap_with(DatabaseObjectIdentifier::new("DB", "RAW_V2"));
        assert_eq!(swap.to_sql(), r#"ALTER SCHEMA IF EXISTS "DB"."RAW" SWAP WITH "DB"."RAW_V2""#);

        let managed = AlterSchemaOptions::new(schema_id()).with_managed_access(false);
        assert_eq!(
            crate::sql::build(Some(&managed)).unwrap(),
            r#"ALTER SCHEMA "DB"."RAW" DISABLE MANAGED ACCESS"#
        );

        let unset = AlterSchemaOptions::new(schema_id()).with_unset(SchemaUnset {
            comment: Some(true),
            ..SchemaUnset::default()
        });
        assert_eq!(
            crate::sql::build(Some(&unset)).unwrap(),
            r#"ALTER SCHEMA "DB"."RAW" UNSET COMMENT"#
        );

        let both = AlterSchemaOptions::new(schema_id())
            .with_managed_access(true)
            .with_managed_access(false);
        assert!(matches!(both.validate(), Err(SdkError::ExactlyOneOf { .. })));
    }

    #[test]
    fn test_drop() {
        let opts = DropSchemaOptions::new(schema_id())
            .with_if_exists(true)
            .with_restrict(true);
        assert_eq!(opts.to_sql(), r#"DROP SCHEMA IF EXISTS "DB"."RAW" RESTRICT"#);
    }

    #[test]
    fn test_show_scopes() {
        let opts = ShowSchemaOptions::new()
            .with_terse(true)
            .with_in(In::Database(AccountObjectIdentifier::new("DB")))
            .with_limit(LimitFrom::new(3));
        assert_eq!(opts.to_sql(), r#"SHOW TERSE SCHEMAS IN DATABASE "DB" LIMIT 3"#);

        let bad = ShowSchemaOptions::new().with_in(In::Schema(schema_id()));
        assert!(matches!(bad.validate(), Err(SdkError::Invalid { .. })));
    }

    #[tokio::test]
    async fn test_show_by_id() {
        let row = Row::new()
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("name", "RAW")
            .with("database_name", "DB")
            .with("options", "TRANSIENT, MANAGED ACCESS")
            .with("comment", "landing zone");
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows(r#"SHOW SCHEMAS LIKE 'RAW' IN DATABASE "DB""#, vec![row]),
        );
        let client = Client::new(executor);

        let schema = client.schemas().show_by_id(&schema_id()).await.unwrap();
        assert_eq!(schema.id(), schema_id());
        assert!(schema.is_transient());
        assert!(schema.is_managed_access());
    }
}
