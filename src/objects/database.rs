//! Databases: `CREATE/ALTER/DROP/SHOW DATABASE`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    set_flags, set_tags, unset_tags, validate_tags, with_tags, Like, LimitFrom, TagAssociation,
};
use crate::client::{find_exact, not_found, Client};
use crate::error::SdkResult;
use crate::identifiers::{
    AccountObjectIdentifier, ObjectIdentifier, ObjectType, SchemaObjectIdentifier,
};
use crate::row::{FromRow, Row};
use crate::sql::{ListOptions, ParameterOptions, StatementBuilder, ToSql};
use crate::validation::{flag, Validate, Validator};

/// `CREATE [OR REPLACE] [TRANSIENT] DATABASE [IF NOT EXISTS] <name> [<params>] [WITH TAG (...)]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDatabaseOptions {
    /// `OR REPLACE`: replace an existing object of the same name.
    pub or_replace: Option<bool>,
    /// `TRANSIENT`: no fail-safe period.
    pub transient: Option<bool>,
    /// `IF NOT EXISTS`: succeed without changes when the object exists.
    pub if_not_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
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

impl CreateDatabaseOptions {
    /// Create `name`, leaving every optional clause out.
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            ..Self::default()
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

impl ToSql for CreateDatabaseOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("CREATE")
            .keyword(self.or_replace, "OR REPLACE")
            .keyword(self.transient, "TRANSIENT")
            .static_keyword("DATABASE")
            .keyword(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.name)
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

impl Validate for CreateDatabaseOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("CreateDatabaseOptions")
            .valid_identifier("name", &self.name)
            .conflicting_fields(&[
                ("OrReplace", flag(self.or_replace)),
                ("IfNotExists", flag(self.if_not_exists)),
            ]);
        validate_tags(validator, "tag", self.tag.as_ref()).finish()
    }
}

/// `ALTER DATABASE [IF EXISTS] <name> <action>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterDatabaseOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
    /// `RENAME TO <name>`
    pub rename_to: Option<AccountObjectIdentifier>,
    /// `SWAP WITH <name>`
    pub swap_with: Option<AccountObjectIdentifier>,
    /// `SET <properties>`
    pub set: Option<DatabaseSet>,
    /// `UNSET <properties>`
    pub unset: Option<DatabaseUnset>,
    /// `SET TAG ...`
    pub set_tags: Option<Vec<TagAssociation>>,
    /// `UNSET TAG ...`
    pub unset_tags: Option<Vec<SchemaObjectIdentifier>>,
}

impl AlterDatabaseOptions {
    /// Start an `ALTER` of `name`; add exactly one action.
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// See [`if_exists`](Self::if_exists).
    pub fn with_if_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = Some(if_exists);
        self
    }

    /// See [`rename_to`](Self::rename_to).
    pub fn with_rename_to(mut self, name: AccountObjectIdentifier) -> Self {
        self.rename_to = Some(name);
        self
    }

    /// See [`swap_with`](Self::swap_with).
    pub fn with_swap_with(mut self, name: AccountObjectIdentifier) -> Self {
        self.swap_with = Some(name);
        self
    }

    /// See [`set`](Self::set).
    pub fn with_set(mut self, set: DatabaseSet) -> Self {
        self.set = Some(set);
        self
    }

    /// See [`unset`](Self::unset).
    pub fn with_unset(mut self, unset: DatabaseUnset) -> Self {
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
}

impl ToSql for AlterDatabaseOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("ALTER DATABASE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .identifier_parameter("RENAME TO", self.rename_to.as_ref())
            .identifier_parameter("SWAP WITH", self.swap_with.as_ref())
            .nested(Some("SET"), self.set.as_ref(), false)
            .nested(Some("UNSET"), self.unset.as_ref(), false);
        unset_tags(set_tags(builder, self.set_tags.as_ref()), self.unset_tags.as_ref())
    }
}

impl Validate for AlterDatabaseOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("AlterDatabaseOptions")
            .valid_identifier("name", &self.name)
            .valid_optional_identifier("rename_to", self.rename_to.as_ref())
            .valid_optional_identifier("swap_with", self.swap_with.as_ref())
            .exactly_one_of(&[
                ("RenameTo", self.rename_to.is_some()),
                ("SwapWith", self.swap_with.is_some()),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
                ("SetTags", self.set_tags.is_some()),
                ("UnsetTags", self.unset_tags.is_some()),
            ])
            .nested("Set", self.set.as_ref())
            .nested("Unset", self.unset.as_ref());
        validate_tags(validator, "set_tags", self.set_tags.as_ref()).finish()
    }
}

/// `SET` properties for `ALTER DATABASE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSet {
    /// `DATA_RETENTION_TIME_IN_DAYS`: Time Travel retention.
    pub data_retention_time_in_days: Option<u32>,
    /// `MAX_DATA_EXTENSION_TIME_IN_DAYS`: how far retention may stretch for streams.
    pub max_data_extension_time_in_days: Option<u32>,
    /// `DEFAULT_DDL_COLLATION` for new tables.
    pub default_ddl_collation: Option<String>,
    /// `COMMENT`
    pub comment: Option<String>,
}

impl ToSql for DatabaseSet {
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

impl Validate for DatabaseSet {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DatabaseSet")
            .at_least_one_of(&[
                ("DataRetentionTimeInDays", self.data_retention_time_in_days.is_some()),
                ("MaxDataExtensionTimeInDays", self.max_data_extension_time_in_days.is_some()),
                ("DefaultDdlCollation", self.default_ddl_collation.is_some()),
                ("Comment", self.comment.is_some()),
            ])
            .finish()
    }
}

/// `UNSET` properties for `ALTER DATABASE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseUnset {
    /// Reset `DATA_RETENTION_TIME_IN_DAYS`.
    pub data_retention_time_in_days: Option<bool>,
    /// Reset `MAX_DATA_EXTENSION_TIME_IN_DAYS`.
    pub max_data_extension_time_in_days: Option<bool>,
    /// Reset `DEFAULT_DDL_COLLATION`.
    pub default_ddl_collation: Option<bool>,
    /// Reset `COMMENT`.
    pub comment: Option<bool>,
}

impl DatabaseUnset {
    fn properties(&self) -> [(&'static str, Option<bool>); 4] {
        [
            ("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days),
            ("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days),
            ("DEFAULT_DDL_COLLATION", self.default_ddl_collation),
            ("COMMENT", self.comment),
        ]
    }
}

impl ToSql for DatabaseUnset {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().list(None, set_flags(&self.properties()), ListOptions::bare())
    }
}

impl Validate for DatabaseUnset {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DatabaseUnset")
            .at_least_one_of(&[
                ("DataRetentionTimeInDays", flag(self.data_retention_time_in_days)),
                ("MaxDataExtensionTimeInDays", flag(self.max_data_extension_time_in_days)),
                ("DefaultDdlCollation", flag(self.default_ddl_collation)),
                ("Comment", flag(self.comment)),
            ])
            .finish()
    }
}

/// `DROP DATABASE [IF EXISTS] <name> [CASCADE | RESTRICT]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropDatabaseOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
    /// `CASCADE`: drop dependent objects too.
    pub cascade: Option<bool>,
    /// `RESTRICT`: fail when dependent objects exist.
    pub restrict: Option<bool>,
}

impl DropDatabaseOptions {
    /// Drop `name`.
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            ..Self::default()
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

impl ToSql for DropDatabaseOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP DATABASE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .keyword(self.cascade, "CASCADE")
            .keyword(self.restrict, "RESTRICT")
    }
}

impl Validate for DropDatabaseOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropDatabaseOptions")
            .valid_identifier("name", &self.name)
            .conflicting_fields(&[
                ("Cascade", flag(self.cascade)),
                ("Restrict", flag(self.restrict)),
            ])
            .finish()
    }
}

/// `SHOW [TERSE] DATABASES [HISTORY] [LIKE '...'] [STARTS WITH '...'] [LIMIT <rows> [FROM '...']]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowDatabaseOptions {
    /// `TERSE`: return only the basic columns.
    pub terse: Option<bool>,
    /// `HISTORY`: include dropped objects still within retention.
    pub history: Option<bool>,
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
    /// `STARTS WITH '<prefix>'`, case-sensitive.
    pub starts_with: Option<String>,
    /// `LIMIT <rows> [FROM '<name>']`
    pub limit: Option<LimitFrom>,
}

impl ShowDatabaseOptions {
    /// `SHOW DATABASES` without filters.
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

impl ToSql for ShowDatabaseOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW")
            .keyword(self.terse, "TERSE")
            .static_keyword("DATABASES")
            .keyword(self.history, "HISTORY")
            .nested(None, self.like.as_ref(), false)
            .parameter(
                "STARTS WITH",
                self.starts_with.as_ref(),
                ParameterOptions::single_quotes().without_equals(),
            )
            .nested(None, self.limit.as_ref(), false)
    }
}

impl Validate for ShowDatabaseOptions {
    fn validate(&self) -> SdkResult<()> {
        Ok(())
    }
}

/// One row of `SHOW DATABASES`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Database {
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Object name as stored.
    pub name: String,
    /// Object kind, e.g. `STANDARD` or `TRANSIENT`.
    pub kind: Option<String>,
    /// Default for the current user.
    pub is_default: Option<bool>,
    /// In use by the current session.
    pub is_current: Option<bool>,
    /// Share the database was created from, if any.
    pub origin: Option<String>,
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

impl Database {
    /// The identifier this row describes.
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.name.clone())
    }

    /// Whether the database was created `TRANSIENT`.
    pub fn is_transient(&self) -> bool {
        self.options
            .as_deref()
            .is_some_and(|options| options.to_uppercase().contains("TRANSIENT"))
    }
}

impl FromRow for Database {
    fn from_row(row: &Row) -> SdkResult<Self> {
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            kind: row.optional_non_empty_string("kind"),
            is_default: row.optional_bool("is_default")?,
            is_current: row.optional_bool("is_current")?,
            origin: row.optional_non_empty_string("origin"),
            owner: row.optional_non_empty_string("owner"),
            comment: row.optional_string("comment"),
            options: row.optional_non_empty_string("options"),
            retention_time: row.optional_int("retention_time")?,
            dropped_on: row.optional_timestamp("dropped_on")?,
            owner_role_type: row.optional_non_empty_string("owner_role_type"),
        })
    }
}

/// Database operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Databases<'a> {
    client: &'a Client,
}

impl<'a> Databases<'a> {
    /// Borrow `client` for database operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `CREATE`.
    pub async fn create(&self, opts: &CreateDatabaseOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `ALTER`.
    pub async fn alter(&self, opts: &AlterDatabaseOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropDatabaseOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `SHOW` and map every row.
    pub async fn show(&self, opts: &ShowDatabaseOptions) -> SdkResult<Vec<Database>> {
        self.client.query_opts(Some(opts)).await
    }

    /// Find one object by identifier.
    ///
    /// Fails with [`SdkError::NotFound`](crate::error::SdkError::NotFound) when absent.
    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SdkResult<Database> {
        let databases = self
            .show(&ShowDatabaseOptions::new().with_like(Like::new(id.name())))
            .await?;
        find_exact(databases, |d| d.name.as_str(), id.name())
            .ok_or_else(|| not_found(ObjectType::Database, id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::SdkError;
    use crate::testing::RecordingExecutor;

    fn db() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("ANALYTICS")
    }

    #[test]
    fn test_create() {
        let opts = CreateDatabaseOptions::new(db())
            .with_transient(true)
            .with_if_not_exists(true)
            .with_data_retention_time_in_days(1)
            .with_default_ddl_collation("en-ci")
            .with_comment("warehouse of facts");
        assert_eq!(
            crate::sql::build(Some(&opts)).unwrap(),
            concat!(
                r#"CREATE TRANSIENT DATABASE IF NOT EXISTS "ANALYTICS" "#,
                r#"DATA_RETENTION_TIME_IN_DAYS = 1 DEFAULT_DDL_COLLATION = 'en-ci' "#,
                r#"COMMENT = 'warehouse of facts'"#,
            )
        );
    }

    #[test]
    fn test_alter() {
        let swap =
            AlterDatabaseOptions::new(db()).with_swap_with(AccountObjectIdentifier::new("STAGING"));
        assert_eq!(swap.to_sql(), r#"ALTER DATABASE "ANALYTICS" SWAP WITH "STAGING""#);

        let set = AlterDatabaseOptions::new(db()).with_set(DatabaseSet {
            data_retention_time_in_days: Some(7),
            comment: Some("c".to_string()),
            ..DatabaseSet::default()
        });
        assert_eq!(
            crate::sql::build(Some(&set)).unwrap(),
            r#"ALTER DATABASE "ANALYTICS" SET DATA_RETENTION_TIME_IN_DAYS = 7 COMMENT = 'c'"#
        );

        let unset = AlterDatabaseOptions::new(db())
            .with_if_exists(true)
            .with_unset(DatabaseUnset {
                comment: Some(true),
                default_ddl_collation: Some(true),
                ..DatabaseUnset::default()
            });
        assert_eq!(
            crate::sql::build(Some(&unset)).unwrap(),
            r#"ALTER DATABASE IF EXISTS "ANALYTICS" UNSET DEFAULT_DDL_COLLATION, COMMENT"#
        );

        let empty_set = AlterDatabaseOptions::new(db()).with_set(DatabaseSet::default());
        assert!(matches!(empty_set.validate(), Err(SdkError::Nested { .. })));
    }

    #[test]
    fn test_drop_cascade_and_restrict_conflict() {
        let opts = DropDatabaseOptions::new(db()).with_cascade(true);
        assert_eq!(opts.to_sql(), r#"DROP DATABASE "ANALYTICS" CASCADE"#);

        let both = opts.with_restrict(true);
        assert!(matches!(both.validate(), Err(SdkError::ConflictingFields { .. })));
    }

    #[test]
    fn test_show() {
        let opts = ShowDatabaseOptions::new()
            .with_terse(true)
            .with_history(true)
            .with_starts_with("ANA")
            .with_limit(LimitFrom::new(5).with_from("A"));
        assert_eq!(
            opts.to_sql(),
            "SHOW TERSE DATABASES HISTORY STARTS WITH 'ANA' LIMIT 5 FROM 'A'"
        );
    }

    #[tokio::test]
    async fn test_show_by_id() {
        let row = Row::new()
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("name", "ANALYTICS")
            .with("options", "TRANSIENT")
            .with("retention_time", "1")
            .with("dropped_on", crate::row::SqlValue::Null);
        let executor = Arc::new(
            RecordingExecutor::new().with_rows("SHOW DATABASES LIKE 'ANALYTICS'", vec![row]),
        );
        let client = Client::new(executor);

        let database = client.databases().show_by_id(&db()).await.unwrap();
        assert!(database.is_transient());
        assert_eq!(database.retention_time, Some(1));
        assert_eq!(database.dropped_on, None);
    }
}
