//! Database roles: `CREATE/ALTER/DROP/SHOW DATABASE ROLE`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use super::{LimitFrom, Like};
use crate::client::{find_exact, not_found, Client};
use crate::error::{SdkError, SdkResult};
use crate::identifiers::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier, ObjectType,
};
use crate::row::{FromRow, Row};
use crate::sql::{ParameterOptions, StatementBuilder, ToSql};
use crate::validation::{flag, Validate, Validator};

/// `CREATE [OR REPLACE] DATABASE ROLE [IF NOT EXISTS] <name> [COMMENT = '<comment>']`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDatabaseRoleOptions {
    /// `OR REPLACE`: replace an existing object of the same name.
    pub or_replace: Option<bool>,
    /// `IF NOT EXISTS`: succeed without changes when the object exists.
    pub if_not_exists: Option<bool>,
    /// Object to act on.
    pub name: DatabaseObjectIdentifier,
    /// `COMMENT`
    pub comment: Option<String>,
}

impl CreateDatabaseRoleOptions {
    /// Create `name`, leaving every optional clause out.
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            or_replace: None,
            if_not_exists: None,
            name,
            comment: None,
        }
    }

    /// See [`or_replace`](Self::or_replace).
    pub fn with_or_replace(mut self, or_replace: bool) -> Self {
        self.or_replace = Some(or_replace);
        self
    }

    /// See [`if_not_exists`](Self::if_not_exists).
    pub fn with_if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = Some(if_not_exists);
        self
    }

    /// See [`comment`](Self::comment).
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl ToSql for CreateDatabaseRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("CREATE")
            .keyword(self.or_replace, "OR REPLACE")
            .static_keyword("DATABASE ROLE")
            .keyword(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.name)
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes())
    }
}

impl Validate for CreateDatabaseRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("CreateDatabaseRoleOptions")
            .valid_identifier("name", &self.name)
            .conflicting_fields(&[
                ("OrReplace", flag(self.or_replace)),
                ("IfNotExists", flag(self.if_not_exists)),
            ])
            .finish()
    }
}

/// `ALTER DATABASE ROLE [IF EXISTS] <name> { RENAME TO | SET | UNSET } ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterDatabaseRoleOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: DatabaseObjectIdentifier,
    /// `RENAME TO <name>`
    pub rename: Option<DatabaseRoleRename>,
    /// `SET <properties>`
    pub set: Option<DatabaseRoleSet>,
    /// `UNSET <properties>`
    pub unset: Option<DatabaseRoleUnset>,
}

impl AlterDatabaseRoleOptions {
    /// Start an `ALTER` of `name`; add exactly one action.
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            if_exists: None,
            name,
            rename: None,
            set: None,
            unset: None,
        }
    }

    /// See [`if_exists`](Self::if_exists).
    pub fn with_if_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = Some(if_exists);
        self
    }

    /// See [`rename`](Self::rename).
    pub fn with_rename(mut self, rename: DatabaseRoleRename) -> Self {
        self.rename = Some(rename);
        self
    }

    /// See [`set`](Self::set).
    pub fn with_set(mut self, set: DatabaseRoleSet) -> Self {
        self.set = Some(set);
        self
    }

    /// See [`unset`](Self::unset).
    pub fn with_unset(mut self, unset: DatabaseRoleUnset) -> Self {
        self.unset = Some(unset);
        self
    }
}

impl ToSql for AlterDatabaseRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("ALTER DATABASE ROLE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .nested(None, self.rename.as_ref(), false)
            .nested(Some("SET"), self.set.as_ref(), false)
            .nested(Some("UNSET"), self.unset.as_ref(), false)
    }
}

impl Validate for AlterDatabaseRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        let crosses_databases = self
            .rename
            .as_ref()
            .is_some_and(|r| r.name.database_name() != self.name.database_name());
        Validator::new("AlterDatabaseRoleOptions")
            .valid_identifier("name", &self.name)
            .exactly_one_of(&[
                ("Rename", self.rename.is_some()),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
            ])
            .nested("Rename", self.rename.as_ref())
            .nested("Set", self.set.as_ref())
            .nested("Unset", self.unset.as_ref())
            .check(crosses_databases, || SdkError::Invalid {
                structure: "AlterDatabaseRoleOptions".to_string(),
                reason: "database role cannot be renamed into another database".to_string(),
            })
            .finish()
    }
}

/// `RENAME TO <new_name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRoleRename {
    /// The new name; must stay in the same database.
    pub name: DatabaseObjectIdentifier,
}

impl ToSql for DatabaseRoleRename {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().identifier_parameter("RENAME TO", Some(&self.name))
    }
}

impl Validate for DatabaseRoleRename {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DatabaseRoleRename")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// `SET COMMENT = '<comment>'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRoleSet {
    /// New comment.
    pub comment: String,
}

impl ToSql for DatabaseRoleSet {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().parameter(
            "COMMENT",
            Some(&self.comment),
            ParameterOptions::single_quotes(),
        )
    }
}

impl Validate for DatabaseRoleSet {
    fn validate(&self) -> SdkResult<()> {
        Ok(())
    }
}

/// `UNSET COMMENT`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseRoleUnset {
    /// Reset `COMMENT`.
    pub comment: Option<bool>,
}

impl ToSql for DatabaseRoleUnset {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().keyword(self.comment, "COMMENT")
    }
}

impl Validate for DatabaseRoleUnset {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DatabaseRoleUnset")
            .at_least_one_of(&[("Comment", flag(self.comment))])
            .finish()
    }
}

/// `DROP DATABASE ROLE [IF EXISTS] <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropDatabaseRoleOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: DatabaseObjectIdentifier,
}

impl DropDatabaseRoleOptions {
    /// Drop `name`.
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
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

impl ToSql for DropDatabaseRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP DATABASE ROLE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
    }
}

impl Validate for DropDatabaseRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropDatabaseRoleOptions")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// `SHOW DATABASE ROLES [LIKE '<pattern>'] IN DATABASE <database> [LIMIT <rows> [FROM '<name>']]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowDatabaseRoleOptions {
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
    /// Database whose roles are listed.
    pub database: AccountObjectIdentifier,
    /// `LIMIT <rows> [FROM '<name>']`
    pub limit: Option<LimitFrom>,
}

impl ShowDatabaseRoleOptions {
    /// List the database roles of `database`.
    pub fn new(database: AccountObjectIdentifier) -> Self {
        Self {
            like: None,
            database,
            limit: None,
        }
    }

    /// See [`like`](Self::like).
    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    /// See [`limit`](Self::limit).
    pub fn with_limit(mut self, limit: LimitFrom) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl ToSql for ShowDatabaseRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW DATABASE ROLES")
            .nested(None, self.like.as_ref(), false)
            .static_keyword("IN DATABASE")
            .identifier(&self.database)
            .nested(None, self.limit.as_ref(), false)
    }
}

impl Validate for ShowDatabaseRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("ShowDatabaseRoleOptions")
            .valid_identifier("database", &self.database)
            .finish()
    }
}

/// One row of `SHOW DATABASE ROLES`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseRole {
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Object name as stored.
    pub name: String,
    /// Not a result column; filled in from the `IN DATABASE` scope.
    pub database_name: String,
    /// Default for the current user.
    pub is_default: Option<bool>,
    /// In use by the current session.
    pub is_current: Option<bool>,
    /// Granted through another role of the current user.
    pub is_inherited: Option<bool>,
    /// Number of roles this role is granted to.
    pub granted_to_roles: Option<i64>,
    /// Number of database roles this role is granted to.
    pub granted_to_database_roles: Option<i64>,
    /// Number of database roles granted to this role.
    pub granted_database_roles: Option<i64>,
    /// Owning role.
    pub owner: Option<String>,
    /// Comment; empty text when none was set.
    pub comment: Option<String>,
    /// `ROLE` or `DATABASE_ROLE`.
    pub owner_role_type: Option<String>,
}

impl DatabaseRole {
    /// The identifier this row describes.
    pub fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(self.database_name.clone(), self.name.clone())
    }
}

impl FromRow for DatabaseRole {
    fn from_row(row: &Row) -> SdkResult<Self> {
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            database_name: row.optional_string("database_name").unwrap_or_default(),
            is_default: row.optional_bool("is_default")?,
            is_current: row.optional_bool("is_current")?,
            is_inherited: row.optional_bool("is_inherited")?,
            granted_to_roles: row.optional_int("granted_to_roles")?,
            granted_to_database_roles: row.optional_int("granted_to_database_roles")?,
            granted_database_roles: row.optional_int("granted_database_roles")?,
            owner: row.optional_non_empty_string("owner"),
            comment: row.optional_string("comment"),
            owner_role_type: row.optional_non_empty_string("owner_role_type"),
        })
    }
}

/// Database role operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct DatabaseRoles<'a> {
    client: &'a Client,
}

impl<'a> DatabaseRoles<'a> {
    /// Borrow `client` for database role operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `CREATE`.
    pub async fn create(&self, opts: &CreateDatabaseRoleOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `ALTER`.
    pub async fn alter(&self, opts: &AlterDatabaseRoleOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropDatabaseRoleOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// List database roles. Every result carries the database it was listed in.
    pub async fn show(&self, opts: &ShowDatabaseRoleOptions) -> SdkResult<Vec<DatabaseRole>> {
        let mut roles: Vec<DatabaseRole> = self.client.query_opts(Some(opts)).await?;
        for role in &mut roles {
            role.database_name = opts.database.name().to_string();
        }
        Ok(roles)
    }

    /// Look up one database role by its exact name.
    #[instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> SdkResult<DatabaseRole> {
        let opts = ShowDatabaseRoleOptions::new(id.database_id()).with_like(Like::new(id.name()));
        let roles = self.show(&opts).await?;
        find_exact(roles, |r| r.name.as_str(), id.name())
            .ok_or_else(|| not_found(ObjectType::DatabaseRole, id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::RecordingExecutor;

    fn role_id() -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new("DB", "ROLE1")
    }

    fn show_row(name: &str) -> Row {
        Row::new()
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("name", name)
            .with("is_default", "N")
            .with("is_current", "N")
            .with("is_inherited", "N")
            .with("granted_to_roles", 0)
            .with("granted_to_database_roles", 0)
            .with("granted_database_roles", 0)
            .with("owner", "ACCOUNTADMIN")
            .with("comment", "")
            .with("owner_role_type", "ROLE")
    }

    #[test]
    fn test_create_renders_clauses_in_order() {
        let opts = CreateDatabaseRoleOptions::new(role_id())
            .with_or_replace(true)
            .with_comment("hi");
        assert_eq!(
            crate::sql::build(Some(&opts)).unwrap(),
            r#"CREATE OR REPLACE DATABASE ROLE "DB"."ROLE1" COMMENT = 'hi'"#
        );

        let opts = CreateDatabaseRoleOptions::new(role_id()).with_if_not_exists(true);
        assert_eq!(opts.to_sql(), r#"CREATE DATABASE ROLE IF NOT EXISTS "DB"."ROLE1""#);
    }

    #[test]
    fn test_create_rejects_or_replace_with_if_not_exists() {
        let opts = CreateDatabaseRoleOptions::new(role_id())
            .with_or_replace(true)
            .with_if_not_exists(true);
        match opts.validate().unwrap_err() {
            SdkError::ConflictingFields { structure, fields } => {
                assert_eq!(structure, "CreateDatabaseRoleOptions");
                assert_eq!(fields, vec!["OrReplace".to_string(), "IfNotExists".to_string()]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_rejects_incomplete_identifier() {
        let opts = CreateDatabaseRoleOptions::new(DatabaseObjectIdentifier::new("", "ROLE1"));
        assert!(matches!(
            opts.validate(),
            Err(SdkError::InvalidObjectIdentifier { .. })
        ));
    }

    #[test]
    fn test_alter_actions() {
        let rename = AlterDatabaseRoleOptions::new(role_id())
            .with_if_exists(true)
            .with_rename(DatabaseRoleRename {
                name: DatabaseObjectIdentifier::new("DB", "ROLE2"),
            });
        assert_eq!(
            crate::sql::build(Some(&rename)).unwrap(),
            r#"ALTER DATABASE ROLE IF EXISTS "DB"."ROLE1" RENAME TO "DB"."ROLE2""#
        );

        let set = AlterDatabaseRoleOptions::new(role_id()).with_set(DatabaseRoleSet {
            comment: "new".to_string(),
        });
        assert_eq!(
            crate::sql::build(Some(&set)).unwrap(),
            r#"ALTER DATABASE ROLE "DB"."ROLE1" SET COMMENT = 'new'"#
        );

        let unset = AlterDatabaseRoleOptions::new(role_id()).with_unset(DatabaseRoleUnset {
            comment: Some(true),
        });
        assert_eq!(
            crate::sql::build(Some(&unset)).unwrap(),
            r#"ALTER DATABASE ROLE "DB"."ROLE1" UNSET COMMENT"#
        );
    }

    #[test]
    fn test_alter_requires_exactly_one_action() {
        let none = AlterDatabaseRoleOptions::new(role_id());
        assert!(matches!(none.validate(), Err(SdkError::ExactlyOneOf { .. })));

        let both = AlterDatabaseRoleOptions::new(role_id())
            .with_set(DatabaseRoleSet {
                comment: "x".to_string(),
            })
            .with_unset(DatabaseRoleUnset {
                comment: Some(true),
            });
        assert!(matches!(both.validate(), Err(SdkError::ExactlyOneOf { .. })));
    }

    #[test]
    fn test_alter_nested_errors() {
        let empty_unset =
            AlterDatabaseRoleOptions::new(role_id()).with_unset(DatabaseRoleUnset::default());
        let err = empty_unset.validate().unwrap_err();
        assert!(matches!(err, SdkError::Nested { ref field, .. } if field == "Unset"));

        let cross = AlterDatabaseRoleOptions::new(role_id()).with_rename(DatabaseRoleRename {
            name: DatabaseObjectIdentifier::new("OTHER", "ROLE2"),
        });
        assert!(matches!(cross.validate(), Err(SdkError::Invalid { .. })));
    }

    #[test]
    fn test_drop_and_show() {
        let drop = DropDatabaseRoleOptions::new(role_id()).with_if_exists(true);
        assert_eq!(drop.to_sql(), r#"DROP DATABASE ROLE IF EXISTS "DB"."ROLE1""#);

        let show = ShowDatabaseRoleOptions::new(AccountObjectIdentifier::new("DB"))
            .with_like(Like::new("ROLE%"))
            .with_limit(LimitFrom::new(10));
        assert_eq!(
            show.to_sql(),
            r#"SHOW DATABASE ROLES LIKE 'ROLE%' IN DATABASE "DB" LIMIT 10"#
        );
    }

    #[test]
    fn test_from_row() {
        let role = DatabaseRole::from_row(&show_row("ROLE1")).unwrap();
        assert_eq!(role.name, "ROLE1");
        assert_eq!(role.is_default, Some(false));
        assert_eq!(role.granted_to_roles, Some(0));
        assert_eq!(role.owner.as_deref(), Some("ACCOUNTADMIN"));
        assert_eq!(role.comment.as_deref(), Some(""));
        assert_eq!(role.created_on.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_show_by_id_picks_exact_match() {
        let executor = Arc::new(RecordingExecutor::new().with_rows(
            r#"SHOW DATABASE ROLES LIKE 'ROLE1' IN DATABASE "DB""#,
            vec![show_row("ROLE1X"), show_row("ROLE1")],
        ));
        let client = Client::new(executor.clone());

        let role = client.database_roles().show_by_id(&role_id()).await.unwrap();
        assert_eq!(role.name, "ROLE1");
        assert_eq!(role.database_name, "DB");
        assert_eq!(role.id(), role_id());
    }

    #[tokio::test]
    async fn test_show_by_id_not_found() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor);
        let err = client
            .database_roles()
            .show_by_id(&role_id())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::ObjectNotFound {
                object_type: ObjectType::DatabaseRole,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_executor() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor.clone());
        let opts = CreateDatabaseRoleOptions::new(role_id())
            .with_or_replace(true)
            .with_if_not_exists(true);
        assert!(client.database_roles().create(&opts).await.is_err());
        assert!(executor.statements().is_empty());
    }
}
