//! Account roles: `CREATE/ALTER/DROP/SHOW ROLE`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{set_tags, unset_tags, validate_tags, with_tags, Like, TagAssociation};
use crate::client::{find_exact, not_found, Client};
use crate::error::SdkResult;
use crate::identifiers::{
    AccountObjectIdentifier, ObjectIdentifier, ObjectType, SchemaObjectIdentifier,
};
use crate::row::{FromRow, Row};
use crate::sql::{ParameterOptions, StatementBuilder, ToSql};
use crate::validation::{flag, Validate, Validator};

/// `CREATE [OR REPLACE] ROLE [IF NOT EXISTS] <name> [COMMENT = '...'] [WITH TAG (...)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleOptions {
    /// `OR REPLACE`: replace an existing object of the same name.
    pub or_replace: Option<bool>,
    /// `IF NOT EXISTS`: succeed without changes when the object exists.
    pub if_not_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
    /// `COMMENT`
    pub comment: Option<String>,
    /// `WITH TAG (...)`
    pub tag: Option<Vec<TagAssociation>>,
}

impl CreateRoleOptions {
    /// Create `name`, leaving every optional clause out.
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            or_replace: None,
            if_not_exists: None,
            name,
            comment: None,
            tag: None,
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

    /// See [`tag`](Self::tag).
    pub fn with_tag(mut self, tag: Vec<TagAssociation>) -> Self {
        self.tag = Some(tag);
        self
    }
}

impl ToSql for CreateRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("CREATE")
            .keyword(self.or_replace, "OR REPLACE")
            .static_keyword("ROLE")
            .keyword(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.name)
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes());
        with_tags(builder, self.tag.as_ref())
    }
}

impl Validate for CreateRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("CreateRoleOptions")
            .valid_identifier("name", &self.name)
            .conflicting_fields(&[
                ("OrReplace", flag(self.or_replace)),
                ("IfNotExists", flag(self.if_not_exists)),
            ]);
        validate_tags(validator, "tag", self.tag.as_ref()).finish()
    }
}

/// `ALTER ROLE [IF EXISTS] <name>`
/// `{ RENAME TO | SET COMMENT | SET TAG | UNSET COMMENT | UNSET TAG } ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterRoleOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
    /// `RENAME TO <name>`
    pub rename_to: Option<AccountObjectIdentifier>,
    /// `SET COMMENT = '...'`
    pub set_comment: Option<String>,
    /// `SET TAG ...`
    pub set_tags: Option<Vec<TagAssociation>>,
    /// `UNSET COMMENT`
    pub unset_comment: Option<bool>,
    /// `UNSET TAG ...`
    pub unset_tags: Option<Vec<SchemaObjectIdentifier>>,
}

impl AlterRoleOptions {
    /// Start an `ALTER` of `name`; add exactly one action.
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            if_exists: None,
            name,
            rename_to: None,
            set_comment: None,
            set_tags: None,
            unset_comment: None,
            unset_tags: None,
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

    /// See [`set_comment`](Self::set_comment).
    pub fn with_set_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment = Some(comment.into());
        self
    }

    /// See [`set_tags`](Self::set_tags).
    pub fn with_set_tags(mut self, tags: Vec<TagAssociation>) -> Self {
        self.set_tags = Some(tags);
        self
    }

    /// See [`unset_comment`](Self::unset_comment).
    pub fn with_unset_comment(mut self, unset: bool) -> Self {
        self.unset_comment = Some(unset);
        self
    }

    /// See [`unset_tags`](Self::unset_tags).
    pub fn with_unset_tags(mut self, tags: Vec<SchemaObjectIdentifier>) -> Self {
        self.unset_tags = Some(tags);
        self
    }
}

impl ToSql for AlterRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("ALTER ROLE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .identifier_parameter("RENAME TO", self.rename_to.as_ref())
            .parameter(
                "SET COMMENT",
                self.set_comment.as_ref(),
                ParameterOptions::single_quotes(),
            );
        let builder = set_tags(builder, self.set_tags.as_ref())
            .keyword(self.unset_comment, "UNSET COMMENT");
        unset_tags(builder, self.unset_tags.as_ref())
    }
}

impl Validate for AlterRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("AlterRoleOptions")
            .valid_identifier("name", &self.name)
            .valid_optional_identifier("rename_to", self.rename_to.as_ref())
            .exactly_one_of(&[
                ("RenameTo", self.rename_to.is_some()),
                ("SetComment", self.set_comment.is_some()),
                ("SetTags", self.set_tags.is_some()),
                ("UnsetComment", flag(self.unset_comment)),
                ("UnsetTags", self.unset_tags.is_some()),
            ]);
        validate_tags(validator, "set_tags", self.set_tags.as_ref()).finish()
    }
}

/// `DROP ROLE [IF EXISTS] <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRoleOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
}

impl DropRoleOptions {
    /// Drop `name`.
    pub fn new(name: AccountObjectIdentifier) -> Self {
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

impl ToSql for DropRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP ROLE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
    }
}

impl Validate for DropRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropRoleOptions")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// `SHOW ROLES [LIKE '<pattern>']`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowRoleOptions {
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
}

impl ShowRoleOptions {
    /// `SHOW ROLES` without filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`like`](Self::like).
    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }
}

impl ToSql for ShowRoleOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW ROLES")
            .nested(None, self.like.as_ref(), false)
    }
}

impl Validate for ShowRoleOptions {
    fn validate(&self) -> SdkResult<()> {
        Ok(())
    }
}

/// One row of `SHOW ROLES`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Object name as stored.
    pub name: String,
    /// Default for the current user.
    pub is_default: Option<bool>,
    /// In use by the current session.
    pub is_current: Option<bool>,
    /// Granted through another role of the current user.
    pub is_inherited: Option<bool>,
    /// Number of users holding the role.
    pub assigned_to_users: Option<i64>,
    /// Number of roles this role is granted to.
    pub granted_to_roles: Option<i64>,
    /// Number of roles granted to this role.
    pub granted_roles: Option<i64>,
    /// Owning role.
    pub owner: Option<String>,
    /// Comment; empty text when none was set.
    pub comment: Option<String>,
}

impl Role {
    /// The identifier this row describes.
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.name.clone())
    }
}

impl FromRow for Role {
    fn from_row(row: &Row) -> SdkResult<Self> {
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            is_default: row.optional_bool("is_default")?,
            is_current: row.optional_bool("is_current")?,
            is_inherited: row.optional_bool("is_inherited")?,
            assigned_to_users: row.optional_int("assigned_to_users")?,
            granted_to_roles: row.optional_int("granted_to_roles")?,
            granted_roles: row.optional_int("granted_roles")?,
            owner: row.optional_non_empty_string("owner"),
            comment: row.optional_string("comment"),
        })
    }
}

/// Account role operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Roles<'a> {
    client: &'a Client,
}

impl<'a> Roles<'a> {
    /// Borrow `client` for account role operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `CREATE`.
    pub async fn create(&self, opts: &CreateRoleOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `ALTER`.
    pub async fn alter(&self, opts: &AlterRoleOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropRoleOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `SHOW` and map every row.
    pub async fn show(&self, opts: &ShowRoleOptions) -> SdkResult<Vec<Role>> {
        self.client.query_opts(Some(opts)).await
    }

    /// Find one object by identifier.
    ///
    /// Fails with [`SdkError::NotFound`](crate::error::SdkError::NotFound) when absent.
    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SdkResult<Role> {
        let roles = self
            .show(&ShowRoleOptions::new().with_like(Like::new(id.name())))
            .await?;
        find_exact(roles, |r| r.name.as_str(), id.name())
            .ok_or_else(|| not_found(ObjectType::Role, id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::SdkError;
    use crate::testing::RecordingExecutor;

    fn tag(name: &str, value: &str) -> TagAssociation {
        TagAssociation::new(SchemaObjectIdentifier::new("DB", "S", name), value)
    }

    #[test]
    fn test_create_with_tags() {
        let opts = CreateRoleOptions::new(AccountObjectIdentifier::new("ANALYST"))
            .with_if_not_exists(true)
            .with_comment("reads things")
            .with_tag(vec![tag("COST_CENTER", "finance")]);
        assert_eq!(
            crate::sql::build(Some(&opts)).unwrap(),
            concat!(
                r#"CREATE ROLE IF NOT EXISTS "ANALYST" COMMENT = 'reads things' "#,
                r#"WITH TAG ("DB"."S"."COST_CENTER" = 'finance')"#,
            )
        );
    }

    #[test]
    fn test_create_rejects_invalid_tag_name() {
        let opts = CreateRoleOptions::new(AccountObjectIdentifier::new("ANALYST"))
            .with_tag(vec![TagAssociation::new(SchemaObjectIdentifier::new("DB", "", "T"), "x")]);
        assert!(matches!(
            opts.validate(),
            Err(SdkError::InvalidObjectIdentifier { ref field }) if field == "tag"
        ));
    }

    #[test]
    fn test_alter_variants() {
        let id = AccountObjectIdentifier::new("ANALYST");
        let cases = [
            (
                AlterRoleOptions::new(id.clone())
                    .with_rename_to(AccountObjectIdentifier::new("READER")),
                r#"ALTER ROLE "ANALYST" RENAME TO "READER""#,
            ),
            (
                AlterRoleOptions::new(id.clone())
                    .with_if_exists(true)
                    .with_set_comment("c"),
                r#"ALTER ROLE IF EXISTS "ANALYST" SET COMMENT = 'c'"#,
            ),
            (
                AlterRoleOptions::new(id.clone()).with_set_tags(vec![tag("T", "v")]),
                r#"ALTER ROLE "ANALYST" SET TAG "DB"."S"."T" = 'v'"#,
            ),
            (
                AlterRoleOptions::new(id.clone()).with_unset_comment(true),
                r#"ALTER ROLE "ANALYST" UNSET COMMENT"#,
            ),
            (
                AlterRoleOptions::new(id.clone())
                    .with_unset_tags(vec![SchemaObjectIdentifier::new("DB", "S", "T")]),
                r#"ALTER ROLE "ANALYST" UNSET TAG "DB"."S"."T""#,
            ),
        ];
        for (opts, expected) in cases {
            assert_eq!(crate::sql::build(Some(&opts)).unwrap(), expected);
        }
    }

    #[test]
    fn test_alter_unset_comment_false_is_not_an_action() {
        let opts = AlterRoleOptions::new(AccountObjectIdentifier::new("ANALYST"))
            .with_unset_comment(false);
        assert!(matches!(opts.validate(), Err(SdkError::ExactlyOneOf { .. })));
    }

    #[test]
    fn test_drop_and_show() {
        let drop = DropRoleOptions::new(AccountObjectIdentifier::new("ANALYST"));
        assert_eq!(drop.to_sql(), r#"DROP ROLE "ANALYST""#);
        assert_eq!(ShowRoleOptions::new().to_sql(), "SHOW ROLES");
    }

    #[tokio::test]
    async fn test_show_by_id() {
        let row = Row::new()
            .with("created_on", "2024-03-01 10:00:00.000 -0800")
            .with("name", "ANALYST")
            .with("is_default", "N")
            .with("assigned_to_users", 2)
            .with("owner", "SECURITYADMIN")
            .with("comment", crate::row::SqlValue::Null);
        let executor =
            Arc::new(RecordingExecutor::new().with_rows("SHOW ROLES LIKE 'ANALYST'", vec![row]));
        let client = Client::new(executor);

        let role = client
            .roles()
            .show_by_id(&AccountObjectIdentifier::new("ANALYST"))
            .await
            .unwrap();
        assert_eq!(role.assigned_to_users, Some(2));
        assert_eq!(role.comment, None);
        assert_eq!(role.created_on.to_rfc3339(), "2024-03-01T18:00:00+00:00");

        let missing = client.roles().show_by_id(&AccountObjectIdentifier::new("OTHER")).await;
        assert!(matches!(missing, Err(SdkError::ObjectNotFound { .. })));
    }
}
