//! `snowflake_database_role`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{from_state, into_state, observed_comment, parse_import_id, validate_model};
use crate::client::Client;
use crate::error::{ProviderError, SdkResult};
use crate::identifiers::{DatabaseObjectIdentifier, ObjectIdentifier};
use crate::objects::database_role::{
    AlterDatabaseRoleOptions, CreateDatabaseRoleOptions, DatabaseRole, DatabaseRoleRename,
    DatabaseRoleSet, DatabaseRoleUnset, DropDatabaseRoleOptions,
};
use crate::provider::Resource;
use crate::schema::{Attribute, Diagnostic, Schema};

/// State of a database role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRoleModel {
    /// Database the role belongs to.
    pub database: String,
    /// Role name.
    pub name: String,
    /// Free-form comment.
    pub comment: Option<String>,
    /// Owning role, as reported by the account.
    pub owner: Option<String>,
    /// `"DB"."ROLE"`.
    pub fully_qualified_name: Option<String>,
}

impl DatabaseRoleModel {
    fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database, &self.name)
    }

    fn create_options(&self) -> SdkResult<CreateDatabaseRoleOptions> {
        let opts = CreateDatabaseRoleOptions::new(self.id());
        Ok(match &self.comment {
            Some(comment) => opts.with_comment(comment),
            None => opts,
        })
    }

    fn observed(role: &DatabaseRole) -> Self {
        let id = role.id();
        Self {
            database: role.database_name.clone(),
            name: role.name.clone(),
            comment: observed_comment(role.comment.clone()),
            owner: role.owner.clone(),
            fully_qualified_name: Some(id.fully_qualified_name()),
        }
    }
}

/// A role scoped to one database.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseRoleResource;

#[async_trait]
impl Resource for DatabaseRoleResource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A database role.")
            .with_attribute(
                "database",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Database in which the role is created."),
            )
            .with_attribute("name", Attribute::required_string().with_description("Role name."))
            .with_attribute("comment", Attribute::optional_string())
            .with_attribute("owner", Attribute::computed_string())
            .with_attribute("fully_qualified_name", Attribute::computed_string())
    }

    fn validate(&self, config: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate_model(config, DatabaseRoleModel::create_options))
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value, ProviderError> {
        let model: DatabaseRoleModel = from_state(planned_state)?;
        let id = model.id();
        client.database_roles().create(&model.create_options()?).await?;
        info!(%id, "created database role");
        let role = client.database_roles().show_by_id(&id).await?;
        into_state(&DatabaseRoleModel::observed(&role))
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value, ProviderError> {
        let model: DatabaseRoleModel = from_state(current_state)?;
        let role = client.database_roles().show_by_id(&model.id()).await?;
        into_state(&DatabaseRoleModel::observed(&role))
    }

    async fn update(
        &self,
        client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: DatabaseRoleModel = from_state(prior_state)?;
        let planned: DatabaseRoleModel = from_state(planned_state)?;
        if prior.database != planned.database {
            return Err(ProviderError::InvalidRequest(
                "a database role cannot move between databases in place".to_string(),
            ));
        }

        let roles = client.database_roles();
        let mut id = prior.id();
        if prior.name != planned.name {
            let rename = DatabaseRoleRename { name: planned.id() };
            roles.alter(&AlterDatabaseRoleOptions::new(id.clone()).with_rename(rename)).await?;
            info!(from = %id, to = %planned.id(), "renamed database role");
            id = planned.id();
        }
        if prior.comment != planned.comment {
            let opts = AlterDatabaseRoleOptions::new(id.clone());
            let opts = match &planned.comment {
                Some(comment) => opts.with_set(DatabaseRoleSet {
                    comment: comment.clone(),
                }),
                None => opts.with_unset(DatabaseRoleUnset { comment: Some(true) }),
            };
            roles.alter(&opts).await?;
        }

        let role = roles.show_by_id(&id).await?;
        into_state(&DatabaseRoleModel::observed(&role))
    }

    async fn delete(&self, client: &Client, current_state: Value) -> Result<(), ProviderError> {
        let model: DatabaseRoleModel = from_state(current_state)?;
        let id = model.id();
        client
            .database_roles()
            .drop(&DropDatabaseRoleOptions::new(id.clone()).with_if_exists(true))
            .await?;
        info!(%id, "dropped database role");
        Ok(())
    }

    async fn import_state(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let id: DatabaseObjectIdentifier = parse_import_id(id)?;
        let role = client.database_roles().show_by_id(&id).await?;
        into_state(&DatabaseRoleModel::observed(&role))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::row::Row;
    use crate::testing::RecordingExecutor;
    use serde_json::json;

    const SHOW_ROLE1: &str = r#"SHOW DATABASE ROLES LIKE 'ROLE1' IN DATABASE "DB""#;

    fn role_row(name: &str, comment: &str) -> Row {
        Row::new()
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("name", name)
            .with("owner", "ACCOUNTADMIN")
            .with("comment", comment)
    }

    #[tokio::test]
    async fn test_create_reads_back_observed_state() {
        let executor =
            Arc::new(RecordingExecutor::new().with_rows(SHOW_ROLE1, vec![role_row("ROLE1", "hi")]));
        let client = Client::new(executor.clone());

        let state = DatabaseRoleResource
            .create(&client, json!({"database": "DB", "name": "ROLE1", "comment": "hi"}))
            .await
            .unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                r#"CREATE DATABASE ROLE "DB"."ROLE1" COMMENT = 'hi'"#.to_string(),
                SHOW_ROLE1.to_string(),
            ]
        );
        assert_eq!(state["owner"], "ACCOUNTADMIN");
        assert_eq!(state["fully_qualified_name"], r#""DB"."ROLE1""#);
    }

    #[tokio::test]
    async fn test_update_renames_then_unsets_comment() {
        let executor = Arc::new(RecordingExecutor::new().with_rows(
            r#"SHOW DATABASE ROLES LIKE 'ROLE2' IN DATABASE "DB""#,
            vec![role_row("ROLE2", "")],
        ));
        let client = Client::new(executor.clone());

        let state = DatabaseRoleResource
            .update(
                &client,
                json!({"database": "DB", "name": "ROLE1", "comment": "hi"}),
                json!({"database": "DB", "name": "ROLE2", "comment": null}),
            )
            .await
            .unwrap();

        assert_eq!(
            executor.statements()[..2],
            [
                r#"ALTER DATABASE ROLE "DB"."ROLE1" RENAME TO "DB"."ROLE2""#.to_string(),
                r#"ALTER DATABASE ROLE "DB"."ROLE2" UNSET COMMENT"#.to_string(),
            ]
        );
        assert_eq!(state["comment"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_rejects_database_change() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor.clone());
        let err = DatabaseRoleResource
            .update(
                &client,
                json!({"database": "DB", "name": "ROLE1"}),
                json!({"database": "OTHER", "name": "ROLE1"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_import() {
        let executor =
            Arc::new(RecordingExecutor::new().with_rows(SHOW_ROLE1, vec![role_row("ROLE1", "")]));
        let client = Client::new(executor.clone());

        DatabaseRoleResource
            .delete(&client, json!({"database": "DB", "name": "ROLE1"}))
            .await
            .unwrap();
        let state = DatabaseRoleResource.import_state(&client, "DB.ROLE1").await.unwrap();

        assert_eq!(executor.statements()[0], r#"DROP DATABASE ROLE IF EXISTS "DB"."ROLE1""#);
        assert_eq!(state["database"], "DB");
        assert_eq!(state["comment"], Value::Null);
    }

    #[test]
    fn test_validate_reports_statement_errors() {
        let diagnostics = DatabaseRoleResource
            .validate(&json!({"database": "", "name": "ROLE1"}))
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));
    }
}
