//! `snowflake_schema`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{
    from_state, into_state, observed_comment, observed_u32, parse_import_id, tag_associations,
    tag_block, tag_changes, validate_model, TagModel,
};
use crate::client::Client;
use crate::error::{ProviderError, SdkResult};
use crate::identifiers::{DatabaseObjectIdentifier, ObjectIdentifier};
use crate::objects::schema::{
    AlterSchemaOptions, CreateSchemaOptions, DropSchemaOptions, Schema as SchemaObject, SchemaSet,
    SchemaUnset,
};
use crate::provider::Resource;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};

/// State of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    /// Database the schema belongs to.
    pub database: String,
    /// Schema name.
    pub name: String,
    /// Created without fail-safe storage.
    pub is_transient: Option<bool>,
    /// Object owners lose grant rights to the schema owner.
    pub with_managed_access: Option<bool>,
    /// Time Travel retention.
    pub data_retention_time_in_days: Option<u32>,
    /// Free-form comment.
    pub comment: Option<String>,
    /// Tags attached to the schema.
    #[serde(default, rename = "tag")]
    pub tags: Vec<TagModel>,
    /// Owning role, as reported by the account.
    pub owner: Option<String>,
    /// `"DB"."SCHEMA"`.
    pub fully_qualified_name: Option<String>,
}

impl SchemaModel {
    fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database, &self.name)
    }

    fn create_options(&self) -> SdkResult<CreateSchemaOptions> {
        let mut opts = CreateSchemaOptions {
            transient: self.is_transient.filter(|t| *t),
            with_managed_access: self.with_managed_access.filter(|m| *m),
            data_retention_time_in_days: self.data_retention_time_in_days,
            comment: self.comment.clone(),
            ..CreateSchemaOptions::new(self.id())
        };
        if !self.tags.is_empty() {
            opts = opts.with_tag(tag_associations(&self.tags)?);
        }
        Ok(opts)
    }

    fn changes(&self, planned: &Self) -> (SchemaSet, SchemaUnset) {
        let mut set = SchemaSet::default();
        let mut unset = SchemaUnset::default();
        if self.data_retention_time_in_days != planned.data_retention_time_in_days {
            match planned.data_retention_time_in_days {
                Some(days) => set.data_retention_time_in_days = Some(days),
                None => unset.data_retention_time_in_days = Some(true),
            }
        }
        if self.comment != planned.comment {
            match &planned.comment {
                Some(comment) => set.comment = Some(comment.clone()),
                None => unset.comment = Some(true),
            }
        }
        (set, unset)
    }

    fn observed(schema: &SchemaObject, tags: Vec<TagModel>) -> Self {
        Self {
            database: schema.database_name.clone(),
            name: schema.name.clone(),
            is_transient: Some(schema.is_transient()),
            with_managed_access: Some(schema.is_managed_access()),
            data_retention_time_in_days: observed_u32(schema.retention_time),
            comment: observed_comment(schema.comment.clone()),
            tags,
            owner: schema.owner.clone(),
            fully_qualified_name: Some(schema.id().fully_qualified_name()),
        }
    }
}

/// A schema inside a database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaResource;

#[async_trait]
impl Resource for SchemaResource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A schema.")
            .with_attribute(
                "database",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Database in which the schema is created."),
            )
            .with_attribute("name", Attribute::required_string().with_description("Schema name."))
            .with_attribute(
                "is_transient",
                Attribute::optional_computed(AttributeType::Bool).with_force_new(),
            )
            .with_attribute(
                "with_managed_access",
                Attribute::optional_computed(AttributeType::Bool),
            )
            .with_attribute(
                "data_retention_time_in_days",
                Attribute::optional_computed(AttributeType::Int64),
            )
            .with_attribute("comment", Attribute::optional_string())
            .with_attribute("owner", Attribute::computed_string())
            .with_attribute("fully_qualified_name", Attribute::computed_string())
            .with_block("tag", tag_block())
    }

    fn validate(&self, config: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate_model(config, SchemaModel::create_options))
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value, ProviderError> {
        let model: SchemaModel = from_state(planned_state)?;
        let id = model.id();
        client.schemas().create(&model.create_options()?).await?;
        info!(%id, "created schema");
        let schema = client.schemas().show_by_id(&id).await?;
        into_state(&SchemaModel::observed(&schema, model.tags))
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value, ProviderError> {
        let model: SchemaModel = from_state(current_state)?;
        let schema = client.schemas().show_by_id(&model.id()).await?;
        into_state(&SchemaModel::observed(&schema, model.tags))
    }

    async fn update(
        &self,
        client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: SchemaModel = from_state(prior_state)?;
        let planned: SchemaModel = from_state(planned_state)?;
        if prior.database != planned.database || prior.is_transient != planned.is_transient {
            return Err(ProviderError::InvalidRequest(
                "changing the database or transience of a schema requires replacement".to_string(),
            ));
        }

        let schemas = client.schemas();
        let mut id = prior.id();
        if prior.name != planned.name {
            schemas
                .alter(&AlterSchemaOptions::new(id.clone()).with_new_name(planned.id()))
                .await?;
            info!(from = %id, to = %planned.id(), "renamed schema");
            id = planned.id();
        }

        let managed = planned.with_managed_access.unwrap_or(false);
        if prior.with_managed_access.unwrap_or(false) != managed {
            schemas
                .alter(&AlterSchemaOptions::new(id.clone()).with_managed_access(managed))
                .await?;
        }

        let (set, unset) = prior.changes(&planned);
        if set != SchemaSet::default() {
            schemas.alter(&AlterSchemaOptions::new(id.clone()).with_set(set)).await?;
        }
        if unset != SchemaUnset::default() {
            schemas.alter(&AlterSchemaOptions::new(id.clone()).with_unset(unset)).await?;
        }

        let tags = tag_changes(&prior.tags, &planned.tags)?;
        if !tags.unset.is_empty() {
            schemas
                .alter(&AlterSchemaOptions::new(id.clone()).with_unset_tags(tags.unset))
                .await?;
        }
        if !tags.set.is_empty() {
            schemas
                .alter(&AlterSchemaOptions::new(id.clone()).with_set_tags(tags.set))
                .await?;
        }

        let schema = schemas.show_by_id(&id).await?;
        into_state(&SchemaModel::observed(&schema, planned.tags))
    }

    async fn delete(&self, client: &Client, current_state: Value) -> Result<(), ProviderError> {
        let model: SchemaModel = from_state(current_state)?;
        let id = model.id();
        client
            .schemas()
            .drop(&DropSchemaOptions::new(id.clone()).with_if_exists(true))
            .await?;
        info!(%id, "dropped schema");
        Ok(())
    }

    async fn import_state(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let id: DatabaseObjectIdentifier = parse_import_id(id)?;
        let schema = client.schemas().show_by_id(&id).await?;
        into_state(&SchemaModel::observed(&schema, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::plan::plan;
    use crate::row::Row;
    use crate::testing::RecordingExecutor;
    use serde_json::json;

    const SHOW_RAW: &str = r#"SHOW SCHEMAS LIKE 'RAW' IN DATABASE "DB""#;

    fn schema_row(options: &str, retention: i64) -> Row {
        Row::new()
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("name", "RAW")
            .with("database_name", "DB")
            .with("owner", "SYSADMIN")
            .with("comment", "")
            .with("options", options)
            .with("retention_time", retention)
    }

    #[tokio::test]
    async fn test_create_transient_managed_schema() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows(SHOW_RAW, vec![schema_row("TRANSIENT, MANAGED ACCESS", 0)]),
        );
        let client = Client::new(executor.clone());

        let state = SchemaResource
            .create(
                &client,
                json!({
                    "database": "DB",
                    "name": "RAW",
                    "is_transient": true,
                    "with_managed_access": true,
                    "data_retention_time_in_days": 0,
                }),
            )
            .await
            .unwrap();

        assert_eq!(
            executor.statements()[0],
            concat!(
                r#"CREATE TRANSIENT SCHEMA "DB"."RAW" WITH MANAGED ACCESS "#,
                r#"DATA_RETENTION_TIME_IN_DAYS = 0"#,
            )
        );
        assert_eq!(state["is_transient"], true);
        assert_eq!(state["with_managed_access"], true);
        assert_eq!(state["data_retention_time_in_days"], 0);
        assert_eq!(state["fully_qualified_name"], r#""DB"."RAW""#);
    }

    #[tokio::test]
    async fn test_update_toggles_managed_access_and_retention() {
        let executor =
            Arc::new(RecordingExecutor::new().with_rows(SHOW_RAW, vec![schema_row("", 7)]));
        let client = Client::new(executor.clone());

        let prior = json!({
            "database": "DB", "name": "RAW", "is_transient": false,
            "with_managed_access": true, "data_retention_time_in_days": 1, "comment": "old",
        });
        let planned = json!({
            "database": "DB", "name": "RAW", "is_transient": false,
            "with_managed_access": false, "data_retention_time_in_days": 7,
        });
        let state = SchemaResource.update(&client, prior, planned).await.unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                r#"ALTER SCHEMA "DB"."RAW" DISABLE MANAGED ACCESS"#.to_string(),
                r#"ALTER SCHEMA "DB"."RAW" SET DATA_RETENTION_TIME_IN_DAYS = 7"#.to_string(),
                r#"ALTER SCHEMA "DB"."RAW" UNSET COMMENT"#.to_string(),
                SHOW_RAW.to_string(),
            ]
        );
        assert_eq!(state["with_managed_access"], false);
        assert_eq!(state["data_retention_time_in_days"], 7);
    }

    #[tokio::test]
    async fn test_update_rejects_transience_change() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor.clone());
        let err = SchemaResource
            .update(
                &client,
                json!({"database": "DB", "name": "RAW", "is_transient": false}),
                json!({"database": "DB", "name": "RAW", "is_transient": true}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_import() {
        let executor =
            Arc::new(RecordingExecutor::new().with_rows(SHOW_RAW, vec![schema_row("", 1)]));
        let client = Client::new(executor.clone());

        SchemaResource
            .delete(&client, json!({"database": "DB", "name": "RAW"}))
            .await
            .unwrap();
        let state = SchemaResource.import_state(&client, "DB.RAW").await.unwrap();

        assert_eq!(executor.statements()[0], r#"DROP SCHEMA IF EXISTS "DB"."RAW""#);
        assert_eq!(state["is_transient"], false);
        assert_eq!(state["tag"], json!([]));
    }

    #[test]
    fn test_force_new_attributes() {
        let schema = SchemaResource.schema();
        let forced: Vec<&str> = schema.force_new_attributes().collect();
        assert_eq!(forced, vec!["database", "is_transient"]);
    }

    #[tokio::test]
    async fn test_unchanged_config_plans_no_changes() {
        let executor =
            Arc::new(RecordingExecutor::new().with_rows(SHOW_RAW, vec![schema_row("", 1)]));
        let client = Client::new(executor.clone());
        let config = json!({
            "database": "DB",
            "name": "RAW",
            "tag": [{"name": "GOV.TAGS.LAYER", "value": "raw"}],
        });

        let created = SchemaResource.create(&client, config.clone()).await.unwrap();
        let state = SchemaResource.read(&client, created).await.unwrap();
        assert_eq!(
            executor.statements()[0],
            r#"CREATE SCHEMA "DB"."RAW" WITH TAG ("GOV"."TAGS"."LAYER" = 'raw')"#
        );

        let result = plan(&SchemaResource.schema(), Some(&state), &config);
        assert!(!result.has_changes(), "{:?}", result.changes);
        assert_eq!(result.planned_state["data_retention_time_in_days"], 1);
    }
}
