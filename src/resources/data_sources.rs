//! Read-only listings: `snowflake_warehouses` and `snowflake_database_roles`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::from_state;
use crate::client::Client;
use crate::error::ProviderError;
use crate::identifiers::AccountObjectIdentifier;
use crate::objects::database_role::ShowDatabaseRoleOptions;
use crate::objects::warehouse::ShowWarehouseOptions;
use crate::objects::Like;
use crate::provider::DataSource;
use crate::row::to_state;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

fn results_attribute(description: &str) -> Attribute {
    Attribute::new(
        AttributeType::list(AttributeType::map(AttributeType::String)),
        AttributeFlags::computed(),
    )
    .with_description(description)
}

/// Return the configuration object with `key` set to the listed rows.
fn with_results<T: serde::Serialize>(
    config: Value,
    key: &str,
    items: &[T],
) -> Result<Value, ProviderError> {
    let mut out = match config {
        Value::Object(entries) => entries,
        _ => Map::new(),
    };
    let items = items.iter().map(to_state).collect::<Result<Vec<_>, _>>()?;
    debug!(key, count = items.len(), "listed objects");
    out.insert(key.to_string(), Value::Array(items));
    Ok(Value::Object(out))
}

#[derive(Debug, Default, Deserialize)]
struct WarehousesQuery {
    like: Option<String>,
}

/// Every warehouse visible to the session role.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarehousesDataSource;

#[async_trait]
impl DataSource for WarehousesDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Lists warehouses.")
            .with_attribute(
                "like",
                Attribute::optional_string()
                    .with_description("Case-insensitive name pattern; % and _ are wildcards."),
            )
            .with_attribute("warehouses", results_attribute("One entry per SHOW WAREHOUSES row."))
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let query: WarehousesQuery = if config.is_null() {
            WarehousesQuery::default()
        } else {
            from_state(config.clone())?
        };
        let mut opts = ShowWarehouseOptions::new();
        if let Some(pattern) = query.like {
            opts = opts.with_like(Like::new(pattern));
        }
        let warehouses = client.warehouses().show(&opts).await?;
        with_results(config, "warehouses", &warehouses)
    }
}

#[derive(Debug, Deserialize)]
struct DatabaseRolesQuery {
    database: String,
    like: Option<String>,
}

/// The database roles of one database.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseRolesDataSource;

#[async_trait]
impl DataSource for DatabaseRolesDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Lists the database roles of a database.")
            .with_attribute("database", Attribute::required_string())
            .with_attribute("like", Attribute::optional_string())
            .with_attribute(
                "database_roles",
                results_attribute("One entry per SHOW DATABASE ROLES row."),
            )
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let query: DatabaseRolesQuery = from_state(config.clone())?;
        let mut opts = ShowDatabaseRoleOptions::new(AccountObjectIdentifier::new(query.database));
        if let Some(pattern) = query.like {
            opts = opts.with_like(Like::new(pattern));
        }
        let roles = client.database_roles().show(&opts).await?;
        with_results(config, "database_roles", &roles)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::row::Row;
    use crate::testing::RecordingExecutor;
    use serde_json::json;

    #[tokio::test]
    async fn test_warehouses_listing() {
        let executor = Arc::new(RecordingExecutor::new().with_rows(
            "SHOW WAREHOUSES LIKE 'ETL%'",
            vec![
                Row::new()
                    .with("name", "ETL_SMALL")
                    .with("created_on", "2024-01-01T00:00:00Z")
                    .with("size", "Small"),
                Row::new()
                    .with("name", "ETL_LARGE")
                    .with("created_on", "2024-01-01T00:00:00Z")
                    .with("size", "Large"),
            ],
        ));
        let client = Client::new(executor);

        let result = WarehousesDataSource.read(&client, json!({"like": "ETL%"})).await.unwrap();
        assert_eq!(result["like"], "ETL%");
        assert_eq!(result["warehouses"].as_array().map(Vec::len), Some(2));
        assert_eq!(result["warehouses"][1]["size"], "LARGE");
        assert_eq!(result["warehouses"][0]["created_on"], "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_warehouses_without_filter() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor.clone());

        let result = WarehousesDataSource.read(&client, Value::Null).await.unwrap();
        assert_eq!(result, json!({"warehouses": []}));
        assert_eq!(executor.statements(), vec!["SHOW WAREHOUSES".to_string()]);
    }

    #[tokio::test]
    async fn test_database_roles_listing() {
        let executor = Arc::new(RecordingExecutor::new().with_rows(
            r#"SHOW DATABASE ROLES IN DATABASE "DB""#,
            vec![Row::new()
                .with("name", "READER")
                .with("created_on", "2024-01-01T00:00:00Z")
                .with("owner", "SYSADMIN")],
        ));
        let client = Client::new(executor);

        let result =
            DatabaseRolesDataSource.read(&client, json!({"database": "DB"})).await.unwrap();
        assert_eq!(result["database_roles"][0]["name"], "READER");
        assert_eq!(result["database_roles"][0]["database_name"], "DB");
    }

    #[tokio::test]
    async fn test_database_roles_requires_database() {
        let client = Client::new(Arc::new(RecordingExecutor::new()));
        let err = DatabaseRolesDataSource.read(&client, json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }
}
