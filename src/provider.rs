//! The provider surface the plugin host drives.
//!
//! A [`Provider`] owns a fixed table of [`Resource`]s and [`DataSource`]s,
//! keyed by their type names. The host calls `configure` once with the
//! provider block; after that every CRUD call is dispatched by type name to
//! the registered implementation together with the configured [`Client`].
//!
//! # Example
//!
//! ```ignore
//! use snowflake_provider_sdk::provider::{Connector, Provider};
//!
//! let provider = Provider::new(MyConnector::default());
//! provider.configure(serde_json::json!({"account_name": "ACC"})).await?;
//! let state = provider
//!     .create("snowflake_warehouse", serde_json::json!({"name": "WH1"}))
//!     .await?;
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::{Client, SqlExecutor};
use crate::config::{process_env, ProviderConfig};
use crate::error::{ProviderError, SdkResult};
use crate::plan::{self, PlanResult};
use crate::resources::{
    AccountRoleResource, DatabaseRoleResource, DatabaseRolesDataSource, SchemaResource,
    WarehouseResource, WarehousesDataSource,
};
use crate::schema::{has_errors, Diagnostic, ProviderSchema, Schema};

/// Opens a session for a configured provider.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect with the given settings and return the executor for the session.
    async fn connect(&self, config: &ProviderConfig) -> SdkResult<Arc<dyn SqlExecutor>>;
}

/// A managed object kind with create, read, update and delete callbacks.
///
/// State is the JSON object described by [`Resource::schema`].
#[async_trait]
pub trait Resource: Send + Sync {
    /// The schema of this resource's state.
    fn schema(&self) -> Schema;

    /// Check a configuration beyond what the schema can express.
    ///
    /// Implementations build the statement they would send and report its
    /// validation failures.
    fn validate(&self, config: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(Vec::new())
    }

    /// Create the object and return the resulting state.
    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh state from the account.
    ///
    /// Returns [`ProviderError::NotFound`] when the object no longer exists.
    async fn read(&self, client: &Client, current_state: Value) -> Result<Value, ProviderError>;

    /// Apply the difference between two states.
    async fn update(
        &self,
        client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Remove the object.
    async fn delete(&self, client: &Client, current_state: Value) -> Result<(), ProviderError>;

    /// Build state for an existing object from its import id.
    async fn import_state(&self, client: &Client, id: &str) -> Result<Value, ProviderError>;
}

/// A read-only query over the account.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The schema of this data source's configuration and result.
    fn schema(&self) -> Schema;

    /// Run the query and return the configuration with results filled in.
    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError>;
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

/// The Snowflake provider: a registry of resources and data sources plus the
/// session opened by `configure`.
pub struct Provider {
    connector: Arc<dyn Connector>,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
    client: OnceLock<Client>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("configured", &self.client.get().is_some())
            .finish()
    }
}

impl Provider {
    /// Build the provider with every resource and data source registered.
    pub fn new(connector: impl Connector + 'static) -> Self {
        let mut resources: BTreeMap<&'static str, Box<dyn Resource>> = BTreeMap::new();
        resources.insert("snowflake_database_role", Box::new(DatabaseRoleResource));
        resources.insert("snowflake_account_role", Box::new(AccountRoleResource));
        resources.insert("snowflake_warehouse", Box::new(WarehouseResource));
        resources.insert("snowflake_schema", Box::new(SchemaResource));

        let mut data_sources: BTreeMap<&'static str, Box<dyn DataSource>> = BTreeMap::new();
        data_sources.insert("snowflake_warehouses", Box::new(WarehousesDataSource));
        data_sources.insert("snowflake_database_roles", Box::new(DatabaseRolesDataSource));

        Self {
            connector: Arc::new(connector),
            resources,
            data_sources,
            client: OnceLock::new(),
        }
    }

    /// The provider's schema including all resources and data sources.
    pub fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        let schema = self
            .resources
            .iter()
            .fold(schema, |schema, (name, resource)| {
                schema.with_resource(*name, resource.schema())
            });
        self.data_sources
            .iter()
            .fold(schema, |schema, (name, data_source)| {
                schema.with_data_source(*name, data_source.schema())
            })
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.resources.keys().map(|name| name.to_string()).collect()
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> Vec<String> {
        self.data_sources.keys().map(|name| name.to_string()).collect()
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    /// The session opened by `configure`.
    pub fn client(&self) -> Result<&Client, ProviderError> {
        self.client
            .get()
            .ok_or_else(|| ProviderError::Configuration("provider is not configured".to_string()))
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider block without connecting.
    pub async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = empty_if_null(config);
        let mut diagnostics = ProviderConfig::schema().validate_config(&config);
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        diagnostics.extend(ProviderConfig::load(config, process_env)?.validate());
        Ok(diagnostics)
    }

    /// Configure the provider and open its session.
    ///
    /// Configuration errors come back as diagnostics; connecting happens once.
    #[instrument(level = "info", skip_all)]
    pub async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        self.configure_with_env(config, process_env).await
    }

    /// [`configure`](Self::configure) with an explicit environment lookup.
    pub async fn configure_with_env<F>(
        &self,
        config: Value,
        env: F,
    ) -> Result<Vec<Diagnostic>, ProviderError>
    where
        F: Fn(&str) -> Option<String> + Send,
    {
        let config = empty_if_null(config);
        let mut diagnostics = ProviderConfig::schema().validate_config(&config);
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        let config = ProviderConfig::load(config, env)?;
        diagnostics.extend(config.validate());
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }

        if self.client.get().is_some() {
            diagnostics.push(Diagnostic::warning(
                "provider is already configured; keeping the existing session",
            ));
            return Ok(diagnostics);
        }

        debug!(?config, "connecting");
        let executor = self
            .connector
            .connect(&config)
            .await
            .map_err(|err| ProviderError::Configuration(err.to_string()))?;
        if self.client.set(Client::new(executor)).is_err() {
            warn!("provider was configured concurrently; keeping the first session");
        }
        let account = config.account_identifier().unwrap_or_default();
        info!(%account, "provider configured");
        Ok(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration against its schema and its statements.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let diagnostics = resource.schema().validate_config(&config);
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        resource.validate(&config)
    }

    /// Compute the changes needed to move from `prior_state` to `proposed_state`.
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(plan::plan(&resource.schema(), prior_state.as_ref(), &proposed_state))
    }

    /// Create a resource.
    #[instrument(level = "info", skip(self, planned_state))]
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.create(self.client()?, planned_state).await
    }

    /// Refresh a resource. `None` means the object is gone and should leave state.
    #[instrument(level = "debug", skip(self, current_state))]
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(resource_type)?;
        match resource.read(self.client()?, current_state).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => {
                warn!(error = %err, "object no longer exists; removing from state");
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }

    /// Update a resource in place.
    #[instrument(level = "info", skip(self, prior_state, planned_state))]
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.update(self.client()?, prior_state, planned_state).await
    }

    /// Delete a resource.
    #[instrument(level = "info", skip(self, current_state))]
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.delete(self.client()?, current_state).await
    }

    /// Import an existing object by id.
    #[instrument(level = "info", skip(self))]
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<ImportedResource, ProviderError> {
        let resource = self.resource(resource_type)?;
        let state = resource.import_state(self.client()?, id).await?;
        Ok(ImportedResource {
            resource_type: resource_type.to_string(),
            state,
        })
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration against its schema.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.data_source(data_source_type)?.schema().validate_config(&config))
    }

    /// Read a data source.
    #[instrument(level = "debug", skip(self, config))]
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        data_source.read(self.client()?, config).await
    }
}

fn empty_if_null(config: Value) -> Value {
    if config.is_null() {
        Value::Object(Default::default())
    } else {
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingExecutor, StaticConnector};
    use serde_json::json;

    fn config() -> Value {
        json!({"account_name": "ACC", "user": "u", "password": "p"})
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_registration_table() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));
        assert_eq!(
            provider.resource_types(),
            vec![
                "snowflake_account_role",
                "snowflake_database_role",
                "snowflake_schema",
                "snowflake_warehouse",
            ]
        );
        assert_eq!(
            provider.data_source_types(),
            vec!["snowflake_database_roles", "snowflake_warehouses"]
        );

        let schema = provider.schema();
        assert_eq!(schema.resources.len(), 4);
        assert_eq!(schema.data_sources.len(), 2);
        assert!(schema.provider.block.attributes.contains_key("password"));
    }

    #[tokio::test]
    async fn test_calls_before_configure_fail() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));
        let err = provider
            .create("snowflake_account_role", json!({"name": "R"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));
        let err = provider.plan("snowflake_table", None, json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(name) if name == "snowflake_table"));
        let err = provider.read_data_source("snowflake_tables", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_settings() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));
        let diagnostics = provider
            .configure_with_env(json!({"account_name": "ACC"}), no_env)
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert!(provider.client().is_err());
    }

    #[tokio::test]
    async fn test_configure_rejects_unknown_attributes() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));
        let diagnostics = provider
            .configure_with_env(json!({"acount": "typo"}), no_env)
            .await
            .unwrap();
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("acount"));
    }

    #[tokio::test]
    async fn test_configure_once() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));
        assert!(provider.configure_with_env(config(), no_env).await.unwrap().is_empty());
        assert!(provider.client().is_ok());

        let again = provider.configure_with_env(config(), no_env).await.unwrap();
        assert_eq!(again.len(), 1);
        assert!(!again[0].is_error());
    }

    #[tokio::test]
    async fn test_read_of_missing_object_clears_state() {
        let executor = Arc::new(RecordingExecutor::new());
        let provider = Provider::new(StaticConnector::new(executor.clone()));
        provider.configure_with_env(config(), no_env).await.unwrap();

        let state = provider
            .read("snowflake_account_role", json!({"name": "GONE"}))
            .await
            .unwrap();
        assert_eq!(state, None);
        assert_eq!(executor.statements(), vec!["SHOW ROLES LIKE 'GONE'".to_string()]);
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let provider = Provider::new(StaticConnector::new(Arc::new(RecordingExecutor::new())));

        let diagnostics = provider
            .validate_resource_config("snowflake_database_role", json!({"database": "DB"}))
            .await
            .unwrap();
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let diagnostics = provider
            .validate_resource_config(
                "snowflake_database_role",
                json!({"database": "DB", "name": " "}),
            )
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let diagnostics = provider
            .validate_resource_config(
                "snowflake_database_role",
                json!({"database": "DB", "name": "R"}),
            )
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
    }
}
