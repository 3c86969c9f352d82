//! Testing utilities for the provider and for code built on the SQL layer.
//!
//! [`RecordingExecutor`] stands in for a live session: it records every
//! statement it is handed and answers queries from canned rows.
//! [`ProviderTester`] wraps a [`Provider`] connected to such an executor and
//! adds plan and lifecycle helpers, so resource behavior can be checked
//! statement by statement.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use snowflake_provider_sdk::row::Row;
//! use snowflake_provider_sdk::testing::{ProviderTester, RecordingExecutor};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_role() {
//!     let executor = Arc::new(RecordingExecutor::new().with_rows(
//!         "SHOW ROLES LIKE 'ANALYST'",
//!         vec![Row::new().with("name", "ANALYST").with("created_on", "2024-01-01T00:00:00Z")],
//!     ));
//!     let tester = ProviderTester::with_executor(executor.clone());
//!     let config = json!({"account_name": "ACC", "user": "u", "password": "p"});
//!     tester.configure(config).await.unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("snowflake_account_role", json!({"name": "ANALYST"}))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["name"], "ANALYST");
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::SqlExecutor;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, SdkError, SdkResult};
use crate::plan::PlanResult;
use crate::provider::{Connector, ImportedResource, Provider};
use crate::row::Row;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};

/// A [`SqlExecutor`] that records statements instead of running them.
///
/// Queries return the rows registered for the exact statement text, or no
/// rows. Statements registered with [`with_failure`](Self::with_failure)
/// fail with [`SdkError::Execution`].
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    rows: HashMap<String, Vec<Row>>,
    failures: HashMap<String, String>,
    statements: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    /// An executor with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `statement` with `rows`.
    pub fn with_rows(mut self, statement: impl Into<String>, rows: Vec<Row>) -> Self {
        self.rows.insert(statement.into(), rows);
        self
    }

    /// Fail `statement` with `message`.
    pub fn with_failure(
        mut self,
        statement: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures.insert(statement.into(), message.into());
        self
    }

    /// Every statement received so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log().clone()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.statements.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, statement: &str) -> SdkResult<()> {
        self.log().push(statement.to_string());
        match self.failures.get(statement) {
            Some(message) => Err(SdkError::Execution {
                statement: statement.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn exec(&self, statement: &str) -> SdkResult<()> {
        self.record(statement)
    }

    async fn query(&self, statement: &str) -> SdkResult<Vec<Row>> {
        self.record(statement)?;
        Ok(self.rows.get(statement).cloned().unwrap_or_default())
    }
}

/// A [`Connector`] that hands out the same executor on every connect.
#[derive(Clone)]
pub struct StaticConnector {
    executor: Arc<dyn SqlExecutor>,
}

impl StaticConnector {
    /// Connect every session to `executor`.
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }
}

impl std::fmt::Debug for StaticConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticConnector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(&self, _config: &ProviderConfig) -> SdkResult<Arc<dyn SqlExecutor>> {
        Ok(Arc::clone(&self.executor))
    }
}

/// A test harness around a [`Provider`].
///
/// Configuration ignores the process environment so results do not depend
/// on `SNOWFLAKE_*` variables set on the machine running the tests.
#[derive(Debug)]
pub struct ProviderTester {
    provider: Provider,
    executor: Option<Arc<RecordingExecutor>>,
}

impl ProviderTester {
    /// Create a tester for the given provider.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            executor: None,
        }
    }

    /// Create a tester whose provider connects to `executor`.
    pub fn with_executor(executor: Arc<RecordingExecutor>) -> Self {
        let connector = StaticConnector::new(executor.clone());
        Self {
            provider: Provider::new(connector),
            executor: Some(executor),
        }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Statements sent so far, when built with [`with_executor`](Self::with_executor).
    pub fn statements(&self) -> Vec<String> {
        self.executor
            .as_ref()
            .map(|executor| executor.statements())
            .unwrap_or_default()
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.resource_types()
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.data_source_types()
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider without consulting the environment.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure_with_env(config, |_| None).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_resource_config(resource_type, config).await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, None, proposed_state).await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, Some(prior_state), proposed_state).await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, Some(prior_state), Value::Null).await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read a resource; `None` when the object is gone.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior_state, planned_state).await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing object.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<ImportedResource, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    async fn read_existing(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<Value, ProviderError> {
        self.read(resource_type, state).await?.ok_or_else(|| {
            ProviderError::NotFound(format!(
                "{resource_type} disappeared right after it was written"
            ))
        })
    }

    /// Run plan, create and read. Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read_existing(resource_type, created).await
    }

    /// Run plan, update and read. Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        if plan.requires_replace {
            return Err(ProviderError::InvalidRequest(format!(
                "{resource_type} change requires replacement, not an update"
            )));
        }
        let updated = self.update(resource_type, prior_state, plan.planned_state).await?;
        self.read_existing(resource_type, updated).await
    }

    /// Run plan and delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone()).await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update, then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    writeln!(f, "  [{:?}] {diag}", diag.severity)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "provider error: {e}"),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan creates the resource.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(plan.has_changes(), "Expected plan to have changes for create, but got no changes");
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires replacement.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "Expected plan to require replacement, but it does not");
}

/// Assert that a plan updates in place.
///
/// # Panics
///
/// Panics if the plan requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan changes the attribute at `path`.
///
/// # Panics
///
/// Panics if the attribute is unchanged.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert that an error diagnostic's summary contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| matches!(d.severity, DiagnosticSeverity::Error)
                && d.summary.contains(substring)),
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHOW_ANALYST: &str = "SHOW ROLES LIKE 'ANALYST'";

    fn analyst() -> Row {
        Row::new()
            .with("name", "ANALYST")
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("owner", "USERADMIN")
            .with("comment", "")
    }

    fn credentials() -> Value {
        json!({"account_name": "ACC", "user": "u", "password": "p"})
    }

    async fn configured(executor: RecordingExecutor) -> (ProviderTester, Arc<RecordingExecutor>) {
        let executor = Arc::new(executor);
        let tester = ProviderTester::with_executor(executor.clone());
        tester.configure(credentials()).await.unwrap();
        (tester, executor)
    }

    #[test]
    fn test_recording_executor() {
        let executor = RecordingExecutor::new()
            .with_rows("SHOW ROLES", vec![analyst()])
            .with_failure("DROP ROLE \"R\"", "insufficient privileges");

        assert_eq!(tokio_test::block_on(executor.query("SHOW ROLES")).unwrap().len(), 1);
        assert!(tokio_test::block_on(executor.query("SHOW WAREHOUSES")).unwrap().is_empty());
        let err = tokio_test::block_on(executor.exec("DROP ROLE \"R\"")).unwrap_err();
        assert!(matches!(
            err,
            SdkError::Execution { ref message, .. } if message == "insufficient privileges"
        ));
        assert_eq!(
            executor.statements(),
            vec!["SHOW ROLES", "SHOW WAREHOUSES", "DROP ROLE \"R\""]
        );
    }

    #[tokio::test]
    async fn test_configure_ignores_environment() {
        let tester = ProviderTester::with_executor(Arc::new(RecordingExecutor::new()));
        let err = tester.configure(json!({"account_name": "ACC"})).await.unwrap_err();
        match err {
            TestError::Diagnostics(diags) => assert_eq!(diags.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_plan_create_and_replace() {
        let tester = ProviderTester::with_executor(Arc::new(RecordingExecutor::new()));

        let plan = tester
            .plan_create("snowflake_database_role", json!({"database": "DB", "name": "R"}))
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["owner"], Value::Null);

        let prior = json!({"database": "DB", "name": "R", "owner": "SYSADMIN"});
        let plan = tester
            .plan_update(
                "snowflake_database_role",
                prior.clone(),
                json!({"database": "DB2", "name": "R"}),
            )
            .await
            .unwrap();
        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "database");

        let plan = tester
            .plan_update("snowflake_database_role", prior, json!({"database": "DB", "name": "R"}))
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
        assert_plan_updates_in_place(&plan);
    }

    #[tokio::test]
    async fn test_lifecycle_crud() {
        let executor = RecordingExecutor::new().with_rows(SHOW_ANALYST, vec![analyst()]);
        let (tester, _) = configured(executor).await;

        let state = tester
            .lifecycle_crud(
                "snowflake_account_role",
                json!({"name": "ANALYST"}),
                json!({"name": "ANALYST", "comment": "reads"}),
            )
            .await
            .unwrap();

        assert_eq!(state["name"], "ANALYST");
        assert_eq!(
            tester.statements(),
            vec![
                r#"CREATE ROLE "ANALYST""#,
                SHOW_ANALYST,
                SHOW_ANALYST,
                r#"ALTER ROLE "ANALYST" SET COMMENT = 'reads'"#,
                SHOW_ANALYST,
                SHOW_ANALYST,
                r#"DROP ROLE IF EXISTS "ANALYST""#,
            ]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_update_refuses_replacement() {
        let (tester, executor) = configured(RecordingExecutor::new()).await;
        let err = tester
            .lifecycle_update(
                "snowflake_database_role",
                json!({"database": "DB", "name": "R"}),
                json!({"database": "OTHER", "name": "R"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_surfaces_execution_error() {
        let (tester, _) = configured(
            RecordingExecutor::new().with_failure(r#"CREATE ROLE "ANALYST""#, "already exists"),
        )
        .await;
        let err = tester
            .create("snowflake_account_role", json!({"name": "ANALYST"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Sdk(ref msg) if msg.contains("already exists")));
    }

    #[tokio::test]
    async fn test_import_and_data_source() {
        let executor = RecordingExecutor::new().with_rows(SHOW_ANALYST, vec![analyst()]);
        let (tester, _) = configured(executor).await;

        let imported = tester.import_resource("snowflake_account_role", "ANALYST").await.unwrap();
        assert_eq!(imported.resource_type, "snowflake_account_role");
        assert_eq!(imported.state["owner"], "USERADMIN");

        tester
            .validate_data_source_config("snowflake_warehouses", json!({"like": "ETL%"}))
            .await
            .unwrap();
        let listed = tester.read_data_source("snowflake_warehouses", json!({})).await.unwrap();
        assert_eq!(listed["warehouses"], json!([]));
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("name is required")];
        assert_has_errors(&diagnostics);
        assert_error_contains(&diagnostics, "required");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = err.to_string();
        assert!(display.contains("First error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
