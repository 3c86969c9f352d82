//! SQL execution collaborator and the client facade.
//!
//! The crate never talks to the database itself. A driver is plugged in by
//! implementing [`SqlExecutor`]; the [`Client`] wraps it and hands out one
//! handle per object kind.
//!
//! # Example
//!
//! ```ignore
//! use snowflake_provider_sdk::client::Client;
//! use snowflake_provider_sdk::identifiers::AccountObjectIdentifier;
//! use snowflake_provider_sdk::objects::warehouse::CreateWarehouseOptions;
//!
//! let client = Client::new(my_executor);
//! let id = AccountObjectIdentifier::new("WH1");
//! client
//!     .warehouses()
//!     .create(&CreateWarehouseOptions::new(id.clone()).with_comment("etl"))
//!     .await?;
//! let wh = client.warehouses().show_by_id(&id).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{SdkError, SdkResult};
use crate::identifiers::{ObjectIdentifier, ObjectType};
use crate::objects::database::Databases;
use crate::objects::database_role::DatabaseRoles;
use crate::objects::function::Functions;
use crate::objects::role::Roles;
use crate::objects::schema::Schemas;
use crate::objects::stream::Streams;
use crate::objects::warehouse::Warehouses;
use crate::row::{map_rows, FromRow, Row};
use crate::sql::{self, ToSql};
use crate::validation::Validate;

/// The SQL driver the layer delegates to.
///
/// Connection pooling, retries and cancellation all belong to the implementor.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a statement whose result set is not needed.
    async fn exec(&self, statement: &str) -> SdkResult<()>;

    /// Run a statement and return every row.
    async fn query(&self, statement: &str) -> SdkResult<Vec<Row>>;
}

/// Entry point to the typed SQL layer.
#[derive(Clone)]
pub struct Client {
    executor: Arc<dyn SqlExecutor>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Wrap an executor.
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }

    /// Validate, render and execute an options struct.
    #[instrument(level = "debug", skip_all)]
    pub async fn exec_opts<T: ToSql + Validate>(&self, opts: Option<&T>) -> SdkResult<()> {
        let statement = sql::build(opts)?;
        self.exec(&statement).await
    }

    /// Validate, render and query with an options struct, mapping every row.
    #[instrument(level = "debug", skip_all)]
    pub async fn query_opts<T, R>(&self, opts: Option<&T>) -> SdkResult<Vec<R>>
    where
        T: ToSql + Validate,
        R: FromRow,
    {
        let statement = sql::build(opts)?;
        let rows = self.query(&statement).await?;
        debug!(rows = rows.len(), "query returned");
        map_rows(&rows)
    }

    /// Execute a raw statement.
    pub async fn exec(&self, statement: &str) -> SdkResult<()> {
        debug!(%statement, "executing");
        self.executor.exec(statement).await
    }

    /// Query with a raw statement.
    pub async fn query(&self, statement: &str) -> SdkResult<Vec<Row>> {
        debug!(%statement, "querying");
        self.executor.query(statement).await
    }

    /// Database roles.
    pub fn database_roles(&self) -> DatabaseRoles<'_> {
        DatabaseRoles::new(self)
    }

    /// Account roles.
    pub fn roles(&self) -> Roles<'_> {
        Roles::new(self)
    }

    /// Warehouses.
    pub fn warehouses(&self) -> Warehouses<'_> {
        Warehouses::new(self)
    }

    /// Databases.
    pub fn databases(&self) -> Databases<'_> {
        Databases::new(self)
    }

    /// Schemas.
    pub fn schemas(&self) -> Schemas<'_> {
        Schemas::new(self)
    }

    /// Streams.
    pub fn streams(&self) -> Streams<'_> {
        Streams::new(self)
    }

    /// User-defined functions.
    pub fn functions(&self) -> Functions<'_> {
        Functions::new(self)
    }
}

/// Pick the single row whose name matches exactly.
///
/// `SHOW ... LIKE` patterns treat `_` and `%` as wildcards, so the result may
/// hold near misses; only an exact name match counts.
pub(crate) fn find_exact<T, F>(items: Vec<T>, name_of: F, name: &str) -> Option<T>
where
    F: Fn(&T) -> &str,
{
    items.into_iter().find(|item| name_of(item) == name)
}

pub(crate) fn not_found(object_type: ObjectType, id: &impl ObjectIdentifier) -> SdkError {
    SdkError::ObjectNotFound {
        object_type,
        id: id.fully_qualified_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;

    struct Named(String);

    impl FromRow for Named {
        fn from_row(row: &Row) -> SdkResult<Self> {
            Ok(Named(row.string("name")?))
        }
    }

    struct ShowThings;

    impl ToSql for ShowThings {
        fn clauses(&self) -> sql::StatementBuilder {
            sql::StatementBuilder::new().static_keyword("SHOW THINGS")
        }
    }

    impl Validate for ShowThings {
        fn validate(&self) -> SdkResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_exec_opts_records_statement() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor.clone());
        client.exec_opts(Some(&ShowThings)).await.unwrap();
        assert_eq!(executor.statements(), vec!["SHOW THINGS".to_string()]);
    }

    #[tokio::test]
    async fn test_exec_opts_rejects_nil_options_without_executing() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::new(executor.clone());
        let err = client.exec_opts::<ShowThings>(None).await.unwrap_err();
        assert!(matches!(err, SdkError::NilOptions));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_query_opts_maps_rows() {
        let executor = Arc::new(RecordingExecutor::new().with_rows(
            "SHOW THINGS",
            vec![Row::new().with("NAME", "a"), Row::new().with("NAME", "b")],
        ));
        let client = Client::new(executor);
        let things: Vec<Named> = client.query_opts(Some(&ShowThings)).await.unwrap();
        assert_eq!(things.iter().map(|t| t.0.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_find_exact_ignores_wildcard_matches() {
        let names = vec!["ROLE_1".to_string(), "ROLEX1".to_string()];
        assert_eq!(
            find_exact(names.clone(), |n| n.as_str(), "ROLEX1"),
            Some("ROLEX1".to_string())
        );
        assert_eq!(find_exact(names, |n| n.as_str(), "ROLE"), None);
    }
}
