//! Streams on tables: `CREATE/ALTER/DROP/SHOW STREAM`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    set_tags, sql_enum, unset_tags, validate_tags, with_tags, In, Like, LimitFrom, TagAssociation,
};
use crate::client::{find_exact, not_found, Client};
use crate::error::SdkResult;
use crate::identifiers::{ObjectIdentifier, ObjectType, SchemaObjectIdentifier};
use crate::row::{FromRow, Row};
use crate::sql::{ParameterOptions, StatementBuilder, ToSql};
use crate::validation::{flag, Validate, Validator};

sql_enum! {
    /// The `mode` column of `SHOW STREAMS`.
    pub enum StreamMode {
        /// Tracks inserts, updates and deletes.
        Default => "DEFAULT",
        /// Tracks inserts only.
        AppendOnly => "APPEND_ONLY",
        /// Tracks inserts only, for external tables.
        InsertOnly => "INSERT_ONLY",
    }
}

/// `CREATE [OR REPLACE] STREAM [IF NOT EXISTS] <name> [COPY GRANTS] ON TABLE <table> ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStreamOnTableOptions {
    /// `OR REPLACE`: replace an existing object of the same name.
    pub or_replace: Option<bool>,
    /// `IF NOT EXISTS`: succeed without changes when the object exists.
    pub if_not_exists: Option<bool>,
    /// Object to act on.
    pub name: SchemaObjectIdentifier,
    /// `COPY GRANTS`: keep the grants of the replaced stream.
    pub copy_grants: Option<bool>,
    /// The table the stream tracks.
    pub table_id: SchemaObjectIdentifier,
    /// `APPEND_ONLY`: record inserts only.
    pub append_only: Option<bool>,
    /// `SHOW_INITIAL_ROWS`: return the existing rows on first read.
    pub show_initial_rows: Option<bool>,
    /// `COMMENT`
    pub comment: Option<String>,
    /// `WITH TAG (...)`
    pub tag: Option<Vec<TagAssociation>>,
}

impl CreateStreamOnTableOptions {
    /// Track `table_id` in a stream called `name`.
    pub fn new(name: SchemaObjectIdentifier, table_id: SchemaObjectIdentifier) -> Self {
        Self {
            or_replace: None,
            if_not_exists: None,
            name,
            copy_grants: None,
            table_id,
            append_only: None,
            show_initial_rows: None,
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

    /// See [`copy_grants`](Self::copy_grants).
    pub fn with_copy_grants(mut self, copy_grants: bool) -> Self {
        self.copy_grants = Some(copy_grants);
        self
    }

    /// See [`append_only`](Self::append_only).
    pub fn with_append_only(mut self, append_only: bool) -> Self {
        self.append_only = Some(append_only);
        self
    }

    /// See [`show_initial_rows`](Self::show_initial_rows).
    pub fn with_show_initial_rows(mut self, show: bool) -> Self {
        self.show_initial_rows = Some(show);
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

impl ToSql for CreateStreamOnTableOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("CREATE")
            .keyword(self.or_replace, "OR REPLACE")
            .static_keyword("STREAM")
            .keyword(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.name);
        with_tags(builder, self.tag.as_ref())
            .keyword(self.copy_grants, "COPY GRANTS")
            .static_keyword("ON TABLE")
            .identifier(&self.table_id)
            .parameter("APPEND_ONLY", self.append_only, ParameterOptions::bare())
            .parameter("SHOW_INITIAL_ROWS", self.show_initial_rows, ParameterOptions::bare())
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes())
    }
}

impl Validate for CreateStreamOnTableOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("CreateStreamOnTableOptions")
            .valid_identifier("name", &self.name)
            .valid_identifier("table_id", &self.table_id)
            .conflicting_fields(&[
                ("OrReplace", flag(self.or_replace)),
                ("IfNotExists", flag(self.if_not_exists)),
            ]);
        validate_tags(validator, "tag", self.tag.as_ref()).finish()
    }
}

/// `ALTER STREAM [IF EXISTS] <name> { SET COMMENT | UNSET COMMENT | SET TAG | UNSET TAG } ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterStreamOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: SchemaObjectIdentifier,
    /// `SET COMMENT = '...'`
    pub set_comment: Option<String>,
    /// `UNSET COMMENT`
    pub unset_comment: Option<bool>,
    /// `SET TAG ...`
    pub set_tags: Option<Vec<TagAssociation>>,
    /// `UNSET TAG ...`
    pub unset_tags: Option<Vec<SchemaObjectIdentifier>>,
}

impl AlterStreamOptions {
    /// Start an `ALTER` of `name`; add exactly one action.
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            if_exists: None,
            name,
            set_comment: None,
            unset_comment: None,
            set_tags: None,
            unset_tags: None,
        }
    }

    /// See [`if_exists`](Self::if_exists).
    pub fn with_if_exists(mut self, if_exists: bool) -> Self {
        self.if_exists = Some(if_exists);
        self
    }

    /// See [`set_comment`](Self::set_comment).
    pub fn with_set_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment = Some(comment.into());
        self
    }

    /// See [`unset_comment`](Self::unset_comment).
    pub fn with_unset_comment(mut self, unset: bool) -> Self {
        self.unset_comment = Some(unset);
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

impl ToSql for AlterStreamOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("ALTER STREAM")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .parameter(
                "SET COMMENT",
                self.set_comment.as_ref(),
                ParameterOptions::single_quotes(),
            )
            .keyword(self.unset_comment, "UNSET COMMENT");
        unset_tags(set_tags(builder, self.set_tags.as_ref()), self.unset_tags.as_ref())
    }
}

impl Validate for AlterStreamOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("AlterStreamOptions")
            .valid_identifier("name", &self.name)
            .exactly_one_of(&[
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", flag(self.unset_comment)),
                ("SetTags", self.set_tags.is_some()),
                ("UnsetTags", self.unset_tags.is_some()),
            ]);
        validate_tags(validator, "set_tags", self.set_tags.as_ref()).finish()
    }
}

/// `DROP STREAM [IF EXISTS] <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStreamOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: SchemaObjectIdentifier,
}

impl DropStreamOptions {
    /// Drop `name`.
    pub fn new(name: SchemaObjectIdentifier) -> Self {
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

impl ToSql for DropStreamOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP STREAM")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
    }
}

impl Validate for DropStreamOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropStreamOptions")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// `SHOW [TERSE] STREAMS [LIKE '...'] [IN ...] [STARTS WITH '...'] [LIMIT ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowStreamOptions {
    /// `TERSE`: return only the basic columns.
    pub terse: Option<bool>,
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
    /// `IN ACCOUNT | DATABASE <db> | SCHEMA <schema>`
    pub in_scope: Option<In>,
    /// `STARTS WITH '<prefix>'`, case-sensitive.
    pub starts_with: Option<String>,
    /// `LIMIT <rows> [FROM '<name>']`
    pub limit: Option<LimitFrom>,
}

impl ShowStreamOptions {
    /// `SHOW STREAMS` without filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`terse`](Self::terse).
    pub fn with_terse(mut self, terse: bool) -> Self {
        self.terse = Some(terse);
        self
    }

    /// See [`like`](Self::like).
    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    /// See [`in_scope`](Self::in_scope).
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

impl ToSql for ShowStreamOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW")
            .keyword(self.terse, "TERSE")
            .static_keyword("STREAMS")
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

impl Validate for ShowStreamOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("ShowStreamOptions")
            .nested("In", self.in_scope.as_ref())
            .finish()
    }
}

/// One row of `SHOW STREAMS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Object name as stored.
    pub name: String,
    /// Parent database.
    pub database_name: String,
    /// Parent schema.
    pub schema_name: String,
    /// Owning role.
    pub owner: Option<String>,
    /// Comment; empty text when none was set.
    pub comment: Option<String>,
    /// Fully qualified source table.
    pub table_name: Option<String>,
    /// `Table`, `View` or `External Table`.
    pub source_type: Option<String>,
    /// Tables the source reads from.
    pub base_tables: Vec<String>,
    /// Always `DELTA` today.
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    /// Offset is past the source retention; reads fail.
    pub stale: Option<bool>,
    /// Change tracking mode.
    pub mode: Option<StreamMode>,
    /// When the stream becomes stale unless read.
    pub stale_after: Option<DateTime<Utc>>,
    /// Why the stream cannot be read; `None` when it can.
    pub invalid_reason: Option<String>,
    /// `ROLE` or `DATABASE_ROLE`.
    pub owner_role_type: Option<String>,
}

impl Stream {
    /// The identifier this row describes.
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(
            self.database_name.clone(),
            self.schema_name.clone(),
            self.name.clone(),
        )
    }

    /// Records inserts only.
    pub fn is_append_only(&self) -> bool {
        self.mode == Some(StreamMode::AppendOnly)
    }
}

impl FromRow for Stream {
    fn from_row(row: &Row) -> SdkResult<Self> {
        let base_tables = row
            .optional_string("base_tables")
            .map(|tables| {
                tables
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.optional_non_empty_string("owner"),
            comment: row.optional_string("comment"),
            table_name: row.optional_non_empty_string("table_name"),
            source_type: row.optional_non_empty_string("source_type"),
            base_tables,
            stream_type: row.optional_non_empty_string("type"),
            stale: row.optional_bool("stale")?,
            mode: row.optional_parse("mode")?,
            stale_after: row.optional_timestamp("stale_after")?,
            invalid_reason: row
                .optional_non_empty_string("invalid_reason")
                .filter(|reason| reason != "N/A"),
            owner_role_type: row.optional_non_empty_string("owner_role_type"),
        })
    }
}

/// Stream operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Streams<'a> {
    client: &'a Client,
}

impl<'a> Streams<'a> {
    /// Borrow `client` for stream operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `CREATE STREAM ... ON TABLE`.
    pub async fn create_on_table(&self, opts: &CreateStreamOnTableOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `ALTER`.
    pub async fn alter(&self, opts: &AlterStreamOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropStreamOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `SHOW` and map every row.
    pub async fn show(&self, opts: &ShowStreamOptions) -> SdkResult<Vec<Stream>> {
        self.client.query_opts(Some(opts)).await
    }

    /// Find one object by identifier.
    ///
    /// Fails with [`SdkError::NotFound`](crate::error::SdkError::NotFound) when absent.
    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SdkResult<Stream> {
        let opts = ShowStreamOptions::new()
            .with_like(Like::new(id.name()))
            .with_in(In::Schema(id.schema_id()));
        let streams = self.show(&opts).await?;
        find_exact(streams, |s| s.name.as_str(), id.name())
            .ok_or_else(|| not_found(ObjectType::Stream, id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::SdkError;
    use crate::testing::RecordingExecutor;

    fn stream_id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("DB", "RAW", "ORDERS_STREAM")
    }

    fn table_id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("DB", "RAW", "ORDERS")
    }

    #[test]
    fn test_create_on_table() {
        let opts = CreateStreamOnTableOptions::new(stream_id(), table_id())
            .with_or_replace(true)
            .with_copy_grants(true)
            .with_append_only(true)
            .with_show_initial_rows(false)
            .with_comment("cdc");
        assert_eq!(
            crate::sql::build(Some(&opts)).unwrap(),
            concat!(
                r#"CREATE OR REPLACE STREAM "DB"."RAW"."ORDERS_STREAM" COPY GRANTS "#,
                r#"ON TABLE "DB"."RAW"."ORDERS" APPEND_ONLY = true SHOW_INITIAL_ROWS = false "#,
                r#"COMMENT = 'cdc'"#,
            )
        );

        let no_table = SchemaObjectIdentifier::new("DB", "RAW", "");
        let missing_table = CreateStreamOnTableOptions::new(stream_id(), no_table);
        assert!(matches!(
            missing_table.validate(),
            Err(SdkError::InvalidObjectIdentifier { ref field }) if field == "table_id"
        ));
    }

    #[test]
    fn test_alter() {
        let set = AlterStreamOptions::new(stream_id()).with_set_comment("new");
        assert_eq!(
            set.to_sql(),
            r#"ALTER STREAM "DB"."RAW"."ORDERS_STREAM" SET COMMENT = 'new'"#
        );

        let unset = AlterStreamOptions::new(stream_id())
            .with_if_exists(true)
            .with_unset_comment(true);
        assert_eq!(
            unset.to_sql(),
            r#"ALTER STREAM IF EXISTS "DB"."RAW"."ORDERS_STREAM" UNSET COMMENT"#
        );

        let none = AlterStreamOptions::new(stream_id());
        assert!(none.validate().is_err());
    }

    #[test]
    fn test_drop_and_show() {
        assert_eq!(
            DropStreamOptions::new(stream_id()).to_sql(),
            r#"DROP STREAM "DB"."RAW"."ORDERS_STREAM""#
        );
        assert_eq!(
            ShowStreamOptions::new()
                .with_like(Like::new("ORDERS%"))
                .with_in(In::Account)
                .to_sql(),
            "SHOW STREAMS LIKE 'ORDERS%' IN ACCOUNT"
        );
    }

    #[tokio::test]
    async fn test_show_by_id() {
        let row = Row::new()
            .with("created_on", "2024-01-01T00:00:00Z")
            .with("name", "ORDERS_STREAM")
            .with("database_name", "DB")
            .with("schema_name", "RAW")
            .with("table_name", "DB.RAW.ORDERS")
            .with("source_type", "Table")
            .with("base_tables", "DB.RAW.ORDERS")
            .with("type", "DELTA")
            .with("stale", "false")
            .with("mode", "APPEND_ONLY")
            .with("stale_after", "2024-01-15 00:00:00.000 +0000")
            .with("invalid_reason", "N/A");
        let executor = Arc::new(RecordingExecutor::new().with_rows(
            r#"SHOW STREAMS LIKE 'ORDERS_STREAM' IN SCHEMA "DB"."RAW""#,
            vec![row],
        ));
        let client = Client::new(executor);

        let stream = client.streams().show_by_id(&stream_id()).await.unwrap();
        assert_eq!(stream.id(), stream_id());
        assert!(stream.is_append_only());
        assert_eq!(stream.base_tables, vec!["DB.RAW.ORDERS".to_string()]);
        assert_eq!(stream.stale, Some(false));
        assert_eq!(stream.invalid_reason, None);
    }
}
