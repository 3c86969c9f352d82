//! Warehouses: `CREATE/ALTER/DROP/SHOW/DESCRIBE WAREHOUSE`.
//!
//! Warehouse properties are split between [`CreateWarehouseOptions`], which
//! sets them at creation time, and [`WarehouseSet`] / [`WarehouseUnset`],
//! which change them later. Cluster counts and the query acceleration scale
//! factor are range-checked before anything is sent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use super::{
    set_flags, set_tags, sql_enum, unset_tags, validate_tags, with_tags, Like, TagAssociation,
};
use crate::client::{find_exact, not_found, Client};
use crate::error::{SdkError, SdkResult};
use crate::identifiers::{
    AccountObjectIdentifier, ObjectIdentifier, ObjectType, SchemaObjectIdentifier,
};
use crate::row::{FromRow, Row};
use crate::sql::{ListOptions, ParameterOptions, StatementBuilder, ToSql};
use crate::validation::{flag, Validate, Validator};

sql_enum! {
    /// `WAREHOUSE_TYPE`
    pub enum WarehouseType {
        /// General purpose compute.
        Standard => "STANDARD",
        /// Memory-heavy compute for Snowpark workloads.
        SnowparkOptimized => "SNOWPARK-OPTIMIZED" | "SNOWPARK_OPTIMIZED",
    }
}

sql_enum! {
    /// `WAREHOUSE_SIZE`, accepting the display spellings `SHOW` returns.
    pub enum WarehouseSize {
        /// 1 credit per hour.
        XSmall => "XSMALL" | "X-SMALL",
        /// 2 credits per hour.
        Small => "SMALL",
        /// 4 credits per hour.
        Medium => "MEDIUM",
        /// 8 credits per hour.
        Large => "LARGE",
        /// 16 credits per hour.
        XLarge => "XLARGE" | "X-LARGE",
        /// 32 credits per hour.
        XXLarge => "XXLARGE" | "X2LARGE" | "2X-LARGE",
        /// 64 credits per hour.
        XXXLarge => "XXXLARGE" | "X3LARGE" | "3X-LARGE",
        /// 128 credits per hour.
        X4Large => "X4LARGE" | "4X-LARGE",
        /// 256 credits per hour.
        X5Large => "X5LARGE" | "5X-LARGE",
        /// 512 credits per hour.
        X6Large => "X6LARGE" | "6X-LARGE",
    }
}

sql_enum! {
    /// `SCALING_POLICY` for multi-cluster warehouses.
    pub enum ScalingPolicy {
        /// Start clusters eagerly.
        Standard => "STANDARD",
        /// Start clusters only under sustained load.
        Economy => "ECONOMY",
    }
}

sql_enum! {
    /// The `state` column of `SHOW WAREHOUSES`.
    pub enum WarehouseState {
        /// Running.
        Started => "STARTED",
        /// Suspended.
        Suspended => "SUSPENDED",
        /// Changing size.
        Resizing => "RESIZING",
        /// On its way to suspended.
        Suspending => "SUSPENDING",
    }
}

const MAX_QUERY_ACCELERATION_SCALE_FACTOR: u32 = 100;

fn check_ranges(
    validator: Validator,
    structure: &'static str,
    min_cluster_count: Option<u32>,
    max_cluster_count: Option<u32>,
    scale_factor: Option<u32>,
) -> Validator {
    let inverted = matches!(
        (min_cluster_count, max_cluster_count),
        (Some(min), Some(max)) if min > max
    );
    let out_of_range = scale_factor.is_some_and(|f| f > MAX_QUERY_ACCELERATION_SCALE_FACTOR);
    validator
        .check(inverted, || SdkError::Invalid {
            structure: structure.to_string(),
            reason: "MinClusterCount must not exceed MaxClusterCount".to_string(),
        })
        .check(out_of_range, || SdkError::Invalid {
            structure: structure.to_string(),
            reason: format!(
                "QueryAccelerationMaxScaleFactor must be between 0 and {}",
                MAX_QUERY_ACCELERATION_SCALE_FACTOR
            ),
        })
}

/// `CREATE [OR REPLACE] WAREHOUSE [IF NOT EXISTS] <name>`
/// `[<properties>] [<params>] [WITH TAG (...)]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateWarehouseOptions {
    /// `OR REPLACE`: replace an existing object of the same name.
    pub or_replace: Option<bool>,
    /// `IF NOT EXISTS`: succeed without changes when the object exists.
    pub if_not_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,

    /// `WAREHOUSE_TYPE`
    pub warehouse_type: Option<WarehouseType>,
    /// `WAREHOUSE_SIZE`
    pub warehouse_size: Option<WarehouseSize>,
    /// `MAX_CLUSTER_COUNT`, 1 to 10.
    pub max_cluster_count: Option<u32>,
    /// `MIN_CLUSTER_COUNT`, at most `MAX_CLUSTER_COUNT`.
    pub min_cluster_count: Option<u32>,
    /// `SCALING_POLICY`
    pub scaling_policy: Option<ScalingPolicy>,
    /// `AUTO_SUSPEND`: idle seconds before suspending; 0 never suspends.
    pub auto_suspend: Option<u32>,
    /// `AUTO_RESUME`
    pub auto_resume: Option<bool>,
    /// `INITIALLY_SUSPENDED`: create without starting.
    pub initially_suspended: Option<bool>,
    /// `RESOURCE_MONITOR`
    pub resource_monitor: Option<AccountObjectIdentifier>,
    /// `COMMENT`
    pub comment: Option<String>,
    /// `ENABLE_QUERY_ACCELERATION`
    pub enable_query_acceleration: Option<bool>,
    /// `QUERY_ACCELERATION_MAX_SCALE_FACTOR`, 0 to 100.
    pub query_acceleration_max_scale_factor: Option<u32>,

    /// `MAX_CONCURRENCY_LEVEL`
    pub max_concurrency_level: Option<u32>,
    /// `STATEMENT_QUEUED_TIMEOUT_IN_SECONDS`
    pub statement_queued_timeout_in_seconds: Option<u32>,
    /// `STATEMENT_TIMEOUT_IN_SECONDS`
    pub statement_timeout_in_seconds: Option<u32>,
    /// `WITH TAG (...)`
    pub tag: Option<Vec<TagAssociation>>,
}

impl CreateWarehouseOptions {
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

    /// See [`if_not_exists`](Self::if_not_exists).
    pub fn with_if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = Some(if_not_exists);
        self
    }

    /// See [`warehouse_type`](Self::warehouse_type).
    pub fn with_warehouse_type(mut self, warehouse_type: WarehouseType) -> Self {
        self.warehouse_type = Some(warehouse_type);
        self
    }

    /// See [`warehouse_size`](Self::warehouse_size).
    pub fn with_warehouse_size(mut self, size: WarehouseSize) -> Self {
        self.warehouse_size = Some(size);
        self
    }

    /// Both cluster bounds at once.
    pub fn with_cluster_count(mut self, min: u32, max: u32) -> Self {
        self.min_cluster_count = Some(min);
        self.max_cluster_count = Some(max);
        self
    }

    /// See [`scaling_policy`](Self::scaling_policy).
    pub fn with_scaling_policy(mut self, policy: ScalingPolicy) -> Self {
        self.scaling_policy = Some(policy);
        self
    }

    /// See [`auto_suspend`](Self::auto_suspend).
    pub fn with_auto_suspend(mut self, seconds: u32) -> Self {
        self.auto_suspend = Some(seconds);
        self
    }

    /// See [`auto_resume`](Self::auto_resume).
    pub fn with_auto_resume(mut self, auto_resume: bool) -> Self {
        self.auto_resume = Some(auto_resume);
        self
    }

    /// See [`initially_suspended`](Self::initially_suspended).
    pub fn with_initially_suspended(mut self, suspended: bool) -> Self {
        self.initially_suspended = Some(suspended);
        self
    }

    /// See [`resource_monitor`](Self::resource_monitor).
    pub fn with_resource_monitor(mut self, monitor: AccountObjectIdentifier) -> Self {
        self.resource_monitor = Some(monitor);
        self
    }

    /// See [`comment`](Self::comment).
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Enable or disable query acceleration, optionally with a scale factor cap.
    pub fn with_query_acceleration(mut self, enabled: bool, max_scale_factor: Option<u32>) -> Self {
        self.enable_query_acceleration = Some(enabled);
        self.query_acceleration_max_scale_factor = max_scale_factor;
        self
    }

    /// See [`max_concurrency_level`](Self::max_concurrency_level).
    pub fn with_max_concurrency_level(mut self, level: u32) -> Self {
        self.max_concurrency_level = Some(level);
        self
    }

    /// Queue and execution timeouts, in seconds.
    pub fn with_statement_timeouts(mut self, queued: Option<u32>, running: Option<u32>) -> Self {
        self.statement_queued_timeout_in_seconds = queued;
        self.statement_timeout_in_seconds = running;
        self
    }

    /// See [`tag`](Self::tag).
    pub fn with_tag(mut self, tag: Vec<TagAssociation>) -> Self {
        self.tag = Some(tag);
        self
    }
}

impl ToSql for CreateWarehouseOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("CREATE")
            .keyword(self.or_replace, "OR REPLACE")
            .static_keyword("WAREHOUSE")
            .keyword(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.name)
            .parameter("WAREHOUSE_TYPE", self.warehouse_type, ParameterOptions::single_quotes())
            .parameter("WAREHOUSE_SIZE", self.warehouse_size, ParameterOptions::bare())
            .parameter("MAX_CLUSTER_COUNT", self.max_cluster_count, ParameterOptions::bare())
            .parameter("MIN_CLUSTER_COUNT", self.min_cluster_count, ParameterOptions::bare())
            .parameter("SCALING_POLICY", self.scaling_policy, ParameterOptions::bare())
            .parameter("AUTO_SUSPEND", self.auto_suspend, ParameterOptions::bare())
            .parameter("AUTO_RESUME", self.auto_resume, ParameterOptions::bare())
            .parameter("INITIALLY_SUSPENDED", self.initially_suspended, ParameterOptions::bare())
            .parameter(
                "RESOURCE_MONITOR",
                self.resource_monitor.as_ref().map(ObjectIdentifier::fully_qualified_name),
                ParameterOptions::bare(),
            )
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes())
            .parameter(
                "ENABLE_QUERY_ACCELERATION",
                self.enable_query_acceleration,
                ParameterOptions::bare(),
            )
            .parameter(
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor,
                ParameterOptions::bare(),
            )
            .parameter(
                "MAX_CONCURRENCY_LEVEL",
                self.max_concurrency_level,
                ParameterOptions::bare(),
            )
            .parameter(
                "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
                self.statement_queued_timeout_in_seconds,
                ParameterOptions::bare(),
            )
            .parameter(
                "STATEMENT_TIMEOUT_IN_SECONDS",
                self.statement_timeout_in_seconds,
                ParameterOptions::bare(),
            );
        with_tags(builder, self.tag.as_ref())
    }
}

impl Validate for CreateWarehouseOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("CreateWarehouseOptions")
            .valid_identifier("name", &self.name)
            .valid_optional_identifier("resource_monitor", self.resource_monitor.as_ref())
            .conflicting_fields(&[
                ("OrReplace", flag(self.or_replace)),
                ("IfNotExists", flag(self.if_not_exists)),
            ]);
        let validator = check_ranges(
            validator,
            "CreateWarehouseOptions",
            self.min_cluster_count,
            self.max_cluster_count,
            self.query_acceleration_max_scale_factor,
        );
        validate_tags(validator, "tag", self.tag.as_ref()).finish()
    }
}

/// `ALTER WAREHOUSE [IF EXISTS] <name> <action>`
///
/// Exactly one action may be given per statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterWarehouseOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,

    /// `SUSPEND`
    pub suspend: Option<bool>,
    /// `RESUME`
    pub resume: Option<bool>,
    /// `IF SUSPENDED`; only with `RESUME`.
    pub if_suspended: Option<bool>,
    /// `ABORT ALL QUERIES`
    pub abort_all_queries: Option<bool>,
    /// `RENAME TO <name>`
    pub rename_to: Option<AccountObjectIdentifier>,
    /// `SET <properties>`
    pub set: Option<WarehouseSet>,
    /// `UNSET <properties>`
    pub unset: Option<WarehouseUnset>,
    /// `SET TAG ...`
    pub set_tags: Option<Vec<TagAssociation>>,
    /// `UNSET TAG ...`
    pub unset_tags: Option<Vec<SchemaObjectIdentifier>>,
}

impl AlterWarehouseOptions {
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

    /// `SUSPEND`
    pub fn suspend(mut self) -> Self {
        self.suspend = Some(true);
        self
    }

    /// `RESUME`, optionally only `IF SUSPENDED`.
    pub fn resume(mut self, if_suspended: bool) -> Self {
        self.resume = Some(true);
        self.if_suspended = Some(if_suspended);
        self
    }

    /// `ABORT ALL QUERIES`
    pub fn abort_all_queries(mut self) -> Self {
        self.abort_all_queries = Some(true);
        self
    }

    /// See [`rename_to`](Self::rename_to).
    pub fn with_rename_to(mut self, name: AccountObjectIdentifier) -> Self {
        self.rename_to = Some(name);
        self
    }

    /// See [`set`](Self::set).
    pub fn with_set(mut self, set: WarehouseSet) -> Self {
        self.set = Some(set);
        self
    }

    /// See [`unset`](Self::unset).
    pub fn with_unset(mut self, unset: WarehouseUnset) -> Self {
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

impl ToSql for AlterWarehouseOptions {
    fn clauses(&self) -> StatementBuilder {
        let builder = StatementBuilder::new()
            .static_keyword("ALTER WAREHOUSE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
            .keyword(self.suspend, "SUSPEND")
            .keyword(self.resume, "RESUME")
            .keyword(self.if_suspended, "IF SUSPENDED")
            .keyword(self.abort_all_queries, "ABORT ALL QUERIES")
            .identifier_parameter("RENAME TO", self.rename_to.as_ref())
            .nested(Some("SET"), self.set.as_ref(), false)
            .nested(Some("UNSET"), self.unset.as_ref(), false);
        unset_tags(set_tags(builder, self.set_tags.as_ref()), self.unset_tags.as_ref())
    }
}

impl Validate for AlterWarehouseOptions {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("AlterWarehouseOptions")
            .valid_identifier("name", &self.name)
            .valid_optional_identifier("rename_to", self.rename_to.as_ref())
            .exactly_one_of(&[
                ("Suspend", flag(self.suspend)),
                ("Resume", flag(self.resume)),
                ("AbortAllQueries", flag(self.abort_all_queries)),
                ("RenameTo", self.rename_to.is_some()),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
                ("SetTags", self.set_tags.is_some()),
                ("UnsetTags", self.unset_tags.is_some()),
            ])
            .check(flag(self.if_suspended) && !flag(self.resume), || SdkError::Invalid {
                structure: "AlterWarehouseOptions".to_string(),
                reason: "IfSuspended can only be used with Resume".to_string(),
            })
            .nested("Set", self.set.as_ref())
            .nested("Unset", self.unset.as_ref());
        validate_tags(validator, "set_tags", self.set_tags.as_ref()).finish()
    }
}

/// The property list after `ALTER WAREHOUSE ... SET`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseSet {
    /// `WAREHOUSE_TYPE`
    pub warehouse_type: Option<WarehouseType>,
    /// `WAREHOUSE_SIZE`
    pub warehouse_size: Option<WarehouseSize>,
    /// Block until a resize has finished; only valid with a size.
    pub wait_for_completion: Option<bool>,
    /// `MAX_CLUSTER_COUNT`, 1 to 10.
    pub max_cluster_count: Option<u32>,
    /// `MIN_CLUSTER_COUNT`, at most `MAX_CLUSTER_COUNT`.
    pub min_cluster_count: Option<u32>,
    /// `SCALING_POLICY`
    pub scaling_policy: Option<ScalingPolicy>,
    /// `AUTO_SUSPEND`: idle seconds before suspending; 0 never suspends.
    pub auto_suspend: Option<u32>,
    /// `AUTO_RESUME`
    pub auto_resume: Option<bool>,
    /// `RESOURCE_MONITOR`
    pub resource_monitor: Option<AccountObjectIdentifier>,
    /// `COMMENT`
    pub comment: Option<String>,
    /// `ENABLE_QUERY_ACCELERATION`
    pub enable_query_acceleration: Option<bool>,
    /// `QUERY_ACCELERATION_MAX_SCALE_FACTOR`, 0 to 100.
    pub query_acceleration_max_scale_factor: Option<u32>,
    /// `MAX_CONCURRENCY_LEVEL`
    pub max_concurrency_level: Option<u32>,
    /// `STATEMENT_QUEUED_TIMEOUT_IN_SECONDS`
    pub statement_queued_timeout_in_seconds: Option<u32>,
    /// `STATEMENT_TIMEOUT_IN_SECONDS`
    pub statement_timeout_in_seconds: Option<u32>,
}

impl ToSql for WarehouseSet {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .parameter("WAREHOUSE_TYPE", self.warehouse_type, ParameterOptions::single_quotes())
            .parameter("WAREHOUSE_SIZE", self.warehouse_size, ParameterOptions::bare())
            .parameter("WAIT_FOR_COMPLETION", self.wait_for_completion, ParameterOptions::bare())
            .parameter("MAX_CLUSTER_COUNT", self.max_cluster_count, ParameterOptions::bare())
            .parameter("MIN_CLUSTER_COUNT", self.min_cluster_count, ParameterOptions::bare())
            .parameter("SCALING_POLICY", self.scaling_policy, ParameterOptions::bare())
            .parameter("AUTO_SUSPEND", self.auto_suspend, ParameterOptions::bare())
            .parameter("AUTO_RESUME", self.auto_resume, ParameterOptions::bare())
            .parameter(
                "RESOURCE_MONITOR",
                self.resource_monitor.as_ref().map(ObjectIdentifier::fully_qualified_name),
                ParameterOptions::bare(),
            )
            .parameter("COMMENT", self.comment.as_ref(), ParameterOptions::single_quotes())
            .parameter(
                "ENABLE_QUERY_ACCELERATION",
                self.enable_query_acceleration,
                ParameterOptions::bare(),
            )
            .parameter(
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor,
                ParameterOptions::bare(),
            )
            .parameter(
                "MAX_CONCURRENCY_LEVEL",
                self.max_concurrency_level,
                ParameterOptions::bare(),
            )
            .parameter(
                "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
                self.statement_queued_timeout_in_seconds,
                ParameterOptions::bare(),
            )
            .parameter(
                "STATEMENT_TIMEOUT_IN_SECONDS",
                self.statement_timeout_in_seconds,
                ParameterOptions::bare(),
            )
    }
}

impl Validate for WarehouseSet {
    fn validate(&self) -> SdkResult<()> {
        let validator = Validator::new("WarehouseSet")
            .valid_optional_identifier("resource_monitor", self.resource_monitor.as_ref())
            .at_least_one_of(&[
                ("WarehouseType", self.warehouse_type.is_some()),
                ("WarehouseSize", self.warehouse_size.is_some()),
                ("WaitForCompletion", self.wait_for_completion.is_some()),
                ("MaxClusterCount", self.max_cluster_count.is_some()),
                ("MinClusterCount", self.min_cluster_count.is_some()),
                ("ScalingPolicy", self.scaling_policy.is_some()),
                ("AutoSuspend", self.auto_suspend.is_some()),
                ("AutoResume", self.auto_resume.is_some()),
                ("ResourceMonitor", self.resource_monitor.is_some()),
                ("Comment", self.comment.is_some()),
                ("EnableQueryAcceleration", self.enable_query_acceleration.is_some()),
                (
                    "QueryAccelerationMaxScaleFactor",
                    self.query_acceleration_max_scale_factor.is_some(),
                ),
                ("MaxConcurrencyLevel", self.max_concurrency_level.is_some()),
                (
                    "StatementQueuedTimeoutInSeconds",
                    self.statement_queued_timeout_in_seconds.is_some(),
                ),
                ("StatementTimeoutInSeconds", self.statement_timeout_in_seconds.is_some()),
            ])
            .check(
                self.wait_for_completion.is_some() && self.warehouse_size.is_none(),
                || SdkError::Invalid {
                    structure: "WarehouseSet".to_string(),
                    reason: "WaitForCompletion can only be set together with WarehouseSize"
                        .to_string(),
                },
            );
        check_ranges(
            validator,
            "WarehouseSet",
            self.min_cluster_count,
            self.max_cluster_count,
            self.query_acceleration_max_scale_factor,
        )
        .finish()
    }
}

/// The property names after `ALTER WAREHOUSE ... UNSET`, reset to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseUnset {
    /// Reset `WAREHOUSE_TYPE`.
    pub warehouse_type: Option<bool>,
    /// Reset `MAX_CLUSTER_COUNT`.
    pub max_cluster_count: Option<bool>,
    /// Reset `MIN_CLUSTER_COUNT`.
    pub min_cluster_count: Option<bool>,
    /// Reset `SCALING_POLICY`.
    pub scaling_policy: Option<bool>,
    /// Reset `AUTO_SUSPEND`.
    pub auto_suspend: Option<bool>,
    /// Reset `AUTO_RESUME`.
    pub auto_resume: Option<bool>,
    /// Reset `RESOURCE_MONITOR`.
    pub resource_monitor: Option<bool>,
    /// Reset `COMMENT`.
    pub comment: Option<bool>,
    /// Reset `ENABLE_QUERY_ACCELERATION`.
    pub enable_query_acceleration: Option<bool>,
    /// Reset `QUERY_ACCELERATION_MAX_SCALE_FACTOR`.
    pub query_acceleration_max_scale_factor: Option<bool>,
    /// Reset `MAX_CONCURRENCY_LEVEL`.
    pub max_concurrency_level: Option<bool>,
    /// Reset `STATEMENT_QUEUED_TIMEOUT_IN_SECONDS`.
    pub statement_queued_timeout_in_seconds: Option<bool>,
    /// Reset `STATEMENT_TIMEOUT_IN_SECONDS`.
    pub statement_timeout_in_seconds: Option<bool>,
}

impl WarehouseUnset {
    fn properties(&self) -> [(&'static str, Option<bool>); 13] {
        [
            ("WAREHOUSE_TYPE", self.warehouse_type),
            ("MAX_CLUSTER_COUNT", self.max_cluster_count),
            ("MIN_CLUSTER_COUNT", self.min_cluster_count),
            ("SCALING_POLICY", self.scaling_policy),
            ("AUTO_SUSPEND", self.auto_suspend),
            ("AUTO_RESUME", self.auto_resume),
            ("RESOURCE_MONITOR", self.resource_monitor),
            ("COMMENT", self.comment),
            ("ENABLE_QUERY_ACCELERATION", self.enable_query_acceleration),
            (
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor,
            ),
            ("MAX_CONCURRENCY_LEVEL", self.max_concurrency_level),
            (
                "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
                self.statement_queued_timeout_in_seconds,
            ),
            ("STATEMENT_TIMEOUT_IN_SECONDS", self.statement_timeout_in_seconds),
        ]
    }
}

impl ToSql for WarehouseUnset {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new().list(None, set_flags(&self.properties()), ListOptions::bare())
    }
}

impl Validate for WarehouseUnset {
    fn validate(&self) -> SdkResult<()> {
        let properties = self.properties();
        let fields: Vec<(&str, bool)> = properties
            .iter()
            .map(|(name, value)| (*name, flag(*value)))
            .collect();
        Validator::new("WarehouseUnset")
            .at_least_one_of(&fields)
            .finish()
    }
}

/// `DROP WAREHOUSE [IF EXISTS] <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropWarehouseOptions {
    /// `IF EXISTS`: succeed without changes when the object is missing.
    pub if_exists: Option<bool>,
    /// Object to act on.
    pub name: AccountObjectIdentifier,
}

impl DropWarehouseOptions {
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

impl ToSql for DropWarehouseOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DROP WAREHOUSE")
            .keyword(self.if_exists, "IF EXISTS")
            .identifier(&self.name)
    }
}

impl Validate for DropWarehouseOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DropWarehouseOptions")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// `SHOW WAREHOUSES [LIKE '<pattern>']`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowWarehouseOptions {
    /// `LIKE '<pattern>'`
    pub like: Option<Like>,
}

impl ShowWarehouseOptions {
    /// `SHOW WAREHOUSES` without a filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`like`](Self::like).
    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }
}

impl ToSql for ShowWarehouseOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("SHOW WAREHOUSES")
            .nested(None, self.like.as_ref(), false)
    }
}

impl Validate for ShowWarehouseOptions {
    fn validate(&self) -> SdkResult<()> {
        Ok(())
    }
}

/// `DESCRIBE WAREHOUSE <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeWarehouseOptions {
    /// Object to act on.
    pub name: AccountObjectIdentifier,
}

impl ToSql for DescribeWarehouseOptions {
    fn clauses(&self) -> StatementBuilder {
        StatementBuilder::new()
            .static_keyword("DESCRIBE WAREHOUSE")
            .identifier(&self.name)
    }
}

impl Validate for DescribeWarehouseOptions {
    fn validate(&self) -> SdkResult<()> {
        Validator::new("DescribeWarehouseOptions")
            .valid_identifier("name", &self.name)
            .finish()
    }
}

/// One row of `SHOW WAREHOUSES`.
///
/// Only the name and creation time are guaranteed; the remaining columns
/// differ between editions and are left empty when missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warehouse {
    /// Warehouse name as stored.
    pub name: String,
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Run state.
    pub state: Option<WarehouseState>,
    /// Warehouse type.
    #[serde(rename = "type")]
    pub warehouse_type: Option<WarehouseType>,
    /// Compute size.
    pub size: Option<WarehouseSize>,
    /// Lower cluster bound.
    pub min_cluster_count: Option<i64>,
    /// Upper cluster bound.
    pub max_cluster_count: Option<i64>,
    /// Clusters currently running.
    pub started_clusters: Option<i64>,
    /// Statements executing.
    pub running: Option<i64>,
    /// Statements waiting.
    pub queued: Option<i64>,
    /// Default for the current user.
    pub is_default: Option<bool>,
    /// In use by the current session.
    pub is_current: Option<bool>,
    /// Idle seconds before suspending.
    pub auto_suspend: Option<i64>,
    /// Resumes on demand.
    pub auto_resume: Option<bool>,
    /// Percent of compute available.
    pub available: Option<f64>,
    /// Percent of compute provisioning.
    pub provisioning: Option<f64>,
    /// Percent of compute finishing queries before release.
    pub quiescing: Option<f64>,
    /// Percent of compute in other states.
    pub other: Option<f64>,
    /// Last resume.
    pub resumed_on: Option<DateTime<Utc>>,
    /// Last change.
    pub updated_on: Option<DateTime<Utc>>,
    /// Owning role.
    pub owner: Option<String>,
    /// Comment; empty text when none was set.
    pub comment: Option<String>,
    /// Query acceleration enabled.
    pub enable_query_acceleration: Option<bool>,
    /// Query acceleration cap.
    pub query_acceleration_max_scale_factor: Option<i64>,
    /// Attached resource monitor; `None` when there is none.
    pub resource_monitor: Option<String>,
    /// Multi-cluster scaling policy.
    pub scaling_policy: Option<ScalingPolicy>,
    /// `ROLE` or `DATABASE_ROLE`.
    pub owner_role_type: Option<String>,
}

impl Warehouse {
    /// The identifier this row describes.
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.name.clone())
    }
}

impl FromRow for Warehouse {
    fn from_row(row: &Row) -> SdkResult<Self> {
        Ok(Self {
            name: row.string("name")?,
            created_on: row.timestamp("created_on")?,
            state: row.optional_parse("state")?,
            warehouse_type: row.optional_parse("type")?,
            size: row.optional_parse("size")?,
            min_cluster_count: row.optional_int("min_cluster_count")?,
            max_cluster_count: row.optional_int("max_cluster_count")?,
            started_clusters: row.optional_int("started_clusters")?,
            running: row.optional_int("running")?,
            queued: row.optional_int("queued")?,
            is_default: row.optional_bool("is_default")?,
            is_current: row.optional_bool("is_current")?,
            auto_suspend: row.optional_int("auto_suspend")?,
            auto_resume: row.optional_bool("auto_resume")?,
            available: row.optional_float("available")?,
            provisioning: row.optional_float("provisioning")?,
            quiescing: row.optional_float("quiescing")?,
            other: row.optional_float("other")?,
            resumed_on: row.optional_timestamp("resumed_on")?,
            updated_on: row.optional_timestamp("updated_on")?,
            owner: row.optional_non_empty_string("owner"),
            comment: row.optional_string("comment"),
            enable_query_acceleration: row.optional_bool("enable_query_acceleration")?,
            query_acceleration_max_scale_factor: row
                .optional_int("query_acceleration_max_scale_factor")?,
            // `null` is spelled out as text when no monitor is attached.
            resource_monitor: row
                .optional_non_empty_string("resource_monitor")
                .filter(|m| !m.eq_ignore_ascii_case("null")),
            scaling_policy: row.optional_parse("scaling_policy")?,
            owner_role_type: row.optional_non_empty_string("owner_role_type"),
        })
    }
}

/// One property row of `DESCRIBE WAREHOUSE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseDetails {
    /// Creation time of the warehouse.
    pub created_on: DateTime<Utc>,
    /// Property name.
    pub name: String,
    /// Property kind, e.g. `WAREHOUSE`.
    pub kind: String,
}

impl FromRow for WarehouseDetails {
    fn from_row(row: &Row) -> SdkResult<Self> {
        Ok(Self {
            created_on: row.timestamp("created_on")?,
            name: row.string("name")?,
            kind: row.string("kind")?,
        })
    }
}

/// Warehouse operations, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Warehouses<'a> {
    client: &'a Client,
}

impl<'a> Warehouses<'a> {
    /// Borrow `client` for warehouse operations.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Run `CREATE`.
    pub async fn create(&self, opts: &CreateWarehouseOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `ALTER`.
    pub async fn alter(&self, opts: &AlterWarehouseOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `DROP`.
    pub async fn drop(&self, opts: &DropWarehouseOptions) -> SdkResult<()> {
        self.client.exec_opts(Some(opts)).await
    }

    /// Run `SHOW` and map every row.
    pub async fn show(&self, opts: &ShowWarehouseOptions) -> SdkResult<Vec<Warehouse>> {
        self.client.query_opts(Some(opts)).await
    }

    /// Find one object by identifier.
    ///
    /// Fails with [`SdkError::NotFound`](crate::error::SdkError::NotFound) when absent.
    #[instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SdkResult<Warehouse> {
        let warehouses = self
            .show(&ShowWarehouseOptions::new().with_like(Like::new(id.name())))
            .await?;
        find_exact(warehouses, |w| w.name.as_str(), id.name())
            .ok_or_else(|| not_found(ObjectType::Warehouse, id))
    }

    /// Run `DESCRIBE` and map each property row.
    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SdkResult<Vec<WarehouseDetails>> {
        self.client
            .query_opts(Some(&DescribeWarehouseOptions { name: id.clone() }))
            .await
    }
}
