//! `snowflake_warehouse`

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
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier};
use crate::objects::warehouse::{
    AlterWarehouseOptions, CreateWarehouseOptions, DropWarehouseOptions, ScalingPolicy, Warehouse,
    WarehouseSet, WarehouseSize, WarehouseState, WarehouseType, WarehouseUnset,
};
use crate::provider::Resource;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};

/// State of a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseModel {
    /// Warehouse name.
    pub name: String,
    /// `STANDARD` or `SNOWPARK-OPTIMIZED`.
    pub warehouse_type: Option<WarehouseType>,
    /// Compute size.
    pub warehouse_size: Option<WarehouseSize>,
    /// Lower bound for multi-cluster scaling.
    pub min_cluster_count: Option<u32>,
    /// Upper bound for multi-cluster scaling.
    pub max_cluster_count: Option<u32>,
    /// How eagerly extra clusters start.
    pub scaling_policy: Option<ScalingPolicy>,
    /// Idle seconds before suspending.
    pub auto_suspend: Option<u32>,
    /// Resume when a query arrives.
    pub auto_resume: Option<bool>,
    /// Create the warehouse suspended. Only applies at creation.
    pub initially_suspended: Option<bool>,
    /// Name of the attached resource monitor.
    pub resource_monitor: Option<String>,
    /// Free-form comment.
    pub comment: Option<String>,
    /// Offload parts of large queries to shared compute.
    pub enable_query_acceleration: Option<bool>,
    /// Cap on the compute leased for query acceleration.
    pub query_acceleration_max_scale_factor: Option<u32>,
    /// Tags attached to the warehouse.
    #[serde(default, rename = "tag")]
    pub tags: Vec<TagModel>,
    /// Current state, as reported by the account.
    pub state: Option<WarehouseState>,
    /// Owning role, as reported by the account.
    pub owner: Option<String>,
    /// `"WAREHOUSE"`.
    pub fully_qualified_name: Option<String>,
}

impl WarehouseModel {
    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }

    fn resource_monitor_id(&self) -> SdkResult<Option<AccountObjectIdentifier>> {
        self.resource_monitor.as_deref().map(str::parse).transpose()
    }

    fn create_options(&self) -> SdkResult<CreateWarehouseOptions> {
        let mut opts = CreateWarehouseOptions {
            warehouse_type: self.warehouse_type,
            warehouse_size: self.warehouse_size,
            min_cluster_count: self.min_cluster_count,
            max_cluster_count: self.max_cluster_count,
            scaling_policy: self.scaling_policy,
            auto_suspend: self.auto_suspend,
            auto_resume: self.auto_resume,
            initially_suspended: self.initially_suspended,
            resource_monitor: self.resource_monitor_id()?,
            comment: self.comment.clone(),
            enable_query_acceleration: self.enable_query_acceleration,
            query_acceleration_max_scale_factor: self.query_acceleration_max_scale_factor,
            ..CreateWarehouseOptions::new(self.id())
        };
        if !self.tags.is_empty() {
            opts = opts.with_tag(tag_associations(&self.tags)?);
        }
        Ok(opts)
    }

    /// Split the differences to `planned` into one `SET` and one `UNSET`.
    fn changes(&self, planned: &Self) -> SdkResult<(WarehouseSet, WarehouseUnset)> {
        fn diff<T: Clone + PartialEq>(
            prior: &Option<T>,
            planned: &Option<T>,
            set: &mut Option<T>,
            unset: &mut Option<bool>,
        ) {
            if prior != planned {
                match planned {
                    Some(value) => *set = Some(value.clone()),
                    None => *unset = Some(true),
                }
            }
        }

        let mut set = WarehouseSet::default();
        let mut unset = WarehouseUnset::default();
        macro_rules! diff_field {
            ($($field:ident),+ $(,)?) => {
                $(diff(&self.$field, &planned.$field, &mut set.$field, &mut unset.$field);)+
            };
        }

        diff_field!(warehouse_type, min_cluster_count, max_cluster_count, scaling_policy);
        diff_field!(auto_suspend, auto_resume, comment);
        diff_field!(enable_query_acceleration, query_acceleration_max_scale_factor);
        // Size has no default to return to.
        if self.warehouse_size != planned.warehouse_size {
            set.warehouse_size = planned.warehouse_size;
        }
        diff(
            &self.resource_monitor_id()?,
            &planned.resource_monitor_id()?,
            &mut set.resource_monitor,
            &mut unset.resource_monitor,
        );
        Ok((set, unset))
    }

    /// State as `SHOW WAREHOUSES` reports it. Creation-only settings and tags
    /// are carried over from `configured`.
    fn observed(warehouse: &Warehouse, configured: &Self) -> Self {
        Self {
            name: warehouse.name.clone(),
            warehouse_type: warehouse.warehouse_type,
            warehouse_size: warehouse.size,
            min_cluster_count: observed_u32(warehouse.min_cluster_count),
            max_cluster_count: observed_u32(warehouse.max_cluster_count),
            scaling_policy: warehouse.scaling_policy,
            auto_suspend: observed_u32(warehouse.auto_suspend),
            auto_resume: warehouse.auto_resume,
            initially_suspended: configured.initially_suspended,
            resource_monitor: warehouse.resource_monitor.clone(),
            comment: observed_comment(warehouse.comment.clone()),
            enable_query_acceleration: warehouse.enable_query_acceleration,
            query_acceleration_max_scale_factor: observed_u32(
                warehouse.query_acceleration_max_scale_factor,
            ),
            tags: configured.tags.clone(),
            state: warehouse.state,
            owner: warehouse.owner.clone(),
            fully_qualified_name: Some(warehouse.id().fully_qualified_name()),
        }
    }
}

/// A virtual warehouse.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarehouseResource;

#[async_trait]
impl Resource for WarehouseResource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A virtual warehouse.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Warehouse name."),
            )
            .with_attribute(
                "warehouse_type",
                Attribute::optional_computed(AttributeType::String)
                    .with_allowed_values(WarehouseType::ALL),
            )
            .with_attribute(
                "warehouse_size",
                Attribute::optional_computed(AttributeType::String)
                    .with_allowed_values(WarehouseSize::ALL),
            )
            .with_attribute("min_cluster_count", Attribute::optional_computed(AttributeType::Int64))
            .with_attribute("max_cluster_count", Attribute::optional_computed(AttributeType::Int64))
            .with_attribute(
                "scaling_policy",
                Attribute::optional_computed(AttributeType::String)
                    .with_allowed_values(ScalingPolicy::ALL),
            )
            .with_attribute(
                "auto_suspend",
                Attribute::optional_computed(AttributeType::Int64)
                    .with_description("Idle seconds before suspending."),
            )
            .with_attribute("auto_resume", Attribute::optional_computed(AttributeType::Bool))
            .with_attribute(
                "initially_suspended",
                Attribute::optional_bool()
                    .with_description("Only applies when the warehouse is created."),
            )
            .with_attribute("resource_monitor", Attribute::optional_string())
            .with_attribute("comment", Attribute::optional_string())
            .with_attribute(
                "enable_query_acceleration",
                Attribute::optional_computed(AttributeType::Bool),
            )
            .with_attribute(
                "query_acceleration_max_scale_factor",
                Attribute::optional_computed(AttributeType::Int64),
            )
            .with_attribute("state", Attribute::computed_string())
            .with_attribute("owner", Attribute::computed_string())
            .with_attribute("fully_qualified_name", Attribute::computed_string())
            .with_block("tag", tag_block())
    }

    fn validate(&self, config: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate_model(config, WarehouseModel::create_options))
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value, ProviderError> {
        let model: WarehouseModel = from_state(planned_state)?;
        let id = model.id();
        client.warehouses().create(&model.create_options()?).await?;
        info!(%id, "created warehouse");
        let warehouse = client.warehouses().show_by_id(&id).await?;
        into_state(&WarehouseModel::observed(&warehouse, &model))
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value, ProviderError> {
        let model: WarehouseModel = from_state(current_state)?;
        let warehouse = client.warehouses().show_by_id(&model.id()).await?;
        into_state(&WarehouseModel::observed(&warehouse, &model))
    }

    async fn update(
        &self,
        client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: WarehouseModel = from_state(prior_state)?;
        let planned: WarehouseModel = from_state(planned_state)?;
        let warehouses = client.warehouses();

        let mut id = prior.id();
        if prior.name != planned.name {
            warehouses
                .alter(&AlterWarehouseOptions::new(id.clone()).with_rename_to(planned.id()))
                .await?;
            info!(from = %id, to = %planned.id(), "renamed warehouse");
            id = planned.id();
        }

        let (set, unset) = prior.changes(&planned)?;
        if set != WarehouseSet::default() {
            warehouses.alter(&AlterWarehouseOptions::new(id.clone()).with_set(set)).await?;
        }
        if unset != WarehouseUnset::default() {
            warehouses.alter(&AlterWarehouseOptions::new(id.clone()).with_unset(unset)).await?;
        }

        let tags = tag_changes(&prior.tags, &planned.tags)?;
        if !tags.unset.is_empty() {
            warehouses
                .alter(&AlterWarehouseOptions::new(id.clone()).with_unset_tags(tags.unset))
                .await?;
        }
        if !tags.set.is_empty() {
            warehouses
                .alter(&AlterWarehouseOptions::new(id.clone()).with_set_tags(tags.set))
                .await?;
        }

        let warehouse = warehouses.show_by_id(&id).await?;
        into_state(&WarehouseModel::observed(&warehouse, &planned))
    }

    async fn delete(&self, client: &Client, current_state: Value) -> Result<(), ProviderError> {
        let model: WarehouseModel = from_state(current_state)?;
        let id = model.id();
        client
            .warehouses()
            .drop(&DropWarehouseOptions::new(id.clone()).with_if_exists(true))
            .await?;
        info!(%id, "dropped warehouse");
        Ok(())
    }

    async fn import_state(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let id: AccountObjectIdentifier = parse_import_id(id)?;
        let warehouse = client.warehouses().show_by_id(&id).await?;
        into_state(&WarehouseModel::observed(&warehouse, &WarehouseModel::default()))
    }
}
