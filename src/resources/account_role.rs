//! `snowflake_account_role`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{
    from_state, into_state, observed_comment, parse_import_id, tag_associations, tag_block,
    tag_changes, validate_model, TagModel,
};
use crate::client::Client;
use crate::error::{ProviderError, SdkResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier};
use crate::objects::role::{AlterRoleOptions, CreateRoleOptions, DropRoleOptions, Role};
use crate::provider::Resource;
use crate::schema::{Attribute, Diagnostic, Schema};

/// State of an account role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoleModel {
    /// Role name.
    pub name: String,
    /// Free-form comment.
    pub comment: Option<String>,
    /// Tags attached to the role. `SHOW ROLES` does not report tags, so
    /// state keeps the configured list.
    #[serde(default, rename = "tag")]
    pub tags: Vec<TagModel>,
    /// Owning role, as reported by the account.
    pub owner: Option<String>,
    /// `"ROLE"`.
    pub fully_qualified_name: Option<String>,
}

impl AccountRoleModel {
    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }

    fn create_options(&self) -> SdkResult<CreateRoleOptions> {
        let mut opts = CreateRoleOptions::new(self.id());
        if let Some(comment) = &self.comment {
            opts = opts.with_comment(comment);
        }
        if !self.tags.is_empty() {
            opts = opts.with_tag(tag_associations(&self.tags)?);
        }
        Ok(opts)
    }

    fn observed(role: &Role, tags: Vec<TagModel>) -> Self {
        Self {
            name: role.name.clone(),
            comment: observed_comment(role.comment.clone()),
            tags,
            owner: role.owner.clone(),
            fully_qualified_name: Some(role.id().fully_qualified_name()),
        }
    }
}

/// An account-level role.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountRoleResource;

#[async_trait]
impl Resource for AccountRoleResource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("An account role.")
            .with_attribute("name", Attribute::required_string().with_description("Role name."))
            .with_attribute("comment", Attribute::optional_string())
            .with_attribute("owner", Attribute::computed_string())
            .with_attribute("fully_qualified_name", Attribute::computed_string())
            .with_block("tag", tag_block())
    }

    fn validate(&self, config: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate_model(config, AccountRoleModel::create_options))
    }

    async fn create(&self, client: &Client, planned_state: Value) -> Result<Value, ProviderError> {
        let model: AccountRoleModel = from_state(planned_state)?;
        let id = model.id();
        client.roles().create(&model.create_options()?).await?;
        info!(%id, "created account role");
        let role = client.roles().show_by_id(&id).await?;
        into_state(&AccountRoleModel::observed(&role, model.tags))
    }

    async fn read(&self, client: &Client, current_state: Value) -> Result<Value, ProviderError> {
        let model: AccountRoleModel = from_state(current_state)?;
        let role = client.roles().show_by_id(&model.id()).await?;
        into_state(&AccountRoleModel::observed(&role, model.tags))
    }

    async fn update(
        &self,
        client: &Client,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: AccountRoleModel = from_state(prior_state)?;
        let planned: AccountRoleModel = from_state(planned_state)?;
        let roles = client.roles();

        let mut id = prior.id();
        if prior.name != planned.name {
            roles
                .alter(&AlterRoleOptions::new(id.clone()).with_rename_to(planned.id()))
                .await?;
            info!(from = %id, to = %planned.id(), "renamed account role");
            id = planned.id();
        }
        if prior.comment != planned.comment {
            let opts = AlterRoleOptions::new(id.clone());
            let opts = match &planned.comment {
                Some(comment) => opts.with_set_comment(comment),
                None => opts.with_unset_comment(true),
            };
            roles.alter(&opts).await?;
        }

        let tags = tag_changes(&prior.tags, &planned.tags)?;
        if !tags.unset.is_empty() {
            roles
                .alter(&AlterRoleOptions::new(id.clone()).with_unset_tags(tags.unset))
                .await?;
        }
        if !tags.set.is_empty() {
            roles
                .alter(&AlterRoleOptions::new(id.clone()).with_set_tags(tags.set))
                .await?;
        }

        let role = roles.show_by_id(&id).await?;
        into_state(&AccountRoleModel::observed(&role, planned.tags))
    }

    async fn delete(&self, client: &Client, current_state: Value) -> Result<(), ProviderError> {
        let model: AccountRoleModel = from_state(current_state)?;
        let id = model.id();
        client
            .roles()
            .drop(&DropRoleOptions::new(id.clone()).with_if_exists(true))
            .await?;
        info!(%id, "dropped account role");
        Ok(())
    }

    async fn import_state(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let id: AccountObjectIdentifier = parse_import_id(id)?;
        let role = client.roles().show_by_id(&id).await?;
        into_state(&AccountRoleModel::observed(&role, Vec::new()))
    }
}
