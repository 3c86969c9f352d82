//! Resource and data source implementations.
//!
//! Each resource keeps a serde model of its state. Callbacks deserialize the
//! model, turn it into options structs for the SQL layer, and rebuild state
//! from what `SHOW` reports afterwards so the host always stores observed
//! values.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, SdkError, SdkResult};
use crate::identifiers::SchemaObjectIdentifier;
use crate::objects::TagAssociation;
use crate::row::to_state;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock};
use crate::validation::{self, Validate};

mod account_role;
mod data_sources;
mod database_role;
mod schema;
mod warehouse;

pub use account_role::{AccountRoleModel, AccountRoleResource};
pub use data_sources::{DatabaseRolesDataSource, WarehousesDataSource};
pub use database_role::{DatabaseRoleModel, DatabaseRoleResource};
pub use schema::{SchemaModel, SchemaResource};
pub use warehouse::{WarehouseModel, WarehouseResource};

/// One `tag { name = ..., value = ... }` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagModel {
    /// Fully qualified tag name, `DB.SCHEMA.TAG`.
    pub name: String,
    /// Tag value.
    pub value: String,
}

pub(crate) fn tag_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_description("A tag to attach to the object.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Fully qualified tag name."),
            )
            .with_attribute("value", Attribute::required_string().with_description("Tag value.")),
    )
}

pub(crate) fn tag_associations(tags: &[TagModel]) -> SdkResult<Vec<TagAssociation>> {
    tags.iter()
        .map(|tag| -> SdkResult<TagAssociation> {
            Ok(TagAssociation::new(tag.name.parse()?, tag.value.clone()))
        })
        .collect()
}

/// Tag statements needed to move from one tag list to another.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct TagChanges {
    pub(crate) set: Vec<TagAssociation>,
    pub(crate) unset: Vec<SchemaObjectIdentifier>,
}

pub(crate) fn tag_changes(prior: &[TagModel], planned: &[TagModel]) -> SdkResult<TagChanges> {
    let mut changes = TagChanges::default();
    for tag in planned {
        if !prior.contains(tag) {
            changes.set.push(TagAssociation::new(tag.name.parse()?, tag.value.clone()));
        }
    }
    for tag in prior {
        if !planned.iter().any(|t| t.name == tag.name) {
            changes.unset.push(tag.name.parse()?);
        }
    }
    Ok(changes)
}

/// `SHOW` reports a missing comment as an empty string.
pub(crate) fn observed_comment(comment: Option<String>) -> Option<String> {
    comment.filter(|c| !c.is_empty())
}

pub(crate) fn from_state<T: DeserializeOwned>(state: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(state)?)
}

pub(crate) fn into_state<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(to_state(model)?)
}

pub(crate) fn parse_import_id<I>(id: &str) -> Result<I, ProviderError>
where
    I: FromStr<Err = SdkError>,
{
    id.parse::<I>()
        .map_err(|err| ProviderError::InvalidRequest(format!("cannot import {id:?}: {err}")))
}

/// Deserialize a configuration and validate the statement built from it.
pub(crate) fn validate_model<M, T, F>(config: &Value, build: F) -> Vec<Diagnostic>
where
    M: DeserializeOwned,
    T: Validate,
    F: FnOnce(&M) -> SdkResult<T>,
{
    let model: M = match serde_json::from_value(config.clone()) {
        Ok(model) => model,
        Err(err) => {
            return vec![Diagnostic::error("invalid configuration").with_detail(err.to_string())]
        },
    };
    match build(&model) {
        Ok(opts) => validation::validate(&opts),
        Err(err) => validation::diagnostics(&err),
    }
}

/// Convert an unsigned count reported by `SHOW` into a model field.
pub(crate) fn observed_u32(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}
