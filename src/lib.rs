//! Snowflake Provider SDK
//!
//! Building blocks for an infrastructure provider that manages Snowflake
//! account objects through SQL.
//!
//! # Overview
//!
//! - **Identifiers** ([`identifiers`]): account, database, schema and
//!   function identifiers with one canonical quoted form
//! - **Statement builder** ([`sql`]): typed options structs render
//!   themselves as SQL text through a clause table
//! - **Validation** ([`validation`]): every options struct is checked before
//!   rendering, and failures aggregate into one error
//! - **Row mapping** ([`row`]): `SHOW` rows become typed domain structs
//! - **Object operations** ([`objects`]): create, alter, drop and show for
//!   databases, schemas, roles, database roles, warehouses, streams and
//!   functions, grouped per object kind on [`Client`]
//! - **Provider surface** ([`provider`], [`resources`]): schema, plan and
//!   CRUD callbacks dispatched by resource type name
//! - **Logging** ([`logging`]): `tracing` to stderr
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use snowflake_provider_sdk::{async_trait, Client, SqlExecutor};
//! use snowflake_provider_sdk::objects::warehouse::{CreateWarehouseOptions, WarehouseSize};
//! use snowflake_provider_sdk::identifiers::AccountObjectIdentifier;
//!
//! let client = Client::new(Arc::new(MyDriver::connect()?));
//! client
//!     .warehouses()
//!     .create(
//!         &CreateWarehouseOptions::new(AccountObjectIdentifier::new("ETL"))
//!             .with_warehouse_size(WarehouseSize::XSmall)
//!             .with_auto_suspend(60),
//!     )
//!     .await?;
//! let etl = client.warehouses().show_by_id(&AccountObjectIdentifier::new("ETL")).await?;
//! ```
//!
//! # Provider Lifecycle
//!
//! A [`Provider`] is configured once with the provider block (values missing
//! from the block are read from `SNOWFLAKE_*` environment variables). After
//! that the host drives each resource through:
//!
//! - **ValidateResourceConfig**: schema checks plus the statement's own validation
//! - **Plan**: attribute-level diff, replacement for `force_new` attributes
//! - **Create/Read/Update/Delete**: statements against the account, state
//!   rebuilt from `SHOW` afterwards
//! - **ImportResourceState**: state for an existing object from its identifier
//! - **ReadDataSource**: listings of warehouses and database roles

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod identifiers;
pub mod logging;
pub mod objects;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod row;
pub mod schema;
pub mod sql;
pub mod testing;
pub mod validation;

// Re-export main types at crate root
pub use client::{Client, SqlExecutor};
pub use config::ProviderConfig;
pub use error::{ProviderError, SdkError, SdkResult};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use plan::{AttributeChange, PlanResult};
pub use provider::{Connector, DataSource, ImportedResource, Provider, Resource};
pub use schema::ProviderSchema;
pub use validation::{is_valid, validate, Validate};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
