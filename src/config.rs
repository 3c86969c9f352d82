//! Provider configuration.
//!
//! [`ProviderConfig`] is read from the provider block of the host's
//! configuration. Every field falls back to a `SNOWFLAKE_*` environment
//! variable when the block leaves it out.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Connection settings handed to the [`Connector`](crate::provider::Connector).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Organization the account belongs to.
    pub organization_name: Option<String>,
    /// Account name within the organization.
    pub account_name: Option<String>,
    /// Login name.
    pub user: Option<String>,
    /// Password for `user`.
    pub password: Option<String>,
    /// Role to assume after login.
    pub role: Option<String>,
    /// Default warehouse for the session.
    pub warehouse: Option<String>,
}

/// Environment variable consulted for each field, in field order.
pub const ENV_VARS: [(&str, &str); 6] = [
    ("organization_name", "SNOWFLAKE_ORGANIZATION_NAME"),
    ("account_name", "SNOWFLAKE_ACCOUNT"),
    ("user", "SNOWFLAKE_USER"),
    ("password", "SNOWFLAKE_PASSWORD"),
    ("role", "SNOWFLAKE_ROLE"),
    ("warehouse", "SNOWFLAKE_WAREHOUSE"),
];

impl ProviderConfig {
    /// Parse a configuration block and fill gaps from `env`.
    ///
    /// `env` is usually [`process_env`]; tests pass a fixed lookup.
    pub fn load<F>(config: Value, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = if config.is_null() {
            Self::default()
        } else {
            serde_json::from_value(config)?
        };
        Ok(config.with_env(env))
    }

    fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, var) in ENV_VARS {
            let Some(slot) = self.field_mut(field) else {
                continue;
            };
            if slot.as_deref().map_or(true, str::is_empty) {
                if let Some(value) = env(var).filter(|v| !v.is_empty()) {
                    *slot = Some(value);
                }
            }
        }
        self
    }

    fn field_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "organization_name" => Some(&mut self.organization_name),
            "account_name" => Some(&mut self.account_name),
            "user" => Some(&mut self.user),
            "password" => Some(&mut self.password),
            "role" => Some(&mut self.role),
            "warehouse" => Some(&mut self.warehouse),
            _ => None,
        }
    }

    /// Check that the settings needed to connect are present.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let required = [
            ("account_name", &self.account_name),
            ("user", &self.user),
            ("password", &self.password),
        ];
        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(field, _)| {
                let var = ENV_VARS
                    .iter()
                    .find(|(name, _)| *name == field)
                    .map_or("", |(_, var)| var);
                Diagnostic::error(format!("{field} is not set"))
                    .with_detail(format!(
                        "set {field} in the provider block or the {var} environment variable"
                    ))
                    .with_attribute(field)
            })
            .collect()
    }

    /// The account locator used to connect: `ORG-ACCOUNT`, or the bare
    /// account name when no organization is given.
    pub fn account_identifier(&self) -> Option<String> {
        let account = self.account_name.as_deref()?;
        Some(match self.organization_name.as_deref() {
            Some(org) if !org.is_empty() => format!("{org}-{account}"),
            _ => account.to_string(),
        })
    }

    /// The schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Connection settings for the Snowflake account.")
            .with_attribute(
                "organization_name",
                Attribute::optional_string()
                    .with_description("Organization. Falls back to SNOWFLAKE_ORGANIZATION_NAME."),
            )
            .with_attribute(
                "account_name",
                Attribute::optional_string()
                    .with_description("Account name. Falls back to SNOWFLAKE_ACCOUNT."),
            )
            .with_attribute(
                "user",
                Attribute::optional_string()
                    .with_description("Login name. Falls back to SNOWFLAKE_USER."),
            )
            .with_attribute(
                "password",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Password. Falls back to SNOWFLAKE_PASSWORD."),
            )
            .with_attribute(
                "role",
                Attribute::optional_string()
                    .with_description("Role used by the session. Falls back to SNOWFLAKE_ROLE."),
            )
            .with_attribute(
                "warehouse",
                Attribute::optional_string()
                    .with_description("Session warehouse. Falls back to SNOWFLAKE_WAREHOUSE."),
            )
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("organization_name", &self.organization_name)
            .field("account_name", &self.account_name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .finish()
    }
}

/// Look a variable up in the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_from_block() {
        let config = ProviderConfig::load(
            json!({
                "organization_name": "ORG",
                "account_name": "ACC",
                "user": "u",
                "password": "p",
            }),
            no_env,
        )
        .unwrap();
        assert_eq!(config.account_identifier().as_deref(), Some("ORG-ACC"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_environment_fills_missing_fields_only() {
        let env = |name: &str| match name {
            "SNOWFLAKE_USER" => Some("env_user".to_string()),
            "SNOWFLAKE_ACCOUNT" => Some("ENV_ACC".to_string()),
            "SNOWFLAKE_ROLE" => Some(String::new()),
            _ => None,
        };
        let config = ProviderConfig::load(json!({"account_name": "ACC", "role": ""}), env).unwrap();
        assert_eq!(config.account_name.as_deref(), Some("ACC"));
        assert_eq!(config.user.as_deref(), Some("env_user"));
        assert_eq!(config.role.as_deref(), Some(""));
        assert_eq!(config.account_identifier().as_deref(), Some("ACC"));
    }

    #[test]
    fn test_field_names_resolve_to_their_own_slot() {
        let mut config = ProviderConfig::default();
        for (field, _) in ENV_VARS {
            *config.field_mut(field).unwrap() = Some(field.to_string());
        }
        assert_eq!(config.account_name.as_deref(), Some("account_name"));
        assert_eq!(config.warehouse.as_deref(), Some("warehouse"));

        assert!(config.field_mut("warehous").is_none());
        assert!(config.field_mut("").is_none());
        assert_eq!(config.warehouse.as_deref(), Some("warehouse"));
    }

    #[test]
    fn test_missing_settings_become_diagnostics() {
        let config = ProviderConfig::load(Value::Null, no_env).unwrap();
        let diagnostics = config.validate();
        let attributes: Vec<_> =
            diagnostics.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attributes, vec!["account_name", "user", "password"]);
        let detail = diagnostics[2].detail.as_deref().unwrap_or_default();
        assert!(detail.contains("SNOWFLAKE_PASSWORD"));
    }

    #[test]
    fn test_wrong_types_are_serialization_errors() {
        let err = ProviderConfig::load(json!({"user": 42}), no_env).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ProviderConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_schema_marks_password_sensitive() {
        let schema = ProviderConfig::schema();
        assert!(schema.block.attributes["password"].flags.sensitive);
        assert_eq!(schema.block.attributes.len(), ENV_VARS.len());
    }
}
