//! Plan computation for resource changes.
//!
//! A plan compares prior state with the proposed configuration, attribute by
//! attribute, using the resource [`Schema`] to decide which values the
//! provider owns and which changes force a replacement.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{AttributeFlags, BlockNestingMode, Schema};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Whether the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

fn provider_owned(flags: &AttributeFlags) -> bool {
    flags.computed && !flags.optional && !flags.required
}

fn field<'a>(state: &'a Value, name: &str) -> &'a Value {
    state.get(name).unwrap_or(&Value::Null)
}

/// Write `[]` for every list or set block that is absent or `null`.
fn fill_empty_blocks(schema: &Schema, state: &mut Map<String, Value>) {
    for (name, block) in &schema.block.blocks {
        if block.nesting_mode == BlockNestingMode::Single {
            continue;
        }
        let entry = state.entry(name.clone()).or_insert(Value::Null);
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }
    }
}

/// Compute the plan for one resource.
///
/// `prior` is `None` for a create; a `null` proposal is a delete.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let attributes = &schema.block.attributes;
    let names = attributes.keys().chain(schema.block.blocks.keys());

    match (prior, proposed) {
        (Some(prior), Value::Null) => {
            let changes = names
                .filter(|name| !field(prior, name).is_null())
                .map(|name| AttributeChange::removed(name.as_str(), field(prior, name).clone()))
                .collect();
            PlanResult {
                planned_state: Value::Null,
                changes,
                requires_replace: false,
            }
        },
        (None, proposed) => {
            let mut planned = as_object(proposed);
            for (name, attr) in attributes {
                if provider_owned(&attr.flags) {
                    planned.insert(name.clone(), Value::Null);
                }
            }
            let changes = names
                .filter_map(|name| match planned.get(name.as_str()) {
                    Some(value) if !value.is_null() => {
                        Some(AttributeChange::added(name.as_str(), value.clone()))
                    },
                    _ => None,
                })
                .collect();
            PlanResult {
                planned_state: Value::Object(planned),
                changes,
                requires_replace: false,
            }
        },
        (Some(prior), proposed) => {
            let mut prior_blocks = as_object(prior);
            fill_empty_blocks(schema, &mut prior_blocks);
            let prior = &Value::Object(prior_blocks);

            let mut planned = as_object(proposed);
            fill_empty_blocks(schema, &mut planned);
            for (name, attr) in attributes {
                let keep_prior = provider_owned(&attr.flags)
                    || (attr.flags.computed && field(proposed, name).is_null());
                if keep_prior {
                    planned.insert(name.clone(), field(prior, name).clone());
                }
            }

            let mut changes = Vec::new();
            let mut requires_replace = false;
            for name in names {
                let before = field(prior, name);
                let after = planned.get(name.as_str()).unwrap_or(&Value::Null);
                if before == after {
                    continue;
                }
                requires_replace |= attributes.get(name).is_some_and(|attr| attr.force_new);
                changes.push(match (before.is_null(), after.is_null()) {
                    (true, _) => AttributeChange::added(name.as_str(), after.clone()),
                    (_, true) => AttributeChange::removed(name.as_str(), before.clone()),
                    _ => AttributeChange::modified(name.as_str(), before.clone(), after.clone()),
                });
            }

            if requires_replace {
                for (name, attr) in attributes {
                    if provider_owned(&attr.flags) {
                        planned.insert(name.clone(), Value::Null);
                    }
                }
            }

            PlanResult {
                planned_state: Value::Object(planned),
                changes,
                requires_replace,
            }
        },
    }
}

fn as_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}
