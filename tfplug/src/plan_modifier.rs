//! Plan modifiers and the default planning pass
//!
//! [`plan_resource_change`] derives a planned state from the proposed new
//! state the way Terraform expects: computed attributes left unset in
//! configuration become unknown when the resource changes, then every
//! attribute's plan modifiers run against prior state and configuration.

use crate::schema::{Attribute, NestedType, ObjectNestingMode, Schema};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

pub struct PlanModifyRequest<'a> {
    pub config: &'a Dynamic,
    pub state: &'a Dynamic,
    pub plan: &'a Dynamic,
    pub path: &'a AttributePath,
}

pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Trait for modifying terraform plan behavior
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;

    fn modify_plan(&self, request: PlanModifyRequest<'_>) -> PlanModifyResponse;
}

/// Copies the prior state value into the plan when the planned value is unknown.
///
/// Keeps server-assigned values such as `id` stable across updates instead of
/// showing them as "(known after apply)".
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "Once set, the value of this attribute in state will not change.".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest<'_>) -> PlanModifyResponse {
        let plan_value = match (request.plan, request.state) {
            (Dynamic::Unknown, state) if !state.is_null() && !state.is_unknown() => state.clone(),
            (plan, _) => plan.clone(),
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }
}

/// Marks an attribute as requiring replacement when it changes
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn description(&self) -> String {
        "If the value of this attribute changes, the resource will be replaced.".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest<'_>) -> PlanModifyResponse {
        let requires_replace = !request.state.is_null()
            && !request.state.is_unknown()
            && !request.plan.is_unknown()
            && !values_equal(request.state, request.plan);

        PlanModifyResponse {
            plan_value: request.plan.clone(),
            requires_replace,
            diagnostics: Vec::new(),
        }
    }
}

/// Result of the default planning pass
#[derive(Debug)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes the planned state for a resource.
///
/// A null `proposed_new_state` is a destroy plan and passes through untouched.
pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed_new_state: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    let mut change = PlannedChange {
        planned_state: proposed_new_state.clone(),
        requires_replace: Vec::new(),
        diagnostics: Vec::new(),
    };

    if proposed_new_state.is_null() {
        return change;
    }

    let changed = prior_state.is_null() || !values_equal(&prior_state.value, &proposed_new_state.value);

    change.planned_state.value = plan_object(
        &schema.block.attributes,
        &prior_state.value,
        &proposed_new_state.value,
        &config.value,
        &AttributePath::root(),
        changed,
        &mut change,
    );

    change
}

fn plan_object(
    attributes: &[Attribute],
    prior: &Dynamic,
    proposed: &Dynamic,
    config: &Dynamic,
    path: &AttributePath,
    changed: bool,
    change: &mut PlannedChange,
) -> Dynamic {
    let Dynamic::Map(proposed_fields) = proposed else {
        return proposed.clone();
    };

    let mut planned = HashMap::with_capacity(proposed_fields.len());
    for (name, value) in proposed_fields {
        let planned_value = match attributes.iter().find(|a| &a.name == name) {
            Some(attr) => plan_attribute(
                attr,
                prior.get(name).unwrap_or(&Dynamic::Null),
                value,
                config.get(name).unwrap_or(&Dynamic::Null),
                &path.clone().attribute(name),
                changed,
                change,
            ),
            None => value.clone(),
        };
        planned.insert(name.clone(), planned_value);
    }

    Dynamic::Map(planned)
}

fn plan_attribute(
    attr: &Attribute,
    prior: &Dynamic,
    proposed: &Dynamic,
    config: &Dynamic,
    path: &AttributePath,
    changed: bool,
    change: &mut PlannedChange,
) -> Dynamic {
    let mut value = if attr.computed && config.is_null() && changed {
        Dynamic::Unknown
    } else if let Some(nested) = &attr.nested_type {
        plan_nested(nested, prior, proposed, config, path, changed, change)
    } else {
        proposed.clone()
    };

    for modifier in &attr.plan_modifiers {
        let response = modifier.modify_plan(PlanModifyRequest {
            config,
            state: prior,
            plan: &value,
            path,
        });
        value = response.plan_value;
        change.diagnostics.extend(response.diagnostics);
        if response.requires_replace && !change.requires_replace.contains(path) {
            change.requires_replace.push(path.clone());
        }
    }

    value
}

fn plan_nested(
    nested: &NestedType,
    prior: &Dynamic,
    proposed: &Dynamic,
    config: &Dynamic,
    path: &AttributePath,
    changed: bool,
    change: &mut PlannedChange,
) -> Dynamic {
    match (nested.nesting, proposed) {
        (ObjectNestingMode::Single, Dynamic::Map(_)) => {
            plan_object(&nested.attributes, prior, proposed, config, path, changed, change)
        }
        (ObjectNestingMode::Map, Dynamic::Map(elements)) => {
            let planned = elements
                .iter()
                .map(|(key, element)| {
                    let planned = plan_object(
                        &nested.attributes,
                        prior.get(key).unwrap_or(&Dynamic::Null),
                        element,
                        config.get(key).unwrap_or(&Dynamic::Null),
                        &path.clone().key(key),
                        changed,
                        change,
                    );
                    (key.clone(), planned)
                })
                .collect();
            Dynamic::Map(planned)
        }
        // List and set elements have no stable identity to pair with prior state.
        _ => proposed.clone(),
    }
}

/// Structural equality that treats numbers within f64 epsilon as equal
pub fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Null, Dynamic::Null) => true,
        (Dynamic::Unknown, Dynamic::Unknown) => true,
        (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
        (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
        (Dynamic::String(a), Dynamic::String(b)) => a == b,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
    use std::sync::Arc;

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("title", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn obj(fields: &[(&str, Dynamic)]) -> DynamicValue {
        DynamicValue::new(Dynamic::object(fields.iter().cloned()))
    }

    #[test]
    fn create_marks_unset_computed_attributes_unknown() {
        let proposed = obj(&[
            ("id", Dynamic::Null),
            ("title", Dynamic::from("Docs")),
            ("updated_at", Dynamic::Null),
        ]);
        let config = proposed.clone();

        let change = plan_resource_change(&schema(), &DynamicValue::null(), &proposed, &config);

        assert!(change.planned_state.is_unknown_at(&AttributePath::new("id")));
        assert!(change.planned_state.is_unknown_at(&AttributePath::new("updated_at")));
        assert_eq!(
            change.planned_state.get_string(&AttributePath::new("title")).unwrap(),
            "Docs"
        );
    }

    #[test]
    fn update_keeps_id_from_state() {
        let prior = obj(&[
            ("id", Dynamic::from("space-1")),
            ("title", Dynamic::from("Docs")),
            ("updated_at", Dynamic::from("2024-01-01T00:00:00Z")),
        ]);
        let proposed = obj(&[
            ("id", Dynamic::from("space-1")),
            ("title", Dynamic::from("Handbook")),
            ("updated_at", Dynamic::from("2024-01-01T00:00:00Z")),
        ]);
        let config = obj(&[
            ("id", Dynamic::Null),
            ("title", Dynamic::from("Handbook")),
            ("updated_at", Dynamic::Null),
        ]);

        let change = plan_resource_change(&schema(), &prior, &proposed, &config);

        assert_eq!(
            change.planned_state.get_string(&AttributePath::new("id")).unwrap(),
            "space-1"
        );
        assert!(change.planned_state.is_unknown_at(&AttributePath::new("updated_at")));
    }

    #[test]
    fn unchanged_resource_keeps_computed_values() {
        let prior = obj(&[
            ("id", Dynamic::from("space-1")),
            ("title", Dynamic::from("Docs")),
            ("updated_at", Dynamic::from("2024-01-01T00:00:00Z")),
        ]);

        let change = plan_resource_change(&schema(), &prior, &prior, &prior);

        assert_eq!(change.planned_state, prior);
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn destroy_plan_passes_through() {
        let prior = obj(&[("id", Dynamic::from("space-1"))]);
        let change = plan_resource_change(
            &schema(),
            &prior,
            &DynamicValue::null(),
            &DynamicValue::null(),
        );
        assert!(change.planned_state.is_null());
    }

    #[test]
    fn requires_replace_if_changed_triggers_on_different_value() {
        let path = AttributePath::new("type");
        let response = RequiresReplaceIfChanged.modify_plan(PlanModifyRequest {
            config: &Dynamic::from("terraform:b"),
            state: &Dynamic::from("terraform:a"),
            plan: &Dynamic::from("terraform:b"),
            path: &path,
        });
        assert!(response.requires_replace);

        let response = RequiresReplaceIfChanged.modify_plan(PlanModifyRequest {
            config: &Dynamic::from("terraform:a"),
            state: &Dynamic::Null,
            plan: &Dynamic::from("terraform:a"),
            path: &path,
        });
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_uses_plan_when_known() {
        let path = AttributePath::new("id");
        let response = UseStateForUnknown.modify_plan(PlanModifyRequest {
            config: &Dynamic::Null,
            state: &Dynamic::from("old"),
            plan: &Dynamic::from("new"),
            path: &path,
        });
        assert_eq!(response.plan_value, Dynamic::from("new"));
    }

    #[test]
    fn values_equal_handles_nested_values() {
        let a = Dynamic::object([("k", Dynamic::List(vec![Dynamic::Number(1.0)]))]);
        let b = Dynamic::object([("k", Dynamic::List(vec![Dynamic::Number(1.0)]))]);
        let c = Dynamic::object([("k", Dynamic::List(vec![Dynamic::Number(2.0)]))]);
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &c));
    }
}
