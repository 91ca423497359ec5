//! Conversions between Terraform values and API types

pub mod entity;
pub mod entity_schema;
pub mod space;

use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub use entity::{entity_state, EntityKey, EntityModel};
pub use entity_schema::{entity_schema_state, EntitySchemaKey, EntitySchemaModel};
pub use space::{space_state, SpaceModel};

pub(crate) fn required_string(value: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
    let path = AttributePath::new(name);
    value
        .get_string(&path)
        .map_err(|e| invalid_value(path, e.to_string()))
}

/// Null, unknown and absent all read as `None`
pub(crate) fn optional_string(
    value: &DynamicValue,
    name: &str,
) -> Result<Option<String>, Diagnostic> {
    let path = AttributePath::new(name);
    value
        .get_optional_string(&path)
        .map_err(|e| invalid_value(path, e.to_string()))
}

fn invalid_value(path: AttributePath, detail: String) -> Diagnostic {
    Diagnostic::error("Invalid attribute value", detail).with_attribute(path)
}
