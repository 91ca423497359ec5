//! Resource implementations

pub mod resource_entity;
pub mod resource_entity_schema;
pub mod resource_space;

pub use resource_entity::EntityResource;
pub use resource_entity_schema::EntitySchemaResource;
pub use resource_space::SpaceResource;

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tfplug::validator::StringPatternValidator;

/// Entity schema types owned by Terraform live under the `terraform:` prefix.
pub(crate) fn terraform_type_validator() -> Arc<StringPatternValidator> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new("^terraform:").expect("static pattern"));
    Arc::new(StringPatternValidator::new(
        pattern.clone(),
        "must be prefixed with `terraform:`",
    ))
}
