//! Data source implementations

pub mod data_source_entity;
pub mod data_source_entity_schema;
pub mod data_source_space;

pub use data_source_entity::EntityDataSource;
pub use data_source_entity_schema::EntitySchemaDataSource;
pub use data_source_space::SpaceDataSource;
