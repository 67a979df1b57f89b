//! Type system definitions for graphyne.
//!
//! This crate provides:
//! - `definition`: Type, field, and directive definitions
//! - `schema`: The schema container, lookup helpers, and builder
//! - `scalar`: Built-in scalar and enum value coercion

pub mod definition;
pub mod scalar;
pub mod schema;

pub use definition::{
    DirectiveDefinition, DirectiveLocation, EnumDef, EnumValueDef, FieldDef, InputObjectDef,
    InputValueDef, InterfaceDef, IsTypeOfFn, ObjectDef, ScalarDef, ScalarFn, TypeDef,
    TypeResolverFn, UnionDef,
};
pub use graphyne_ast::TypeRef;
pub use schema::{Schema, SchemaBuilder, SchemaError};
