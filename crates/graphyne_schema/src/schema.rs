//! Schema container, lookups, and the builder.

use std::sync::OnceLock;

use graphyne_ast::{OperationKind, TypeRef};
use indexmap::IndexMap;
use thiserror::Error;

use crate::definition::{
    DirectiveDefinition, DirectiveLocation, FieldDef, InputValueDef, ObjectDef, TypeDef,
};
use crate::scalar::builtin_scalar;

/// A schema: named types, root operation bindings, and directives.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub description: Option<String>,
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
    pub directives: IndexMap<String, DirectiveDefinition>,
}

/// Structural problems that make a schema unusable for execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema does not define a query root type")]
    MissingQueryType,
    #[error("root operation type \"{0}\" is not defined")]
    UnknownRootType(String),
    #[error("root operation type \"{0}\" must be an object type")]
    NonObjectRootType(String),
    #[error("field \"{type_name}.{field}\" references undefined type \"{referenced}\"")]
    UnknownFieldType {
        type_name: String,
        field: String,
        referenced: String,
    },
    #[error("union \"{union}\" references undefined member type \"{member}\"")]
    UnknownUnionMember { union: String, member: String },
    #[error("type \"{type_name}\" implements undefined interface \"{interface}\"")]
    UnknownInterface {
        type_name: String,
        interface: String,
    },
}

fn typename_field() -> &'static FieldDef {
    static TYPENAME: OnceLock<FieldDef> = OnceLock::new();
    TYPENAME.get_or_init(|| {
        FieldDef::new("__typename", TypeRef::non_null(TypeRef::named("String")))
            .with_description("The name of the current object type.")
    })
}

impl Schema {
    /// Creates a new empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Gets an object type by name.
    #[must_use]
    pub fn get_object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name) {
            Some(TypeDef::Object(def)) => Some(def),
            _ => None,
        }
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Gets a directive definition by name.
    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    /// Looks up a field on an object type, including the `__typename`
    /// meta field available on every object.
    #[must_use]
    pub fn field_def<'a>(&'a self, object: &'a ObjectDef, name: &str) -> Option<&'a FieldDef> {
        if name == "__typename" {
            return Some(typename_field());
        }
        object.fields.get(name)
    }

    /// Returns the root type name bound to an operation kind.
    #[must_use]
    pub fn root_type_name(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Query => self.query_type.as_deref(),
            OperationKind::Mutation => self.mutation_type.as_deref(),
            OperationKind::Subscription => self.subscription_type.as_deref(),
        }
    }

    /// Returns the root object type for an operation kind.
    #[must_use]
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectDef> {
        self.root_type_name(kind).and_then(|name| self.get_object(name))
    }

    /// Returns the concrete object types an abstract type can resolve
    /// to: union members, or implementors of an interface.
    #[must_use]
    pub fn possible_types(&self, abstract_name: &str) -> Vec<&ObjectDef> {
        match self.get_type(abstract_name) {
            Some(TypeDef::Union(def)) => def
                .members
                .iter()
                .filter_map(|member| self.get_object(member))
                .collect(),
            Some(TypeDef::Interface(_)) => self
                .types
                .values()
                .filter_map(|type_def| match type_def {
                    TypeDef::Object(object) if self.object_implements(object, abstract_name) => {
                        Some(object)
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true if `object_name` is a possible type of the given
    /// abstract type.
    #[must_use]
    pub fn is_possible_type(&self, abstract_name: &str, object_name: &str) -> bool {
        self.get_object(object_name)
            .is_some_and(|object| self.type_satisfies(object, abstract_name))
    }

    /// Returns true if an object implements an interface, following
    /// interface-on-interface chains.
    #[must_use]
    pub fn object_implements(&self, object: &ObjectDef, interface: &str) -> bool {
        let mut stack: Vec<&str> = object.implements.iter().map(String::as_str).collect();
        let mut seen: Vec<&str> = Vec::new();
        while let Some(name) = stack.pop() {
            if name == interface {
                return true;
            }
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            if let Some(TypeDef::Interface(def)) = self.get_type(name) {
                stack.extend(def.implements.iter().map(String::as_str));
            }
        }
        false
    }

    /// Returns true if an object matches a type condition: the
    /// object itself, an interface it implements, or a union it
    /// belongs to.
    #[must_use]
    pub fn type_satisfies(&self, object: &ObjectDef, condition: &str) -> bool {
        if object.name == condition {
            return true;
        }
        match self.get_type(condition) {
            Some(TypeDef::Interface(_)) => self.object_implements(object, condition),
            Some(TypeDef::Union(def)) => def.members.iter().any(|member| member == &object.name),
            _ => false,
        }
    }

    /// Checks the structural invariants execution relies on: root
    /// types resolve to objects and every referenced type exists.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let Some(query_name) = self.query_type.as_deref() else {
            return Err(SchemaError::MissingQueryType);
        };
        self.check_root(query_name)?;
        if let Some(name) = self.mutation_type.as_deref() {
            self.check_root(name)?;
        }
        if let Some(name) = self.subscription_type.as_deref() {
            self.check_root(name)?;
        }

        for (type_name, type_def) in &self.types {
            match type_def {
                TypeDef::Object(def) => {
                    self.check_fields(type_name, def.fields.values())?;
                    self.check_interfaces(type_name, &def.implements)?;
                }
                TypeDef::Interface(def) => {
                    self.check_fields(type_name, def.fields.values())?;
                    self.check_interfaces(type_name, &def.implements)?;
                }
                TypeDef::Union(def) => {
                    for member in &def.members {
                        if self.get_object(member).is_none() {
                            return Err(SchemaError::UnknownUnionMember {
                                union: type_name.clone(),
                                member: member.clone(),
                            });
                        }
                    }
                }
                TypeDef::InputObject(def) => {
                    for field in def.fields.values() {
                        self.check_named_type(type_name, &field.name, &field.ty)?;
                    }
                }
                TypeDef::Scalar(_) | TypeDef::Enum(_) => {}
            }
        }
        Ok(())
    }

    fn check_root(&self, name: &str) -> Result<(), SchemaError> {
        match self.get_type(name) {
            None => Err(SchemaError::UnknownRootType(name.to_string())),
            Some(TypeDef::Object(_)) => Ok(()),
            Some(_) => Err(SchemaError::NonObjectRootType(name.to_string())),
        }
    }

    fn check_fields<'a>(
        &self,
        type_name: &str,
        fields: impl Iterator<Item = &'a FieldDef>,
    ) -> Result<(), SchemaError> {
        for field in fields {
            self.check_named_type(type_name, &field.name, &field.ty)?;
            for argument in field.arguments.values() {
                self.check_named_type(type_name, &field.name, &argument.ty)?;
            }
        }
        Ok(())
    }

    fn check_named_type(
        &self,
        type_name: &str,
        field: &str,
        ty: &TypeRef,
    ) -> Result<(), SchemaError> {
        let referenced = ty.named_type();
        if self.get_type(referenced).is_none() {
            return Err(SchemaError::UnknownFieldType {
                type_name: type_name.to_string(),
                field: field.to_string(),
                referenced: referenced.to_string(),
            });
        }
        Ok(())
    }

    fn check_interfaces(&self, type_name: &str, implements: &[String]) -> Result<(), SchemaError> {
        for interface in implements {
            if !matches!(self.get_type(interface), Some(TypeDef::Interface(_))) {
                return Err(SchemaError::UnknownInterface {
                    type_name: type_name.to_string(),
                    interface: interface.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Schema builder. Seeds the built-in scalars and the `@skip`,
/// `@include`, and `@deprecated` directives.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new() -> Self {
        let mut builder = Self::default();
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            builder
                .schema
                .types
                .insert(name.to_string(), TypeDef::Scalar(builtin_scalar(name)));
        }
        for directive in specified_directives() {
            builder
                .schema
                .directives
                .insert(directive.name.clone(), directive);
        }
        builder
    }

    /// Sets the schema description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }

    /// Sets the query root type.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.schema.query_type = Some(name.into());
        self
    }

    /// Sets the mutation root type.
    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.schema.mutation_type = Some(name.into());
        self
    }

    /// Sets the subscription root type.
    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.schema.subscription_type = Some(name.into());
        self
    }

    /// Adds a type.
    #[must_use]
    pub fn add_type(mut self, type_def: impl Into<TypeDef>) -> Self {
        let type_def = type_def.into();
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Adds a directive definition.
    #[must_use]
    pub fn add_directive(mut self, directive: DirectiveDefinition) -> Self {
        self.schema
            .directives
            .insert(directive.name.clone(), directive);
        self
    }

    /// Builds the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        self.schema
    }
}

fn specified_directives() -> Vec<DirectiveDefinition> {
    let condition = || InputValueDef::new("if", TypeRef::non_null(TypeRef::named("Boolean")));
    vec![
        DirectiveDefinition::new("skip")
            .with_description("Omits the selection when the condition is true.")
            .with_argument(condition())
            .with_location(DirectiveLocation::Field)
            .with_location(DirectiveLocation::FragmentSpread)
            .with_location(DirectiveLocation::InlineFragment),
        DirectiveDefinition::new("include")
            .with_description("Includes the selection only when the condition is true.")
            .with_argument(condition())
            .with_location(DirectiveLocation::Field)
            .with_location(DirectiveLocation::FragmentSpread)
            .with_location(DirectiveLocation::InlineFragment),
        DirectiveDefinition::new("deprecated")
            .with_description("Marks a field or enum value as deprecated.")
            .with_argument(
                InputValueDef::new("reason", TypeRef::named("String"))
                    .with_default(serde_json::Value::String("No longer supported".to_string())),
            )
            .with_location(DirectiveLocation::FieldDefinition)
            .with_location(DirectiveLocation::EnumValue),
    ]
}
