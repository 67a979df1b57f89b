//! Input coercion: variable values, argument values, and literals.
//!
//! Variables arrive as JSON and are coerced against their declared
//! types once per request. Argument literals are coerced per field,
//! with variable references substituting the already-coerced values.

use graphyne_ast as ast;
use graphyne_ast::{DirectiveNode, FieldNode, OperationDefinition, Span, TypeRef};
use graphyne_schema::{FieldDef, Schema, TypeDef};
use serde_json::{Map, Number, Value};

use crate::error::{FieldError, RequestError, VariableError};
use crate::resolver::ResolverArgs;

/// Coerced variable values keyed by variable name.
pub type VariableValues = Map<String, Value>;

/// A directive condition that could not be resolved because the
/// referenced variable has no usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirectiveVariableError {
    pub directive: String,
    pub variable: String,
    pub span: Span,
}

impl From<DirectiveVariableError> for RequestError {
    fn from(error: DirectiveVariableError) -> Self {
        Self::UnresolvedDirectiveVariable {
            directive: error.directive,
            variable: error.variable,
            span: error.span,
        }
    }
}

impl From<DirectiveVariableError> for FieldError {
    fn from(error: DirectiveVariableError) -> Self {
        let span = error.span;
        Self::new(RequestError::from(error).to_string()).located([span])
    }
}

/// Coerces provided variable values against the operation's variable
/// definitions. Collects up to `max_errors` failures before aborting.
pub(crate) fn coerce_variable_values(
    schema: &Schema,
    operation: &OperationDefinition,
    provided: &VariableValues,
    max_errors: usize,
) -> Result<VariableValues, Vec<VariableError>> {
    let mut coerced = VariableValues::new();
    let mut errors = Vec::new();

    for definition in &operation.variable_definitions {
        if errors.len() >= max_errors {
            errors.push(VariableError::new(
                definition.name.clone(),
                "Too many errors processing variables, error limit reached",
                definition.span,
            ));
            break;
        }

        let name = &definition.name;
        let ty = &definition.ty;

        if !is_input_type(schema, ty) {
            errors.push(VariableError::new(
                name.clone(),
                format!(
                    "Variable \"${name}\" expected value of type \"{ty}\" which cannot be used as an input type"
                ),
                definition.span,
            ));
            continue;
        }

        let Some(value) = provided.get(name) else {
            if let Some(default) = &definition.default_value {
                match coerce_input_literal(schema, ty, default, &VariableValues::new()) {
                    Ok(Some(value)) => {
                        coerced.insert(name.clone(), value);
                    }
                    Ok(None) => {
                        errors.push(VariableError::new(
                            name.clone(),
                            format!("Variable \"${name}\" has an invalid default value"),
                            definition.span,
                        ));
                    }
                    Err(detail) => {
                        errors.push(VariableError::new(
                            name.clone(),
                            format!("Variable \"${name}\" has an invalid default value: {detail}"),
                            definition.span,
                        ));
                    }
                }
            } else if ty.is_non_null() {
                errors.push(VariableError::new(
                    name.clone(),
                    format!("Variable \"${name}\" of required type \"{ty}\" was not provided"),
                    definition.span,
                ));
            }
            continue;
        };

        if value.is_null() && ty.is_non_null() {
            errors.push(VariableError::new(
                name.clone(),
                format!("Variable \"${name}\" of non-null type \"{ty}\" must not be null"),
                definition.span,
            ));
            continue;
        }

        match coerce_input_json(schema, ty, value) {
            Ok(value) => {
                coerced.insert(name.clone(), value);
            }
            Err(detail) => {
                errors.push(VariableError::new(
                    name.clone(),
                    format!("Variable \"${name}\" got invalid value {value}: {detail}"),
                    definition.span,
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerces the arguments of one field node against its definition.
pub(crate) fn coerce_argument_values(
    schema: &Schema,
    field_def: &FieldDef,
    node: &FieldNode,
    variables: &VariableValues,
) -> Result<ResolverArgs, FieldError> {
    let mut args = ResolverArgs::new();

    for (arg_name, arg_def) in &field_def.arguments {
        let argument = node.arguments.iter().find(|arg| &arg.name == arg_name);
        let error_span = argument.map_or(node.span, |arg| arg.span);

        // A variable reference with no provided value behaves exactly
        // like an omitted argument.
        let supplied: Option<&ast::Value> = match argument.map(|arg| &arg.value) {
            Some(ast::Value::Variable(var)) if !variables.contains_key(var.as_str()) => None,
            other => other,
        };

        let Some(literal) = supplied else {
            if let Some(default) = &arg_def.default_value {
                args.set(arg_name.clone(), default.clone());
            } else if arg_def.ty.is_non_null() {
                return Err(FieldError::new(format!(
                    "Argument \"{arg_name}\" of required type \"{}\" was not provided",
                    arg_def.ty
                ))
                .located([error_span]));
            }
            continue;
        };

        if let ast::Value::Variable(var) = literal {
            // Variable values were coerced against their own declared
            // types up front; substitute them directly.
            let value = variables.get(var.as_str()).cloned().unwrap_or(Value::Null);
            if value.is_null() && arg_def.ty.is_non_null() {
                return Err(FieldError::new(format!(
                    "Argument \"{arg_name}\" of non-null type \"{}\" must not be null",
                    arg_def.ty
                ))
                .located([error_span]));
            }
            args.set(arg_name.clone(), value);
            continue;
        }

        if matches!(literal, ast::Value::Null) && arg_def.ty.is_non_null() {
            return Err(FieldError::new(format!(
                "Argument \"{arg_name}\" of non-null type \"{}\" must not be null",
                arg_def.ty
            ))
            .located([error_span]));
        }

        match coerce_input_literal(schema, &arg_def.ty, literal, variables) {
            Ok(Some(value)) => args.set(arg_name.clone(), value),
            Ok(None) => {
                return Err(FieldError::new(format!(
                    "Argument \"{arg_name}\" has invalid value"
                ))
                .located([error_span]));
            }
            Err(detail) => {
                return Err(FieldError::new(format!(
                    "Argument \"{arg_name}\" has invalid value: {detail}"
                ))
                .located([error_span]));
            }
        }
    }

    Ok(args)
}

/// Evaluates a boolean `if` condition directive on a node. Returns
/// `None` when the directive is absent, and an error when it names a
/// variable with no usable value.
pub(crate) fn directive_flag(
    directives: &[DirectiveNode],
    name: &str,
    variables: &VariableValues,
) -> Result<Option<bool>, DirectiveVariableError> {
    let Some(directive) = directives.iter().find(|d| d.name == name) else {
        return Ok(None);
    };

    match directive.argument("if") {
        Some(ast::Value::Variable(var)) => match variables.get(var.as_str()) {
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(Value::Null) | None => Err(DirectiveVariableError {
                directive: name.to_string(),
                variable: var.clone(),
                span: directive.span,
            }),
            Some(_) => Ok(Some(false)),
        },
        Some(ast::Value::Boolean(flag)) => Ok(Some(*flag)),
        // The condition only applies when it is exactly `true`.
        Some(_) => Ok(Some(false)),
        None => Ok(None),
    }
}

/// Returns true if the type can be used in input positions.
fn is_input_type(schema: &Schema, ty: &TypeRef) -> bool {
    matches!(
        schema.get_type(ty.named_type()),
        Some(TypeDef::Scalar(_) | TypeDef::Enum(_) | TypeDef::InputObject(_))
    )
}

/// Coerces a runtime JSON value (a variable) against an input type.
pub(crate) fn coerce_input_json(
    schema: &Schema,
    ty: &TypeRef,
    value: &Value,
) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null"));
            }
            coerce_input_json(schema, inner, value)
        }
        TypeRef::List(inner) => match value {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item = coerce_input_json(schema, inner, item)
                        .map_err(|detail| format!("at index {index}: {detail}"))?;
                    coerced.push(item);
                }
                Ok(Value::Array(coerced))
            }
            // A single value coerces to a list of one.
            other => Ok(Value::Array(vec![coerce_input_json(schema, inner, other)?])),
        },
        TypeRef::Named(name) => {
            if value.is_null() {
                return Ok(Value::Null);
            }
            match schema.get_type(name) {
                Some(TypeDef::Scalar(def)) => def.parse(value),
                Some(TypeDef::Enum(def)) => def.parse(value),
                Some(TypeDef::InputObject(def)) => {
                    let Value::Object(fields) = value else {
                        return Err(format!("Expected type \"{name}\" to be an object"));
                    };
                    let mut coerced = Map::new();
                    for (field_name, field_def) in &def.fields {
                        match fields.get(field_name) {
                            Some(field_value) => {
                                let field_value =
                                    coerce_input_json(schema, &field_def.ty, field_value).map_err(
                                        |detail| format!("in field \"{field_name}\": {detail}"),
                                    )?;
                                coerced.insert(field_name.clone(), field_value);
                            }
                            None => {
                                if let Some(default) = &field_def.default_value {
                                    coerced.insert(field_name.clone(), default.clone());
                                } else if field_def.ty.is_non_null() {
                                    return Err(format!(
                                        "Field \"{field_name}\" of required type \"{}\" was not provided",
                                        field_def.ty
                                    ));
                                }
                            }
                        }
                    }
                    for key in fields.keys() {
                        if !def.fields.contains_key(key) {
                            return Err(format!(
                                "Field \"{key}\" is not defined by type \"{name}\""
                            ));
                        }
                    }
                    Ok(Value::Object(coerced))
                }
                Some(_) => Err(format!("Type \"{name}\" cannot be used as an input type")),
                None => Err(format!("Unknown type \"{name}\"")),
            }
        }
    }
}

/// Coerces a document literal against an input type. `Ok(None)` means
/// the literal has no usable value, which happens when a nested
/// variable reference was not provided.
pub(crate) fn coerce_input_literal(
    schema: &Schema,
    ty: &TypeRef,
    literal: &ast::Value,
    variables: &VariableValues,
) -> Result<Option<Value>, String> {
    if let ast::Value::Variable(var) = literal {
        return Ok(match variables.get(var.as_str()) {
            Some(value) if value.is_null() && ty.is_non_null() => None,
            Some(value) => Some(value.clone()),
            None => None,
        });
    }

    match ty {
        TypeRef::NonNull(inner) => {
            if matches!(literal, ast::Value::Null) {
                return Err(format!(
                    "Expected value of non-null type \"{ty}\", found null"
                ));
            }
            coerce_input_literal(schema, inner, literal, variables)
        }
        TypeRef::List(inner) => match literal {
            ast::Value::Null => Ok(Some(Value::Null)),
            ast::Value::List(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match coerce_input_literal(schema, inner, item, variables)
                        .map_err(|detail| format!("at index {index}: {detail}"))?
                    {
                        Some(value) => coerced.push(value),
                        // An unprovided variable in a nullable item
                        // position becomes null; in a non-null
                        // position it poisons the whole list.
                        None if inner.is_non_null() => return Ok(None),
                        None => coerced.push(Value::Null),
                    }
                }
                Ok(Some(Value::Array(coerced)))
            }
            other => Ok(coerce_input_literal(schema, inner, other, variables)?
                .map(|value| Value::Array(vec![value]))),
        },
        TypeRef::Named(name) => {
            if matches!(literal, ast::Value::Null) {
                return Ok(Some(Value::Null));
            }
            match schema.get_type(name) {
                Some(TypeDef::Scalar(def)) => match literal_to_json(literal, variables)? {
                    Some(raw) => def.parse(&raw).map(Some),
                    None => Ok(None),
                },
                Some(TypeDef::Enum(def)) => match literal {
                    ast::Value::Enum(member) if def.has_value(member) => {
                        Ok(Some(Value::String(member.clone())))
                    }
                    _ => Err(format!("Expected value of type \"{}\"", def.name)),
                },
                Some(TypeDef::InputObject(def)) => {
                    let ast::Value::Object(pairs) = literal else {
                        return Err(format!("Expected value of type \"{name}\" to be an object"));
                    };
                    let mut coerced = Map::new();
                    for (field_name, field_def) in &def.fields {
                        let supplied = pairs
                            .iter()
                            .find(|(key, _)| key == field_name)
                            .map(|(_, value)| value);
                        match supplied {
                            Some(field_literal) => {
                                match coerce_input_literal(
                                    schema,
                                    &field_def.ty,
                                    field_literal,
                                    variables,
                                )
                                .map_err(|detail| format!("in field \"{field_name}\": {detail}"))?
                                {
                                    Some(value) => {
                                        coerced.insert(field_name.clone(), value);
                                    }
                                    None if field_def.ty.is_non_null() => return Ok(None),
                                    None => {}
                                }
                            }
                            None => {
                                if let Some(default) = &field_def.default_value {
                                    coerced.insert(field_name.clone(), default.clone());
                                } else if field_def.ty.is_non_null() {
                                    return Err(format!(
                                        "Field \"{field_name}\" of required type \"{}\" was not provided",
                                        field_def.ty
                                    ));
                                }
                            }
                        }
                    }
                    for (key, _) in pairs {
                        if !def.fields.contains_key(key) {
                            return Err(format!(
                                "Field \"{key}\" is not defined by type \"{name}\""
                            ));
                        }
                    }
                    Ok(Some(Value::Object(coerced)))
                }
                Some(_) => Err(format!("Type \"{name}\" cannot be used as an input type")),
                None => Err(format!("Unknown type \"{name}\"")),
            }
        }
    }
}

/// Converts a literal to plain JSON, substituting variables. Custom
/// scalar hooks receive this raw form.
fn literal_to_json(
    literal: &ast::Value,
    variables: &VariableValues,
) -> Result<Option<Value>, String> {
    Ok(match literal {
        ast::Value::Variable(var) => variables.get(var.as_str()).cloned(),
        ast::Value::Int(int) => Some(Value::Number(Number::from(*int))),
        ast::Value::Float(float) => Some(Value::Number(
            Number::from_f64(*float).ok_or("Float literal is not finite")?,
        )),
        ast::Value::String(string) => Some(Value::String(string.clone())),
        ast::Value::Boolean(boolean) => Some(Value::Bool(*boolean)),
        ast::Value::Null => Some(Value::Null),
        ast::Value::Enum(name) => Some(Value::String(name.clone())),
        ast::Value::List(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                match literal_to_json(item, variables)? {
                    Some(value) => converted.push(value),
                    None => return Ok(None),
                }
            }
            Some(Value::Array(converted))
        }
        ast::Value::Object(pairs) => {
            let mut converted = Map::new();
            for (key, item) in pairs {
                match literal_to_json(item, variables)? {
                    Some(value) => {
                        converted.insert(key.clone(), value);
                    }
                    None => return Ok(None),
                }
            }
            Some(Value::Object(converted))
        }
    })
}
