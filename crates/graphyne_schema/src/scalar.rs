//! Leaf value behavior: built-in scalars and enum membership.
//!
//! Serialization (result side) is slightly lenient where a lossless
//! coercion exists; parsing (input side) is strict, mirroring the
//! usual reference behavior for variables and literals.

use serde_json::{Number, Value};

use crate::definition::{EnumDef, ScalarDef};

const INT_MIN: i64 = i32::MIN as i64;
const INT_MAX: i64 = i32::MAX as i64;

impl ScalarDef {
    /// Serializes a resolved value into result form.
    pub fn serialize(&self, value: &Value) -> Result<Value, String> {
        match &self.serialize {
            Some(hook) => hook(value),
            None => Ok(value.clone()),
        }
    }

    /// Parses an input value (variable or literal) into internal form.
    pub fn parse(&self, value: &Value) -> Result<Value, String> {
        match &self.parse {
            Some(hook) => hook(value),
            None => Ok(value.clone()),
        }
    }
}

impl EnumDef {
    /// Serializes a resolved value, which must name a declared member.
    pub fn serialize(&self, value: &Value) -> Result<Value, String> {
        match value {
            Value::String(name) if self.has_value(name) => Ok(value.clone()),
            _ => Err(format!(
                "Enum \"{}\" cannot represent value: {value}",
                self.name
            )),
        }
    }

    /// Parses an input value, which must name a declared member.
    pub fn parse(&self, value: &Value) -> Result<Value, String> {
        match value {
            Value::String(name) if self.has_value(name) => Ok(value.clone()),
            _ => Err(format!(
                "Value {value} does not exist in \"{}\" enum",
                self.name
            )),
        }
    }
}

/// Builds one of the five built-in scalar definitions with its
/// coercion hooks installed.
pub(crate) fn builtin_scalar(name: &str) -> ScalarDef {
    let def = ScalarDef::new(name).with_description(format!("Built-in {name} scalar"));
    match name {
        "Int" => def.with_serialize(coerce_int).with_parse(coerce_int),
        "Float" => def.with_serialize(coerce_float).with_parse(coerce_float),
        "String" => def.with_serialize(serialize_string).with_parse(parse_string),
        "Boolean" => def
            .with_serialize(serialize_boolean)
            .with_parse(parse_boolean),
        "ID" => def.with_serialize(coerce_id).with_parse(coerce_id),
        _ => def,
    }
}

fn coerce_int(value: &Value) -> Result<Value, String> {
    let Value::Number(number) = value else {
        return Err(format!("Int cannot represent non-integer value: {value}"));
    };
    if let Some(int) = number.as_i64() {
        if (INT_MIN..=INT_MAX).contains(&int) {
            return Ok(Value::Number(Number::from(int)));
        }
        return Err(format!(
            "Int cannot represent non 32-bit signed integer value: {value}"
        ));
    }
    if let Some(float) = number.as_f64() {
        if float.fract() == 0.0 && (INT_MIN as f64..=INT_MAX as f64).contains(&float) {
            return Ok(Value::Number(Number::from(float as i64)));
        }
        if float.fract() == 0.0 {
            return Err(format!(
                "Int cannot represent non 32-bit signed integer value: {value}"
            ));
        }
    }
    Err(format!("Int cannot represent non-integer value: {value}"))
}

fn coerce_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        _ => Err(format!("Float cannot represent non numeric value: {value}")),
    }
}

fn serialize_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        _ => Err(format!("String cannot represent value: {value}")),
    }
}

fn parse_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        _ => Err(format!("String cannot represent a non string value: {value}")),
    }
}

fn serialize_boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        _ => Err(format!(
            "Boolean cannot represent a non boolean value: {value}"
        )),
    }
}

fn parse_boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        _ => Err(format!(
            "Boolean cannot represent a non boolean value: {value}"
        )),
    }
}

fn coerce_id(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(int) => Ok(Value::String(int.to_string())),
            None => Err(format!("ID cannot represent value: {value}")),
        },
        _ => Err(format!("ID cannot represent value: {value}")),
    }
}
