//! Error and response types for execution.
//!
//! Field errors accumulate during execution and surface in the
//! response alongside partial data. Request errors abort before any
//! field runs and produce a response with no data at all.

use std::collections::HashMap;

use graphyne_ast::{OperationKind, Span};
use graphyne_schema::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One step in a response path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Field(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Field(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An error raised while executing one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Error message.
    pub message: String,

    /// Source spans of the field nodes involved.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Span>,

    /// Response path from the root to the failing field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, Value>>,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }

    /// Attaches source locations, skipping empty spans.
    #[must_use]
    pub fn located(mut self, spans: impl IntoIterator<Item = Span>) -> Self {
        self.locations
            .extend(spans.into_iter().filter(|span| !span.is_empty()));
        self
    }

    /// Sets the response path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// Adds an extension entry.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Adds an error code extension.
    #[must_use]
    pub fn with_code(self, code: impl Into<String>) -> Self {
        self.with_extension("code", Value::String(code.into()))
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The result of executing an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The data produced, if execution began.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Errors accumulated during execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl Response {
    /// Creates a response from data and an error list, omitting the
    /// error key when the list is empty.
    #[must_use]
    pub fn new(data: Value, errors: Vec<FieldError>) -> Self {
        Self {
            data: Some(data),
            errors: if errors.is_empty() {
                None
            } else {
                Some(errors)
            },
        }
    }

    /// Creates a successful response.
    #[must_use]
    pub fn data(value: Value) -> Self {
        Self {
            data: Some(value),
            errors: None,
        }
    }

    /// Creates a response carrying only errors, with no data key.
    #[must_use]
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    /// Returns true if any errors were recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// Returns true if any data was produced.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// A single variable that failed coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableError {
    pub variable: String,
    pub message: String,
    pub span: Span,
}

impl VariableError {
    pub(crate) fn new(variable: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self {
            variable: variable.into(),
            message: message.into(),
            span,
        }
    }

    /// Converts into a response-level field error.
    #[must_use]
    pub fn into_field_error(self) -> FieldError {
        FieldError::new(self.message).located([self.span])
    }
}

impl std::fmt::Display for VariableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A failure raised before any field executes. These abort the
/// request and surface as a response with no data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    #[error("document contains no executable operations")]
    NoOperation,

    #[error("operation \"{0}\" is not defined in the document")]
    UnknownOperation(String),

    #[error("operation name is required when a document contains multiple operations")]
    AmbiguousOperation,

    #[error("schema does not define a {0} root type")]
    NoRootType(OperationKind),

    #[error("{} variable value(s) failed coercion", .0.len())]
    Variables(Vec<VariableError>),

    #[error("directive \"@{directive}\" references undefined variable \"${variable}\"")]
    UnresolvedDirectiveVariable {
        directive: String,
        variable: String,
        span: Span,
    },
}

impl RequestError {
    /// Converts the failure into an errors-only response.
    #[must_use]
    pub fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            Self::Variables(errors) => Response::from_errors(
                errors
                    .into_iter()
                    .map(VariableError::into_field_error)
                    .collect(),
            ),
            Self::UnresolvedDirectiveVariable { span, .. } => {
                Response::from_errors(vec![FieldError::new(message).located([span])])
            }
            _ => Response::from_errors(vec![FieldError::new(message)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_segment_serializes_untagged() {
        let path = vec![
            PathSegment::from("users"),
            PathSegment::from(2),
            PathSegment::from("name"),
        ];
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, json!(["users", 2, "name"]));
    }

    #[test]
    fn test_field_error_builder() {
        let error = FieldError::new("boom")
            .located([Span::new(4, 9)])
            .with_path(vec!["user".into(), "name".into()])
            .with_code("INTERNAL");
        assert_eq!(error.message, "boom");
        assert_eq!(error.locations, vec![Span::new(4, 9)]);
        assert_eq!(
            error.path,
            Some(vec![
                PathSegment::Field("user".to_string()),
                PathSegment::Field("name".to_string())
            ])
        );
        assert_eq!(
            error.extensions.unwrap().get("code"),
            Some(&json!("INTERNAL"))
        );
    }

    #[test]
    fn test_located_skips_empty_spans() {
        let error = FieldError::new("x").located([Span::default(), Span::new(1, 3)]);
        assert_eq!(error.locations, vec![Span::new(1, 3)]);
    }

    #[test]
    fn test_response_serialization_omits_absent_keys() {
        let ok = Response::data(json!({"a": 1}));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"data": {"a": 1}}));

        let failed = Response::from_errors(vec![FieldError::new("nope")]);
        let json = serde_json::to_value(&failed).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["errors"][0]["message"], "nope");
    }

    #[test]
    fn test_response_new_drops_empty_error_list() {
        let response = Response::new(json!(null), Vec::new());
        assert!(!response.has_errors());
        assert!(response.has_data());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"data": null})
        );
    }

    #[test]
    fn test_request_error_into_response() {
        let response = RequestError::AmbiguousOperation.into_response();
        assert!(!response.has_data());
        assert!(response.has_errors());

        let variables = RequestError::Variables(vec![VariableError::new(
            "id",
            "Variable \"$id\" got invalid value",
            Span::new(2, 5),
        )]);
        let response = variables.into_response();
        let errors = response.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].locations, vec![Span::new(2, 5)]);
    }
}
