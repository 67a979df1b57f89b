//! Executable document AST.
//!
//! Nodes are fully owned so selections can move into spawned tasks
//! without borrowing from a parse arena. Construction goes through
//! small builder methods; parsing is a separate concern.

use crate::span::Span;
use crate::ty::TypeRef;

/// A complete executable document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation definition.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationDefinition) -> Self {
        self.definitions.push(Definition::Operation(operation));
        self
    }

    /// Adds a fragment definition.
    #[must_use]
    pub fn with_fragment(mut self, fragment: FragmentDefinition) -> Self {
        self.definitions.push(Definition::Fragment(fragment));
        self
    }

    /// Iterates over the operation definitions in document order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    /// Iterates over the fragment definitions in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(fragment) => Some(fragment),
            Definition::Operation(_) => None,
        })
    }
}

/// A top-level executable definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

/// The three operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        };
        write!(f, "{name}")
    }
}

/// An operation definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<DirectiveNode>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

impl OperationDefinition {
    /// Creates a query operation over the given selection set.
    #[must_use]
    pub fn query(selection_set: SelectionSet) -> Self {
        Self::new(OperationKind::Query, selection_set)
    }

    /// Creates a mutation operation over the given selection set.
    #[must_use]
    pub fn mutation(selection_set: SelectionSet) -> Self {
        Self::new(OperationKind::Mutation, selection_set)
    }

    /// Creates a subscription operation over the given selection set.
    #[must_use]
    pub fn subscription(selection_set: SelectionSet) -> Self {
        Self::new(OperationKind::Subscription, selection_set)
    }

    /// Creates an operation of the given kind.
    #[must_use]
    pub fn new(kind: OperationKind, selection_set: SelectionSet) -> Self {
        Self {
            kind,
            name: None,
            variable_definitions: Vec::new(),
            directives: Vec::new(),
            selection_set,
            span: Span::default(),
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a variable definition.
    #[must_use]
    pub fn with_variable(mut self, variable: VariableDefinition) -> Self {
        self.variable_definitions.push(variable);
        self
    }

    /// Adds a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A variable declared on an operation, e.g. `$id: ID!`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
    pub span: Span,
}

impl VariableDefinition {
    /// Creates a variable definition.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
            span: Span::default(),
        }
    }

    /// Sets the default value literal.
    #[must_use]
    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A set of selections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
    pub span: Span,
}

impl SelectionSet {
    /// Creates a selection set from the given selections.
    #[must_use]
    pub fn new(selections: Vec<Selection>) -> Self {
        Self {
            selections,
            span: Span::default(),
        }
    }

    /// Returns true if the set selects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

impl FromIterator<Selection> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = Selection>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A single selection inside a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(FieldNode),
    FragmentSpread(FragmentSpreadNode),
    InlineFragment(InlineFragmentNode),
}

/// A field selection, e.g. `avatar: picture(size: 64) { url }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub directives: Vec<DirectiveNode>,
    pub selection_set: Option<SelectionSet>,
    pub span: Span,
}

impl FieldNode {
    /// Creates a field selection with no alias, arguments, or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: None,
            span: Span::default(),
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.push(Argument::new(name, value));
        self
    }

    /// Adds a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// Sets the sub-selection set.
    #[must_use]
    pub fn with_selection_set(mut self, selection_set: SelectionSet) -> Self {
        self.selection_set = Some(selection_set);
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The key this field occupies in the response: alias if present,
    /// otherwise the field name.
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl From<FieldNode> for Selection {
    fn from(field: FieldNode) -> Self {
        Self::Field(field)
    }
}

/// A named fragment spread, e.g. `...userFields`.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpreadNode {
    pub name: String,
    pub directives: Vec<DirectiveNode>,
    pub span: Span,
}

impl FragmentSpreadNode {
    /// Creates a fragment spread.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: Vec::new(),
            span: Span::default(),
        }
    }

    /// Adds a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl From<FragmentSpreadNode> for Selection {
    fn from(spread: FragmentSpreadNode) -> Self {
        Self::FragmentSpread(spread)
    }
}

/// An inline fragment, e.g. `... on User { name }`.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragmentNode {
    pub type_condition: Option<String>,
    pub directives: Vec<DirectiveNode>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

impl InlineFragmentNode {
    /// Creates an inline fragment with no type condition.
    #[must_use]
    pub fn new(selection_set: SelectionSet) -> Self {
        Self {
            type_condition: None,
            directives: Vec::new(),
            selection_set,
            span: Span::default(),
        }
    }

    /// Sets the type condition.
    #[must_use]
    pub fn with_type_condition(mut self, type_condition: impl Into<String>) -> Self {
        self.type_condition = Some(type_condition.into());
        self
    }

    /// Adds a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl From<InlineFragmentNode> for Selection {
    fn from(fragment: InlineFragmentNode) -> Self {
        Self::InlineFragment(fragment)
    }
}

/// A named fragment definition, e.g. `fragment userFields on User { … }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub directives: Vec<DirectiveNode>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

impl FragmentDefinition {
    /// Creates a fragment definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        type_condition: impl Into<String>,
        selection_set: SelectionSet,
    ) -> Self {
        Self {
            name: name.into(),
            type_condition: type_condition.into(),
            directives: Vec::new(),
            selection_set,
            span: Span::default(),
        }
    }

    /// Adds a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A directive application, e.g. `@include(if: $detailed)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveNode {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

impl DirectiveNode {
    /// Creates a directive application.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            span: Span::default(),
        }
    }

    /// Adds an argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.push(Argument::new(name, value));
        self
    }

    /// Sets the source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Looks up an argument value by name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

/// A named argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Value,
    pub span: Span,
}

impl Argument {
    /// Creates an argument.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            span: Span::default(),
        }
    }
}

/// A literal value as written in a document.
///
/// `Variable` stands for a `$name` reference and is only meaningful
/// where variable values are in scope. Object fields keep document
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Creates a variable reference.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Creates an enum literal.
    #[must_use]
    pub fn enum_value(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
