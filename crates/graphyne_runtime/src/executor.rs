//! Request execution: operation selection, concurrent field
//! execution, and value completion.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use graphyne_ast::{Document, FieldNode, OperationDefinition, OperationKind};
use graphyne_schema::{FieldDef, ObjectDef, Schema, TypeDef, TypeRef, TypeResolverFn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::collect::{collect_fields, collect_subfields, fragment_map, CollectedFields, FragmentMap};
use crate::error::{FieldError, RequestError, Response};
use crate::path::Path;
use crate::resolver::{Resolver, ResolverInfo, ResolverMap, SubscribeResolver};
use crate::values::{coerce_argument_values, coerce_variable_values, VariableValues};

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of variable coercion errors reported per request.
    pub max_variable_errors: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_variable_errors: 50,
        }
    }
}

/// The request executor.
///
/// Holds the resolver registry and configuration. One executor serves
/// any number of requests concurrently.
#[derive(Debug)]
pub struct Executor {
    config: ExecutorConfig,
    resolvers: Arc<ResolverMap>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Creates a new executor.
    pub fn new() -> Self {
        Self {
            config: ExecutorConfig::default(),
            resolvers: Arc::new(ResolverMap::new()),
        }
    }

    /// Creates an executor with configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            resolvers: Arc::new(ResolverMap::new()),
        }
    }

    /// Creates an executor with resolvers.
    pub fn with_resolvers(resolvers: ResolverMap) -> Self {
        Self {
            config: ExecutorConfig::default(),
            resolvers: Arc::new(resolvers),
        }
    }

    /// Creates an executor with config and resolvers.
    pub fn new_with(config: ExecutorConfig, resolvers: ResolverMap) -> Self {
        Self {
            config,
            resolvers: Arc::new(resolvers),
        }
    }

    /// Gets a reference to the resolvers.
    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    /// Executes a request to completion.
    ///
    /// Request-level failures (no usable operation, variable coercion,
    /// invalid schema) come back as `Err`; field failures are absorbed
    /// into the response per null propagation.
    pub async fn execute(
        &self,
        request: ExecuteRequest,
        schema: &Schema,
        ctx: &Context,
    ) -> Result<Response, RequestError> {
        let exe = self.build_execution_context(schema, &request, ctx)?;
        execute_operation(&exe).await
    }

    /// Builds the per-request execution context: validates the schema,
    /// selects the operation, and coerces variable values.
    pub(crate) fn build_execution_context(
        &self,
        schema: &Schema,
        request: &ExecuteRequest,
        ctx: &Context,
    ) -> Result<ExecutionContext, RequestError> {
        schema.validate()?;

        let mut selected: Option<&OperationDefinition> = None;
        match &request.operation_name {
            Some(name) => {
                selected = request
                    .document
                    .operations()
                    .find(|op| op.name.as_deref() == Some(name.as_str()));
                if selected.is_none() {
                    return Err(RequestError::UnknownOperation(name.clone()));
                }
            }
            None => {
                for operation in request.document.operations() {
                    if selected.is_some() {
                        return Err(RequestError::AmbiguousOperation);
                    }
                    selected = Some(operation);
                }
            }
        }
        let operation = selected.ok_or(RequestError::NoOperation)?;

        let variable_values = coerce_variable_values(
            schema,
            operation,
            &request.variables,
            self.config.max_variable_errors,
        )
        .map_err(RequestError::Variables)?;

        Ok(ExecutionContext {
            schema: Arc::new(schema.clone()),
            fragments: Arc::new(fragment_map(&request.document)),
            operation: Arc::new(operation.clone()),
            variable_values: Arc::new(variable_values),
            root_value: Arc::new(request.root_value.clone()),
            ctx: Arc::new(ctx.clone()),
            resolvers: Arc::clone(&self.resolvers),
            field_resolver: request.field_resolver.clone(),
            subscribe_resolver: request.subscribe_resolver.clone(),
            type_resolver: request.type_resolver.clone(),
            errors: Arc::new(RwLock::new(Vec::new())),
        })
    }
}

/// Request-scoped user context handed to every resolver.
#[derive(Debug, Clone)]
pub struct Context {
    /// Request-scoped data.
    pub data: HashMap<String, Value>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a new context.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Sets a value in the context.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.into(), v);
        }
    }

    /// Gets a value from the context.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// One execution request: the parsed document plus per-request inputs
/// and optional resolver fallbacks.
#[derive(Clone)]
pub struct ExecuteRequest {
    /// The parsed executable document.
    pub document: Arc<Document>,
    /// Which operation to run when the document holds several.
    pub operation_name: Option<String>,
    /// Raw variable values, coerced during context construction.
    pub variables: VariableValues,
    /// The value the root type's resolvers receive as parent.
    pub root_value: Value,
    /// Fallback resolver for fields with no registered resolver.
    pub field_resolver: Option<Arc<dyn Resolver>>,
    /// Fallback subscribe resolver for subscription roots.
    pub subscribe_resolver: Option<Arc<dyn SubscribeResolver>>,
    /// Fallback type resolver for abstract types without hooks.
    pub type_resolver: Option<TypeResolverFn>,
}

impl ExecuteRequest {
    /// Creates a request for the given document.
    pub fn new(document: impl Into<Arc<Document>>) -> Self {
        Self {
            document: document.into(),
            operation_name: None,
            variables: VariableValues::new(),
            root_value: Value::Null,
            field_resolver: None,
            subscribe_resolver: None,
            type_resolver: None,
        }
    }

    /// Selects an operation by name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the variable values.
    #[must_use]
    pub fn with_variables(mut self, variables: VariableValues) -> Self {
        self.variables = variables;
        self
    }

    /// Sets the root value.
    #[must_use]
    pub fn with_root_value(mut self, root_value: Value) -> Self {
        self.root_value = root_value;
        self
    }

    /// Sets the fallback field resolver.
    #[must_use]
    pub fn with_field_resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.field_resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the fallback subscribe resolver.
    #[must_use]
    pub fn with_subscribe_resolver<S: SubscribeResolver + 'static>(mut self, resolver: S) -> Self {
        self.subscribe_resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the fallback type resolver.
    #[must_use]
    pub fn with_type_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }
}

impl std::fmt::Debug for ExecuteRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteRequest")
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .field("root_value", &self.root_value)
            .field("field_resolver", &self.field_resolver.is_some())
            .field("subscribe_resolver", &self.subscribe_resolver.is_some())
            .field("type_resolver", &self.type_resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything one request's field executions share. Cloned freely into
/// spawned tasks; all heavy state sits behind `Arc`.
#[derive(Clone)]
pub(crate) struct ExecutionContext {
    pub(crate) schema: Arc<Schema>,
    pub(crate) fragments: Arc<FragmentMap>,
    pub(crate) operation: Arc<OperationDefinition>,
    pub(crate) variable_values: Arc<VariableValues>,
    pub(crate) root_value: Arc<Value>,
    pub(crate) ctx: Arc<Context>,
    pub(crate) resolvers: Arc<ResolverMap>,
    pub(crate) field_resolver: Option<Arc<dyn Resolver>>,
    pub(crate) subscribe_resolver: Option<Arc<dyn SubscribeResolver>>,
    pub(crate) type_resolver: Option<TypeResolverFn>,
    pub(crate) errors: Arc<RwLock<Vec<FieldError>>>,
}

impl ExecutionContext {
    pub(crate) async fn push_error(&self, error: FieldError) {
        self.errors.write().await.push(error);
    }

    pub(crate) async fn take_errors(&self) -> Vec<FieldError> {
        std::mem::take(&mut *self.errors.write().await)
    }
}

/// Runs the selected operation against the context's root value and
/// drains the error accumulator into the response.
pub(crate) async fn execute_operation(exe: &ExecutionContext) -> Result<Response, RequestError> {
    let kind = exe.operation.kind;
    debug!(
        operation = %kind,
        name = exe.operation.name.as_deref().unwrap_or("<anonymous>"),
        "executing operation"
    );

    let root_type = exe
        .schema
        .root_type_name(kind)
        .map(str::to_string)
        .ok_or(RequestError::NoRootType(kind))?;

    let fields = collect_fields(
        &exe.schema,
        &exe.fragments,
        &exe.variable_values,
        &root_type,
        &exe.operation.selection_set,
    )?;

    let root_value = Arc::clone(&exe.root_value);
    let result = match kind {
        OperationKind::Mutation => {
            execute_fields_serially(exe, &root_type, root_value, Path::root(), fields).await
        }
        OperationKind::Query | OperationKind::Subscription => {
            execute_fields(exe, &root_type, root_value, Path::root(), fields).await
        }
    };

    // A propagated failure with no nullable ancestor nulls the whole
    // data payload; its error is recorded like any other.
    let data = match result {
        Ok(map) => Value::Object(map),
        Err(error) => {
            exe.push_error(error).await;
            Value::Null
        }
    };

    Ok(Response::new(data, exe.take_errors().await))
}

/// Executes a collected field set concurrently: one task per response
/// key, joined in collection order so output order is deterministic.
async fn execute_fields(
    exe: &ExecutionContext,
    parent_type: &str,
    parent: Arc<Value>,
    path: Path,
    fields: CollectedFields,
) -> Result<Map<String, Value>, FieldError> {
    let mut handles = Vec::with_capacity(fields.len());
    for (response_key, nodes) in fields {
        let field_path = path.field(&response_key, parent_type);
        let task_exe = exe.clone();
        let task_parent_type = parent_type.to_string();
        let task_parent = Arc::clone(&parent);
        let task_path = field_path.clone();
        let handle = tokio::spawn(async move {
            execute_field(&task_exe, &task_parent_type, &task_parent, nodes, task_path).await
        });
        handles.push((response_key, field_path, handle));
    }

    let mut map = Map::new();
    let mut failure: Option<FieldError> = None;
    for (response_key, field_path, handle) in handles {
        match handle.await {
            Ok(Ok(value)) => {
                map.insert(response_key, value);
            }
            Ok(Err(error)) => {
                // Non-null propagation: the first failure wins; the
                // siblings still ran to completion above.
                if failure.is_none() {
                    failure = Some(error);
                }
            }
            Err(join_error) => {
                exe.push_error(
                    FieldError::new(format!("field execution failed: {join_error}"))
                        .with_path(field_path.to_segments()),
                )
                .await;
                map.insert(response_key, Value::Null);
            }
        }
    }

    match failure {
        Some(error) => Err(error),
        None => Ok(map),
    }
}

/// Executes a collected field set strictly left to right; a propagated
/// failure stops the remaining fields from running.
async fn execute_fields_serially(
    exe: &ExecutionContext,
    parent_type: &str,
    parent: Arc<Value>,
    path: Path,
    fields: CollectedFields,
) -> Result<Map<String, Value>, FieldError> {
    let mut map = Map::new();
    for (response_key, nodes) in fields {
        let field_path = path.field(&response_key, parent_type);
        let value = execute_field(exe, parent_type, &parent, nodes, field_path).await?;
        map.insert(response_key, value);
    }
    Ok(map)
}

/// Executes one response entry: definition lookup, argument coercion,
/// resolver invocation, completion, then the nullability decision.
async fn execute_field(
    exe: &ExecutionContext,
    parent_type: &str,
    parent: &Value,
    nodes: Vec<FieldNode>,
    path: Path,
) -> Result<Value, FieldError> {
    let nodes = Arc::new(nodes);
    let node = &nodes[0];
    trace!(parent_type, field = %node.name, "resolving field");

    // The meta field needs no resolver or completion.
    if node.name == "__typename" {
        return Ok(Value::String(parent_type.to_string()));
    }

    let field_def = exe
        .schema
        .get_object(parent_type)
        .and_then(|object| exe.schema.field_def(object, &node.name));
    let Some(field_def) = field_def else {
        // Validation should have rejected this; the entry fails alone.
        warn!(parent_type, field = %node.name, "no field definition");
        exe.push_error(
            FieldError::new(format!(
                "Unknown field \"{}\" on type \"{parent_type}\"",
                node.name
            ))
            .located([node.span])
            .with_path(path.to_segments()),
        )
        .await;
        return Ok(Value::Null);
    };
    let field_type = field_def.ty.clone();

    let resolved = resolve_field_value(exe, parent_type, parent, field_def, &nodes, &path).await;
    let completed = match resolved {
        Ok(value) => {
            complete_value(
                exe.clone(),
                field_type.clone(),
                Arc::clone(&nodes),
                path.clone(),
                value,
            )
            .await
        }
        Err(error) => Err(error),
    };

    match completed {
        Ok(value) => Ok(value),
        Err(error) => {
            let error = locate(error, node, &path);
            handle_field_error(exe, &field_type, error).await
        }
    }
}

/// Coerces arguments and invokes the field's resolver: a registered
/// resolver wins, then the request fallback, then the registry default.
async fn resolve_field_value(
    exe: &ExecutionContext,
    parent_type: &str,
    parent: &Value,
    field_def: &FieldDef,
    nodes: &Arc<Vec<FieldNode>>,
    path: &Path,
) -> Result<Value, FieldError> {
    let node = &nodes[0];
    let args = coerce_argument_values(&exe.schema, field_def, node, &exe.variable_values)?;

    let info = ResolverInfo {
        field_name: node.name.clone(),
        parent_type: parent_type.to_string(),
        field_type: field_def.ty.clone(),
        path: path.clone(),
        field_nodes: Arc::clone(nodes),
        schema: Arc::clone(&exe.schema),
        fragments: Arc::clone(&exe.fragments),
        operation: Arc::clone(&exe.operation),
        variable_values: Arc::clone(&exe.variable_values),
        root_value: Arc::clone(&exe.root_value),
    };

    let result = if let Some(resolver) = exe.resolvers.get_registered(parent_type, &node.name) {
        resolver.resolve(parent, &args, &exe.ctx, &info).await
    } else if let Some(resolver) = &exe.field_resolver {
        resolver.resolve(parent, &args, &exe.ctx, &info).await
    } else if let Some(resolver) = exe.resolvers.get(parent_type, &node.name) {
        resolver.resolve(parent, &args, &exe.ctx, &info).await
    } else {
        Ok(parent.get(&node.name).cloned().unwrap_or(Value::Null))
    };

    result.map_err(FieldError::from)
}

/// Absorbs a failure at a nullable boundary by recording it once and
/// yielding null; a non-null position re-raises to the caller.
async fn handle_field_error(
    exe: &ExecutionContext,
    ty: &TypeRef,
    error: FieldError,
) -> Result<Value, FieldError> {
    if ty.is_non_null() {
        return Err(error);
    }
    debug!(message = %error.message, "field error absorbed");
    exe.push_error(error).await;
    Ok(Value::Null)
}

/// Fills in the field's location and path on errors that were raised
/// without them; errors from deeper completion keep their own.
fn locate(error: FieldError, node: &FieldNode, path: &Path) -> FieldError {
    let error = if error.locations.is_empty() {
        error.located([node.span])
    } else {
        error
    };
    if error.path.is_none() {
        error.with_path(path.to_segments())
    } else {
        error
    }
}

/// Completes a resolved value against its declared type. Boxed so the
/// object case can recurse through field execution.
fn complete_value(
    exe: ExecutionContext,
    ty: TypeRef,
    nodes: Arc<Vec<FieldNode>>,
    path: Path,
    value: Value,
) -> Pin<Box<dyn Future<Output = Result<Value, FieldError>> + Send>> {
    Box::pin(async move {
        match ty {
            TypeRef::NonNull(inner) => {
                let completed =
                    complete_value(exe, *inner, Arc::clone(&nodes), path.clone(), value).await?;
                if completed.is_null() {
                    let message = match path.nearest_field() {
                        Some((parent, key)) => {
                            format!("Cannot return null for non-nullable field {parent}.{key}")
                        }
                        None => "Cannot return null for non-nullable field".to_string(),
                    };
                    return Err(FieldError::new(message)
                        .located([nodes[0].span])
                        .with_path(path.to_segments()));
                }
                Ok(completed)
            }
            _ if value.is_null() => Ok(Value::Null),
            TypeRef::List(inner) => complete_list_value(exe, *inner, nodes, path, value).await,
            TypeRef::Named(name) => {
                let schema = Arc::clone(&exe.schema);
                let Some(type_def) = schema.get_type(&name) else {
                    return Err(FieldError::new(format!("Unknown type \"{name}\""))
                        .located([nodes[0].span])
                        .with_path(path.to_segments()));
                };
                match type_def {
                    TypeDef::Scalar(def) => def.serialize(&value).map_err(|detail| {
                        FieldError::new(detail)
                            .located([nodes[0].span])
                            .with_path(path.to_segments())
                    }),
                    TypeDef::Enum(def) => def.serialize(&value).map_err(|detail| {
                        FieldError::new(detail)
                            .located([nodes[0].span])
                            .with_path(path.to_segments())
                    }),
                    TypeDef::Object(def) => {
                        complete_object_value(exe, def, nodes, path, value).await
                    }
                    TypeDef::Interface(def) => {
                        let resolve_type = def.resolve_type.clone();
                        complete_abstract_value(exe, &name, resolve_type, nodes, path, value).await
                    }
                    TypeDef::Union(def) => {
                        let resolve_type = def.resolve_type.clone();
                        complete_abstract_value(exe, &name, resolve_type, nodes, path, value).await
                    }
                    TypeDef::InputObject(_) => Err(FieldError::new(format!(
                        "Type \"{name}\" cannot be used in output positions"
                    ))
                    .located([nodes[0].span])
                    .with_path(path.to_segments())),
                }
            }
        }
    })
}

/// Completes every list item concurrently; item failures are absorbed
/// or re-raised against the item type's nullability.
async fn complete_list_value(
    exe: ExecutionContext,
    inner: TypeRef,
    nodes: Arc<Vec<FieldNode>>,
    path: Path,
    value: Value,
) -> Result<Value, FieldError> {
    let Value::Array(items) = value else {
        let message = match path.nearest_field() {
            Some((parent, key)) => format!("Expected a list for field {parent}.{key}"),
            None => "Expected a list".to_string(),
        };
        return Err(FieldError::new(message)
            .located([nodes[0].span])
            .with_path(path.to_segments()));
    };

    let mut handles = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let task_exe = exe.clone();
        let task_inner = inner.clone();
        let task_nodes = Arc::clone(&nodes);
        let item_path = path.index(index);
        handles.push(tokio::spawn(async move {
            let completed = complete_value(
                task_exe.clone(),
                task_inner.clone(),
                task_nodes,
                item_path,
                item,
            )
            .await;
            match completed {
                Ok(value) => Ok(value),
                Err(error) => handle_field_error(&task_exe, &task_inner, error).await,
            }
        }));
    }

    let mut completed = Vec::with_capacity(handles.len());
    let mut failure: Option<FieldError> = None;
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(value)) => completed.push(value),
            Ok(Err(error)) => {
                if failure.is_none() {
                    failure = Some(error);
                }
            }
            Err(join_error) => {
                exe.push_error(
                    FieldError::new(format!("list item completion failed: {join_error}"))
                        .with_path(path.index(index).to_segments()),
                )
                .await;
                completed.push(Value::Null);
            }
        }
    }

    match failure {
        Some(error) => Err(error),
        None => Ok(Value::Array(completed)),
    }
}

/// Resolves the concrete object type behind an interface or union
/// value, then completes it as that object.
async fn complete_abstract_value(
    exe: ExecutionContext,
    abstract_name: &str,
    resolve_type: Option<TypeResolverFn>,
    nodes: Arc<Vec<FieldNode>>,
    path: Path,
    value: Value,
) -> Result<Value, FieldError> {
    let runtime_type = match resolve_type {
        Some(hook) => hook(&value),
        None => match &exe.type_resolver {
            Some(fallback) => fallback(&value),
            None => default_runtime_type(&exe.schema, abstract_name, &value),
        },
    };

    let Some(type_name) = runtime_type else {
        warn!(abstract_type = abstract_name, "no runtime type resolved");
        let message = match path.nearest_field() {
            Some((parent, key)) => format!(
                "Abstract type \"{abstract_name}\" must resolve to an object type at runtime for field {parent}.{key}"
            ),
            None => format!("Abstract type \"{abstract_name}\" must resolve to an object type at runtime"),
        };
        return Err(FieldError::new(message)
            .located([nodes[0].span])
            .with_path(path.to_segments()));
    };

    if !exe.schema.is_possible_type(abstract_name, &type_name) {
        return Err(FieldError::new(format!(
            "Runtime object type \"{type_name}\" is not a possible type for \"{abstract_name}\""
        ))
        .located([nodes[0].span])
        .with_path(path.to_segments()));
    }

    let schema = Arc::clone(&exe.schema);
    let Some(object) = schema.get_object(&type_name) else {
        return Err(FieldError::new(format!("Unknown type \"{type_name}\""))
            .located([nodes[0].span])
            .with_path(path.to_segments()));
    };
    complete_object_value(exe, object, nodes, path, value).await
}

/// The stock type resolution: a `__typename` property on the value,
/// else the first possible type whose `is_type_of` probe accepts it.
fn default_runtime_type(schema: &Schema, abstract_name: &str, value: &Value) -> Option<String> {
    if let Some(name) = value.get("__typename").and_then(Value::as_str) {
        return Some(name.to_string());
    }
    for object in schema.possible_types(abstract_name) {
        if let Some(probe) = &object.is_type_of {
            if probe(value) {
                return Some(object.name.clone());
            }
        }
    }
    None
}

/// Collects the merged sub-selections and executes them with the
/// completed value as the new parent.
async fn complete_object_value(
    exe: ExecutionContext,
    object: &ObjectDef,
    nodes: Arc<Vec<FieldNode>>,
    path: Path,
    value: Value,
) -> Result<Value, FieldError> {
    if let Some(probe) = &object.is_type_of {
        if !probe(&value) {
            return Err(FieldError::new(format!(
                "Expected value of type \"{}\"",
                object.name
            ))
            .located([nodes[0].span])
            .with_path(path.to_segments()));
        }
    }

    let fields = collect_subfields(
        &exe.schema,
        &exe.fragments,
        &exe.variable_values,
        &object.name,
        &nodes,
    )
    .map_err(|error| FieldError::from(error).with_path(path.to_segments()))?;

    let map = execute_fields(&exe, &object.name, Arc::new(value), path, fields).await?;
    Ok(Value::Object(map))
}
