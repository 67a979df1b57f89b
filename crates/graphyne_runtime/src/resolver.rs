//! Resolver system for field and subscription resolution.
//!
//! Field resolvers produce one value per field. Subscribe resolvers
//! establish the event stream a subscription draws from; the value
//! side of a subscription still goes through field resolvers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use graphyne_ast::{FieldNode, OperationDefinition, TypeRef};
use graphyne_schema::Schema;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::collect::FragmentMap;
use crate::error::FieldError;
use crate::events::BoxEventStream;
use crate::executor::Context;
use crate::path::Path;
use crate::values::VariableValues;

/// Arguments passed to a resolver, already coerced.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: HashMap<String, Value>,
}

impl ResolverArgs {
    /// Creates new resolver args.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a list of (name, value) pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    /// Gets an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a required argument, returning an error if not found.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
            .and_then(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| ResolverError::ArgumentParseError(name.to_string(), e.to_string()))
            })
    }

    /// Returns all arguments.
    #[must_use]
    pub fn all(&self) -> &HashMap<String, Value> {
        &self.args
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    /// The field name being resolved.
    pub field_name: String,

    /// The parent type name.
    pub parent_type: String,

    /// The declared type of the field.
    pub field_type: TypeRef,

    /// Path to this field in the response.
    pub path: Path,

    /// The merged field nodes under this response key.
    pub field_nodes: Arc<Vec<FieldNode>>,

    /// The schema being executed against.
    pub schema: Arc<Schema>,

    /// Fragments defined in the document.
    pub fragments: Arc<FragmentMap>,

    /// The operation being executed.
    pub operation: Arc<OperationDefinition>,

    /// Coerced variable values.
    pub variable_values: Arc<VariableValues>,

    /// The root value execution started from.
    pub root_value: Arc<Value>,
}

impl ResolverInfo {
    /// Creates resolver info with empty surroundings. Execution fills
    /// every field in; this is mainly for resolver unit tests.
    #[must_use]
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
            field_type: TypeRef::named("String"),
            path: Path::root(),
            field_nodes: Arc::new(Vec::new()),
            schema: Arc::new(Schema::default()),
            fragments: Arc::new(FragmentMap::default()),
            operation: Arc::new(OperationDefinition::default()),
            variable_values: Arc::new(VariableValues::new()),
            root_value: Arc::new(Value::Null),
        }
    }

    /// Sets the field type.
    #[must_use]
    pub fn with_field_type(mut self, ty: TypeRef) -> Self {
        self.field_type = ty;
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for async resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error from a resolver.
#[derive(Debug, Clone)]
pub enum ResolverError {
    /// Field not found on the parent value.
    FieldNotFound(String),

    /// Missing required argument.
    MissingArgument(String),

    /// Argument parse error.
    ArgumentParseError(String, String),

    /// Custom error.
    Custom(String),

    /// Internal error.
    Internal(String),
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldNotFound(field) => write!(f, "Field not found: {field}"),
            Self::MissingArgument(arg) => write!(f, "Missing required argument: {arg}"),
            Self::ArgumentParseError(arg, err) => {
                write!(f, "Failed to parse argument '{arg}': {err}")
            }
            Self::Custom(msg) => write!(f, "{msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ResolverError {}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        Self::Custom(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}

impl From<ResolverError> for FieldError {
    fn from(error: ResolverError) -> Self {
        FieldError::new(error.to_string())
    }
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

/// A boxed resolver.
pub type BoxedResolver = Box<dyn Resolver>;

/// A sync resolver function.
pub type SyncResolverFn =
    Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn = Arc<
    dyn Fn(Value, ResolverArgs, Context, ResolverInfo) -> ResolverFuture<'static> + Send + Sync,
>;

/// A wrapper for async resolver functions.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    /// Creates a new async function resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let parent = parent.clone();
        let args = args.clone();
        let ctx = ctx.clone();
        let info = info.clone();
        let func = Arc::clone(&self.func);
        Box::pin(async move { func(parent, args, ctx, info).await })
    }
}

/// Default resolver that accesses properties from the parent object.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let field_name = &info.field_name;
        let result = match parent {
            Value::Object(map) => {
                if let Some(value) = map.get(field_name) {
                    Ok(value.clone())
                } else {
                    // Try snake_case version
                    let snake_case = to_snake_case(field_name);
                    if let Some(value) = map.get(&snake_case) {
                        Ok(value.clone())
                    } else {
                        Ok(Value::Null)
                    }
                }
            }
            Value::Null => Ok(Value::Null),
            _ => Err(ResolverError::FieldNotFound(field_name.clone())),
        };
        Box::pin(async move { result })
    }
}

/// Converts camelCase to snake_case.
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Result type for subscribe resolvers.
pub type SubscribeResult = Result<BoxEventStream, ResolverError>;

/// Future type for subscribe resolvers.
pub type SubscribeFuture<'a> = Pin<Box<dyn Future<Output = SubscribeResult> + Send + 'a>>;

/// Trait for subscription root fields: returns the source event
/// stream the subscription will map over.
pub trait SubscribeResolver: Send + Sync {
    /// Establishes the event stream.
    fn subscribe<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> SubscribeFuture<'a>;
}

/// A boxed subscribe resolver.
pub type BoxedSubscribeResolver = Box<dyn SubscribeResolver>;

/// An async subscribe function type.
pub type AsyncSubscribeFn = Arc<
    dyn Fn(Value, ResolverArgs, Context, ResolverInfo) -> SubscribeFuture<'static> + Send + Sync,
>;

/// A wrapper for async subscribe functions.
pub struct AsyncFnSubscriber {
    func: AsyncSubscribeFn,
}

impl AsyncFnSubscriber {
    /// Creates a new async subscribe resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SubscribeResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl SubscribeResolver for AsyncFnSubscriber {
    fn subscribe<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> SubscribeFuture<'a> {
        let parent = parent.clone();
        let args = args.clone();
        let ctx = ctx.clone();
        let info = info.clone();
        let func = Arc::clone(&self.func);
        Box::pin(async move { func(parent, args, ctx, info).await })
    }
}

/// Storage for resolvers organized by type and field.
#[derive(Default)]
pub struct ResolverMap {
    /// Field resolvers indexed by "TypeName.fieldName".
    resolvers: FxHashMap<String, BoxedResolver>,

    /// Subscribe resolvers indexed by "TypeName.fieldName".
    subscribers: FxHashMap<String, BoxedSubscribeResolver>,

    /// Default resolver for unregistered fields.
    default_resolver: Option<BoxedResolver>,

    /// Default subscribe resolver for unregistered root fields.
    default_subscriber: Option<BoxedSubscribeResolver>,
}

impl ResolverMap {
    /// Creates a new resolver map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: FxHashMap::default(),
            subscribers: FxHashMap::default(),
            default_resolver: Some(Box::new(DefaultResolver)),
            default_subscriber: None,
        }
    }

    /// Registers a resolver for a specific type and field.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, Box::new(resolver));
    }

    /// Registers a sync function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async function as a resolver.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Registers a subscribe resolver for a subscription root field.
    pub fn register_subscribe<S: SubscribeResolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: S,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.subscribers.insert(key, Box::new(resolver));
    }

    /// Registers an async function as a subscribe resolver.
    pub fn register_subscribe_fn<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SubscribeResult> + Send + 'static,
    {
        self.register_subscribe(type_name, field_name, AsyncFnSubscriber::new(f));
    }

    /// Gets a resolver for a type and field.
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        let key = format!("{type_name}.{field_name}");
        self.resolvers
            .get(&key)
            .map(|r| r.as_ref())
            .or(self.default_resolver.as_deref())
    }

    /// Gets a registered resolver without falling back to the default.
    pub fn get_registered(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        let key = format!("{type_name}.{field_name}");
        self.resolvers.get(&key).map(|r| r.as_ref())
    }

    /// Gets a subscribe resolver for a type and field.
    pub fn get_subscribe(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Option<&dyn SubscribeResolver> {
        let key = format!("{type_name}.{field_name}");
        self.subscribers
            .get(&key)
            .map(|r| r.as_ref())
            .or(self.default_subscriber.as_deref())
    }

    /// Sets the default resolver.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Some(Box::new(resolver));
    }

    /// Removes the default resolver.
    pub fn remove_default(&mut self) {
        self.default_resolver = None;
    }

    /// Sets the default subscribe resolver.
    pub fn set_default_subscribe<S: SubscribeResolver + 'static>(&mut self, resolver: S) {
        self.default_subscriber = Some(Box::new(resolver));
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.resolvers.len())
            .field("subscriber_count", &self.subscribers.len())
            .field("has_default", &self.default_resolver.is_some())
            .finish()
    }
}
