//! Subscriptions: a source event stream mapped through per-event
//! execution.
//!
//! Establishment mirrors `execute` up to the root field, then invokes
//! the field's subscribe resolver to obtain the source stream. Every
//! establishment failure surfaces as an errors-only `Response`; the
//! caller never has to handle a second error channel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use graphyne_schema::Schema;

use crate::collect::collect_fields;
use crate::error::{FieldError, RequestError, Response};
use crate::events::BoxEventStream;
use crate::executor::{
    execute_operation, Context, ExecuteRequest, ExecutionContext, Executor,
};
use crate::path::Path;
use crate::resolver::ResolverInfo;
use crate::values::coerce_argument_values;

/// The outcome of establishing a subscription.
pub enum Subscription {
    /// The source stream is live; events map to responses.
    Stream(SubscriptionStream),
    /// The subscription could not be established.
    Failure(Response),
}

impl Subscription {
    /// Returns the stream if establishment succeeded.
    #[must_use]
    pub fn stream(self) -> Option<SubscriptionStream> {
        match self {
            Self::Stream(stream) => Some(stream),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure response if establishment failed.
    #[must_use]
    pub fn failure(self) -> Option<Response> {
        match self {
            Self::Stream(_) => None,
            Self::Failure(response) => Some(response),
        }
    }

    /// Returns the stream, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the subscription failed to establish.
    #[must_use]
    pub fn unwrap_stream(self) -> SubscriptionStream {
        match self {
            Self::Stream(stream) => stream,
            Self::Failure(response) => {
                panic!("subscription failed to establish: {:?}", response.errors)
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Subscription::Stream"),
            Self::Failure(response) => f.debug_tuple("Subscription::Failure").field(response).finish(),
        }
    }
}

/// The outcome of establishing the source stream alone, before any
/// per-event execution is attached.
pub enum SourceStreamOutcome {
    /// The raw source events.
    Stream(BoxEventStream),
    /// Establishment failed.
    Failure(Response),
}

impl std::fmt::Debug for SourceStreamOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("SourceStreamOutcome::Stream"),
            Self::Failure(response) => f
                .debug_tuple("SourceStreamOutcome::Failure")
                .field(response)
                .finish(),
        }
    }
}

impl Executor {
    /// Establishes a subscription: builds the execution context,
    /// resolves the root field's source stream, and wires each event
    /// through the execute algorithm.
    pub async fn subscribe(
        &self,
        request: ExecuteRequest,
        schema: &Schema,
        ctx: &Context,
    ) -> Subscription {
        match establish(self, &request, schema, ctx).await {
            Ok((source, template)) => {
                debug!("subscription established");
                Subscription::Stream(SubscriptionStream::new(source, template))
            }
            Err(response) => Subscription::Failure(response),
        }
    }

    /// Establishes only the source event stream, without attaching
    /// per-event execution.
    pub async fn create_source_event_stream(
        &self,
        request: ExecuteRequest,
        schema: &Schema,
        ctx: &Context,
    ) -> SourceStreamOutcome {
        match establish(self, &request, schema, ctx).await {
            Ok((source, _)) => SourceStreamOutcome::Stream(source),
            Err(response) => SourceStreamOutcome::Failure(response),
        }
    }
}

/// Runs establishment to the point of holding a live source stream
/// plus the execution context template reused for every event.
async fn establish(
    executor: &Executor,
    request: &ExecuteRequest,
    schema: &Schema,
    ctx: &Context,
) -> Result<(BoxEventStream, ExecutionContext), Response> {
    let exe = executor
        .build_execution_context(schema, request, ctx)
        .map_err(RequestError::into_response)?;

    let kind = exe.operation.kind;
    let Some(root_type) = exe.schema.root_type_name(kind).map(str::to_string) else {
        return Err(RequestError::NoRootType(kind).into_response());
    };

    let fields = collect_fields(
        &exe.schema,
        &exe.fragments,
        &exe.variable_values,
        &root_type,
        &exe.operation.selection_set,
    )
    .map_err(|error| RequestError::from(error).into_response())?;

    // A valid subscription has exactly one root field; the first
    // collected entry is authoritative here.
    let Some((response_key, nodes)) = fields.into_iter().next() else {
        return Err(Response::from_errors(vec![FieldError::new(
            "Subscription operation selects no fields",
        )]));
    };
    let nodes = Arc::new(nodes);
    let node = &nodes[0];
    let path = Path::root().field(&response_key, &root_type);

    let field_def = exe
        .schema
        .get_object(&root_type)
        .and_then(|object| exe.schema.field_def(object, &node.name));
    let Some(field_def) = field_def else {
        return Err(Response::from_errors(vec![FieldError::new(format!(
            "The subscription field \"{}\" is not defined",
            node.name
        ))
        .located([node.span])
        .with_path(path.to_segments())]));
    };

    let args = match coerce_argument_values(&exe.schema, field_def, node, &exe.variable_values) {
        Ok(args) => args,
        Err(error) => {
            let error = if error.path.is_none() {
                error.with_path(path.to_segments())
            } else {
                error
            };
            return Err(Response::from_errors(vec![error]));
        }
    };

    let info = ResolverInfo {
        field_name: node.name.clone(),
        parent_type: root_type.clone(),
        field_type: field_def.ty.clone(),
        path: path.clone(),
        field_nodes: Arc::clone(&nodes),
        schema: Arc::clone(&exe.schema),
        fragments: Arc::clone(&exe.fragments),
        operation: Arc::clone(&exe.operation),
        variable_values: Arc::clone(&exe.variable_values),
        root_value: Arc::clone(&exe.root_value),
    };

    let result = if let Some(resolver) = exe.resolvers.get_subscribe(&root_type, &node.name) {
        resolver
            .subscribe(&exe.root_value, &args, &exe.ctx, &info)
            .await
    } else if let Some(resolver) = &exe.subscribe_resolver {
        resolver
            .subscribe(&exe.root_value, &args, &exe.ctx, &info)
            .await
    } else {
        return Err(Response::from_errors(vec![FieldError::new(format!(
            "No subscribe resolver registered for \"{root_type}.{}\"",
            node.name
        ))
        .located([node.span])
        .with_path(path.to_segments())]));
    };

    match result {
        Ok(source) => Ok((source, exe)),
        Err(error) => {
            debug!(field = %node.name, "subscribe resolver failed");
            let error = FieldError::from(error)
                .located([node.span])
                .with_path(path.to_segments());
            Err(Response::from_errors(vec![error]))
        }
    }
}

/// A live subscription. Each source event is executed as a fresh
/// request with the event payload as root value.
pub struct SubscriptionStream {
    source: BoxEventStream,
    template: ExecutionContext,
    closed: bool,
}

impl SubscriptionStream {
    fn new(source: BoxEventStream, template: ExecutionContext) -> Self {
        Self {
            source,
            template,
            closed: false,
        }
    }

    /// Waits for the next event and maps it to a response. Returns
    /// `None` once the source ends or the stream was closed.
    pub async fn next(&mut self) -> Option<Response> {
        if self.closed {
            return None;
        }
        let event = self.source.next().await?;
        trace!("mapping source event");
        Some(execute_event(&self.template, event).await)
    }

    /// Forwards cancellation to the source. Later calls are no-ops,
    /// and `next` yields `None` from here on.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("subscription closed");
        self.source.close().await;
    }
}

impl std::fmt::Debug for SubscriptionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Executes one event: the template context with the event as root
/// value and a fresh error accumulator.
async fn execute_event(template: &ExecutionContext, event: Value) -> Response {
    let mut exe = template.clone();
    exe.root_value = Arc::new(event);
    exe.errors = Arc::new(RwLock::new(Vec::new()));
    match execute_operation(&exe).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}
