//! Execution runtime for graphyne.
//!
//! This crate walks a parsed query document against a schema and a
//! set of resolvers, producing a structured response:
//! - `error`: Responses, field errors, and request-level failures
//! - `path`: Persistent response paths
//! - `resolver`: Resolver traits and the resolver registry
//! - `values`: Variable and argument coercion
//! - `collect`: Field collection over selection sets
//! - `executor`: Operation execution and value completion
//! - `subscription`: Source event streams mapped through execution
//! - `events`: Pull-based event stream adapters
//! - `pubsub`: Topic-based broadcast event hub

pub mod collect;
pub mod error;
pub mod events;
pub mod executor;
pub mod path;
pub mod pubsub;
pub mod resolver;
pub mod subscription;
pub mod values;

pub use collect::FragmentMap;
pub use error::{FieldError, PathSegment, RequestError, Response, VariableError};
pub use events::{
    BoxEventStream, BroadcastEvents, ChannelEvents, CloseFuture, EventFuture, EventStream,
    IterEvents,
};
pub use executor::{Context, ExecuteRequest, Executor, ExecutorConfig};
pub use path::Path;
pub use pubsub::PubSub;
pub use resolver::{
    AsyncFnResolver, AsyncFnSubscriber, DefaultResolver, FnResolver, Resolver, ResolverArgs,
    ResolverError, ResolverFuture, ResolverInfo, ResolverMap, ResolverResult, SubscribeFuture,
    SubscribeResolver, SubscribeResult,
};
pub use subscription::{SourceStreamOutcome, Subscription, SubscriptionStream};
pub use values::VariableValues;
