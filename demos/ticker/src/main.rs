//! Counter ticker demo.
//!
//! Runs a query, a stream of mutations, and a live subscription
//! against one in-process executor. Each mutation bumps a shared
//! counter and publishes a tick; the subscription maps every tick
//! into a full response.
//!
//! # Running
//! ```bash
//! cargo run -p graphyne-ticker
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use graphyne_ast::{
    Document, FieldNode, OperationDefinition, SelectionSet, Value as AstValue,
};
use graphyne_runtime::{Context, ExecuteRequest, Executor, PubSub, ResolverMap, Subscription};
use graphyne_schema::{FieldDef, InputValueDef, ObjectDef, Schema, SchemaBuilder, TypeRef};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn ticker_schema() -> Schema {
    SchemaBuilder::new()
        .description("An in-process counter with live tick updates.")
        .query_type("Query")
        .mutation_type("Mutation")
        .subscription_type("Subscription")
        .add_type(ObjectDef::new("Query").with_field(FieldDef::new(
            "current",
            TypeRef::non_null(TypeRef::named("Int")),
        )))
        .add_type(
            ObjectDef::new("Mutation").with_field(
                FieldDef::new("increment", TypeRef::non_null(TypeRef::named("Int")))
                    .with_argument(
                        InputValueDef::new("by", TypeRef::named("Int")).with_default(json!(1)),
                    ),
            ),
        )
        .add_type(
            ObjectDef::new("Subscription")
                .with_field(FieldDef::new("ticks", TypeRef::named("Tick"))),
        )
        .add_type(
            ObjectDef::new("Tick")
                .with_field(FieldDef::new(
                    "step",
                    TypeRef::non_null(TypeRef::named("Int")),
                ))
                .with_field(FieldDef::new(
                    "total",
                    TypeRef::non_null(TypeRef::named("Int")),
                )),
        )
        .build()
}

fn current_query() -> Document {
    Document::new().with_operation(OperationDefinition::query(SelectionSet::new(vec![
        FieldNode::new("current").into(),
    ])))
}

fn increment_mutation(by: i64) -> Document {
    Document::new().with_operation(OperationDefinition::mutation(SelectionSet::new(vec![
        FieldNode::new("increment")
            .with_argument("by", AstValue::Int(by))
            .into(),
    ])))
}

fn ticks_subscription() -> Document {
    Document::new().with_operation(OperationDefinition::subscription(SelectionSet::new(vec![
        FieldNode::new("ticks")
            .with_selection_set(SelectionSet::new(vec![
                FieldNode::new("step").into(),
                FieldNode::new("total").into(),
            ]))
            .into(),
    ])))
}

fn build_resolvers(counter: &Arc<AtomicI64>, pubsub: &PubSub) -> ResolverMap {
    let mut resolvers = ResolverMap::new();

    let reader = Arc::clone(counter);
    resolvers.register_fn("Query", "current", move |_parent, _args, _ctx, _info| {
        Ok(json!(reader.load(Ordering::SeqCst)))
    });

    let bump = Arc::clone(counter);
    let hub = pubsub.clone();
    resolvers.register_async("Mutation", "increment", move |_parent, args, _ctx, _info| {
        let counter = Arc::clone(&bump);
        let hub = hub.clone();
        async move {
            let by: i64 = args.require("by")?;
            let total = counter.fetch_add(by, Ordering::SeqCst) + by;
            hub.publish("ticks", json!({"ticks": {"step": by, "total": total}}))
                .await;
            Ok(json!(total))
        }
    });

    let hub = pubsub.clone();
    resolvers.register_subscribe_fn(
        "Subscription",
        "ticks",
        move |_parent, _args, _ctx, _info| {
            let hub = hub.clone();
            async move { Ok(hub.stream("ticks").await) }
        },
    );

    resolvers
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("graphyne=info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let schema = ticker_schema();
    let counter = Arc::new(AtomicI64::new(0));
    let pubsub = PubSub::new();
    let executor = Arc::new(Executor::with_resolvers(build_resolvers(&counter, &pubsub)));
    let ctx = Context::new();
    info!("executor ready");

    let response = executor
        .execute(ExecuteRequest::new(current_query()), &schema, &ctx)
        .await?;
    println!("initial: {}", serde_json::to_string(&response)?);

    // Subscribe before the first mutation fires so no tick is missed.
    let subscription = executor
        .subscribe(ExecuteRequest::new(ticks_subscription()), &schema, &ctx)
        .await;
    let mut stream = match subscription {
        Subscription::Stream(stream) => stream,
        Subscription::Failure(response) => {
            eprintln!("subscription failed: {}", serde_json::to_string(&response)?);
            return Ok(());
        }
    };

    let publisher = {
        let executor = Arc::clone(&executor);
        let schema = schema.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            for by in [1, 2, 3] {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let request = ExecuteRequest::new(increment_mutation(by));
                if let Err(error) = executor.execute(request, &schema, &ctx).await {
                    warn!(%error, "increment failed");
                }
            }
        })
    };

    for _ in 0..3 {
        match stream.next().await {
            Some(response) => println!("tick: {}", serde_json::to_string(&response)?),
            None => break,
        }
    }
    stream.close().await;
    publisher.await?;

    let response = executor
        .execute(ExecuteRequest::new(current_query()), &schema, &ctx)
        .await?;
    println!("final: {}", serde_json::to_string(&response)?);

    Ok(())
}
