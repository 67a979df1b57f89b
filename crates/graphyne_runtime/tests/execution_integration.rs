//! End-to-end execution tests through the public API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use graphyne_ast::{
    DirectiveNode, Document, FieldNode, FragmentDefinition, FragmentSpreadNode,
    InlineFragmentNode, OperationDefinition, Selection, SelectionSet, Span, Value as AstValue,
    VariableDefinition,
};
use graphyne_runtime::{
    Context, ExecuteRequest, Executor, PathSegment, ResolverError, ResolverMap, VariableValues,
};
use graphyne_schema::{
    FieldDef, InputValueDef, InterfaceDef, ObjectDef, Schema, SchemaBuilder, TypeRef, UnionDef,
};
use serde_json::{json, Value};

fn library_schema() -> Schema {
    SchemaBuilder::new()
        .query_type("Query")
        .mutation_type("Mutation")
        .add_type(
            ObjectDef::new("Query")
                .with_field(FieldDef::new("book", TypeRef::named("Book")))
                .with_field(FieldDef::new(
                    "books",
                    TypeRef::list(TypeRef::named("Book")),
                ))
                .with_field(FieldDef::new(
                    "featured",
                    TypeRef::non_null(TypeRef::named("Book")),
                ))
                .with_field(FieldDef::new(
                    "chapters",
                    TypeRef::list(TypeRef::non_null(TypeRef::named("Chapter"))),
                ))
                .with_field(
                    FieldDef::new("picture", TypeRef::named("String"))
                        .with_argument(InputValueDef::new("size", TypeRef::named("Int"))),
                ),
        )
        .add_type(
            ObjectDef::new("Mutation").with_field(
                FieldDef::new("checkout", TypeRef::named("String"))
                    .with_argument(InputValueDef::new("title", TypeRef::named("String"))),
            ),
        )
        .add_type(
            ObjectDef::new("Book")
                .with_field(FieldDef::new("title", TypeRef::named("String")))
                .with_field(FieldDef::new(
                    "isbn",
                    TypeRef::non_null(TypeRef::named("String")),
                ))
                .with_field(FieldDef::new("author", TypeRef::named("Author"))),
        )
        .add_type(
            ObjectDef::new("Author").with_field(FieldDef::new("name", TypeRef::named("String"))),
        )
        .add_type(
            ObjectDef::new("Chapter")
                .with_field(FieldDef::new("heading", TypeRef::named("String"))),
        )
        .build()
}

fn flags_schema() -> Schema {
    SchemaBuilder::new()
        .query_type("Query")
        .add_type(
            ObjectDef::new("Query")
                .with_field(FieldDef::new("a", TypeRef::named("Int")))
                .with_field(FieldDef::new("b", TypeRef::named("Int")))
                .with_field(FieldDef::new("c", TypeRef::named("Int")))
                .with_field(FieldDef::new("d", TypeRef::named("Int"))),
        )
        .build()
}

fn menagerie_schema() -> Schema {
    SchemaBuilder::new()
        .query_type("Query")
        .add_type(
            InterfaceDef::new("Pet").with_field(FieldDef::new("name", TypeRef::named("String"))),
        )
        .add_type(
            ObjectDef::new("Dog")
                .with_interface("Pet")
                .with_field(FieldDef::new("name", TypeRef::named("String")))
                .with_field(FieldDef::new("barks", TypeRef::named("Boolean"))),
        )
        .add_type(
            ObjectDef::new("Cat")
                .with_interface("Pet")
                .with_field(FieldDef::new("name", TypeRef::named("String")))
                .with_field(FieldDef::new("meows", TypeRef::named("Boolean"))),
        )
        .add_type(
            UnionDef::new("Found")
                .with_member("Dog")
                .with_member("Cat")
                .with_resolve_type(|value| {
                    if value.get("barks").is_some() {
                        Some("Dog".to_string())
                    } else {
                        Some("Cat".to_string())
                    }
                }),
        )
        .add_type(
            ObjectDef::new("Query")
                .with_field(FieldDef::new("pet", TypeRef::named("Pet")))
                .with_field(FieldDef::new("find", TypeRef::named("Found"))),
        )
        .build()
}

fn query(selections: Vec<Selection>) -> Document {
    Document::new().with_operation(OperationDefinition::query(SelectionSet::new(selections)))
}

fn variables(value: Value) -> VariableValues {
    match value {
        Value::Object(map) => map,
        _ => panic!("variables must be an object"),
    }
}

/// A failing nullable field nulls only its own entry; siblings keep
/// their values and exactly one error is reported.
#[tokio::test]
async fn test_failing_sibling_leaves_others_intact() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "book", |_parent, _args, _ctx, _info| {
        Ok(json!({"title": "Dune"}))
    });
    resolvers.register_fn("Query", "books", |_parent, _args, _ctx, _info| {
        Err(ResolverError::Custom("catalog offline".to_string()))
    });
    resolvers.register_fn("Query", "picture", |_parent, _args, _ctx, _info| {
        Ok(json!("cover.png"))
    });

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![
        FieldNode::new("book")
            .with_selection_set(SelectionSet::new(vec![FieldNode::new("title").into()]))
            .into(),
        FieldNode::new("books")
            .with_selection_set(SelectionSet::new(vec![FieldNode::new("title").into()]))
            .into(),
        FieldNode::new("picture").into(),
    ]);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert_eq!(data["book"]["title"], "Dune");
    assert!(data["books"].is_null());
    assert_eq!(data["picture"], "cover.png");
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("catalog offline"));
}

/// A null in a non-null position nulls the nearest nullable ancestor,
/// not the whole response.
#[tokio::test]
async fn test_non_null_failure_bubbles_to_nearest_nullable() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "book", |_parent, _args, _ctx, _info| {
        Ok(json!({"title": "Dune"}))
    });
    resolvers.register_fn("Book", "isbn", |_parent, _args, _ctx, _info| Ok(json!(null)));

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![FieldNode::new("book")
        .with_selection_set(SelectionSet::new(vec![
            FieldNode::new("title").into(),
            FieldNode::new("isbn").into(),
        ]))
        .into()]);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert!(data["book"].is_null());
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("non-nullable field Book.isbn"));
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("book"), PathSegment::from("isbn")][..])
    );
}

/// A non-null root field with no nullable ancestor nulls the entire
/// data payload.
#[tokio::test]
async fn test_non_null_root_failure_nulls_whole_data() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "featured", |_parent, _args, _ctx, _info| {
        Ok(json!(null))
    });

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![FieldNode::new("featured")
        .with_selection_set(SelectionSet::new(vec![FieldNode::new("title").into()]))
        .into()]);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(Value::Null));
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .contains("non-nullable field Query.featured"));
}

/// Concurrent fields land in selection order even when an earlier
/// field resolves much slower than a later one.
#[tokio::test]
async fn test_concurrent_fields_keep_selection_order() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_async("Query", "book", |_parent, _args, _ctx, _info| async {
        tokio::time::sleep(Duration::from_millis(40)).await;
        Ok(json!({"title": "Slow"}))
    });
    resolvers.register_fn("Query", "picture", |_parent, _args, _ctx, _info| {
        Ok(json!("fast.png"))
    });

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![
        FieldNode::new("book")
            .with_selection_set(SelectionSet::new(vec![FieldNode::new("title").into()]))
            .into(),
        FieldNode::new("picture").into(),
    ]);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    let keys: Vec<_> = data.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["book", "picture"]);
    assert_eq!(data["book"]["title"], "Slow");
}

/// Mutation roots run one after another; a slow first write finishes
/// before the second starts.
#[tokio::test]
async fn test_mutations_run_serially_despite_uneven_latency() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let mut resolvers = ResolverMap::new();
    resolvers.register_async("Mutation", "checkout", move |_parent, args, _ctx, _info| {
        let sink = Arc::clone(&sink);
        async move {
            let title: String = args.require("title")?;
            let delay = if title == "first" { 30 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            sink.lock().unwrap().push(title.clone());
            Ok(json!(title))
        }
    });

    let executor = Executor::with_resolvers(resolvers);
    let operation = OperationDefinition::mutation(SelectionSet::new(vec![
        FieldNode::new("checkout")
            .with_alias("first")
            .with_argument("title", AstValue::from("first"))
            .into(),
        FieldNode::new("checkout")
            .with_alias("second")
            .with_argument("title", AstValue::from("second"))
            .into(),
    ]));
    let document = Document::new().with_operation(operation);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert_eq!(data["first"], "first");
    assert_eq!(data["second"], "second");
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

/// `@skip` and `@include` read their conditions from variables, and
/// `@skip` wins when both appear on one field.
#[tokio::test]
async fn test_skip_include_directives_follow_variables() {
    let operation = OperationDefinition::query(SelectionSet::new(vec![
        FieldNode::new("a").into(),
        FieldNode::new("b")
            .with_directive(
                DirectiveNode::new("skip").with_argument("if", AstValue::variable("flag")),
            )
            .into(),
        FieldNode::new("c")
            .with_directive(
                DirectiveNode::new("include").with_argument("if", AstValue::variable("flag")),
            )
            .into(),
        FieldNode::new("d")
            .with_directive(DirectiveNode::new("skip").with_argument("if", AstValue::from(true)))
            .with_directive(
                DirectiveNode::new("include").with_argument("if", AstValue::from(true)),
            )
            .into(),
    ]))
    .with_variable(VariableDefinition::new(
        "flag",
        TypeRef::non_null(TypeRef::named("Boolean")),
    ));
    let document = Document::new().with_operation(operation);

    let request = ExecuteRequest::new(document)
        .with_variables(variables(json!({"flag": true})))
        .with_root_value(json!({"a": 1, "b": 2, "c": 3, "d": 4}));
    let response = Executor::new()
        .execute(request, &flags_schema(), &Context::new())
        .await
        .unwrap();

    assert!(!response.has_errors());
    let data = response.data.unwrap();
    let object = data.as_object().unwrap();
    assert_eq!(object.get("a"), Some(&json!(1)));
    assert!(object.get("b").is_none());
    assert_eq!(object.get("c"), Some(&json!(3)));
    assert!(object.get("d").is_none());
}

/// Mutually recursive fragment spreads terminate, contributing each
/// field once.
#[tokio::test]
async fn test_fragment_cycle_collects_each_field_once() {
    let document = Document::new()
        .with_operation(OperationDefinition::query(SelectionSet::new(vec![
            FragmentSpreadNode::new("left").into(),
            FieldNode::new("c").into(),
        ])))
        .with_fragment(FragmentDefinition::new(
            "left",
            "Query",
            SelectionSet::new(vec![
                FieldNode::new("a").into(),
                FragmentSpreadNode::new("right").into(),
            ]),
        ))
        .with_fragment(FragmentDefinition::new(
            "right",
            "Query",
            SelectionSet::new(vec![
                FieldNode::new("b").into(),
                FragmentSpreadNode::new("left").into(),
            ]),
        ));

    let request = ExecuteRequest::new(document).with_root_value(json!({"a": 1, "b": 2, "c": 3}));
    let response = Executor::new()
        .execute(request, &flags_schema(), &Context::new())
        .await
        .unwrap();

    assert!(!response.has_errors());
    assert_eq!(response.data.unwrap(), json!({"a": 1, "b": 2, "c": 3}));
}

/// An interface value completes as the runtime type named by its
/// `__typename` property; non-matching inline fragments drop out.
#[tokio::test]
async fn test_interface_value_completes_as_runtime_type() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pet", |_parent, _args, _ctx, _info| {
        Ok(json!({"__typename": "Dog", "name": "Rex", "barks": true}))
    });

    let document = query(vec![FieldNode::new("pet")
        .with_selection_set(SelectionSet::new(vec![
            FieldNode::new("name").into(),
            InlineFragmentNode::new(SelectionSet::new(vec![FieldNode::new("barks").into()]))
                .with_type_condition("Dog")
                .into(),
            InlineFragmentNode::new(SelectionSet::new(vec![FieldNode::new("meows").into()]))
                .with_type_condition("Cat")
                .into(),
        ]))
        .into()]);
    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &menagerie_schema(), &Context::new())
        .await
        .unwrap();

    assert!(!response.has_errors());
    let data = response.data.unwrap();
    assert_eq!(data["pet"]["name"], "Rex");
    assert_eq!(data["pet"]["barks"], true);
    assert!(data["pet"].get("meows").is_none());
}

/// A union member is picked by the union's `resolve_type` hook when
/// the value carries no `__typename`.
#[tokio::test]
async fn test_union_resolution_uses_resolve_type_hook() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "find", |_parent, _args, _ctx, _info| {
        Ok(json!({"name": "Whiskers", "meows": true}))
    });

    let document = query(vec![FieldNode::new("find")
        .with_selection_set(SelectionSet::new(vec![
            InlineFragmentNode::new(SelectionSet::new(vec![
                FieldNode::new("name").into(),
                FieldNode::new("meows").into(),
            ]))
            .with_type_condition("Cat")
            .into(),
            FieldNode::new("__typename").into(),
        ]))
        .into()]);
    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &menagerie_schema(), &Context::new())
        .await
        .unwrap();

    assert!(!response.has_errors());
    let data = response.data.unwrap();
    assert_eq!(data["find"]["__typename"], "Cat");
    assert_eq!(data["find"]["name"], "Whiskers");
    assert_eq!(data["find"]["meows"], true);
}

/// An interface value that resolves to no runtime type is a per-field
/// error; the sibling union field still resolves.
#[tokio::test]
async fn test_unresolved_abstract_type_is_a_field_error() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pet", |_parent, _args, _ctx, _info| {
        Ok(json!({"name": "Rex"}))
    });
    resolvers.register_fn("Query", "find", |_parent, _args, _ctx, _info| {
        Ok(json!({"name": "Whiskers", "meows": true}))
    });

    let document = query(vec![
        FieldNode::new("pet")
            .with_selection_set(SelectionSet::new(vec![FieldNode::new("name").into()]))
            .into(),
        FieldNode::new("find")
            .with_selection_set(SelectionSet::new(vec![InlineFragmentNode::new(
                SelectionSet::new(vec![FieldNode::new("name").into()]),
            )
            .with_type_condition("Cat")
            .into()]))
            .into(),
    ]);
    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &menagerie_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert!(data["pet"].is_null());
    assert_eq!(data["find"]["name"], "Whiskers");
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .contains("Abstract type \"Pet\" must resolve to an object type at runtime"));
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("pet")][..])
    );
}

/// A type resolver naming an object outside the union's membership is
/// rejected rather than completed as that type.
#[tokio::test]
async fn test_runtime_type_outside_the_union_is_rejected() {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .add_type(
            ObjectDef::new("Dog").with_field(FieldDef::new("name", TypeRef::named("String"))),
        )
        .add_type(
            ObjectDef::new("Cat").with_field(FieldDef::new("name", TypeRef::named("String"))),
        )
        .add_type(
            UnionDef::new("Sighting")
                .with_member("Dog")
                .with_resolve_type(|_value| Some("Cat".to_string())),
        )
        .add_type(
            ObjectDef::new("Query")
                .with_field(FieldDef::new("sighting", TypeRef::named("Sighting"))),
        )
        .build();

    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "sighting", |_parent, _args, _ctx, _info| {
        Ok(json!({"name": "Shadow"}))
    });

    let document = query(vec![FieldNode::new("sighting")
        .with_selection_set(SelectionSet::new(vec![InlineFragmentNode::new(
            SelectionSet::new(vec![FieldNode::new("name").into()]),
        )
        .with_type_condition("Dog")
        .into()]))
        .into()]);
    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &schema, &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert!(data["sighting"].is_null());
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .contains("Runtime object type \"Cat\" is not a possible type for \"Sighting\""));
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("sighting")][..])
    );
}

/// An absent variable takes the default declared on the operation.
#[tokio::test]
async fn test_variable_default_applies_when_absent() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "picture", |_parent, args, _ctx, _info| {
        let size: i64 = args.require("size")?;
        Ok(json!(format!("cover-{size}.png")))
    });

    let operation = OperationDefinition::query(SelectionSet::new(vec![FieldNode::new("picture")
        .with_argument("size", AstValue::variable("size"))
        .into()]))
    .with_variable(
        VariableDefinition::new("size", TypeRef::named("Int")).with_default(AstValue::Int(64)),
    );
    let document = Document::new().with_operation(operation);

    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    assert!(!response.has_errors());
    assert_eq!(response.data.unwrap()["picture"], "cover-64.png");
}

/// Field errors carry the span of the field node they were raised at.
#[tokio::test]
async fn test_error_locations_point_at_the_failing_node() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "book", |_parent, _args, _ctx, _info| {
        Err(ResolverError::Custom("shelf empty".to_string()))
    });

    let document = query(vec![FieldNode::new("book")
        .with_span(Span::new(8, 12))
        .with_selection_set(SelectionSet::new(vec![FieldNode::new("title").into()]))
        .into()]);
    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].locations, vec![Span::new(8, 12)]);
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("book")][..])
    );
}

/// A null item in a list of non-null items nulls the enclosing list
/// and records the item index in the error path.
#[tokio::test]
async fn test_null_item_in_non_null_list_nulls_the_list() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "chapters", |_parent, _args, _ctx, _info| {
        Ok(json!([{"heading": "One"}, null, {"heading": "Three"}]))
    });

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![FieldNode::new("chapters")
        .with_selection_set(SelectionSet::new(vec![FieldNode::new("heading").into()]))
        .into()]);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert!(data["chapters"].is_null());
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("chapters"), PathSegment::from(1)][..])
    );
}

/// A resolver returning a non-list value for a list-typed field fails
/// that field alone, located at the field node.
#[tokio::test]
async fn test_non_list_value_for_list_field_is_an_error() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "books", |_parent, _args, _ctx, _info| {
        Ok(json!("hardcover"))
    });
    resolvers.register_fn("Query", "picture", |_parent, _args, _ctx, _info| {
        Ok(json!("cover.png"))
    });

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![
        FieldNode::new("books")
            .with_span(Span::new(2, 7))
            .with_selection_set(SelectionSet::new(vec![FieldNode::new("title").into()]))
            .into(),
        FieldNode::new("picture").into(),
    ]);
    let response = executor
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert!(data["books"].is_null());
    assert_eq!(data["picture"], "cover.png");
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .contains("Expected a list for field Query.books"));
    assert_eq!(errors[0].locations, vec![Span::new(2, 7)]);
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("books")][..])
    );
}

/// A leaf value the scalar serializer rejects becomes a per-field
/// error; the sibling leaf still serializes.
#[tokio::test]
async fn test_leaf_serialization_failure_nulls_only_that_field() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "a", |_parent, _args, _ctx, _info| {
        Ok(json!(1_i64 << 40))
    });
    resolvers.register_fn("Query", "b", |_parent, _args, _ctx, _info| Ok(json!(7)));

    let executor = Executor::with_resolvers(resolvers);
    let document = query(vec![FieldNode::new("a").into(), FieldNode::new("b").into()]);
    let response = executor
        .execute(ExecuteRequest::new(document), &flags_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert!(data["a"].is_null());
    assert_eq!(data["b"], 7);
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .contains("Int cannot represent non 32-bit signed integer value"));
    assert_eq!(
        errors[0].path.as_deref(),
        Some(&[PathSegment::from("a")][..])
    );
}

/// With no registered resolvers, nested objects resolve by property
/// access on the root value.
#[tokio::test]
async fn test_default_resolvers_walk_the_root_value() {
    let document = query(vec![FieldNode::new("book")
        .with_selection_set(SelectionSet::new(vec![
            FieldNode::new("title").into(),
            FieldNode::new("author")
                .with_selection_set(SelectionSet::new(vec![FieldNode::new("name").into()]))
                .into(),
        ]))
        .into()]);
    let request = ExecuteRequest::new(document)
        .with_root_value(json!({"book": {"title": "Dune", "author": {"name": "Herbert"}}}));
    let response = Executor::new()
        .execute(request, &library_schema(), &Context::new())
        .await
        .unwrap();

    assert!(!response.has_errors());
    let data = response.data.unwrap();
    assert_eq!(data["book"]["title"], "Dune");
    assert_eq!(data["book"]["author"]["name"], "Herbert");
}

/// Aliased selections of one field execute independently, each with
/// its own arguments.
#[tokio::test]
async fn test_aliases_create_independent_entries() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "picture", |_parent, args, _ctx, _info| {
        let size: i64 = args.require("size")?;
        Ok(json!(format!("cover-{size}.png")))
    });

    let document = query(vec![
        FieldNode::new("picture")
            .with_alias("small")
            .with_argument("size", AstValue::Int(32))
            .into(),
        FieldNode::new("picture")
            .with_alias("large")
            .with_argument("size", AstValue::Int(256))
            .into(),
    ]);
    let response = Executor::with_resolvers(resolvers)
        .execute(ExecuteRequest::new(document), &library_schema(), &Context::new())
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert_eq!(data["small"], "cover-32.png");
    assert_eq!(data["large"], "cover-256.png");
}
