//! Field collection: flattening a selection set into response-ordered
//! groups of field nodes.
//!
//! Fragments are inlined against the runtime type, `@skip` and
//! `@include` are applied, and fields merging onto the same response
//! key are grouped. Response key order is the order of first
//! appearance in the document.

use graphyne_ast::{
    DirectiveNode, Document, FieldNode, FragmentDefinition, Selection, SelectionSet,
};
use graphyne_schema::Schema;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::values::{directive_flag, DirectiveVariableError, VariableValues};

/// Fragment definitions keyed by fragment name.
pub type FragmentMap = FxHashMap<String, FragmentDefinition>;

/// Field nodes grouped by response key, in response order.
pub(crate) type CollectedFields = IndexMap<String, Vec<FieldNode>>;

/// Indexes the fragment definitions of a document by name.
pub(crate) fn fragment_map(document: &Document) -> FragmentMap {
    document
        .fragments()
        .map(|fragment| (fragment.name.clone(), fragment.clone()))
        .collect()
}

/// Collects the fields of one selection set against a runtime type.
pub(crate) fn collect_fields(
    schema: &Schema,
    fragments: &FragmentMap,
    variables: &VariableValues,
    runtime_type: &str,
    selection_set: &SelectionSet,
) -> Result<CollectedFields, DirectiveVariableError> {
    let mut fields = CollectedFields::new();
    let mut visited = FxHashSet::default();
    collect_into(
        schema,
        fragments,
        variables,
        runtime_type,
        selection_set,
        &mut fields,
        &mut visited,
    )?;
    Ok(fields)
}

/// Collects the merged subfields of a group of field nodes that share
/// a response key. One visited set spans the whole group, so a
/// fragment spread in several members is still applied once.
pub(crate) fn collect_subfields(
    schema: &Schema,
    fragments: &FragmentMap,
    variables: &VariableValues,
    runtime_type: &str,
    field_nodes: &[FieldNode],
) -> Result<CollectedFields, DirectiveVariableError> {
    let mut fields = CollectedFields::new();
    let mut visited = FxHashSet::default();
    for node in field_nodes {
        if let Some(selection_set) = &node.selection_set {
            collect_into(
                schema,
                fragments,
                variables,
                runtime_type,
                selection_set,
                &mut fields,
                &mut visited,
            )?;
        }
    }
    Ok(fields)
}

fn collect_into(
    schema: &Schema,
    fragments: &FragmentMap,
    variables: &VariableValues,
    runtime_type: &str,
    selection_set: &SelectionSet,
    fields: &mut CollectedFields,
    visited: &mut FxHashSet<String>,
) -> Result<(), DirectiveVariableError> {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                if !should_include(&field.directives, variables)? {
                    continue;
                }
                fields
                    .entry(field.response_key().to_string())
                    .or_default()
                    .push(field.clone());
            }
            Selection::FragmentSpread(spread) => {
                if !should_include(&spread.directives, variables)? {
                    continue;
                }
                // Marking before lookup doubles as the cycle guard.
                if !visited.insert(spread.name.clone()) {
                    continue;
                }
                let Some(fragment) = fragments.get(&spread.name) else {
                    continue;
                };
                if !condition_applies(schema, Some(fragment.type_condition.as_str()), runtime_type) {
                    continue;
                }
                collect_into(
                    schema,
                    fragments,
                    variables,
                    runtime_type,
                    &fragment.selection_set,
                    fields,
                    visited,
                )?;
            }
            Selection::InlineFragment(inline) => {
                if !should_include(&inline.directives, variables)? {
                    continue;
                }
                if !condition_applies(schema, inline.type_condition.as_deref(), runtime_type) {
                    continue;
                }
                collect_into(
                    schema,
                    fragments,
                    variables,
                    runtime_type,
                    &inline.selection_set,
                    fields,
                    visited,
                )?;
            }
        }
    }
    Ok(())
}

/// `@skip` wins over `@include`; the include condition is not even
/// evaluated once skip excludes the node.
fn should_include(
    directives: &[DirectiveNode],
    variables: &VariableValues,
) -> Result<bool, DirectiveVariableError> {
    if directive_flag(directives, "skip", variables)? == Some(true) {
        return Ok(false);
    }
    if directive_flag(directives, "include", variables)? == Some(false) {
        return Ok(false);
    }
    Ok(true)
}

fn condition_applies(schema: &Schema, condition: Option<&str>, runtime_type: &str) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    if condition == runtime_type {
        return true;
    }
    schema
        .get_object(runtime_type)
        .is_some_and(|object| schema.type_satisfies(object, condition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphyne_ast::{
        DirectiveNode, FragmentSpreadNode, InlineFragmentNode, SelectionSet, Value,
    };
    use graphyne_schema::{FieldDef, InterfaceDef, ObjectDef, SchemaBuilder, TypeRef};
    use serde_json::json;

    fn pet_schema() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectDef::new("Query")
                    .with_field(FieldDef::new("pet", TypeRef::named("Pet"))),
            )
            .add_type(
                InterfaceDef::new("Pet")
                    .with_field(FieldDef::new("name", TypeRef::named("String"))),
            )
            .add_type(
                ObjectDef::new("Dog")
                    .with_field(FieldDef::new("name", TypeRef::named("String")))
                    .with_field(FieldDef::new("barkVolume", TypeRef::named("Int")))
                    .with_interface("Pet"),
            )
            .add_type(
                ObjectDef::new("Cat")
                    .with_field(FieldDef::new("name", TypeRef::named("String")))
                    .with_interface("Pet"),
            )
            .build()
    }

    fn no_variables() -> VariableValues {
        VariableValues::new()
    }

    #[test]
    fn test_groups_by_response_key_in_document_order() {
        let schema = pet_schema();
        let set = SelectionSet::new(vec![
            FieldNode::new("name").into(),
            FieldNode::new("barkVolume").into(),
            FieldNode::new("name").into(),
        ]);
        let fields =
            collect_fields(&schema, &FragmentMap::default(), &no_variables(), "Dog", &set)
                .unwrap();
        let keys: Vec<_> = fields.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "barkVolume"]);
        assert_eq!(fields["name"].len(), 2);
    }

    #[test]
    fn test_alias_creates_distinct_group() {
        let schema = pet_schema();
        let set = SelectionSet::new(vec![
            FieldNode::new("name").into(),
            FieldNode::new("name").with_alias("petName").into(),
        ]);
        let fields =
            collect_fields(&schema, &FragmentMap::default(), &no_variables(), "Dog", &set)
                .unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains_key("petName"));
    }

    #[test]
    fn test_skip_wins_over_include() {
        let schema = pet_schema();
        let field = FieldNode::new("name")
            .with_directive(DirectiveNode::new("skip").with_argument("if", Value::Boolean(true)))
            .with_directive(
                DirectiveNode::new("include").with_argument("if", Value::Boolean(true)),
            );
        let set = SelectionSet::new(vec![field.into()]);
        let fields =
            collect_fields(&schema, &FragmentMap::default(), &no_variables(), "Dog", &set)
                .unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_include_false_excludes() {
        let schema = pet_schema();
        let field = FieldNode::new("name").with_directive(
            DirectiveNode::new("include").with_argument("if", Value::variable("detailed")),
        );
        let set = SelectionSet::new(vec![field.into()]);
        let variables = match json!({"detailed": false}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let fields =
            collect_fields(&schema, &FragmentMap::default(), &variables, "Dog", &set).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_undefined_directive_variable_is_an_error() {
        let schema = pet_schema();
        let field = FieldNode::new("name").with_directive(
            DirectiveNode::new("skip").with_argument("if", Value::variable("missing")),
        );
        let set = SelectionSet::new(vec![field.into()]);
        let error = collect_fields(&schema, &FragmentMap::default(), &no_variables(), "Dog", &set)
            .unwrap_err();
        assert_eq!(error.variable, "missing");
    }

    #[test]
    fn test_fragment_cycle_terminates() {
        let schema = pet_schema();
        let mut fragments = FragmentMap::default();
        fragments.insert(
            "loop".to_string(),
            FragmentDefinition::new(
                "loop",
                "Dog",
                SelectionSet::new(vec![
                    FieldNode::new("name").into(),
                    FragmentSpreadNode::new("loop").into(),
                ]),
            ),
        );
        let set = SelectionSet::new(vec![FragmentSpreadNode::new("loop").into()]);
        let fields = collect_fields(&schema, &fragments, &no_variables(), "Dog", &set).unwrap();
        assert_eq!(fields["name"].len(), 1);
    }

    #[test]
    fn test_missing_fragment_is_skipped() {
        let schema = pet_schema();
        let set = SelectionSet::new(vec![
            FieldNode::new("name").into(),
            FragmentSpreadNode::new("nowhere").into(),
        ]);
        let fields =
            collect_fields(&schema, &FragmentMap::default(), &no_variables(), "Dog", &set)
                .unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_type_condition_filters_inline_fragments() {
        let schema = pet_schema();
        let set = SelectionSet::new(vec![
            FieldNode::new("name").into(),
            InlineFragmentNode::new(SelectionSet::new(vec![
                FieldNode::new("barkVolume").into()
            ]))
            .with_type_condition("Dog")
            .into(),
            InlineFragmentNode::new(SelectionSet::new(vec![FieldNode::new("purrs").into()]))
                .with_type_condition("Cat")
                .into(),
            InlineFragmentNode::new(SelectionSet::new(vec![FieldNode::new("nickname").into()]))
                .with_type_condition("Pet")
                .into(),
        ]);
        let fields =
            collect_fields(&schema, &FragmentMap::default(), &no_variables(), "Dog", &set)
                .unwrap();
        let keys: Vec<_> = fields.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "barkVolume", "nickname"]);
    }

    #[test]
    fn test_subfield_collection_shares_the_visited_set() {
        let schema = pet_schema();
        let mut fragments = FragmentMap::default();
        fragments.insert(
            "dogBits".to_string(),
            FragmentDefinition::new(
                "dogBits",
                "Dog",
                SelectionSet::new(vec![FieldNode::new("barkVolume").into()]),
            ),
        );
        let spread_set =
            SelectionSet::new(vec![FragmentSpreadNode::new("dogBits").into()]);
        let nodes = vec![
            FieldNode::new("pet").with_selection_set(spread_set.clone()),
            FieldNode::new("pet").with_selection_set(spread_set),
        ];
        let fields =
            collect_subfields(&schema, &fragments, &no_variables(), "Dog", &nodes).unwrap();
        assert_eq!(fields["barkVolume"].len(), 1);
    }
}
