use crate::json::JsonNode;
use crate::list::{as_subject, list_items};
use crate::property::shape_property;
use crate::value::ValueRenderer;
use oxrdf::{Graph, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use std::collections::BTreeMap;

/// The subjects of `graph` that become top-level nodes, in N-Triples order.
///
/// Blank nodes heading a well-formed RDF list are left out: they are written where they are referenced.
pub(crate) fn top_level_subjects(graph: &Graph) -> Vec<NamedOrBlankNodeRef<'_>> {
    let mut subjects = BTreeMap::new();
    for triple in graph.iter() {
        if let Some(subject) = as_subject(TermRef::from(triple.subject)) {
            subjects.entry(subject.to_string()).or_insert(subject);
        }
    }
    subjects
        .into_values()
        .filter(|subject| match subject {
            NamedOrBlankNodeRef::NamedNode(_) => true,
            NamedOrBlankNodeRef::BlankNode(node) => {
                if list_items(graph, (*node).into()).is_some() {
                    tracing::trace!(node = %node, "skipped list head");
                    false
                } else {
                    true
                }
            }
        })
        .collect()
}

/// Builds the node object of `subject`.
pub(crate) fn build_node<'a>(
    renderer: &mut ValueRenderer<'a, '_>,
    subject: NamedOrBlankNodeRef<'a>,
) -> JsonNode {
    let graph = renderer.graph();
    let context = renderer.context();
    let mut node = BTreeMap::new();
    match subject {
        NamedOrBlankNodeRef::NamedNode(subject) => {
            node.insert(
                context.keywords().id().to_owned(),
                context.shrink(subject.as_str()).into(),
            );
        }
        NamedOrBlankNodeRef::BlankNode(subject) => {
            // Only blank nodes referenced elsewhere need an identifier
            if graph.triples_for_object(subject).next().is_some() {
                node.insert(context.keywords().id().to_owned(), subject.to_string().into());
            }
        }
    }

    let mut objects_by_predicate = BTreeMap::<&str, (NamedNodeRef<'a>, Vec<TermRef<'a>>)>::new();
    for triple in graph.triples_for_subject(subject) {
        objects_by_predicate
            .entry(triple.predicate.as_str())
            .or_insert_with(|| (triple.predicate, Vec::new()))
            .1
            .push(triple.object);
    }
    for (predicate, mut objects) in objects_by_predicate.into_values() {
        objects.sort_by_cached_key(ToString::to_string);
        let (key, value) = shape_property(renderer, predicate, &objects);
        node.insert(key, value);
    }
    JsonNode::Object(node)
}
