use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedOrBlankNodeRef, TermRef};
use std::collections::HashSet;

/// Returns the items of the RDF list starting at `node`.
///
/// `rdf:nil` is the empty list.
/// Returns `None` if `node` has no `rdf:first` statement or if the chain of
/// `rdf:first`/`rdf:rest` links starting at it is broken, branching or cyclic.
pub(crate) fn list_items<'a>(graph: &'a Graph, node: TermRef<'a>) -> Option<Vec<TermRef<'a>>> {
    if is_nil(node) {
        return Some(Vec::new());
    }
    let head = as_subject(node)?;
    graph.object_for_subject_predicate(head, rdf::FIRST)?;

    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut current = head;
    loop {
        if !visited.insert(current) {
            tracing::debug!(list = %head, "cyclic RDF list, not rendered as a list");
            return None;
        }
        let Some(first) = single_object(graph, current, rdf::FIRST.into()) else {
            tracing::debug!(list = %head, node = %current, "list node without a single rdf:first");
            return None;
        };
        items.push(first);
        let Some(rest) = single_object(graph, current, rdf::REST.into()) else {
            tracing::debug!(list = %head, node = %current, "list node without a single rdf:rest");
            return None;
        };
        if is_nil(rest) {
            return Some(items);
        }
        let Some(next) = as_subject(rest) else {
            tracing::debug!(list = %head, "rdf:rest pointing to a literal");
            return None;
        };
        current = next;
    }
}

fn single_object<'a>(
    graph: &'a Graph,
    subject: NamedOrBlankNodeRef<'a>,
    predicate: oxrdf::NamedNodeRef<'a>,
) -> Option<TermRef<'a>> {
    let mut objects = graph.objects_for_subject_predicate(subject, predicate);
    let object = objects.next()?;
    objects.next().is_none().then_some(object)
}

fn is_nil(term: TermRef<'_>) -> bool {
    matches!(term, TermRef::NamedNode(node) if node == rdf::NIL)
}

pub(crate) fn as_subject(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(node.into()),
        TermRef::BlankNode(node) => Some(node.into()),
        #[allow(unreachable_patterns, clippy::allow_attributes)]
        _ => None,
    }
}
