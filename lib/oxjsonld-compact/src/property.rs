use crate::context::{ContainerMode, TypeMapping};
use crate::json::JsonNode;
use crate::value::{ValueRenderer, literal_datatype};
use oxrdf::vocab::rdf;
use oxrdf::{NamedNodeRef, TermRef};

/// How each value of a property is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueRule<'t> {
    /// Node identifiers as bare compacted IRIs.
    Id,
    /// Node identifiers as bare IRIs compacted against the vocabulary.
    Vocab,
    /// Literals of the given datatype as bare strings, everything else in full.
    Bare(&'t str),
    /// Full value objects.
    Full,
}

/// Builds the output key and value for all the `objects` of `predicate` on one subject.
///
/// `objects` must not be empty.
pub(crate) fn shape_property<'a>(
    renderer: &mut ValueRenderer<'a, '_>,
    predicate: NamedNodeRef<'a>,
    objects: &[TermRef<'a>],
) -> (String, JsonNode) {
    let context = renderer.context();
    let datatype = shared_datatype(objects);
    let literals = objects
        .iter()
        .any(|object| matches!(object, TermRef::Literal(_)));
    // Bare strings under node reference terms would be read back as IRIs
    let term = context
        .find_term(predicate.as_str(), datatype)
        .filter(|term| {
            !literals
                || !matches!(
                    term.type_mapping(),
                    Some(TypeMapping::Id | TypeMapping::Vocab)
                )
        });
    let (key, many, rule, list_container) =
        if let Some(term) = term {
            let rule = match term.type_mapping() {
                Some(TypeMapping::Id) => ValueRule::Id,
                Some(TypeMapping::Vocab) => ValueRule::Vocab,
                Some(TypeMapping::Datatype(t)) => ValueRule::Bare(t),
                None => ValueRule::Full,
            };
            (
                term.name().to_owned(),
                term.container() == ContainerMode::Set || objects.len() != 1,
                rule,
                term.container() == ContainerMode::List,
            )
        } else if predicate == rdf::TYPE {
            (
                context.keywords().r#type().to_owned(),
                objects.len() > 1,
                ValueRule::Vocab,
                false,
            )
        } else {
            (
                context.shrink_vocab(predicate.as_str()),
                !context.is_active() || objects.len() != 1,
                ValueRule::Full,
                false,
            )
        };

    let mut values = objects.iter().map(|object| {
        if list_container {
            if let Some(items) = renderer.collection(*object) {
                return JsonNode::Array(items);
            }
        }
        shape_value(renderer, rule, *object)
    });
    let value = if many {
        JsonNode::Array(values.collect())
    } else {
        values.next().unwrap_or(JsonNode::Null)
    };
    (key, value)
}

/// The datatype shared by all the objects if they are all literals with the same surfaced datatype.
fn shared_datatype<'a>(objects: &[TermRef<'a>]) -> Option<&'a str> {
    let mut datatypes = objects.iter().map(|object| match object {
        TermRef::Literal(literal) => literal_datatype(*literal),
        _ => None,
    });
    let first = datatypes.next()??;
    datatypes
        .all(|datatype| datatype == Some(first))
        .then(|| first.as_str())
}

fn shape_value<'a>(
    renderer: &mut ValueRenderer<'a, '_>,
    rule: ValueRule<'_>,
    object: TermRef<'a>,
) -> JsonNode {
    let context = renderer.context();
    match (rule, object) {
        (ValueRule::Id, TermRef::NamedNode(node)) => context.shrink(node.as_str()).into(),
        (ValueRule::Vocab, TermRef::NamedNode(node)) => context.shrink_vocab(node.as_str()).into(),
        (ValueRule::Id | ValueRule::Vocab, TermRef::BlankNode(node)) => node.to_string().into(),
        (ValueRule::Bare(datatype), TermRef::Literal(literal))
            if literal_datatype(literal).is_some_and(|d| d.as_str() == datatype) =>
        {
            literal.value().into()
        }
        _ => renderer.render(object),
    }
}
