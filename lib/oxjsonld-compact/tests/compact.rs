#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use oxjsonld_compact::{
    Context, ConvertError, JsonLdCompactor, JsonNode, Keywords, PrefixedStore, TermDefinition,
    TermResolver, UnsupportedOption,
};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{
    BlankNode, Dataset, Graph, GraphName, Literal, NamedNode, NamedNodeRef, Quad, Triple,
};
use std::error::Error;

const S: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/s");
const T: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/t");
const P: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/p");
const Q: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/q");
const G: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/g");
const NAME: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://schema.org/name");

fn graph(triples: impl IntoIterator<Item = Triple>) -> Graph {
    let mut graph = Graph::new();
    for triple in triples {
        graph.insert(&triple);
    }
    graph
}

fn compact(store: &Graph, context: &str) -> Result<JsonNode, Box<dyn Error>> {
    Ok(JsonLdCompactor::new()
        .with_context(Context::from_slice(context.as_bytes(), None)?)
        .convert(store)?)
}

/// `_:a` is the list ("x" "y")
fn list_triples(subject: NamedNodeRef<'_>, predicate: NamedNodeRef<'_>) -> Vec<Triple> {
    let a = BlankNode::new_unchecked("a");
    let b = BlankNode::new_unchecked("b");
    vec![
        Triple::new(subject, predicate, a.clone()),
        Triple::new(a.clone(), rdf::FIRST, Literal::new_simple_literal("x")),
        Triple::new(a, rdf::REST, b.clone()),
        Triple::new(b.clone(), rdf::FIRST, Literal::new_simple_literal("y")),
        Triple::new(b, rdf::REST, rdf::NIL),
    ]
}

#[test]
fn single_literal_under_plain_term() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, NAME, Literal::new_simple_literal("Alice"))]);
    assert_eq!(
        compact(&store, r#"{"name": "http://schema.org/name"}"#)?.to_string(),
        r#"{"@context":{"name":"http://schema.org/name"},"@id":"http://example.com/s","name":"Alice"}"#
    );
    Ok(())
}

#[test]
fn expanded_single_node() -> Result<(), Box<dyn Error>> {
    let store = graph([
        Triple::new(S, NAME, Literal::new_simple_literal("Alice")),
        Triple::new(S, rdf::TYPE, T),
        Triple::new(S, P, Literal::new_typed_literal("1", xsd::INTEGER)),
    ]);
    assert_eq!(
        JsonLdCompactor::new().convert(&store)?.to_string(),
        concat!(
            r#"{"@id":"http://example.com/s","@type":"http://example.com/t","#,
            r#""http://example.com/p":[{"@type":"http://www.w3.org/2001/XMLSchema#integer","@value":"1"}],"#,
            r#""http://schema.org/name":[{"@value":"Alice"}]}"#
        )
    );
    Ok(())
}

#[test]
fn list_under_plain_property() -> Result<(), Box<dyn Error>> {
    let store = graph(list_triples(S, P));
    assert_eq!(
        compact(&store, r#"{"p": "http://example.com/p"}"#)?.get("p"),
        Some(&JsonNode::object([(
            "@list",
            JsonNode::Array(vec!["x".into(), "y".into()])
        )]))
    );
    assert_eq!(
        JsonLdCompactor::new().convert(&store)?.to_string(),
        r#"{"@id":"http://example.com/s","http://example.com/p":[{"@list":[{"@value":"x"},{"@value":"y"}]}]}"#
    );
    Ok(())
}

#[test]
fn list_under_list_container_term() -> Result<(), Box<dyn Error>> {
    let store = graph(list_triples(S, P));
    assert_eq!(
        compact(
            &store,
            r#"{"p": {"@id": "http://example.com/p", "@container": "@list"}}"#
        )?
        .get("p"),
        Some(&JsonNode::Array(vec!["x".into(), "y".into()]))
    );
    Ok(())
}

#[test]
fn empty_list() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, P, rdf::NIL)]);
    assert_eq!(
        compact(&store, r#"{"p": "http://example.com/p"}"#)?.get("p"),
        Some(&JsonNode::object([("@list", JsonNode::Array(Vec::new()))]))
    );
    Ok(())
}

#[test]
fn malformed_list_is_an_ordinary_node() -> Result<(), Box<dyn Error>> {
    let a = BlankNode::new_unchecked("a");
    let store = graph([
        Triple::new(S, P, a.clone()),
        Triple::new(a.clone(), rdf::FIRST, Literal::new_simple_literal("x")),
        Triple::new(a, Q, Literal::new_simple_literal("y")),
    ]);
    let document = JsonLdCompactor::new().convert(&store)?;
    let nodes = document.as_array().ok_or("expected an array")?;
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        nodes[0].get("http://example.com/p"),
        Some(&JsonNode::Array(vec![JsonNode::object([(
            "@id",
            JsonNode::from("_:a")
        )])]))
    );
    assert_eq!(nodes[1].get("@id"), Some(&JsonNode::from("_:a")));
    assert_eq!(nodes[1].get("@list"), None);
    assert_eq!(
        nodes[1].get("http://example.com/q"),
        Some(&JsonNode::Array(vec![JsonNode::object([(
            "@value",
            JsonNode::from("y")
        )])]))
    );
    assert!(
        nodes[1]
            .get("http://www.w3.org/1999/02/22-rdf-syntax-ns#first")
            .is_some()
    );
    Ok(())
}

#[test]
fn default_language() -> Result<(), Box<dyn Error>> {
    let context = r#"{"@language": "en", "p": "http://example.com/p"}"#;
    let same = graph([Triple::new(
        S,
        P,
        Literal::new_language_tagged_literal_unchecked("hello", "en"),
    )]);
    assert_eq!(compact(&same, context)?.get("p"), Some(&JsonNode::from("hello")));
    let other = graph([Triple::new(
        S,
        P,
        Literal::new_language_tagged_literal_unchecked("bonjour", "fr"),
    )]);
    assert_eq!(
        compact(&other, context)?.get("p"),
        Some(&JsonNode::object([
            ("@language", JsonNode::from("fr")),
            ("@value", JsonNode::from("bonjour"))
        ]))
    );
    Ok(())
}

#[test]
fn two_values_without_term_are_an_array() -> Result<(), Box<dyn Error>> {
    let store = graph([
        Triple::new(S, P, Literal::new_simple_literal("a")),
        Triple::new(S, P, Literal::new_simple_literal("b")),
    ]);
    let compacted = compact(&store, r#"{"ex": "http://example.com/"}"#)?;
    assert_eq!(
        compacted.get("ex:p").and_then(JsonNode::as_array).map(<[_]>::len),
        Some(2)
    );
    let expanded = JsonLdCompactor::new().convert(&store)?;
    assert_eq!(
        expanded
            .get("http://example.com/p")
            .and_then(JsonNode::as_array)
            .map(<[_]>::len),
        Some(2)
    );
    Ok(())
}

#[test]
fn single_value_without_term() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, P, T)]);
    assert_eq!(
        compact(&store, r#"{"ex": "http://example.com/"}"#)?.to_string(),
        r#"{"@context":{"ex":"http://example.com/"},"@id":"ex:s","ex:p":{"@id":"ex:t"}}"#
    );
    Ok(())
}

#[test]
fn typed_terms() -> Result<(), Box<dyn Error>> {
    let store = graph([
        Triple::new(S, P, Literal::new_typed_literal("2024-01-01", xsd::DATE)),
        Triple::new(S, Q, T),
    ]);
    let document = compact(
        &store,
        r#"{
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "date": {"@id": "http://example.com/p", "@type": "xsd:date"},
            "link": {"@id": "http://example.com/q", "@type": "@id"}
        }"#,
    )?;
    assert_eq!(document.get("date"), Some(&JsonNode::from("2024-01-01")));
    assert_eq!(
        document.get("link"),
        Some(&JsonNode::from("http://example.com/t"))
    );
    Ok(())
}

#[test]
fn single_graph_single_node_collapses() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, P, T)]);
    let document = JsonLdCompactor::new().convert(&store)?;
    assert_eq!(document.get("@id"), Some(&JsonNode::from("http://example.com/s")));
    assert_eq!(document.get("@graph"), None);
    Ok(())
}

#[test]
fn several_nodes() -> Result<(), Box<dyn Error>> {
    let store = graph([
        Triple::new(S, P, Literal::new_simple_literal("a")),
        Triple::new(T, P, Literal::new_simple_literal("b")),
    ]);
    let expanded = JsonLdCompactor::new().convert(&store)?;
    assert_eq!(expanded.as_array().map(<[_]>::len), Some(2));

    let compacted = compact(&store, r#"{"ex": "http://example.com/"}"#)?;
    assert_eq!(
        compacted.get("@graph").and_then(JsonNode::as_array).map(<[_]>::len),
        Some(2)
    );
    assert!(compacted.get("@context").is_some());
    Ok(())
}

#[test]
fn blank_node_identifiers() -> Result<(), Box<dyn Error>> {
    let referenced = BlankNode::new_unchecked("referenced");
    let lonely = BlankNode::new_unchecked("lonely");
    let store = graph([
        Triple::new(S, P, referenced.clone()),
        Triple::new(referenced, Q, Literal::new_simple_literal("a")),
        Triple::new(lonely, Q, Literal::new_simple_literal("b")),
    ]);
    let document = compact(&store, r#"{"ex": "http://example.com/"}"#)?;
    let nodes = document
        .get("@graph")
        .and_then(JsonNode::as_array)
        .ok_or("expected a @graph array")?;
    assert_eq!(
        nodes,
        [
            JsonNode::object([
                ("@id", JsonNode::from("ex:s")),
                ("ex:p", JsonNode::object([("@id", JsonNode::from("_:referenced"))]))
            ]),
            JsonNode::object([("ex:q", JsonNode::from("b"))]),
            JsonNode::object([
                ("@id", JsonNode::from("_:referenced")),
                ("ex:q", JsonNode::from("a"))
            ]),
        ]
    );
    Ok(())
}

#[test]
fn rdf_type_values() -> Result<(), Box<dyn Error>> {
    let store = graph([
        Triple::new(S, rdf::TYPE, T),
        Triple::new(S, rdf::TYPE, NAME),
    ]);
    let document = compact(
        &store,
        r#"{"@vocab": "http://example.com/", "schema": "http://schema.org/"}"#,
    )?;
    assert_eq!(
        document.get("@type"),
        Some(&JsonNode::Array(vec!["t".into(), "schema:name".into()]))
    );
    Ok(())
}

#[test]
fn keyword_aliases() -> Result<(), Box<dyn Error>> {
    let store = graph([
        Triple::new(S, rdf::TYPE, T),
        Triple::new(S, P, Literal::new_language_tagged_literal_unchecked("a", "de")),
    ]);
    let document = compact(
        &store,
        r#"{"id": "@id", "type": "@type", "lang": "@language", "val": "@value", "ex": "http://example.com/"}"#,
    )?;
    assert_eq!(document.get("id"), Some(&JsonNode::from("ex:s")));
    assert_eq!(document.get("type"), Some(&JsonNode::from("ex:t")));
    assert_eq!(
        document.get("ex:p"),
        Some(&JsonNode::object([
            ("lang", JsonNode::from("de")),
            ("val", JsonNode::from("a"))
        ]))
    );
    assert_eq!(document.get("@id"), None);
    Ok(())
}

#[test]
fn relative_identifiers() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, P, T)]);
    let document = JsonLdCompactor::new()
        .with_context_data(JsonNode::from_slice(br#"{"p": "http://example.com/p"}"#)?)
        .with_base_iri("http://example.com/")?
        .convert(&store)?;
    assert_eq!(document.get("@id"), Some(&JsonNode::from("s")));
    assert_eq!(
        document.get("p"),
        Some(&JsonNode::object([("@id", JsonNode::from("t"))]))
    );
    Ok(())
}

#[test]
fn named_graphs() -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::new();
    dataset.insert(&Quad::new(S, P, Literal::new_simple_literal("a"), GraphName::DefaultGraph));
    dataset.insert(&Quad::new(S, P, Literal::new_simple_literal("b"), G));
    dataset.insert(&Quad::new(T, P, Literal::new_simple_literal("c"), G));

    assert_eq!(
        JsonLdCompactor::new().convert(&dataset)?.to_string(),
        concat!(
            r#"[{"@id":"http://example.com/s","http://example.com/p":[{"@value":"a"}]},"#,
            r#"{"@graph":[{"@id":"http://example.com/s","http://example.com/p":[{"@value":"b"}]},"#,
            r#"{"@id":"http://example.com/t","http://example.com/p":[{"@value":"c"}]}],"@id":"http://example.com/g"}]"#
        )
    );

    let document = JsonLdCompactor::new()
        .with_context(Context::from_slice(br#"{"ex": "http://example.com/"}"#, None)?)
        .convert(&dataset)?;
    let objects = document.as_array().ok_or("expected an array")?;
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].get("ex:p"), Some(&JsonNode::from("a")));
    assert_eq!(objects[1].get("@id"), Some(&JsonNode::from("ex:g")));
    assert_eq!(
        objects[1]
            .get("@graph")
            .and_then(JsonNode::as_array)
            .map(<[_]>::len),
        Some(2)
    );
    Ok(())
}

#[test]
fn only_named_graph_in_expanded_form() -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::new();
    dataset.insert(&Quad::new(S, P, T, G));
    assert_eq!(
        JsonLdCompactor::new().convert(&dataset)?.to_string(),
        r#"[{"@graph":[{"@id":"http://example.com/s","http://example.com/p":[{"@id":"http://example.com/t"}]}],"@id":"http://example.com/g"}]"#
    );
    Ok(())
}

#[test]
fn graph_description_is_merged_into_the_named_graph() -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::new();
    dataset.insert(&Quad::new(
        G,
        P,
        Literal::new_simple_literal("meta"),
        GraphName::DefaultGraph,
    ));
    dataset.insert(&Quad::new(S, P, Literal::new_simple_literal("a"), G));
    assert_eq!(
        JsonLdCompactor::new().convert(&dataset)?.to_string(),
        concat!(
            r#"[{"@graph":[{"@id":"http://example.com/s","http://example.com/p":[{"@value":"a"}]}],"#,
            r#""@id":"http://example.com/g","http://example.com/p":[{"@value":"meta"}]}]"#
        )
    );

    let document = JsonLdCompactor::new()
        .with_context(Context::from_slice(br#"{"ex": "http://example.com/"}"#, None)?)
        .convert(&dataset)?;
    assert_eq!(
        document.to_string(),
        concat!(
            r#"{"@context":{"ex":"http://example.com/"},"@graph":[{"@id":"ex:s","ex:p":"a"}],"#,
            r#""@id":"ex:g","ex:p":"meta"}"#
        )
    );
    Ok(())
}

#[test]
fn terms_are_not_used_as_identifiers() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(NAME, P, S)]);
    assert_eq!(
        compact(
            &store,
            r#"{"ex": "http://example.com/", "name": "http://schema.org/name"}"#
        )?
        .to_string(),
        concat!(
            r#"{"@context":{"ex":"http://example.com/","name":"http://schema.org/name"},"#,
            r#""@id":"http://schema.org/name","ex:p":{"@id":"ex:s"}}"#
        )
    );
    Ok(())
}

#[test]
fn strings_are_not_written_as_references() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, P, Literal::new_simple_literal("Bob"))]);
    let document = compact(
        &store,
        r#"{"ex": "http://example.com/", "p": {"@id": "ex:p", "@type": "@id"}}"#,
    )?;
    assert_eq!(document.get("p"), None);
    assert_eq!(document.get("ex:p"), Some(&JsonNode::from("Bob")));
    Ok(())
}

#[test]
fn blank_node_graphs_are_folded_into_the_default_graph() -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::new();
    dataset.insert(&Quad::new(S, P, T, BlankNode::new_unchecked("g")));
    assert_eq!(
        JsonLdCompactor::new().convert(&dataset)?.to_string(),
        r#"{"@id":"http://example.com/s","http://example.com/p":[{"@id":"http://example.com/t"}]}"#
    );
    Ok(())
}

#[test]
fn auto_compact() -> Result<(), Box<dyn Error>> {
    let store = PrefixedStore::new(graph([Triple::new(S, P, T)]))
        .with_prefix("", "http://example.org/")?
        .with_prefix("xml", "http://www.w3.org/XML/1998/namespace")?
        .with_prefix("ex", "http://example.com/")?;
    assert_eq!(
        JsonLdCompactor::new()
            .with_auto_compact()
            .convert(&store)?
            .to_string(),
        r#"{"@context":{"ex":"http://example.com/"},"@id":"ex:s","ex:p":{"@id":"ex:t"}}"#
    );
    // An explicit context wins
    assert_eq!(
        JsonLdCompactor::new()
            .with_auto_compact()
            .with_context(Context::from_slice(br#"{"p": "http://example.com/p"}"#, None)?)
            .convert(&store)?
            .get("p"),
        Some(&JsonNode::object([(
            "@id",
            JsonNode::from("http://example.com/t")
        )]))
    );
    // Without prefixes the output stays expanded
    assert_eq!(
        JsonLdCompactor::new()
            .with_auto_compact()
            .convert(&graph([Triple::new(S, P, T)]))?
            .get("@context"),
        None
    );
    Ok(())
}

#[test]
fn unsupported_options_are_rejected() {
    let store = graph([Triple::new(S, P, T)]);
    let result = JsonLdCompactor::new().with_native_types().convert(&store);
    assert!(matches!(
        result,
        Err(ConvertError::UnsupportedOption(UnsupportedOption::NativeTypes))
    ));
    let result = JsonLdCompactor::new().with_start_node(S).convert(&store);
    assert!(matches!(
        result,
        Err(ConvertError::UnsupportedOption(UnsupportedOption::StartNode))
    ));
    let result = JsonLdCompactor::new().with_index().convert(&store);
    assert_eq!(
        result.map_err(|e| e.to_string()).err().as_deref(),
        Some("the index option is not supported")
    );
}

#[test]
fn invalid_context_is_rejected_before_conversion() {
    let store = graph([Triple::new(S, P, T)]);
    let result = JsonLdCompactor::new()
        .with_context_data(JsonNode::object([("p", JsonNode::Boolean(true))]))
        .convert(&store);
    assert!(matches!(result, Err(ConvertError::Context(_))));
}

#[test]
fn conversion_is_deterministic() -> Result<(), Box<dyn Error>> {
    let mut triples = list_triples(S, P);
    for i in 0..20 {
        triples.push(Triple::new(T, Q, BlankNode::new_unchecked(format!("n{i}"))));
        triples.push(Triple::new(
            NamedNode::new(format!("http://example.com/item{i}"))?,
            NAME,
            Literal::new_simple_literal(format!("item {i}")),
        ));
        triples.push(Triple::new(
            BlankNode::new_unchecked(format!("n{i}")),
            rdf::VALUE,
            Literal::new_typed_literal(i.to_string(), xsd::INTEGER),
        ));
    }
    let context = r#"{"ex": "http://example.com/", "name": "http://schema.org/name"}"#;
    let first = compact(&graph(triples.clone()), context)?;
    triples.reverse();
    let second = compact(&graph(triples), context)?;
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    Ok(())
}

struct LastSegment {
    keywords: Keywords,
    data: JsonNode,
}

impl TermResolver for LastSegment {
    fn shrink(&self, iri: &str) -> String {
        iri.rsplit('/').next().unwrap_or(iri).to_owned()
    }

    fn find_term(&self, _: &str, _: Option<&str>) -> Option<&TermDefinition> {
        None
    }

    fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    fn default_language(&self) -> Option<&str> {
        None
    }

    fn context_data(&self) -> &JsonNode {
        &self.data
    }
}

#[test]
fn custom_resolver() -> Result<(), Box<dyn Error>> {
    let store = graph([Triple::new(S, P, Literal::new_simple_literal("a"))]);
    let document = JsonLdCompactor::new()
        .with_resolver(LastSegment {
            keywords: Keywords::default(),
            data: JsonNode::object([("@vocab", JsonNode::from("http://example.com/"))]),
        })
        .convert(&store)?;
    assert_eq!(
        document.to_string(),
        r#"{"@context":{"@vocab":"http://example.com/"},"@id":"s","p":"a"}"#
    );
    Ok(())
}
