use crate::context::{ActiveContext, Context, TermResolver};
use crate::error::{ConvertError, UnsupportedOption};
use crate::json::JsonNode;
use crate::node::{build_node, top_level_subjects};
use crate::store::{GraphPartition, RdfStore, partition};
use crate::value::ValueRenderer;
use oxiri::{Iri, IriParseError};
use oxrdf::NamedOrBlankNode;
use std::collections::BTreeMap;
use std::sync::Arc;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Converts RDF graphs and datasets into [JSON-LD](https://www.w3.org/TR/json-ld/) document trees.
///
/// Without context the output is in expanded form.
/// With a context the IRIs are compacted, the values get their shortest shape and the context
/// is embedded in the output.
///
/// ```
/// use oxrdf::{Graph, LiteralRef, NamedNodeRef, TripleRef};
/// use oxjsonld_compact::{Context, JsonLdCompactor};
///
/// let mut graph = Graph::new();
/// graph.insert(TripleRef::new(
///     NamedNodeRef::new("http://example.com/me")?,
///     NamedNodeRef::new("http://schema.org/name")?,
///     LiteralRef::new_simple_literal("Foo Bar"),
/// ));
/// let document = JsonLdCompactor::new()
///     .with_context(Context::from_slice(
///         br#"{"schema": "http://schema.org/", "name": "schema:name"}"#,
///         None,
///     )?)
///     .convert(&graph)?;
/// assert_eq!(
///     document.to_string(),
///     r#"{"@context":{"name":"schema:name","schema":"http://schema.org/"},"@id":"http://example.com/me","name":"Foo Bar"}"#
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct JsonLdCompactor {
    context: Option<ContextSource>,
    base_iri: Option<Iri<String>>,
    auto_compact: bool,
    native_types: bool,
    start_node: Option<NamedOrBlankNode>,
    index: bool,
}

#[derive(Clone)]
enum ContextSource {
    Resolver(Arc<dyn TermResolver + Send + Sync>),
    Data(JsonNode),
}

impl JsonLdCompactor {
    /// Builds a new [`JsonLdCompactor`] producing expanded documents.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compacts the output against an already processed context.
    ///
    /// The base IRI set with [`with_base_iri`](Self::with_base_iri) does not apply to it.
    #[inline]
    pub fn with_context(self, context: Context) -> Self {
        self.with_resolver(context)
    }

    /// Compacts the output with a custom [`TermResolver`].
    #[inline]
    pub fn with_resolver(mut self, resolver: impl TermResolver + Send + Sync + 'static) -> Self {
        self.context = Some(ContextSource::Resolver(Arc::new(resolver)));
        self
    }

    /// Compacts the output against the given context data.
    ///
    /// The data is processed when converting, against the base IRI.
    /// `null` is the same as no context.
    ///
    /// ```
    /// use oxrdf::{Graph, NamedNodeRef, TripleRef};
    /// use oxjsonld_compact::{JsonLdCompactor, JsonNode};
    ///
    /// let mut graph = Graph::new();
    /// graph.insert(TripleRef::new(
    ///     NamedNodeRef::new("http://example.com/dir/me")?,
    ///     NamedNodeRef::new("http://schema.org/knows")?,
    ///     NamedNodeRef::new("http://example.com/dir/you")?,
    /// ));
    /// let document = JsonLdCompactor::new()
    ///     .with_context_data(JsonNode::from_slice(br#"{"@vocab": "http://schema.org/"}"#)?)
    ///     .with_base_iri("http://example.com/dir/")?
    ///     .convert(&graph)?;
    /// assert_eq!(
    ///     document.to_string(),
    ///     r#"{"@context":{"@vocab":"http://schema.org/"},"@id":"me","knows":{"@id":"you"}}"#
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn with_context_data(mut self, data: JsonNode) -> Self {
        self.context = Some(ContextSource::Data(data));
        self
    }

    /// Sets the base IRI used to process context data and to relativize node identifiers.
    ///
    /// It has no effect on expanded documents.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base_iri = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Derives a context from the store prefixes if no context is set.
    ///
    /// ```
    /// use oxrdf::{Graph, NamedNodeRef, TripleRef};
    /// use oxjsonld_compact::{JsonLdCompactor, PrefixedStore};
    ///
    /// let mut graph = Graph::new();
    /// graph.insert(TripleRef::new(
    ///     NamedNodeRef::new("http://example.com/me")?,
    ///     NamedNodeRef::new("http://schema.org/knows")?,
    ///     NamedNodeRef::new("http://example.com/you")?,
    /// ));
    /// let store = PrefixedStore::new(graph)
    ///     .with_prefix("ex", "http://example.com/")?
    ///     .with_prefix("schema", "http://schema.org/")?;
    /// let document = JsonLdCompactor::new().with_auto_compact().convert(&store)?;
    /// assert_eq!(
    ///     document.to_string(),
    ///     r#"{"@context":{"ex":"http://example.com/","schema":"http://schema.org/"},"@id":"ex:me","schema:knows":{"@id":"ex:you"}}"#
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn with_auto_compact(mut self) -> Self {
        self.auto_compact = true;
        self
    }

    /// Asks for typed literals to be written as native JSON values.
    ///
    /// Not supported: [`convert`](Self::convert) fails if it is set.
    #[inline]
    pub fn with_native_types(mut self) -> Self {
        self.native_types = true;
        self
    }

    /// Asks for the output to be framed around the given node.
    ///
    /// Not supported: [`convert`](Self::convert) fails if it is set.
    #[inline]
    pub fn with_start_node(mut self, start_node: impl Into<NamedOrBlankNode>) -> Self {
        self.start_node = Some(start_node.into());
        self
    }

    /// Asks for an indexed output.
    ///
    /// Not supported: [`convert`](Self::convert) fails if it is set.
    #[inline]
    pub fn with_index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Converts the store into a JSON-LD document tree.
    ///
    /// The result is a single object when the store holds a single graph or a single graph object
    /// is produced in compacted form, and an array otherwise.
    pub fn convert(&self, store: &(impl RdfStore + ?Sized)) -> Result<JsonNode, ConvertError> {
        self.check_options()?;
        let resolver = self.resolver(store)?;
        let resolver: Option<&dyn TermResolver> = match &resolver {
            Some(resolver) => Some(&**resolver),
            None => None,
        };
        let context = ActiveContext::new(resolver);
        tracing::debug!(compacted = context.is_active(), "converting to JSON-LD");
        let keywords = context.keywords();
        let context_data = context.context_data().filter(|data| !is_empty(data));

        let partitions = partition(store);
        let mut objects = Vec::<BTreeMap<String, JsonNode>>::new();
        for GraphPartition { name, graph } in &partitions {
            let mut object = BTreeMap::new();
            let graph_id = name.as_ref().map(|name| context.shrink(name.as_str()));
            if let Some(graph_id) = &graph_id {
                object.insert(keywords.id().to_owned(), graph_id.clone().into());
            }
            if let Some(context_data) = context_data {
                object.insert("@context".to_owned(), context_data.clone());
            }

            let mut renderer = ValueRenderer::new(graph, context);
            let mut nodes = top_level_subjects(graph)
                .into_iter()
                .map(|subject| build_node(&mut renderer, subject))
                .collect::<Vec<_>>();
            tracing::debug!(graph = graph_id.as_deref(), nodes = nodes.len(), "built graph nodes");
            if graph_id.is_none() && nodes.len() == 1 {
                if let Some(JsonNode::Object(node)) = nodes.pop() {
                    object.extend(node);
                }
            } else if !nodes.is_empty() {
                object.insert(keywords.graph().to_owned(), JsonNode::Array(nodes));
            } else if !context.is_active() {
                continue;
            }

            if let Some(previous) = objects.iter_mut().find(|previous| {
                previous.get(keywords.id()).and_then(JsonNode::as_str) == graph_id.as_deref()
            }) {
                previous.extend(object);
            } else {
                objects.push(object);
            }
        }

        if (objects.len() == 1 && context.is_active()) || partitions.len() == 1 {
            let Some(object) = objects.pop() else {
                return Ok(JsonNode::Array(Vec::new()));
            };
            if object.len() == 1 {
                if let Some(JsonNode::Array(items)) = object.get(keywords.graph()) {
                    if !items.is_empty() {
                        return Ok(JsonNode::Array(items.clone()));
                    }
                }
            }
            return Ok(JsonNode::Object(object));
        }
        Ok(JsonNode::Array(
            objects.into_iter().map(JsonNode::Object).collect(),
        ))
    }

    fn check_options(&self) -> Result<(), ConvertError> {
        if self.native_types {
            return Err(ConvertError::UnsupportedOption(UnsupportedOption::NativeTypes));
        }
        if self.start_node.is_some() {
            return Err(ConvertError::UnsupportedOption(UnsupportedOption::StartNode));
        }
        if self.index {
            return Err(ConvertError::UnsupportedOption(UnsupportedOption::Index));
        }
        Ok(())
    }

    fn resolver(
        &self,
        store: &(impl RdfStore + ?Sized),
    ) -> Result<Option<Arc<dyn TermResolver + Send + Sync>>, ConvertError> {
        let base_iri = self.base_iri.as_ref().map(Iri::as_str);
        match &self.context {
            Some(ContextSource::Resolver(resolver)) => return Ok(Some(Arc::clone(resolver))),
            Some(ContextSource::Data(data)) if *data != JsonNode::Null => {
                return Ok(Some(Arc::new(Context::new(data.clone(), base_iri)?)));
            }
            _ => (),
        }
        if !self.auto_compact {
            return Ok(None);
        }
        let prefixes = store.prefixes();
        let prefixes = prefixes
            .into_iter()
            .filter(|(name, iri)| !name.is_empty() && *iri != XML_NAMESPACE)
            .collect::<Vec<_>>();
        if prefixes.is_empty() {
            tracing::debug!("no prefix to derive a context from");
            return Ok(None);
        }
        Ok(Some(Arc::new(Context::from_prefixes(prefixes, base_iri)?)))
    }
}

fn is_empty(data: &JsonNode) -> bool {
    match data {
        JsonNode::Null => true,
        JsonNode::Object(entries) => entries.is_empty(),
        JsonNode::Array(values) => values.is_empty(),
        _ => false,
    }
}
