use oxiri::{Iri, IriParseError};
use oxrdf::{Dataset, Graph, GraphNameRef, NamedNode, QuadRef, TripleRef};
use std::collections::HashMap;

/// The read-only view of an RDF store the conversion works on.
///
/// It is implemented for [`Graph`] and [`Dataset`].
/// Use [`PrefixedStore`] to attach prefix bindings to a store.
pub trait RdfStore {
    /// If the store is able to hold named graphs next to its default graph.
    fn is_context_aware(&self) -> bool;

    /// All the statements of the store, with the name of the graph they belong to.
    fn quads(&self) -> Box<dyn Iterator<Item = QuadRef<'_>> + '_>;

    /// The prefix to namespace bindings declared for the store.
    fn prefixes(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }
}

impl RdfStore for Graph {
    #[inline]
    fn is_context_aware(&self) -> bool {
        false
    }

    fn quads(&self) -> Box<dyn Iterator<Item = QuadRef<'_>> + '_> {
        Box::new(self.iter().map(|triple| {
            QuadRef::new(
                triple.subject,
                triple.predicate,
                triple.object,
                GraphNameRef::DefaultGraph,
            )
        }))
    }
}

impl RdfStore for Dataset {
    #[inline]
    fn is_context_aware(&self) -> bool {
        true
    }

    fn quads(&self) -> Box<dyn Iterator<Item = QuadRef<'_>> + '_> {
        Box::new(self.iter())
    }
}

impl<S: RdfStore + ?Sized> RdfStore for &S {
    #[inline]
    fn is_context_aware(&self) -> bool {
        (**self).is_context_aware()
    }

    #[inline]
    fn quads(&self) -> Box<dyn Iterator<Item = QuadRef<'_>> + '_> {
        (**self).quads()
    }

    #[inline]
    fn prefixes(&self) -> Vec<(&str, &str)> {
        (**self).prefixes()
    }
}

/// Wraps a store to attach prefix bindings to it.
///
/// The bindings are used to derive a context when auto compaction is enabled.
///
/// ```
/// use oxrdf::Graph;
/// use oxjsonld_compact::{PrefixedStore, RdfStore};
///
/// let store = PrefixedStore::new(Graph::new()).with_prefix("schema", "http://schema.org/")?;
/// assert_eq!(store.prefixes(), [("schema", "http://schema.org/")]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct PrefixedStore<S> {
    inner: S,
    prefixes: Vec<(String, String)>,
}

impl<S: RdfStore> PrefixedStore<S> {
    #[inline]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            prefixes: Vec::new(),
        }
    }

    /// Binds a prefix to a namespace IRI, replacing any previous binding of the same prefix.
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        let prefix_name = prefix_name.into();
        let prefix_iri = Iri::parse(prefix_iri.into())?.into_inner();
        if let Some(binding) = self
            .prefixes
            .iter_mut()
            .find(|(name, _)| *name == prefix_name)
        {
            binding.1 = prefix_iri;
        } else {
            self.prefixes.push((prefix_name, prefix_iri));
        }
        Ok(self)
    }

    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RdfStore> RdfStore for PrefixedStore<S> {
    #[inline]
    fn is_context_aware(&self) -> bool {
        self.inner.is_context_aware()
    }

    #[inline]
    fn quads(&self) -> Box<dyn Iterator<Item = QuadRef<'_>> + '_> {
        self.inner.quads()
    }

    fn prefixes(&self) -> Vec<(&str, &str)> {
        self.prefixes
            .iter()
            .map(|(name, iri)| (name.as_str(), iri.as_str()))
            .collect()
    }
}

/// One output graph: the default graph (no name) or an IRI-named graph.
pub(crate) struct GraphPartition {
    pub name: Option<NamedNode>,
    pub graph: Graph,
}

/// Splits the store into the graphs that are converted one after the other.
///
/// Context aware stores always get a default graph partition first, followed by the IRI-named graphs
/// in the order they are first seen.
/// Graphs named by a blank node are folded into the default graph.
pub(crate) fn partition(store: &(impl RdfStore + ?Sized)) -> Vec<GraphPartition> {
    if !store.is_context_aware() {
        let mut graph = Graph::new();
        for quad in store.quads() {
            graph.insert(TripleRef::new(quad.subject, quad.predicate, quad.object));
        }
        return vec![GraphPartition { name: None, graph }];
    }

    let mut partitions = vec![GraphPartition {
        name: None,
        graph: Graph::new(),
    }];
    let mut positions = HashMap::new();
    for quad in store.quads() {
        let position = match quad.graph_name {
            GraphNameRef::NamedNode(name) => *positions.entry(name.into_owned()).or_insert_with(|| {
                partitions.push(GraphPartition {
                    name: Some(name.into_owned()),
                    graph: Graph::new(),
                });
                partitions.len() - 1
            }),
            GraphNameRef::BlankNode(_) | GraphNameRef::DefaultGraph => 0,
        };
        if let Some(partition) = partitions.get_mut(position) {
            partition
                .graph
                .insert(TripleRef::new(quad.subject, quad.predicate, quad.object));
        }
    }
    tracing::debug!(graphs = partitions.len(), "partitioned the store");
    partitions
}
