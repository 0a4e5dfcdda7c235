use crate::context::ActiveContext;
use crate::json::JsonNode;
use crate::list::list_items;
use oxrdf::vocab::xsd;
use oxrdf::{Graph, LiteralRef, NamedNodeRef, TermRef};

/// The datatype surfaced in the output for a literal.
///
/// Simple and language-tagged literals have none.
pub(crate) fn literal_datatype(literal: LiteralRef<'_>) -> Option<NamedNodeRef<'_>> {
    let datatype = literal.datatype();
    (literal.language().is_none() && datatype != xsd::STRING).then_some(datatype)
}

/// Renders RDF terms of one graph as JSON-LD values.
pub(crate) struct ValueRenderer<'a, 'c> {
    graph: &'a Graph,
    context: ActiveContext<'c>,
    // Heads of the lists currently being rendered
    open_lists: Vec<TermRef<'a>>,
}

impl<'a, 'c> ValueRenderer<'a, 'c> {
    pub fn new(graph: &'a Graph, context: ActiveContext<'c>) -> Self {
        Self {
            graph,
            context,
            open_lists: Vec::new(),
        }
    }

    #[inline]
    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    #[inline]
    pub fn context(&self) -> ActiveContext<'c> {
        self.context
    }

    /// Renders a single term: a list object, a node reference or a literal value.
    pub fn render(&mut self, term: TermRef<'a>) -> JsonNode {
        let keywords = self.context.keywords();
        if let Some(items) = self.collection(term) {
            return JsonNode::object([(keywords.list(), JsonNode::Array(items))]);
        }
        match term {
            TermRef::NamedNode(node) => {
                JsonNode::object([(keywords.id(), self.context.shrink(node.as_str()).into())])
            }
            TermRef::BlankNode(node) => JsonNode::object([(keywords.id(), node.to_string().into())]),
            TermRef::Literal(literal) => self.literal(literal),
            #[allow(unreachable_patterns, clippy::allow_attributes)]
            _ => JsonNode::object([(keywords.id(), term.to_string().into())]),
        }
    }

    /// Renders the items of the RDF list starting at `term`.
    ///
    /// Returns `None` if `term` is not a well-formed list or if it is already being rendered.
    pub fn collection(&mut self, term: TermRef<'a>) -> Option<Vec<JsonNode>> {
        if self.open_lists.contains(&term) {
            tracing::debug!(list = %term, "list nested in itself, rendered as a reference");
            return None;
        }
        let items = list_items(self.graph, term)?;
        self.open_lists.push(term);
        let rendered = items.into_iter().map(|item| self.render(item)).collect();
        self.open_lists.pop();
        Some(rendered)
    }

    fn literal(&self, literal: LiteralRef<'_>) -> JsonNode {
        let keywords = self.context.keywords();
        let value = JsonNode::from(literal.value());
        if let Some(language) = literal.language() {
            if Some(language) != self.context.default_language() {
                return JsonNode::object([
                    (keywords.language(), language.into()),
                    (keywords.value(), value),
                ]);
            }
        } else if let Some(datatype) = literal_datatype(literal) {
            return JsonNode::object([
                (keywords.r#type(), self.context.shrink_vocab(datatype.as_str()).into()),
                (keywords.value(), value),
            ]);
        }
        if self.context.is_active() {
            value
        } else {
            JsonNode::object([(keywords.value(), value)])
        }
    }
}
