use crate::error::ContextError;
use crate::json::JsonNode;
use oxiri::Iri;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// The keys used for the JSON-LD keywords in the output.
///
/// They are the standard keywords unless the context declares aliases for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    id: Cow<'static, str>,
    r#type: Cow<'static, str>,
    value: Cow<'static, str>,
    language: Cow<'static, str>,
    list: Cow<'static, str>,
    graph: Cow<'static, str>,
}

impl Keywords {
    pub const DEFAULT: Self = Self {
        id: Cow::Borrowed("@id"),
        r#type: Cow::Borrowed("@type"),
        value: Cow::Borrowed("@value"),
        language: Cow::Borrowed("@language"),
        list: Cow::Borrowed("@list"),
        graph: Cow::Borrowed("@graph"),
    };

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn r#type(&self) -> &str {
        &self.r#type
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[inline]
    pub fn list(&self) -> &str {
        &self.list
    }

    #[inline]
    pub fn graph(&self) -> &str {
        &self.graph
    }

    /// Registers an alias, keeping the shortest one when a keyword has several.
    fn alias(&mut self, keyword: &str, alias: &str) {
        let slot = match keyword {
            "@id" => &mut self.id,
            "@type" => &mut self.r#type,
            "@value" => &mut self.value,
            "@language" => &mut self.language,
            "@list" => &mut self.list,
            "@graph" => &mut self.graph,
            _ => return,
        };
        if slot.starts_with('@') || alias.len() < slot.len() {
            *slot = Cow::Owned(alias.into());
        }
    }
}

impl Default for Keywords {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How the values of a property are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerMode {
    /// A single value is written as is, several values as an array.
    #[default]
    Plain,
    /// Values are always written as an array (`@set`).
    Set,
    /// Values are ordered RDF lists written as arrays (`@list`).
    List,
}

/// The fixed value type of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMapping {
    /// Values are node identifiers (`@id`).
    Id,
    /// Values are node identifiers compacted against the vocabulary (`@vocab`).
    Vocab,
    /// Values are literals of the given datatype IRI.
    Datatype(String),
}

/// A term declared by a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    name: String,
    iri: String,
    type_mapping: Option<TypeMapping>,
    container: ContainerMode,
    prefix: bool,
}

impl TermDefinition {
    /// The term itself, used as output key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The absolute IRI the term maps to.
    #[inline]
    pub fn iri(&self) -> &str {
        &self.iri
    }

    #[inline]
    pub fn type_mapping(&self) -> Option<&TypeMapping> {
        self.type_mapping.as_ref()
    }

    #[inline]
    pub fn container(&self) -> ContainerMode {
        self.container
    }

    /// If the term might be used as the prefix of compact IRIs.
    #[inline]
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }
}

/// IRI compaction and term lookup against an active context.
///
/// [`Context`] is the provided implementation.
pub trait TermResolver {
    /// Compacts an IRI used as a node identifier.
    ///
    /// Returns the IRI unchanged if no compaction applies.
    fn shrink(&self, iri: &str) -> String;

    /// Compacts an IRI used as a property key, a datatype or a type.
    fn shrink_vocab(&self, iri: &str) -> String {
        self.shrink(iri)
    }

    /// Finds the term to use for a predicate, given the datatype shared by all its literal values if any.
    fn find_term(&self, predicate: &str, datatype: Option<&str>) -> Option<&TermDefinition>;

    fn keywords(&self) -> &Keywords;

    fn default_language(&self) -> Option<&str>;

    /// The context data embedded in the produced documents.
    fn context_data(&self) -> &JsonNode;
}

/// A processed JSON-LD context.
///
/// ```
/// use oxjsonld_compact::{Context, TermResolver};
///
/// let context = Context::from_slice(
///     br#"{"schema": "http://schema.org/", "name": "schema:name"}"#,
///     None,
/// )?;
/// assert_eq!(context.shrink("http://schema.org/Person"), "schema:Person");
/// assert_eq!(
///     context.find_term("http://schema.org/name", None).map(|t| t.name()),
///     Some("name")
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    data: JsonNode,
    original_base_iri: Option<Iri<String>>,
    base_iri: Option<Iri<String>>,
    vocab: Option<String>,
    default_language: Option<String>,
    terms: BTreeMap<String, TermDefinition>,
    aliases: BTreeMap<String, String>,
    keywords: Keywords,
    // Term names per IRI, in name order
    terms_by_iri: HashMap<String, Vec<String>>,
    // (namespace, prefix name), longest namespace first
    prefixes: Vec<(String, String)>,
}

impl Context {
    /// Processes context data, resolving relative IRIs against the given base IRI.
    ///
    /// The data might be the context value itself or a document with a `@context` entry.
    pub fn new(data: JsonNode, base_iri: Option<&str>) -> Result<Self, ContextError> {
        let data = match data {
            JsonNode::Object(mut document) if document.contains_key("@context") => document
                .remove("@context")
                .unwrap_or(JsonNode::Null),
            data => data,
        };
        let base_iri = base_iri
            .map(|iri| Iri::parse(iri.to_owned()).map_err(|e| ContextError::invalid_iri(iri.into(), e)))
            .transpose()?;
        let mut context = Self {
            data: JsonNode::Null,
            original_base_iri: base_iri.clone(),
            base_iri,
            vocab: None,
            default_language: None,
            terms: BTreeMap::new(),
            aliases: BTreeMap::new(),
            keywords: Keywords::DEFAULT,
            terms_by_iri: HashMap::new(),
            prefixes: Vec::new(),
        };
        context.process(&data)?;
        context.build_indexes();
        context.data = data;
        Ok(context)
    }

    /// Parses and processes a JSON context document.
    pub fn from_slice(data: &[u8], base_iri: Option<&str>) -> Result<Self, ContextError> {
        Self::new(JsonNode::from_slice(data)?, base_iri)
    }

    /// Builds a context declaring the given prefixes.
    pub fn from_prefixes<'a>(
        prefixes: impl IntoIterator<Item = (&'a str, &'a str)>,
        base_iri: Option<&str>,
    ) -> Result<Self, ContextError> {
        Self::new(
            JsonNode::object(
                prefixes
                    .into_iter()
                    .map(|(name, iri)| (name, JsonNode::from(iri))),
            ),
            base_iri,
        )
    }

    #[inline]
    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_ref().map(Iri::as_str)
    }

    #[inline]
    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    #[inline]
    pub fn term(&self, name: &str) -> Option<&TermDefinition> {
        self.terms.get(name)
    }

    /// The declared terms, by name.
    pub fn terms(&self) -> impl Iterator<Item = &TermDefinition> {
        self.terms.values()
    }

    fn process(&mut self, local_context: &JsonNode) -> Result<(), ContextError> {
        match local_context {
            JsonNode::Null => {
                self.base_iri.clone_from(&self.original_base_iri);
                self.vocab = None;
                self.default_language = None;
                self.terms.clear();
                self.aliases.clear();
                Ok(())
            }
            JsonNode::Array(contexts) => {
                for context in contexts {
                    self.process(context)?;
                }
                Ok(())
            }
            JsonNode::String(iri) => Err(ContextError::msg(format!(
                "The remote context {iri} cannot be loaded: remote contexts are not supported"
            ))),
            JsonNode::Object(entries) => self.process_entries(entries),
            JsonNode::Number(_) | JsonNode::Boolean(_) => Err(ContextError::msg(
                "@context value must be null, a string, an array or an object",
            )),
        }
    }

    fn process_entries(&mut self, entries: &BTreeMap<String, JsonNode>) -> Result<(), ContextError> {
        for (key, value) in entries {
            match key.as_str() {
                "@base" => match value {
                    JsonNode::Null => self.base_iri = None,
                    JsonNode::String(value) => {
                        self.base_iri = Some(
                            if let Some(base_iri) = &self.base_iri {
                                base_iri.resolve(value)
                            } else {
                                Iri::parse(value.clone())
                            }
                            .map_err(|e| ContextError::invalid_iri(value.clone(), e))?,
                        );
                    }
                    _ => return Err(ContextError::msg("@base value must be a string")),
                },
                "@vocab" => match value {
                    JsonNode::Null => self.vocab = None,
                    JsonNode::String(value) => {
                        if !value.starts_with("_:") {
                            Iri::parse(value.as_str())
                                .map_err(|e| ContextError::invalid_iri(value.clone(), e))?;
                        }
                        self.vocab = Some(value.clone());
                    }
                    _ => return Err(ContextError::msg("@vocab value must be a string")),
                },
                "@language" => match value {
                    JsonNode::Null => self.default_language = None,
                    JsonNode::String(value) => {
                        self.default_language = Some(value.to_ascii_lowercase());
                    }
                    _ => return Err(ContextError::msg("@language value must be a string")),
                },
                "@version" => {
                    if *value != JsonNode::Number("1.1".into()) {
                        return Err(ContextError::msg("The only supported @version value is 1.1"));
                    }
                }
                key if has_keyword_form(key) => {
                    return Err(ContextError::msg(format!(
                        "{key} is not supported in contexts"
                    )));
                }
                _ => (),
            }
        }
        let mut defined = HashMap::new();
        for term in entries.keys() {
            if !has_keyword_form(term) {
                self.define_term(entries, term, &mut defined)?;
            }
        }
        Ok(())
    }

    fn define_term(
        &mut self,
        local_context: &BTreeMap<String, JsonNode>,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<(), ContextError> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(ContextError::msg(format!(
                    "The definition of {term} is cyclic"
                )));
            }
            None => (),
        }
        if term.is_empty() {
            return Err(ContextError::msg("Terms cannot be the empty string"));
        }
        defined.insert(term.into(), false);
        self.terms.remove(term);
        self.aliases.remove(term);

        let Some(value) = local_context.get(term) else {
            defined.insert(term.into(), true);
            return Ok(());
        };
        let (id, entries) = match value {
            JsonNode::Null => (None, None),
            JsonNode::String(id) => (Some(id), None),
            JsonNode::Object(entries) => match entries.get("@id") {
                Some(JsonNode::Null) => (None, None),
                Some(JsonNode::String(id)) => (Some(id), Some(entries)),
                Some(_) => {
                    return Err(ContextError::msg(format!(
                        "The @id of {term} must be a string"
                    )));
                }
                None => (None, Some(entries)),
            },
            _ => {
                return Err(ContextError::msg(format!(
                    "The definition of {term} must be null, a string or an object"
                )));
            }
        };
        if id.is_none() && entries.is_none() {
            // Explicitly unmapped
            defined.insert(term.into(), true);
            return Ok(());
        }

        if let Some(id) = id {
            if has_keyword_form(id) {
                if id == "@context" {
                    return Err(ContextError::msg("@context cannot be aliased"));
                }
                self.aliases.insert(term.into(), id.clone());
                defined.insert(term.into(), true);
                return Ok(());
            }
        }

        let iri = if let Some(id) = id {
            self.expand_iri(id, term, local_context, defined)?
        } else if term.contains(':') {
            self.expand_iri(term, term, local_context, defined)?
        } else if let Some(vocab) = &self.vocab {
            format!("{vocab}{term}")
        } else {
            return Err(ContextError::msg(format!(
                "{term} has no IRI mapping and there is no @vocab"
            )));
        };

        let mut definition = TermDefinition {
            name: term.into(),
            prefix: !term.contains(':') && iri.ends_with(['/', '#', ':', '?', '[', ']', '@']),
            iri,
            type_mapping: None,
            container: ContainerMode::Plain,
        };
        for (key, value) in entries.into_iter().flatten() {
            match key.as_str() {
                "@id" => (),
                "@type" => {
                    let JsonNode::String(r#type) = value else {
                        return Err(ContextError::msg(format!(
                            "The @type of {term} must be a string"
                        )));
                    };
                    definition.type_mapping = Some(match r#type.as_str() {
                        "@id" => TypeMapping::Id,
                        "@vocab" => TypeMapping::Vocab,
                        _ if has_keyword_form(r#type) => {
                            return Err(ContextError::msg(format!(
                                "{} is not a supported @type for {term}",
                                r#type
                            )));
                        }
                        _ => {
                            TypeMapping::Datatype(self.expand_iri(r#type, term, local_context, defined)?)
                        }
                    });
                }
                "@container" => {
                    let container = match value {
                        JsonNode::Array(values) if values.len() == 1 => &values[0],
                        value => value,
                    };
                    definition.container = match container {
                        JsonNode::Null => ContainerMode::Plain,
                        JsonNode::String(container) if container == "@set" => ContainerMode::Set,
                        JsonNode::String(container) if container == "@list" => {
                            ContainerMode::List
                        }
                        _ => {
                            return Err(ContextError::msg(format!(
                                "The @container of {term} must be @set, @list or null"
                            )));
                        }
                    };
                }
                "@language" => {
                    if !matches!(value, JsonNode::Null | JsonNode::String(_)) {
                        return Err(ContextError::msg(format!(
                            "The @language of {term} must be a string or null"
                        )));
                    }
                }
                "@prefix" => {
                    let JsonNode::Boolean(prefix) = value else {
                        return Err(ContextError::msg(format!(
                            "The @prefix of {term} must be a boolean"
                        )));
                    };
                    definition.prefix = *prefix;
                }
                _ => {
                    return Err(ContextError::msg(format!(
                        "{key} is not supported in the definition of {term}"
                    )));
                }
            }
        }
        self.terms.insert(term.into(), definition);
        defined.insert(term.into(), true);
        Ok(())
    }

    /// Expands a term, compact IRI or absolute IRI found in the definition of `current`.
    fn expand_iri(
        &mut self,
        value: &str,
        current: &str,
        local_context: &BTreeMap<String, JsonNode>,
        defined: &mut HashMap<String, bool>,
    ) -> Result<String, ContextError> {
        if value != current
            && local_context.contains_key(value)
            && defined.get(value) != Some(&true)
        {
            self.define_term(local_context, value, defined)?;
        }
        if value != current {
            if let Some(definition) = self.terms.get(value) {
                return Ok(definition.iri.clone());
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Ok(value.into());
            }
            if prefix != current
                && local_context.contains_key(prefix)
                && defined.get(prefix) != Some(&true)
            {
                self.define_term(local_context, prefix, defined)?;
            }
            if let Some(definition) = self.terms.get(prefix) {
                return Ok(format!("{}{suffix}", definition.iri));
            }
            if Iri::parse(value).is_ok() {
                return Ok(value.into());
            }
        }
        if let Some(vocab) = &self.vocab {
            return Ok(format!("{vocab}{value}"));
        }
        Err(ContextError::msg(format!(
            "{value} used in the definition of {current} is not an absolute IRI"
        )))
    }

    fn build_indexes(&mut self) {
        self.keywords = Keywords::DEFAULT;
        for (alias, keyword) in &self.aliases {
            self.keywords.alias(keyword, alias);
        }

        self.terms_by_iri.clear();
        for definition in self.terms.values() {
            self.terms_by_iri
                .entry(definition.iri.clone())
                .or_default()
                .push(definition.name.clone());
        }

        self.prefixes = self
            .terms
            .values()
            .filter(|t| t.prefix && t.type_mapping.is_none() && t.container == ContainerMode::Plain)
            .map(|t| (t.iri.clone(), t.name.clone()))
            .collect();
        self.prefixes.sort_by(|(ns_a, name_a), (ns_b, name_b)| {
            ns_b.len()
                .cmp(&ns_a.len())
                .then_with(|| name_a.len().cmp(&name_b.len()))
                .then_with(|| name_a.cmp(name_b))
        });
    }

    fn terms_for_iri<'a>(&'a self, iri: &str) -> impl Iterator<Item = &'a TermDefinition> + 'a {
        self.terms_by_iri
            .get(iri)
            .into_iter()
            .flatten()
            .filter_map(|name| self.terms.get(name))
    }

    fn compact_iri(&self, iri: &str, vocab: bool) -> String {
        // Terms are only read back as IRIs in vocabulary positions
        if vocab {
            if let Some(term) = self
                .terms_for_iri(iri)
                .filter(|t| t.type_mapping.is_none() && t.container == ContainerMode::Plain)
                .min_by(|a, b| by_name_length(a, b))
            {
                return term.name.clone();
            }
            if let Some(suffix) = self.vocab.as_deref().and_then(|v| iri.strip_prefix(v)) {
                if !suffix.is_empty()
                    && !suffix.contains(':')
                    && !has_keyword_form(suffix)
                    && !self.terms.contains_key(suffix)
                {
                    return suffix.into();
                }
            }
        }
        for (namespace, name) in &self.prefixes {
            if let Some(suffix) = iri.strip_prefix(namespace.as_str()) {
                if !suffix.is_empty() && !suffix.starts_with("//") {
                    return format!("{name}:{suffix}");
                }
            }
        }
        if !vocab {
            if let Some(base_iri) = &self.base_iri {
                if let Ok(relative) = base_iri.relativize(&Iri::parse_unchecked(iri)) {
                    let relative = relative.into_inner();
                    // The relative IRI must not be read back as an absolute one
                    if !relative.split_once(':').is_some_and(|(prefix, suffix)| {
                        prefix == "_" || suffix.starts_with("//")
                    }) {
                        return relative;
                    }
                }
            }
        }
        iri.into()
    }
}

impl TermResolver for Context {
    fn shrink(&self, iri: &str) -> String {
        self.compact_iri(iri, false)
    }

    fn shrink_vocab(&self, iri: &str) -> String {
        self.compact_iri(iri, true)
    }

    fn find_term(&self, predicate: &str, datatype: Option<&str>) -> Option<&TermDefinition> {
        self.terms_for_iri(predicate)
            .filter_map(|term| {
                let rank = match (&term.type_mapping, datatype) {
                    (Some(TypeMapping::Datatype(t)), Some(datatype)) if t == datatype => 0,
                    (None, _) => 1,
                    (Some(TypeMapping::Id | TypeMapping::Vocab), None) => 2,
                    _ => return None,
                };
                Some((rank, term))
            })
            .min_by(|(rank_a, a), (rank_b, b)| rank_a.cmp(rank_b).then_with(|| by_name_length(a, b)))
            .map(|(_, term)| term)
    }

    #[inline]
    fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    #[inline]
    fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    #[inline]
    fn context_data(&self) -> &JsonNode {
        &self.data
    }
}

fn by_name_length(a: &TermDefinition, b: &TermDefinition) -> std::cmp::Ordering {
    a.name
        .len()
        .cmp(&b.name.len())
        .then_with(|| a.name.cmp(&b.name))
}

fn has_keyword_form(value: &str) -> bool {
    value
        .strip_prefix('@')
        .is_some_and(|suffix| suffix.bytes().all(|b| b.is_ascii_alphabetic()))
}

/// The context of a conversion: either a resolver or the plain expanded form.
#[derive(Clone, Copy)]
pub(crate) struct ActiveContext<'c> {
    resolver: Option<&'c dyn TermResolver>,
}

static DEFAULT_KEYWORDS: Keywords = Keywords::DEFAULT;

impl<'c> ActiveContext<'c> {
    #[inline]
    pub fn new(resolver: Option<&'c dyn TermResolver>) -> Self {
        Self { resolver }
    }

    #[inline]
    pub fn is_active(self) -> bool {
        self.resolver.is_some()
    }

    #[inline]
    pub fn keywords(self) -> &'c Keywords {
        self.resolver.map_or(&DEFAULT_KEYWORDS, |r| r.keywords())
    }

    pub fn shrink(self, iri: &str) -> String {
        self.resolver.map_or_else(|| iri.into(), |r| r.shrink(iri))
    }

    pub fn shrink_vocab(self, iri: &str) -> String {
        self.resolver
            .map_or_else(|| iri.into(), |r| r.shrink_vocab(iri))
    }

    #[inline]
    pub fn find_term(self, predicate: &str, datatype: Option<&str>) -> Option<&'c TermDefinition> {
        self.resolver?.find_term(predicate, datatype)
    }

    #[inline]
    pub fn default_language(self) -> Option<&'c str> {
        self.resolver?.default_language()
    }

    #[inline]
    pub fn context_data(self) -> Option<&'c JsonNode> {
        Some(self.resolver?.context_data())
    }
}
