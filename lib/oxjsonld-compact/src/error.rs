use json_event_parser::JsonSyntaxError;
use oxiri::IriParseError;
use std::fmt;
use std::io;

/// Error returned while processing a JSON-LD context.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ContextError(#[from] ContextErrorKind);

#[derive(Debug, thiserror::Error)]
enum ContextErrorKind {
    #[error(transparent)]
    Json(#[from] JsonSyntaxError),
    #[error("error while parsing IRI '{iri}': {error}")]
    InvalidIri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    #[error("{0}")]
    Msg(String),
}

impl ContextError {
    /// Builds an error from a printable error message.
    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self(ContextErrorKind::Msg(msg.into()))
    }

    pub(crate) fn invalid_iri(iri: String, error: IriParseError) -> Self {
        Self(ContextErrorKind::InvalidIri { iri, error })
    }
}

#[doc(hidden)]
impl From<JsonSyntaxError> for ContextError {
    #[inline]
    fn from(error: JsonSyntaxError) -> Self {
        Self(ContextErrorKind::Json(error))
    }
}

impl From<ContextError> for io::Error {
    #[inline]
    fn from(error: ContextError) -> Self {
        match error.0 {
            ContextErrorKind::Json(error) => Self::new(io::ErrorKind::InvalidData, error),
            ContextErrorKind::Msg(msg) => Self::new(io::ErrorKind::InvalidData, msg),
            ContextErrorKind::InvalidIri { .. } => Self::new(io::ErrorKind::InvalidData, error),
        }
    }
}

/// A conversion option that is accepted for interface compatibility but not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedOption {
    /// Coercion of typed literals into JSON numbers and booleans.
    NativeTypes,
    /// Framing of the output around a given start node.
    StartNode,
    /// Graph indexing output mode.
    Index,
}

impl fmt::Display for UnsupportedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NativeTypes => "native types",
            Self::StartNode => "start node",
            Self::Index => "index",
        })
    }
}

/// Error returned by [`JsonLdCompactor::convert`](crate::JsonLdCompactor::convert).
///
/// Conversion either fails before producing any output or returns a complete tree.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A non-default value has been set for an option that is not implemented.
    #[error("the {0} option is not supported")]
    UnsupportedOption(UnsupportedOption),
    /// The supplied context data is invalid.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<ConvertError> for io::Error {
    #[inline]
    fn from(error: ConvertError) -> Self {
        match error {
            ConvertError::UnsupportedOption(_) => Self::new(io::ErrorKind::Unsupported, error),
            ConvertError::Context(error) => error.into(),
        }
    }
}
