#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod compactor;
mod context;
mod error;
mod json;
mod list;
mod node;
mod property;
mod store;
mod value;

pub use compactor::JsonLdCompactor;
pub use context::{ContainerMode, Context, Keywords, TermDefinition, TermResolver, TypeMapping};
pub use error::{ContextError, ConvertError, UnsupportedOption};
pub use json::JsonNode;
pub use store::{PrefixedStore, RdfStore};
