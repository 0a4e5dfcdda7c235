use clap::{Parser, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdf2jsonld")]
/// Converts RDF files into JSON-LD documents
pub struct Args {
    /// File to convert
    ///
    /// If no file is given, stdin is used.
    /// In this case, the input format must be specified using the --format option.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
    /// The format of the file to convert
    ///
    /// It can be an extension like "ttl" or a MIME type like "text/turtle".
    ///
    /// By default, the format is guessed from the file extension.
    #[arg(long, required_unless_present = "file")]
    pub format: Option<String>,
    /// Base IRI of the file to convert
    ///
    /// It is also used to relativize the node identifiers of compacted documents.
    #[arg(long, value_hint = ValueHint::Url)]
    pub base: Option<String>,
    /// JSON-LD context file to compact the output with
    ///
    /// It might contain the context itself or a document with a "@context" entry.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub context: Option<PathBuf>,
    /// Derive a context from the prefixes declared in the input if no context is given
    #[arg(long)]
    pub auto_compact: bool,
    /// File to write the JSON-LD document to
    ///
    /// If no file is given, stdout is used.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// Write the logs as JSON lines
    ///
    /// The log level is set with the RUST_LOG environment variable.
    #[arg(long)]
    pub json_logs: bool,
}
