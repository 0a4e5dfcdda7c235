use crate::cli::Args;
use anyhow::{Context, bail};
use clap::Parser;
use oxjsonld_compact::{JsonLdCompactor, JsonNode, PrefixedStore, RdfStore};
use oxrdf::{Dataset, Graph, Quad, TripleRef};
use oxrdfio::{RdfFormat, RdfParser};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write, stdin, stdout};
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let format = if let Some(format) = &args.format {
        rdf_format_from_name(format)?
    } else if let Some(file) = &args.file {
        rdf_format_from_path(file)?
    } else {
        bail!("The --format option must be set when reading from stdin")
    };
    let mut parser = RdfParser::from_format(format);
    if let Some(base) = &args.base {
        parser = parser
            .with_base_iri(base)
            .with_context(|| format!("Invalid base IRI {base}"))?;
    }
    let (quads, prefixes) = if let Some(file) = &args.file {
        parse(
            parser,
            BufReader::new(
                File::open(file)
                    .with_context(|| format!("Failed to open {}", file.display()))?,
            ),
        )
        .with_context(|| format!("Failed to parse {}", file.display()))?
    } else {
        parse(parser, stdin().lock()).context("Failed to parse stdin")?
    };
    tracing::info!(
        quads = quads.len(),
        prefixes = prefixes.len(),
        format = format.name(),
        "parsed input"
    );

    let compactor = compactor(&args)?;
    let document = if format.supports_datasets() {
        let mut dataset = Dataset::new();
        for quad in &quads {
            dataset.insert(quad);
        }
        convert(&compactor, dataset, prefixes)?
    } else {
        let mut graph = Graph::new();
        for quad in &quads {
            graph.insert(TripleRef::new(&quad.subject, &quad.predicate, &quad.object));
        }
        convert(&compactor, graph, prefixes)?
    };

    if let Some(output) = &args.output {
        let file = File::create(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        write(&document, BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", output.display()))?;
    } else {
        write(&document, stdout().lock()).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

type Prefixes = Vec<(String, String)>;

fn parse(parser: RdfParser, reader: impl Read) -> anyhow::Result<(Vec<Quad>, Prefixes)> {
    let mut parser = parser.for_reader(reader);
    let mut quads = Vec::new();
    for quad in &mut parser {
        quads.push(quad?);
    }
    let prefixes = parser
        .prefixes()
        .map(|(name, iri)| (name.to_owned(), iri.to_owned()))
        .collect();
    Ok((quads, prefixes))
}

fn compactor(args: &Args) -> anyhow::Result<JsonLdCompactor> {
    let mut compactor = JsonLdCompactor::new();
    if let Some(context) = &args.context {
        let data = fs::read(context)
            .with_context(|| format!("Failed to read the context file {}", context.display()))?;
        compactor = compactor.with_context_data(
            JsonNode::from_slice(&data)
                .with_context(|| format!("Invalid JSON in {}", context.display()))?,
        );
    }
    if let Some(base) = &args.base {
        compactor = compactor
            .with_base_iri(base)
            .with_context(|| format!("Invalid base IRI {base}"))?;
    }
    if args.auto_compact {
        compactor = compactor.with_auto_compact();
    }
    Ok(compactor)
}

fn convert(
    compactor: &JsonLdCompactor,
    store: impl RdfStore,
    prefixes: Prefixes,
) -> anyhow::Result<JsonNode> {
    let mut store = PrefixedStore::new(store);
    for (name, iri) in prefixes {
        store = store
            .with_prefix(name, iri.clone())
            .with_context(|| format!("Invalid prefix IRI {iri}"))?;
    }
    Ok(compactor.convert(&store)?)
}

fn write(document: &JsonNode, writer: impl Write) -> io::Result<()> {
    let mut writer = document.write_to(writer)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}
