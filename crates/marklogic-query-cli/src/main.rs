//! `mlq`: reads a search request document, validates it, and writes it back
//! in canonical form.
//!
//! The input is JSON or YAML, from a file or stdin. Request options and a
//! page can be layered on before the document is written.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use marklogic_query::{args, BuiltQuery};
use serde_json::{Map, Value};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

/// Validate and normalize a structured search request document
#[derive(Debug, Parser)]
#[command(name = "mlq", version, about)]
struct Cli {
    /// Request document to read (stdin when omitted)
    input: Option<PathBuf>,

    /// Options object (JSON or YAML) to set as the options clause
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// First result to return, 1-based. 0 returns only facets and metrics
    #[arg(long)]
    start: Option<u64>,

    /// Number of results per page
    #[arg(long)]
    length: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// More logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(cli: &Cli) {
    // RUST_LOG wins when set; otherwise -v raises the level for the builder.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        tracing_subscriber::EnvFilter::new(format!("marklogic_query={level},mlq={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let text = read_source(cli.input.as_deref())?;
    let mut query = load_query(&text)?;

    if let Some(path) = &cli.options {
        let config = read_object(&read_source(Some(path))?)
            .with_context(|| format!("reading options from {}", path.display()))?;
        query = query.with_options(config)?;
    }

    if cli.start.is_some() || cli.length.is_some() {
        query = apply_page(query, cli.start, cli.length)?;
    }

    let output = render(&query, cli.format, cli.compact)?;
    println!("{output}");
    Ok(())
}

fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "reading file");
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

// JSON is tried first so its error is the one reported for JSON-looking input.
fn parse_document(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(json_err) if text.trim_start().starts_with('{') => {
            Err(json_err).context("input is not valid JSON")
        }
        Err(_) => serde_yaml::from_str(text).context("input is neither JSON nor YAML"),
    }
}

fn read_object(text: &str) -> Result<Map<String, Value>> {
    match parse_document(text)? {
        Value::Object(map) => Ok(map),
        other => bail!("expected an object, got {other}"),
    }
}

fn load_query(text: &str) -> Result<BuiltQuery> {
    let document = Value::Object(read_object(text)?);
    let query = BuiltQuery::copy_from_str(&serde_json::to_string(&document)?)?;
    info!(query_type = ?query.query_type(), "loaded query");
    Ok(query)
}

fn apply_page(query: BuiltQuery, start: Option<u64>, length: Option<u64>) -> Result<BuiltQuery> {
    let page = match (start, length) {
        (Some(start), Some(length)) => args![start, length],
        (Some(start), None) => args![start],
        // A length alone pages from the first result.
        (None, Some(length)) => args![1u64, length],
        (None, None) => args![],
    };
    Ok(query.slice(page)?)
}

// Serializes the query itself rather than a `Value` so clauses keep their order.
fn render(query: &BuiltQuery, format: Format, compact: bool) -> Result<String> {
    Ok(match format {
        Format::Json if compact => query.to_json_string()?,
        Format::Json => serde_json::to_string_pretty(query)?,
        Format::Yaml => serde_yaml::to_string(query)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["mlq", "q.json", "--format", "yaml", "-vv", "--start", "0"]);
        assert_eq!(cli.input, Some(PathBuf::from("q.json")));
        assert_eq!(cli.format, Format::Yaml);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.start, Some(0));
    }

    #[test]
    fn loads_json_and_yaml() {
        let from_json = load_query(r#"{"whereClause": {"$query": {"a": 1}}}"#).unwrap();
        let from_yaml = load_query("whereClause:\n  $query:\n    a: 1\n").unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(
            from_json.to_json().unwrap()["queryType"],
            json!("qbe")
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert!(load_query("[1, 2]").is_err());
        assert!(load_query("{broken").is_err());
    }

    #[test]
    fn page_flags_set_slice() {
        let query = load_query("{}").unwrap();
        let paged = apply_page(query.clone(), Some(0), None).unwrap();
        assert_eq!(
            paged.to_json().unwrap(),
            json!({"sliceClause": {"page-length": 0}})
        );
        let paged = apply_page(query, None, Some(25)).unwrap();
        assert_eq!(
            paged.to_json().unwrap(),
            json!({"sliceClause": {"page-start": 1, "page-length": 25}})
        );
    }

    #[test]
    fn options_file_is_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debug: true\nbogus: 3").unwrap();

        let config = read_object(&read_source(Some(file.path())).unwrap()).unwrap();
        let query = load_query("{}").unwrap().with_options(config).unwrap();
        assert_eq!(
            render(&query, Format::Json, true).unwrap(),
            r#"{"withOptionsClause":{"debug":true}}"#
        );
    }

    #[test]
    fn renders_yaml() {
        let query = load_query(r#"{"sliceClause": {"page-length": 5}}"#).unwrap();
        let yaml = render(&query, Format::Yaml, false).unwrap();
        assert!(yaml.contains("page-length: 5"));
    }
}
