use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::Parser;
use to_dict_core::{Serializer, SerializerOptions, Value};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

/// Document format for input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum DocFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "to-dict")]
#[command(about = "Filter a JSON/YAML document through a field-selection schema")]
#[command(version)]
struct Cli {
    /// Input document; reads stdin when omitted or `-`.
    input: Option<PathBuf>,
    /// Schema paths (repeatable or comma-separated), e.g. `-s name,-age,child.*`.
    #[arg(short, long = "schema", value_delimiter = ',', allow_hyphen_values = true)]
    schema: Vec<String>,
    /// YAML options file; explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Exclude fields unless mentioned or wildcarded.
    #[arg(long)]
    strict: bool,
    /// Pattern for date-only values (e.g. `DD.MM.YYYY`).
    #[arg(long)]
    date_format: Option<String>,
    /// Pattern for date-time values (e.g. `YYYY-MM-DD HH:mm`).
    #[arg(long)]
    datetime_format: Option<String>,
    /// Convert date-times into the user's zone before formatting.
    #[arg(long)]
    to_user_tz: bool,
    /// The user's zone as a UTC offset (e.g. `+02:00`).
    #[arg(long)]
    user_timezone: Option<String>,
    /// Prefix marking private fields excluded by greedy mode.
    #[arg(long, conflicts_with = "no_private_prefix")]
    private_prefix: Option<String>,
    /// Treat no field as private.
    #[arg(long)]
    no_private_prefix: bool,
    /// Promote RFC 3339 and `YYYY-MM-DD` strings to date/time values.
    #[arg(long)]
    parse_dates: bool,
    /// Input format (default: by file extension, else JSON).
    #[arg(long)]
    input_format: Option<DocFormat>,
    /// Output format.
    #[arg(long, default_value = "json")]
    output_format: DocFormat,
    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
    /// Enable verbose debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let (text, source) = read_input(cli.input.as_deref())?;

    let options = build_options(&cli)?;
    let serializer = Serializer::from_options(options).map_err(|err| err.to_string())?;

    let format = cli
        .input_format
        .unwrap_or_else(|| detect_format(cli.input.as_deref()));
    let document = parse_document(&text, format)
        .map_err(|err| format!("Failed to parse {source}: {err}"))?;

    let mut value = Value::from(document);
    if cli.parse_dates {
        value = promote_dates(value);
    }

    debug!(schema = ?cli.schema, source = %source, "Serializing document");
    let output = serializer
        .serialize(&value, &cli.schema)
        .map_err(|err| err.to_string())?;

    let rendered = match cli.output_format {
        DocFormat::Json if cli.pretty => serde_json::to_string_pretty(&output)
            .map_err(|err| format!("Failed to render JSON: {err}"))?,
        DocFormat::Json => {
            serde_json::to_string(&output).map_err(|err| format!("Failed to render JSON: {err}"))?
        }
        DocFormat::Yaml => {
            serde_yaml::to_string(&output).map_err(|err| format!("Failed to render YAML: {err}"))?
        }
    };
    println!("{}", rendered.trim_end());

    info!(source = %source, "Done");
    Ok(())
}

fn build_options(cli: &Cli) -> Result<SerializerOptions, String> {
    let mut options = match &cli.config {
        Some(path) => SerializerOptions::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => SerializerOptions::default(),
    };

    if cli.strict {
        options.is_greedy = false;
    }
    if let Some(pattern) = &cli.date_format {
        options.date_format = pattern.clone();
    }
    if let Some(pattern) = &cli.datetime_format {
        options.datetime_format = pattern.clone();
    }
    if cli.to_user_tz {
        options.to_user_tz = true;
    }
    if let Some(tz) = &cli.user_timezone {
        options.user_timezone = Some(tz.clone());
    }
    if let Some(prefix) = &cli.private_prefix {
        options.private_prefix = Some(prefix.clone());
    }
    if cli.no_private_prefix {
        options.private_prefix = None;
    }

    Ok(options)
}

fn read_input(path: Option<&Path>) -> Result<(String, String), String> {
    match path {
        Some(path) if path != Path::new("-") => {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
            Ok((text, format!("'{}'", path.display())))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok((text, "stdin".to_string()))
        }
    }
}

fn detect_format(path: Option<&Path>) -> DocFormat {
    match path
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("yaml" | "yml") => DocFormat::Yaml,
        _ => DocFormat::Json,
    }
}

fn parse_document(text: &str, format: DocFormat) -> Result<serde_json::Value, String> {
    match format {
        DocFormat::Json => serde_json::from_str(text).map_err(|err| err.to_string()),
        DocFormat::Yaml => serde_yaml::from_str(text).map_err(|err| err.to_string()),
    }
}

/// Rewrites date-like strings into temporal values, recursively.
fn promote_dates(value: Value) -> Value {
    match value {
        Value::Str(s) => parse_temporal(&s).unwrap_or(Value::Str(s)),
        Value::List(items) => Value::List(items.into_iter().map(promote_dates).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, promote_dates(v)))
                .collect(),
        ),
        other => other,
    }
}

fn parse_temporal(s: &str) -> Option<Value> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Value::DateTime(dt));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(Value::NaiveDateTime(naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(Value::Date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_by_extension() {
        assert_eq!(detect_format(Some(Path::new("a.YML"))), DocFormat::Yaml);
        assert_eq!(detect_format(Some(Path::new("a.yaml"))), DocFormat::Yaml);
        assert_eq!(detect_format(Some(Path::new("a.json"))), DocFormat::Json);
        assert_eq!(detect_format(None), DocFormat::Json);
    }

    #[test]
    fn test_parse_temporal_variants() {
        assert!(matches!(
            parse_temporal("2024-01-15T10:30:00+02:00"),
            Some(Value::DateTime(_))
        ));
        assert!(matches!(
            parse_temporal("2024-01-15 10:30"),
            Some(Value::NaiveDateTime(_))
        ));
        assert!(matches!(parse_temporal("2024-01-15"), Some(Value::Date(_))));
        assert!(parse_temporal("Ann").is_none());
        assert!(parse_temporal("2024-13-45").is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "to-dict",
            "--strict",
            "--date-format",
            "DD/MM/YYYY",
            "--no-private-prefix",
            "-s",
            "-age,child.*",
        ]);
        let options = build_options(&cli).unwrap();
        assert!(!options.is_greedy);
        assert_eq!(options.date_format, "DD/MM/YYYY");
        assert!(options.private_prefix.is_none());
        assert_eq!(cli.schema, vec!["-age", "child.*"]);
    }
}
