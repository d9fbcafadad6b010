//! Helios Search CLI
//!
//! Compiles a search query against a field set definition and prints the
//! compiled fragment as JSON.
//!
//! ```text
//! helios-search --fields users.json --dialect postgres 'name: ~i*smith; age: >60'
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use helios_search::backends::sql::SqlDialect;
use helios_search::export::StringQueryExporter;
use helios_search::field::FieldSetDefinition;
use helios_search::input::StructuredGroup;
use helios_search::{ConditionGenerator, SearchConfig, SearchError, SearchProcessor};
use tracing::info;

/// Output backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// SQL WHERE fragment with bound parameters.
    Sql,
    /// Elasticsearch query document.
    Document,
}

#[derive(Debug, Parser)]
#[command(name = "helios-search", version)]
#[command(about = "Compile search queries into SQL or Elasticsearch conditions")]
struct Cli {
    /// Field set definition (JSON).
    #[arg(short, long, env = "SEARCH_FIELDS")]
    fields: PathBuf,

    /// Backend to compile for.
    #[arg(short, long, value_enum, default_value = "sql")]
    backend: Backend,

    /// SQL dialect (sqlite, postgres, mysql, sqlserver).
    #[arg(short, long, default_value = "sqlite")]
    dialect: SqlDialect,

    /// Read the query as structured JSON.
    #[arg(long)]
    structured: bool,

    /// Print the optimized query instead of compiling it.
    #[arg(long)]
    normalize: bool,

    /// The query.
    query: String,

    #[command(flatten)]
    config: SearchConfig,
}

/// Initializes logging to stderr.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("helios_search={},helios_search_cli={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let loaded = FieldSetDefinition::from_file(&cli.fields)?
        .load()
        .with_context(|| format!("invalid field set definition {}", cli.fields.display()))?;

    let processor = SearchProcessor::new(cli.config.processor_config());
    let condition = if cli.structured {
        let input: StructuredGroup = serde_json::from_str(&cli.query)?;
        processor.process_structured(&input, &loaded.field_set)?
    } else {
        processor.process(&cli.query, &loaded.field_set)?
    };

    if condition.has_errors() {
        return Err(SearchError::InvalidCondition {
            errors: condition.errors(),
        }
        .into());
    }

    if cli.normalize {
        return Ok(StringQueryExporter::new().export(&condition));
    }

    let fragment = match cli.backend {
        Backend::Sql => loaded
            .sql_generator(cli.dialect)
            .with_param_prefix(cli.config.param_prefix.as_str())
            .compile(&condition)?,
        Backend::Document => loaded.document_generator().compile(&condition)?,
    };
    info!(backend = ?cli.backend, "Compiled search query");

    Ok(serde_json::to_string_pretty(&fragment)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<SearchError>() {
                Some(SearchError::InvalidCondition { errors }) => {
                    for error in errors {
                        eprintln!("{}", error);
                    }
                }
                _ => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
