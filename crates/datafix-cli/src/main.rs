//! Datafix CLI - run validation pipelines from the command line
//!
//! `datafix run pipeline.json` builds a session from the configured node
//! types, runs it and prints the report. The process exits non-zero when
//! the session fails (warnings do not count as failures).

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use datafix_engine::{serializer, NodeState, ReportOptions};

use config::{CliError, PipelineConfig};

#[derive(Parser)]
#[command(name = "datafix")]
#[command(about = "Run collect-and-validate pipelines", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline and print its report
    Run {
        /// Pipeline configuration (JSON)
        config: PathBuf,
        /// Write the resulting graph as JSON to this file
        #[arg(short, long)]
        export: Option<PathBuf>,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the available node types
    List {
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            config,
            export,
            no_color,
        } => run(&config, export, no_color),
        Commands::List { json } => list(json),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path, export: Option<PathBuf>, no_color: bool) -> Result<ExitCode, CliError> {
    let config = PipelineConfig::load(path)?;
    let mut session = config.build_session()?;
    let state = session.run()?;

    let options = ReportOptions {
        color: config.color && !no_color,
    };
    print!("{}", session.report(&options)?);

    if let Some(export) = export {
        let document = serializer::export_graph(session.graph(), session.root())?;
        let json = serde_json::to_string_pretty(&document).map_err(CliError::Serialize)?;
        std::fs::write(&export, json)?;
        log::info!("Graph exported to {:?}", export);
    }

    Ok(if state == NodeState::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn list(json: bool) -> Result<ExitCode, CliError> {
    let registry = datafix_nodes::builtin_registry();
    let descriptors = registry.all_descriptors();

    if json {
        let text = serde_json::to_string_pretty(&descriptors).map_err(CliError::Serialize)?;
        println!("{}", text);
    } else {
        for descriptor in descriptors {
            println!(
                "{:<18} {:<10} {}",
                descriptor.node_type,
                descriptor.kind.type_name(),
                descriptor.description
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
