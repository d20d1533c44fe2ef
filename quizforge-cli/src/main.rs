//! `quizforge`: one topic in, validated study material out.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use quizforge_core::config::{ForgeConfig, GeneralConfig};
use quizforge_core::fallback::fallback_result;
use quizforge_core::types::{ExpectedShape, TaskKind, ValidatedResult};
use quizforge_llm::Pipeline;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;

const DEFAULT_CONFIG_PATH: &str = "quizforge.toml";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.general);

    let (task_kind, topic) = cli.command.task();
    let pipeline = Pipeline::from_config(&config).context("failed to set up the model pipeline")?;

    info!(%task_kind, "generating");
    let outcome = pipeline.generate(task_kind, &topic).await;

    if cli.metrics {
        eprint!("{}", pipeline.counters().snapshot().to_prometheus());
    }

    let result = match outcome {
        Ok(result) => result,
        Err(err) if cli.fallback && has_placeholder(task_kind) => {
            error!(error = %err, "generation failed; using placeholder content");
            fallback_result(task_kind, &topic)
        }
        Err(err) => {
            return Err(err).context(format!("could not generate {task_kind} for \"{topic}\""));
        }
    };

    print_result(&result)?;
    Ok(ExitCode::SUCCESS)
}

/// Only structured task kinds have placeholder items.
fn has_placeholder(task_kind: TaskKind) -> bool {
    matches!(task_kind.default_shape(), ExpectedShape::JsonArray(_))
}

/// Explicit path must exist; the default path is optional.
fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    match path {
        Some(path) => ForgeConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            ForgeConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))
                .with_context(|| format!("failed to load config from {DEFAULT_CONFIG_PATH}"))
        }
        None => Ok(ForgeConfig::default()),
    }
}

/// `RUST_LOG` wins over `general.log_level`. Logs go to stderr so stdout
/// stays pure JSON.
fn init_tracing(general: &GeneralConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&general.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_result(result: &ValidatedResult) -> Result<()> {
    if let Some(warning) = &result.warning {
        eprintln!("warning: {warning}");
    }
    let json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}
