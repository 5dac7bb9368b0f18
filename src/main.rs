//! Triggerfish language server binary.
//!
//! Speaks LSP over stdio. Settings come from `TRIGGERFISH_*` environment
//! variables, overridden by the command line flags below.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use triggerfish::config::{TriggerConfig, TriggerfishConfig};
use triggerfish::logging::init_logger;
use triggerfish::lsp::backend::TriggerfishBackend;

/// Triggerfish command line arguments.
#[derive(Parser, Debug)]
#[command(name = "triggerfish", version)]
#[command(about = "Trigger-character completion of files, classes and functions for plain text documents")]
struct Args {
    /// Log level filter for stderr output (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Disable the session log file in the user cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Maximum number of completion items per request
    #[arg(long, value_name = "N")]
    max_completion_items: Option<usize>,

    /// Minimum fuzzy score (0-100) a candidate needs to be offered
    #[arg(long, value_name = "SCORE")]
    min_fuzzy_score: Option<f64>,

    /// Trigger definition such as `@=file` or `#=method,function`; repeatable,
    /// replaces the default triggers
    #[arg(long = "trigger", value_name = "SPEC")]
    triggers: Vec<TriggerConfig>,

    /// Only documents whose URI ends with this suffix get completions
    #[arg(long, value_name = "SUFFIX")]
    completion_suffix: Option<String>,

    /// ctags executable used for code symbol extraction
    #[arg(long, value_name = "PATH")]
    ctags_path: Option<PathBuf>,

    /// Index files without running ctags
    #[arg(long)]
    no_ctags: bool,

    /// Communicate over stdin/stdout (the only supported transport)
    #[arg(long)]
    stdio: bool,
}

impl Args {
    fn apply_to(self, config: &mut TriggerfishConfig) {
        if let Some(max) = self.max_completion_items {
            config.max_completion_items = max;
        }
        if let Some(score) = self.min_fuzzy_score {
            config.min_fuzzy_score = score;
        }
        if !self.triggers.is_empty() {
            config.triggers = self.triggers;
        }
        if let Some(suffix) = self.completion_suffix {
            config.completion_suffix = suffix;
        }
        if let Some(path) = self.ctags_path {
            config.ctags_path = path;
        }
        if self.no_ctags {
            config.ctags_enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)
        .context("Failed to initialize logging")?;

    let mut config = TriggerfishConfig::from_env().context("Invalid TRIGGERFISH_* environment")?;
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        "Starting triggerfish {} with triggers {:?}",
        env!("CARGO_PKG_VERSION"),
        config.trigger_characters()
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| TriggerfishBackend::new(client, config));

    Server::new(stdin, stdout, socket)
        .serve(service)
        .await;

    info!("triggerfish exited");
    Ok(())
}
