//! Binary entry flow: arguments, logging, configuration, pump, summary

use super::cli::args::Args;
use super::cli::config::{load_config, ConfigError};
use super::cli::display::render_stats_table;
use super::input::pump_lines;
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::{init_logging, reconfigure_logging};
use crate::core::version::long_version;
use crate::delivery::api::{AsyncHandler, HandlerError, HandlerStats, MemorySink, SinkHandle};
use crate::queue::Message;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("Failed to read input: {0}")]
    Input(#[from] io::Error),
}

impl ContextualError for StartupError {
    fn is_user_actionable(&self) -> bool {
        match self {
            StartupError::Config(err) => err.is_user_actionable(),
            StartupError::Handler(err) => err.is_user_actionable(),
            StartupError::Input(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StartupError::Config(err) => err.user_message(),
            StartupError::Handler(err) => err.user_message(),
            StartupError::Input(_) => None,
        }
    }
}

/// Outcome of one run
#[derive(Debug)]
pub struct RunSummary {
    /// Input lines that became messages
    pub produced: usize,
    pub stats: HandlerStats,
    /// What the in-memory sink received, for `--dry-run`
    pub dry_run_messages: Option<Vec<Arc<Message>>>,
}

/// Initialize application startup
pub async fn startup() {
    let args = Args::parse();
    let use_color = args.use_color(io::stdout().is_terminal());
    let log_file = args.log_file_path();

    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        log_file.as_deref(),
        use_color && log_file.is_none(),
    ) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }
    log::debug!("logpump {} starting", long_version());

    let show_stats = args.stats;
    match run(args, use_color).await {
        Ok(summary) => {
            if show_stats {
                eprintln!("{}", render_stats_table(&summary.stats));
            }
            if let Some(messages) = &summary.dry_run_messages {
                log::info!(
                    "Dry run: {} of {} messages would have been delivered",
                    messages.len(),
                    summary.produced
                );
            }
        }
        Err(err) => {
            log_error_with_context(&err, "Running delivery pipeline");
            std::process::exit(1);
        }
    }
}

/// Pump the configured input through a handler and shut it down
pub async fn run(args: Args, use_color: bool) -> Result<RunSummary, StartupError> {
    let file_config = load_config(args.config_file.clone()).await?;
    let handler_config = file_config.handler_config(&args);

    if let (None, Some(level)) = (&args.log_level, &file_config.log_level) {
        if let Err(e) = reconfigure_logging(level) {
            log::debug!("Ignoring configured log level '{}': {}", level, e);
        }
    }

    let dry_run_sink = args.dry_run.then(|| Arc::new(MemorySink::new("dry-run")));
    let sinks: Vec<SinkHandle> = match &dry_run_sink {
        Some(memory) => vec![memory.clone()],
        None => file_config.build_sinks(use_color)?,
    };

    let handler = Arc::new(AsyncHandler::new(handler_config, sinks)?);
    log::debug!(
        "Handler '{}' accepts {:?}",
        handler.name(),
        handler.type_mask()
    );

    let producer = Arc::clone(&handler);
    let input = args.input.clone();
    let source = args.source_name().to_string();
    let default_type = args.default_message_type();
    let produced = tokio::task::spawn_blocking(move || {
        let deliver = |message| producer.handle_message(message);
        match input {
            Some(path) => pump_lines(BufReader::new(File::open(path)?), &source, default_type, deliver),
            None => pump_lines(io::stdin().lock(), &source, default_type, deliver),
        }
    })
    .await
    .map_err(io::Error::other)??;

    handler.flush_async().await;
    handler.shutdown();

    Ok(RunSummary {
        produced,
        stats: handler.stats(),
        dry_run_messages: dry_run_sink.map(|memory| memory.messages()),
    })
}
