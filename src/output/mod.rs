//! Report rendering
//!
//! - text.rs: one line per available update
//! - tabbed.rs: table of every checked container
//! - json.rs: the full report as JSON
//! - telegram.rs: update lines pushed to a Telegram chat

pub mod json;
pub mod tabbed;
pub mod telegram;
pub mod text;

pub use json::JsonSink;
pub use tabbed::TabbedSink;
pub use telegram::TelegramSink;
pub use text::TextSink;

use std::io::Write;

use anyhow::Context;
use clap::ValueEnum;

use crate::config::CheckerConfig;
use crate::version::checker::UpdateStatus;

/// Destination for a finished report
#[async_trait::async_trait]
pub trait OutputSink: Send {
    async fn submit(&mut self, report: &[UpdateStatus]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Tabbed,
    Json,
    /// Send the update lines through the Telegram Bot API
    Telegram,
}

/// Build the sink for `format`; writer-based sinks print to `out`
pub fn create_sink(
    format: OutputFormat,
    out: Box<dyn Write + Send>,
    config: &CheckerConfig,
) -> anyhow::Result<Box<dyn OutputSink>> {
    Ok(match format {
        OutputFormat::Text => Box::new(TextSink::new(out)),
        OutputFormat::Tabbed => Box::new(TabbedSink::new(out)),
        OutputFormat::Json => Box::new(JsonSink::new(out)),
        OutputFormat::Telegram => {
            let telegram = config
                .telegram
                .as_ref()
                .context("--output telegram requires a telegram section in the config file")?;
            Box::new(TelegramSink::new(telegram)?)
        }
    })
}
