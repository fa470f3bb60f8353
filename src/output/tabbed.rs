use std::io::Write;

use anyhow::Context;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::OutputSink;
use crate::version::checker::UpdateStatus;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "CONTAINER")]
    container: String,
    #[tabled(rename = "IMAGE")]
    image: String,
    #[tabled(rename = "CURRENT")]
    current: String,
    #[tabled(rename = "LATEST")]
    latest: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

impl From<&UpdateStatus> for StatusRow {
    fn from(status: &UpdateStatus) -> Self {
        Self {
            container: status.container_name.clone(),
            image: status.raw_image.clone(),
            current: status.original_tag.clone(),
            latest: status
                .latest_available_tag
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            status: status.state.to_string(),
        }
    }
}

/// Prints every checked container as a table
pub struct TabbedSink<W> {
    out: W,
}

impl<W: Write> TabbedSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> OutputSink for TabbedSink<W> {
    async fn submit(&mut self, report: &[UpdateStatus]) -> anyhow::Result<()> {
        let mut table = Table::new(report.iter().map(StatusRow::from));
        table.with(Style::blank());

        writeln!(self.out, "{}", table).context("Failed to write report")?;
        self.out.flush().context("Failed to flush report")
    }
}
