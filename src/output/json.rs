use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OutputSink;
use crate::check::summary::{ReportSummary, summarize};
use crate::version::checker::UpdateStatus;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    summary: ReportSummary,
    statuses: &'a [UpdateStatus],
}

/// Prints the whole report as pretty JSON
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> OutputSink for JsonSink<W> {
    async fn submit(&mut self, report: &[UpdateStatus]) -> anyhow::Result<()> {
        let document = JsonReport {
            generated_at: Utc::now(),
            summary: summarize(report),
            statuses: report,
        };

        serde_json::to_writer_pretty(&mut self.out, &document)
            .context("Failed to serialize report")?;
        writeln!(self.out).context("Failed to write report")?;
        self.out.flush().context("Failed to flush report")
    }
}
