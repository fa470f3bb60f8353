use std::io::Write;

use anyhow::Context;

use super::OutputSink;
use crate::version::checker::UpdateStatus;

/// One line per container that can be upgraded, in report order
pub(crate) fn update_lines(report: &[UpdateStatus]) -> impl Iterator<Item = String> + '_ {
    report.iter().filter(|status| status.update_available).filter_map(|status| {
        let latest = status.latest_available_tag.as_deref()?;
        Some(format!(
            "Container {} ({}) can be upgraded to {}",
            status.container_name, status.raw_image, latest
        ))
    })
}

/// Prints only the containers that can be upgraded
pub struct TextSink<W> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> OutputSink for TextSink<W> {
    async fn submit(&mut self, report: &[UpdateStatus]) -> anyhow::Result<()> {
        for line in update_lines(report) {
            writeln!(self.out, "{}", line).context("Failed to write report")?;
        }
        self.out.flush().context("Failed to flush report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;

    #[tokio::test]
    async fn submit_writes_one_line_per_update() {
        let mut sink = TextSink::new(Vec::new());

        sink.submit(&sample_report()).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "Container web (nginx:1.25.0) can be upgraded to 1.27.1\n"
        );
    }

    #[tokio::test]
    async fn submit_writes_nothing_without_updates() {
        let mut sink = TextSink::new(Vec::new());

        sink.submit(&sample_report()[1..]).await.unwrap();

        assert!(sink.into_inner().is_empty());
    }
}
