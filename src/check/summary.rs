use serde::Serialize;

use crate::version::checker::{Resolution, UpdateState, UpdateStatus};

/// Counts of a finished report by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub updates: usize,
    pub up_to_date: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn summarize(report: &[UpdateStatus]) -> ReportSummary {
    report
        .iter()
        .fold(ReportSummary::default(), |mut summary, status| {
            summary.total += 1;
            match status.state {
                UpdateState::Resolved(Resolution::UpdateAvailable) => summary.updates += 1,
                UpdateState::Resolved(Resolution::NoUpdate) => summary.up_to_date += 1,
                UpdateState::Skipped(_) => summary.skipped += 1,
                UpdateState::Failed(_) => summary.failed += 1,
            }
            summary
        })
}
