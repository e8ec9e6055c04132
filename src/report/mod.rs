//! Report generation: record filtering, layout and PDF serialization.

pub mod layout;
pub mod metrics;
pub mod pdf;

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::model::{PoliceOccurrence, ReportSubType, ResultSet, StyleConfig};

/// Which records make it into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    /// Crime records only; traffic accidents are dropped even when flagged
    /// as crimes.
    Crimes,
    /// Everything extracted. Always renders complete, since hiding
    /// narratives makes no sense for a full dump.
    All,
}

pub fn filter_records(records: Vec<PoliceOccurrence>, report_type: ReportType) -> Vec<PoliceOccurrence> {
    match report_type {
        ReportType::All => records,
        ReportType::Crimes => records
            .into_iter()
            .filter(|r| r.is_crime && !r.fact.to_uppercase().contains("ACIDENTE"))
            .collect(),
    }
}

/// Build the final document bytes for the given result set.
pub fn generate(
    results: &ResultSet,
    report_type: ReportType,
    style: &StyleConfig,
) -> Result<Vec<u8>> {
    let records = filter_records(results.sorted(), report_type);
    info!(records = records.len(), ?report_type, "rendering report");

    let mut style = style.clone();
    if report_type == ReportType::All {
        style.report_sub_type = ReportSubType::Complete;
    }

    let layout = layout::layout_report(&records, &style);
    info!(pages = layout.pages.len(), "layout complete");
    pdf::render(&layout)
}

/// Output name derived from the source document, or the fixed manual-entry
/// name when extraction ran over pasted text.
pub fn report_filename(input: Option<&Path>) -> String {
    match input.and_then(|p| p.file_stem()).and_then(|s| s.to_str()) {
        Some(base) => format!("Relatório {base}.pdf"),
        None => "Extração Manual.pdf".to_string(),
    }
}
