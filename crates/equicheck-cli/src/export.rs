//! CSV report for one analysis.
//!
//! Layout: a short preamble (title, date, id, scores, summary), an empty line,
//! then the discrepancy table. Rows are flexible-width; quoting is left to the
//! `csv` writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use csv::WriterBuilder;
use equicheck_core::AnalysisResult;

use crate::display::format_timestamp;

const HEADERS: [&str; 6] = [
    "Category",
    "Topic",
    "Buy Side Claim",
    "Sell Side Claim",
    "Severity",
    "Reasoning",
];

/// `EquiCheck_Report_<first 8 chars of id>.csv`
pub fn default_file_name(r: &AnalysisResult) -> PathBuf {
    PathBuf::from(format!("EquiCheck_Report_{}.csv", r.short_id()))
}

/// Write the report to any sink.
pub fn write_report<W: Write>(r: &AnalysisResult, sink: W) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().flexible(true).from_writer(sink);

    w.write_record(["EquiCheck Analysis Report"])?;
    w.write_record([format!("Date: {}", format_timestamp(r.timestamp))])?;
    w.write_record([format!("Analysis ID: {}", r.id)])?;
    w.write_record([format!("Risk Score: {}/100", r.risk_score)])?;
    w.write_record([format!("Agreement Score: {}/100", r.agreement_score)])?;
    w.write_record([format!("Executive Summary: {}", r.executive_summary)])?;
    // A zero-field record would be written as `""`, so the separator goes
    // straight to the sink.
    let mut sink = w.into_inner().map_err(|e| e.into_error())?;
    sink.write_all(b"\n")?;
    let mut w = WriterBuilder::new().flexible(true).from_writer(sink);
    w.write_record(["DISCREPANCIES DETAIL"])?;
    w.write_record(HEADERS)?;
    for d in &r.discrepancies {
        w.write_record([
            d.category.as_str(),
            d.topic.as_str(),
            d.buy_side_claim.as_str(),
            d.sell_side_claim.as_str(),
            d.severity.as_str(),
            d.reasoning.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Write the report to `path`.
pub fn write_report_file(r: &AnalysisResult, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_report(r, file)
}
