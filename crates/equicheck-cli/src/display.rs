//! Plain-text rendering of analysis results and history.
//!
//! Renders one [`AnalysisResult`] as a grouped card: header, scores,
//! narrative sections, key risks, and discrepancies most severe first.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use equicheck_core::{AnalysisResult, Severity};

const RULE: &str = "────────────────────────────────────────────────────────────";
const BAR_WIDTH: usize = 20;

/// Local date and time for an epoch-milliseconds timestamp.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => format!("@{millis}"),
    }
}

fn severity_marker(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "!!!",
        Severity::High => "!! ",
        Severity::Medium => "!  ",
        _ => "   ",
    }
}

/// `[#######.............]  35/100`
fn score_bar(score: i64) -> String {
    let clamped = score.clamp(0, 100) as usize;
    let filled = (clamped * BAR_WIDTH + 50) / 100;
    format!(
        "[{}{}] {:>3}/100",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        score
    )
}

/// Full card for one analysis.
pub fn render_card(r: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "EquiCheck Analysis  {}", r.id);
    let _ = writeln!(out, "  Date:       {}", format_timestamp(r.timestamp));
    let _ = writeln!(out, "  Buy side:   {}", r.buy_side_file_name);
    let _ = writeln!(out, "  Sell side:  {}", r.sell_side_file_name);
    let _ = writeln!(out, "{RULE}");

    // ── Scores ──
    let _ = writeln!(out, "  Risk score       {}", score_bar(r.risk_score));
    let _ = writeln!(out, "  Agreement score  {}", score_bar(r.agreement_score));
    let _ = writeln!(out);

    section(&mut out, "Executive summary", &r.executive_summary);
    section(&mut out, "Strategic alignment", &r.strategic_alignment);

    let _ = writeln!(out, "Key risks");
    if r.key_risks.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for risk in &r.key_risks {
        let _ = writeln!(out, "  - {risk}");
    }
    let _ = writeln!(out);

    // ── Discrepancies ──
    let counts: Vec<String> = r
        .severity_counts()
        .into_iter()
        .map(|(sev, n)| format!("{n} {sev}"))
        .collect();
    if counts.is_empty() {
        let _ = writeln!(out, "Discrepancies (0)");
    } else {
        let _ = writeln!(
            out,
            "Discrepancies ({}: {})",
            r.discrepancies.len(),
            counts.join(", ")
        );
    }
    for (i, d) in r.discrepancies_by_severity().into_iter().enumerate() {
        let _ = writeln!(
            out,
            "{} {}. [{}] {} / {}",
            severity_marker(&d.severity),
            i + 1,
            d.severity,
            d.category,
            d.topic
        );
        let _ = writeln!(out, "       Buy side:  {}", d.buy_side_claim);
        let _ = writeln!(out, "       Sell side: {}", d.sell_side_claim);
        let _ = writeln!(out, "       Why:       {}", d.reasoning);
    }
    let _ = writeln!(out, "{RULE}");
    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "{title}");
    for line in body.lines() {
        let _ = writeln!(out, "  {line}");
    }
    let _ = writeln!(out);
}

/// One line per record, newest first as given.
pub fn render_history(records: &[AnalysisResult]) -> String {
    if records.is_empty() {
        return "No analyses found.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16}  {:<8}  {:>4}  {:>5}  {:>4}  FILES",
        "DATE", "ID", "RISK", "AGREE", "DISC"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<16}  {:<8}  {:>4}  {:>5}  {:>4}  {} vs {}",
            format_timestamp(r.timestamp),
            r.short_id(),
            r.risk_score,
            r.agreement_score,
            r.discrepancies.len(),
            r.buy_side_file_name,
            r.sell_side_file_name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use equicheck_core::Discrepancy;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            id: "0a1b2c3d-1111-4222-8333-444455556666".into(),
            timestamp: 1_709_287_200_000,
            buy_side_file_name: "buy.pdf".into(),
            sell_side_file_name: "sell.pdf".into(),
            executive_summary: "Kill.\nEBITDA does not reconcile.".into(),
            risk_score: 85,
            agreement_score: 30,
            strategic_alignment: "Divergent".into(),
            key_risks: vec!["Artificial EBITDA inflation".into()],
            discrepancies: vec![
                Discrepancy {
                    category: "Market Sizing".into(),
                    topic: "TAM".into(),
                    buy_side_claim: "Regional".into(),
                    sell_side_claim: "Global".into(),
                    severity: "Medium".into(),
                    reasoning: "Scope".into(),
                },
                Discrepancy {
                    category: "Legal".into(),
                    topic: "Litigation".into(),
                    buy_side_claim: "Pending suit".into(),
                    sell_side_claim: "None".into(),
                    severity: "Critical".into(),
                    reasoning: "Omitted".into(),
                },
            ],
        }
    }

    #[test]
    fn score_bar_scales() {
        assert_eq!(score_bar(0), "[....................]   0/100");
        assert_eq!(score_bar(100), "[####################] 100/100");
        assert_eq!(score_bar(50), "[##########..........]  50/100");
        // Out-of-range scores are drawn clamped but printed as produced.
        assert_eq!(score_bar(140), "[####################] 140/100");
    }

    #[test]
    fn card_lists_critical_first() {
        let card = render_card(&sample());
        let critical = card.find("[Critical] Legal / Litigation").unwrap();
        let medium = card.find("[Medium] Market Sizing / TAM").unwrap();
        assert!(critical < medium);
        assert!(card.contains("Discrepancies (2: 1 Critical, 1 Medium)"));
        assert!(card.contains("  EBITDA does not reconcile.\n"));
        assert!(card.contains("  - Artificial EBITDA inflation"));
    }

    #[test]
    fn history_rows() {
        let out = render_history(&[sample()]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("0a1b2c3d"));
        assert!(lines[1].ends_with("buy.pdf vs sell.pdf"));
        assert_eq!(render_history(&[]), "No analyses found.\n");
    }
}
