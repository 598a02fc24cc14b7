use equicheck_core::analysis_schema;

use crate::model::{GenerateRequest, JSON_MIME_TYPE, Part};

/// Sampling temperature for analysis requests. Kept near zero for repeatable
/// output.
pub const ANALYSIS_TEMPERATURE: f32 = 0.1;

// ── Prompt templates ──

pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert Senior Investment Analyst working for a Private Equity firm.
Your task is to rigorously compare a 'Buy Side' due diligence report against a 'Sell Side' information memorandum.

CORE OBJECTIVE:
Identify material discrepancies between what the Seller is promising (Sell Side) and what the internal diligence team has found (Buy Side).

REQUIRED EXTRACTION LOGIC:

1. FINANCIAL PROJECTIONS (The \"Numbers\"):
   - Extract Revenue and EBITDA claims from both documents.
   - Compare Growth Rates (CAGR) and Profit Margins.
   - CRITICAL: Identify \"Adjusted EBITDA\" add-backs or \"One-time\" gains that the Sell Side uses to inflate numbers (e.g., \"Fair Value Adjustments\").

2. MARKET SIZING (The \"Story\"):
   - Compare the Total Addressable Market (TAM) definitions.
   - Look for contradictions in market growth rates or geographic scope (e.g., \"Global\" vs \"Regional\").

3. RISK DISCLOSURES (The \"Gotchas\"):
   - Extract specific risks (Supply Chain, Legal, Regulatory) found in the Buy Side report.
   - Verify if these are disclosed, downplayed, or omitted in the Sell Side memo.
   - Example: If Buy Side mentions \"Single Source Dependency,\" does Sell Side claim \"Global Diversification\"?

OUTPUT FORMAT:
Return the analysis in strict JSON format matching the schema provided.
Classify every discrepancy with a severity level (Low, Medium, High, Critical).";

pub const COMPARE_INSTRUCTION: &str = "Compare these two documents and generate the analysis.";

fn buy_side_label(name: &str) -> String {
    format!("Document 1: Buy Side Report ({name})")
}

fn sell_side_label(name: &str) -> String {
    format!("Document 2: Sell Side Report ({name})")
}

/// Build the comparison request: persona, both documents tagged with their
/// file names, and the output schema.
pub fn build_request(
    buy_doc: &[u8],
    sell_doc: &[u8],
    buy_name: &str,
    sell_name: &str,
) -> GenerateRequest {
    GenerateRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        parts: vec![
            Part::text(buy_side_label(buy_name)),
            Part::pdf(buy_doc),
            Part::text(sell_side_label(sell_name)),
            Part::pdf(sell_doc),
            Part::text(COMPARE_INSTRUCTION),
        ],
        response_mime_type: JSON_MIME_TYPE.to_string(),
        response_schema: analysis_schema(),
        temperature: ANALYSIS_TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PDF_MIME_TYPE;

    #[test]
    fn parts_in_document_order() {
        let req = build_request(b"%PDF-buy", b"%PDF-sell", "dd.pdf", "cim.pdf");
        assert_eq!(req.parts.len(), 5);
        assert_eq!(req.parts[0], Part::Text("Document 1: Buy Side Report (dd.pdf)".into()));
        assert_eq!(
            req.parts[1],
            Part::InlineData {
                mime_type: PDF_MIME_TYPE.into(),
                data: b"%PDF-buy".to_vec()
            }
        );
        assert_eq!(req.parts[2], Part::Text("Document 2: Sell Side Report (cim.pdf)".into()));
        assert_eq!(req.parts[3], Part::pdf(b"%PDF-sell"));
        assert_eq!(req.parts[4], Part::text(COMPARE_INSTRUCTION));
    }

    #[test]
    fn deterministic_json_output() {
        let req = build_request(b"a", b"b", "a.pdf", "b.pdf");
        assert_eq!(req.response_mime_type, "application/json");
        assert!(req.temperature <= 0.1);
        assert_eq!(req.response_schema, analysis_schema());
    }

    #[test]
    fn persona_covers_extraction_logic() {
        for section in ["FINANCIAL PROJECTIONS", "MARKET SIZING", "RISK DISCLOSURES"] {
            assert!(SYSTEM_INSTRUCTION.contains(section), "missing {section}");
        }
        assert!(SYSTEM_INSTRUCTION.contains("(Low, Medium, High, Critical)"));
    }
}
