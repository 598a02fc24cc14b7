//! Buy-side vs sell-side comparison through a generative model.

use equicheck_core::{AnalysisFindings, AnalysisResult};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, classify_failure};
use crate::model::GenerativeModel;
use crate::prompt::build_request;

/// Turns two documents into an [`AnalysisResult`].
///
/// Stateless between calls: every `analyze` issues exactly one model request,
/// with no retry and no streaming. There is no timeout at this layer; a model
/// call that never completes keeps the caller waiting.
pub struct AnalysisService<M> {
    model: M,
}

impl<M: GenerativeModel> AnalysisService<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Compare a buy-side report against a sell-side memorandum.
    ///
    /// Both documents are forwarded as opaque PDF payloads. The file names are
    /// only used to label the documents and are copied into the result.
    pub async fn analyze(
        &self,
        buy_doc: &[u8],
        sell_doc: &[u8],
        buy_name: &str,
        sell_name: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = build_request(buy_doc, sell_doc, buy_name, sell_name);

        info!(
            model = self.model.model_name(),
            buy_side = buy_name,
            sell_side = sell_name,
            buy_bytes = buy_doc.len(),
            sell_bytes = sell_doc.len(),
            "requesting document analysis"
        );

        let text = self.model.generate(&request).await.map_err(|e| {
            warn!(error = %e, "model request failed");
            classify_failure(&e)
        })?;

        let text = match text {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(AnalysisError::EmptyResponse),
        };
        debug!(response_length = text.len(), "model response received");

        let findings = parse_findings(&text)?;

        let result = AnalysisResult::assemble(
            uuid::Uuid::new_v4().to_string(),
            chrono::Utc::now().timestamp_millis(),
            buy_name,
            sell_name,
            findings,
        );

        for violation in result.contract_violations() {
            warn!(id = %result.id, %violation, "analysis breaks output contract");
        }
        info!(
            id = %result.id,
            risk_score = result.risk_score,
            agreement_score = result.agreement_score,
            discrepancies = result.discrepancies.len(),
            "analysis complete"
        );
        Ok(result)
    }
}

/// Parse the model's JSON body. No cleanup or extraction is attempted.
pub fn parse_findings(text: &str) -> Result<AnalysisFindings, AnalysisError> {
    serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(200).collect();
        warn!(error = %e, raw = %preview, "model output is not valid analysis JSON");
        AnalysisError::MalformedResponse(e)
    })
}
