use std::sync::Arc;

use ai_client::{parse_json, Delimiter, TextCompletion};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use factcheck_common::{SearchResult, Verdict};

use crate::traits::{ClaimClassifier, Classification};

const UNPARSED_REASON: &str = "Gemini response could not be parsed.";

#[derive(Debug, Default, Deserialize)]
struct ClassificationReply {
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    sources: Option<Vec<Value>>,
}

/// Classifies a claim against search results and page context.
pub struct GeminiClassifier {
    llm: Arc<dyn TextCompletion>,
}

impl GeminiClassifier {
    pub fn new(llm: Arc<dyn TextCompletion>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ClaimClassifier for GeminiClassifier {
    async fn classify(
        &self,
        claim: &str,
        results: &[SearchResult],
        page_context: &str,
    ) -> Result<Classification> {
        let prompt = build_classification_prompt(claim, results, page_context);
        let reply = self.llm.complete(&prompt).await?;
        Ok(interpret_reply(&reply))
    }
}

pub fn build_classification_prompt(
    claim: &str,
    results: &[SearchResult],
    page_context: &str,
) -> String {
    let context = if page_context.trim().is_empty() {
        String::new()
    } else {
        format!("The claim appeared on this page:\n{page_context}\n\n")
    };
    format!(
        "Here is a factual claim:\n\n\"{claim}\"\n\n\
         {context}\
         Here are the top search results:\n{results}\n\n\
         Based only on these results, classify the claim as TRUE, FALSE, UNCERTAIN, or DANGEROUS.\n\
         Rules:\n\
         - If several reputable sources confirm it → TRUE\n\
         - If multiple fact-checks or reputable outlets say it is false → FALSE\n\
         - If evidence is mixed or unclear → UNCERTAIN\n\
         - If acting on the claim could cause real-world harm → DANGEROUS\n\n\
         Respond ONLY in this JSON format:\n\n\
         {{\n  \"verdict\": \"true | false | uncertain | dangerous\",\n  \
         \"reason\": \"short explanation summarising the evidence\",\n  \
         \"sources\": [\"url1\", \"url2\", \"url3\"]\n}}\n",
        results = format_results(results),
    )
}

fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "- Title: {}\n  Snippet: {}\n  Domain: {}\n  URL: {}",
                r.title, r.snippet, r.domain, r.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce a model reply to a classification. Never fails: an unusable reply
/// becomes `uncertain` with the raw reply (or a fixed note) as the reason.
pub fn interpret_reply(reply: &str) -> Classification {
    let parsed = match parse_json::<ClassificationReply>(reply, Delimiter::Object) {
        Ok(parsed) => parsed,
        Err(failure) => {
            warn!(error = %failure, "Classification reply unusable, defaulting to uncertain");
            ClassificationReply::default()
        }
    };

    let verdict = parsed
        .verdict
        .as_deref()
        .and_then(Verdict::from_classifier_label)
        .unwrap_or(Verdict::Uncertain);

    let reason = parsed
        .reason
        .filter(|r| !r.trim().is_empty())
        .or_else(|| Some(reply.trim().to_string()).filter(|r| !r.is_empty()))
        .unwrap_or_else(|| UNPARSED_REASON.to_string());

    let sources = parsed
        .sources
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| match s {
            Value::String(url) => Some(url),
            _ => None,
        })
        .collect();

    Classification {
        verdict,
        reason,
        sources,
    }
}
