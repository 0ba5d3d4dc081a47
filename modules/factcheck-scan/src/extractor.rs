use std::sync::Arc;

use ai_client::{parse_json, Delimiter, TextCompletion};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::traits::{ClaimExtractor, ExtractedClaim};

pub const MAX_CLAIM_WORDS: usize = 18;
pub const MAX_QUERY_WORDS: usize = 10;

const EXTRACT_AND_QUERY_PROMPT: &str = "\
Extract the core factual claim from the text below as one short, neutral sentence (<=18 words). \
If there is no factual claim, return an empty claim and empty query. \
Then produce a concise search query (<=10 words) to find fact checks; focus on key entities and add 'fact check' if useful. \
Return JSON only:\n\
{\n  \"claim\": \"<cleaned, neutral claim, <=18 words or empty if none>\",\n  \
\"query\": \"<short search query, <=10 words, add \\\"fact check\\\" if useful>\"\n}\n\n\
Text:\n\"\"\"\n";

#[derive(Debug, Deserialize)]
struct ExtractionReply {
    #[serde(default)]
    claim: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

/// Extracts claim and query with a single combined model call.
pub struct GeminiExtractor {
    llm: Arc<dyn TextCompletion>,
}

impl GeminiExtractor {
    pub fn new(llm: Arc<dyn TextCompletion>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ClaimExtractor for GeminiExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedClaim> {
        let prompt = format!("{EXTRACT_AND_QUERY_PROMPT}{text}\n\"\"\"\n");
        let reply = self.llm.complete(&prompt).await?;

        let original = text.trim();
        let (claim, query) = match parse_json::<ExtractionReply>(&reply, Delimiter::Object) {
            Ok(parsed) => {
                let claim = parsed.claim.unwrap_or_else(|| original.to_string());
                let query = parsed.query.unwrap_or_else(|| claim.clone());
                (claim, query)
            }
            Err(failure) => {
                warn!(error = %failure, "Extraction reply unusable, using original text as claim");
                (original.to_string(), original.to_string())
            }
        };

        let extracted = shape_claim(&claim, &query);
        debug!(
            claim = extracted.claim.as_str(),
            query = extracted.query.as_str(),
            "Claim extracted"
        );
        Ok(extracted)
    }
}

/// Clamp claim and query to their word limits. An empty query falls back to
/// the claim; newlines never survive into the query.
pub fn shape_claim(claim: &str, query: &str) -> ExtractedClaim {
    let claim = squash_words(claim.trim(), MAX_CLAIM_WORDS);
    let query_source = if query.is_empty() {
        claim.as_str()
    } else {
        query
    };
    let query = squash_words(&query_source.replace('\n', " "), MAX_QUERY_WORDS);
    ExtractedClaim { claim, query }
}

/// Keep at most `max_words` whitespace-separated words, single-spaced.
pub fn squash_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
