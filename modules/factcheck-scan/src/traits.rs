// Collaborator seams for the scan scheduler.
//
// Each trait is one external service the scheduler calls through a narrow
// contract. Production implementations talk to Gemini and a search provider;
// `testing` has deterministic mocks for all four.

use anyhow::Result;
use async_trait::async_trait;

use factcheck_common::{Block, PrescreenVerdict, SearchResult, Verdict};

/// Labels every block in a batch as claim / non-claim in one round trip.
#[async_trait]
pub trait Prescreener: Send + Sync {
    async fn prescreen(&self, blocks: &[Block]) -> Result<Vec<PrescreenVerdict>>;
}

/// Cleaned claim plus the search query built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClaim {
    pub claim: String,
    pub query: String,
}

/// Turns free text into a short claim and a search query in one call.
#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExtractedClaim>;
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Classification of a claim against search evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub reason: String,
    pub sources: Vec<String>,
}

#[async_trait]
pub trait ClaimClassifier: Send + Sync {
    async fn classify(
        &self,
        claim: &str,
        results: &[SearchResult],
        page_context: &str,
    ) -> Result<Classification>;
}
