// Test mocks for the scan scheduler.
//
// One mock per collaborator seam:
// - ScriptedLlm (TextCompletion): canned replies, in order, for the Gemini-backed collaborators
// - MockPrescreener (Prescreener): HashMap-based block id → verdict
// - MockExtractor (ClaimExtractor): HashMap-based text → (claim, query), echo by default
// - MockSearcher (WebSearcher): HashMap-based query → results, empty by default
// - MockClassifier (ClaimClassifier): HashMap-based claim → classification
//
// Every mock counts its calls so tests can assert on budget usage.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_client::TextCompletion;
use anyhow::{bail, Result};
use async_trait::async_trait;

use factcheck_common::{Block, PrescreenVerdict, SearchResult, SuspicionTier, Verdict};

use crate::extractor::shape_claim;
use crate::traits::{
    ClaimClassifier, ClaimExtractor, Classification, ExtractedClaim, Prescreener, WebSearcher,
};

// ---------------------------------------------------------------------------
// ScriptedLlm
// ---------------------------------------------------------------------------

/// Replays scripted replies in order; the last reply repeats once the script
/// runs out. An empty script fails every call.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: impl Into<String>) -> Self {
        Self::new([reply.into()])
    }

    pub fn failing() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletion for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = next {
            *last = Some(reply);
        }
        match last.as_ref() {
            Some(reply) => Ok(reply.clone()),
            None => bail!("ScriptedLlm: no reply scripted"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockPrescreener
// ---------------------------------------------------------------------------

/// Returns the registered verdicts for whichever blocks it is shown.
/// Unregistered blocks are simply absent from the reply.
pub struct MockPrescreener {
    verdicts: HashMap<String, PrescreenVerdict>,
    fail: bool,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockPrescreener {
    pub fn new() -> Self {
        Self {
            verdicts: HashMap::new(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn claim(mut self, id: &str, suspicion: &str, reason: &str) -> Self {
        self.verdicts.insert(
            id.to_string(),
            PrescreenVerdict {
                id: id.to_string(),
                is_claim: true,
                suspicion: SuspicionTier::from(suspicion),
                reason: reason.to_string(),
            },
        );
        self
    }

    pub fn not_claim(mut self, id: &str, reason: &str) -> Self {
        self.verdicts.insert(
            id.to_string(),
            PrescreenVerdict {
                id: id.to_string(),
                is_claim: false,
                suspicion: SuspicionTier::Low,
                reason: reason.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Ids of the blocks passed to the most recent call.
    pub fn seen(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen.clone()
    }
}

impl Default for MockPrescreener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prescreener for MockPrescreener {
    async fn prescreen(&self, blocks: &[Block]) -> Result<Vec<PrescreenVerdict>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock().unwrap() = blocks.iter().map(|b| b.id.clone()).collect();
        if self.fail {
            bail!("MockPrescreener: scripted failure");
        }
        Ok(blocks
            .iter()
            .filter_map(|b| self.verdicts.get(&b.id).cloned())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Registered texts map to fixed claims; anything else echoes the text back
/// as both claim and query.
pub struct MockExtractor {
    claims: HashMap<String, ExtractedClaim>,
    failing_texts: Vec<String>,
    fail_all: bool,
    calls: Arc<AtomicUsize>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            claims: HashMap::new(),
            failing_texts: Vec::new(),
            fail_all: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn on_text(mut self, text: &str, claim: &str, query: &str) -> Self {
        self.claims.insert(
            text.to_string(),
            ExtractedClaim {
                claim: claim.to_string(),
                query: query.to_string(),
            },
        );
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing_texts.push(text.to_string());
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimExtractor for MockExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedClaim> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || self.failing_texts.iter().any(|t| t == text) {
            bail!("MockExtractor: scripted failure for {text:?}");
        }
        Ok(self
            .claims
            .get(text)
            .cloned()
            .unwrap_or_else(|| shape_claim(text, text)))
    }
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

/// Returns registered results per query, empty for unknown queries.
pub struct MockSearcher {
    results: HashMap<String, Vec<SearchResult>>,
    fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn on_query(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            bail!("MockSearcher: scripted failure");
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Registered claims map to fixed classifications; anything else is
/// `uncertain`. Per-claim delays let tests force out-of-order completion.
/// Page contexts are recorded in call order.
pub struct MockClassifier {
    classifications: HashMap<String, Classification>,
    delays: HashMap<String, Duration>,
    fail: bool,
    calls: Arc<AtomicUsize>,
    contexts: Arc<Mutex<Vec<String>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            classifications: HashMap::new(),
            delays: HashMap::new(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn on_claim(mut self, claim: &str, classification: Classification) -> Self {
        self.classifications
            .insert(claim.to_string(), classification);
        self
    }

    /// Shorthand for a classification with no sources.
    pub fn verdict(self, claim: &str, verdict: Verdict, reason: &str) -> Self {
        self.on_claim(
            claim,
            Classification {
                verdict,
                reason: reason.to_string(),
                sources: Vec::new(),
            },
        )
    }

    pub fn delay_for(mut self, claim: &str, delay: Duration) -> Self {
        self.delays.insert(claim.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn contexts(&self) -> Arc<Mutex<Vec<String>>> {
        self.contexts.clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimClassifier for MockClassifier {
    async fn classify(
        &self,
        claim: &str,
        _results: &[SearchResult],
        page_context: &str,
    ) -> Result<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().unwrap().push(page_context.to_string());
        if let Some(delay) = self.delays.get(claim) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail {
            bail!("MockClassifier: scripted failure");
        }
        Ok(self
            .classifications
            .get(claim)
            .cloned()
            .unwrap_or_else(|| Classification {
                verdict: Verdict::Uncertain,
                reason: "No classification registered.".to_string(),
                sources: Vec::new(),
            }))
    }
}
