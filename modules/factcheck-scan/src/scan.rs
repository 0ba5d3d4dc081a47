use std::sync::Arc;

use ai_client::truncate_chars;
use futures::stream::{self, StreamExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use factcheck_common::config::MAX_BLOCKS_PER_SCAN;
use factcheck_common::{Block, FactCheckError, Flag, ScanBudget, ScanReport, ScanRequest};

use crate::budget::{allocate, settle};
use crate::investigator::Investigator;
use crate::ranker::rank_candidates;
use crate::traits::Prescreener;

const CONTEXT_SNIPPETS: usize = 3;
const CONTEXT_SNIPPET_CHARS: usize = 160;

/// Request-scoped scheduler: prescreen, rank, allocate, investigate, merge.
///
/// Holds only immutable collaborators and configuration; every call to
/// [`ScanOrchestrator::run`] is independent.
#[derive(Clone)]
pub struct ScanOrchestrator {
    prescreener: Arc<dyn Prescreener>,
    investigator: Investigator,
    budget: ScanBudget,
    concurrency: usize,
}

impl ScanOrchestrator {
    pub fn new(
        prescreener: Arc<dyn Prescreener>,
        investigator: Investigator,
        budget: ScanBudget,
    ) -> Self {
        Self {
            prescreener,
            investigator,
            budget,
            concurrency: 1,
        }
    }

    /// Run up to `concurrency` investigations at once. Output order is
    /// unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn budget(&self) -> &ScanBudget {
        &self.budget
    }

    pub async fn run(&self, request: ScanRequest) -> ScanReport {
        let span = info_span!("scan", scan_id = %Uuid::new_v4());
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: ScanRequest) -> ScanReport {
        let ScanRequest {
            url,
            title,
            mut blocks,
        } = request;
        if blocks.len() > MAX_BLOCKS_PER_SCAN {
            info!(
                submitted = blocks.len(),
                kept = MAX_BLOCKS_PER_SCAN,
                "Dropping blocks beyond per-scan limit"
            );
            blocks.truncate(MAX_BLOCKS_PER_SCAN);
        }

        let verdicts = match self.prescreener.prescreen(&blocks).await {
            Ok(verdicts) => verdicts,
            Err(e) => {
                let error = FactCheckError::Prescreen(format!("{e:#}"));
                warn!(%error, "Prescreen failed, treating every block as non-claim");
                Vec::new()
            }
        };

        let ranked = rank_candidates(&blocks, &verdicts);
        let allocation = allocate(&self.budget);
        info!(
            blocks = blocks.len(),
            skipped = ranked.skipped.len(),
            candidates = ranked.candidates.len(),
            remaining_calls = allocation.remaining,
            max_investigations = allocation.max_investigations,
            min_investigations = allocation.min_investigations,
            target_count = allocation.target_count,
            "Scan planned"
        );

        let mut to_investigate = ranked.candidates;
        let split = (allocation.target_count as usize).min(to_investigate.len());
        let deferred = to_investigate.split_off(split);

        let page_context = build_page_context(url.as_deref(), title.as_deref(), &blocks);

        // `buffered` yields in input order regardless of completion order.
        let investigations: Vec<_> = to_investigate
            .iter()
            .map(|candidate| {
                let page_context = page_context.as_str();
                async move {
                    let investigation = self
                        .investigator
                        .investigate(&candidate.block.text, page_context)
                        .await;
                    info!(
                        block_id = candidate.block.id.as_str(),
                        suspicion = %candidate.suspicion,
                        verdict = %investigation.verdict,
                        "Candidate investigated"
                    );
                    Flag::investigated(&candidate.block.id, investigation)
                }
            })
            .collect();
        let investigated: Vec<Flag> = stream::iter(investigations)
            .buffered(self.concurrency)
            .collect()
            .await;

        for candidate in &deferred {
            info!(
                block_id = candidate.block.id.as_str(),
                suspicion = %candidate.suspicion,
                "Candidate deferred, budget exhausted"
            );
        }

        let budget = settle(&self.budget, to_investigate.len(), deferred.len());

        let mut flags = ranked.skipped;
        flags.extend(investigated);
        flags.extend(deferred.iter().map(Flag::deferred));

        ScanReport {
            count: flags.len(),
            flags,
            budget,
        }
    }
}

/// Short page description handed to the classifier: url, title and the first
/// few block snippets.
pub fn build_page_context(url: Option<&str>, title: Option<&str>, blocks: &[Block]) -> String {
    let snippets: Vec<String> = blocks
        .iter()
        .take(CONTEXT_SNIPPETS)
        .map(|b| truncate_chars(&b.text.trim().replace('\n', " "), CONTEXT_SNIPPET_CHARS))
        .collect();
    format!(
        "URL: {}\nTitle: {}\nSnippets:\n{}",
        url.unwrap_or_default(),
        title.unwrap_or_default(),
        snippets.join("\n")
    )
}
