use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use factcheck_common::{FactCheckError, Investigation, SearchResult, Verdict};

use crate::extractor::shape_claim;
use crate::searcher::SEARCH_TIMEOUT;
use crate::traits::{ClaimClassifier, ClaimExtractor, ExtractedClaim, WebSearcher};

const LLM_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs extraction → search → classification for one piece of text.
///
/// Never fails. Any collaborator error or timeout ends the pipeline early with
/// an `uncertain` investigation whose reason names the failing stage.
#[derive(Clone)]
pub struct Investigator {
    extractor: Arc<dyn ClaimExtractor>,
    searcher: Arc<dyn WebSearcher>,
    classifier: Arc<dyn ClaimClassifier>,
    llm_timeout: Duration,
    search_timeout: Duration,
}

impl Investigator {
    pub fn new(
        extractor: Arc<dyn ClaimExtractor>,
        searcher: Arc<dyn WebSearcher>,
        classifier: Arc<dyn ClaimClassifier>,
    ) -> Self {
        Self {
            extractor,
            searcher,
            classifier,
            llm_timeout: LLM_TIMEOUT,
            search_timeout: SEARCH_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, llm_timeout: Duration, search_timeout: Duration) -> Self {
        self.llm_timeout = llm_timeout;
        self.search_timeout = search_timeout;
        self
    }

    pub async fn investigate(&self, text: &str, page_context: &str) -> Investigation {
        let extraction = bounded(
            "Claim extraction",
            self.llm_timeout,
            FactCheckError::Extraction,
            self.extractor.extract(text),
        )
        .await;
        let ExtractedClaim { claim, query } = match extraction {
            Ok(extracted) => extracted,
            Err(e) => {
                let fallback = shape_claim(text, text);
                return degraded(fallback.claim, fallback.query, Vec::new(), e);
            }
        };

        let search = bounded(
            "Search",
            self.search_timeout,
            FactCheckError::Search,
            self.searcher.search(&query),
        )
        .await;
        let results = match search {
            Ok(results) => results,
            Err(e) => return degraded(claim, query, Vec::new(), e),
        };

        let classification = match bounded(
            "Classification",
            self.llm_timeout,
            FactCheckError::Classification,
            self.classifier.classify(&claim, &results, page_context),
        )
        .await
        {
            Ok(classification) => classification,
            Err(e) => return degraded(claim, query, results, e),
        };

        info!(
            claim = claim.as_str(),
            verdict = %classification.verdict,
            sources = classification.sources.len(),
            "Claim classified"
        );

        Investigation {
            claim,
            query,
            verdict: classification.verdict,
            reason: classification.reason,
            sources: classification.sources,
            results,
        }
    }
}

/// Await a collaborator call under a deadline, tagging failures with the stage.
async fn bounded<T>(
    stage: &'static str,
    limit: Duration,
    tag: fn(String) -> FactCheckError,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, FactCheckError> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(tag(format!("{e:#}"))),
        Err(_) => Err(FactCheckError::Timeout {
            stage,
            seconds: limit.as_secs(),
        }),
    }
}

fn degraded(
    claim: String,
    query: String,
    results: Vec<SearchResult>,
    error: FactCheckError,
) -> Investigation {
    warn!(claim = claim.as_str(), error = %error, "Investigation degraded to uncertain");
    Investigation {
        claim,
        query,
        verdict: Verdict::Uncertain,
        reason: error.to_string(),
        sources: Vec::new(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GeminiClassifier;
    use crate::extractor::GeminiExtractor;
    use crate::searcher::{mock_results, FallbackSearcher};
    use crate::testing::{MockClassifier, MockExtractor, MockSearcher};
    use crate::traits::Classification;

    fn investigator(
        extractor: MockExtractor,
        searcher: MockSearcher,
        classifier: MockClassifier,
    ) -> Investigator {
        Investigator::new(
            Arc::new(extractor),
            Arc::new(searcher),
            Arc::new(classifier),
        )
    }

    #[tokio::test]
    async fn happy_path_threads_claim_query_and_results() {
        let searcher = MockSearcher::new().on_query(
            "moon cheese",
            vec![SearchResult {
                title: "Moon facts".into(),
                snippet: "Rock".into(),
                url: "https://nasa.example/moon".into(),
                domain: "nasa.example".into(),
            }],
        );
        let classifier = MockClassifier::new().on_claim(
            "The moon is cheese",
            Classification {
                verdict: Verdict::False,
                reason: "It is rock.".into(),
                sources: vec!["https://nasa.example/moon".into()],
            },
        );
        let extractor = MockExtractor::new().on_text("moon!!", "The moon is cheese", "moon cheese");

        let inv = investigator(extractor, searcher, classifier)
            .investigate("moon!!", "")
            .await;

        assert_eq!(inv.claim, "The moon is cheese");
        assert_eq!(inv.query, "moon cheese");
        assert_eq!(inv.verdict, Verdict::False);
        assert_eq!(inv.results.len(), 1);
        assert_eq!(inv.sources, vec!["https://nasa.example/moon".to_string()]);
    }

    #[tokio::test]
    async fn extraction_failure_degrades_with_original_text() {
        let inv = investigator(
            MockExtractor::failing(),
            MockSearcher::new(),
            MockClassifier::new(),
        )
        .investigate("  Some\nclaim text ", "")
        .await;
        assert_eq!(inv.verdict, Verdict::Uncertain);
        assert_eq!(inv.claim, "Some claim text");
        assert!(inv.reason.starts_with("Extraction error"));
        assert!(inv.sources.is_empty());
    }

    #[tokio::test]
    async fn search_failure_degrades_without_classifying() {
        let classifier = MockClassifier::new();
        let calls = classifier.calls();
        let inv = investigator(MockExtractor::new(), MockSearcher::failing(), classifier)
            .investigate("text", "")
            .await;
        assert_eq!(inv.verdict, Verdict::Uncertain);
        assert!(inv.reason.starts_with("Search error"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn classification_failure_keeps_results() {
        let inv = investigator(
            MockExtractor::new(),
            MockSearcher::new(),
            MockClassifier::failing(),
        )
        .investigate("text", "")
        .await;
        assert_eq!(inv.verdict, Verdict::Uncertain);
        assert!(inv.reason.starts_with("Classification error"));
        assert!(inv.sources.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_model_still_searches_and_classifies() {
        let llm: Arc<dyn ai_client::TextCompletion> = Arc::new(ai_client::NotConfigured);
        let investigator = Investigator::new(
            Arc::new(GeminiExtractor::new(llm.clone())),
            Arc::new(FallbackSearcher::new(None)),
            Arc::new(GeminiClassifier::new(llm)),
        );

        let inv = investigator
            .investigate("The moon is made of cheese", "")
            .await;

        assert_eq!(inv.claim, "The moon is made of cheese");
        assert_eq!(inv.query, "The moon is made of cheese");
        assert_eq!(inv.results, mock_results("The moon is made of cheese"));
        assert_eq!(inv.results.len(), 1);
        assert_eq!(inv.verdict, Verdict::Uncertain);
        assert_eq!(inv.reason, ai_client::NOT_CONFIGURED_REPLY);
        assert!(inv.sources.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_search_times_out() {
        let searcher = MockSearcher::new().with_delay(Duration::from_secs(60));
        let inv = investigator(MockExtractor::new(), searcher, MockClassifier::new())
            .investigate("text", "")
            .await;
        assert_eq!(inv.verdict, Verdict::Uncertain);
        assert_eq!(inv.reason, "Search timed out after 10s");
    }
}
