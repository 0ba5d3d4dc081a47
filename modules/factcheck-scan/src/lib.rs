pub mod budget;
pub mod classifier;
pub mod extractor;
pub mod investigator;
pub mod prescreen;
pub mod ranker;
pub mod scan;
pub mod searcher;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use budget::{allocate, Allocation};
pub use investigator::Investigator;
pub use ranker::{rank_candidates, RankedBlocks};
pub use scan::{build_page_context, ScanOrchestrator};
pub use traits::{
    ClaimClassifier, ClaimExtractor, Classification, ExtractedClaim, Prescreener, WebSearcher,
};
