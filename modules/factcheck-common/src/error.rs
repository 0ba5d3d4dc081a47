use thiserror::Error;

/// Why one stage of a scan gave up. The display text becomes the `reason`
/// of the affected flag.
#[derive(Error, Debug)]
pub enum FactCheckError {
    #[error("Prescreen error: {0}")]
    Prescreen(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("{stage} timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },
}
