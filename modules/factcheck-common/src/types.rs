use serde::{Deserialize, Serialize};

// --- Input ---

/// One text fragment submitted for claim screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub text: String,
}

impl Block {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigateRequest {
    pub text: String,
}

// --- Prescreen ---

/// Coarse priority label from the prescreen pass. Labels outside the known
/// set are kept verbatim and rank below `Low`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SuspicionTier {
    High,
    Medium,
    Low,
    Other(String),
}

impl SuspicionTier {
    /// Priority rank, lower investigates first.
    pub fn rank(&self) -> u8 {
        match self {
            SuspicionTier::High => 0,
            SuspicionTier::Medium => 1,
            SuspicionTier::Low => 2,
            SuspicionTier::Other(_) => 3,
        }
    }
}

impl Default for SuspicionTier {
    fn default() -> Self {
        SuspicionTier::Low
    }
}

impl From<String> for SuspicionTier {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "high" => SuspicionTier::High,
            "medium" => SuspicionTier::Medium,
            "low" => SuspicionTier::Low,
            _ => SuspicionTier::Other(raw),
        }
    }
}

impl From<&str> for SuspicionTier {
    fn from(raw: &str) -> Self {
        SuspicionTier::from(raw.to_string())
    }
}

impl From<SuspicionTier> for String {
    fn from(tier: SuspicionTier) -> Self {
        tier.to_string()
    }
}

impl std::fmt::Display for SuspicionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspicionTier::High => write!(f, "high"),
            SuspicionTier::Medium => write!(f, "medium"),
            SuspicionTier::Low => write!(f, "low"),
            SuspicionTier::Other(raw) => write!(f, "{raw}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescreenVerdict {
    pub id: String,
    pub is_claim: bool,
    pub suspicion: SuspicionTier,
    pub reason: String,
}

/// A claim-like block waiting for a slot in the investigation budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub block: Block,
    pub suspicion: SuspicionTier,
    pub pre_reason: String,
}

// --- Outcomes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    False,
    Uncertain,
    Dangerous,
    /// Prescreen found no claim.
    Skip,
    /// Claim-like, but the budget ran out first.
    NotChecked,
}

impl Verdict {
    pub fn severity(self) -> Severity {
        match self {
            Verdict::False | Verdict::Dangerous => Severity::Red,
            Verdict::Uncertain => Severity::Amber,
            Verdict::True => Severity::Green,
            Verdict::Skip => Severity::Neutral,
            Verdict::NotChecked => Severity::Blue,
        }
    }

    /// Parse a verdict label produced by the classifier. Scheduler-only
    /// outcomes (`skip`, `not_checked`) are rejected.
    pub fn from_classifier_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Verdict::True),
            "false" => Some(Verdict::False),
            "uncertain" => Some(Verdict::Uncertain),
            "dangerous" => Some(Verdict::Dangerous),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::True => write!(f, "true"),
            Verdict::False => write!(f, "false"),
            Verdict::Uncertain => write!(f, "uncertain"),
            Verdict::Dangerous => write!(f, "dangerous"),
            Verdict::Skip => write!(f, "skip"),
            Verdict::NotChecked => write!(f, "not_checked"),
        }
    }
}

/// Traffic-light projection of [`Verdict`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Green,
    Amber,
    Red,
    #[serde(rename = "none")]
    Neutral,
    Blue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub domain: String,
}

/// Output of one full extraction → search → classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Investigation {
    pub claim: String,
    pub query: String,
    pub verdict: Verdict,
    pub reason: String,
    pub sources: Vec<String>,
    pub results: Vec<SearchResult>,
}

/// The per-block result unit returned to callers. Severity is always derived
/// from the verdict by the constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub id: String,
    pub verdict: Verdict,
    pub reason: String,
    pub claim: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub severity: Severity,
    pub sources: Vec<String>,
}

impl Flag {
    pub fn skipped(block: &Block, pre_reason: &str) -> Self {
        let reason = if pre_reason.is_empty() {
            "No clear claim detected.".to_string()
        } else {
            pre_reason.to_string()
        };
        Self {
            id: block.id.clone(),
            verdict: Verdict::Skip,
            reason,
            claim: block.text.trim().to_string(),
            query: None,
            severity: Verdict::Skip.severity(),
            sources: Vec::new(),
        }
    }

    pub fn deferred(candidate: &Candidate) -> Self {
        let reason = format!(
            "Not checked (budget limit). Suspicion: {}. {}",
            candidate.suspicion, candidate.pre_reason
        );
        Self {
            id: candidate.block.id.clone(),
            verdict: Verdict::NotChecked,
            reason: reason.trim().to_string(),
            claim: candidate.block.text.trim().to_string(),
            query: None,
            severity: Verdict::NotChecked.severity(),
            sources: Vec::new(),
        }
    }

    pub fn investigated(block_id: &str, investigation: Investigation) -> Self {
        Self {
            id: block_id.to_string(),
            verdict: investigation.verdict,
            reason: investigation.reason,
            claim: investigation.claim,
            query: Some(investigation.query),
            severity: investigation.verdict.severity(),
            sources: investigation.sources,
        }
    }
}

// --- Responses ---

/// Request-scoped call accounting. Never shared across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetState {
    pub total_calls: u32,
    #[serde(skip)]
    pub cost_per_investigation: u32,
    pub used_calls: u32,
    #[serde(rename = "investigated")]
    pub investigated_count: u32,
    #[serde(rename = "skipped_due_to_budget")]
    pub deferred_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub flags: Vec<Flag>,
    pub count: usize,
    pub budget: BudgetState,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestigationReport {
    pub claim: String,
    pub verdict: Verdict,
    pub reason: String,
    pub sources: Vec<String>,
    pub results: Vec<SearchResult>,
    pub query: String,
    pub original_text: String,
}

impl InvestigationReport {
    pub fn new(original_text: String, investigation: Investigation) -> Self {
        Self {
            claim: investigation.claim,
            verdict: investigation.verdict,
            reason: investigation.reason,
            sources: investigation.sources,
            results: investigation.results,
            query: investigation.query,
            original_text,
        }
    }
}
