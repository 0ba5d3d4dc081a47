use anyhow::Result;
use async_trait::async_trait;

/// Reply handed back when no model credentials are configured.
pub const NOT_CONFIGURED_REPLY: &str = "Gemini API not configured.";
/// Reply handed back when a configured model call fails.
pub const CALL_FAILED_REPLY: &str = "Gemini call failed.";

// =============================================================================
// TextCompletion Trait
// =============================================================================

/// A single-shot prompt → text completion.
///
/// Every collaborator that talks to a model goes through this seam, so tests
/// can substitute canned replies without a network. Production providers
/// answer with a stub reply instead of an error; the reply parsers degrade
/// from it like from any other unusable text.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Stand-in used when no model credentials are configured. Every call answers
/// with [`NOT_CONFIGURED_REPLY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfigured;

#[async_trait]
impl TextCompletion for NotConfigured {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(NOT_CONFIGURED_REPLY.to_string())
    }
}
