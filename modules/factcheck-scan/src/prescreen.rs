use std::sync::Arc;

use ai_client::{parse_json, truncate_chars, Delimiter, TextCompletion};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use factcheck_common::{Block, PrescreenVerdict, SuspicionTier};

use crate::traits::Prescreener;

/// Block text beyond this many characters is cut before prompting.
const PRESCREEN_TEXT_LIMIT: usize = 400;

const PRESCREEN_INSTRUCTIONS: &str = "\
You have a limited budget. For each text block, decide if it contains a factual claim that might be mis/disinformation. \
For claims, assign a suspicion level: high, medium, or low. Skip non-claims. \
Respond ONLY as a JSON array of objects: \
[{\"id\": \"...\", \"is_claim\": true/false, \"suspicion\": \"high|medium|low\", \"reason\": \"...\"}]. \
Blocks:\n";

/// Prescreens a whole batch with one model call.
pub struct GeminiPrescreener {
    llm: Arc<dyn TextCompletion>,
}

impl GeminiPrescreener {
    pub fn new(llm: Arc<dyn TextCompletion>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Prescreener for GeminiPrescreener {
    async fn prescreen(&self, blocks: &[Block]) -> Result<Vec<PrescreenVerdict>> {
        let reply = self.llm.complete(&build_prescreen_prompt(blocks)).await?;

        let items: Vec<Value> = match parse_json(&reply, Delimiter::Array) {
            Ok(items) => items,
            Err(failure) => {
                warn!(error = %failure, "Prescreen reply unusable, treating every block as non-claim");
                return Ok(Vec::new());
            }
        };

        let verdicts = normalize_prescreen_items(items);
        info!(
            blocks = blocks.len(),
            labelled = verdicts.len(),
            claims = verdicts.iter().filter(|v| v.is_claim).count(),
            "Prescreen complete"
        );
        Ok(verdicts)
    }
}

pub fn build_prescreen_prompt(blocks: &[Block]) -> String {
    let mut prompt = PRESCREEN_INSTRUCTIONS.to_string();
    for block in blocks {
        let text = truncate_chars(&block.text, PRESCREEN_TEXT_LIMIT);
        prompt.push_str(&format!("- id: {}\n  text: {}\n", block.id, text));
    }
    prompt
}

/// Coerce loosely-typed model items into verdicts. Items that are not objects
/// or carry no usable `id` are dropped.
pub fn normalize_prescreen_items(items: Vec<Value>) -> Vec<PrescreenVerdict> {
    items
        .into_iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let id = match obj.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let is_claim = match obj.get("is_claim") {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
                _ => false,
            };
            let suspicion = obj
                .get("suspicion")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| SuspicionTier::from(s.to_lowercase()))
                .unwrap_or_default();
            let reason = obj
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(PrescreenVerdict {
                id,
                is_claim,
                suspicion,
                reason,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use serde_json::json;

    #[test]
    fn prompt_lists_blocks_with_trimmed_text() {
        let long = "x".repeat(450);
        let prompt = build_prescreen_prompt(&[Block::new("b1", "short"), Block::new("b2", long)]);
        assert!(prompt.starts_with("You have a limited budget."));
        assert!(prompt.contains("- id: b1\n  text: short\n"));
        assert!(prompt.contains(&format!("- id: b2\n  text: {}...\n", "x".repeat(400))));
    }

    #[test]
    fn normalizes_defaults_and_drops_bad_items() {
        let items = vec![
            json!({"id": "a", "is_claim": true, "suspicion": "HIGH", "reason": "stat"}),
            json!({"id": "b"}),
            json!({"is_claim": true}),
            json!("not an object"),
            json!({"id": 7, "is_claim": true, "suspicion": null}),
        ];
        let verdicts = normalize_prescreen_items(items);
        assert_eq!(verdicts.len(), 3);

        assert_eq!(verdicts[0].suspicion, SuspicionTier::High);
        assert_eq!(verdicts[0].reason, "stat");

        assert!(!verdicts[1].is_claim);
        assert_eq!(verdicts[1].suspicion, SuspicionTier::Low);
        assert_eq!(verdicts[1].reason, "");

        assert_eq!(verdicts[2].id, "7");
        assert_eq!(verdicts[2].suspicion, SuspicionTier::Low);
    }

    #[tokio::test]
    async fn recovers_array_wrapped_in_prose() {
        let llm = ScriptedLlm::always(
            "Here is my analysis:\n[{\"id\": \"b1\", \"is_claim\": true, \"suspicion\": \"medium\", \"reason\": \"r\"}]\nDone.",
        );
        let prescreener = GeminiPrescreener::new(Arc::new(llm));
        let verdicts = prescreener
            .prescreen(&[Block::new("b1", "t")])
            .await
            .unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].suspicion, SuspicionTier::Medium);
    }

    #[tokio::test]
    async fn long_blocks_are_trimmed_in_the_sent_prompt() {
        let llm = Arc::new(ScriptedLlm::always("[]"));
        let prescreener = GeminiPrescreener::new(llm.clone());
        let long = format!("{}{}", "a".repeat(400), "b".repeat(50));

        prescreener
            .prescreen(&[Block::new("b1", long)])
            .await
            .unwrap();

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&format!("- id: b1\n  text: {}...\n", "a".repeat(400))));
        assert!(!prompts[0].contains("bb"));
    }

    #[tokio::test]
    async fn garbage_reply_yields_empty_list() {
        let prescreener = GeminiPrescreener::new(Arc::new(ScriptedLlm::always("I cannot help.")));
        let verdicts = prescreener
            .prescreen(&[Block::new("b1", "t")])
            .await
            .unwrap();
        assert!(verdicts.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let prescreener = GeminiPrescreener::new(Arc::new(ScriptedLlm::failing()));
        assert!(prescreener
            .prescreen(&[Block::new("b1", "t")])
            .await
            .is_err());
    }
}
