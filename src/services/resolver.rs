use std::env;
use std::sync::Arc;

use tracing::{info, warn};

use crate::services::backend::{UploadBackend, UploadVerdict};
use crate::services::pending::{ChatKey, ConversationState, ConversationStore};
use crate::services::staging;

/// The closed set of recognized duplicate decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Overwrite,
    Skip,
    Cancel,
}

/// Locale-configurable literals mapped onto [`Decision`]. The same labels
/// are shown on the reply keyboard, so recognized input and display text
/// stay in sync by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTokens {
    pub overwrite: String,
    pub skip: String,
    pub cancel: String,
}

impl Default for DecisionTokens {
    fn default() -> Self {
        Self {
            overwrite: "si".to_string(),
            skip: "pasar".to_string(),
            cancel: "cancelar".to_string(),
        }
    }
}

impl DecisionTokens {
    /// Load token overrides from the environment, falling back to the
    /// default locale literals.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            overwrite: env::var("OVERWRITE_TOKEN").unwrap_or(default.overwrite),
            skip: env::var("SKIP_TOKEN").unwrap_or(default.skip),
            cancel: env::var("CANCEL_TOKEN").unwrap_or(default.cancel),
        }
    }

    /// Classify free text as a decision. Surrounding whitespace is ignored
    /// and matching is case-insensitive, but otherwise exact.
    pub fn classify(&self, text: &str) -> Option<Decision> {
        let normalized = text.trim().to_lowercase();
        if normalized == self.overwrite.to_lowercase() {
            Some(Decision::Overwrite)
        } else if normalized == self.skip.to_lowercase() {
            Some(Decision::Skip)
        } else if normalized == self.cancel.to_lowercase() {
            Some(Decision::Cancel)
        } else {
            None
        }
    }

    /// Keyboard labels, in prompt order.
    pub fn labels(&self) -> [&str; 3] {
        [&self.overwrite, &self.skip, &self.cancel]
    }
}

/// Outcome of consuming one decision message.
#[derive(Debug, PartialEq, Eq)]
pub struct Resolution {
    pub reply: String,
    pub state: ConversationState,
}

impl Resolution {
    fn idle(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            state: ConversationState::Idle,
        }
    }
}

/// Per-chat duplicate-resolution state machine.
///
/// Only meaningful while a chat is AwaitingDecision; the three recognized
/// tokens are terminal (the staged file is removed unconditionally, even
/// when the overwrite re-upload itself fails), anything else re-prompts and
/// keeps the pending entry alive.
pub struct DuplicateResolver {
    backend: Arc<dyn UploadBackend>,
    conversations: ConversationStore,
    tokens: DecisionTokens,
}

impl DuplicateResolver {
    pub fn new(
        backend: Arc<dyn UploadBackend>,
        conversations: ConversationStore,
        tokens: DecisionTokens,
    ) -> Self {
        Self {
            backend,
            conversations,
            tokens,
        }
    }

    pub fn tokens(&self) -> &DecisionTokens {
        &self.tokens
    }

    /// Consume a free-text decision for `chat`.
    pub async fn resolve(&self, chat: ChatKey, text: &str) -> Resolution {
        let Some(pending) = self.conversations.take_pending(chat) else {
            return Resolution::idle("No files pending.");
        };

        match self.tokens.classify(text) {
            Some(Decision::Overwrite) => {
                let reply = match self
                    .backend
                    .upload(&pending.staged_path, &pending.file_name, true)
                    .await
                {
                    Ok(UploadVerdict::Rejected { status, body }) => {
                        format!("❌ Overwrite failed ({status}): {body}")
                    }
                    Ok(_) => {
                        info!(chat, file = %pending.file_name, "file overwritten");
                        "✅ File overwritten.".to_string()
                    }
                    Err(err) => {
                        warn!(chat, "overwrite upload failed: {err}");
                        format!("❌ Error during the operation: {err}")
                    }
                };
                staging::discard_staged(&pending.staged_path);
                Resolution::idle(reply)
            }
            Some(Decision::Skip) => {
                staging::discard_staged(&pending.staged_path);
                Resolution::idle("File skipped.")
            }
            Some(Decision::Cancel) => {
                staging::discard_staged(&pending.staged_path);
                Resolution::idle("Operation cancelled.")
            }
            None => {
                // Re-prompt; the staged file survives until a real decision.
                self.conversations.reinstate(pending);
                Resolution {
                    reply: format!(
                        "Invalid reply, try again with: {}, {} or {}.",
                        self.tokens.overwrite, self.tokens.skip, self.tokens.cancel
                    ),
                    state: ConversationState::AwaitingDecision,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_trims_and_ignores_case() {
        let tokens = DecisionTokens::default();
        assert_eq!(tokens.classify("si"), Some(Decision::Overwrite));
        assert_eq!(tokens.classify("  SI  "), Some(Decision::Overwrite));
        assert_eq!(tokens.classify("Pasar"), Some(Decision::Skip));
        assert_eq!(tokens.classify("\tcancelar\n"), Some(Decision::Cancel));
    }

    #[test]
    fn classify_requires_exact_match() {
        let tokens = DecisionTokens::default();
        assert_eq!(tokens.classify("maybe"), None);
        assert_eq!(tokens.classify("si por favor"), None);
        assert_eq!(tokens.classify(""), None);
    }

    #[test]
    fn classify_honors_custom_labels() {
        let tokens = DecisionTokens {
            overwrite: "yes".to_string(),
            skip: "skip".to_string(),
            cancel: "cancel".to_string(),
        };
        assert_eq!(tokens.classify("YES"), Some(Decision::Overwrite));
        assert_eq!(tokens.classify("si"), None);
    }

    #[test]
    fn labels_follow_prompt_order() {
        let tokens = DecisionTokens::default();
        assert_eq!(tokens.labels(), ["si", "pasar", "cancelar"]);
    }
}
