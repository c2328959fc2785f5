use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::services::backend::{UploadBackend, UploadVerdict};
use crate::services::pending::{ChatKey, ConversationState, ConversationStore, PendingUpload};
use crate::services::staging;

/// What the front-end should do after an upload attempt.
#[derive(Debug, PartialEq, Eq)]
pub struct RelayOutcome {
    pub reply: String,
    /// Present the overwrite / skip / cancel keyboard alongside the reply.
    pub prompt_decision: bool,
    pub state: ConversationState,
}

impl RelayOutcome {
    fn idle(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompt_decision: false,
            state: ConversationState::Idle,
        }
    }
}

/// Upload orchestrator: sends a staged file to the backend and interprets
/// the verdict. Terminal verdicts remove the staged copy; a duplicate parks
/// it in the conversation store for resolution.
pub struct UploadRelay {
    backend: Arc<dyn UploadBackend>,
    conversations: ConversationStore,
}

impl UploadRelay {
    pub fn new(backend: Arc<dyn UploadBackend>, conversations: ConversationStore) -> Self {
        Self {
            backend,
            conversations,
        }
    }

    pub async fn process(
        &self,
        chat: ChatKey,
        staged_path: PathBuf,
        file_name: &str,
    ) -> RelayOutcome {
        match self.backend.upload(&staged_path, file_name, false).await {
            Ok(UploadVerdict::Processed) => {
                info!(chat, file = %file_name, "file processed");
                staging::discard_staged(&staged_path);
                RelayOutcome::idle("✅ File processed successfully.")
            }
            Ok(UploadVerdict::Duplicate { file_key }) => {
                let displaced = self.conversations.begin_awaiting(PendingUpload {
                    chat,
                    staged_path,
                    file_name: file_name.to_string(),
                });
                if let Some(previous) = displaced {
                    // Last duplicate wins; drop the copy the user never resolved.
                    staging::discard_staged(&previous.staged_path);
                }
                RelayOutcome {
                    reply: format!(
                        "⚠️ The file already exists:\n{file_key}\n\nWhat do you want to do?"
                    ),
                    prompt_decision: true,
                    state: ConversationState::AwaitingDecision,
                }
            }
            Ok(UploadVerdict::Unexpected(payload)) => {
                warn!(chat, %payload, "unexpected backend payload");
                staging::discard_staged(&staged_path);
                RelayOutcome::idle("⚠️ Unexpected response from the backend.")
            }
            Ok(UploadVerdict::Rejected { status, body }) => {
                staging::discard_staged(&staged_path);
                RelayOutcome::idle(format!("❌ Backend error ({status}): {body}"))
            }
            Err(err) => {
                warn!(chat, "upload failed: {err}");
                staging::discard_staged(&staged_path);
                RelayOutcome::idle(format!("❌ Failed to process the file: {err}"))
            }
        }
    }
}
