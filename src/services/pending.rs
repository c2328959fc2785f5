use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

/// Chat identifier as Telegram reports it.
pub type ChatKey = i64;

/// The record of a duplicate awaiting user resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub chat: ChatKey,
    pub staged_path: PathBuf,
    pub file_name: String,
}

/// Where a conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingDecision,
}

#[derive(Debug, Clone)]
struct Conversation {
    state: ConversationState,
    pending: Option<PendingUpload>,
}

/// Injectable per-chat store of `{state, pending upload}`.
///
/// An entry exists only while its chat is awaiting a duplicate decision;
/// every other chat is Idle. At most one pending upload per chat: parking a
/// new one displaces the old (last one wins), and the displaced entry is
/// handed back to the caller so its staged file can be removed.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<DashMap<ChatKey, Conversation>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, chat: ChatKey) -> ConversationState {
        self.inner.get(&chat).map(|c| c.state).unwrap_or_default()
    }

    /// Park a duplicate for resolution, moving the chat to AwaitingDecision.
    /// Returns the displaced pending upload when the chat already had one.
    pub fn begin_awaiting(&self, pending: PendingUpload) -> Option<PendingUpload> {
        self.inner
            .insert(
                pending.chat,
                Conversation {
                    state: ConversationState::AwaitingDecision,
                    pending: Some(pending),
                },
            )
            .and_then(|previous| previous.pending)
    }

    /// Consume the chat's pending upload. The chat returns to Idle whether
    /// or not anything was pending.
    pub fn take_pending(&self, chat: ChatKey) -> Option<PendingUpload> {
        self.inner.remove(&chat).and_then(|(_, c)| c.pending)
    }

    /// Put a pending upload back after an unrecognized decision.
    pub fn reinstate(&self, pending: PendingUpload) {
        self.begin_awaiting(pending);
    }
}
