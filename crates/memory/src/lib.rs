//! # Conversation Memory
//!
//! In-process, per-session conversation history. Each session holds an
//! append-only turn list bounded to a configured maximum (oldest dropped
//! first) and expires after a TTL measured from its last write.
//!
//! ## Expiry model
//!
//! Reads of a single session check only that session's timestamp.
//! [`ConversationMemory::active_sessions`] and the explicit
//! [`ConversationMemory::sweep_expired`] maintenance call scan the whole map,
//! so a read of one session never pays for the total session count.
//!
//! ## Concurrency
//!
//! State lives behind one `RwLock`; append + truncate happen under a single
//! write-lock acquisition, so concurrent turns for the same session cannot
//! interleave mid-update.

mod types;

pub use types::{ConversationHistory, ConversationTurn, MessageType, TurnRole};

use chrono::{Duration, Utc};
use inference::ChatMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Conversation history manager. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    sessions: Arc<RwLock<HashMap<String, ConversationHistory>>>,
    max_history: usize,
    ttl: Duration,
}

impl ConversationMemory {
    /// Creates a memory keeping at most `max_history` turns per session and
    /// expiring sessions `ttl` after their last write.
    pub fn new(max_history: usize, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_history,
            ttl,
        }
    }

    /// Appends a turn, creating the session if absent, and truncates the turn
    /// list to the configured maximum by dropping the oldest entries.
    pub async fn add_turn(
        &self,
        session_id: &str,
        role: TurnRole,
        content: impl Into<String>,
        message_type: MessageType,
    ) {
        let mut sessions = self.sessions.write().await;
        let history = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationHistory::new(session_id));

        history.turns.push(ConversationTurn {
            role,
            content: content.into(),
            message_type,
            timestamp: Utc::now(),
        });
        history.updated_at = Utc::now();

        if history.turns.len() > self.max_history {
            let drop = history.turns.len() - self.max_history;
            history.turns.drain(..drop);
        }

        debug!(
            session_id,
            total_turns = history.turns.len(),
            "memory turn added"
        );
    }

    /// Returns the session's turns, or empty if absent or expired. Only this
    /// session's expiry is checked.
    pub async fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        if self.expire_if_stale(session_id).await {
            return vec![];
        }

        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|h| h.turns.clone())
            .unwrap_or_default()
    }

    /// Returns the session's turns in chat-completion message form.
    pub async fn chat_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.history(session_id)
            .await
            .into_iter()
            .map(|turn| match turn.role {
                TurnRole::User => ChatMessage::user(turn.content),
                TurnRole::Assistant => ChatMessage::assistant(turn.content),
            })
            .collect()
    }

    /// Sweeps expired sessions, then returns all live session ids.
    pub async fn active_sessions(&self) -> Vec<String> {
        self.sweep_expired().await;
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }

    /// Removes the session. Returns whether a record existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let existed = sessions.remove(session_id).is_some();
        if existed {
            info!(session_id, "memory session cleared");
        }
        existed
    }

    /// Deletes every session whose last write is older than the TTL.
    /// Returns the number of sessions evicted.
    pub async fn sweep_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, history| {
            let live = history.updated_at >= cutoff;
            if !live {
                info!(session_id = %id, "memory session expired");
            }
            live
        });
        before - sessions.len()
    }

    /// Drops `session_id` if its last write is older than the TTL. Returns
    /// whether the session was expired.
    async fn expire_if_stale(&self, session_id: &str) -> bool {
        let cutoff = Utc::now() - self.ttl;

        let stale = {
            let sessions = self.sessions.read().await;
            matches!(sessions.get(session_id), Some(h) if h.updated_at < cutoff)
        };

        if stale {
            let mut sessions = self.sessions.write().await;
            // Re-check under the write lock; a concurrent write revives it.
            if matches!(sessions.get(session_id), Some(h) if h.updated_at < cutoff) {
                sessions.remove(session_id);
                info!(session_id, "memory session expired");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(max: usize) -> ConversationMemory {
        ConversationMemory::new(max, Duration::hours(24))
    }

    #[tokio::test]
    async fn truncates_to_most_recent_turns_in_order() {
        let mem = memory(3);
        for i in 0..5 {
            mem.add_turn("s1", TurnRole::User, format!("msg {}", i), MessageType::Text)
                .await;
        }

        let turns = mem.history("s1").await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "msg 2");
        assert_eq!(turns[2].content, "msg 4");
    }

    #[tokio::test]
    async fn history_of_unknown_session_is_empty() {
        let mem = memory(10);
        assert!(mem.history("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn clear_reports_existence() {
        let mem = memory(10);
        mem.add_turn("s1", TurnRole::User, "hi", MessageType::Text)
            .await;

        assert!(mem.clear("s1").await);
        assert!(!mem.clear("s1").await);
        assert!(mem.history("s1").await.is_empty());
    }

    #[tokio::test]
    async fn expired_session_is_absent_from_reads() {
        let mem = ConversationMemory::new(10, Duration::zero());
        mem.add_turn("s1", TurnRole::User, "hi", MessageType::Text)
            .await;

        // TTL of zero: anything written in the past is already stale.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(mem.history("s1").await.is_empty());
        assert!(mem.active_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn sweep_reports_eviction_count() {
        let mem = ConversationMemory::new(10, Duration::zero());
        mem.add_turn("s1", TurnRole::User, "a", MessageType::Text)
            .await;
        mem.add_turn("s2", TurnRole::User, "b", MessageType::Voice)
            .await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_eq!(mem.sweep_expired().await, 2);
        assert_eq!(mem.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn chat_messages_map_roles() {
        let mem = memory(10);
        mem.add_turn("s1", TurnRole::User, "question", MessageType::Text)
            .await;
        mem.add_turn("s1", TurnRole::Assistant, "answer", MessageType::Text)
            .await;

        let messages = mem.chat_messages("s1").await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, inference::MessageRole::User);
        assert_eq!(messages[1].role, inference::MessageRole::Assistant);
        assert_eq!(messages[1].content, "answer");
    }
}
