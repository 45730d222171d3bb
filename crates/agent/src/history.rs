//! Conversation history
//!
//! Per-user ordered logs with bounded retention. Each log keeps at most
//! `2 × max_history` entries (one exchange is a user entry plus an assistant
//! entry); older entries are evicted from the front.
//!
//! Logs live in a `DashMap`. Every operation holds the shard lock for its key
//! for the whole mutation, so operations on one user are serialized while
//! different users proceed in parallel.

use std::collections::VecDeque;

use dashmap::DashMap;
use pragna_config::HistoryConfig;
use pragna_core::{ConversationEntry, Role};

/// In-memory conversation logs keyed by user id
#[derive(Debug)]
pub struct ConversationStore {
    logs: DashMap<String, VecDeque<ConversationEntry>>,
    max_history: usize,
}

impl ConversationStore {
    /// Store keeping `max_history` exchanges per user (at least one)
    pub fn new(max_history: usize) -> Self {
        Self {
            logs: DashMap::new(),
            max_history: max_history.max(1),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.max_history)
    }

    /// Upper bound on entries retained per user
    pub fn max_entries(&self) -> usize {
        self.max_history * 2
    }

    /// Append one entry, creating the log if needed, then evict from the front
    pub fn append(&self, user_id: &str, role: Role, content: impl Into<String>) {
        let mut log = self.logs.entry(user_id.to_string()).or_default();
        log.push_back(ConversationEntry::new(role, content));
        self.evict(&mut log);
    }

    /// Append a user entry and its assistant reply as one unit.
    ///
    /// Both entries are pushed under the same lock, so no other append for
    /// this user can land between them.
    pub fn append_exchange(
        &self,
        user_id: &str,
        user_content: impl Into<String>,
        assistant_content: impl Into<String>,
    ) {
        let mut log = self.logs.entry(user_id.to_string()).or_default();
        log.push_back(ConversationEntry::user(user_content));
        log.push_back(ConversationEntry::assistant(assistant_content));
        self.evict(&mut log);
    }

    /// Last `n` entries, oldest first. Empty when the user has no log.
    pub fn read_recent(&self, user_id: &str, n: usize) -> Vec<ConversationEntry> {
        self.logs
            .get(user_id)
            .map(|log| {
                let skip = log.len().saturating_sub(n);
                log.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Drop the user's log. Returns whether one existed.
    pub fn clear(&self, user_id: &str) -> bool {
        self.logs.remove(user_id).is_some()
    }

    /// Entries currently held for `user_id`
    pub fn len(&self, user_id: &str) -> usize {
        self.logs.get(user_id).map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, user_id: &str) -> bool {
        self.len(user_id) == 0
    }

    /// Number of users with a live log
    pub fn user_count(&self) -> usize {
        self.logs.len()
    }

    fn evict(&self, log: &mut VecDeque<ConversationEntry>) {
        let max = self.max_entries();
        while log.len() > max {
            log.pop_front();
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::from_config(&HistoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_append_and_read() {
        let store = ConversationStore::new(10);
        store.append("alice", Role::User, "hi");
        store.append("alice", Role::Assistant, "hello");

        let recent = store.read_recent("alice", 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role(), Role::User);
        assert_eq!(recent[1].content(), "hello");
    }

    #[test]
    fn test_read_recent_takes_tail() {
        let store = ConversationStore::new(10);
        for i in 0..6 {
            store.append("u", Role::User, format!("m{}", i));
        }
        let recent = store.read_recent("u", 3);
        let contents: Vec<_> = recent.iter().map(|e| e.content()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5"]);
    }

    #[test]
    fn test_read_unknown_user() {
        let store = ConversationStore::new(10);
        assert!(store.read_recent("nobody", 10).is_empty());
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_read_zero() {
        let store = ConversationStore::new(10);
        store.append("u", Role::User, "x");
        assert!(store.read_recent("u", 0).is_empty());
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let store = ConversationStore::new(2);
        for i in 0..7 {
            store.append("u", Role::User, format!("m{}", i));
        }
        assert_eq!(store.len("u"), 4);
        let contents: Vec<_> = store
            .read_recent("u", 100)
            .iter()
            .map(|e| e.content().to_string())
            .collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn test_exchange_is_evicted_like_two_appends() {
        let store = ConversationStore::new(1);
        store.append_exchange("u", "q1", "a1");
        store.append_exchange("u", "q2", "a2");
        let recent = store.read_recent("u", 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content(), "q2");
        assert_eq!(recent[0].role(), Role::User);
        assert_eq!(recent[1].content(), "a2");
        assert_eq!(recent[1].role(), Role::Assistant);
    }

    #[test]
    fn test_clear() {
        let store = ConversationStore::new(10);
        store.append_exchange("u", "q", "a");
        assert!(store.clear("u"));
        for n in [0, 1, 10, 1000] {
            assert!(store.read_recent("u", n).is_empty());
        }
        assert!(!store.clear("u"));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = ConversationStore::new(10);
        store.append("a", Role::User, "from a");
        store.append("b", Role::User, "from b");
        store.clear("a");
        assert!(store.is_empty("a"));
        assert_eq!(store.read_recent("b", 10)[0].content(), "from b");
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_zero_history_is_raised_to_one() {
        let store = ConversationStore::new(0);
        assert_eq!(store.max_entries(), 2);
    }

    #[test]
    fn test_default_retention() {
        assert_eq!(ConversationStore::default().max_entries(), 200);
    }

    #[test]
    fn test_concurrent_exchanges_stay_paired() {
        let store = Arc::new(ConversationStore::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.append_exchange("shared", format!("q{}-{}", t, i), format!("a{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let log = store.read_recent("shared", usize::MAX);
        assert_eq!(log.len(), 800);
        for pair in log.chunks(2) {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[1].role(), Role::Assistant);
            assert_eq!(&pair[0].content()[1..], &pair[1].content()[1..]);
        }
    }
}
