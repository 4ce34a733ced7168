//! Log of the requests exchanged with a bridge, for debugging and
//! diagnostics.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::Instant;

/// Direction of a message in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Send,
    Receive,
}

/// One body sent to or received from the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub msg_type: MessageType,
    /// Method and path below the user namespace, e.g. `PUT /lights/1/state`
    pub request: String,
    pub message: Value,
    /// Seconds since the history was created
    pub timestamp: f64,
}

/// Bounded log of request bodies and bridge responses.
///
/// Request labels never contain the username. Besides the bounded entry
/// list, the last body of every label is kept, so
/// `latest(MessageType::Send, "PUT /groups/1/action")` answers what was last
/// written to a group even after its entry was evicted.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
    latest: HashMap<(MessageType, String), Value>,
    last_error: Option<String>,
    error_count: usize,
    created: Instant,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self::with_max_entries(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        MessageHistory {
            entries: VecDeque::with_capacity(max_entries.min(Self::DEFAULT_MAX_ENTRIES)),
            max_entries,
            latest: HashMap::new(),
            last_error: None,
            error_count: 0,
            created: Instant::now(),
        }
    }

    pub fn record(&mut self, msg_type: MessageType, request: &str, message: &Value) {
        self.latest
            .insert((msg_type, request.to_string()), message.clone());

        if self.max_entries == 0 {
            return;
        }
        while self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            msg_type,
            request: request.to_string(),
            message: message.clone(),
            timestamp: self.created.elapsed().as_secs_f64(),
        });
    }

    /// Remember a failed request or a rejected write.
    pub fn record_error(&mut self, error: &str) {
        self.error_count += 1;
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn latest(&self, msg_type: MessageType, request: &str) -> Option<&Value> {
        self.latest.get(&(msg_type, request.to_string()))
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.latest.clear();
        self.last_error = None;
        self.error_count = 0;
    }

    pub fn summary(&self) -> HistorySummary {
        let mut summary = HistorySummary {
            total_entries: self.entries.len(),
            error_count: self.error_count,
            last_error: self.last_error.clone(),
            ..HistorySummary::default()
        };
        for entry in &self.entries {
            match entry.msg_type {
                MessageType::Send => summary.send_count += 1,
                MessageType::Receive => summary.receive_count += 1,
            }
        }
        summary.distinct_requests = self
            .latest
            .keys()
            .filter(|(msg_type, _)| *msg_type == MessageType::Send)
            .count();
        summary
    }
}

/// Counts over a [`MessageHistory`], as reported by
/// [`crate::Bridge::diagnostics`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySummary {
    pub send_count: usize,
    pub receive_count: usize,
    /// Labels ever sent, including evicted ones
    pub distinct_requests: usize,
    pub total_entries: usize,
    pub error_count: usize,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_exchange() {
        let mut history = MessageHistory::new();
        history.record(MessageType::Send, "PUT /lights/1/state", &json!({"on": true}));
        history.record(
            MessageType::Receive,
            "PUT /lights/1/state",
            &json!([{"success": {"/lights/1/state/on": true}}]),
        );

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.latest(MessageType::Send, "PUT /lights/1/state"),
            Some(&json!({"on": true}))
        );
        assert!(history.latest(MessageType::Send, "GET /").is_none());
        let order: Vec<MessageType> = history.entries().map(|e| e.msg_type).collect();
        assert_eq!(order, [MessageType::Send, MessageType::Receive]);
    }

    #[test]
    fn test_errors() {
        let mut history = MessageHistory::new();
        history.record_error("bridge error light is off (201)");
        history.record_error("connection refused");
        assert_eq!(history.last_error(), Some("connection refused"));
        assert_eq!(history.summary().error_count, 2);

        history.clear();
        assert!(history.last_error().is_none());
        assert_eq!(history.summary().error_count, 0);
    }

    #[test]
    fn test_bounded() {
        let mut history = MessageHistory::with_max_entries(2);
        for i in 0..5 {
            history.record(MessageType::Send, &format!("PUT /lights/{i}/state"), &json!({}));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.entries().next().unwrap().request,
            "PUT /lights/3/state"
        );
        let summary = history.summary();
        assert_eq!(summary.send_count, 2);
        assert_eq!(summary.distinct_requests, 5);
        // evicted labels keep their latest body
        assert!(history.latest(MessageType::Send, "PUT /lights/0/state").is_some());
    }

    #[test]
    fn test_disabled() {
        let mut history = MessageHistory::with_max_entries(0);
        history.record(MessageType::Send, "GET /", &Value::Null);
        assert!(history.is_empty());
    }
}
