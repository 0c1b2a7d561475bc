//! Chat History Buffer: ordered per-room log replayed to newly joined members.

use std::collections::VecDeque;

use super::entity::ChatMessage;

/// Append-only, arrival-ordered chat log of one room.
///
/// With a capacity set, the oldest messages are dropped once it is exceeded;
/// without one the buffer grows for as long as the room exists.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: VecDeque<ChatMessage>,
    capacity: Option<usize>,
}

impl ChatHistory {
    /// Unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `capacity` messages. `None` or `Some(0)` means unbounded.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity: capacity.filter(|c| *c > 0),
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        if let Some(capacity) = self.capacity {
            while self.messages.len() > capacity {
                self.messages.pop_front();
            }
        }
    }

    /// Snapshot of the history in arrival order.
    ///
    /// Every call returns a fresh iterator over a copy, so it can be consumed
    /// while further messages are appended.
    pub fn replay(&self) -> std::vec::IntoIter<ChatMessage> {
        Vec::from(self.messages.clone()).into_iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
