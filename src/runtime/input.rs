use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How a forking instance's pending input is divided with its child.
///
/// Parent and child always end up with disjoint queues; no byte can be read
/// by both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputSplit {
    /// Parent keeps the first `ceil(n/2)` bytes, child gets the rest. A single
    /// remaining byte goes to the child.
    #[default]
    Halve,
    /// Child starts with no input.
    ParentKeeps,
    /// Child takes everything; parent is left empty.
    ChildTakes,
}

/// Pending input of one instance, consumed front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputQueue {
    bytes: VecDeque<u8>,
}

impl InputQueue {
    pub fn new(bytes: impl Into<VecDeque<u8>>) -> Self {
        InputQueue {
            bytes: bytes.into(),
        }
    }

    /// Next byte, or 0 once the queue is drained.
    pub fn read(&mut self) -> u8 {
        self.bytes.pop_front().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn remaining(&self) -> Vec<u8> {
        self.bytes.iter().copied().collect()
    }

    /// Detach the child's share according to `policy`; `self` keeps the
    /// parent's share.
    pub fn split(&mut self, policy: InputSplit) -> InputQueue {
        let n = self.bytes.len();
        let parent_len = match policy {
            InputSplit::Halve if n <= 1 => 0,
            InputSplit::Halve => n.div_ceil(2),
            InputSplit::ParentKeeps => n,
            InputSplit::ChildTakes => 0,
        };
        InputQueue {
            bytes: self.bytes.split_off(parent_len),
        }
    }
}

impl From<&[u8]> for InputQueue {
    fn from(bytes: &[u8]) -> Self {
        InputQueue::new(bytes.to_vec())
    }
}

impl From<&str> for InputQueue {
    fn from(text: &str) -> Self {
        InputQueue::from(text.as_bytes())
    }
}
