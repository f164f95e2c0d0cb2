use std::collections::VecDeque;

use crate::check::CheckId;

/// FIFO of checks waiting to be started.
#[derive(Debug, Default)]
pub struct TaskQueue {
    ids: VecDeque<CheckId>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: CheckId) {
        self.ids.push_back(id);
    }

    pub fn pop(&mut self) -> Option<CheckId> {
        self.ids.pop_front()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
