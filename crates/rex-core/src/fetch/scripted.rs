//! In-memory fetcher for orchestrator tests.

use std::collections::VecDeque;
use std::time::Duration;

use crate::check::{CheckId, CheckRequest};

use super::{FetchError, FetchEvent, FetchOutcome, Fetcher};

type Responder = Box<dyn FnMut(&CheckRequest) -> FetchOutcome>;

/// Answers each submission from a closure. Events are released by `poll` in
/// submission order, at most `per_poll` at a time.
pub struct ScriptedFetcher {
    responder: Responder,
    ready: VecDeque<FetchEvent>,
    per_poll: usize,
    /// Every accepted request, in submission order.
    pub submitted: Vec<(CheckId, CheckRequest)>,
}

impl ScriptedFetcher {
    pub fn new(responder: impl FnMut(&CheckRequest) -> FetchOutcome + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            ready: VecDeque::new(),
            per_poll: usize::MAX,
            submitted: Vec::new(),
        }
    }

    /// Release at most `n` events per poll.
    pub fn per_poll(mut self, n: usize) -> Self {
        self.per_poll = n.max(1);
        self
    }

    pub fn requests_for(&self, uri: &str) -> Vec<&CheckRequest> {
        self.submitted
            .iter()
            .filter(|(_, r)| r.uri == uri)
            .map(|(_, r)| r)
            .collect()
    }
}

impl Fetcher for ScriptedFetcher {
    fn submit(&mut self, id: CheckId, request: &CheckRequest) -> Result<(), FetchError> {
        if request.uri.is_empty() {
            return Err(FetchError::InvalidRequest("empty URI".to_string()));
        }
        let outcome = (self.responder)(request);
        self.submitted.push((id, request.clone()));
        self.ready.push_back(FetchEvent { id, outcome });
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration) -> Result<Vec<FetchEvent>, FetchError> {
        let n = self.per_poll.min(self.ready.len());
        Ok(self.ready.drain(..n).collect())
    }

    fn in_flight(&self) -> usize {
        self.ready.len()
    }
}
