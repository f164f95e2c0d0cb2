//! Curl multi fetcher: single-threaded event loop, one Easy2 handle per check.
//!
//! Submissions wait in a queue until a slot under `max_in_flight` is free.
//! Transient transport failures are re-queued with backoff per the retry
//! policy; everything else is reported as a completion.

mod easy;
mod handler;
mod result;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use curl::multi::{Easy2Handle, Multi};

use crate::check::{CheckId, CheckRequest};
use crate::config::RexConfig;
use crate::retry::{classify, RetryDecision, RetryPolicy};

use super::{FetchError, FetchEvent, Fetcher, TransferOptions};
use handler::ResponseHandler;

struct Active {
    handle: Easy2Handle<ResponseHandler>,
    id: CheckId,
    request: CheckRequest,
    attempt: u32,
    started: Instant,
}

struct Waiting {
    id: CheckId,
    request: CheckRequest,
    attempt: u32,
    not_before: Instant,
}

pub struct CurlFetcher {
    multi: Multi,
    active: Vec<Active>,
    waiting: VecDeque<Waiting>,
    options: TransferOptions,
    retry: RetryPolicy,
    max_in_flight: usize,
}

impl CurlFetcher {
    pub fn new(options: TransferOptions, retry: RetryPolicy, max_in_flight: usize) -> Self {
        Self {
            multi: Multi::new(),
            active: Vec::new(),
            waiting: VecDeque::new(),
            options,
            retry,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn from_config(cfg: &RexConfig) -> Self {
        let retry = cfg
            .retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default();
        Self::new(TransferOptions::from(cfg), retry, cfg.max_in_flight)
    }

    /// Move ready waiting requests into the multi handle until the slot limit.
    /// Requests that cannot be built are reported as failed events.
    fn refill(&mut self, events: &mut Vec<FetchEvent>) {
        let now = Instant::now();
        while self.active.len() < self.max_in_flight {
            let Some(pos) = self.waiting.iter().position(|w| w.not_before <= now) else {
                break;
            };
            let Some(w) = self.waiting.remove(pos) else {
                break;
            };
            let added = easy::build_easy(&w.request, &self.options)
                .and_then(|e| self.multi.add2(e).map_err(FetchError::from));
            match added {
                Ok(handle) => {
                    tracing::debug!(check = %w.id, uri = %w.request.uri, attempt = w.attempt, "transfer started");
                    self.active.push(Active {
                        handle,
                        id: w.id,
                        request: w.request,
                        attempt: w.attempt,
                        started: Instant::now(),
                    });
                }
                Err(e) => events.push(FetchEvent {
                    id: w.id,
                    outcome: Err(e),
                }),
            }
        }
    }

    /// Time until the earliest waiting retry is due, capped at `cap`.
    fn next_retry_wait(&self, cap: Duration) -> Duration {
        let now = Instant::now();
        self.waiting
            .iter()
            .map(|w| w.not_before.saturating_duration_since(now))
            .min()
            .unwrap_or(cap)
            .min(cap)
    }

    /// Handle one finished transfer: report it, or re-queue it for retry.
    /// Every finished transfer ends here exactly once: as an event or a
    /// queued retry.
    fn finish(
        &mut self,
        active: Active,
        res: Result<(), curl::Error>,
        events: &mut Vec<FetchEvent>,
    ) {
        let mut easy = match self.multi.remove2(active.handle) {
            Ok(easy) => easy,
            Err(e) => {
                tracing::warn!(check = %active.id, error = %e, "could not detach finished transfer");
                events.push(FetchEvent {
                    id: active.id,
                    outcome: Err(FetchError::from(e)),
                });
                return;
            }
        };
        match res {
            Ok(()) => {
                let response = result::response_from_easy(&mut easy, active.started);
                tracing::debug!(
                    check = %active.id,
                    status = response.status,
                    bytes = response.body_len,
                    "transfer complete"
                );
                events.push(FetchEvent {
                    id: active.id,
                    outcome: Ok(response),
                });
            }
            Err(e) => {
                let err = FetchError::Curl(e);
                match self.retry.decide(active.attempt, classify(&err)) {
                    RetryDecision::RetryAfter(delay) => {
                        tracing::debug!(
                            check = %active.id,
                            attempt = active.attempt,
                            ?delay,
                            error = %err,
                            "transfer failed, retrying"
                        );
                        self.waiting.push_back(Waiting {
                            id: active.id,
                            request: active.request,
                            attempt: active.attempt + 1,
                            not_before: Instant::now() + delay,
                        });
                    }
                    RetryDecision::NoRetry => {
                        tracing::warn!(check = %active.id, uri = %active.request.uri, error = %err, "transfer failed");
                        events.push(FetchEvent {
                            id: active.id,
                            outcome: Err(err),
                        });
                    }
                }
            }
        }
    }
}

impl Fetcher for CurlFetcher {
    fn submit(&mut self, id: CheckId, request: &CheckRequest) -> Result<(), FetchError> {
        url::Url::parse(&request.uri)
            .map_err(|e| FetchError::InvalidRequest(format!("{}: {}", request.uri, e)))?;
        self.waiting.push_back(Waiting {
            id,
            request: request.clone(),
            attempt: 1,
            not_before: Instant::now(),
        });
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Result<Vec<FetchEvent>, FetchError> {
        let mut events = Vec::new();
        self.refill(&mut events);

        if self.active.is_empty() {
            if events.is_empty() && !self.waiting.is_empty() {
                // Only backed-off retries left.
                std::thread::sleep(self.next_retry_wait(timeout));
                self.refill(&mut events);
            }
            if self.active.is_empty() {
                return Ok(events);
            }
        }

        self.multi.perform()?;

        let mut finished: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
        let active = &self.active;
        self.multi.messages(|msg| {
            for (i, a) in active.iter().enumerate() {
                if let Some(res) = msg.result_for2(&a.handle) {
                    finished.push((i, res));
                    break;
                }
            }
        });
        finished.sort_by(|a, b| b.0.cmp(&a.0));
        for (i, res) in finished {
            let done = self.active.remove(i);
            self.finish(done, res, &mut events);
        }

        self.refill(&mut events);
        if events.is_empty() && !self.active.is_empty() {
            let wait = if self.waiting.is_empty() {
                timeout
            } else {
                self.next_retry_wait(timeout)
            };
            self.multi.wait(&mut [], wait)?;
        }
        Ok(events)
    }

    fn in_flight(&self) -> usize {
        self.active.len() + self.waiting.len()
    }
}
