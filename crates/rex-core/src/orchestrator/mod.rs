//! Drives checks to completion on one thread.
//!
//! The orchestrator owns the check arena, the task queue and the fetcher.
//! `pump` starts every queued check, polls the fetcher once and applies the
//! resulting events: links are recorded (and children enqueued) before the
//! response is marked complete, then a completed resource gets its probe
//! catalog and a completed probe writes its fact back onto its parent.

mod queue;

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::check::{Check, CheckId, CheckRequest, CheckRole, CheckState, HeaderList, Note};
use crate::control::AbortToken;
use crate::extract::{LinkExtractor, ObservedLink};
use crate::fetch::{FetchError, FetchEvent, FetchOutcome, Fetcher};
use crate::probe::{self, ProbeKind, ProbePlan};
use crate::report::CheckReport;

pub use queue::TaskQueue;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

type StatusFn = Box<dyn FnMut(&str)>;

pub struct Orchestrator<F: Fetcher> {
    checks: Vec<Check>,
    queue: TaskQueue,
    fetcher: F,
    extractor: Box<dyn LinkExtractor>,
    abort: AbortToken,
    status: Option<StatusFn>,
    poll_interval: Duration,
}

impl<F: Fetcher> Orchestrator<F> {
    pub fn new(fetcher: F, extractor: Box<dyn LinkExtractor>) -> Self {
        Self {
            checks: Vec::new(),
            queue: TaskQueue::new(),
            fetcher,
            extractor,
            abort: AbortToken::new(),
            status: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Progress messages ("fetching ...", "done ...") go to `status`.
    pub fn with_status(mut self, status: impl FnMut(&str) + 'static) -> Self {
        self.status = Some(Box::new(status));
        self
    }

    pub fn with_abort(mut self, abort: AbortToken) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn abort_token(&self) -> AbortToken {
        self.abort.clone()
    }

    /// Create and enqueue a root resource check.
    pub fn add_root(
        &mut self,
        uri: impl Into<String>,
        method: impl Into<String>,
        headers: HeaderList,
        body: Option<Vec<u8>>,
        descend: bool,
    ) -> CheckId {
        let id = self.next_id();
        self.checks
            .push(Check::resource(id, uri, method, headers, body, descend));
        self.enqueue(id);
        id
    }

    pub fn enqueue(&mut self, id: CheckId) {
        tracing::debug!(check = %id, "enqueued");
        self.queue.push(id);
    }

    pub fn check(&self, id: CheckId) -> Option<&Check> {
        self.checks.get(id.index())
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Checks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn report(&self, id: CheckId) -> Option<CheckReport> {
        CheckReport::build(&self.checks, id)
    }

    fn next_id(&self) -> CheckId {
        CheckId::new(self.checks.len())
    }

    fn status(&mut self, message: &str) {
        if let Some(cb) = self.status.as_mut() {
            cb(message);
        }
    }

    /// Hand a pending check's request to the fetcher. With the abort token
    /// set, the check is completed as aborted instead.
    pub fn start_check(&mut self, id: CheckId) {
        let Some(check) = self.checks.get_mut(id.index()) else {
            tracing::warn!(check = %id, "start for unknown check");
            return;
        };
        if self.abort.is_aborted() {
            tracing::debug!(check = %id, "not started: aborted");
            self.on_fetch_completed(id, Err(FetchError::Aborted));
            return;
        }
        if let Err(e) = check.begin_fetch() {
            tracing::warn!(check = %id, error = %e, "start ignored");
            return;
        }
        let request = check.request().clone();
        let message = format!("fetching {} {}", request.method, request.uri);
        self.status(&message);
        if let Err(e) = self.fetcher.submit(id, &request) {
            tracing::warn!(check = %id, uri = %request.uri, error = %e, "request rejected");
            self.on_fetch_completed(id, Err(e));
        }
    }

    /// Start everything queued, poll the fetcher once and apply its events.
    /// Returns false once there is nothing queued and nothing in flight.
    pub fn pump(&mut self) -> Result<bool> {
        while let Some(id) = self.queue.pop() {
            self.start_check(id);
        }
        if self.fetcher.in_flight() == 0 {
            return Ok(!self.queue.is_empty());
        }
        let events = self
            .fetcher
            .poll(self.poll_interval)
            .context("polling transfers")?;
        for event in events {
            self.handle_event(event);
        }
        Ok(!self.queue.is_empty() || self.fetcher.in_flight() > 0)
    }

    /// Pump until check `id` is complete. Other checks may still be pending.
    pub fn run_until_done(&mut self, id: CheckId) -> Result<()> {
        loop {
            match self.check(id) {
                None => bail!("unknown check {}", id),
                Some(c) if c.is_done() => return Ok(()),
                Some(_) => {}
            }
            if !self.pump()? && !self.check(id).is_some_and(Check::is_done) {
                bail!("check {} stalled with no work left", id);
            }
        }
    }

    /// Pump until nothing is queued or in flight.
    pub fn run_until_idle(&mut self) -> Result<()> {
        while self.pump()? {}
        tracing::info!(checks = self.checks.len(), "run idle");
        Ok(())
    }

    fn handle_event(&mut self, event: FetchEvent) {
        let FetchEvent { id, outcome } = event;
        let Some(check) = self.checks.get(id.index()) else {
            tracing::warn!(check = %id, "event for unknown check");
            return;
        };
        if let (Ok(response), CheckRole::Resource) = (&outcome, check.role()) {
            if !check.is_done() {
                let links = self.extractor.extract(&check.request().uri, response);
                for link in &links {
                    self.on_link_observed(id, link);
                }
            }
        }
        self.on_fetch_completed(id, outcome);
    }

    /// Record one link sighting on `id`, enqueueing a child check when the
    /// link is novel and eligible for descent. Ignored once `id` is done.
    pub fn on_link_observed(&mut self, id: CheckId, link: &ObservedLink) {
        let child_id = self.next_id();
        let Some(check) = self.checks.get_mut(id.index()) else {
            return;
        };
        if check.is_done() {
            tracing::debug!(check = %id, link = %link.link, "link after completion ignored");
            return;
        }
        let Some(request) = check.record_link(link) else {
            return;
        };
        check.push_linked(child_id, link.tag.clone());
        let CheckRequest {
            uri,
            method,
            headers,
            body,
        } = request;
        tracing::debug!(check = %id, child = %child_id, uri = %uri, tag = %link.tag, "descending");
        self.checks
            .push(Check::resource(child_id, uri, method, headers, body, false));
        self.enqueue(child_id);
    }

    /// Store the outcome of `id`. A second completion is a logged no-op.
    pub fn on_fetch_completed(&mut self, id: CheckId, outcome: FetchOutcome) {
        let Some(check) = self.checks.get_mut(id.index()) else {
            return;
        };
        if let Err(e) = check.complete(outcome) {
            tracing::warn!(check = %id, error = %e, "duplicate completion ignored");
            return;
        }
        if let Some(err) = check.error() {
            let note = Note::bad("transport", err.to_string());
            check.add_note(note);
        }
        if check.response().is_some_and(|r| r.truncated) {
            check.add_note(Note::info("body", "body truncated; links and probes see only a prefix"));
        }
        let role = check.role();
        let message = match (check.response(), check.error()) {
            (Some(r), _) => format!("done {} ({})", check.request().uri, r.status),
            (None, Some(e)) => format!("failed {} ({})", check.request().uri, e),
            (None, None) => format!("done {}", check.request().uri),
        };
        self.status(&message);

        match role {
            CheckRole::Resource => {
                self.on_response_complete(id);
                self.release_if_settled(id);
            }
            CheckRole::Probe { parent, kind } => {
                self.apply_probe(id, parent, kind);
                if let Some(probe_check) = self.checks.get_mut(id.index()) {
                    probe_check.release_body();
                }
                self.release_if_settled(parent);
            }
        }
    }

    /// Drop the body of resource `id` once every probe it spawned has been
    /// judged. Its links were read before completion.
    fn release_if_settled(&mut self, id: CheckId) {
        let Some(check) = self.checks.get(id.index()) else {
            return;
        };
        if check.state() != CheckState::ProbesSpawned {
            return;
        }
        let pending = check
            .probes()
            .iter()
            .any(|(pid, _)| !self.checks.get(pid.index()).is_some_and(Check::is_done));
        if pending {
            return;
        }
        if let Some(check) = self.checks.get_mut(id.index()) {
            check.release_body();
            tracing::trace!(check = %id, "body released");
        }
    }

    /// Plan and enqueue the probe catalog for a completed resource check.
    /// Runs at most once per check; later calls are logged no-ops.
    pub fn on_response_complete(&mut self, id: CheckId) {
        let Some(check) = self.checks.get_mut(id.index()) else {
            return;
        };
        if check.is_probe() || !check.succeeded() {
            return;
        }
        if !check.mark_probes_spawned() {
            tracing::debug!(check = %id, state = ?check.state(), "probes already spawned");
            return;
        }
        let plans = probe::spawn_all(check);
        for plan in plans {
            match plan {
                ProbePlan::Run { kind, request } => {
                    let probe_id = self.next_id();
                    self.checks
                        .push(Check::probe(probe_id, id, kind, request));
                    if let Some(base) = self.checks.get_mut(id.index()) {
                        base.push_probe(probe_id, kind);
                    }
                    tracing::debug!(check = %id, probe = %probe_id, %kind, "probe spawned");
                    self.enqueue(probe_id);
                }
                ProbePlan::Skip {
                    kind,
                    support,
                    reason,
                } => {
                    if let Some(base) = self.checks.get_mut(id.index()) {
                        kind.set_fact(base.facts_mut(), support);
                        base.add_note(Note::info(kind.name(), format!("not probed: {}", reason)));
                    }
                }
            }
        }
    }

    fn apply_probe(&mut self, id: CheckId, parent: CheckId, kind: ProbeKind) {
        let (Some(probe_check), Some(base)) =
            (self.checks.get(id.index()), self.checks.get(parent.index()))
        else {
            return;
        };
        let (Some(base_response), Some(outcome)) = (base.response(), probe_check.outcome()) else {
            return;
        };
        let mut facts = base.facts().clone();
        let note = probe::apply(kind, base_response, outcome, &mut facts);
        tracing::debug!(check = %parent, probe = %id, %kind, support = %kind.fact(&facts), "probe resolved");
        if let Some(base) = self.checks.get_mut(parent.index()) {
            *base.facts_mut() = facts;
            base.add_note(note);
        }
    }
}
