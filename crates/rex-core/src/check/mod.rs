//! One examination of one URI.
//!
//! A `Check` owns its request, its lifecycle state, the links seen in its
//! body and the ids of the checks it spawned. Checks live in the
//! orchestrator's arena and refer to each other by `CheckId`; no check holds
//! a reference to another.

mod facts;
mod links;
mod note;
mod state;

use serde::Serialize;
use std::fmt;

use crate::extract::ObservedLink;
use crate::fetch::{FetchError, FetchOutcome};
use crate::probe::ProbeKind;
use crate::response::FetchedResponse;

pub use facts::{Support, SupportFacts};
pub use links::{resolve_link, should_descend, LinkRegistry, ResolveError, ANCHOR_TAG};
pub use note::{Note, NoteLevel};
pub use state::{CheckState, StateError};

/// Ordered request header pairs.
pub type HeaderList = Vec<(String, String)>;

/// Header added to a resource check's own request to negotiate gzip.
pub const NEGOTIATE_HEADER: (&str, &str) = ("Accept-Encoding", "gzip");

/// Index of a check in the orchestrator's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CheckId(usize);

impl CheckId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target description handed to the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    pub uri: String,
    pub method: String,
    pub headers: HeaderList,
    #[serde(skip)]
    pub body: Option<Vec<u8>>,
}

impl CheckRequest {
    pub fn new(uri: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: method.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(uri, "GET")
    }

    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Option<Vec<u8>>) -> Self {
        self.body = body;
        self
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What a check is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum CheckRole {
    /// A resource examined in its own right (root or link-discovered child).
    Resource,
    /// A derived request that determines one support fact of `parent`.
    Probe { parent: CheckId, kind: ProbeKind },
}

#[derive(Debug)]
pub struct Check {
    id: CheckId,
    role: CheckRole,
    /// Request actually sent (may carry negotiation headers).
    request: CheckRequest,
    /// Caller-supplied headers; inherited by link-discovered children.
    original_headers: HeaderList,
    descend: bool,
    state: CheckState,
    outcome: Option<FetchOutcome>,
    base_uri: Option<String>,
    links: LinkRegistry,
    linked: Vec<(CheckId, String)>,
    probes: Vec<(CheckId, ProbeKind)>,
    facts: SupportFacts,
    notes: Vec<Note>,
}

impl Check {
    /// A resource check. Its own request negotiates gzip on top of `headers`.
    pub(crate) fn resource(
        id: CheckId,
        uri: impl Into<String>,
        method: impl Into<String>,
        headers: HeaderList,
        body: Option<Vec<u8>>,
        descend: bool,
    ) -> Self {
        let request = CheckRequest::new(uri, method)
            .with_headers(headers.clone())
            .with_header(NEGOTIATE_HEADER.0, NEGOTIATE_HEADER.1)
            .with_body(body);
        Self::with_role(id, CheckRole::Resource, request, headers, descend)
    }

    /// A probe check; never descends.
    pub(crate) fn probe(id: CheckId, parent: CheckId, kind: ProbeKind, request: CheckRequest) -> Self {
        let headers = request.headers.clone();
        Self::with_role(id, CheckRole::Probe { parent, kind }, request, headers, false)
    }

    fn with_role(
        id: CheckId,
        role: CheckRole,
        request: CheckRequest,
        original_headers: HeaderList,
        descend: bool,
    ) -> Self {
        Self {
            id,
            role,
            request,
            original_headers,
            descend,
            state: CheckState::Pending,
            outcome: None,
            base_uri: None,
            links: LinkRegistry::new(),
            linked: Vec::new(),
            probes: Vec::new(),
            facts: SupportFacts::default(),
            notes: Vec::new(),
        }
    }

    pub fn id(&self) -> CheckId {
        self.id
    }

    pub fn role(&self) -> CheckRole {
        self.role
    }

    pub fn is_probe(&self) -> bool {
        matches!(self.role, CheckRole::Probe { .. })
    }

    pub fn request(&self) -> &CheckRequest {
        &self.request
    }

    pub fn original_headers(&self) -> &HeaderList {
        &self.original_headers
    }

    pub fn descend(&self) -> bool {
        self.descend
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn outcome(&self) -> Option<&FetchOutcome> {
        self.outcome.as_ref()
    }

    pub fn response(&self) -> Option<&FetchedResponse> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }

    /// Done and a response was received (any HTTP status).
    pub fn succeeded(&self) -> bool {
        self.is_done() && self.response().is_some()
    }

    /// Base URI of the body, taken from the first observed link.
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.link_count()
    }

    /// Child checks spawned from links, with the tag they were found under.
    pub fn linked(&self) -> &[(CheckId, String)] {
        &self.linked
    }

    pub fn probes(&self) -> &[(CheckId, ProbeKind)] {
        &self.probes
    }

    pub fn facts(&self) -> &SupportFacts {
        &self.facts
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub(crate) fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub(crate) fn facts_mut(&mut self) -> &mut SupportFacts {
        &mut self.facts
    }

    /// Record one link sighting. Returns the child request to enqueue when the
    /// sighting is novel and eligible for descent.
    ///
    /// The link is counted and stored even when it cannot be resolved.
    pub(crate) fn record_link(&mut self, link: &ObservedLink) -> Option<CheckRequest> {
        let novel = self.links.observe(&link.tag, &link.link);
        if self.base_uri.is_none() {
            self.base_uri = Some(link.base.clone());
        }
        if !should_descend(self.descend, &link.tag, !novel) {
            return None;
        }
        match resolve_link(&link.base, &link.link) {
            Ok(uri) => Some(CheckRequest::get(uri).with_headers(self.original_headers.clone())),
            Err(e) => {
                self.notes.push(Note::warn(
                    "link",
                    format!("not descending into {:?} <{}>: {}", link.link, link.tag, e),
                ));
                None
            }
        }
    }

    pub(crate) fn push_linked(&mut self, child: CheckId, tag: String) {
        self.linked.push((child, tag));
    }

    pub(crate) fn push_probe(&mut self, probe: CheckId, kind: ProbeKind) {
        self.probes.push((probe, kind));
    }

    pub(crate) fn begin_fetch(&mut self) -> Result<(), StateError> {
        self.state = self.state.transition(CheckState::Fetching)?;
        Ok(())
    }

    /// Store the outcome. Fails (leaving the first outcome in place) if the
    /// check already completed.
    pub(crate) fn complete(&mut self, outcome: FetchOutcome) -> Result<(), StateError> {
        self.state = self.state.transition(CheckState::Complete)?;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Drop the kept body bytes. Headers and `body_len` stay.
    pub(crate) fn release_body(&mut self) {
        if let Some(Ok(response)) = self.outcome.as_mut() {
            response.body = Vec::new();
        }
    }

    /// Complete → ProbesSpawned. Returns false if the transition is not
    /// allowed, which includes having already made it.
    pub(crate) fn mark_probes_spawned(&mut self) -> bool {
        match self.state.transition(CheckState::ProbesSpawned) {
            Ok(s) => {
                self.state = s;
                true
            }
            Err(_) => false,
        }
    }
}
