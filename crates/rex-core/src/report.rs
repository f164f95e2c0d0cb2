//! Aggregated, serializable view of a check and everything it spawned.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::check::{Check, CheckId, CheckState, Note, Support, SupportFacts};
use crate::probe::ProbeKind;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub id: CheckId,
    pub kind: ProbeKind,
    pub state: CheckState,
    pub status: Option<u32>,
    pub error: Option<String>,
    pub support: Support,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildReport {
    pub tag: String,
    #[serde(flatten)]
    pub check: CheckReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub id: CheckId,
    pub uri: String,
    pub method: String,
    pub state: CheckState,
    pub status: Option<u32>,
    pub reason: Option<String>,
    pub error: Option<String>,
    pub body_len: Option<u64>,
    pub wire_len: Option<u64>,
    pub elapsed_ms: Option<u64>,
    pub base_uri: Option<String>,
    pub facts: SupportFacts,
    pub link_count: usize,
    pub links: BTreeMap<String, BTreeSet<String>>,
    pub notes: Vec<Note>,
    pub probes: Vec<ProbeReport>,
    pub children: Vec<ChildReport>,
}

impl CheckReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Snapshot check `id` from the arena. `None` if the id is unknown.
    pub fn build(checks: &[Check], id: CheckId) -> Option<Self> {
        let check = checks.get(id.index())?;
        let response = check.response();

        let probes = check
            .probes()
            .iter()
            .filter_map(|&(pid, kind)| {
                let p = checks.get(pid.index())?;
                Some(ProbeReport {
                    id: pid,
                    kind,
                    state: p.state(),
                    status: p.response().map(|r| r.status),
                    error: p.error().map(|e| e.to_string()),
                    support: kind.fact(check.facts()),
                })
            })
            .collect();

        let children = check
            .linked()
            .iter()
            .filter_map(|(cid, tag)| {
                Some(ChildReport {
                    tag: tag.clone(),
                    check: Self::build(checks, *cid)?,
                })
            })
            .collect();

        Some(Self {
            id,
            uri: check.request().uri.clone(),
            method: check.request().method.clone(),
            state: check.state(),
            status: response.map(|r| r.status),
            reason: response.map(|r| r.reason.clone()),
            error: check.error().map(|e| e.to_string()),
            body_len: response.map(|r| r.body_len),
            wire_len: response.map(|r| r.wire_len),
            elapsed_ms: response.map(|r| r.elapsed_ms),
            base_uri: check.base_uri().map(str::to_string),
            facts: check.facts().clone(),
            link_count: check.link_count(),
            links: check.links().as_map().clone(),
            notes: check.notes().to_vec(),
            probes,
            children,
        })
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        write!(f, "{}{} {}", pad, self.method, self.uri)?;
        match (self.status, &self.error) {
            (Some(status), _) => writeln!(
                f,
                " -> {} {}",
                status,
                self.reason.as_deref().unwrap_or("")
            )?,
            (None, Some(e)) => writeln!(f, " -> failed: {}", e)?,
            (None, None) => writeln!(f, " -> {:?}", self.state)?,
        }
        if let (Some(body), Some(wire)) = (self.body_len, self.wire_len) {
            writeln!(f, "{}  body: {} bytes ({} on the wire)", pad, body, wire)?;
        }
        if !self.probes.is_empty() || self.facts != SupportFacts::default() {
            writeln!(
                f,
                "{}  partial: {}  inm: {}  ims: {}  gzip: {} ({}% saved)",
                pad,
                self.facts.partial,
                self.facts.inm,
                self.facts.ims,
                self.facts.gzip,
                self.facts.gzip_savings
            )?;
        }
        if self.link_count > 0 {
            let per_tag: Vec<String> = self
                .links
                .iter()
                .map(|(tag, set)| format!("{}={}", tag, set.len()))
                .collect();
            writeln!(f, "{}  links: {} ({})", pad, self.link_count, per_tag.join(", "))?;
        }
        for note in &self.notes {
            writeln!(f, "{}  {}", pad, note)?;
        }
        for child in &self.children {
            writeln!(f, "{}  <{}>", pad, child.tag)?;
            child.check.write_indented(f, indent + 4)?;
        }
        Ok(())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
