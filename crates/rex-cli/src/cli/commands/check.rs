//! `rex check` – examine one URI and print the report.

use anyhow::{bail, Context, Result};
use rex_core::config::RexConfig;
use rex_core::{AbortToken, CheckReport, CurlFetcher, HtmlLinkExtractor, Orchestrator};

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub uri: String,
    pub method: String,
    /// Raw `Name: value` strings from the command line.
    pub headers: Vec<String>,
    pub body: Option<Vec<u8>>,
    pub descend: bool,
    pub json: bool,
    pub progress: bool,
}

/// Split `Name: value`. The name must be non-empty; the value may be.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("invalid header {:?}: expected 'Name: value'", raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid header {:?}: empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

pub async fn run_check(cfg: &RexConfig, opts: CheckOptions) -> Result<()> {
    let headers = opts
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>>>()?;

    let abort = AbortToken::new();
    let signal_abort = abort.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted: finishing requests in flight, starting no new ones");
            signal_abort.request_abort();
        }
    });

    let cfg = cfg.clone();
    let json = opts.json;
    let report = tokio::task::spawn_blocking(move || examine(&cfg, opts, headers, abort))
        .await
        .context("examination task failed")??;
    ctrl_c.abort();

    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{}", report);
    }
    if let Some(err) = &report.error {
        bail!("{} could not be fetched: {}", report.uri, err);
    }
    Ok(())
}

/// Runs on a blocking thread: the orchestrator and curl are synchronous.
fn examine(
    cfg: &RexConfig,
    opts: CheckOptions,
    headers: Vec<(String, String)>,
    abort: AbortToken,
) -> Result<CheckReport> {
    let extractor = HtmlLinkExtractor::new().context("building link extractor")?;
    let mut orch = Orchestrator::new(CurlFetcher::from_config(cfg), Box::new(extractor))
        .with_abort(abort);
    if opts.progress {
        orch = orch.with_status(|msg| eprintln!("  {}", msg));
    }

    let root = orch.add_root(opts.uri, opts.method, headers, opts.body, opts.descend);
    orch.run_until_done(root)?;
    tracing::debug!(check = %root, "root response complete");
    orch.run_until_idle()?;
    tracing::info!(checks = orch.checks().len(), "examination finished");

    orch.report(root).context("root check missing")
}
