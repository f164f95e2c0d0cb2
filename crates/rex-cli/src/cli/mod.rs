//! CLI for REX, the HTTP resource examiner.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use rex_core::config;

use commands::{run_check, run_completions, run_config, CheckOptions};

/// Top-level CLI for REX.
#[derive(Debug, Parser)]
#[command(name = "rex")]
#[command(about = "REX: examine an HTTP resource and the resources it links to", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Examine one URI: fetch it, probe caching and negotiation support, and
    /// optionally check the resources it links to.
    Check {
        /// HTTP/HTTPS URI to examine.
        uri: String,

        /// Request method for the examined URI (probes and linked resources always use GET).
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Extra request header, repeatable.
        #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
        headers: Vec<String>,

        /// Request body.
        #[arg(long, value_name = "BODY")]
        data: Option<String>,

        /// Also examine resources linked from the body (images, scripts, stylesheets, frames).
        #[arg(long)]
        descend: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Print progress messages to stderr while running.
        #[arg(long)]
        progress: bool,
    },

    /// Show the config file path and its contents.
    Config,

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Check {
                uri,
                method,
                headers,
                data,
                descend,
                json,
                progress,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let opts = CheckOptions {
                    uri,
                    method,
                    headers,
                    body: data.map(String::into_bytes),
                    descend: descend || cfg.descend,
                    json,
                    progress,
                };
                run_check(&cfg, opts).await?;
            }
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
