//! CLI command handlers. Each command is in its own file.

mod check;
mod completions;
mod config;

pub use check::{run_check, CheckOptions};
pub use completions::run_completions;
pub use config::run_config;
