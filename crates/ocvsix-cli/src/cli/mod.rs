//! CLI for ocvsix.

mod commands;
mod item;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use ocvsix_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_config, run_download, run_page, run_resolve};

/// Top-level CLI for ocvsix.
#[derive(Debug, Parser)]
#[command(name = "ocvsix")]
#[command(about = "ocvsix: one-click VSIX downloads from the extension marketplace", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a package as <publisher>.<name>.vsix.
    Download {
        /// Marketplace page URL (with itemName=...) or a bare publisher.name identifier.
        item: String,

        /// Directory to save into (default: config download_dir, else the current directory).
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Print the direct package URL without downloading it.
    Resolve {
        /// Marketplace page URL or publisher.name identifier.
        item: String,
    },

    /// Load a package detail page, mount the download button, and click it once.
    Page {
        /// Marketplace package detail page URL.
        url: String,

        /// Directory to save into (default: config download_dir, else the current directory).
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Print the path of the configuration file.
    Config,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Download { item, out_dir } => {
                let dir = resolve_out_dir(out_dir, &cfg)?;
                run_download(&cfg, &item, &dir).await?;
            }
            CliCommand::Resolve { item } => run_resolve(&cfg, &item).await?,
            CliCommand::Page { url, out_dir } => {
                let dir = resolve_out_dir(out_dir, &cfg)?;
                run_page(&cfg, &url, &dir).await?;
            }
            CliCommand::Config => run_config()?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

/// `--out-dir`, else the configured download dir, else the current directory.
fn resolve_out_dir(out_dir: Option<PathBuf>, cfg: &config::OcvsixConfig) -> Result<PathBuf> {
    match out_dir.or_else(|| cfg.download_dir.clone()) {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

#[cfg(test)]
mod tests;
