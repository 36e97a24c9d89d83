//! CLI for the gsh script catalogue.

mod catalogue;
mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use gsh_core::{config, logging};
use std::path::{Path, PathBuf};
use url::Url;

use catalogue::Catalogue;
use commands::{
    run_completions, run_derive_name, run_import, run_list, run_man, run_open, run_remove,
    run_rename,
};

/// Top-level CLI for gsh.
#[derive(Debug, Parser)]
#[command(name = "gsh")]
#[command(about = "gsh: import, name and catalogue scripts from URIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Hand a URI to the script picker, as a "view" (default) or "send" request.
    Open {
        /// content://, resource://, file://, http(s):// URI or a local path.
        uri: String,
        /// Deliver the URI as a shared stream instead of viewing it.
        #[arg(long)]
        send: bool,
        /// Mark the request as coming from a browser.
        #[arg(long)]
        browsable: bool,
    },

    /// Print the default script name for a URI.
    DeriveName {
        /// URI or local path.
        uri: String,
        /// Directory backing content:// and resource:// URIs (overrides config).
        #[arg(long, value_name = "DIR")]
        content_root: Option<PathBuf>,
    },

    /// Import a script and add it to the catalogue.
    Import {
        /// URI or local path of the script source.
        uri: String,
        /// Script name; derived from the URI when omitted.
        #[arg(long)]
        name: Option<String>,
        /// Class name; defaults to the script name.
        #[arg(long = "class", value_name = "CLASS")]
        class_name: Option<String>,
    },

    /// List catalogued scripts.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Remove a script and its stored data.
    Remove {
        /// Script name.
        name: String,
    },

    /// Rename a script.
    Rename {
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        if let Err(e) = logging::init_logging(cfg.log_filter.as_deref()) {
            logging::init_logging_stderr(cfg.log_filter.as_deref());
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
        }
        tracing::debug!("loaded config: {:?}", cfg);

        if let CliCommand::DeriveName { uri, content_root } = &cli.command {
            let root = match content_root {
                Some(dir) => dir.clone(),
                None => cfg.content_root()?,
            };
            return run_derive_name(&parse_uri(uri)?, &root);
        }

        let mut catalogue = Catalogue::open(&cfg).await?;
        let result = match cli.command {
            CliCommand::Open {
                uri,
                send,
                browsable,
            } => run_open(&mut catalogue, &cfg, &parse_uri(&uri)?, send, browsable).await,
            CliCommand::Import {
                uri,
                name,
                class_name,
            } => run_import(&mut catalogue, &cfg, &parse_uri(&uri)?, name, class_name)
                .await
                .map(|_| ()),
            CliCommand::List { json } => run_list(&mut catalogue, json).await,
            CliCommand::Remove { name } => run_remove(&mut catalogue, &name).await,
            CliCommand::Rename { old, new } => run_rename(&mut catalogue, &old, &new).await,
            CliCommand::DeriveName { .. } | CliCommand::Completions { .. } | CliCommand::Man => {
                Ok(())
            }
        };
        catalogue.close().await;
        result
    }
}

/// Parse `arg` as a URI; an existing local path becomes a `file://` URI.
pub(crate) fn parse_uri(arg: &str) -> Result<Url> {
    match Url::parse(arg) {
        Ok(uri) => Ok(uri),
        Err(parse_err) => {
            let path = Path::new(arg);
            if !path.exists() {
                return Err(parse_err).with_context(|| format!("invalid URI {arg:?}"));
            }
            let abs = path
                .canonicalize()
                .with_context(|| format!("resolve {}", path.display()))?;
            Url::from_file_path(&abs)
                .map_err(|_| anyhow::anyhow!("cannot express {} as a URI", abs.display()))
        }
    }
}

#[cfg(test)]
mod tests;
