//! `gsh import <uri>` – read a script, store its source and catalogue it.

use anyhow::{bail, Context, Result};
use gsh_core::config::GshConfig;
use gsh_core::resolver::DirectoryResolver;
use gsh_core::script_db::{NewScript, ScriptId, ScriptSelection};
use gsh_core::script_name::{derive_name, is_valid_script_name};
use gsh_core::source::{open_source, SourceOptions};
use url::Url;

use crate::cli::catalogue::Catalogue;

/// Imports `uri` under `name` (derived when `None`). The row is only added
/// once the source has been read, and is dropped again if storing it fails.
pub async fn run_import(
    catalogue: &mut Catalogue,
    cfg: &GshConfig,
    uri: &Url,
    name: Option<String>,
    class_name: Option<String>,
) -> Result<ScriptId> {
    let resolver = DirectoryResolver::new(cfg.content_root()?);
    let name = match name {
        Some(name) => name,
        None => derive_name(uri, Some(&resolver)),
    };
    if name.is_empty() {
        bail!("cannot derive a script name from {}; pass --name", uri);
    }
    if !is_valid_script_name(&name) {
        bail!("{name:?} is not a valid script name");
    }

    let opts = SourceOptions::from(&cfg.http);
    let source = {
        let uri = uri.clone();
        tokio::task::spawn_blocking(move || open_source(&uri, &resolver, &opts))
            .await
            .context("source reader task failed")??
    };

    let script = NewScript {
        class_name: class_name.unwrap_or_else(|| name.clone()),
        human_name: name.clone(),
        source_uri: uri.to_string(),
    };
    let id = catalogue.insert(script).await?;

    if let Err(e) = catalogue.artifacts().store_source(&name, &source) {
        tracing::warn!(name = %name, "storing source failed, dropping catalogue row");
        catalogue.remove(ScriptSelection::Id(id)).await?;
        return Err(e).with_context(|| format!("store source for {name}"));
    }

    tracing::info!(id, name = %name, %uri, "imported script");
    println!("Imported {name} (id {id}, {} bytes)", source.len());
    Ok(id)
}
