//! `gsh open <uri>` – route a view/send request and, when accepted, hand the
//! URI to the picker, which imports it under its derived name.

use anyhow::{bail, Result};
use gsh_core::config::GshConfig;
use gsh_core::dispatch::{dispatch, Dispatch, Intent, CATEGORY_BROWSABLE};
use url::Url;

use crate::cli::catalogue::Catalogue;
use crate::cli::commands::run_import;

pub(crate) fn build_intent(uri: &Url, send: bool, browsable: bool) -> Intent {
    let intent = if send {
        Intent::send(uri.clone())
    } else {
        Intent::view(uri.clone())
    };
    if browsable {
        intent.with_category(CATEGORY_BROWSABLE)
    } else {
        intent
    }
}

pub async fn run_open(
    catalogue: &mut Catalogue,
    cfg: &GshConfig,
    uri: &Url,
    send: bool,
    browsable: bool,
) -> Result<()> {
    let outcome = dispatch(&build_intent(uri, send, browsable));
    let code = outcome.result_code();
    match outcome {
        Dispatch::Picker(request) => {
            tracing::debug!(browsable = request.browsable, "opening script picker");
            run_import(catalogue, cfg, &request.uri, None, None).await?;
            Ok(())
        }
        Dispatch::Rejected(reason) => {
            bail!("{} ({}, result code {})", uri, reason, code)
        }
    }
}
