//! Reading a script's source bytes from its URI.
//!
//! `content` and `resource` URIs go through the resolver; `file` URIs are
//! read directly; `http`/`https` are fetched with the curl crate (libcurl).
//! All calls block; use `spawn_blocking` from async code.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::time::Duration;
use url::Url;

use crate::config::HttpConfig;
use crate::resolver::ContentResolver;

/// Limits applied while opening a source.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    /// Larger bodies are rejected.
    pub max_bytes: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for SourceOptions {
    fn from(http: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(http.connect_timeout_secs),
            timeout: Duration::from_secs(http.timeout_secs),
            max_bytes: http.max_body_bytes,
        }
    }
}

/// Reads the whole source behind `uri`.
///
/// For `content`/`resource`, a resolver failure is logged and the next way of
/// opening the URI is tried; with no other way left this ends in
/// "unable to open".
pub fn open_source(
    uri: &Url,
    resolver: &dyn ContentResolver,
    opts: &SourceOptions,
) -> Result<Vec<u8>> {
    match uri.scheme() {
        "content" | "resource" => match resolver.open_input(uri) {
            Ok(input) => read_limited(input, opts.max_bytes)
                .with_context(|| format!("failed to read {}", uri)),
            Err(e) => {
                tracing::debug!(%uri, "resolver could not open source: {}", e);
                bail!("unable to open {}", uri)
            }
        },
        "file" => {
            let path = uri
                .to_file_path()
                .map_err(|_| anyhow::anyhow!("unable to open {}: not a local path", uri))?;
            let file = std::fs::File::open(&path)
                .with_context(|| format!("unable to open {}", path.display()))?;
            read_limited(file, opts.max_bytes)
                .with_context(|| format!("failed to read {}", path.display()))
        }
        "http" | "https" => fetch(uri.as_str(), opts),
        _ => bail!("unable to open {}", uri),
    }
}

fn read_limited(input: impl Read, max_bytes: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    input.take(max_bytes + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > max_bytes {
        bail!("source exceeds {} bytes", max_bytes);
    }
    Ok(buf)
}

/// GET `url`, following redirects. Non-2xx responses are errors.
fn fetch(url: &str, opts: &SourceOptions) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();
    let mut too_large = false;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            if (body.len() + data.len()) as u64 > opts.max_bytes {
                too_large = true;
                // Short write aborts the transfer.
                return Ok(0);
            }
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()
    };
    if let Err(e) = performed {
        if too_large {
            bail!("GET {} exceeds {} bytes", url, opts.max_bytes);
        }
        return Err(e).with_context(|| format!("GET {} failed", url));
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        bail!("GET {} returned HTTP {}", url, code);
    }
    tracing::debug!(url, len = body.len(), "fetched script source");
    Ok(body)
}
