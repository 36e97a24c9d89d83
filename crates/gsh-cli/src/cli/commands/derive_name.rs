//! `gsh derive-name <uri>` – print the name a script would be imported under.

use anyhow::{bail, Result};
use gsh_core::resolver::DirectoryResolver;
use gsh_core::script_name::derive_name;
use std::path::Path;
use url::Url;

pub fn run_derive_name(uri: &Url, content_root: &Path) -> Result<()> {
    let resolver = DirectoryResolver::new(content_root);
    let name = derive_name(uri, Some(&resolver));
    if name.is_empty() {
        bail!("no valid script name can be derived from {}", uri);
    }
    println!("{name}");
    Ok(())
}
