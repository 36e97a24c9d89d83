//! `gsh rename <old> <new>`

use anyhow::{bail, Result};

use crate::cli::catalogue::Catalogue;

pub async fn run_rename(catalogue: &mut Catalogue, old: &str, new: &str) -> Result<()> {
    if catalogue.rename(old, new).await? == 0 {
        bail!("no script named {old:?}");
    }
    println!("Renamed {old} to {new}");
    Ok(())
}
