//! `gsh remove <name>` – remove a script and the data stored for it.

use anyhow::{bail, Result};
use gsh_core::script_db::ScriptSelection;

use crate::cli::catalogue::Catalogue;

pub async fn run_remove(catalogue: &mut Catalogue, name: &str) -> Result<()> {
    let removed = catalogue
        .remove(ScriptSelection::Name(name.to_string()))
        .await?;
    if removed == 0 {
        bail!("no script named {name:?}");
    }
    println!("Removed script {name}");
    Ok(())
}
