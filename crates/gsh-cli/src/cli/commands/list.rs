//! `gsh list` – show catalogued scripts.

use anyhow::Result;

use crate::cli::catalogue::Catalogue;

pub async fn run_list(catalogue: &mut Catalogue, json: bool) -> Result<()> {
    let scripts = catalogue.list().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&scripts)?);
    } else if scripts.is_empty() {
        println!("No scripts in catalogue.");
    } else {
        println!("{:<6} {:<24} {:<24} {}", "ID", "NAME", "CLASS", "SOURCE");
        for s in scripts {
            println!(
                "{:<6} {:<24} {:<24} {}",
                s.id, s.human_name, s.class_name, s.source_uri
            );
        }
    }
    Ok(())
}
