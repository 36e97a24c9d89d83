//! Persistent script catalogue (SQLite via sqlx).
//!
//! One `scripts` table: internal id, unique human name, source URI and class
//! name. Deleting a row also removes the script's stored data.

pub mod db;
mod scripts;
pub mod types;

pub use db::*;
pub use types::*;
