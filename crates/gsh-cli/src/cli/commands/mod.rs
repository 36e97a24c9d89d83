//! CLI command handlers, one file per command.

mod completions;
mod derive_name;
mod import;
mod list;
mod man;
mod open;
mod remove;
mod rename;

pub use completions::run_completions;
pub use derive_name::run_derive_name;
pub use import::run_import;
pub use list::run_list;
pub use man::run_man;
pub use open::run_open;
pub use remove::run_remove;
pub use rename::run_rename;
