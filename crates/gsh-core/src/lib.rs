pub mod artifacts;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod query_handler;
pub mod resolver;
pub mod script_db;
pub mod script_name;
pub mod source;
