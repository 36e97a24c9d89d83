//! Row operations on the `scripts` table.

mod read;
mod write;
