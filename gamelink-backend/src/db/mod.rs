//! SQLite storage: the `Database` handle plus per-table `impl Database` blocks.

mod sqlite;
mod tables;

pub use sqlite::Database;
