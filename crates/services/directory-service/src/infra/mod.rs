//! Postgres connection and schema migrations for the account tables.

mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::Migrator;
