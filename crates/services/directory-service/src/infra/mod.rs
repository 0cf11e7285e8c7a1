//! Infrastructure layer - database connection and schema.

mod db;
pub mod migrations;

pub use db::{ping as ping_connection, Database};
pub use migrations::Migrator;
