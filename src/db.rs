//! Repository layer over the hosted Postgres tables.

pub mod categoria;
pub mod connection;
pub mod producto;
pub mod stock;
pub mod usuario;

pub use connection::{TableCounts, connect, get_table_counts, get_version, test_connection};
