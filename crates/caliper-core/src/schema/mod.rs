//! SQLite schema and access layer for on-disk vector indices.

pub mod db;
pub mod migrations;

pub use db::{decode_vector, encode_vector, Database};
