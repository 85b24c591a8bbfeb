//! Domain library for the chalani dispatch registry: entities, SQLite
//! persistence, authentication primitives, numeral transcoding, and CSV
//! exports. The HTTP surface lives in the `chalani-api` service crate.

pub mod auth;
pub mod config;
pub mod domain;
pub mod export;
pub mod numerals;
pub mod seed;
pub mod store;
pub mod telemetry;
