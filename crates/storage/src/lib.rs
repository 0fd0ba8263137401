//! Storage layer for Sapa UMKM
//!
//! This crate provides the device-local key-value store, versioned entity
//! collections on top of it, and SQLite access for the account service.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod database;
pub mod keys;
pub mod kv;
pub mod local;

pub use collection::{
    Collection, CollectionDoc, CollectionError, IdSet, Position, Versioned,
};
pub use database::{DatabaseConfig, DatabaseError, MigrationDefinition, SqliteDatabase};
pub use kv::{KvConfig, KvError, KvStore};
pub use local::{read_json, write_json, LocalStore};
