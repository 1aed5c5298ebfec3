//! historysync: extracts Safari browsing history and syncs it to a
//! deduplicating ingest service.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod database;
pub mod ingest_handler;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
