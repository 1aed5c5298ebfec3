// historysync shared type definitions
// Each submodule defines types used across the poller and the ingest service.

pub mod errors;
pub mod event;
pub mod export;
pub mod settings;
pub mod sync;
