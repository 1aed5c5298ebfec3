// historysync services
// Stateless logic: reading the local store, normalizing, selecting, submitting,
// exporting, and settings.

pub mod exporter;
pub mod history_reader;
pub mod incremental_selector;
pub mod normalizer;
pub mod settings_engine;
pub mod sync_client;
