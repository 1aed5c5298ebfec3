// historysync state managers
// Managers own persisted state: the ingest event table and the poller's sync state.

pub mod event_store;
pub mod sync_state_manager;
