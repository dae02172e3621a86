//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `LedgerStore` - per-tenant subscription fields + payment ledger,
//!   with the atomic charge unit the state machine relies on

mod ledger_store;

pub use ledger_store::{LedgerStore, RecordOutcome};
