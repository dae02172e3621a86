//! PostgreSQL adapters (sqlx).

mod ledger_store;

pub use ledger_store::PostgresLedgerStore;
