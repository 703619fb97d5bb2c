pub mod ledger_store;
pub mod ledger_tx;

// Re-exports
pub use ledger_store::*;
pub use ledger_tx::*;
