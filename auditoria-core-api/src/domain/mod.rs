pub mod actor;
pub mod commands;
pub mod ledger;

// Re-exports
pub use actor::*;
pub use commands::*;
pub use ledger::*;
