pub mod commission;

// Re-exports
pub use commission::*;
