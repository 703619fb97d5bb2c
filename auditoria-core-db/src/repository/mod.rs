pub mod memory;
pub mod store;

// Re-exports
pub use memory::*;
pub use store::*;
