pub mod company;
pub mod partner;

// Re-exports
pub use company::*;
pub use partner::*;
