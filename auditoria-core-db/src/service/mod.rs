pub mod boundary;
pub mod commission;
pub mod consultation;
pub mod workflow;

// Re-exports
pub use boundary::*;
pub use commission::*;
pub use consultation::*;
pub use workflow::*;
