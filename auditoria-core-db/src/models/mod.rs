pub mod audit_trail;
pub mod commission;
pub mod consultation;
pub mod identifiable;
pub mod partner;
pub mod request;

// Re-exports
pub use audit_trail::*;
pub use commission::*;
pub use consultation::*;
pub use identifiable::*;
pub use partner::*;
pub use request::*;
