pub mod audit_request;
pub mod document_request;

// Re-exports
pub use audit_request::*;
pub use document_request::*;
