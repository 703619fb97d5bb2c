pub mod category;
pub mod consultation_request;

// Re-exports
pub use category::*;
pub use consultation_request::*;
