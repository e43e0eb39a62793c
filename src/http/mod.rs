pub mod capture;
pub mod client;
pub mod dispatcher;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types for convenient access
pub use client::{HttpTransport, OutboundBody, OutboundRequest, Transport};
pub use dispatcher::{ApiClient, Dispatch};
pub use request::{ApiRequest, Payload, Target};
pub use response::Response;
pub use types::{Method, Status};
