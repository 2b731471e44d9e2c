//! API client module

pub mod client;
pub mod csom;
pub mod response;
pub mod spo;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use client::{encode_component, ApiClient, BAP_API, GRAPH_API};
pub use response::ApiError;
