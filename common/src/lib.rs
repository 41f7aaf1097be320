//! Shared building blocks for the weather service: errors, the outbound HTTP
//! client, data models, observable request state and tracing setup.

pub mod errors;
pub mod http_client;
pub mod models;
pub mod state;
pub mod tracing;
