//! HTTP client module with forge error classification.

mod client;
mod error;

pub use client::HttpClient;
pub use error::ApiError;
