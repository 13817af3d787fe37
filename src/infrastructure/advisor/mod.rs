//! Advisor HTTP client infrastructure.

pub mod client;
pub mod error;
pub mod retry;

pub use client::HttpAdvisorClient;
pub use error::AdvisorError;
pub use retry::RetryPolicy;
