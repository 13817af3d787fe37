//! Infrastructure concerns: the advisor HTTP client, configuration loading,
//! and logging setup.

pub mod advisor;
pub mod config;
pub mod logging;
