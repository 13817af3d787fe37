//! Adapters implementing the domain ports against concrete infrastructure.

pub mod feed;
pub mod sqlite;
