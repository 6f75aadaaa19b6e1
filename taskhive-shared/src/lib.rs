//! # TaskHive Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the TaskHive API server and notification worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool and migrations
//! - `email`: Transactional email client and templates
//! - `push`: Push notification channels and selection policy
//! - `jobs`: Background job definitions and scheduling rules

pub mod auth;
pub mod db;
pub mod email;
pub mod jobs;
pub mod models;
pub mod push;

/// Current version of the TaskHive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
