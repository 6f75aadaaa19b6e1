//! # TaskHive Worker Library
//!
//! This library provides the delayed-job runner for TaskHive: claiming due
//! `scheduled_jobs` rows from Postgres and dispatching them to handlers.
//!
//! ## Modules
//!
//! - `config`: Worker configuration from the environment
//! - `runner`: Claim/dispatch/mark loop with graceful shutdown
//! - `handlers`: Job handler trait and implementations
//!
//! ## Example
//!
//! ```no_run
//! use taskhive_worker::handlers::JobHandler;
//! use taskhive_worker::handlers::mock::MockHandler;
//!
//! let handler = MockHandler::new();
//! println!("Handler: {}", handler.name());
//! ```

pub mod config;
pub mod handlers;
pub mod runner;
