//! Backend Client
//!
//! HTTP access to the task-execution backend. Every call runs under an
//! optional deadline and every failure is classified as one of
//! timeout, unreachable, malformed response or backend error.

pub mod client;
pub mod error;

pub use client::{BackendClient, BackendResponse, Deadline};
pub use error::{BackendError, Result};
