//! Cooperative cancellation of pipeline runs.
//!
//! A run checks its [`CancellationToken`] at every stage boundary.

mod token;

pub use token::CancellationToken;
