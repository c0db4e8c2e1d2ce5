//! Credential & violation-policy engine.
//!
//! Collaborators (account store, policy configuration) are injected at
//! construction, so every component here runs unchanged against the
//! Postgres adapter in production and in-memory fakes in tests.

pub mod credential;
pub mod error;
pub mod models;
pub mod policy;
pub mod repo;
pub mod service;

#[cfg(test)]
mod tests;
