//! Domain models for agencydesk.
//!
//! These are the core types shared across all crates.

pub mod agency;
pub mod policy;
pub mod provider;
pub mod quote;
pub mod report;
pub mod role;
pub mod session;
pub mod user;
pub mod vehicle;
