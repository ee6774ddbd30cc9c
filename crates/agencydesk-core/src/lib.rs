//! agencydesk core: domain models, the error taxonomy, repository
//! traits and the authorization engine.
//!
//! Nothing in this crate performs I/O. The store lives behind the
//! traits in [`repository`]; the rules deciding who may touch which
//! rows live in [`authz`].

pub mod authz;
pub mod error;
pub mod models;
pub mod repository;
