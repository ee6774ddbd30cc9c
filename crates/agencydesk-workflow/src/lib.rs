//! agencydesk workflow: the use cases behind every endpoint.
//!
//! Each service is generic over [`Store`](agencydesk_core::repository::Store)
//! and takes the authenticated [`Caller`](agencydesk_core::authz::Caller)
//! as its first argument. Services consult the authorization engine
//! before touching the store and hand the resulting scope down to the
//! repositories, which re-check membership in the same statement that
//! writes.

pub mod catalog;
pub mod customer;
pub mod directory;
pub mod organization;
pub mod quote;
pub mod report;
pub mod tenant;

pub use catalog::CatalogService;
pub use customer::CustomerRecordService;
pub use directory::IdentityService;
pub use organization::OrganizationService;
pub use quote::QuoteWorkflow;
pub use report::ReportingService;
pub use tenant::TenantResolver;
