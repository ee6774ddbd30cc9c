//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped reads and writes
//! take a [`ScopeFilter`] derived from the caller by the authorization
//! engine; implementations must apply it as a predicate in the same
//! statement that touches the rows, so membership is checked against
//! the current state of the store rather than a value read earlier.

use serde::Serialize;
use uuid::Uuid;

use crate::authz::ScopeFilter;
use crate::error::BrokerResult;
use crate::models::{
    agency::{Agency, CreateAgency, CreateLocation, Location, UpdateAgency, UpdateLocation},
    policy::{NewPolicy, Policy},
    provider::{
        Coverage, CreateCoverage, CreateProvider, Provider, ProviderGrant, UpdateProvider,
    },
    quote::{CreateLineItem, CreateQuote, Quote, QuoteLineItem, QuoteStatus, UpdateQuote},
    report::{PolicyReport, QuoteReport},
    role::Role,
    session::{CreatePasswordReset, CreateSession, PasswordReset, Session},
    user::{CreateUser, UpdateUser, User},
    vehicle::{
        AddDrivingHistory, AddInsuranceHistory, AssignDriver, CreateVehicle, DrivingHistory,
        InsuranceHistory, UpdateVehicle, Vehicle, VehicleDriver,
    },
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Global catalogue
// ---------------------------------------------------------------------------

pub trait AgencyRepository: Send + Sync {
    fn create(&self, input: CreateAgency) -> impl Future<Output = BrokerResult<Agency>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BrokerResult<Agency>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateAgency,
    ) -> impl Future<Output = BrokerResult<Agency>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Agency>>> + Send;
}

pub trait ProviderRepository: Send + Sync {
    fn create(&self, input: CreateProvider)
    -> impl Future<Output = BrokerResult<Provider>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BrokerResult<Provider>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProvider,
    ) -> impl Future<Output = BrokerResult<Provider>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Provider>>> + Send;

    /// Grant an agency access to a provider. Granting twice is a no-op.
    fn grant(
        &self,
        agency_id: Uuid,
        provider_id: Uuid,
    ) -> impl Future<Output = BrokerResult<ProviderGrant>> + Send;
    /// Revoke a grant. Revoking a missing grant is `NotFound`.
    fn revoke(
        &self,
        agency_id: Uuid,
        provider_id: Uuid,
    ) -> impl Future<Output = BrokerResult<()>> + Send;
    fn is_granted(
        &self,
        agency_id: Uuid,
        provider_id: Uuid,
    ) -> impl Future<Output = BrokerResult<bool>> + Send;
    /// Providers granted to one agency.
    fn list_granted(
        &self,
        agency_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Provider>>> + Send;
}

pub trait CoverageRepository: Send + Sync {
    fn create(&self, input: CreateCoverage)
    -> impl Future<Output = BrokerResult<Coverage>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BrokerResult<Coverage>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Coverage>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait LocationRepository: Send + Sync {
    fn create(
        &self,
        agency_id: Uuid,
        input: CreateLocation,
    ) -> impl Future<Output = BrokerResult<Location>> + Send;
    fn get(
        &self,
        scope: ScopeFilter,
        id: Uuid,
    ) -> impl Future<Output = BrokerResult<Location>> + Send;
    fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        input: UpdateLocation,
    ) -> impl Future<Output = BrokerResult<Location>> + Send;
    fn list(
        &self,
        scope: ScopeFilter,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Location>>> + Send;
}

pub trait UserRepository: Send + Sync {
    /// Create an identity. The plaintext password is hashed before it
    /// is stored. A duplicate email is a `Conflict`.
    fn create(&self, input: CreateUser) -> impl Future<Output = BrokerResult<User>> + Send;
    /// Unscoped lookup, used to resolve the caller itself.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BrokerResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = BrokerResult<User>> + Send;
    /// Lookup narrowed to the scope.
    fn get(&self, scope: ScopeFilter, id: Uuid)
    -> impl Future<Output = BrokerResult<User>> + Send;
    /// Update an identity inside the scope whose role is one of `roles`.
    fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        roles: &'static [Role],
        input: UpdateUser,
    ) -> impl Future<Output = BrokerResult<User>> + Send;
    fn set_password(
        &self,
        id: Uuid,
        password: String,
    ) -> impl Future<Output = BrokerResult<()>> + Send;
    /// List identities inside the scope whose role is one of `roles`.
    fn list(
        &self,
        scope: ScopeFilter,
        roles: &'static [Role],
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<User>>> + Send;
    fn count_by_role(&self, role: Role) -> impl Future<Output = BrokerResult<u64>> + Send;
}

/// Vehicles and their driver assignments.
pub trait VehicleRepository: Send + Sync {
    /// Create a vehicle for a customer of `agency_id`. The membership of
    /// the customer is verified in the same transaction as the write.
    fn create(
        &self,
        agency_id: Uuid,
        input: CreateVehicle,
    ) -> impl Future<Output = BrokerResult<Vehicle>> + Send;
    fn get(
        &self,
        scope: ScopeFilter,
        id: Uuid,
    ) -> impl Future<Output = BrokerResult<Vehicle>> + Send;
    fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        input: UpdateVehicle,
    ) -> impl Future<Output = BrokerResult<Vehicle>> + Send;
    fn list(
        &self,
        scope: ScopeFilter,
        customer_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Vehicle>>> + Send;

    fn assign_driver(
        &self,
        agency_id: Uuid,
        input: AssignDriver,
    ) -> impl Future<Output = BrokerResult<VehicleDriver>> + Send;
    fn list_drivers(
        &self,
        scope: ScopeFilter,
        vehicle_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<VehicleDriver>>> + Send;
}

/// Driving and prior-insurance history of identities.
pub trait HistoryRepository: Send + Sync {
    fn add_driving(
        &self,
        agency_id: Uuid,
        input: AddDrivingHistory,
    ) -> impl Future<Output = BrokerResult<DrivingHistory>> + Send;
    fn list_driving(
        &self,
        scope: ScopeFilter,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<DrivingHistory>>> + Send;
    fn add_insurance(
        &self,
        agency_id: Uuid,
        input: AddInsuranceHistory,
    ) -> impl Future<Output = BrokerResult<InsuranceHistory>> + Send;
    fn list_insurance(
        &self,
        scope: ScopeFilter,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<InsuranceHistory>>> + Send;
}

pub trait QuoteRepository: Send + Sync {
    /// Create a Draft quote authored by `agent_id`. The customer must be
    /// a Customer of `agency_id` (else `NotFound`) and the vehicle, if
    /// any, must belong to that customer (else `Validation`).
    fn create(
        &self,
        agent_id: Uuid,
        agency_id: Uuid,
        input: CreateQuote,
    ) -> impl Future<Output = BrokerResult<Quote>> + Send;
    fn get(&self, scope: ScopeFilter, id: Uuid)
    -> impl Future<Output = BrokerResult<Quote>> + Send;
    /// Apply `input` only while the quote's status is one of `from`.
    fn update(
        &self,
        scope: ScopeFilter,
        id: Uuid,
        from: &[QuoteStatus],
        input: UpdateQuote,
    ) -> impl Future<Output = BrokerResult<Quote>> + Send;
    fn list(
        &self,
        scope: ScopeFilter,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Quote>>> + Send;

    /// Attach a line item while the quote is authored by `agent_id`,
    /// still bindable, and the provider is granted to `agency_id`.
    fn add_line_item(
        &self,
        agent_id: Uuid,
        agency_id: Uuid,
        quote_id: Uuid,
        input: CreateLineItem,
    ) -> impl Future<Output = BrokerResult<QuoteLineItem>> + Send;
    fn list_line_items(
        &self,
        scope: ScopeFilter,
        quote_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<QuoteLineItem>>> + Send;
}

pub trait PolicyRepository: Send + Sync {
    /// Atomically mark the source quote Bound and insert the policy.
    ///
    /// Either both writes happen or neither does. A quote that is not
    /// authored by the policy's agent or not bindable leaves the store
    /// untouched.
    fn bind(&self, policy: NewPolicy) -> impl Future<Output = BrokerResult<Policy>> + Send;
    fn get(&self, scope: ScopeFilter, id: Uuid)
    -> impl Future<Output = BrokerResult<Policy>> + Send;
    fn find_by_quote(
        &self,
        quote_id: Uuid,
    ) -> impl Future<Output = BrokerResult<Option<Policy>>> + Send;
    fn list(
        &self,
        scope: ScopeFilter,
        pagination: Pagination,
    ) -> impl Future<Output = BrokerResult<PaginatedResult<Policy>>> + Send;
}

/// Point-in-time aggregate counts. Each method is one query.
pub trait ReportRepository: Send + Sync {
    fn quote_counts(&self, scope: ScopeFilter)
    -> impl Future<Output = BrokerResult<QuoteReport>> + Send;
    fn policy_counts(
        &self,
        scope: ScopeFilter,
    ) -> impl Future<Output = BrokerResult<PolicyReport>> + Send;
    fn customer_count(&self, agency_id: Uuid) -> impl Future<Output = BrokerResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = BrokerResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = BrokerResult<Session>> + Send;
    /// Remove the session for a token. Missing sessions are ignored.
    fn delete_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = BrokerResult<()>> + Send;
    /// Remove expired sessions, returning how many were deleted.
    fn delete_expired(&self) -> impl Future<Output = BrokerResult<u64>> + Send;
}

pub trait PasswordResetRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePasswordReset,
    ) -> impl Future<Output = BrokerResult<PasswordReset>> + Send;
    /// Mark an unused, unexpired reset record as used and return it.
    /// Anything else is `NotFound`.
    fn consume(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = BrokerResult<PasswordReset>> + Send;
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// A record that can be removed through [`RecordDeleter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Agency(Uuid),
    Provider(Uuid),
    Location(Uuid),
    /// An identity whose role is one of `roles`.
    Identity { id: Uuid, roles: &'static [Role] },
}

/// Single seam for every delete, so the removal strategy (hard delete,
/// tombstones) can change without touching authorization or workflows.
pub trait RecordDeleter: Send + Sync {
    /// Remove `target` if it lies inside `scope`. A record outside the
    /// scope is `NotFound`; a record still referenced is `Conflict`.
    fn delete(
        &self,
        scope: ScopeFilter,
        target: DeleteTarget,
    ) -> impl Future<Output = BrokerResult<()>> + Send;
}

/// The full set of repositories a deployment provides.
pub trait Store: Send + Sync + 'static {
    type Agencies: AgencyRepository;
    type Providers: ProviderRepository;
    type Coverages: CoverageRepository;
    type Locations: LocationRepository;
    type Users: UserRepository;
    type Vehicles: VehicleRepository;
    type Histories: HistoryRepository;
    type Quotes: QuoteRepository;
    type Policies: PolicyRepository;
    type Reports: ReportRepository;
    type Sessions: SessionRepository;
    type Resets: PasswordResetRepository;
    type Deleter: RecordDeleter;

    fn agencies(&self) -> &Self::Agencies;
    fn providers(&self) -> &Self::Providers;
    fn coverages(&self) -> &Self::Coverages;
    fn locations(&self) -> &Self::Locations;
    fn users(&self) -> &Self::Users;
    fn vehicles(&self) -> &Self::Vehicles;
    fn histories(&self) -> &Self::Histories;
    fn quotes(&self) -> &Self::Quotes;
    fn policies(&self) -> &Self::Policies;
    fn reports(&self) -> &Self::Reports;
    fn sessions(&self) -> &Self::Sessions;
    fn resets(&self) -> &Self::Resets;
    fn deleter(&self) -> &Self::Deleter;
}
