//! [`Store`] bundle over one SurrealDB client.

use agencydesk_core::repository::Store;
use surrealdb::{Connection, Surreal};

use crate::repository::{
    HardDelete, SurrealAgencyRepository, SurrealCoverageRepository, SurrealHistoryRepository,
    SurrealLocationRepository, SurrealPasswordResetRepository, SurrealPolicyRepository,
    SurrealProviderRepository, SurrealQuoteRepository, SurrealReportRepository,
    SurrealSessionRepository, SurrealUserRepository, SurrealVehicleRepository,
};

/// All repositories sharing one client. Cloning is cheap.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    agencies: SurrealAgencyRepository<C>,
    providers: SurrealProviderRepository<C>,
    coverages: SurrealCoverageRepository<C>,
    locations: SurrealLocationRepository<C>,
    users: SurrealUserRepository<C>,
    vehicles: SurrealVehicleRepository<C>,
    histories: SurrealHistoryRepository<C>,
    quotes: SurrealQuoteRepository<C>,
    policies: SurrealPolicyRepository<C>,
    reports: SurrealReportRepository<C>,
    sessions: SurrealSessionRepository<C>,
    resets: SurrealPasswordResetRepository<C>,
    deleter: HardDelete<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::build(db.clone(), SurrealUserRepository::new(db))
    }

    /// Like [`SurrealStore::new`], hashing passwords with a server-side
    /// pepper.
    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self::build(db.clone(), SurrealUserRepository::with_pepper(db, pepper))
    }

    fn build(db: Surreal<C>, users: SurrealUserRepository<C>) -> Self {
        Self {
            agencies: SurrealAgencyRepository::new(db.clone()),
            providers: SurrealProviderRepository::new(db.clone()),
            coverages: SurrealCoverageRepository::new(db.clone()),
            locations: SurrealLocationRepository::new(db.clone()),
            users,
            vehicles: SurrealVehicleRepository::new(db.clone()),
            histories: SurrealHistoryRepository::new(db.clone()),
            quotes: SurrealQuoteRepository::new(db.clone()),
            policies: SurrealPolicyRepository::new(db.clone()),
            reports: SurrealReportRepository::new(db.clone()),
            sessions: SurrealSessionRepository::new(db.clone()),
            resets: SurrealPasswordResetRepository::new(db.clone()),
            deleter: HardDelete::new(db),
        }
    }
}

impl<C: Connection> Store for SurrealStore<C> {
    type Agencies = SurrealAgencyRepository<C>;
    type Providers = SurrealProviderRepository<C>;
    type Coverages = SurrealCoverageRepository<C>;
    type Locations = SurrealLocationRepository<C>;
    type Users = SurrealUserRepository<C>;
    type Vehicles = SurrealVehicleRepository<C>;
    type Histories = SurrealHistoryRepository<C>;
    type Quotes = SurrealQuoteRepository<C>;
    type Policies = SurrealPolicyRepository<C>;
    type Reports = SurrealReportRepository<C>;
    type Sessions = SurrealSessionRepository<C>;
    type Resets = SurrealPasswordResetRepository<C>;
    type Deleter = HardDelete<C>;

    fn agencies(&self) -> &Self::Agencies {
        &self.agencies
    }
    fn providers(&self) -> &Self::Providers {
        &self.providers
    }
    fn coverages(&self) -> &Self::Coverages {
        &self.coverages
    }
    fn locations(&self) -> &Self::Locations {
        &self.locations
    }
    fn users(&self) -> &Self::Users {
        &self.users
    }
    fn vehicles(&self) -> &Self::Vehicles {
        &self.vehicles
    }
    fn histories(&self) -> &Self::Histories {
        &self.histories
    }
    fn quotes(&self) -> &Self::Quotes {
        &self.quotes
    }
    fn policies(&self) -> &Self::Policies {
        &self.policies
    }
    fn reports(&self) -> &Self::Reports {
        &self.reports
    }
    fn sessions(&self) -> &Self::Sessions {
        &self.sessions
    }
    fn resets(&self) -> &Self::Resets {
        &self.resets
    }
    fn deleter(&self) -> &Self::Deleter {
        &self.deleter
    }
}
