//! Shared application state handed to every handler.

use std::sync::Arc;

use agencydesk_auth::{AuthConfig, AuthService};
use agencydesk_db::SurrealStore;
use agencydesk_db::repository::{
    SurrealPasswordResetRepository, SurrealSessionRepository, SurrealUserRepository,
};
use agencydesk_workflow::{
    CatalogService, CustomerRecordService, IdentityService, OrganizationService, QuoteWorkflow,
    ReportingService, TenantResolver,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type BrokerStore = SurrealStore<Any>;

pub type BrokerAuth = AuthService<
    SurrealUserRepository<Any>,
    SurrealSessionRepository<Any>,
    SurrealPasswordResetRepository<Any>,
>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BrokerStore>,
    pub auth: Arc<BrokerAuth>,
    pub tenants: TenantResolver<BrokerStore>,
    pub identities: IdentityService<BrokerStore>,
    pub organizations: OrganizationService<BrokerStore>,
    pub catalog: CatalogService<BrokerStore>,
    pub records: CustomerRecordService<BrokerStore>,
    pub quotes: QuoteWorkflow<BrokerStore>,
    pub reports: ReportingService<BrokerStore>,
}

impl AppState {
    /// Wire every service onto one database client.
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig) -> Self {
        let (store, users) = match auth_config.pepper.clone() {
            Some(pepper) => (
                SurrealStore::with_pepper(db.clone(), pepper.clone()),
                SurrealUserRepository::with_pepper(db.clone(), pepper),
            ),
            None => (
                SurrealStore::new(db.clone()),
                SurrealUserRepository::new(db.clone()),
            ),
        };
        let store = Arc::new(store);
        let identities = IdentityService::new(Arc::clone(&store))
            .with_min_password_length(auth_config.min_password_length);
        let auth = AuthService::new(
            users,
            SurrealSessionRepository::new(db.clone()),
            SurrealPasswordResetRepository::new(db),
            auth_config,
        );

        Self {
            auth: Arc::new(auth),
            tenants: TenantResolver::new(Arc::clone(&store)),
            identities,
            organizations: OrganizationService::new(Arc::clone(&store)),
            catalog: CatalogService::new(Arc::clone(&store)),
            records: CustomerRecordService::new(Arc::clone(&store)),
            quotes: QuoteWorkflow::new(Arc::clone(&store)),
            reports: ReportingService::new(Arc::clone(&store)),
            store,
        }
    }
}
