#![allow(dead_code)]

use std::sync::Arc;

use agencydesk_core::authz::Caller;
use agencydesk_core::models::agency::CreateAgency;
use agencydesk_core::models::provider::{CreateCoverage, CreateProvider};
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{CreateUser, NewIdentity, User, UserProfile};
use agencydesk_core::repository::{Store, UserRepository};
use agencydesk_db::SurrealStore;
use agencydesk_workflow::{
    CatalogService, CustomerRecordService, IdentityService, OrganizationService, QuoteWorkflow,
    ReportingService, TenantResolver,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

pub type TestStore = SurrealStore<Db>;

/// Every service over one freshly migrated in-memory store.
pub struct Desk {
    pub store: Arc<TestStore>,
    pub tenants: TenantResolver<TestStore>,
    pub identities: IdentityService<TestStore>,
    pub organizations: OrganizationService<TestStore>,
    pub catalog: CatalogService<TestStore>,
    pub records: CustomerRecordService<TestStore>,
    pub quotes: QuoteWorkflow<TestStore>,
    pub reports: ReportingService<TestStore>,
    pub master: Caller,
}

pub fn caller_of(user: &User) -> Caller {
    Caller {
        user_id: user.id,
        role: user.role,
        agency_id: user.agency_id,
    }
}

pub fn person(first: &str, email: &str) -> NewIdentity {
    NewIdentity {
        first_name: first.into(),
        last_name: "Tester".into(),
        email: email.into(),
        password: Some("correct horse".into()),
        location_id: None,
        profile: UserProfile::default(),
        metadata: None,
    }
}

pub async fn desk() -> Desk {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    agencydesk_db::run_migrations(&db).await.unwrap();
    let store = Arc::new(SurrealStore::new(db));

    let admin = store
        .users()
        .create(CreateUser {
            first_name: "Root".into(),
            last_name: "Admin".into(),
            email: "root@agencydesk.test".into(),
            password: "correct horse".into(),
            role: Role::MasterAdmin,
            agency_id: None,
            location_id: None,
            profile: UserProfile::default(),
            metadata: None,
        })
        .await
        .unwrap();

    Desk {
        tenants: TenantResolver::new(Arc::clone(&store)),
        identities: IdentityService::new(Arc::clone(&store)),
        organizations: OrganizationService::new(Arc::clone(&store)),
        catalog: CatalogService::new(Arc::clone(&store)),
        records: CustomerRecordService::new(Arc::clone(&store)),
        quotes: QuoteWorkflow::new(Arc::clone(&store)),
        reports: ReportingService::new(Arc::clone(&store)),
        master: caller_of(&admin),
        store,
    }
}

/// One agency staffed through the services: an administrator, an agent
/// and a customer created by that agent.
pub struct Office {
    pub agency_id: Uuid,
    pub admin: Caller,
    pub agent: Caller,
    pub customer: User,
}

pub async fn office(desk: &Desk, name: &str, domain: &str) -> Office {
    let agency = desk
        .organizations
        .create_agency(
            &desk.master,
            CreateAgency {
                name: name.into(),
                agent_code: None,
                metadata: None,
            },
        )
        .await
        .unwrap();

    let admin = desk
        .identities
        .create(
            &desk.master,
            Role::AgencyAdmin,
            Some(agency.id),
            person("Ada", &format!("admin@{domain}")),
        )
        .await
        .unwrap();
    let agent = desk
        .identities
        .create(
            &caller_of(&admin),
            Role::Agent,
            None,
            person("Alan", &format!("agent@{domain}")),
        )
        .await
        .unwrap();
    let customer = desk
        .identities
        .create(
            &caller_of(&agent),
            Role::Customer,
            None,
            person("Carla", &format!("carla@{domain}")),
        )
        .await
        .unwrap();

    Office {
        agency_id: agency.id,
        admin: caller_of(&admin),
        agent: caller_of(&agent),
        customer,
    }
}

pub async fn provider(desk: &Desk, name: &str) -> Uuid {
    desk.catalog
        .create_provider(
            &desk.master,
            CreateProvider {
                name: name.into(),
                contact_info: format!("underwriting@{}.test", name.to_lowercase()),
                metadata: None,
            },
        )
        .await
        .unwrap()
        .id
}

pub async fn coverage(desk: &Desk, name: &str) -> Uuid {
    desk.catalog
        .create_coverage(
            &desk.master,
            CreateCoverage {
                name: name.into(),
                description: None,
                metadata: None,
            },
        )
        .await
        .unwrap()
        .id
}
