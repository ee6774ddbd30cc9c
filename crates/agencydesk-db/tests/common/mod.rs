#![allow(dead_code)]

use agencydesk_core::models::agency::{Agency, CreateAgency};
use agencydesk_core::models::provider::{Coverage, CreateCoverage, CreateProvider, Provider};
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{CreateUser, User, UserProfile};
use agencydesk_core::repository::{
    AgencyRepository, CoverageRepository, ProviderRepository, Store, UserRepository,
};
use agencydesk_db::SurrealStore;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

pub type TestStore = SurrealStore<Db>;

pub async fn setup() -> (Surreal<Db>, TestStore) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    agencydesk_db::run_migrations(&db).await.unwrap();
    (db.clone(), SurrealStore::new(db))
}

pub async fn agency(store: &TestStore, name: &str) -> Agency {
    store
        .agencies()
        .create(CreateAgency {
            name: name.into(),
            agent_code: None,
            metadata: None,
        })
        .await
        .unwrap()
}

pub async fn identity(store: &TestStore, email: &str, role: Role, agency: Option<&Agency>) -> User {
    store
        .users()
        .create(CreateUser {
            first_name: "Test".into(),
            last_name: role.as_str().into(),
            email: email.into(),
            password: "correct horse".into(),
            role,
            agency_id: agency.map(|a| a.id),
            location_id: None,
            profile: UserProfile::default(),
            metadata: None,
        })
        .await
        .unwrap()
}

pub async fn provider(store: &TestStore, name: &str) -> Provider {
    store
        .providers()
        .create(CreateProvider {
            name: name.into(),
            contact_info: format!("claims@{}.example", name.to_lowercase()),
            metadata: None,
        })
        .await
        .unwrap()
}

pub async fn coverage(store: &TestStore, name: &str) -> Coverage {
    store
        .coverages()
        .create(CreateCoverage {
            name: name.into(),
            description: None,
            metadata: None,
        })
        .await
        .unwrap()
}

/// Two agencies, each with an agent and a customer, plus one provider
/// granted to the first agency only.
pub struct Brokerage {
    pub store: TestStore,
    pub db: Surreal<Db>,
    pub agency: Agency,
    pub agent: User,
    pub customer: User,
    pub rival: Agency,
    pub rival_agent: User,
    pub rival_customer: User,
    pub provider: Provider,
    pub coverage: Coverage,
}

pub async fn brokerage() -> Brokerage {
    let (db, store) = setup().await;
    let agency_a = agency(&store, "Acme Insurance").await;
    let agency_b = agency(&store, "Bravo Brokers").await;

    let agent = identity(&store, "agent@acme.test", Role::Agent, Some(&agency_a)).await;
    let customer = identity(&store, "cust@acme.test", Role::Customer, Some(&agency_a)).await;
    let rival_agent = identity(&store, "agent@bravo.test", Role::Agent, Some(&agency_b)).await;
    let rival_customer =
        identity(&store, "cust@bravo.test", Role::Customer, Some(&agency_b)).await;

    let provider = provider(&store, "Northwind").await;
    store
        .providers()
        .grant(agency_a.id, provider.id)
        .await
        .unwrap();
    let coverage = coverage(&store, "Liability").await;

    Brokerage {
        store,
        db,
        agency: agency_a,
        agent,
        customer,
        rival: agency_b,
        rival_agent,
        rival_customer,
        provider,
        coverage,
    }
}
