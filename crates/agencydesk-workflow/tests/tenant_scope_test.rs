mod common;

use agencydesk_core::error::BrokerError;
use agencydesk_core::models::role::Role;
use agencydesk_core::models::vehicle::{
    AddDrivingHistory, AssignDriver, CreateVehicle, DriverDetails, DrivingIncident,
    VehicleDetails,
};
use agencydesk_core::repository::Pagination;
use chrono::NaiveDate;
use uuid::Uuid;

use common::{desk, office, person};

fn vehicle_for(customer_id: Uuid) -> CreateVehicle {
    CreateVehicle {
        customer_id,
        vin: "JH4KA7561PC008269".into(),
        details: VehicleDetails {
            make: Some("Acura".into()),
            year: Some(1993),
            ..Default::default()
        },
        metadata: None,
    }
}

#[tokio::test]
async fn agent_cannot_read_another_agencys_customer() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;

    let foreign = desk
        .identities
        .get(&bravo.agent, acme.customer.id)
        .await
        .unwrap_err();
    let missing = desk
        .identities
        .get(&bravo.agent, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(foreign, BrokerError::NotFound { .. }), "{foreign:?}");
    assert!(matches!(missing, BrokerError::NotFound { .. }), "{missing:?}");
    assert_eq!(foreign.to_string(), missing.to_string());
}

#[tokio::test]
async fn vehicle_for_foreign_customer_is_not_found() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;

    let own = desk
        .records
        .create_vehicle(&acme.agent, vehicle_for(acme.customer.id))
        .await
        .unwrap();
    assert_eq!(own.customer_id, acme.customer.id);

    let foreign = desk
        .records
        .create_vehicle(&bravo.agent, vehicle_for(acme.customer.id))
        .await
        .unwrap_err();
    let missing = desk
        .records
        .create_vehicle(&bravo.agent, vehicle_for(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(foreign, BrokerError::NotFound { .. }), "{foreign:?}");
    assert!(matches!(missing, BrokerError::NotFound { .. }), "{missing:?}");

    let err = desk
        .records
        .get_vehicle(&bravo.agent, own.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn lists_never_cross_agencies() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;
    desk.records
        .create_vehicle(&acme.agent, vehicle_for(acme.customer.id))
        .await
        .unwrap();

    let customers = desk
        .identities
        .list(&bravo.agent, Some(Role::Customer), Pagination::default())
        .await
        .unwrap();
    assert_eq!(customers.total, 1);
    assert!(customers.items.iter().all(|u| u.agency_id == Some(bravo.agency_id)));

    let vehicles = desk
        .records
        .list_vehicles(&bravo.agent, Some(acme.customer.id), Pagination::default())
        .await
        .unwrap();
    assert_eq!(vehicles.total, 0);

    let everyone = desk
        .identities
        .list(&desk.master, None, Pagination::default())
        .await
        .unwrap();
    // One MasterAdmin plus admin, agent and customer in each agency.
    assert_eq!(everyone.total, 7);
}

#[tokio::test]
async fn agent_sees_customers_and_agents_only() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;

    let err = desk
        .identities
        .list(&acme.agent, Some(Role::AgencyAdmin), Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    let visible = desk
        .identities
        .list(&acme.agent, None, Pagination::default())
        .await
        .unwrap();
    assert!(
        visible
            .items
            .iter()
            .all(|u| matches!(u.role, Role::Agent | Role::Customer))
    );
    assert_eq!(visible.total, 2);

    // Self-view always works.
    let me = desk.identities.get(&acme.admin, acme.admin.user_id).await.unwrap();
    assert_eq!(me.role, Role::AgencyAdmin);
}

#[tokio::test]
async fn satellite_records_follow_the_customer() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;
    let vehicle = desk
        .records
        .create_vehicle(&acme.agent, vehicle_for(acme.customer.id))
        .await
        .unwrap();

    desk.records
        .assign_driver(
            &acme.agent,
            AssignDriver {
                vehicle_id: vehicle.id,
                user_id: acme.customer.id,
                details: DriverDetails {
                    driver_type: Some("Primary".into()),
                    ..Default::default()
                },
                metadata: None,
            },
        )
        .await
        .unwrap();
    let err = desk
        .records
        .assign_driver(
            &bravo.agent,
            AssignDriver {
                vehicle_id: vehicle.id,
                user_id: bravo.customer.id,
                details: DriverDetails::default(),
                metadata: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");

    let incident = DrivingIncident {
        incident_type: Some("Speeding".into()),
        incident_date: NaiveDate::from_ymd_opt(2024, 5, 2),
        conviction_date: NaiveDate::from_ymd_opt(2024, 4, 1),
        ..Default::default()
    };
    let err = desk
        .records
        .add_driving_history(
            &acme.agent,
            AddDrivingHistory {
                user_id: acme.customer.id,
                incident,
                metadata: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }), "{err:?}");

    let drivers = desk
        .records
        .list_drivers(&acme.agent, Some(vehicle.id), Pagination::default())
        .await
        .unwrap();
    assert_eq!(drivers.total, 1);
    let none = desk
        .records
        .list_drivers(&bravo.agent, Some(vehicle.id), Pagination::default())
        .await
        .unwrap();
    assert_eq!(none.total, 0);
}

#[tokio::test]
async fn tenant_resolver_reads_current_membership() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;

    assert_eq!(
        desk.tenants.resolve(acme.agent.user_id).await.unwrap(),
        Some(acme.agency_id)
    );
    assert_eq!(desk.tenants.resolve(desk.master.user_id).await.unwrap(), None);
    let err = desk.tenants.resolve(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");

    let caller = desk
        .tenants
        .caller(acme.agent.user_id, Role::Agent)
        .await
        .unwrap();
    assert_eq!(caller, acme.agent);

    let err = desk
        .tenants
        .caller(acme.agent.user_id, Role::AgencyAdmin)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Unauthenticated { .. }), "{err:?}");

    desk.identities
        .delete(&acme.admin, acme.agent.user_id)
        .await
        .unwrap();
    let err = desk
        .tenants
        .caller(acme.agent.user_id, Role::Agent)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Unauthenticated { .. }), "{err:?}");
}

#[tokio::test]
async fn customers_are_created_inside_the_agents_agency() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;

    let mut no_password = person("Eve", "eve@acme.test");
    no_password.password = None;
    let created = desk
        .identities
        .create(&acme.agent, Role::Customer, None, no_password)
        .await
        .unwrap();
    assert_eq!(created.agency_id, Some(acme.agency_id));

    let err = desk
        .identities
        .create(
            &acme.agent,
            Role::Customer,
            Some(bravo.agency_id),
            person("Mallory", "mallory@acme.test"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");

    let err = desk
        .identities
        .create(&acme.agent, Role::Agent, None, person("Zed", "zed@acme.test"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    // The rival agent's customer cannot be touched either.
    let err = desk
        .identities
        .delete(&acme.agent, bravo.customer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");
}
