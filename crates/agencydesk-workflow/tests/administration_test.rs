mod common;

use std::sync::Arc;

use agencydesk_core::error::BrokerError;
use agencydesk_core::models::agency::{CreateAgency, CreateLocation, UpdateAgency};
use agencydesk_core::models::policy::BindQuote;
use agencydesk_core::models::quote::{CreateQuote, QuoteStatus, UpdateQuote};
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::UpdateUser;
use agencydesk_core::repository::Pagination;
use agencydesk_workflow::IdentityService;
use chrono::NaiveDate;

use common::{caller_of, desk, office, person, provider};

#[tokio::test]
async fn master_admin_must_name_an_agency_for_tenant_roles() {
    let desk = desk().await;
    let err = desk
        .identities
        .create(&desk.master, Role::Agent, None, person("Ann", "ann@x.test"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }), "{err:?}");

    let peer = desk
        .identities
        .create(
            &desk.master,
            Role::MasterAdmin,
            None,
            person("Max", "max@agencydesk.test"),
        )
        .await
        .unwrap();
    assert_eq!(peer.agency_id, None);
}

#[tokio::test]
async fn creation_honours_the_configured_password_length() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let strict = IdentityService::new(Arc::clone(&desk.store)).with_min_password_length(16);

    // "correct horse" passes the default policy but not this one.
    let err = strict
        .create(&acme.admin, Role::Agent, None, person("Sam", "sam@acme.test"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }), "{err:?}");

    let mut long = person("Sam", "sam@acme.test");
    long.password = Some("correct horse battery".into());
    let sam = strict
        .create(&acme.admin, Role::Agent, None, long)
        .await
        .unwrap();
    assert_eq!(sam.role, Role::Agent);

    // Customers created without a password still get a generated one.
    let mut walk_in = person("Kim", "kim@acme.test");
    walk_in.password = None;
    strict
        .create(&acme.agent, Role::Customer, None, walk_in)
        .await
        .unwrap();
}

#[tokio::test]
async fn agency_admin_manages_agents_but_not_peers() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;

    let err = desk
        .identities
        .create(
            &acme.admin,
            Role::AgencyAdmin,
            None,
            person("Peer", "peer@acme.test"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    let location = desk
        .organizations
        .create_location(
            &acme.admin,
            CreateLocation {
                address: "1 Main St".into(),
                metadata: None,
            },
        )
        .await
        .unwrap();
    let mut desk_manager = person("Lou", "lou@acme.test");
    desk_manager.location_id = Some(location.id);
    let lou = desk
        .identities
        .create(&acme.admin, Role::LocationAdmin, None, desk_manager)
        .await
        .unwrap();
    assert_eq!(lou.location_id, Some(location.id));

    let renamed = desk
        .identities
        .update(
            &acme.admin,
            acme.agent.user_id,
            UpdateUser {
                first_name: Some("Alana".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.first_name, "Alana");

    // Customers are visible to the admin but not writable.
    let err = desk
        .identities
        .update(
            &acme.admin,
            acme.customer.id,
            UpdateUser {
                first_name: Some("Nope".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    let err = desk
        .identities
        .delete(&acme.admin, acme.admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }), "{err:?}");
}

#[tokio::test]
async fn agencies_are_visible_to_their_own_staff_only() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;

    let own = desk
        .organizations
        .list_agencies(&acme.admin, Pagination::default())
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.items[0].id, acme.agency_id);

    let err = desk
        .organizations
        .get_agency(&acme.admin, bravo.agency_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");

    let err = desk
        .organizations
        .update_agency(
            &acme.admin,
            acme.agency_id,
            UpdateAgency {
                name: Some("Acme Two".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    let all = desk
        .organizations
        .list_agencies(&desk.master, Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);
}

#[tokio::test]
async fn agency_with_identities_cannot_be_deleted() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let err = desk
        .organizations
        .delete_agency(&desk.master, acme.agency_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Conflict { .. }), "{err:?}");

    let empty = desk
        .organizations
        .create_agency(
            &desk.master,
            CreateAgency {
                name: "Empty".into(),
                agent_code: Some("E-1".into()),
                metadata: None,
            },
        )
        .await
        .unwrap();
    desk.organizations
        .delete_agency(&desk.master, empty.id)
        .await
        .unwrap();
    let err = desk
        .organizations
        .get_agency(&desk.master, empty.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn ungranted_provider_is_forbidden_not_hidden() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let granted = provider(&desk, "Northwind").await;
    let ungranted = provider(&desk, "Southgate").await;
    desk.catalog
        .grant(&desk.master, acme.agency_id, granted)
        .await
        .unwrap();

    let seen = desk.catalog.get_provider(&acme.agent, granted).await.unwrap();
    assert_eq!(seen.name, "Northwind");
    let err = desk
        .catalog
        .get_provider(&acme.agent, ungranted)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    let listed = desk
        .catalog
        .list_providers(&acme.admin, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    let granted_to = desk
        .catalog
        .granted_to(&acme.admin, acme.agency_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(granted_to.items[0].id, granted);

    desk.catalog
        .revoke(&desk.master, acme.agency_id, granted)
        .await
        .unwrap();
    let err = desk
        .catalog
        .get_provider(&acme.agent, granted)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");

    let err = desk
        .catalog
        .grant(&acme.admin, acme.agency_id, ungranted)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");
}

#[tokio::test]
async fn reports_follow_the_callers_scope() {
    let desk = desk().await;
    let acme = office(&desk, "Acme", "acme.test").await;
    let bravo = office(&desk, "Bravo", "bravo.test").await;
    let northwind = provider(&desk, "Northwind").await;
    for agency_id in [acme.agency_id, bravo.agency_id] {
        desk.catalog
            .grant(&desk.master, agency_id, northwind)
            .await
            .unwrap();
    }

    let mut quotes = Vec::new();
    for office in [&acme, &acme, &acme, &bravo] {
        let quote = desk
            .quotes
            .create(
                &office.agent,
                CreateQuote {
                    customer_id: office.customer.id,
                    vehicle_id: None,
                    metadata: None,
                },
            )
            .await
            .unwrap();
        quotes.push(quote.id);
    }
    desk.quotes
        .update(
            &acme.agent,
            quotes[1],
            UpdateQuote {
                status: Some(QuoteStatus::Presented),
                metadata: None,
            },
        )
        .await
        .unwrap();
    desk.quotes
        .bind(
            &acme.agent,
            BindQuote {
                quote_id: quotes[2],
                provider_id: northwind,
                policy_number: Some("  ACME-0001  ".into()),
                effective_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                expiration_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                metadata: None,
            },
        )
        .await
        .unwrap();

    let global = desk.reports.quotes(&desk.master).await.unwrap();
    assert_eq!(global.total_quotes, 4);
    assert_eq!(global.draft_quotes, 2);

    let tenant = desk.reports.quotes(&acme.admin).await.unwrap();
    assert_eq!(tenant.total_quotes, 3);
    assert_eq!(tenant.draft_quotes, 1);
    assert_eq!(tenant.presented_quotes, 1);
    assert_eq!(tenant.bound_quotes, 1);

    let policies = desk.reports.policies(&acme.admin).await.unwrap();
    assert_eq!(policies.total_policies, 1);
    assert_eq!(policies.active_policies, 1);
    let rival = desk.reports.policies(&bravo.admin).await.unwrap();
    assert_eq!(rival.total_policies, 0);

    let summary = desk.reports.agent_summary(&acme.agent).await.unwrap();
    assert_eq!(summary.agent_id, acme.agent.user_id);
    assert_eq!(summary.customer_count, 1);
    assert_eq!(summary.quotes.total_quotes, 3);
    assert_eq!(summary.policies.total_policies, 1);

    let policy = desk
        .quotes
        .policy_for_quote(&acme.agent, quotes[2])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(policy.policy_number, "ACME-0001");

    let err = desk.reports.agent_summary(&acme.admin).await.unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");
    let customer = caller_of(&acme.customer);
    let err = desk.reports.quotes(&customer).await.unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "{err:?}");
}
