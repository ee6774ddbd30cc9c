mod common;

use agencydesk_core::authz::ScopeFilter;
use agencydesk_core::error::BrokerError;
use agencydesk_core::models::policy::{NewPolicy, PolicyStatus};
use agencydesk_core::models::quote::{
    CreateLineItem, CreateQuote, Quote, QuoteStatus, UpdateQuote,
};
use agencydesk_core::models::role::Role;
use agencydesk_core::models::vehicle::{CreateVehicle, VehicleDetails};
use agencydesk_core::repository::{
    Pagination, PolicyRepository, QuoteRepository, ReportRepository, Store, VehicleRepository,
};
use chrono::NaiveDate;
use uuid::Uuid;

use common::{Brokerage, brokerage, identity, provider};

async fn draft_quote(b: &Brokerage) -> Quote {
    b.store
        .quotes()
        .create(
            b.agent.id,
            b.agency.id,
            CreateQuote {
                customer_id: b.customer.id,
                vehicle_id: None,
                metadata: None,
            },
        )
        .await
        .unwrap()
}

fn line_item(b: &Brokerage, provider_id: Uuid, price: f64) -> CreateLineItem {
    CreateLineItem {
        provider_id,
        coverage_id: b.coverage.id,
        price,
        limit_amount: Some("100000".into()),
        deductible_amount: None,
        metadata: None,
    }
}

fn new_policy(b: &Brokerage, quote_id: Uuid, agent_id: Uuid, number: &str) -> NewPolicy {
    NewPolicy {
        id: Uuid::new_v4(),
        quote_id,
        agent_id,
        agency_id: b.agency.id,
        provider_id: b.provider.id,
        policy_number: number.into(),
        effective_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        expiration_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        metadata: serde_json::json!({}),
    }
}

fn agent_scope(b: &Brokerage) -> ScopeFilter {
    ScopeFilter::Agent {
        agent_id: b.agent.id,
        agency_id: b.agency.id,
    }
}

#[tokio::test]
async fn quote_starts_as_draft() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    assert_eq!(quote.status, QuoteStatus::Draft);
    assert_eq!(quote.agent_id, b.agent.id);
    assert_eq!(quote.customer_id, b.customer.id);
}

#[tokio::test]
async fn quote_for_foreign_customer_is_not_found() {
    let b = brokerage().await;
    let err = b
        .store
        .quotes()
        .create(
            b.agent.id,
            b.agency.id,
            CreateQuote {
                customer_id: b.rival_customer.id,
                vehicle_id: None,
                metadata: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn quote_vehicle_must_belong_to_customer() {
    let b = brokerage().await;
    let second = identity(&b.store, "other@acme.test", Role::Customer, Some(&b.agency)).await;
    let vehicle = b
        .store
        .vehicles()
        .create(
            b.agency.id,
            CreateVehicle {
                customer_id: second.id,
                vin: "2T1BURHE0JC034461".into(),
                details: VehicleDetails::default(),
                metadata: None,
            },
        )
        .await
        .unwrap();

    let err = b
        .store
        .quotes()
        .create(
            b.agent.id,
            b.agency.id,
            CreateQuote {
                customer_id: b.customer.id,
                vehicle_id: Some(vehicle.id),
                metadata: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }), "got {err:?}");
}

#[tokio::test]
async fn agent_scope_hides_colleague_quotes() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    let colleague = identity(&b.store, "agent2@acme.test", Role::Agent, Some(&b.agency)).await;
    let colleague_scope = ScopeFilter::Agent {
        agent_id: colleague.id,
        agency_id: b.agency.id,
    };

    let err = b.store.quotes().get(colleague_scope, quote.id).await.unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }));

    let agency_view = b
        .store
        .quotes()
        .list(
            ScopeFilter::Agency {
                agency_id: b.agency.id,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(agency_view.total, 1);

    let rival_view = b
        .store
        .quotes()
        .list(
            ScopeFilter::Agency {
                agency_id: b.rival.id,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(rival_view.total, 0);
}

#[tokio::test]
async fn update_only_applies_from_allowed_status() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;

    let presented = b
        .store
        .quotes()
        .update(
            agent_scope(&b),
            quote.id,
            &[QuoteStatus::Draft],
            UpdateQuote {
                status: Some(QuoteStatus::Presented),
                metadata: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(presented.status, QuoteStatus::Presented);

    let err = b
        .store
        .quotes()
        .update(
            agent_scope(&b),
            quote.id,
            &[QuoteStatus::Draft],
            UpdateQuote {
                status: Some(QuoteStatus::Draft),
                metadata: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }));
}

#[tokio::test]
async fn line_item_requires_granted_provider() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    let ungranted = provider(&b.store, "Contoso").await;

    let err = b
        .store
        .quotes()
        .add_line_item(b.agent.id, b.agency.id, quote.id, line_item(&b, ungranted.id, 10.0))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "got {err:?}");

    let item = b
        .store
        .quotes()
        .add_line_item(b.agent.id, b.agency.id, quote.id, line_item(&b, b.provider.id, 120.5))
        .await
        .unwrap();
    assert_eq!(item.quote_id, quote.id);
    assert_eq!(item.price, 120.5);

    let items = b
        .store
        .quotes()
        .list_line_items(agent_scope(&b), Some(quote.id), Pagination::default())
        .await
        .unwrap();
    assert_eq!(items.total, 1);
}

#[tokio::test]
async fn line_item_on_unknown_coverage_is_invalid() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    let mut input = line_item(&b, b.provider.id, 10.0);
    input.coverage_id = Uuid::new_v4();

    let err = b
        .store
        .quotes()
        .add_line_item(b.agent.id, b.agency.id, quote.id, input)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }), "got {err:?}");
}

#[tokio::test]
async fn bind_flips_quote_and_creates_one_policy() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;

    let policy = b
        .store
        .policies()
        .bind(new_policy(&b, quote.id, b.agent.id, "POL-1"))
        .await
        .unwrap();
    assert_eq!(policy.quote_id, quote.id);
    assert_eq!(policy.customer_id, b.customer.id);
    assert_eq!(policy.status, PolicyStatus::Active);
    assert_eq!(policy.effective_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

    let bound = b.store.quotes().get(agent_scope(&b), quote.id).await.unwrap();
    assert_eq!(bound.status, QuoteStatus::Bound);

    let found = b.store.policies().find_by_quote(quote.id).await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(policy.id));
}

#[tokio::test]
async fn second_bind_conflicts_and_writes_nothing() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    b.store
        .policies()
        .bind(new_policy(&b, quote.id, b.agent.id, "POL-1"))
        .await
        .unwrap();

    let err = b
        .store
        .policies()
        .bind(new_policy(&b, quote.id, b.agent.id, "POL-2"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Conflict { .. }), "got {err:?}");

    let policies = b
        .store
        .policies()
        .list(ScopeFilter::Global, Pagination::default())
        .await
        .unwrap();
    assert_eq!(policies.total, 1);
}

#[tokio::test]
async fn racing_binds_create_one_policy() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;

    let policies = b.store.policies();
    let (first, second) = tokio::join!(
        policies.bind(new_policy(&b, quote.id, b.agent.id, "POL-A")),
        policies.bind(new_policy(&b, quote.id, b.agent.id, "POL-B")),
    );
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1,
        "first: {first:?}, second: {second:?}"
    );

    let listed = policies
        .list(ScopeFilter::Global, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn line_items_rejected_after_bind() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    b.store
        .policies()
        .bind(new_policy(&b, quote.id, b.agent.id, "POL-1"))
        .await
        .unwrap();

    let err = b
        .store
        .quotes()
        .add_line_item(b.agent.id, b.agency.id, quote.id, line_item(&b, b.provider.id, 5.0))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn failed_bind_rolls_back_quote_status() {
    let b = brokerage().await;
    let first = draft_quote(&b).await;
    let second = draft_quote(&b).await;
    b.store
        .policies()
        .bind(new_policy(&b, first.id, b.agent.id, "POL-DUP"))
        .await
        .unwrap();

    // Same policy number violates the unique index after the quote update.
    let err = b
        .store
        .policies()
        .bind(new_policy(&b, second.id, b.agent.id, "POL-DUP"))
        .await
        .unwrap_err();
    match &err {
        BrokerError::Conflict { message } => {
            assert!(message.contains("policy"), "got {message}");
            assert!(!message.contains("quote"), "got {message}");
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let untouched = b.store.quotes().get(agent_scope(&b), second.id).await.unwrap();
    assert_eq!(untouched.status, QuoteStatus::Draft);
    assert!(b.store.policies().find_by_quote(second.id).await.unwrap().is_none());
}

#[tokio::test]
async fn bind_by_non_author_is_not_found() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    let colleague = identity(&b.store, "agent2@acme.test", Role::Agent, Some(&b.agency)).await;

    let err = b
        .store
        .policies()
        .bind(new_policy(&b, quote.id, colleague.id, "POL-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }), "got {err:?}");

    let still_draft = b.store.quotes().get(agent_scope(&b), quote.id).await.unwrap();
    assert_eq!(still_draft.status, QuoteStatus::Draft);
}

#[tokio::test]
async fn bind_with_ungranted_provider_is_forbidden() {
    let b = brokerage().await;
    let quote = draft_quote(&b).await;
    let ungranted = provider(&b.store, "Contoso").await;
    let mut policy = new_policy(&b, quote.id, b.agent.id, "POL-1");
    policy.provider_id = ungranted.id;

    let err = b.store.policies().bind(policy).await.unwrap_err();
    assert!(matches!(err, BrokerError::Forbidden { .. }), "got {err:?}");

    let still_draft = b.store.quotes().get(agent_scope(&b), quote.id).await.unwrap();
    assert_eq!(still_draft.status, QuoteStatus::Draft);
}

#[tokio::test]
async fn reports_count_by_status_within_scope() {
    let b = brokerage().await;
    let empty = b.store.reports().quote_counts(ScopeFilter::Global).await.unwrap();
    assert_eq!(empty.total_quotes, 0);

    let bound = draft_quote(&b).await;
    let presented = draft_quote(&b).await;
    draft_quote(&b).await;
    b.store
        .quotes()
        .update(
            agent_scope(&b),
            presented.id,
            &[QuoteStatus::Draft],
            UpdateQuote {
                status: Some(QuoteStatus::Presented),
                metadata: None,
            },
        )
        .await
        .unwrap();
    b.store
        .policies()
        .bind(new_policy(&b, bound.id, b.agent.id, "POL-1"))
        .await
        .unwrap();

    let quotes = b.store.reports().quote_counts(agent_scope(&b)).await.unwrap();
    assert_eq!(quotes.total_quotes, 3);
    assert_eq!(quotes.draft_quotes, 1);
    assert_eq!(quotes.presented_quotes, 1);
    assert_eq!(quotes.bound_quotes, 1);

    let policies = b
        .store
        .reports()
        .policy_counts(ScopeFilter::Agency {
            agency_id: b.agency.id,
        })
        .await
        .unwrap();
    assert_eq!(policies.total_policies, 1);
    assert_eq!(policies.active_policies, 1);

    let rival = b
        .store
        .reports()
        .quote_counts(ScopeFilter::Agency {
            agency_id: b.rival.id,
        })
        .await
        .unwrap();
    assert_eq!(rival.total_quotes, 0);

    assert_eq!(b.store.reports().customer_count(b.agency.id).await.unwrap(), 1);
}
