//! Integration tests for the authentication service.

use agencydesk_auth::config::AuthConfig;
use agencydesk_auth::service::{AuthService, LoginInput};
use agencydesk_auth::token;
use agencydesk_core::error::BrokerError;
use agencydesk_core::models::agency::CreateAgency;
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{CreateUser, UserProfile};
use agencydesk_core::repository::{AgencyRepository, UserRepository};
use agencydesk_db::repository::{
    SurrealAgencyRepository, SurrealPasswordResetRepository, SurrealSessionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type TestAuth = AuthService<
    SurrealUserRepository<Db>,
    SurrealSessionRepository<Db>,
    SurrealPasswordResetRepository<Db>,
>;

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-secret".into(),
        jwt_issuer: "agencydesk-test".into(),
        ..AuthConfig::default()
    }
}

/// Spin up in-memory DB, run migrations, create an agency and an agent.
async fn setup() -> (TestAuth, SurrealUserRepository<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    agencydesk_db::run_migrations(&db).await.unwrap();

    let agency = SurrealAgencyRepository::new(db.clone())
        .create(CreateAgency {
            name: "Acme Insurance".into(),
            agent_code: None,
            metadata: None,
        })
        .await
        .unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let user = users
        .create(CreateUser {
            first_name: "Alice".into(),
            last_name: "Agent".into(),
            email: "alice@example.com".into(),
            password: "correct-horse-battery".into(),
            role: Role::Agent,
            agency_id: Some(agency.id),
            location_id: None,
            profile: UserProfile::default(),
            metadata: None,
        })
        .await
        .unwrap();

    let svc = AuthService::new(
        users.clone(),
        SurrealSessionRepository::new(db.clone()),
        SurrealPasswordResetRepository::new(db),
        test_config(),
    );
    (svc, users, user.id)
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_issues_token_for_identity() {
    let (svc, _, user_id) = setup().await;

    let out = svc
        .login(login_input("alice@example.com", "correct-horse-battery"))
        .await
        .unwrap();

    assert_eq!(out.user.id, user_id);
    assert_eq!(out.expires_in, 86_400);

    let claims = token::decode_token(&out.token, &test_config()).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.role, "Agent");
    assert_eq!(claims.iss, "agencydesk-test");
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
    let (svc, _, _) = setup().await;
    assert!(
        svc.login(login_input("ALICE@example.com", "correct-horse-battery"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let (svc, _, _) = setup().await;

    let wrong = svc
        .login(login_input("alice@example.com", "wrong-password"))
        .await
        .unwrap_err();
    let unknown = svc
        .login(login_input("nobody@example.com", "irrelevant"))
        .await
        .unwrap_err();

    assert!(matches!(wrong, BrokerError::Unauthenticated { .. }));
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn verify_accepts_live_session() {
    let (svc, _, user_id) = setup().await;
    let out = svc
        .login(login_input("alice@example.com", "correct-horse-battery"))
        .await
        .unwrap();

    let credential = svc.verify(&out.token).await.unwrap();
    assert_eq!(credential.user_id, user_id);
    assert_eq!(credential.role, Role::Agent);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let (svc, _, _) = setup().await;
    let out = svc
        .login(login_input("alice@example.com", "correct-horse-battery"))
        .await
        .unwrap();

    svc.logout(&out.token).await.unwrap();

    let err = svc.verify(&out.token).await.unwrap_err();
    assert!(matches!(err, BrokerError::Unauthenticated { .. }));
}

#[tokio::test]
async fn token_without_session_is_rejected() {
    let (svc, _, user_id) = setup().await;
    let forged = token::issue_access_token(user_id, Role::MasterAdmin, &test_config()).unwrap();

    let err = svc.verify(&forged).await.unwrap_err();
    assert!(matches!(err, BrokerError::Unauthenticated { .. }));
}

#[tokio::test]
async fn reset_token_cannot_authenticate_requests() {
    let (svc, _, _) = setup().await;
    let issued = svc.request_password_reset("alice@example.com").await.unwrap();

    let err = svc.verify(&issued.token).await.unwrap_err();
    assert!(matches!(err, BrokerError::Unauthenticated { .. }));
}

#[tokio::test]
async fn password_reset_round_trip() {
    let (svc, _, user_id) = setup().await;
    let issued = svc.request_password_reset("alice@example.com").await.unwrap();
    assert_eq!(issued.user_id, user_id);

    svc.reset_password(&issued.token, "brand-new-secret".into())
        .await
        .unwrap();

    assert!(
        svc.login(login_input("alice@example.com", "correct-horse-battery"))
            .await
            .is_err()
    );
    assert!(
        svc.login(login_input("alice@example.com", "brand-new-secret"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let (svc, _, _) = setup().await;
    let issued = svc.request_password_reset("alice@example.com").await.unwrap();

    svc.reset_password(&issued.token, "first-new-secret".into())
        .await
        .unwrap();
    let err = svc
        .reset_password(&issued.token, "second-new-secret".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Unauthenticated { .. }));
}

#[tokio::test]
async fn short_password_keeps_reset_token_usable() {
    let (svc, _, _) = setup().await;
    let issued = svc.request_password_reset("alice@example.com").await.unwrap();

    let err = svc
        .reset_password(&issued.token, "short".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Validation { .. }));

    svc.reset_password(&issued.token, "long-enough-now".into())
        .await
        .unwrap();
}

#[tokio::test]
async fn reset_for_unknown_email_is_not_found() {
    let (svc, _, _) = setup().await;
    let err = svc
        .request_password_reset("nobody@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { .. }));
}

#[tokio::test]
async fn pepper_must_match_between_store_and_verifier() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    agencydesk_db::run_migrations(&db).await.unwrap();

    let pepper = "server-side-pepper".to_string();
    let users = SurrealUserRepository::with_pepper(db.clone(), pepper.clone());
    users
        .create(CreateUser {
            first_name: "Root".into(),
            last_name: "Admin".into(),
            email: "root@example.com".into(),
            password: "peppered-password".into(),
            role: Role::MasterAdmin,
            agency_id: None,
            location_id: None,
            profile: UserProfile::default(),
            metadata: None,
        })
        .await
        .unwrap();

    let peppered = AuthService::new(
        users.clone(),
        SurrealSessionRepository::new(db.clone()),
        SurrealPasswordResetRepository::new(db.clone()),
        AuthConfig {
            pepper: Some(pepper),
            ..test_config()
        },
    );
    assert!(
        peppered
            .login(login_input("root@example.com", "peppered-password"))
            .await
            .is_ok()
    );

    let plain = AuthService::new(
        users,
        SurrealSessionRepository::new(db.clone()),
        SurrealPasswordResetRepository::new(db),
        test_config(),
    );
    assert!(
        plain
            .login(login_input("root@example.com", "peppered-password"))
            .await
            .is_err()
    );
}
