//! End-to-end tests driving the router in-process.

use agencydesk_auth::AuthConfig;
use agencydesk_db::{DbConfig, DbManager, run_migrations};
use agencydesk_server::bootstrap::seed_master_admin;
use agencydesk_server::{AdminSeed, AppState, router};
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const ROOT_EMAIL: &str = "root@agencydesk.test";
const PASSWORD: &str = "correct horse";

struct TestApp {
    state: AppState,
    router: Router,
}

async fn app() -> TestApp {
    let db = DbManager::connect(&DbConfig::in_memory("test"))
        .await
        .unwrap();
    run_migrations(db.client()).await.unwrap();

    let state = AppState::new(
        db.client().clone(),
        AuthConfig {
            jwt_secret: "test-secret".into(),
            ..AuthConfig::default()
        },
    );
    let seed = AdminSeed {
        email: ROOT_EMAIL.into(),
        password: PASSWORD.into(),
        first_name: "Root".into(),
        last_name: "Admin".into(),
    };
    seed_master_admin(state.store.as_ref(), &seed).await.unwrap();

    TestApp {
        router: router(state.clone()),
        state,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {email}: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

fn id(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

/// An agency with an admin, an agent and one customer, plus a provider
/// granted to it and a coverage.
struct Office {
    master: String,
    admin: String,
    agent: String,
    customer_id: String,
    provider_id: String,
    coverage_id: String,
}

async fn office(app: &TestApp, name: &str) -> Office {
    let master = app.login(ROOT_EMAIL, PASSWORD).await;
    let domain = name.to_lowercase();

    let (status, agency) = app
        .post("/api/master-admin/agencies", &master, json!({ "name": name }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{agency}");
    let agency_id = id(&agency);

    let admin_email = format!("admin@{domain}.test");
    let (status, body) = app
        .post(
            "/api/master-admin/users",
            &master,
            json!({
                "role": "AgencyAdmin",
                "agency_id": agency_id,
                "first_name": "Ada",
                "last_name": name,
                "email": admin_email,
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let admin = app.login(&admin_email, PASSWORD).await;

    let agent_email = format!("agent@{domain}.test");
    let (status, body) = app
        .post(
            "/api/agency-admin/agents",
            &admin,
            json!({
                "first_name": "Gus",
                "last_name": name,
                "email": agent_email,
                "password": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["role"], "Agent");
    assert_eq!(body["agency_id"], agency_id.as_str());
    let agent = app.login(&agent_email, PASSWORD).await;

    let (status, customer) = app
        .post(
            "/api/agent/customers",
            &agent,
            json!({
                "first_name": "Carla",
                "last_name": name,
                "email": format!("carla@{domain}.test"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{customer}");

    let (status, provider) = app
        .post(
            "/api/master-admin/providers",
            &master,
            json!({ "name": format!("{name} Mutual"), "contact_info": "claims@mutual.test" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{provider}");
    let provider_id = id(&provider);
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/master-admin/agencies/{agency_id}/providers/{provider_id}"),
            Some(&master),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, coverage) = app
        .post(
            "/api/master-admin/coverages",
            &master,
            json!({ "name": format!("{name} Liability") }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{coverage}");

    Office {
        master,
        admin,
        agent,
        customer_id: id(&customer),
        provider_id,
        coverage_id: id(&coverage),
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = app().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_returns_token_and_profile() {
    let app = app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ROOT_EMAIL, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["profile"]["role"], "MasterAdmin");
    assert!(body["profile"].get("password_hash").is_none());

    for (email, password) in [(ROOT_EMAIL, "wrong password"), ("nobody@x.test", PASSWORD)] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    }
}

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let app = app().await;
    let (status, _) = app.send(Method::GET, "/api/agent/quotes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/agent/quotes", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/profile/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_groups_reject_other_roles() {
    let app = app().await;
    let acme = office(&app, "Acme").await;

    let (status, _) = app.get("/api/master-admin/agencies", &acme.agent).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/agent/quotes", &acme.master).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/agency-admin/locations", &acme.agent).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/agency-admin/locations", &acme.admin).await;
    assert_eq!(status, StatusCode::OK);
    let (status, me) = app.get("/api/profile/me", &acme.agent).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "agent@acme.test");
}

#[tokio::test]
async fn other_tenants_records_are_not_found() {
    let app = app().await;
    let acme = office(&app, "Acme").await;
    let globex = office(&app, "Globex").await;

    let uri = format!("/api/agent/customers/{}", acme.customer_id);
    let (status, _) = app.get(&uri, &acme.agent).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.get(&uri, &globex.agent).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, customers) = app.get("/api/agent/customers", &globex.agent).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers["total"], 1);

    // A customer id under the agent collection is not an agent.
    let (status, _) = app
        .get(
            &format!("/api/agency-admin/agents/{}", acme.customer_id),
            &acme.admin,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bind_creates_one_policy() {
    let app = app().await;
    let acme = office(&app, "Acme").await;

    let (status, quote) = app
        .post(
            "/api/agent/quotes",
            &acme.agent,
            json!({ "customer_id": acme.customer_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{quote}");
    assert_eq!(quote["status"], "Draft");
    let quote_id = id(&quote);

    let (status, item) = app
        .post(
            &format!("/api/agent/quotes/{quote_id}/line-items"),
            &acme.agent,
            json!({
                "provider_id": acme.provider_id,
                "coverage_id": acme.coverage_id,
                "price": 812.5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");

    let (status, item) = app
        .post(
            "/api/agent/quote-line-items",
            &acme.agent,
            json!({
                "quote_id": quote_id,
                "provider_id": acme.provider_id,
                "coverage_id": acme.coverage_id,
                "price": 120.0,
                "deductible_amount": "250",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");
    assert_eq!(item["quote_id"], quote_id.as_str());
    let (_, items) = app
        .get(
            &format!("/api/agent/quote-line-items?quote_id={quote_id}"),
            &acme.agent,
        )
        .await;
    assert_eq!(items["total"], 2);

    let bind = json!({
        "quote_id": quote_id,
        "provider_id": acme.provider_id,
        "effective_date": "2026-11-01",
        "expiration_date": "2027-11-01",
    });
    let (status, policy) = app
        .post("/api/agent/policies", &acme.agent, bind.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{policy}");
    assert_eq!(policy["status"], "Active");
    assert_eq!(policy["customer_id"], acme.customer_id.as_str());
    assert!(policy["policy_number"].as_str().unwrap().starts_with("POL-"));

    let (_, quote) = app
        .get(&format!("/api/agent/quotes/{quote_id}"), &acme.agent)
        .await;
    assert_eq!(quote["status"], "Bound");

    let (status, _) = app
        .post("/api/agent/policies", &acme.agent, bind)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, linked) = app
        .get(&format!("/api/agent/quotes/{quote_id}/policy"), &acme.agent)
        .await;
    assert_eq!(linked["id"], policy["id"]);

    let (_, policies) = app.get("/api/agent/policies", &acme.agent).await;
    assert_eq!(policies["total"], 1);

    let (status, summary) = app.get("/api/agent/reports", &acme.agent).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["policies"]["active_policies"], 1);
    assert_eq!(summary["quotes"]["bound_quotes"], 1);
    assert_eq!(summary["customer_count"], 1);

    let (_, report) = app.get("/api/master-admin/reports/quotes", &acme.master).await;
    assert_eq!(report["bound_quotes"], 1);
}

#[tokio::test]
async fn malformed_input_is_400() {
    let app = app().await;
    let acme = office(&app, "Acme").await;

    let (_, quote) = app
        .post(
            "/api/agent/quotes",
            &acme.agent,
            json!({ "customer_id": acme.customer_id }),
        )
        .await;
    let (status, body) = app
        .post(
            "/api/agent/policies",
            &acme.agent,
            json!({
                "quote_id": id(&quote),
                "provider_id": acme.provider_id,
                "effective_date": "2027-01-01",
                "expiration_date": "2026-01-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app.get("/api/agent/quotes/not-a-uuid", &acme.agent).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/agent/quotes", &acme.agent, json!({ "customer": 7 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get("/api/agent/vehicles?limit=lots", &acme.agent)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = app().await;
    let token = app.login(ROOT_EMAIL, PASSWORD).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/master-admin/auth/logout",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/master-admin/agencies", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = app().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": ROOT_EMAIL })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": "ghost@agencydesk.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let issued = app
        .state
        .auth
        .request_password_reset(ROOT_EMAIL)
        .await
        .unwrap();
    let uri = format!("/api/auth/reset-password/{}", issued.token);
    let body = json!({ "newPassword": "battery staple" });

    let (status, _) = app
        .send(Method::PUT, &uri, None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(Method::PUT, &uri, None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ROOT_EMAIL, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    app.login(ROOT_EMAIL, "battery staple").await;
}
