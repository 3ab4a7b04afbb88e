#![allow(clippy::unwrap_used)]
// End-to-end flows through `Backend` against a wiremock backend.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forgewatch_core::{
    AlertPanel, Backend, BackendConfig, ChatThread, CoreError, DashboardState, MemoryStorage,
    ResourceId, Route, Severity, Transition, guard,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Backend) {
    let server = MockServer::start().await;
    let config = BackendConfig::from_url(&server.uri()).unwrap();
    let backend = Backend::new(config, Arc::new(MemoryStorage::new())).unwrap();
    (server, backend)
}

async fn login(server: &MockServer, backend: &Backend) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "accessToken": "tok-flow",
                "user": { "id": 7, "username": "ops", "email": "ops@plant.io" }
            }
        })))
        .mount(server)
        .await;
    backend
        .login("ops@plant.io", &SecretString::from("hunter22".to_owned()))
        .await
        .unwrap();
}

fn machines_page(ids: &[&str], current: u32, total: u32) -> serde_json::Value {
    let data: Vec<_> = ids
        .iter()
        .map(|id| json!({ "machine_id": id, "type": "L", "condition": { "status": "HEALTHY" } }))
        .collect();
    json!({
        "data": data,
        "pagination": {
            "current_page": current,
            "total_pages": total,
            "total_records": u64::from(total) * 10,
            "has_prev": current > 1,
            "has_next": current < total
        }
    })
}

// ── Login → dashboard ───────────────────────────────────────────────

#[tokio::test]
async fn login_then_dashboard_loads() {
    let (server, backend) = setup().await;
    assert_eq!(guard(Route::Dashboard, backend.auth()), Route::Login);

    login(&server, &backend).await;
    assert!(backend.auth().is_authenticated());
    assert_eq!(guard(Route::Dashboard, backend.auth()), Route::Dashboard);
    assert!(backend.client().session().token().unwrap().is_some());

    Mock::given(method("GET"))
        .and(path("/api/machines/statistics"))
        .and(header("authorization", "Bearer tok-flow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "total_unique_machines": 20,
                "type_l_count_unique": 12,
                "type_m_count_unique": 6,
                "type_h_count_unique": 2,
                "avg_air_temp": "300.12"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/machines"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(header("authorization", "Bearer tok-flow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machines_page(&["M-1", "M-2"], 1, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let stats = backend.statistics().await.unwrap();
    assert_eq!(stats.total_unique_machines, 20);

    let mut dashboard = DashboardState::new(backend.page_size());
    let ticket = dashboard.start();
    let page = backend.fetch_machines(&ticket.query).await;
    assert!(dashboard.accept(ticket.seq, page));
    assert_eq!(dashboard.machines().len(), 2);
    assert_eq!(
        dashboard.summary().as_deref(),
        Some("Page 1 of 2 (20 total records)")
    );
}

#[tokio::test]
async fn search_dispatches_to_search_endpoint() {
    let (server, backend) = setup().await;
    login(&server, &backend).await;

    Mock::given(method("GET"))
        .and(path("/api/machines/search"))
        .and(query_param("name", "M-9"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machines_page(&["M-9"], 1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = DashboardState::new(10);
    dashboard.start();
    let ticket = dashboard
        .apply(Transition::SetSearch("M-9".into()))
        .unwrap();
    let page = backend.fetch_machines(&ticket.query).await;
    assert!(dashboard.accept(ticket.seq, page));
    assert_eq!(dashboard.machines()[0].machine_id, "M-9");
}

#[tokio::test]
async fn missing_machine_is_not_found() {
    let (server, backend) = setup().await;
    login(&server, &backend).await;

    Mock::given(method("GET"))
        .and(path("/api/machines/M-404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Machine not found" })),
        )
        .mount(&server)
        .await;

    let err = backend.machine("M-404").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

// ── Profile ─────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_profile_refresh_keeps_cached_user() {
    let (server, backend) = setup().await;
    login(&server, &backend).await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(backend.refresh_profile().await.is_err());
    let user = backend.auth().user().unwrap();
    assert_eq!(user.username.as_deref(), Some("ops"));
}

#[tokio::test]
async fn logout_clears_user_and_token() {
    let (server, backend) = setup().await;
    login(&server, &backend).await;

    backend.logout().unwrap();
    assert!(!backend.auth().is_authenticated());
    assert!(backend.client().session().token().unwrap().is_none());
    assert_eq!(guard(Route::MachineDetail("M-1".into()), backend.auth()), Route::Login);
}

// ── Alerts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_flips_entry_and_refetches_under_filter() {
    let (server, backend) = setup().await;
    login(&server, &backend).await;

    Mock::given(method("GET"))
        .and(path("/api/alerts/severity/high"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 1, "severity": "HIGH", "resolved": false, "type": "ML_FAILURE_PREDICTED" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/1/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut panel = AlertPanel::new();
    let ticket = panel.set_filter(Some(Severity::High)).unwrap();
    let alerts = backend.alerts(ticket.severity).await;
    panel.accept_list(ticket.seq, alerts);
    assert_eq!(panel.unresolved_count(), 1);

    let id = ResourceId::Number(1);
    assert!(panel.begin_resolve(&id));
    let outcome = backend.resolve_alert(&id).await;
    let refetch = panel.finish_resolve(&id, outcome).unwrap();
    assert!(panel.find(&id).unwrap().resolved);
    assert_eq!(refetch.severity, Some(Severity::High));
}

// ── Chat ────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_send_then_history() {
    let (server, backend) = setup().await;
    login(&server, &backend).await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({ "prompt": "status of M-1?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "message": "M-1 is healthy." }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "message": [ { "message": "status of M-1?", "response": "M-1 is healthy." } ] }
        })))
        .mount(&server)
        .await;

    let mut thread = ChatThread::new();
    let ticket = thread.begin_send("status of M-1?").unwrap();
    let reply = backend.send_chat(&ticket.prompt).await;
    assert!(thread.finish_send(ticket.seq, reply));

    let seq = thread.begin_history();
    assert!(thread.accept_history(seq, backend.chat_history().await));
    assert_eq!(thread.sessions().len(), 1);
    assert_eq!(thread.sessions()[0].title, "status of M-1?");
}
