//! API router.
//!
//! Three route groups sharing one `ApiContext`:
//! - public: account endpoints and the feature-flag read
//! - protected: everything under `/api/` for an authenticated user
//! - admin: `/api/admin/` behind the auth + admin guards
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` via `with_state`.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the full API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    let public = Router::new()
        .route("/signup", post(endpoints::accounts::signup))
        .route("/login", post(endpoints::accounts::login))
        .route("/logout", post(endpoints::accounts::logout))
        .route("/check-auth", get(endpoints::accounts::check_auth))
        .route("/api/feature-status", get(endpoints::flags::status))
        .with_state(ctx.clone());

    // Layers are applied from bottom (innermost) to top (outermost):
    // Extension must be outermost so the auth middleware can access ApiContext.
    let protected = Router::new()
        .route(
            "/api/medications",
            get(endpoints::medications::list).post(endpoints::medications::create),
        )
        .route("/api/medications/today", get(endpoints::medications::today))
        .route(
            "/api/medications/monthly",
            get(endpoints::medications::monthly),
        )
        .route(
            "/api/medications/reminders",
            get(endpoints::medications::reminders),
        )
        .route(
            "/api/medications/:id",
            delete(endpoints::medications::remove),
        )
        .route(
            "/api/medications/:id/status",
            put(endpoints::medications::set_status_for_medicine),
        )
        .route(
            "/api/reminders/:id/status",
            put(endpoints::medications::set_status),
        )
        .route("/api/my-medications", get(endpoints::medications::overview))
        .route(
            "/api/my-medications/search",
            get(endpoints::medications::search),
        )
        .route(
            "/api/doctors",
            get(endpoints::doctors::list).post(endpoints::doctors::create),
        )
        .route(
            "/api/doctors/:id",
            put(endpoints::doctors::update).delete(endpoints::doctors::remove),
        )
        .route("/api/dashboard-stats", get(endpoints::dashboard::stats))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let admin = Router::new()
        .route("/api/admin/users", get(endpoints::admin::list_users))
        .route(
            "/api/admin/users/:id",
            put(endpoints::admin::update_user).delete(endpoints::admin::delete_user),
        )
        .route(
            "/api/admin/medicines",
            get(endpoints::admin::list_medicines).post(endpoints::admin::create_medicine),
        )
        .route(
            "/api/admin/medicines/:id",
            put(endpoints::admin::update_medicine).delete(endpoints::admin::delete_medicine),
        )
        .route("/api/admin/reminders", get(endpoints::admin::list_reminders))
        .route(
            "/api/admin/reminders/:id",
            delete(endpoints::admin::delete_reminder),
        )
        .route("/api/admin/logs", get(endpoints::admin::logs))
        .route("/api/admin/reports/summary", get(endpoints::admin::summary))
        .route("/api/admin/feature", post(endpoints::flags::set_flag))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:5000"),
            HeaderValue::from_static("http://127.0.0.1:5000"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-user-id"),
        ])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Local;
    use tower::ServiceExt;

    fn test_core() -> (Arc<CoreState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (
            Arc::new(CoreState::with_db_path(dir.path().join("test.db"))),
            dir,
        )
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn send(core: &Arc<CoreState>, req: Request<Body>) -> axum::http::Response<Body> {
        api_router(core.clone()).oneshot(req).await.unwrap()
    }

    async fn signup(core: &Arc<CoreState>, name: &str, email: &str, role: &str) -> i64 {
        let body = format!(
            r#"{{"name":"{name}","email":"{email}","password":"hunter2","role":"{role}"}}"#
        );
        let response = send(core, json_request("POST", "/signup", None, &body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["user_id"].as_i64().unwrap()
    }

    async fn login(core: &Arc<CoreState>, email: &str) -> String {
        let body = format!(r#"{{"email":"{email}","password":"hunter2"}}"#);
        let response = send(core, json_request("POST", "/login", None, &body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        response_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn signup_then_duplicate_conflicts() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;

        let body = r#"{"name":"Other","email":"hana@example.com","password":"x"}"#;
        let response = send(&core, json_request("POST", "/signup", None, body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signup_requires_all_fields() {
        let (core, _dir) = test_core();
        let response = send(
            &core,
            json_request("POST", "/signup", None, r#"{"name":"No Email"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;

        let body = r#"{"email":"hana@example.com","password":"wrong"}"#;
        let response = send(&core, json_request("POST", "/login", None, body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn protected_routes_require_auth() {
        let (core, _dir) = test_core();
        for uri in [
            "/api/medications",
            "/api/medications/today",
            "/api/my-medications",
            "/api/doctors",
            "/api/dashboard-stats",
        ] {
            let response = send(&core, bare_request("GET", uri, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn create_series_reports_occurrence_count() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let body = r#"{"name":"Aspirin","dosage":"100mg","time":"08:00",
                       "start_date":"2025-01-01","end_date":"2025-01-03","frequency":"daily"}"#;
        let response = send(&core, json_request("POST", "/api/medications", Some(&token), body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = response_json(response).await;
        assert_eq!(json["reminders_created"], 3);
        assert!(json["medicine_id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn create_series_validates_dates() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let body = r#"{"name":"Aspirin","dosage":"100mg","time":"08:00","start_date":"01/01/2025"}"#;
        let response = send(&core, json_request("POST", "/api/medications", Some(&token), body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn today_flow_marks_dose_taken() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        // Schedule for the end of today so the sweep does not mark it missed.
        let today = Local::now().date_naive();
        let body = format!(
            r#"{{"name":"Aspirin","dosage":"100mg","time":"23:59","start_date":"{today}","end_date":"{today}"}}"#
        );
        let response =
            send(&core, json_request("POST", "/api/medications", Some(&token), &body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            send(&core, bare_request("GET", "/api/medications/today", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let meds = json["medications"].as_array().unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0]["status"], "pending");
        let reminder_id = meds[0]["reminder_id"].as_i64().unwrap();

        let response = send(
            &core,
            json_request(
                "PUT",
                &format!("/api/reminders/{reminder_id}/status"),
                Some(&token),
                r#"{"status":"taken"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response =
            send(&core, bare_request("GET", "/api/medications/today", Some(&token))).await;
        let json = response_json(response).await;
        assert_eq!(json["medications"][0]["status"], "completed");
    }

    #[tokio::test]
    async fn foreign_users_cannot_touch_each_others_data() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        signup(&core, "Omar", "omar@example.com", "client").await;
        let hana = login(&core, "hana@example.com").await;
        let omar = login(&core, "omar@example.com").await;

        let today = Local::now().date_naive();
        let body = format!(
            r#"{{"name":"Aspirin","dosage":"100mg","time":"23:59","start_date":"{today}"}}"#
        );
        let response =
            send(&core, json_request("POST", "/api/medications", Some(&hana), &body)).await;
        let medicine_id = response_json(response).await["medicine_id"].as_i64().unwrap();

        let response = send(
            &core,
            bare_request("DELETE", &format!("/api/medications/{medicine_id}"), Some(&omar)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &core,
            json_request(
                "PUT",
                &format!("/api/medications/{medicine_id}/status"),
                Some(&omar),
                r#"{"status":"taken"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_medicine_empties_reminder_listing() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let body = r#"{"name":"Aspirin","dosage":"100mg","time":"08:00",
                       "start_date":"2025-01-01","end_date":"2025-01-05"}"#;
        let response =
            send(&core, json_request("POST", "/api/medications", Some(&token), body)).await;
        let medicine_id = response_json(response).await["medicine_id"].as_i64().unwrap();

        let response = send(
            &core,
            bare_request("DELETE", &format!("/api/medications/{medicine_id}"), Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response =
            send(&core, bare_request("GET", "/api/medications/reminders", Some(&token))).await;
        let json = response_json(response).await;
        assert_eq!(json["reminders"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn monthly_requires_year_and_month() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let response = send(
            &core,
            bare_request("GET", "/api/medications/monthly?year=2025", Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn monthly_groups_created_series() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let body = r#"{"name":"Vitamin D","dosage":"1000IU","time":"07:00",
                       "start_date":"2025-01-05","end_date":"2025-01-06"}"#;
        send(&core, json_request("POST", "/api/medications", Some(&token), body)).await;

        let response = send(
            &core,
            bare_request(
                "GET",
                "/api/medications/monthly?year=2025&month=1",
                Some(&token),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["medications"]["5"][0]["time"], "morning");
        assert_eq!(json["medications"]["5"][0]["icon"], "fa-apple-alt");
        assert_eq!(json["medications"]["6"][0]["name"], "Vitamin D");
    }

    #[tokio::test]
    async fn admin_routes_reject_clients() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let response = send(&core, bare_request("GET", "/api/admin/users", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_routes_accept_admins() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        signup(&core, "Root", "root@example.com", "admin").await;
        let token = login(&core, "root@example.com").await;

        let response = send(&core, bare_request("GET", "/api/admin/users", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["users"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn user_id_header_authenticates_after_role_check() {
        let (core, _dir) = test_core();
        let admin_id = signup(&core, "Root", "root@example.com", "admin").await;

        let req = Request::builder()
            .method("GET")
            .uri("/api/admin/reports/summary")
            .header("X-User-Id", admin_id.to_string())
            .body(Body::empty())
            .unwrap();
        let response = send(&core, req).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["users"], 1);
    }

    #[tokio::test]
    async fn feature_flags_round_trip() {
        let (core, _dir) = test_core();

        // Publicly readable, initially empty.
        let response = send(&core, bare_request("GET", "/api/feature-status", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, serde_json::json!({}));

        signup(&core, "Root", "root@example.com", "admin").await;
        let token = login(&core, "root@example.com").await;

        let response = send(
            &core,
            json_request(
                "POST",
                "/api/admin/feature",
                Some(&token),
                r#"{"key":"calendar","value":true}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&core, bare_request("GET", "/api/feature-status", None)).await;
        let json = response_json(response).await;
        assert_eq!(json["calendar"], "1");
    }

    #[tokio::test]
    async fn check_auth_reflects_session_state() {
        let (core, _dir) = test_core();
        let response = send(&core, bare_request("GET", "/check-auth", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["authenticated"], false);

        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let response = send(&core, bare_request("GET", "/check-auth", Some(&token))).await;
        let json = response_json(response).await;
        assert_eq!(json["authenticated"], true);
        assert_eq!(json["user"]["name"], "Hana");
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let response = send(&core, bare_request("POST", "/logout", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&core, bare_request("GET", "/api/medications", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_authenticates() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let req = Request::builder()
            .method("GET")
            .uri("/api/medications")
            .header("Cookie", format!("session={token}"))
            .body(Body::empty())
            .unwrap();
        let response = send(&core, req).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_stats_shape() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let response = send(&core, bare_request("GET", "/api/dashboard-stats", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["active_medications"].is_number());
        assert!(json["upcoming_doses"].is_number());
        assert!(json["adherence_rate"].is_number());
    }

    #[tokio::test]
    async fn doctors_crud_round_trip() {
        let (core, _dir) = test_core();
        signup(&core, "Hana", "hana@example.com", "client").await;
        let token = login(&core, "hana@example.com").await;

        let response = send(
            &core,
            json_request(
                "POST",
                "/api/doctors",
                Some(&token),
                r#"{"name":"Dr. Salem","specialty":"Cardiology","phone":"555-0100"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let doctor_id = response_json(response).await["doctor_id"].as_i64().unwrap();

        let response = send(
            &core,
            json_request(
                "PUT",
                &format!("/api/doctors/{doctor_id}"),
                Some(&token),
                r#"{"name":"Dr. Salem","specialty":"Internal Medicine"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&core, bare_request("GET", "/api/doctors", Some(&token))).await;
        let json = response_json(response).await;
        assert_eq!(json["doctors"][0]["specialty"], "Internal Medicine");

        let response = send(
            &core,
            bare_request("DELETE", &format!("/api/doctors/{doctor_id}"), Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&core, bare_request("GET", "/api/doctors", Some(&token))).await;
        let json = response_json(response).await;
        assert_eq!(json["doctors"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn not_found_for_unknown_route() {
        let (core, _dir) = test_core();
        let response = send(&core, bare_request("GET", "/api/nonexistent", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
