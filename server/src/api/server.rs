//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::auth::{AuthManager, AuthState, require_auth};
use super::middleware::{self, AllowedOrigins};
use super::routes::{auth, health, leads};
use crate::core::CoreApp;
use crate::core::constants::{AUTH_BODY_LIMIT, DEFAULT_BODY_LIMIT};
use crate::data::SqlStore;

/// Assemble the full application router
pub fn build_router(
    store: Arc<dyn SqlStore>,
    auth_manager: Arc<AuthManager>,
    allowed_origins: &AllowedOrigins,
) -> Router {
    let auth_routes = auth::routes(auth_manager.clone(), store.clone())
        .layer(DefaultBodyLimit::max(AUTH_BODY_LIMIT));

    let lead_routes = leads::routes(store).layer(axum::middleware::from_fn_with_state(
        AuthState { auth_manager },
        require_auth,
    ));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/leads", lead_routes)
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(
            &app.config.cors_origins,
            &app.config.server.host,
            app.config.server.port,
        );
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until the shutdown signal fires; returns CoreApp for cleanup
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        tracing::debug!(origins = ?allowed_origins.origins(), "CORS origins");

        let store: Arc<dyn SqlStore> = app.database.clone();
        let router = build_router(store, app.auth.clone(), &allowed_origins);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "LeadDesk API listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(app.shutdown.wait())
            .await?;

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use sqlx::error::ErrorKind;
    use tower::ServiceExt;

    use crate::api::auth::password::hash_password;
    use crate::data::repositories::user::PublicUser;
    use crate::data::testing::{Reply, ScriptedStore};

    const SECRET: &str = "router-test-secret-0123456789";

    struct Harness {
        store: Arc<ScriptedStore>,
        router: Router,
        auth: Arc<AuthManager>,
    }

    fn harness(replies: Vec<Reply>) -> Harness {
        let store = ScriptedStore::new(replies);
        let auth = Arc::new(AuthManager::new(SECRET, 3600));
        let origins = AllowedOrigins::new(&[], "127.0.0.1", 4000);
        let router = build_router(store.clone(), auth.clone(), &origins);
        Harness {
            store,
            router,
            auth,
        }
    }

    impl Harness {
        fn session_cookie(&self) -> String {
            let user = PublicUser {
                id: 7,
                email: "owner@example.com".to_string(),
            };
            format!("token={}", self.auth.issue_session(&user).unwrap())
        }

        async fn send(&self, req: Request<Body>) -> Response {
            self.router.clone().oneshot(req).await.unwrap()
        }

        async fn authed(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::COOKIE, self.session_cookie());
            let body = match body {
                Some(v) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(v.to_string())
                }
                None => Body::empty(),
            };
            self.send(builder.body(body).unwrap()).await
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn encode_brackets(query: &str) -> String {
        query.replace('[', "%5B").replace(']', "%5D")
    }

    fn lead_row(id: i64) -> Value {
        json!({
            "id": id,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "status": "new",
            "score": 42
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = harness(vec![]);
        let resp = h
            .send(Request::get("/api/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let h = harness(vec![]);
        let resp = h
            .send(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn leads_require_session() {
        let h = harness(vec![]);
        let resp = h
            .send(Request::get("/api/leads").body(Body::empty()).unwrap())
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["code"], "AUTH_REQUIRED");

        let resp = h
            .send(
                Request::get("/api/leads")
                    .header(header::COOKIE, "token=not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["code"], "TOKEN_INVALID");
        assert!(h.store.statements().is_empty());
    }

    #[tokio::test]
    async fn list_compiles_filters_and_paginates() {
        let h = harness(vec![Reply::Count(45), Reply::Rows(vec![lead_row(1)])]);
        let query = encode_brackets(
            "filter[status][in][]=new&filter[status][in][]=qualified&filter[score][gt]=10&page=2&limit=500&order_by=score:asc",
        );
        let resp = h.authed("GET", &format!("/api/leads?{query}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["total"], 45);
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["totalPages"], 1);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let stmts = h.store.statements();
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            stmts[0].sql,
            r#"SELECT COUNT(*) FROM leads WHERE "status" IN ($1, $2) AND "score" > $3"#
        );
        assert!(stmts[1].sql.ends_with(r#"ORDER BY "score" ASC LIMIT $4 OFFSET $5"#));
        assert_eq!(stmts[1].params.len(), 5);
    }

    #[tokio::test]
    async fn list_rejects_unknown_field_before_store() {
        let h = harness(vec![]);
        let query = encode_brackets("filter[password][equals]=x");
        let resp = h.authed("GET", &format!("/api/leads?{query}"), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "INVALID_FILTER_COLUMN");
        assert!(h.store.statements().is_empty());
    }

    #[tokio::test]
    async fn list_rejects_unknown_operator() {
        let h = harness(vec![]);
        let query = encode_brackets("filter[score][approx]=3");
        let resp = h.authed("GET", &format!("/api/leads?{query}"), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "UNKNOWN_OPERATOR");
    }

    #[tokio::test]
    async fn create_lead_requires_names_and_email() {
        let h = harness(vec![]);
        let resp = h
            .authed("POST", "/api/leads", Some(json!({"first_name": "Ada"})))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(
            body["message"],
            "First name, last_name, and email are required."
        );
    }

    #[tokio::test]
    async fn create_lead_returns_row() {
        let h = harness(vec![Reply::Rows(vec![lead_row(3)])]);
        let resp = h
            .authed(
                "POST",
                "/api/leads",
                Some(json!({
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "email": "ada@example.com",
                    "score": 42
                })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(resp).await["id"], 3);
        assert!(h.store.statements()[0].sql.starts_with("INSERT INTO leads"));
    }

    #[tokio::test]
    async fn create_lead_duplicate_email() {
        let h = harness(vec![Reply::Fail(ErrorKind::UniqueViolation)]);
        let resp = h
            .authed(
                "POST",
                "/api/leads",
                Some(json!({"first_name": "A", "last_name": "B", "email": "a@b.com"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["message"],
            "Email already exists for a lead."
        );
    }

    #[tokio::test]
    async fn get_lead_found_and_missing() {
        let h = harness(vec![Reply::Rows(vec![lead_row(5)]), Reply::Rows(vec![])]);
        let resp = h.authed("GET", "/api/leads/5", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], 5);

        let resp = h.authed("GET", "/api/leads/6", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_lead_rejects_bad_id() {
        let h = harness(vec![]);
        let resp = h.authed("GET", "/api/leads/abc", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "INVALID_LEAD_ID");
    }

    #[tokio::test]
    async fn update_lead_partial() {
        let h = harness(vec![Reply::Rows(vec![lead_row(5)])]);
        let resp = h
            .authed("PUT", "/api/leads/5", Some(json!({"status": "won", "score": 90})))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stmts = h.store.statements();
        assert_eq!(
            stmts[0].sql,
            r#"UPDATE leads SET "status" = $1, "score" = $2, "updated_at" = NOW() WHERE "id" = $3 RETURNING *"#
        );
    }

    #[tokio::test]
    async fn update_lead_empty_body_rejected() {
        let h = harness(vec![]);
        let resp = h.authed("PUT", "/api/leads/5", Some(json!({}))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "EMPTY_UPDATE");
        assert!(h.store.statements().is_empty());
    }

    #[tokio::test]
    async fn update_lead_read_only_field_rejected() {
        let h = harness(vec![]);
        let resp = h
            .authed("PUT", "/api/leads/5", Some(json!({"created_at": "2024-01-01"})))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "READ_ONLY_FIELD");
    }

    #[tokio::test]
    async fn update_lead_missing() {
        let h = harness(vec![Reply::Rows(vec![])]);
        let resp = h
            .authed("PUT", "/api/leads/9", Some(json!({"city": "Paris"})))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_lead() {
        let h = harness(vec![Reply::Affected(1), Reply::Affected(0)]);
        let resp = h.authed("DELETE", "/api/leads/5", None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = h.authed("DELETE", "/api/leads/5", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_creates_user() {
        let h = harness(vec![Reply::Rows(vec![
            json!({"id": 1, "email": "new@example.com"}),
        ])]);
        let resp = h
            .send(post_json(
                "/api/auth/register",
                json!({"email": "new@example.com", "password": "hunter22"}),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(resp).await,
            json!({"id": 1, "email": "new@example.com"})
        );
        // password never reaches the store in clear text
        let params = &h.store.statements()[0].params;
        assert!(!format!("{params:?}").contains("hunter22"));
    }

    #[tokio::test]
    async fn register_duplicate_email() {
        let h = harness(vec![Reply::Fail(ErrorKind::UniqueViolation)]);
        let resp = h
            .send(post_json(
                "/api/auth/register",
                json!({"email": "a@b.com", "password": "pw"}),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Email already in use.");
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let h = harness(vec![]);
        let resp = h
            .send(post_json("/api/auth/register", json!({"email": "a@b.com"})))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["message"],
            "Email and password are required."
        );
    }

    #[tokio::test]
    async fn login_sets_cookie_and_me_reads_it() {
        let hash = hash_password("hunter22").unwrap();
        let h = harness(vec![Reply::Rows(vec![json!({
            "id": 11,
            "email": "a@b.com",
            "password_hash": hash
        })])]);

        let resp = h
            .send(post_json(
                "/api/auth/login",
                json!({"email": "a@b.com", "password": "hunter22"}),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        assert!(set_cookie.contains("SameSite=None"));

        let token_pair = set_cookie.split(';').next().unwrap().to_string();
        let resp = h
            .send(
                Request::get("/api/auth/me")
                    .header(header::COOKIE, token_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"id": 11, "email": "a@b.com"}));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let hash = hash_password("right").unwrap();
        let h = harness(vec![
            Reply::Rows(vec![json!({"id": 1, "email": "a@b.com", "password_hash": hash})]),
            Reply::Rows(vec![]),
        ]);

        let resp = h
            .send(post_json(
                "/api/auth/login",
                json!({"email": "a@b.com", "password": "wrong"}),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["message"], "Invalid credentials.");

        let resp = h
            .send(post_json(
                "/api/auth/login",
                json!({"email": "nobody@b.com", "password": "x"}),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_session() {
        let h = harness(vec![]);
        let resp = h
            .send(Request::get("/api/auth/me").body(Body::empty()).unwrap())
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let h = harness(vec![]);
        let resp = h
            .send(
                Request::post("/api/auth/logout")
                    .header(header::COOKIE, h.session_cookie())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
