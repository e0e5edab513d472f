use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest,
            RegisterResponse,
        },
        status::RpcError,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/is-admin", post(is_admin))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_credentials(email: &str, password: &str) -> Result<(), RpcError> {
    if email.is_empty() {
        return Err(RpcError::invalid_argument("email is required"));
    }
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(RpcError::invalid_argument("invalid email"));
    }
    if password.is_empty() {
        return Err(RpcError::invalid_argument("password is required"));
    }
    Ok(())
}

/// Unreadable bodies get the same error shape as failed validation; the
/// parser message stays in the logs.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected request body");
        RpcError::invalid_argument("invalid request body")
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, RpcError> {
    let mut payload = body(payload)?;
    payload.email = payload.email.trim().to_string();
    validate_credentials(&payload.email, &payload.password)?;

    let ctx = state.request_context();
    let user_id = state
        .auth
        .register(&ctx, &payload.email, &payload.password)
        .await?;
    Ok(Json(RegisterResponse { user_id }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, RpcError> {
    let mut payload = body(payload)?;
    payload.email = payload.email.trim().to_string();
    validate_credentials(&payload.email, &payload.password)?;
    if payload.app_id == 0 {
        return Err(RpcError::invalid_argument("app_id is required"));
    }

    let ctx = state.request_context();
    let token = state
        .auth
        .login(&ctx, &payload.email, &payload.password, payload.app_id)
        .await?;
    Ok(Json(LoginResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn is_admin(
    State(state): State<AppState>,
    payload: Result<Json<IsAdminRequest>, JsonRejection>,
) -> Result<Json<IsAdminResponse>, RpcError> {
    let payload = body(payload)?;
    if payload.user_id <= 0 {
        return Err(RpcError::invalid_argument("user_id is required"));
    }

    let ctx = state.request_context();
    let is_admin = state.auth.is_admin(&ctx, payload.user_id).await?;
    Ok(Json(IsAdminResponse { is_admin }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{jwt, status::Code},
        storage::memory::MemoryStorage,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    const APP_SECRET: &str = "test-secret";

    async fn app() -> (Router, Arc<MemoryStorage>) {
        let (state, store) = AppState::fake().await;
        (crate::app::build_app(state), store)
    }

    async fn call(app: &Router, uri: &str, body: serde_json::Value) -> Response {
        let req = Request::post(format!("/api/v1{uri}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.clone().oneshot(req).await.unwrap()
    }

    async fn read<T: DeserializeOwned>(res: Response) -> T {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("ada example.com"));
    }

    #[tokio::test]
    async fn register_then_login_over_http() {
        let (app, _) = app().await;

        let res = call(
            &app,
            "/auth/register",
            json!({"email": "ada@example.com", "password": "pa55word"}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let reg: RegisterResponse = read(res).await;
        assert!(reg.user_id > 0);

        let res = call(
            &app,
            "/auth/login",
            json!({"email": "ada@example.com", "password": "pa55word", "app_id": 1}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let login: LoginResponse = read(res).await;
        let claims = jwt::verify(&login.token, APP_SECRET.as_bytes()).unwrap();
        assert_eq!(claims.uid, reg.user_id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.app_id, 1);
    }

    #[tokio::test]
    async fn duplicate_register_is_already_exists() {
        let (app, _) = app().await;
        let body = json!({"email": "ada@example.com", "password": "pw"});
        assert_eq!(call(&app, "/auth/register", body.clone()).await.status(), StatusCode::OK);

        let res = call(&app, "/auth/register", body).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let err: RpcError = read(res).await;
        assert_eq!(err.code, Code::AlreadyExists);
    }

    #[tokio::test]
    async fn bad_login_paths_are_indistinguishable() {
        let (app, _) = app().await;
        call(
            &app,
            "/auth/register",
            json!({"email": "ada@example.com", "password": "right"}),
        )
        .await;

        let unknown = call(
            &app,
            "/auth/login",
            json!({"email": "bob@example.com", "password": "right", "app_id": 1}),
        )
        .await;
        let wrong = call(
            &app,
            "/auth/login",
            json!({"email": "ada@example.com", "password": "wrong", "app_id": 1}),
        )
        .await;

        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
        let (unknown, wrong): (RpcError, RpcError) = (read(unknown).await, read(wrong).await);
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.code, Code::InvalidArgument);
    }

    #[tokio::test]
    async fn unknown_app_is_internal_with_generic_message() {
        let (app, _) = app().await;
        call(
            &app,
            "/auth/register",
            json!({"email": "ada@example.com", "password": "pw"}),
        )
        .await;
        let res = call(
            &app,
            "/auth/login",
            json!({"email": "ada@example.com", "password": "pw", "app_id": 9}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: RpcError = read(res).await;
        assert_eq!(err.message, "internal error");
    }

    #[tokio::test]
    async fn is_admin_over_http() {
        let (app, store) = app().await;
        let res = call(
            &app,
            "/auth/register",
            json!({"email": "root@example.com", "password": "pw"}),
        )
        .await;
        let reg: RegisterResponse = read(res).await;

        let res = call(&app, "/auth/is-admin", json!({"user_id": reg.user_id})).await;
        assert!(!read::<IsAdminResponse>(res).await.is_admin);

        store.set_admin(reg.user_id, true).await;
        let res = call(&app, "/auth/is-admin", json!({"user_id": reg.user_id})).await;
        assert!(read::<IsAdminResponse>(res).await.is_admin);

        let res = call(&app, "/auth/is-admin", json!({"user_id": 4242})).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected_before_the_service() {
        let (app, _) = app().await;
        let cases = [
            ("/auth/register", json!({"email": "", "password": "pw"})),
            ("/auth/register", json!({"email": "not-an-email", "password": "pw"})),
            ("/auth/register", json!({"email": "ada@example.com", "password": ""})),
            (
                "/auth/login",
                json!({"email": "ada@example.com", "password": "pw", "app_id": 0}),
            ),
            ("/auth/is-admin", json!({"user_id": 0})),
        ];
        for (uri, body) in cases {
            let res = call(&app, uri, body.clone()).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
            let err: RpcError = read(res).await;
            assert_eq!(err.code, Code::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn undecodable_bodies_get_invalid_argument_envelope() {
        let (app, _) = app().await;
        let cases = [
            ("/auth/register", json!({"email": "ada@example.com"})),
            (
                "/auth/login",
                json!({"email": "ada@example.com", "password": "pw", "app_id": "one"}),
            ),
            ("/auth/is-admin", json!({"user_id": "x"})),
        ];
        for (uri, body) in cases {
            let res = call(&app, uri, body.clone()).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
            let err: RpcError = read(res).await;
            assert_eq!(
                err,
                RpcError::invalid_argument("invalid request body"),
                "{uri} {body}"
            );
        }
    }

    #[tokio::test]
    async fn missing_content_type_gets_invalid_argument_envelope() {
        let (app, _) = app().await;
        let req = Request::post("/api/v1/auth/register")
            .body(Body::from(r#"{"email":"ada@example.com","password":"pw"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err: RpcError = read(res).await;
        assert_eq!(err.code, Code::InvalidArgument);
        assert_eq!(err.message, "invalid request body");
    }

    #[tokio::test]
    async fn health() {
        let (app, _) = app().await;
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
