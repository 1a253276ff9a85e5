//! Authentication handlers (login, logout, validate)

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use todo_types::{LoginParams, Role, User, UserId};

use crate::error::ApiResult;
use crate::extractors::BearerToken;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Principal name asserted by the upstream identity provider
    pub external_id: String,
    pub provider: String,
    pub email: String,
    pub name: String,
}

impl From<LoginRequest> for LoginParams {
    fn from(req: LoginRequest) -> Self {
        Self {
            external_id: req.external_id,
            provider: req.provider,
            email: req.email,
            name: req.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub user_id: UserId,
    pub role: Role,
}

// ============================================================================
// Handlers
// ============================================================================

/// Token that fires if axum drops the handler future (client went away).
fn request_scope() -> (CancellationToken, tokio_util::sync::DropGuard) {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    (cancel, guard)
}

/// POST /api/v1/auth/login
///
/// Log in the user behind an external identity, registering them first if needed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (cancel, _guard) = request_scope();

    let login = state.auth.login_or_register(&cancel, &req.into()).await?;

    tracing::info!(user_id = %login.user.id, "User logged in");

    Ok(Json(LoginResponse {
        token: login.token,
        token_type: "Bearer",
        expires_in: state.token_lifetime_secs(),
        user: login.user,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented token
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<LogoutResponse>> {
    let (cancel, _guard) = request_scope();

    state.auth.logout(&cancel, &token).await?;

    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/v1/auth/validate
///
/// Report who the presented token speaks for
pub async fn validate(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<ValidateResponse>> {
    let (cancel, _guard) = request_scope();

    let info = state.auth.validate_token(&cancel, &token).await?;

    Ok(Json(ValidateResponse {
        user_id: info.user_id,
        role: info.role,
    }))
}
