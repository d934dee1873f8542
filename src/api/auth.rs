use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    response::{IntoResponse, Redirect, Response},
    middleware::Next,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use super::events::NotificationEvent;
use super::types::{AuthorDto, LoginRequest, LogoutRequest, MessageResponse};
use crate::forms::register::{self, RegisterPayload};

/// Session key holding the logged-in author's id.
const SESSION_AUTHOR_ID: &str = "author_id";

/// Route unauthenticated callers are redirected to, with the original
/// destination preserved as the `next` query parameter.
pub const LOGIN_PATH: &str = "/api/auth/login";

/// The authenticated caller, resolved once by the middleware and handed to
/// handlers through request extensions rather than ambient session reads.
#[derive(Debug, Clone)]
pub struct CurrentAuthor {
    pub id: i32,
    pub username: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication guard for the dashboard routes.
///
/// Resolves the session into a [`CurrentAuthor`] and forwards the request;
/// anonymous callers get a temporary redirect to the login entry point with
/// `next` set to the path they asked for.
pub async fn require_author(
    State(state): State<Arc<AppState>>,
    session: Session,
    OriginalUri(original_uri): OriginalUri,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Ok(Some(author_id)) = session.get::<i32>(SESSION_AUTHOR_ID).await {
        let author = state
            .store()
            .get_author_by_id(author_id)
            .await
            .map_err(|e| ApiError::database(format!("Failed to load author: {e}")))?;

        if let Some(author) = author {
            tracing::Span::current().record("author_id", author.id);
            request.extensions_mut().insert(CurrentAuthor {
                id: author.id,
                username: author.username,
            });
            return Ok(next.run(request).await);
        }
    }

    let next_target = original_uri
        .path_and_query()
        .map_or_else(|| original_uri.path().to_string(), ToString::to_string);

    let location = format!("{LOGIN_PATH}?next={}", urlencoding::encode(&next_target));
    Ok(Redirect::temporary(&location).into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Validates the registration form and creates the account. The password
/// confirmation is compared during validation and discarded; only the
/// Argon2id hash of the password is stored.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<ApiResponse<AuthorDto>>, ApiError> {
    // The uniqueness read runs whenever the email is syntactically valid,
    // independent of the other fields' outcomes.
    let email = payload.email.trim();
    let email_in_use = if register::is_valid_email(email) {
        state
            .store()
            .author_email_exists(email)
            .await
            .map_err(|e| ApiError::database(format!("Email lookup failed: {e}")))?
    } else {
        false
    };

    let new_author = register::validate(&payload, email_in_use)?;

    let security = state.config().read().await.security.clone();
    let author = state
        .store()
        .create_author(new_author, &security)
        .await
        .map_err(|e| ApiError::database(format!("Failed to create author: {e}")))?;

    tracing::info!("Author registered: {}", author.username);
    let _ = state.event_bus().send(NotificationEvent::AuthorRegistered {
        username: author.username.clone(),
    });

    Ok(Json(ApiResponse::success(AuthorDto::from(author))))
}

/// GET /auth/register
/// The registration endpoint only accepts POSTed forms.
pub async fn register_get_not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// POST /auth/login
/// Verify credentials and open a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthorDto>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let author = state
        .store()
        .verify_author_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if let Err(e) = session.insert(SESSION_AUTHOR_ID, author.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::info!("Author logged in: {}", author.username);

    Ok(Json(ApiResponse::success(AuthorDto::from(author))))
}

/// POST /auth/logout
/// Closes the session. The body must name the logged-in author; a mismatch
/// is rejected without touching the session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let author_id = session
        .get::<i32>(SESSION_AUTHOR_ID)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let author = state
        .store()
        .get_author_by_id(author_id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load author: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    if payload.username != author.username {
        return Err(ApiError::validation("Wrong user logout"));
    }

    let _ = session.flush().await;
    tracing::info!("Author logged out: {}", author.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "You signed out".to_string(),
        redirect: Some(LOGIN_PATH.to_string()),
    })))
}

/// GET /auth/logout
/// Logout only works as a POSTed form naming the author.
pub async fn logout_get_not_found() -> ApiError {
    ApiError::NotFound("Invalid logout request".to_string())
}

/// GET /auth/me
/// Current author's public info (requires authentication).
pub async fn get_current_author(
    State(state): State<Arc<AppState>>,
    axum::Extension(caller): axum::Extension<CurrentAuthor>,
) -> Result<Json<ApiResponse<AuthorDto>>, ApiError> {
    let author = state
        .store()
        .get_author_by_id(caller.id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load author: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(ApiResponse::success(AuthorDto::from(author))))
}
