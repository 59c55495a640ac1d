//! Auth gate: bearer token authentication and role checks
//!
//! `require_auth` resolves the caller from the `Authorization` header and
//! stores an [`Identity`] in the request extensions. The role layers then
//! read it back. Route groups apply both, authentication first.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use pizzahub_core::{Role, TokenService};

use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{CatalogStore, OrderStore, UserId, UserStore};

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
}

impl Identity {
    /// Admins may act on anything, users only on what they own
    pub fn can_access(&self, owner: UserId) -> bool {
        self.role.is_admin() || self.id == owner
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers.get(AUTHORIZATION).ok_or_else(|| {
        tracing::warn!("Rejected request without auth token");
        ApiError::Unauthenticated
    })?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Rejected malformed Authorization header");
            ApiError::InvalidToken
        })
}

/// Resolve the caller for a request.
///
/// Fails with `Unauthenticated` when there is no header, `InvalidToken` for
/// a bad or expired token, `UserNotFound` when the token's user is gone and
/// `UserBlocked` for blocked accounts.
pub fn authenticate<U: UserStore>(
    tokens: &TokenService,
    users: &U,
    headers: &HeaderMap,
) -> Result<Identity, ApiError> {
    let token = bearer_token(headers)?;

    let subject = tokens.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "Rejected invalid token");
        ApiError::InvalidToken
    })?;

    let user_id: UserId = subject.parse().map_err(|_| {
        tracing::warn!(subject = %subject, "Rejected token with malformed subject");
        ApiError::UserNotFound
    })?;

    let user = users.get_user(user_id)?.ok_or_else(|| {
        tracing::warn!(user_id = %user_id, "Rejected token for unknown user");
        ApiError::UserNotFound
    })?;

    if user.blocked {
        tracing::warn!(user_id = %user_id, "Rejected blocked user");
        return Err(ApiError::UserBlocked);
    }

    Ok(Identity {
        id: user.id,
        role: user.role,
    })
}

/// Middleware: authenticate and attach the [`Identity`]
pub async fn require_auth<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let identity = authenticate(&state.tokens, &state.user_store, request.headers())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Check an already-authenticated caller against the allowed roles
pub fn authorize(identity: Option<&Identity>, allowed: &[Role]) -> Result<(), ApiError> {
    let identity = identity.ok_or(ApiError::Unauthenticated)?;

    if !allowed.contains(&identity.role) {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            "Rejected caller without required role"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(())
}

async fn require_roles(
    allowed: &[Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(request.extensions().get::<Identity>(), allowed)?;
    Ok(next.run(request).await)
}

/// Middleware: customers and admins
pub async fn require_customer(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(&[Role::User, Role::Admin], request, next).await
}

/// Middleware: admins only
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(&[Role::Admin], request, next).await
}
