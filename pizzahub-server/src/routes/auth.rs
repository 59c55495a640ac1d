//! Registration, email verification and login

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use pizzahub_core::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ValidJson;
use crate::crypto::{
    generate_verification_code, hash_code, hash_password, verify_code, verify_password,
};
use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{
    CatalogStore, EmailVerification, NewUser, OrderStore, User, UserProfile, UserStore,
};

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6))]
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct VerifyRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(equal = 6))]
    pub code: String,
}

#[derive(Deserialize, Validate)]
pub struct ResendRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    ApiError::Storage(e.to_string())
}

fn session_for<U, C, O, E>(
    state: &AppState<U, C, O, E>,
    user: &User,
) -> Result<SessionResponse, ApiError> {
    let token = state.tokens.issue(&user.id.to_string())?;
    Ok(SessionResponse {
        token,
        user: UserProfile::from(user),
    })
}

/// Store a fresh code for `user` and queue the email
fn issue_verification<U, C, O, E>(
    state: &AppState<U, C, O, E>,
    user: &User,
) -> Result<(), ApiError>
where
    U: UserStore,
    E: EmailSender + 'static,
{
    let code = generate_verification_code();
    let code_hash = hash_code(&code).map_err(internal)?;

    state
        .user_store
        .upsert_verification(EmailVerification::issue(&user.email, code_hash, Utc::now()))?;

    state
        .notifier
        .verification_code(&user.email, &user.name, &code);

    Ok(())
}

/// POST /api/auth/register
pub async fn register<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender + 'static,
{
    if state.user_store.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::EmailInUse);
    }

    let password_hash = hash_password(&req.password).map_err(internal)?;

    let user = state.user_store.create_user(NewUser {
        name: req.name,
        email: req.email,
        password_hash,
        phone: req.phone.filter(|p| !p.trim().is_empty()),
        role: Role::User,
        verified: false,
    })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    issue_verification(&state, &user)?;

    Ok(Json(MessageResponse {
        message: "Verification code sent",
    }))
}

/// POST /api/auth/verify
pub async fn verify<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    ValidJson(req): ValidJson<VerifyRequest>,
) -> Result<Json<SessionResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let verification = state
        .user_store
        .get_verification(&req.email)?
        .ok_or(ApiError::NoVerificationCode)?;

    // Expired codes stay stored until a resend replaces them
    if verification.is_expired_at(Utc::now()) {
        return Err(ApiError::VerificationExpired);
    }

    if !verify_code(&req.code, &verification.code_hash).map_err(internal)? {
        return Err(ApiError::InvalidVerificationCode);
    }

    let user = state
        .user_store
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::UnknownEmail)?;

    state.user_store.mark_verified(&user.email)?;
    state.user_store.delete_verification(&user.email)?;

    tracing::info!(user_id = %user.id, "Email verified");

    Ok(Json(session_for(&state, &user)?))
}

/// POST /api/auth/resend
pub async fn resend<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    ValidJson(req): ValidJson<ResendRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender + 'static,
{
    let user = state
        .user_store
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::UnknownEmail)?;

    issue_verification(&state, &user)?;

    Ok(Json(MessageResponse {
        message: "Verification code resent",
    }))
}

/// POST /api/auth/login
pub async fn login<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let user = state
        .user_store
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::InvalidCredentials)?;

    // Unverified accounts are told so even with a correct password
    if !user.verified {
        return Err(ApiError::EmailNotVerified);
    }

    check_password(&req.password, &user)?;

    Ok(Json(session_for(&state, &user)?))
}

/// POST /api/auth/admin/login
pub async fn admin_login<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let user = state
        .user_store
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.id, "Admin login attempt by non-admin");
        return Err(ApiError::NotAnAdmin);
    }

    check_password(&req.password, &user)?;

    Ok(Json(session_for(&state, &user)?))
}

fn check_password(password: &str, user: &User) -> Result<(), ApiError> {
    let valid = verify_password(password, &user.password_hash).map_err(internal)?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(())
}
