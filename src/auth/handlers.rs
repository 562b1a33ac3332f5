use axum::{
    extract::{FromRef, Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use time::Duration as TimeDuration;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest,
            ResetPasswordRequest, ResetRequest,
        },
        extractors::{remember_me_cookie, remember_me_removal, AuthUser},
        jwt::{JwtKeys, TokenKind},
        password::{hash_password, verify_password},
        repo_types::User,
        validate,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/confirm/:token", get(confirm_email))
        .route("/auth/login", post(login))
        .route("/auth/reset", post(request_password_reset))
        .route("/auth/reset-password/:token", post(complete_password_reset))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
}

fn confirmation_link(base_url: &str, token: &str) -> String {
    format!("{base_url}/auth/confirm/{token}")
}

fn reset_link(base_url: &str, token: &str) -> String {
    format!("{base_url}/reset-password/{token}")
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let username = validate::validate_username(&payload.username)?;
    let email = validate::normalize_email(&payload.email)?;
    validate::validate_password(&payload.password)?;

    // Friendly pre-check; the unique constraints on the insert are authoritative
    if User::find_by_identifier(&state.db, &username, &email)
        .await?
        .is_some()
    {
        warn!("username or email already registered");
        return Err(ApiError::Conflict);
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, &username, &email, &hash).await {
        Ok(u) => u,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            warn!("concurrent registration lost the unique-constraint race");
            return Err(ApiError::Conflict);
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_confirm(&email)?;
    let link = confirmation_link(&state.config.mail.public_base_url, &token);
    let body = format!(r#"<p>Click <a href="{link}">here</a> to confirm your account.</p>"#);

    info!(user_id = %user.id, "user registered");

    // The row is durably written; a failed confirmation mail is reported, not fatal
    match state
        .mailer
        .send(&email, "Confirm Your Book Tracker Account", &body)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Registered successfully! Check your email for confirmation.".into(),
        })),
        Err(e) => {
            error!(error = %e, "confirmation email failed");
            Ok(Json(MessageResponse {
                message:
                    "Registered successfully, but failed to send confirmation email. Contact support."
                        .into(),
            }))
        }
    }
}

#[instrument(skip(state, token))]
pub async fn confirm_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_email_bound(&token, TokenKind::Confirm)
        .map_err(|_| ApiError::InvalidToken)?;

    // Zero rows (already confirmed, or the account is gone) is still success
    User::confirm_email(&state.db, &claims.email).await?;

    info!("email confirmed");
    Ok(Json(MessageResponse {
        message: "Email confirmed! You can now log in.".into(),
    }))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let identifier = validate::sanitize_identifier(&payload.username_or_email);
    let as_email = identifier.to_lowercase();

    // Never reveal whether the identifier or the password was wrong
    let user = match User::find_by_identifier(&state.db, &identifier, &as_email).await? {
        Some(u) => u,
        None => {
            warn!("login with unknown identifier");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !user.is_confirmed {
        warn!(user_id = %user.id, "login before email confirmation");
        return Err(ApiError::EmailNotConfirmed);
    }

    let ok = verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let role = user
        .role
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("confirmed user has no role")))?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id, role)?;

    let jar = if payload.remember_me {
        let max_age = TimeDuration::minutes(state.config.jwt.remember_ttl_minutes);
        jar.add(remember_me_cookie(
            token.clone(),
            max_age,
            state.config.cookie_secure,
        ))
    } else {
        jar
    };

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            token,
            user: PublicUser {
                id: user.id,
                username: user.username,
                role,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    // Unlike login, this flow does reveal account existence
    if User::find_by_email(&state.db, &email).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_reset(&email)?;
    let link = reset_link(&state.config.mail.public_base_url, &token);
    let body = format!(r#"<p>Click <a href="{link}">here</a> to reset your password.</p>"#);

    // Without this email the user has no other reset path, so delivery failure is fatal
    state
        .mailer
        .send(&email, "Reset Your Book Tracker Password", &body)
        .await
        .map_err(|e| {
            error!(error = %e, "reset email failed");
            ApiError::MailDelivery
        })?;

    Ok(Json(MessageResponse {
        message: "Password reset link sent to your email.".into(),
    }))
}

#[instrument(skip(state, token, payload))]
pub async fn complete_password_reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate::validate_password(&payload.password)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_email_bound(&token, TokenKind::Reset)
        .map_err(|_| ApiError::InvalidToken)?;

    let hash = hash_password(&payload.password)?;
    User::update_password(&state.db, &claims.email, &hash).await?;

    info!("password reset completed");
    Ok(Json(MessageResponse {
        message: "Password reset successfully.".into(),
    }))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // Stateless tokens: this clears the cookie only, bearer tokens expire naturally
    let jar = jar.remove(remember_me_removal(state.config.cookie_secure));
    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    )
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let record = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let role = record
        .role
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("authenticated user has no role")))?;

    Ok(Json(PublicUser {
        id: record.id,
        username: record.username,
        role,
    }))
}
