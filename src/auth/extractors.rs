use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{jwt::JwtKeys, repo_types::Role},
    error::ApiError,
};

pub const REMEMBER_ME_COOKIE: &str = "rememberMe";

/// Build the remember-me cookie carrying a session token.
pub fn remember_me_cookie(token: String, max_age: TimeDuration, secure: bool) -> Cookie<'static> {
    Cookie::build((REMEMBER_ME_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build()
}

/// Cookie matching the attributes of `remember_me_cookie`, for removal.
pub fn remember_me_removal(secure: bool) -> Cookie<'static> {
    Cookie::build((REMEMBER_ME_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build()
}

/// Verified identity context attached to authenticated requests.
///
/// Reads the `Authorization: Bearer` header, falling back to the remember-me
/// cookie. No credential at all is a 401; a credential that fails
/// verification is a 403.
#[derive(Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let bearer = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_owned);

        let token = match bearer {
            Some(t) => t,
            None => CookieJar::from_headers(&parts.headers)
                .get(REMEMBER_ME_COOKIE)
                .map(|c| c.value().to_owned())
                .ok_or(ApiError::Unauthenticated)?,
        };

        let claims = keys.verify_session(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Forbidden("Invalid token".to_string())
        })?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Per-declared-role authorization. Equality, not a hierarchy: an admin does
/// not implicitly pass a `User` check.
pub fn require_role(user: &AuthUser, required: Role) -> Result<(), ApiError> {
    if user.role != required {
        let message = match required {
            Role::Admin => "Admin access required",
            Role::User => "User access required",
        };
        return Err(ApiError::Forbidden(message.to_string()));
    }
    Ok(())
}

/// Identity context for admin-only routes.
#[derive(Debug)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Admin)?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use jsonwebtoken::EncodingKey;

    fn parts(headers: &[(&str, String)]) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/auth/me");
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn state_and_keys() -> (AppState, JwtKeys) {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        (state, keys)
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let (state, keys) = state_and_keys();
        let id = Uuid::new_v4();
        let token = keys.sign_session(id, Role::User).unwrap();
        let mut parts = parts(&[("authorization", format!("Bearer {token}"))]);
        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("bearer accepted");
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn cookie_fallback_is_accepted() {
        let (state, keys) = state_and_keys();
        let id = Uuid::new_v4();
        let token = keys.sign_session(id, Role::User).unwrap();
        let mut parts = parts(&[("cookie", format!("rememberMe={token}"))]);
        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("cookie accepted");
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn missing_credential_is_unauthenticated() {
        let (state, _) = state_and_keys();
        let mut parts = parts(&[]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn invalid_token_is_forbidden() {
        let (state, _) = state_and_keys();
        let mut parts = parts(&[("authorization", "Bearer not-a-jwt".to_string())]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn foreign_signature_is_forbidden() {
        let (state, keys) = state_and_keys();
        let mut foreign = keys.clone();
        foreign.encoding = EncodingKey::from_secret(b"someone-elses-secret");
        let token = foreign.sign_session(Uuid::new_v4(), Role::User).unwrap();
        let mut parts = parts(&[("authorization", format!("Bearer {token}"))]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_gate_rejects_plain_users() {
        let (state, keys) = state_and_keys();
        let token = keys.sign_session(Uuid::new_v4(), Role::User).unwrap();
        let mut parts = parts(&[("authorization", format!("Bearer {token}"))]);
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_gate_accepts_admins() {
        let (state, keys) = state_and_keys();
        let token = keys.sign_session(Uuid::new_v4(), Role::Admin).unwrap();
        let mut parts = parts(&[("authorization", format!("Bearer {token}"))]);
        assert!(AdminUser::from_request_parts(&mut parts, &state)
            .await
            .is_ok());
    }

    #[test]
    fn role_check_is_not_hierarchical() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(require_role(&admin, Role::Admin).is_ok());
        assert!(require_role(&admin, Role::User).is_err());
    }

    #[test]
    fn remember_me_cookie_attributes() {
        let cookie = remember_me_cookie("tok".into(), TimeDuration::days(7), false);
        let rendered = cookie.to_string();
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
    }
}
