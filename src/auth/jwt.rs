use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::repo_types::Role, config::JwtConfig, state::AppState};

/// Token purpose. A session token authenticates requests; confirm and reset
/// tokens are email-bound, single-purpose credentials sent as links.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Session,
    Confirm,
    Reset,
}

/// Claims carried by a login session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Claims carried by confirmation and reset tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmailClaims {
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub session_ttl: TimeDuration,
    pub confirm_ttl: TimeDuration,
    pub reset_ttl: TimeDuration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            session_ttl_minutes,
            confirm_ttl_minutes,
            reset_ttl_minutes,
            ..
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            session_ttl: TimeDuration::minutes(session_ttl_minutes),
            confirm_ttl: TimeDuration::minutes(confirm_ttl_minutes),
            reset_ttl: TimeDuration::minutes(reset_ttl_minutes),
        }
    }
}

impl JwtKeys {
    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    /// Sign a login session token carrying the user's id and role.
    pub fn sign_session(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.session_ttl;
        let claims = SessionClaims {
            sub: user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: TokenKind::Session,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, role = ?role, "session token signed");
        Ok(token)
    }

    fn sign_email_bound(&self, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Confirm => self.confirm_ttl,
            TokenKind::Reset => self.reset_ttl,
            TokenKind::Session => anyhow::bail!("session tokens are not email-bound"),
        };
        let exp = now + ttl;
        let claims = EmailClaims {
            email: email.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(kind = ?kind, "email-bound token signed");
        Ok(token)
    }

    pub fn sign_confirm(&self, email: &str) -> anyhow::Result<String> {
        self.sign_email_bound(email, TokenKind::Confirm)
    }
    pub fn sign_reset(&self, email: &str) -> anyhow::Result<String> {
        self.sign_email_bound(email, TokenKind::Reset)
    }

    /// Verify a session token. Signature mismatch, malformed structure,
    /// expiry, and wrong token kind all fail the same way.
    pub fn verify_session(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation())?;
        if data.claims.kind != TokenKind::Session {
            anyhow::bail!("not a session token");
        }
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    /// Verify an email-bound token of the expected kind.
    pub fn verify_email_bound(&self, token: &str, expected: TokenKind) -> anyhow::Result<EmailClaims> {
        let data = decode::<EmailClaims>(token, &self.decoding, &self.validation())?;
        if data.claims.kind != expected {
            anyhow::bail!("wrong token kind");
        }
        debug!(kind = ?expected, "email-bound token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    fn make_keys_with(secret: &str, session_ttl: TimeDuration) -> JwtKeys {
        let mut keys = make_keys();
        keys.encoding = EncodingKey::from_secret(secret.as_bytes());
        keys.decoding = DecodingKey::from_secret(secret.as_bytes());
        keys.session_ttl = session_ttl;
        keys
    }

    #[tokio::test]
    async fn sign_and_verify_session_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_session(user_id, Role::Admin).expect("sign session");
        let claims = keys.verify_session(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Session);
    }

    #[tokio::test]
    async fn sign_and_verify_confirm_and_reset_tokens() {
        let keys = make_keys();
        let confirm = keys.sign_confirm("alice@example.com").expect("sign confirm");
        let claims = keys
            .verify_email_bound(&confirm, TokenKind::Confirm)
            .expect("verify confirm");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.kind, TokenKind::Confirm);

        let reset = keys.sign_reset("alice@example.com").expect("sign reset");
        let claims = keys
            .verify_email_bound(&reset, TokenKind::Reset)
            .expect("verify reset");
        assert_eq!(claims.kind, TokenKind::Reset);
    }

    #[tokio::test]
    async fn reset_token_is_not_accepted_as_confirm() {
        let keys = make_keys();
        let reset = keys.sign_reset("alice@example.com").expect("sign reset");
        let err = keys
            .verify_email_bound(&reset, TokenKind::Confirm)
            .unwrap_err();
        assert!(err.to_string().contains("wrong token kind"));
    }

    #[tokio::test]
    async fn email_token_is_not_accepted_as_session() {
        let keys = make_keys();
        let confirm = keys.sign_confirm("alice@example.com").expect("sign confirm");
        assert!(keys.verify_session(&confirm).is_err());
    }

    #[tokio::test]
    async fn expired_session_token_is_rejected() {
        // Expiry far enough in the past to beat the default decode leeway
        let keys = make_keys_with("test-secret", TimeDuration::minutes(-5));
        let token = keys
            .sign_session(Uuid::new_v4(), Role::User)
            .expect("sign session");
        assert!(keys.verify_session(&token).is_err());
    }

    #[tokio::test]
    async fn foreign_secret_is_rejected() {
        let keys = make_keys();
        let foreign = make_keys_with("other-secret", TimeDuration::minutes(60));
        let token = foreign
            .sign_session(Uuid::new_v4(), Role::User)
            .expect("sign session");
        assert!(keys.verify_session(&token).is_err());
    }
}
