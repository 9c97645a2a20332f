use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, state::AppState};

/// Signing and verification keys for access and refresh tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: Duration::minutes(config.ttl_minutes.max(1)),
            refresh_ttl: Duration::minutes(config.refresh_ttl_minutes.max(1)),
        }
    }

    pub fn sign_access(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign(user_id, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign(user_id, TokenKind::Refresh)
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_kind(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_kind(token, TokenKind::Refresh)
    }

    fn sign(&self, user_id: i64, kind: TokenKind) -> anyhow::Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, ?kind, "token issued");
        Ok(token)
    }

    /// Signature, expiry, issuer and audience are checked before the kind.
    fn verify_kind(&self, token: &str, expected: TokenKind) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        anyhow::ensure!(
            claims.kind == expected,
            "expected {expected:?} token, got {:?}",
            claims.kind
        );
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "kitchen-secret".into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    #[test]
    fn access_token_carries_user_and_audience() {
        let keys = keys("mealstock", "kitchen");
        let token = keys.sign_access(42).unwrap();
        let claims = keys.verify_access(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.iss, "mealstock");
        assert_eq!(claims.aud, "kitchen");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let keys = keys("mealstock", "kitchen");
        let access = keys.verify_access(&keys.sign_access(7).unwrap()).unwrap();
        let refresh = keys.verify_refresh(&keys.sign_refresh(7).unwrap()).unwrap();
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let keys = keys("mealstock", "kitchen");
        let access = keys.sign_access(1).unwrap();
        let refresh = keys.sign_refresh(1).unwrap();
        assert!(keys.verify_refresh(&access).is_err());
        assert!(keys.verify_access(&refresh).is_err());
    }

    #[test]
    fn foreign_issuer_or_audience_is_rejected() {
        let token = keys("mealstock", "kitchen").sign_access(1).unwrap();
        assert!(keys("someone-else", "kitchen").verify_access(&token).is_err());
        assert!(keys("mealstock", "office").verify_access(&token).is_err());
    }

    #[tokio::test]
    async fn keys_follow_state_config() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify_access(&keys.sign_access(3).unwrap()).unwrap();
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }
}
