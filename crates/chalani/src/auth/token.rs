use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::domain::{User, UserRole};

type HmacSha256 = Hmac<Sha256>;

/// Whether a token grants API access or only mints new pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims issued by the registry. `jti` identifies refresh tokens in
/// the revocation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub token_type: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Access/refresh pair returned by login, signup, refresh, and password
/// change.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature mismatch")]
    Signature,
    #[error("token is expired")]
    Expired,
    #[error("expected an {expected} token")]
    WrongKind { expected: &'static str },
    #[error("token has been revoked")]
    Revoked,
}

/// HS256 signer/verifier. Tokens are standard three-segment JWTs with
/// base64url (no pad) segments.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret.as_bytes().to_vec(),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    /// Issue an access/refresh pair for the user.
    pub fn issue_pair(&self, user: &User) -> TokenPair {
        TokenPair {
            access: self.issue(user, TokenKind::Access),
            refresh: self.issue(user, TokenKind::Refresh),
        }
    }

    pub fn issue(&self, user: &User, kind: TokenKind) -> String {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            token_type: kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> String {
        let header = URL_SAFE_NO_PAD.encode(HEADER.as_bytes());
        let payload = serde_json::to_vec(claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        format!("{signing_input}.{signature}")
    }

    /// Verify signature, expiry, and token kind, returning the claims.
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let header = segments.next().ok_or(TokenError::Malformed)?;
        let payload = segments.next().ok_or(TokenError::Malformed)?;
        let signature = segments.next().ok_or(TokenError::Malformed)?;
        if segments.next().is_some() {
            return Err(TokenError::Malformed);
        }

        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Signature)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        if claims.token_type != expected {
            return Err(TokenError::WrongKind {
                expected: expected.as_str(),
            });
        }
        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn signer() -> TokenSigner {
        TokenSigner::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        })
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "admin@nea.org.np".to_string(),
            name: "Admin".to_string(),
            role: UserRole::Admin,
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_access_token_round_trips() {
        let signer = signer();
        let user = user();
        let pair = signer.issue_pair(&user);
        let claims = signer.decode(&pair.access, TokenKind::Access).expect("valid");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let signer = signer();
        let pair = signer.issue_pair(&user());
        let err = signer.decode(&pair.refresh, TokenKind::Access).unwrap_err();
        assert!(matches!(err, TokenError::WrongKind { expected: "access" }));
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let signer = signer();
        let token = signer.issue(&user(), TokenKind::Access);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(b"{\"sub\":\"0\"}");
        parts[1] = &forged;
        let forged_token = parts.join(".");
        assert!(matches!(
            signer.decode(&forged_token, TokenKind::Access),
            Err(TokenError::Signature)
        ));
    }

    #[test]
    fn foreign_secret_rejected() {
        let token = signer().issue(&user(), TokenKind::Access);
        let other = TokenSigner::new(&AuthConfig {
            secret: "different".to_string(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        });
        assert!(matches!(
            other.decode(&token, TokenKind::Access),
            Err(TokenError::Signature)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let signer = TokenSigner::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            access_ttl_minutes: -1,
            refresh_ttl_days: 7,
        });
        let token = signer.issue(&user(), TokenKind::Access);
        assert!(matches!(
            signer.decode(&token, TokenKind::Access),
            Err(TokenError::Expired)
        ));
    }
}
