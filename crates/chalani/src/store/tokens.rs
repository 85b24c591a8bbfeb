use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::{now_ts, Store, StoreError};

const VERIFICATION_TTL_HOURS: i64 = 24;

impl Store {
    /// Blacklist a refresh token's jti until the token itself would have
    /// expired anyway.
    pub fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?1, ?2)",
                params![jti.to_string(), expires_at.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn is_token_revoked(&self, jti: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let hit: Option<String> = conn
                .query_row(
                    "SELECT jti FROM revoked_tokens WHERE jti = ?1",
                    params![jti.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }

    /// Drop blacklist rows whose tokens are past expiry; they can no
    /// longer authenticate regardless.
    pub fn purge_expired_tokens(&self) -> Result<u32, StoreError> {
        self.with_conn(|conn| {
            let purged = conn.execute(
                "DELETE FROM revoked_tokens WHERE expires_at <= ?1",
                params![now_ts()],
            )?;
            Ok(purged as u32)
        })
    }

    /// Mint a verification token for a freshly registered address. The
    /// caller is responsible for getting it to the user.
    pub fn create_email_verification(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<String, StoreError> {
        self.with_conn(|conn| {
            let token = Uuid::new_v4().to_string();
            let expires = (Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS)).to_rfc3339();
            conn.execute(
                "INSERT INTO email_verifications (user_id, email, token, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id.to_string(), email, token, expires, now_ts()],
            )?;
            Ok(token)
        })
    }

    /// Mark a verification token as used. Unknown, expired, and replayed
    /// tokens all report NotFound.
    pub fn verify_email_token(&self, token: &str) -> Result<Uuid, StoreError> {
        self.with_conn(|conn| {
            let row: Option<(i64, String)> = conn
                .query_row(
                    "SELECT id, user_id FROM email_verifications
                     WHERE token = ?1 AND verified_at IS NULL AND expires_at > ?2",
                    params![token, now_ts()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (id, user_id) = row.ok_or(StoreError::NotFound)?;
            conn.execute(
                "UPDATE email_verifications SET verified_at = ?1 WHERE id = ?2",
                params![now_ts(), id],
            )?;
            Uuid::parse_str(&user_id)
                .map_err(|err| StoreError::Corrupt(format!("bad user id '{user_id}': {err}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    #[test]
    fn revocation_round_trip_and_purge() {
        let store = Store::open_in_memory().unwrap();
        let jti = Uuid::new_v4();
        assert!(!store.is_token_revoked(jti).unwrap());

        store.revoke_token(jti, Utc::now() - Duration::minutes(1)).unwrap();
        assert!(store.is_token_revoked(jti).unwrap());

        // Revoking twice is a no-op, not an error.
        store.revoke_token(jti, Utc::now()).unwrap();

        assert_eq!(store.purge_expired_tokens().unwrap(), 1);
        assert!(!store.is_token_revoked(jti).unwrap());
    }

    #[test]
    fn email_verification_is_single_use() {
        let store = Store::open_in_memory().unwrap();
        let user = store
            .create_user("sita@nea.org.np", "Sita", UserRole::Viewer, "hash")
            .unwrap();
        let token = store
            .create_email_verification(user.id, &user.email)
            .unwrap();

        assert_eq!(store.verify_email_token(&token).unwrap(), user.id);
        assert!(matches!(
            store.verify_email_token(&token),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.verify_email_token("bogus"),
            Err(StoreError::NotFound)
        ));
    }
}
