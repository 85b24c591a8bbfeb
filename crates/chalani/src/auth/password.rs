use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";
const DEFAULT_ITERATIONS: u32 = 200_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("stored password hash is malformed")]
    Malformed,
    #[error("unsupported password hash scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Hash a password as `pbkdf2-sha256$<iterations>$<salt b64>$<key b64>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    encode(password, &salt, DEFAULT_ITERATIONS)
}

/// Constant-shape verification: re-derives the key from the stored salt and
/// iteration count and compares.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let mut parts = stored.split('$');
    let scheme = parts.next().ok_or(PasswordError::Malformed)?;
    if scheme != SCHEME {
        return Err(PasswordError::UnsupportedScheme(scheme.to_string()));
    }
    let iterations = parts
        .next()
        .and_then(|raw| raw.parse::<u32>().ok())
        .ok_or(PasswordError::Malformed)?;
    let salt = parts
        .next()
        .and_then(|raw| B64.decode(raw).ok())
        .ok_or(PasswordError::Malformed)?;
    let expected = parts
        .next()
        .and_then(|raw| B64.decode(raw).ok())
        .ok_or(PasswordError::Malformed)?;
    if parts.next().is_some() || expected.len() != KEY_LEN {
        return Err(PasswordError::Malformed);
    }

    let derived = derive_key(password, &salt, iterations);

    // Byte-by-byte comparison without early exit.
    let mut diff = 0u8;
    for (a, b) in derived.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    Ok(diff == 0)
}

fn encode(password: &str, salt: &[u8], iterations: u32) -> String {
    let key = derive_key(password, salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        B64.encode(salt),
        B64.encode(key)
    )
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests use a tiny iteration count to stay fast.
    fn quick_hash(password: &str) -> String {
        encode(password, b"0123456789abcdef", 1_000)
    }

    #[test]
    fn correct_password_verifies() {
        let stored = quick_hash("hunter22!");
        assert!(verify_password("hunter22!", &stored).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let stored = quick_hash("hunter22!");
        assert!(!verify_password("hunter23!", &stored).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("x", "pbkdf2-sha256$oops"),
            Err(PasswordError::Malformed)
        ));
        assert!(matches!(
            verify_password("x", "bcrypt$whatever"),
            Err(PasswordError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}
