//! Authentication primitives: PBKDF2 password hashing and hand-assembled
//! HS256 JWTs with access/refresh pairs.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenKind, TokenPair, TokenSigner};
