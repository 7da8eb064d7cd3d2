//! Authentication for lab sessions.

mod extractor;

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

pub use extractor::{SessionAuth, session_token};

/// Compare two secrets in constant time.
pub fn secrets_match(expected: &SecretString, provided: &SecretString) -> bool {
    expected
        .expose_secret()
        .as_bytes()
        .ct_eq(provided.expose_secret().as_bytes())
        .into()
}
