//! Static password gate for the dashboard
//!
//! This is an access gate, not an authentication system: the expected
//! password comes from configuration and is compared in memory.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid password")]
    InvalidPassword,

    #[error("Password must not be empty")]
    EmptyPassword,
}

/// Compares login attempts against the configured admin password
#[derive(Clone)]
pub struct PasswordGate {
    expected: String,
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate")
            .field("expected", &"<redacted>")
            .finish()
    }
}

impl PasswordGate {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Check a login attempt
    pub fn verify(&self, attempt: &str) -> Result<(), AuthError> {
        if attempt.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        if constant_time_eq(self.expected.as_bytes(), attempt.as_bytes()) {
            tracing::info!("Dashboard login succeeded");
            Ok(())
        } else {
            tracing::warn!("Dashboard login rejected");
            Err(AuthError::InvalidPassword)
        }
    }
}

// Does not stop at the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
