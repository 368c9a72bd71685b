//! Admin credential checks
//!
//! The board only asks "is this password good enough for an admin
//! action?". Where the answer comes from is up to the implementation.
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub trait Authenticator {
    fn authorize(&self, password: &str) -> bool;
}

pub type SharedAuthenticator = Arc<dyn Authenticator + Send + Sync + 'static>;

/// A single shared secret, compared in constant time
///
/// A placeholder until a real secret store is wired in.
pub struct StaticPassword {
    secret: String,
}

impl StaticPassword {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn new_shared(secret: impl Into<String>) -> SharedAuthenticator {
        Arc::new(Self::new(secret))
    }
}

impl Authenticator for StaticPassword {
    fn authorize(&self, password: &str) -> bool {
        self.secret.as_bytes().ct_eq(password.as_bytes()).into()
    }
}

