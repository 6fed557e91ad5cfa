//! Bearer token with tracked expiry.

use std::time::{Duration, Instant};

use serde::Deserialize;

/// Token response of the password grant.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) expires_in: u64,
}

/// Access token valid until `expires_at`.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    access: String,
    expires_at: Instant,
}

impl Token {
    pub(crate) fn new(response: TokenResponse, now: Instant) -> Self {
        Self {
            access: response.access_token,
            expires_at: now + Duration::from_secs(response.expires_in),
        }
    }

    pub(crate) fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub(crate) fn access(&self) -> &str {
        &self.access
    }
}
