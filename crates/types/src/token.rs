//! Bearer credential representation and expiry logic.

use std::time::{Duration, Instant};

/// A bearer token together with the instant it stops being valid.
///
/// Credentials live only in memory and are replaced wholesale on refresh.
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: Instant,
}

impl Credential {
    /// Create a credential that expires `lifetime` from now.
    pub fn new(access_token: impl Into<String>, lifetime: Duration) -> Self {
        Self::issued_at(access_token, Instant::now(), lifetime)
    }

    /// Create a credential issued at `issued` with the given lifetime.
    pub fn issued_at(access_token: impl Into<String>, issued: Instant, lifetime: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: issued + lifetime,
        }
    }

    /// Lifetime left at `now`; zero once expired.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Lifetime left right now.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    /// `true` when the remaining lifetime at `now` is within `margin`.
    #[must_use]
    pub fn needs_refresh_at(&self, now: Instant, margin: Duration) -> bool {
        self.remaining_at(now) <= margin
    }

    /// `true` when the remaining lifetime is within `margin`.
    #[must_use]
    pub fn needs_refresh(&self, margin: Duration) -> bool {
        self.needs_refresh_at(Instant::now(), margin)
    }

    /// `true` once the expiry instant has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

// The token itself is never printed.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("remaining", &self.remaining())
            .finish()
    }
}
