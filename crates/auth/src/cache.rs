//! Process-wide cache for the upstream bearer credential.
//!
//! Responsibilities:
//! - Hand out the cached token without awaiting while it is fresh.
//! - Refresh through the client-credentials grant once the remaining lifetime
//!   drops to the refresh margin (5 minutes by default).
//! - Single-flight: at most one identity call per refresh cycle. Callers that
//!   queued behind a running refresh share its outcome, success or failure.
//! - Never cache a failure: the next caller after a failed refresh tries again.

use crate::client_credentials::{self, ClientCredentials};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use hubgate_config::Config;
use hubgate_types::{Credential, HubError, TokenProvider, traits::Result};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::Mutex;

/// Default refresh margin.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);

pub struct CredentialCache {
    http: reqwest::Client,
    creds: ClientCredentials,
    margin: Duration,
    current: ArcSwapOption<Credential>,
    /// Held for the whole refresh; stores the error of the last attempt so
    /// queued callers can share it.
    in_flight: Mutex<Option<String>>,
    /// Bumped after every completed refresh attempt.
    generation: AtomicU64,
}

impl CredentialCache {
    pub fn new(http: reqwest::Client, creds: ClientCredentials, margin: Duration) -> Self {
        Self {
            http,
            creds,
            margin,
            current: ArcSwapOption::empty(),
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Builds a cache from the identity section of `config`.
    #[must_use]
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(
            http,
            ClientCredentials::from_config(config),
            config.identity.refresh_margin(),
        )
    }

    /// Return a token with more than the refresh margin left, refreshing it
    /// if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::AuthFetch`] if the identity endpoint fails. A
    /// caller that waited on somebody else's failed refresh receives the same
    /// error.
    pub async fn get_token(&self) -> Result<String> {
        // Read the generation before the snapshot so a refresh that completes
        // in between is detected below.
        let observed = self.generation.load(Ordering::Acquire);
        if let Some(token) = self.fresh_token() {
            return Ok(token);
        }

        let mut last_failure = self.in_flight.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(reason) = last_failure.as_ref() {
                return Err(HubError::AuthFetch(reason.clone()));
            }
            if let Some(cred) = self.current.load_full()
                && !cred.is_expired()
            {
                return Ok(cred.access_token.clone());
            }
        }

        tracing::debug!(token_url = %self.creds.token_url, "refreshing upstream credential");
        let outcome = client_credentials::request_token(&self.http, &self.creds).await;
        let result = match outcome {
            Ok(cred) => {
                tracing::info!(
                    lifetime_secs = cred.remaining().as_secs(),
                    "upstream credential refreshed"
                );
                let token = cred.access_token.clone();
                self.current.store(Some(Arc::new(cred)));
                *last_failure = None;
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "upstream credential refresh failed");
                *last_failure = Some(match &e {
                    HubError::AuthFetch(reason) => reason.clone(),
                    other => other.to_string(),
                });
                Err(e)
            }
        };
        self.generation.fetch_add(1, Ordering::AcqRel);
        result
    }

    /// Drop the cached credential so the next call refreshes.
    ///
    /// Useful after the upstream rejected a token with 401.
    pub fn invalidate(&self) {
        self.current.store(None);
    }

    /// Lifetime left on the cached credential, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.current.load().as_ref().map(|c| c.remaining())
    }

    /// Number of refresh attempts completed so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn margin(&self) -> Duration {
        self.margin
    }

    fn fresh_token(&self) -> Option<String> {
        let guard = self.current.load();
        let cred = guard.as_ref()?;
        (!cred.needs_refresh(self.margin)).then(|| cred.access_token.clone())
    }
}

#[async_trait]
impl TokenProvider for CredentialCache {
    async fn get_token(&self) -> Result<String> {
        CredentialCache::get_token(self).await
    }

    fn invalidate(&self) {
        CredentialCache::invalidate(self);
    }
}
