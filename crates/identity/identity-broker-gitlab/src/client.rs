//! Userinfo profile fetching with bounded retry.

use identity_broker_core::{BrokerError, BrokerResult};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Total userinfo attempts before giving up.
pub const USERINFO_ATTEMPTS: u32 = 10;
/// Fixed pause between failed attempts. Deliberately constant rather than
/// exponential: the tolerance budget is ~2 seconds worst case.
pub const RETRY_DELAY: Duration = Duration::from_millis(200);

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the userinfo endpoint.
///
/// GitLab instances behind rolling restarts or proxies occasionally drop a
/// request right after issuing a token, so a single failed call is retried on
/// a fixed interval up to [`USERINFO_ATTEMPTS`] times. Only HTTP 200 counts as
/// success; any other status or transport failure consumes an attempt.
#[derive(Clone)]
pub struct ProfileClient {
    http_client: Client,
    attempts: u32,
    retry_delay: Duration,
    deadline: Option<Duration>,
}

impl ProfileClient {
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            attempts: USERINFO_ATTEMPTS,
            retry_delay: RETRY_DELAY,
            deadline: None,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Bounds the whole fetch, retries and pauses included. When the deadline
    /// elapses the remaining attempts are abandoned and the call fails with
    /// [`BrokerError::Cancelled`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fetches the authenticated user's profile from `userinfo_url`.
    ///
    /// Fails with [`BrokerError::ProfileFetch`] once all attempts are
    /// exhausted, or [`BrokerError::ProfileParse`] when a 200 body is not
    /// valid JSON. Transport failures on individual attempts are logged and
    /// retried, never surfaced directly.
    pub async fn fetch_profile(
        &self,
        userinfo_url: &str,
        access_token: &str,
    ) -> BrokerResult<serde_json::Value> {
        match self.deadline {
            Some(deadline) => {
                tokio::time::timeout(deadline, self.fetch_with_retry(userinfo_url, access_token))
                    .await
                    .map_err(|_| {
                        BrokerError::Cancelled("userinfo fetch deadline exceeded".to_string())
                    })?
            }
            None => self.fetch_with_retry(userinfo_url, access_token).await,
        }
    }

    async fn fetch_with_retry(
        &self,
        userinfo_url: &str,
        access_token: &str,
    ) -> BrokerResult<serde_json::Value> {
        let mut last_status: Option<u16> = None;
        let mut last_cause: Option<String> = None;

        for attempt in 1..=self.attempts {
            match self
                .http_client
                .get(userinfo_url)
                .bearer_auth(access_token)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return response
                            .json()
                            .await
                            .map_err(|e| BrokerError::ProfileParse(e.to_string()));
                    }
                    last_status = Some(status.as_u16());
                    debug!(attempt, status = status.as_u16(), "user info attempt failed");
                    // response dropped here, releasing the connection before the pause
                }
                Err(e) => {
                    debug!(attempt, error = %e, "failed to invoke user info");
                    last_cause = Some(e.to_string());
                }
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        warn!(
            attempts = self.attempts,
            status = ?last_status,
            "user info call failed, giving up"
        );
        Err(BrokerError::ProfileFetch {
            status: last_status,
            cause: last_cause,
        })
    }
}

impl Default for ProfileClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_defaults() {
        let client = ProfileClient::new();
        assert_eq!(client.attempts, USERINFO_ATTEMPTS);
        assert_eq!(client.retry_delay, RETRY_DELAY);
        assert!(client.deadline.is_none());
    }

    #[test]
    fn test_retry_knobs_override() {
        let client = ProfileClient::new()
            .with_attempts(3)
            .with_retry_delay(Duration::from_millis(1))
            .with_deadline(Duration::from_secs(1));
        assert_eq!(client.attempts, 3);
        assert_eq!(client.retry_delay, Duration::from_millis(1));
        assert_eq!(client.deadline, Some(Duration::from_secs(1)));
    }
}
