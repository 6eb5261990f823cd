//! Request-scoped Bugzilla clients.
//!
//! Every authenticated invocation runs inside [`ClientScope::enter`], which
//! binds a [`ScopedClient`] to the current task for the duration of the
//! handler future. Code further down the call chain reaches it through
//! [`current`] instead of taking a client (or a key) as an argument.
//!
//! The binding is a tokio task-local, so two requests served concurrently
//! never see each other's client, even on the same worker thread. Futures
//! joined inside the handler (`tokio::join!`, `select!`) share the binding;
//! `tokio::spawn`ed tasks do not inherit it.

use crate::config::ServerConfig;
use crate::credential::Credential;
use crate::error::{GatewayError, GatewayResult};
use bugzilla_sdk::api::{BugsApi, DocsApi};
use bugzilla_sdk::BugzillaClient;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

tokio::task_local! {
    static CURRENT_CLIENT: Arc<ScopedClient>;
}

/// Counters of opened and released scoped clients.
#[derive(Debug, Default)]
pub struct ScopeStats {
    opened: AtomicU64,
    released: AtomicU64,
}

impl ScopeStats {
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Clients currently bound to an in-flight request.
    pub fn active(&self) -> u64 {
        self.opened().saturating_sub(self.released())
    }
}

/// Bugzilla client bound to one request's credential.
#[derive(Debug)]
pub struct ScopedClient {
    client: BugzillaClient,
    fingerprint: String,
    _release: ReleaseGuard,
}

impl ScopedClient {
    pub fn bugs(&self) -> BugsApi<'_> {
        self.client.bugs()
    }

    pub fn docs(&self) -> DocsApi<'_> {
        self.client.docs()
    }

    /// Log-safe identifier of the bound credential.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Debug)]
struct ReleaseGuard {
    stats: Arc<ScopeStats>,
    fingerprint: String,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        debug!(credential = %self.fingerprint, "Released scoped Bugzilla client");
    }
}

/// Factory and owner of request-scoped clients.
///
/// Connection pooling is shared between all scoped clients; credentials are
/// attached per client and never leave it.
#[derive(Debug)]
pub struct ClientScope {
    config: Arc<ServerConfig>,
    pool: reqwest::Client,
    stats: Arc<ScopeStats>,
}

impl ClientScope {
    pub fn new(config: Arc<ServerConfig>) -> GatewayResult<Self> {
        let pool = reqwest::Client::builder()
            .user_agent(concat!("mcp-bugzilla/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            pool,
            stats: Arc::new(ScopeStats::default()),
        })
    }

    pub fn stats(&self) -> &Arc<ScopeStats> {
        &self.stats
    }

    /// Run `fut` with a client bound to `credential`.
    ///
    /// The client is released when `fut` completes, fails, or is dropped
    /// before completion (cancellation, deadline). Each client is released
    /// exactly once.
    pub async fn enter<F>(&self, credential: Credential, fut: F) -> GatewayResult<F::Output>
    where
        F: Future,
    {
        let client = Arc::new(self.open(&credential)?);
        Ok(CURRENT_CLIENT.scope(client, fut).await)
    }

    fn open(&self, credential: &Credential) -> GatewayResult<ScopedClient> {
        let client = BugzillaClient::builder()
            .base_url(self.config.bugzilla_server())
            .api_key(credential.expose())
            .auth_scheme(self.config.auth_scheme)
            .timeout(self.config.tracker_timeout)
            .retry_policy(self.config.retry_policy.clone())
            .http_client(self.pool.clone())
            .build()
            .map_err(|e| match e {
                // A key that is not a valid header value is the caller's problem.
                bugzilla_sdk::BugzillaError::Config(message) => GatewayError::Validation(message),
                other => GatewayError::from(other),
            })?;

        let fingerprint = credential.fingerprint();
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        debug!(credential = %fingerprint, "Opened scoped Bugzilla client");

        Ok(ScopedClient {
            client,
            fingerprint: fingerprint.clone(),
            _release: ReleaseGuard {
                stats: self.stats.clone(),
                fingerprint,
            },
        })
    }
}

/// The client bound to the calling request.
///
/// Calling this outside [`ClientScope::enter`] is a programming error and
/// yields [`GatewayError::Internal`].
pub fn current() -> GatewayResult<Arc<ScopedClient>> {
    CURRENT_CLIENT
        .try_with(Arc::clone)
        .map_err(|_| GatewayError::Internal("no Bugzilla client bound to this request".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn scope() -> ClientScope {
        let config = ServerConfig::new("https://bugzilla.example.com").unwrap();
        ClientScope::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_current_outside_scope_is_internal_error() {
        assert!(matches!(current(), Err(GatewayError::Internal(_))));
    }

    #[tokio::test]
    async fn test_current_inside_scope() {
        let scope = scope();
        let credential = Credential::new("key-a");
        let expected = credential.fingerprint();

        let seen = scope
            .enter(credential, async { current().map(|c| c.fingerprint().to_string()) })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(seen, expected);
        assert_eq!(scope.stats().opened(), 1);
        assert_eq!(scope.stats().released(), 1);
        assert!(matches!(current(), Err(GatewayError::Internal(_))));
    }

    #[tokio::test]
    async fn test_siblings_share_the_request_client() {
        let scope = scope();
        let credential = Credential::new("key-shared");
        let expected = credential.fingerprint();

        let (a, b) = scope
            .enter(credential, async {
                tokio::join!(
                    async { current().unwrap().fingerprint().to_string() },
                    async {
                        tokio::task::yield_now().await;
                        current().unwrap().fingerprint().to_string()
                    }
                )
            })
            .await
            .unwrap();

        assert_eq!(a, expected);
        assert_eq!(b, expected);
        assert_eq!(scope.stats().opened(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_are_isolated() {
        let scope = Arc::new(scope());
        let mut tasks = JoinSet::new();

        for i in 0..64u64 {
            let scope = scope.clone();
            tasks.spawn(async move {
                let credential = Credential::new(format!("key-{i}"));
                let expected = credential.fingerprint();
                scope
                    .enter(credential, async move {
                        for round in 0..5 {
                            tokio::time::sleep(Duration::from_millis((i * 7 + round) % 5)).await;
                            let seen = current().unwrap();
                            assert_eq!(seen.fingerprint(), expected, "request {i} saw a foreign client");
                        }
                    })
                    .await
                    .unwrap();
            });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }
        assert_eq!(scope.stats().opened(), 64);
        assert_eq!(scope.stats().released(), 64);
        assert_eq!(scope.stats().active(), 0);
    }

    #[tokio::test]
    async fn test_released_once_when_handler_fails() {
        let scope = scope();

        let outcome = scope
            .enter(Credential::new("key-err"), async {
                current()?;
                Err::<(), GatewayError>(GatewayError::Parse("bad shape".to_string()))
            })
            .await
            .unwrap();

        assert!(outcome.is_err());
        assert_eq!(scope.stats().opened(), 1);
        assert_eq!(scope.stats().released(), 1);
    }

    #[tokio::test]
    async fn test_released_once_when_cancelled() {
        let scope = Arc::new(scope());

        let task = {
            let scope = scope.clone();
            tokio::spawn(async move {
                scope
                    .enter(Credential::new("key-cancel"), async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    })
                    .await
            })
        };

        while scope.stats().opened() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(scope.stats().active(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert_eq!(scope.stats().opened(), 1);
        assert_eq!(scope.stats().released(), 1);
    }

    #[tokio::test]
    async fn test_released_once_on_deadline() {
        let scope = scope();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            scope.enter(Credential::new("key-deadline"), async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(scope.stats().opened(), 1);
        assert_eq!(scope.stats().released(), 1);
    }

    #[tokio::test]
    async fn test_invalid_key_never_opens_a_client() {
        let scope = scope();

        let err = scope
            .enter(Credential::new("bad\nkey"), async {})
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(scope.stats().opened(), 0);
    }
}
