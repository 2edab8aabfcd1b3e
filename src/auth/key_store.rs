//! Lazily populated verification key cache.
//!
//! The key set is fetched from a [`KeySource`] on first use and kept until a
//! token names a key id the cache does not know. A miss triggers at most one
//! refetch per cooldown window, which is how rotated provider keys are picked
//! up without letting garbage key ids hammer the provider.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::jwks::{JwkSet, KeySet, VerificationKey};
use super::AuthError;

/// Anything that can produce the current public key set
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;

    /// Where the keys come from, for logging
    fn describe(&self) -> String;
}

/// Fetches a JWKS document over HTTP(S)
pub struct HttpKeySource {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(10))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::KeySetUnavailable(format!("{}: {}", self.url, e)))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(format!("{}: {}", self.url, e)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads a JWKS document from disk on every fetch
pub struct FileKeySource {
    path: PathBuf,
}

impl FileKeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KeySource for FileKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let contents = tokio::fs::read(&self.path).await.map_err(|e| {
            AuthError::KeySetUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_slice(&contents)
            .map_err(|e| AuthError::KeySetUnavailable(format!("{}: {}", self.path.display(), e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A fixed key set held in memory
pub struct StaticKeySource {
    keys: JwkSet,
}

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        Ok(self.keys.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} keys)", self.keys.keys.len())
    }
}

struct CachedKeys {
    keys: Arc<KeySet>,
    fetched_at: Instant,
}

/// Key cache shared by all requests.
///
/// Lookups only take the cache read lock. Refreshes are serialized by a
/// separate mutex, so a slow provider never blocks lookups of known keys;
/// the cache write lock is held only to swap in a fetched set.
pub struct KeyStore {
    source: Arc<dyn KeySource>,
    cached: RwLock<Option<CachedKeys>>,
    /// When the last fetch finished, successful or not
    last_attempt: Mutex<Option<Instant>>,
    refresh_cooldown: Duration,
}

impl KeyStore {
    pub fn new(source: Arc<dyn KeySource>, refresh_cooldown: Duration) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
            last_attempt: Mutex::new(None),
            refresh_cooldown,
        }
    }

    /// Resolve the verification key for `kid`, populating or refreshing the
    /// cache as needed.
    pub async fn key_for(&self, kid: &str) -> Result<VerificationKey, AuthError> {
        let observed = {
            let cached = self.cached.read().await;
            if let Some(cached) = cached.as_ref() {
                if let Some(key) = cached.keys.get(kid) {
                    return Ok(key.clone());
                }
                Some(cached.fetched_at)
            } else {
                None
            }
        };

        let keys = self.refresh(observed).await?;
        keys.get(kid).cloned().ok_or_else(|| {
            debug!("Key id '{}' not found in key set", kid);
            AuthError::UnknownKeyId
        })
    }

    /// Current key set, fetching it if the cache is empty
    pub async fn keys(&self) -> Result<Arc<KeySet>, AuthError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return Ok(Arc::clone(&cached.keys));
        }
        self.refresh(None).await
    }

    /// Drop the cached key set so the next lookup refetches
    pub async fn invalidate(&self) {
        let mut last_attempt = self.last_attempt.lock().await;
        *self.cached.write().await = None;
        *last_attempt = None;
    }

    /// Refetch unless another request already refreshed after `observed`, or
    /// the last attempt finished less than the cooldown ago.
    async fn refresh(&self, observed: Option<Instant>) -> Result<Arc<KeySet>, AuthError> {
        let mut last_attempt = self.last_attempt.lock().await;

        let current = self
            .cached
            .read()
            .await
            .as_ref()
            .map(|c| (Arc::clone(&c.keys), c.fetched_at));
        if let Some((keys, fetched_at)) = &current {
            if observed.map_or(true, |seen| *fetched_at > seen) {
                return Ok(Arc::clone(keys));
            }
        }

        if (*last_attempt).is_some_and(|at| at.elapsed() < self.refresh_cooldown) {
            return match current {
                Some((keys, _)) => Ok(keys),
                None => Err(AuthError::KeySetUnavailable(format!(
                    "{}: last fetch failed, retrying after cooldown",
                    self.source.describe()
                ))),
            };
        }

        let fetched = self.source.fetch().await;
        *last_attempt = Some(Instant::now());

        let jwks = match fetched {
            Ok(jwks) => jwks,
            Err(e) => {
                warn!("Failed to fetch key set from {}: {}", self.source.describe(), e);
                return Err(e);
            }
        };
        let keys = Arc::new(KeySet::from(&jwks));
        info!(
            "Loaded {} verification keys from {}",
            keys.len(),
            self.source.describe()
        );

        *self.cached.write().await = Some(CachedKeys {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::Jwk;
    use ed25519_dalek::{SigningKey, VerifyingKey};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn key(seed: u8) -> VerifyingKey {
        SigningKey::from_bytes(&[seed; 32]).verifying_key()
    }

    fn ed25519(result: Result<VerificationKey, AuthError>) -> VerifyingKey {
        *result.unwrap().as_ed25519().unwrap()
    }

    /// Key source whose published keys can change between fetches, and
    /// which can be switched to a slow failing provider.
    struct CountingSource {
        keys: std::sync::Mutex<JwkSet>,
        fetches: AtomicUsize,
        failing: AtomicBool,
        delay: Duration,
    }

    impl CountingSource {
        fn new(keys: Vec<Jwk>) -> Arc<Self> {
            Self::with_delay(keys, Duration::ZERO)
        }

        fn with_delay(keys: Vec<Jwk>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                keys: std::sync::Mutex::new(JwkSet { keys }),
                fetches: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                delay,
            })
        }

        fn publish(&self, keys: Vec<Jwk>) {
            *self.keys.lock().unwrap() = JwkSet { keys };
        }

        fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeySource for CountingSource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                tokio::time::sleep(self.delay).await;
                return Err(AuthError::KeySetUnavailable("provider down".to_owned()));
            }
            Ok(self.keys.lock().unwrap().clone())
        }

        fn describe(&self) -> String {
            "counting".to_owned()
        }
    }

    struct FailingSource;

    #[async_trait]
    impl KeySource for FailingSource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Err(AuthError::KeySetUnavailable("connection refused".to_owned()))
        }

        fn describe(&self) -> String {
            "failing".to_owned()
        }
    }

    #[tokio::test]
    async fn test_lazy_population() {
        let source = CountingSource::new(vec![Jwk::from_verifying_key("k1", &key(1))]);
        let store = KeyStore::new(source.clone(), Duration::from_secs(60));
        assert_eq!(source.fetches(), 0);

        assert_eq!(ed25519(store.key_for("k1").await), key(1));
        assert_eq!(ed25519(store.key_for("k1").await), key(1));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_miss_within_cooldown_does_not_refetch() {
        let source = CountingSource::new(vec![Jwk::from_verifying_key("k1", &key(1))]);
        let store = KeyStore::new(source.clone(), Duration::from_secs(60));

        store.key_for("k1").await.unwrap();
        assert_eq!(store.key_for("nope").await.err(), Some(AuthError::UnknownKeyId));
        assert_eq!(store.key_for("nope").await.err(), Some(AuthError::UnknownKeyId));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_miss_refreshes_rotated_keys() {
        let source = CountingSource::new(vec![Jwk::from_verifying_key("k1", &key(1))]);
        let store = KeyStore::new(source.clone(), Duration::ZERO);

        store.key_for("k1").await.unwrap();
        source.publish(vec![
            Jwk::from_verifying_key("k1", &key(1)),
            Jwk::from_verifying_key("k2", &key(2)),
        ]);

        assert_eq!(ed25519(store.key_for("k2").await), key(2));
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_source_failure_is_reported() {
        let store = KeyStore::new(Arc::new(FailingSource), Duration::ZERO);
        assert!(matches!(
            store.key_for("k1").await,
            Err(AuthError::KeySetUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_cold_fetch_respects_cooldown() {
        let source = CountingSource::new(vec![]);
        source.fail();
        let store = KeyStore::new(source.clone(), Duration::from_secs(60));

        for _ in 0..3 {
            assert!(matches!(
                store.key_for("k1").await,
                Err(AuthError::KeySetUnavailable(_))
            ));
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_slow_failing_refresh_does_not_block_known_keys() {
        let cooldown = Duration::from_millis(500);
        let delay = Duration::from_millis(800);
        let source =
            CountingSource::with_delay(vec![Jwk::from_verifying_key("k1", &key(1))], delay);
        let store = Arc::new(KeyStore::new(source.clone(), cooldown));

        store.key_for("k1").await.unwrap();
        tokio::time::sleep(cooldown + Duration::from_millis(100)).await;
        source.fail();

        // An unknown kid starts a slow refresh in the background
        let garbage = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.key_for("garbage").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.fetches(), 2);

        let started = Instant::now();
        assert_eq!(ed25519(store.key_for("k1").await), key(1));
        assert!(
            started.elapsed() < Duration::from_millis(300),
            "known kid waited {:?}",
            started.elapsed()
        );

        assert!(matches!(
            garbage.await.unwrap(),
            Err(AuthError::KeySetUnavailable(_))
        ));

        // The failed attempt starts a new cooldown window
        let started = Instant::now();
        for kid in ["garbage-2", "garbage-3"] {
            assert_eq!(store.key_for(kid).await.err(), Some(AuthError::UnknownKeyId));
        }
        assert!(started.elapsed() < Duration::from_millis(300));
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let source = CountingSource::new(vec![Jwk::from_verifying_key("k1", &key(1))]);
        let store = Arc::new(KeyStore::new(source.clone(), Duration::from_secs(60)));

        let lookups: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.key_for("k1").await })
            })
            .collect();
        for lookup in lookups {
            assert_eq!(ed25519(lookup.await.unwrap()), key(1));
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = CountingSource::new(vec![Jwk::from_verifying_key("k1", &key(1))]);
        let store = KeyStore::new(source.clone(), Duration::from_secs(60));

        assert_eq!(store.keys().await.unwrap().len(), 1);
        store.invalidate().await;
        store.keys().await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwks.json");
        let set = JwkSet {
            keys: vec![Jwk::from_verifying_key("file-key", &key(9))],
        };
        std::fs::write(&path, serde_json::to_vec(&set).unwrap()).unwrap();

        let store = KeyStore::new(Arc::new(FileKeySource::new(&path)), Duration::ZERO);
        assert_eq!(ed25519(store.key_for("file-key").await), key(9));

        let missing = KeyStore::new(
            Arc::new(FileKeySource::new(dir.path().join("missing.json"))),
            Duration::ZERO,
        );
        assert!(matches!(
            missing.key_for("file-key").await,
            Err(AuthError::KeySetUnavailable(_))
        ));
    }
}
