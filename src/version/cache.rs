//! Per-run tag cache
//!
//! A [`TagRepository`] lives for exactly one check run. Each repository key is
//! fetched at most once: concurrent callers wait for the first lookup and
//! every later caller receives the same outcome, failures included.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::image::RepositoryKey;
use crate::version::error::FetchError;
use crate::version::registry::Registry;

/// Tags of a repository in listing order
pub type Tags = Arc<[String]>;

type Entry = Arc<OnceCell<Result<Tags, FetchError>>>;

pub struct TagRepository {
    entries: Mutex<HashMap<RepositoryKey, Entry>>,
    fetch_timeout: Duration,
    cancel: CancellationToken,
    fetches: AtomicUsize,
}

impl TagRepository {
    pub fn new(fetch_timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fetch_timeout,
            cancel,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Get the tags of a repository, listing them from the registry on first use
    pub async fn get_tags(
        &self,
        repository: &RepositoryKey,
        registry: &dyn Registry,
    ) -> Result<Tags, FetchError> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(repository.clone()).or_default().clone()
        };

        entry
            .get_or_init(|| self.fetch(repository, registry))
            .await
            .clone()
    }

    /// Number of outbound registry calls made so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    async fn fetch(&self, repository: &RepositoryKey, registry: &dyn Registry) -> Result<Tags, FetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!("Listing tags for {} via {}", repository, registry.name());

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            outcome = tokio::time::timeout(self.fetch_timeout, registry.list_tags(repository)) => {
                match outcome {
                    Ok(Ok(tags)) => Ok(Tags::from(tags)),
                    Ok(Err(e)) => Err(FetchError::from(e)),
                    Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
                }
            }
        };

        match &result {
            Ok(tags) => info!("Found {} tags for {}", tags.len(), repository),
            Err(e) => warn!("Failed to list tags for {}: {}", repository, e),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::error::RegistryError;
    use crate::version::registry::MockRegistry;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn nginx() -> RepositoryKey {
        RepositoryKey::new("docker.io", "library", "nginx")
    }

    /// Registry that answers after a delay and counts its calls
    struct SlowRegistry {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl SlowRegistry {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Registry for SlowRegistry {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn list_tags(&self, _repository: &RepositoryKey) -> Result<Vec<String>, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec!["1.0.0".to_string()])
        }
    }

    #[tokio::test]
    async fn get_tags_lists_each_repository_once() {
        let mut registry = MockRegistry::new();
        registry.expect_name().return_const("mock");
        registry
            .expect_list_tags()
            .withf(|key| key.to_string() == "docker.io/library/nginx")
            .times(1)
            .returning(|_| Ok(vec!["1.0.0".to_string(), "1.1.0".to_string()]));

        let repository = TagRepository::new(TIMEOUT, CancellationToken::new());

        let first = repository.get_tags(&nginx(), &registry).await.unwrap();
        let second = repository.get_tags(&nginx(), &registry).await.unwrap();

        assert_eq!(&*first, &["1.0.0".to_string(), "1.1.0".to_string()]);
        assert_eq!(first, second);
        assert_eq!(repository.fetch_count(), 1);
    }

    #[tokio::test]
    async fn get_tags_lists_distinct_repositories_separately() {
        let mut registry = MockRegistry::new();
        registry.expect_name().return_const("mock");
        registry
            .expect_list_tags()
            .times(2)
            .returning(|key| Ok(vec![format!("{}-tag", key.name)]));

        let repository = TagRepository::new(TIMEOUT, CancellationToken::new());
        let redis = RepositoryKey::new("docker.io", "library", "redis");

        let nginx_tags = repository.get_tags(&nginx(), &registry).await.unwrap();
        let redis_tags = repository.get_tags(&redis, &registry).await.unwrap();

        assert_eq!(&*nginx_tags, &["nginx-tag".to_string()]);
        assert_eq!(&*redis_tags, &["redis-tag".to_string()]);
        assert_eq!(repository.fetch_count(), 2);
    }

    #[tokio::test]
    async fn get_tags_caches_failures_for_the_run() {
        let mut registry = MockRegistry::new();
        registry.expect_name().return_const("mock");
        registry
            .expect_list_tags()
            .times(1)
            .returning(|key| Err(RegistryError::NotFound(key.to_string())));

        let repository = TagRepository::new(TIMEOUT, CancellationToken::new());

        let first = repository.get_tags(&nginx(), &registry).await;
        let second = repository.get_tags(&nginx(), &registry).await;

        assert!(matches!(first, Err(FetchError::Registry(_))));
        assert!(matches!(second, Err(FetchError::Registry(_))));
        assert_eq!(repository.fetch_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_lookup() {
        let registry = SlowRegistry::new(Duration::from_millis(50));
        let repository = TagRepository::new(TIMEOUT, CancellationToken::new());
        let key = nginx();

        let results = futures::future::join_all(
            (0..5).map(|_| repository.get_tags(&key, &registry)),
        )
        .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
        assert_eq!(repository.fetch_count(), 1);
    }

    #[tokio::test]
    async fn get_tags_times_out_slow_registries() {
        let registry = SlowRegistry::new(Duration::from_secs(2));
        let repository = TagRepository::new(Duration::from_millis(10), CancellationToken::new());

        let result = repository.get_tags(&nginx(), &registry).await;

        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn get_tags_returns_cancelled_when_run_is_cancelled() {
        let registry = SlowRegistry::new(Duration::from_secs(2));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let repository = TagRepository::new(TIMEOUT, cancel);

        let result = repository.get_tags(&nginx(), &registry).await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
