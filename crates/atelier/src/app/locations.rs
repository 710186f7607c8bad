//! Concurrent aggregation of locations from independent providers.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::errors::{DomainError, ProviderError};
use crate::domain::model::Location;

/// A source of candidate locations.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human readable provider name used in error messages and logs.
    fn name(&self) -> &str;

    /// Fetch this provider's locations. Paths must already be canonical.
    async fn fetch(&self) -> Result<Vec<Location>, ProviderError>;
}

/// Runs every provider concurrently and merges their results in provider order.
#[derive(Clone, Default)]
pub struct LocationManager {
    providers: Vec<Arc<dyn Provider>>,
}

impl LocationManager {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }

    /// Fetch from all providers and return the deduplicated union.
    ///
    /// Blocks until every provider finishes. Any provider error fails the whole call; partial
    /// results are never returned. Earlier providers win when two locations share a canonical
    /// path. Canceling `cancel` aborts in-flight fetches.
    pub async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Location>, DomainError> {
        let handles: Vec<JoinHandle<Result<Vec<Location>, ProviderError>>> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                tokio::spawn(async move {
                    let started = Instant::now();
                    let result = provider.fetch().await;
                    debug!(
                        provider = provider.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        ok = result.is_ok(),
                        "provider finished"
                    );
                    result
                })
            })
            .collect();
        let aborts: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                for handle in &aborts {
                    handle.abort();
                }
                return Err(DomainError::AggregationCanceled);
            }
            joined = join_all(handles) => joined,
        };

        let mut results = Vec::with_capacity(joined.len());
        for (provider, outcome) in self.providers.iter().zip(joined) {
            let failed = |source| DomainError::ProviderFailed {
                provider: provider.name().to_string(),
                source,
            };
            match outcome {
                Ok(Ok(locations)) => results.push(locations),
                Ok(Err(source)) => return Err(failed(source)),
                Err(err) => return Err(failed(ProviderError::Task(err.to_string()))),
            }
        }

        Ok(merge_by_path(results))
    }
}

/// Concatenate provider results in order, keeping only the first location per canonical path.
pub fn merge_by_path(results: Vec<Vec<Location>>) -> Vec<Location> {
    let capacity = results.iter().map(Vec::len).sum();
    let mut seen: HashSet<PathBuf> = HashSet::with_capacity(capacity);
    let mut merged = Vec::with_capacity(capacity);

    for locations in results {
        for location in locations {
            if seen.insert(location.path.clone()) {
                merged.push(location);
            } else {
                debug!(name = %location.name, path = %location.path.display(), "duplicate location dropped");
            }
        }
    }
    merged
}
