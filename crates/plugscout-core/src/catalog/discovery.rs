//! Bulk discovery
//!
//! Fans one fetch task per listing entry out over a bounded pool. Each task
//! hands back its entry name with the outcome and the report is merged at
//! the join. Partial success is success.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Result, ScoutError};

use super::fetcher::ManifestSource;
use super::types::{CatalogListing, DiscoveredMarketplace};

/// One entry that could not be discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub name: String,
    pub error: String,
}

/// Everything a discovery run produced
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub marketplaces: HashMap<String, DiscoveredMarketplace>,
    pub failures: Vec<FetchFailure>,
}

impl DiscoveryReport {
    pub fn is_total_failure(&self) -> bool {
        self.marketplaces.is_empty() && !self.failures.is_empty()
    }

    /// Map view: the successes, or an aggregate error when nothing succeeded
    pub fn into_result(self) -> Result<HashMap<String, DiscoveredMarketplace>> {
        if self.is_total_failure() {
            return Err(ScoutError::AllFetchesFailed {
                failures: self
                    .failures
                    .into_iter()
                    .map(|f| (f.name, f.error))
                    .collect(),
            });
        }
        Ok(self.marketplaces)
    }
}

/// Bounded fan-out over a [`ManifestSource`]
#[derive(Clone)]
pub struct Discovery {
    source: Arc<dyn ManifestSource>,
    max_concurrent: usize,
}

impl Discovery {
    pub fn new(source: Arc<dyn ManifestSource>, max_concurrent: usize) -> Self {
        Self {
            source,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Discover every entry; fails only when every entry failed.
    pub async fn discover_all(
        &self,
        listing: &[CatalogListing],
    ) -> Result<HashMap<String, DiscoveredMarketplace>> {
        self.discover_all_detailed(listing).await.into_result()
    }

    /// Discover every entry and report successes and failures separately.
    pub async fn discover_all_detailed(&self, listing: &[CatalogListing]) -> DiscoveryReport {
        let gate = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for entry in listing.iter().cloned() {
            let source = self.source.clone();
            let gate = gate.clone();

            tasks.spawn(async move {
                let name = entry.name.clone();
                let Ok(_permit) = gate.acquire_owned().await else {
                    return (name, Err(ScoutError::Cancelled));
                };

                // A panicking fetch surfaces here as a JoinError, still tied to `name`.
                let fetch = tokio::spawn(async move { source.fetch(&entry).await });
                let outcome = match fetch.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ScoutError::Task(e.to_string())),
                };
                (name, outcome)
            });
        }

        let mut report = DiscoveryReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(found))) => {
                    report.marketplaces.insert(name, found);
                }
                Ok((name, Err(e))) => report.failures.push(FetchFailure {
                    name,
                    error: e.to_string(),
                }),
                Err(e) => tracing::warn!(error = %e, "discovery task did not complete"),
            }
        }

        // Only a cancelled outer task can leave an entry unsettled.
        for entry in listing {
            let settled = report.marketplaces.contains_key(&entry.name)
                || report.failures.iter().any(|f| f.name == entry.name);
            if !settled {
                report.failures.push(FetchFailure {
                    name: entry.name.clone(),
                    error: ScoutError::Cancelled.to_string(),
                });
            }
        }

        for failure in &report.failures {
            tracing::warn!(marketplace = %failure.name, error = %failure.error, "discovery failed");
        }
        tracing::debug!(
            discovered = report.marketplaces.len(),
            failed = report.failures.len(),
            "discovery finished"
        );

        report
    }
}
