//! Photo metadata collection.
//!
//! The collector asks a [`PhotoLibrary`] for assets matching a
//! [`PhotoQuery`], resolves each asset's file size on its own task, waits
//! for every lookup and only then publishes the records. Consumers either
//! see the previous complete list or the new complete list, never a
//! partially filled one.

use crate::collector::types::{Asset, AuthorizationStatus, PhotoMetadata, PhotoQuery};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A device photo library.
pub trait PhotoLibrary: Send + Sync + 'static {
    /// Ask the user for photo-library access.
    fn request_authorization(&self) -> impl Future<Output = AuthorizationStatus> + Send;

    /// Image assets matching the query's date range, order and limit.
    fn fetch_assets(&self, query: &PhotoQuery) -> impl Future<Output = Vec<Asset>> + Send;

    /// Size in bytes of the asset's primary resource, if available.
    fn resource_size(&self, asset: &Asset) -> impl Future<Output = Option<u64>> + Send;
}

/// Errors that can occur during photo collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorError {
    /// A collection is already outstanding on this collector
    AlreadyRunning,
    /// A size lookup task failed to complete
    Lookup(String),
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Photo collection is already running"),
            CollectorError::Lookup(msg) => write!(f, "Photo size lookup failed: {msg}"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// Outcome of a finished collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReport {
    /// Authorization state returned by the library
    pub status: AuthorizationStatus,
    /// Number of records published
    pub published: usize,
}

/// Collects photo metadata and publishes complete result sets.
pub struct PhotoCollector<L> {
    library: Arc<L>,
    published: watch::Sender<Vec<PhotoMetadata>>,
    running: AtomicBool,
}

impl<L: PhotoLibrary> PhotoCollector<L> {
    pub fn new(library: L) -> Self {
        let (published, _) = watch::channel(Vec::new());
        Self {
            library: Arc::new(library),
            published,
            running: AtomicBool::new(false),
        }
    }

    /// Run one collection. Resolves once the results are published.
    ///
    /// A call made while another collection is outstanding is rejected with
    /// [`CollectorError::AlreadyRunning`] and leaves the running one alone.
    pub async fn collect(&self, query: PhotoQuery) -> Result<CollectionReport, CollectorError> {
        let _guard = RunGuard::acquire(&self.running)?;

        let status = self.library.request_authorization().await;
        if !status.is_granted() {
            warn!(?status, "Photo library permission refused");
            self.published.send_replace(Vec::new());
            return Ok(CollectionReport {
                status,
                published: 0,
            });
        }

        let assets = query.apply(self.library.fetch_assets(&query).await);
        debug!(count = assets.len(), "Resolving photo sizes");

        let mut lookups = JoinSet::new();
        for (index, asset) in assets.into_iter().enumerate() {
            let library = Arc::clone(&self.library);
            lookups.spawn(async move {
                let size = library.resource_size(&asset).await.unwrap_or(0);
                (index, PhotoMetadata::from_asset(&asset, size))
            });
        }

        let mut resolved = Vec::with_capacity(lookups.len());
        while let Some(joined) = lookups.join_next().await {
            resolved.push(joined.map_err(|e| CollectorError::Lookup(e.to_string()))?);
        }

        // Tasks finish in any order; restore the query order
        resolved.sort_by_key(|(index, _)| *index);
        let records: Vec<PhotoMetadata> = resolved.into_iter().map(|(_, record)| record).collect();
        let published = records.len();

        self.published.send_replace(records);
        info!(published, "Photo metadata published");

        Ok(CollectionReport { status, published })
    }

    /// The last published list.
    pub fn photos(&self) -> Vec<PhotoMetadata> {
        self.published.borrow().clone()
    }

    /// Subscribe to published lists.
    pub fn subscribe(&self) -> watch::Receiver<Vec<PhotoMetadata>> {
        self.published.subscribe()
    }

    /// Check if a collection is currently outstanding.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Holds the running flag for the duration of one collection.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CollectorError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| CollectorError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
