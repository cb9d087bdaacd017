//! Location provider publishing the most recent known coordinate.
//!
//! The provider asks its service for authorization, starts continuous
//! updates at the best available accuracy and keeps the latest coordinate
//! in a watch channel. Service errors are logged and otherwise ignored.

use crate::collector::types::Coordinate;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Desired accuracy for location updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Best,
    Reduced,
}

/// Error reported by a location service.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationError(pub String);

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Location error: {}", self.0)
    }
}

impl std::error::Error for LocationError {}

/// One delivery from a location service: a batch of fixes, oldest first.
pub type LocationUpdate = Result<Vec<Coordinate>, LocationError>;

/// A device location service.
pub trait LocationService: Send + 'static {
    /// Ask the user for continuous location access.
    fn request_authorization(&mut self);

    /// Begin delivering updates. Updates stop when the sender is dropped.
    fn start_updates(&mut self, accuracy: Accuracy) -> mpsc::Receiver<LocationUpdate>;
}

/// Publishes the latest coordinate reported by a [`LocationService`].
pub struct LocationProvider {
    latest: watch::Receiver<Option<Coordinate>>,
    task: JoinHandle<()>,
}

impl LocationProvider {
    /// Request authorization and start continuous updates.
    ///
    /// Must be called from within a Tokio runtime. The service is owned by
    /// the update task for as long as it keeps delivering.
    pub fn start<S: LocationService>(mut service: S) -> Self {
        service.request_authorization();
        let mut updates = service.start_updates(Accuracy::Best);
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let _service = service;
            while let Some(update) = updates.recv().await {
                match update {
                    Ok(batch) => {
                        if let Some(coordinate) = batch.last().copied() {
                            info!(
                                latitude = coordinate.latitude,
                                longitude = coordinate.longitude,
                                "Location updated"
                            );
                            tx.send_replace(Some(coordinate));
                        }
                    }
                    Err(e) => warn!("{e}"),
                }
            }
            debug!("Location service stopped delivering updates");
        });

        Self { latest: rx, task }
    }

    /// The most recent coordinate, if any update has arrived.
    pub fn latest(&self) -> Option<Coordinate> {
        *self.latest.borrow()
    }

    /// Subscribe to coordinate changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinate>> {
        self.latest.clone()
    }

    /// Whether the service is still delivering updates.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for LocationProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}
