//! The agent: holds the collected state and turns it into bundles.
//!
//! State is filled by the collectors (location continuously, photos on
//! request, device and apps on [`InvestigationAgent::refresh_device`]) and
//! read back whenever a bundle is saved. Every operation logs its failure
//! and also returns it so the caller can react.

use crate::collector::apps::{detect_installed_apps, SchemeProbe, KNOWN_APPS};
use crate::collector::device::{DeviceInfo, DeviceSnapshot, UNKNOWN_BATTERY_LEVEL};
use crate::collector::location::{LocationProvider, LocationService};
use crate::collector::photos::{CollectionReport, CollectorError, PhotoCollector, PhotoLibrary};
use crate::collector::types::{Coordinate, PhotoMetadata, PhotoQuery};
use crate::export::{
    share_bundle, BundleInputs, BundleStore, ExportError, InvestigationBundle, ShareTarget,
};
use crate::transparency::SharedActivityLog;
use chrono::Utc;
use tracing::{error, info};

#[cfg(feature = "upload")]
use crate::upload::{UploadClient, UploadError, UploadReceipt};

/// Collected telemetry plus the means to export it.
pub struct InvestigationAgent<L> {
    location: LocationProvider,
    photos: PhotoCollector<L>,
    device: DeviceSnapshot,
    installed_apps: Vec<String>,
    store: BundleStore,
    activity: SharedActivityLog,
}

impl<L: PhotoLibrary> InvestigationAgent<L> {
    /// Start location updates and wire up the photo library.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<S: LocationService>(
        location_service: S,
        library: L,
        store: BundleStore,
        activity: SharedActivityLog,
    ) -> Self {
        Self {
            location: LocationProvider::start(location_service),
            photos: PhotoCollector::new(library),
            device: DeviceSnapshot {
                descriptor: String::new(),
                battery_level: UNKNOWN_BATTERY_LEVEL,
            },
            installed_apps: Vec::new(),
            store,
            activity,
        }
    }

    /// Read battery, device descriptor and installed apps.
    pub fn refresh_device<D, P>(&mut self, device: &D, probe: &P)
    where
        D: DeviceInfo + ?Sized,
        P: SchemeProbe + ?Sized,
    {
        self.device = DeviceSnapshot::capture(device);
        self.installed_apps = detect_installed_apps(probe, &KNOWN_APPS);
        info!(
            device = %self.device.descriptor,
            battery = self.device.battery_percent(),
            apps = self.installed_apps.len(),
            "Device refreshed"
        );
    }

    /// Collect photo metadata for `query` and publish it.
    pub async fn collect_photos(
        &self,
        query: PhotoQuery,
    ) -> Result<CollectionReport, CollectorError> {
        match self.photos.collect(query).await {
            Ok(report) => {
                self.activity
                    .record_collection(report.published, !report.status.is_granted());
                Ok(report)
            }
            Err(e) => {
                error!("Photo collection failed: {e}");
                Err(e)
            }
        }
    }

    /// Assemble a bundle from the state currently held.
    pub fn build_bundle(&self) -> InvestigationBundle {
        let photos = self.photos.photos();
        InvestigationBundle::build(
            BundleInputs {
                location: self.location.latest(),
                device: &self.device,
                installed_apps: &self.installed_apps,
                photos: &photos,
            },
            Utc::now(),
        )
    }

    /// Build a bundle and write it over the previous file.
    pub fn save(&self) -> Result<InvestigationBundle, ExportError> {
        let bundle = self.build_bundle();
        match self.store.save(&bundle) {
            Ok(()) => {
                self.activity.record_bundle_saved();
                Ok(bundle)
            }
            Err(e) => {
                error!("Could not save bundle: {e}");
                Err(e)
            }
        }
    }

    /// Hand the saved bundle to a share target.
    pub fn share<T: ShareTarget + ?Sized>(&self, target: &T) -> Result<(), ExportError> {
        match share_bundle(&self.store, target) {
            Ok(()) => {
                self.activity.record_bundle_shared();
                Ok(())
            }
            Err(e) => {
                error!("Could not share bundle: {e}");
                Err(e)
            }
        }
    }

    /// Upload the saved bundle once.
    #[cfg(feature = "upload")]
    pub async fn upload(&self, client: &UploadClient) -> Result<UploadReceipt, UploadError> {
        match client.upload_bundle(&self.store).await {
            Ok(receipt) => {
                self.activity.record_upload(receipt.is_success());
                Ok(receipt)
            }
            Err(e) => {
                self.activity.record_upload(false);
                error!("Upload failed: {e}");
                Err(e)
            }
        }
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.location.latest()
    }

    pub fn location_provider(&self) -> &LocationProvider {
        &self.location
    }

    pub fn photos(&self) -> Vec<PhotoMetadata> {
        self.photos.photos()
    }

    pub fn photo_collector(&self) -> &PhotoCollector<L> {
        &self.photos
    }

    pub fn device(&self) -> &DeviceSnapshot {
        &self.device
    }

    pub fn installed_apps(&self) -> &[String] {
        &self.installed_apps
    }

    pub fn store(&self) -> &BundleStore {
        &self.store
    }

    pub fn activity(&self) -> &SharedActivityLog {
        &self.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::host::FixedLocationService;
    use crate::collector::types::{Asset, AuthorizationStatus, SortOrder};
    use crate::transparency::create_shared_log;
    use chrono::{Duration, Utc};

    struct OnePhoto;

    impl PhotoLibrary for OnePhoto {
        async fn request_authorization(&self) -> AuthorizationStatus {
            AuthorizationStatus::Authorized
        }

        async fn fetch_assets(&self, query: &PhotoQuery) -> Vec<Asset> {
            query.apply(vec![Asset::new("a", Some(Utc::now() - Duration::days(1)))
                .with_location(Coordinate::new(10.0, 20.0))])
        }

        async fn resource_size(&self, _asset: &Asset) -> Option<u64> {
            Some(2048)
        }
    }

    struct Tablet;

    impl DeviceInfo for Tablet {
        fn battery_level(&self) -> f32 {
            0.42
        }

        fn descriptor(&self) -> String {
            "Tab — iPad, iPadOS 17.0".to_string()
        }
    }

    #[tokio::test]
    async fn test_collect_save_share() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::in_dir(dir.path());
        let activity = create_shared_log();
        let mut agent = InvestigationAgent::new(
            FixedLocationService::new(Some(Coordinate::new(43.6, 1.44))),
            OnePhoto,
            store,
            activity.clone(),
        );

        agent.refresh_device(&Tablet, &|scheme: &str| scheme == "fb://");
        assert_eq!(agent.installed_apps(), ["Facebook".to_string()]);

        let mut location = agent.location_provider().subscribe();
        location.wait_for(|c| c.is_some()).await.unwrap();

        let now = Utc::now();
        let query =
            PhotoQuery::new(5, now - Duration::days(30), now, SortOrder::Descending).unwrap();
        agent.collect_photos(query).await.unwrap();

        let bundle = agent.save().unwrap();
        assert_eq!(bundle.battery, "42%");
        assert_eq!(bundle.location, Coordinate::new(43.6, 1.44));
        assert_eq!(bundle.photos_count, 1);
        assert_eq!(bundle.photos[0].file_size_kb, 2.0);
        assert_eq!(agent.store().load().unwrap(), bundle);

        let outbox = dir.path().join("outbox");
        agent.share(&crate::export::DirectoryShare::new(&outbox)).unwrap();
        assert!(outbox.join("investigation_log.json").is_file());

        let stats = activity.stats();
        assert_eq!(stats.collections, 1);
        assert_eq!(stats.photos_collected, 1);
        assert_eq!(stats.bundles_saved, 1);
        assert_eq!(stats.bundles_shared, 1);
    }

    #[tokio::test]
    async fn test_save_without_location_uses_origin() {
        let dir = tempfile::tempdir().unwrap();
        let agent = InvestigationAgent::new(
            FixedLocationService::new(None),
            OnePhoto,
            BundleStore::in_dir(dir.path()),
            create_shared_log(),
        );

        let bundle = agent.save().unwrap();
        assert_eq!(bundle.location, Coordinate::default());
        assert_eq!(bundle.photos_count, 0);
        assert_eq!(bundle.battery, "-100%");
    }
}
