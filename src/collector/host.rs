//! Host (desktop) implementations of the platform services.
//!
//! These let the agent run on a regular computer: photos come from an
//! image folder (capture time and position from EXIF where present), the
//! location from configuration, and device details from the operating
//! system.

use crate::collector::apps::SchemeProbe;
use crate::collector::device::{format_descriptor, DeviceInfo, UNKNOWN_BATTERY_LEVEL};
use crate::collector::location::{Accuracy, LocationError, LocationService, LocationUpdate};
use crate::collector::metadata::read_exif_details;
use crate::collector::photos::PhotoLibrary;
use crate::collector::types::{Asset, AuthorizationStatus, Coordinate, PhotoQuery};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions treated as images.
const IMAGE_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "heic", "heif", "gif", "tif", "tiff", "webp",
];

/// Photo library backed by the image files under a directory.
///
/// Access is granted when the directory can be read.
#[derive(Debug, Clone)]
pub struct DirectoryPhotoLibrary {
    root: PathBuf,
}

impl DirectoryPhotoLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(root: &Path) -> Vec<Asset> {
        WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
            .map(|entry| {
                let details = read_exif_details(entry.path()).unwrap_or_default();
                let creation_date = details.taken_at.or_else(|| {
                    entry
                        .metadata()
                        .ok()
                        .and_then(|m| m.created().or_else(|_| m.modified()).ok())
                        .map(DateTime::<Utc>::from)
                });
                let asset = Asset::new(entry.path().to_string_lossy(), creation_date);
                match details.location {
                    Some(location) => asset.with_location(location),
                    None => asset,
                }
            })
            .collect()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl PhotoLibrary for DirectoryPhotoLibrary {
    async fn request_authorization(&self) -> AuthorizationStatus {
        match tokio::fs::read_dir(&self.root).await {
            Ok(_) => AuthorizationStatus::Authorized,
            Err(e) => {
                warn!("Cannot read photo directory {:?}: {e}", self.root);
                AuthorizationStatus::Denied
            }
        }
    }

    async fn fetch_assets(&self, query: &PhotoQuery) -> Vec<Asset> {
        let root = self.root.clone();
        match tokio::task::spawn_blocking(move || Self::scan(&root)).await {
            Ok(assets) => {
                debug!(found = assets.len(), "Scanned photo directory");
                query.apply(assets)
            }
            Err(e) => {
                warn!("Photo directory scan failed: {e}");
                Vec::new()
            }
        }
    }

    async fn resource_size(&self, asset: &Asset) -> Option<u64> {
        tokio::fs::metadata(&asset.id).await.ok().map(|m| m.len())
    }
}

/// Location service reporting a fixed, configured coordinate.
///
/// Without a configured coordinate it reports that no fix is available.
pub struct FixedLocationService {
    coordinate: Option<Coordinate>,
    sender: Option<mpsc::Sender<LocationUpdate>>,
}

impl FixedLocationService {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self {
            coordinate,
            sender: None,
        }
    }
}

impl LocationService for FixedLocationService {
    fn request_authorization(&mut self) {
        debug!("Fixed location service needs no authorization");
    }

    fn start_updates(&mut self, _accuracy: Accuracy) -> mpsc::Receiver<LocationUpdate> {
        let (tx, rx) = mpsc::channel(1);
        let update = match self.coordinate {
            Some(coordinate) => Ok(vec![coordinate]),
            None => Err(LocationError("no location fix available".to_string())),
        };
        let _ = tx.try_send(update);
        // Keep the channel open so the provider keeps listening
        self.sender = Some(tx);
        rx
    }
}

/// Device information for the machine the agent runs on.
#[derive(Debug, Clone, Default)]
pub struct HostDevice;

impl DeviceInfo for HostDevice {
    fn battery_level(&self) -> f32 {
        read_battery_level().unwrap_or(UNKNOWN_BATTERY_LEVEL)
    }

    fn descriptor(&self) -> String {
        let name = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format_descriptor(
            &name,
            std::env::consts::ARCH,
            std::env::consts::OS,
            &os_version().unwrap_or_default(),
        )
    }
}

#[cfg(target_os = "linux")]
fn read_battery_level() -> Option<f32> {
    let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let kind = std::fs::read_to_string(path.join("type")).unwrap_or_default();
        if kind.trim() != "Battery" {
            continue;
        }
        if let Some(level) = std::fs::read_to_string(path.join("capacity"))
            .ok()
            .and_then(|raw| capacity_level(&raw))
        {
            return Some(level);
        }
    }
    None
}

/// Convert a sysfs `capacity` reading (whole percent) to a `0.0..=1.0` level.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn capacity_level(raw: &str) -> Option<f32> {
    let percent: u8 = raw.trim().parse().ok()?;
    Some(f32::from(percent.min(100)) / 100.0)
}

#[cfg(not(target_os = "linux"))]
fn read_battery_level() -> Option<f32> {
    None
}

#[cfg(target_os = "linux")]
fn os_version() -> Option<String> {
    let release = std::fs::read_to_string("/etc/os-release").ok()?;
    release
        .lines()
        .find_map(|line| line.strip_prefix("VERSION_ID="))
        .map(|v| v.trim_matches('"').to_string())
}

#[cfg(not(target_os = "linux"))]
fn os_version() -> Option<String> {
    None
}

/// Treats a scheme as openable when a handler binary of the same name is on `PATH`.
#[derive(Debug, Clone)]
pub struct PathSchemeProbe {
    search_path: Vec<PathBuf>,
}

impl PathSchemeProbe {
    /// Probe the directories of the current `PATH`.
    pub fn from_env() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        Self { search_path }
    }

    /// Probe an explicit list of directories.
    pub fn with_dirs(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }
}

impl SchemeProbe for PathSchemeProbe {
    fn can_open(&self, scheme: &str) -> bool {
        let name = scheme.trim_end_matches("://");
        if name.is_empty() {
            return false;
        }
        let binary = format!("{name}{}", std::env::consts::EXE_SUFFIX);
        self.search_path.iter().any(|dir| dir.join(&binary).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::device::DeviceSnapshot;
    use crate::collector::types::SortOrder;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/b/IMG_0001.JPG")));
        assert!(is_image(Path::new("shot.heic")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn test_directory_library_lists_images_with_sizes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.jpg"), vec![0u8; 2048]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("two.png"), vec![0u8; 10]).unwrap();
        std::fs::write(dir.path().join("readme.txt"), "skip").unwrap();

        let library = DirectoryPhotoLibrary::new(dir.path());
        assert_eq!(
            library.request_authorization().await,
            AuthorizationStatus::Authorized
        );

        let now = Utc::now();
        let query = PhotoQuery::new(
            10,
            now - Duration::hours(1),
            now + Duration::hours(1),
            SortOrder::Ascending,
        )
        .unwrap();
        let assets = library.fetch_assets(&query).await;
        assert_eq!(assets.len(), 2);

        let mut sizes = Vec::new();
        for asset in &assets {
            sizes.push(library.resource_size(asset).await.unwrap());
        }
        sizes.sort();
        assert_eq!(sizes, vec![10, 2048]);
    }

    #[tokio::test]
    async fn test_directory_library_prefers_exif() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/geotagged.jpg");
        std::fs::copy(fixture, dir.path().join("geotagged.jpg")).unwrap();

        let library = DirectoryPhotoLibrary::new(dir.path());
        let taken = Utc.with_ymd_and_hms(2023, 7, 14, 16, 45, 30).unwrap();
        let query = PhotoQuery::new(
            10,
            taken - Duration::days(1),
            taken + Duration::days(1),
            SortOrder::Descending,
        )
        .unwrap();

        let assets = library.fetch_assets(&query).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].creation_date, Some(taken));
        let location = assets[0].location.unwrap();
        assert!((location.latitude - 51.5).abs() < 1e-9);
        assert!((location.longitude + 0.12).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_directory_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryPhotoLibrary::new(dir.path().join("absent"));
        assert_eq!(
            library.request_authorization().await,
            AuthorizationStatus::Denied
        );
    }

    #[test]
    fn test_path_probe() {
        let dir = tempfile::tempdir().unwrap();
        let binary = format!("whatsapp{}", std::env::consts::EXE_SUFFIX);
        std::fs::write(dir.path().join(binary), "").unwrap();

        let probe = PathSchemeProbe::with_dirs(vec![dir.path().to_path_buf()]);
        assert!(probe.can_open("whatsapp://"));
        assert!(!probe.can_open("fb://"));
        assert!(!probe.can_open("://"));
    }

    #[test]
    fn test_sysfs_capacity_keeps_its_percent() {
        for percent in 0..=100 {
            let snapshot = DeviceSnapshot {
                descriptor: String::new(),
                battery_level: capacity_level(&format!("{percent}\n")).unwrap(),
            };
            assert_eq!(snapshot.battery_percent(), percent, "capacity {percent}");
        }
        assert_eq!(capacity_level("unknown"), None);
    }

    #[test]
    fn test_host_descriptor_shape() {
        let descriptor = HostDevice.descriptor();
        assert!(descriptor.contains(" — "));
        assert!(descriptor.contains(std::env::consts::OS));
    }

    #[test]
    fn test_fixed_location_reports_missing_fix() {
        let mut service = FixedLocationService::new(None);
        let mut rx = service.start_updates(Accuracy::Best);
        assert!(rx.try_recv().unwrap().is_err());

        let mut service = FixedLocationService::new(Some(Coordinate::new(48.85, 2.35)));
        let mut rx = service.start_updates(Accuracy::Best);
        assert_eq!(rx.try_recv().unwrap(), Ok(vec![Coordinate::new(48.85, 2.35)]));
    }
}
