//! Telemetry collection for the Investigation Agent.
//!
//! Each platform service (location, photo library, device, URL-scheme
//! probe) sits behind a trait so the collectors run unchanged against a
//! phone's services or the host implementations in [`host`].

pub mod apps;
pub mod device;
pub mod host;
pub mod location;
pub mod metadata;
pub mod photos;
pub mod types;

// Re-export commonly used types
pub use apps::{detect_installed_apps, SchemeProbe, KNOWN_APPS};
pub use device::{DeviceInfo, DeviceSnapshot};
pub use host::{DirectoryPhotoLibrary, FixedLocationService, HostDevice, PathSchemeProbe};
pub use location::{LocationProvider, LocationService};
pub use metadata::{read_exif_details, ExifDetails};
pub use photos::{CollectionReport, CollectorError, PhotoCollector, PhotoLibrary};
pub use types::{
    Asset, AuthorizationStatus, Coordinate, PhotoMetadata, PhotoQuery, QueryError, SortOrder,
};
