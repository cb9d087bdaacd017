//! Investigation Agent - device telemetry bundled as JSON.
//!
//! This library collects a device's location, battery level, descriptor,
//! installed-app presence and photo-library metadata, and exports the
//! result as one JSON bundle that can be shared or uploaded.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Investigation Agent                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Location   │   │   Photo     │   │ Device/Apps │         │
//! │  │  Provider   │   │  Collector  │   │   Probes    │         │
//! │  └──────┬──────┘   └──────┬──────┘   └──────┬──────┘         │
//! │         └─────────────────┼─────────────────┘                │
//! │                           ▼                                  │
//! │                    ┌─────────────┐     ┌─────────────┐       │
//! │                    │   Bundle    │────▶│ Share/Upload│       │
//! │                    │   (JSON)    │     └─────────────┘       │
//! │                    └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use investigation_agent::collector::{
//!     DirectoryPhotoLibrary, FixedLocationService, HostDevice, PathSchemeProbe, PhotoQuery,
//!     SortOrder,
//! };
//! use investigation_agent::export::BundleStore;
//! use investigation_agent::{transparency, InvestigationAgent};
//!
//! # async fn run() {
//! let mut agent = InvestigationAgent::new(
//!     FixedLocationService::new(None),
//!     DirectoryPhotoLibrary::new("/home/me/Pictures"),
//!     BundleStore::in_dir("/tmp"),
//!     transparency::create_shared_log(),
//! );
//! agent.refresh_device(&HostDevice, &PathSchemeProbe::from_env());
//!
//! let end = chrono::Utc::now();
//! let start = end - chrono::Duration::days(30);
//! let query = PhotoQuery::new(20, start, end, SortOrder::Descending).unwrap();
//! agent.collect_photos(query).await.unwrap();
//! agent.save().unwrap();
//! # }
//! ```

pub mod agent;
pub mod collector;
pub mod config;
pub mod export;
pub mod transparency;
pub mod upload;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use agent::InvestigationAgent;
pub use collector::{Coordinate, PhotoCollector, PhotoMetadata, PhotoQuery, SortOrder};
pub use config::{Config, ConfigError};
pub use export::{BundleStore, ExportError, InvestigationBundle};
pub use transparency::{ActivityLog, ActivityStats, SharedActivityLog};
pub use upload::{UploadConfig, UploadError, UploadReceipt};

#[cfg(feature = "upload")]
pub use upload::UploadClient;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Declaration of what the agent collects, shown to users.
pub const COLLECTION_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║           INVESTIGATION AGENT - COLLECTION DECLARATION           ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent gathers device telemetry into one JSON bundle.       ║
║                                                                  ║
║  ✓ WHAT IS COLLECTED:                                            ║
║    • The last known location (latitude, longitude)               ║
║    • Battery level and a device description                      ║
║    • Which of WhatsApp, Facebook, Instagram are installed        ║
║    • Photo metadata in a date range: date, size, location        ║
║                                                                  ║
║  ✗ WHAT IS NEVER COLLECTED:                                      ║
║    • Photo contents (no pixels leave the device)                 ║
║    • Contacts, messages or app data                              ║
║                                                                  ║
║  The bundle is written locally. It only leaves the device when   ║
║  you run `investigation-agent share` or `upload`.                ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
