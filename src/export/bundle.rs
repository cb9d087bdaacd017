//! The investigation bundle: one JSON document combining everything the
//! agent currently holds.

use crate::collector::device::DeviceSnapshot;
use crate::collector::types::{Coordinate, PhotoMetadata};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder written for photos without a creation date.
pub const UNKNOWN_DATE: &str = "Inconnue";

/// Serialized form of a photo metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    /// Creation date (`YYYY-MM-DD HH:MM:SS +0000`) or [`UNKNOWN_DATE`]
    pub date: String,
    /// File size in kibibytes
    #[serde(rename = "fileSizeKB")]
    pub file_size_kb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
}

impl PhotoEntry {
    pub fn from_metadata(meta: &PhotoMetadata) -> Self {
        Self {
            date: meta
                .creation_date
                .map(format_photo_date)
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            file_size_kb: meta.file_size as f64 / 1024.0,
            location: meta.location,
        }
    }
}

fn format_photo_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S %z").to_string()
}

/// Everything the bundle is built from, as held at save time.
#[derive(Debug, Clone, Copy)]
pub struct BundleInputs<'a> {
    pub location: Option<Coordinate>,
    pub device: &'a DeviceSnapshot,
    pub installed_apps: &'a [String],
    pub photos: &'a [PhotoMetadata],
}

/// Snapshot of collected telemetry, written as one JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationBundle {
    /// Creation time (ISO-8601, UTC)
    pub timestamp: String,
    /// Device descriptor
    pub device: String,
    /// Battery percentage, e.g. `"73%"`
    pub battery: String,
    /// Last known coordinate (0, 0 when none was received)
    pub location: Coordinate,
    pub installed_apps: Vec<String>,
    pub photos_count: usize,
    pub photos: Vec<PhotoEntry>,
}

impl InvestigationBundle {
    /// Build a bundle stamped with `now`.
    pub fn build(inputs: BundleInputs<'_>, now: DateTime<Utc>) -> Self {
        let photos: Vec<PhotoEntry> = inputs.photos.iter().map(PhotoEntry::from_metadata).collect();
        Self {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            device: inputs.device.descriptor.clone(),
            battery: format!("{}%", inputs.device.battery_percent()),
            location: inputs.location.unwrap_or_default(),
            installed_apps: inputs.installed_apps.to_vec(),
            photos_count: photos.len(),
            photos,
        }
    }

    /// Pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn device() -> DeviceSnapshot {
        DeviceSnapshot {
            descriptor: "Field phone — iPhone, iOS 17.4".to_string(),
            battery_level: 0.73,
        }
    }

    fn photos() -> Vec<PhotoMetadata> {
        vec![
            PhotoMetadata {
                creation_date: Some(Utc.with_ymd_and_hms(2024, 2, 29, 18, 5, 9).unwrap()),
                file_size: 3_145_728,
                location: Some(Coordinate::new(45.764, 4.8357)),
            },
            PhotoMetadata {
                creation_date: None,
                file_size: 1_500,
                location: None,
            },
        ]
    }

    #[test]
    fn test_build_fields() {
        let device = device();
        let apps = vec!["WhatsApp".to_string()];
        let photos = photos();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        let bundle = InvestigationBundle::build(
            BundleInputs {
                location: None,
                device: &device,
                installed_apps: &apps,
                photos: &photos,
            },
            now,
        );

        assert_eq!(bundle.timestamp, "2024-03-01T08:00:00Z");
        assert_eq!(bundle.battery, "73%");
        assert_eq!(bundle.location, Coordinate::new(0.0, 0.0));
        assert_eq!(bundle.photos_count, 2);
        assert_eq!(bundle.photos[0].date, "2024-02-29 18:05:09 +0000");
        assert_eq!(bundle.photos[0].file_size_kb, 3072.0);
        assert_eq!(bundle.photos[1].date, UNKNOWN_DATE);
    }

    #[test]
    fn test_json_keys_and_round_trip() {
        let device = device();
        let apps = vec!["Facebook".to_string(), "Instagram".to_string()];
        let photos = photos();
        let bundle = InvestigationBundle::build(
            BundleInputs {
                location: Some(Coordinate::new(48.8566, 2.3522)),
                device: &device,
                installed_apps: &apps,
                photos: &photos,
            },
            Utc::now(),
        );

        let json = bundle.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["battery"], "73%");
        assert_eq!(value["installedApps"][1], "Instagram");
        assert_eq!(value["photosCount"], 2);
        assert_eq!(value["photos"][0]["location"]["latitude"], 45.764);
        assert!(value["photos"][1].get("location").is_none());
        assert_eq!(value["photos"][1]["fileSizeKB"].as_f64(), Some(1500.0 / 1024.0));

        let parsed = InvestigationBundle::from_json(&json).unwrap();
        assert_eq!(parsed, bundle);
        assert_eq!(parsed.photos_count, parsed.photos.len());
    }
}
