//! Telemetry types shared by the collectors and the exporter.
//!
//! These types are produced once and never mutated afterwards; a newer
//! reading replaces an older one instead of updating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// A single photo item as reported by a photo library.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Library-specific identifier (a path for the directory library)
    pub id: String,
    /// Creation date, if the library knows it
    pub creation_date: Option<DateTime<Utc>>,
    /// Where the photo was taken, if known
    pub location: Option<Coordinate>,
}

impl Asset {
    pub fn new(id: impl Into<String>, creation_date: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            creation_date,
            location: None,
        }
    }

    /// Attach a location to this asset.
    pub fn with_location(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }
}

/// Metadata captured for one matching asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Creation timestamp, absent if the asset has none
    pub creation_date: Option<DateTime<Utc>>,
    /// File size in bytes (zero if unavailable)
    pub file_size: u64,
    /// Optional capture location
    pub location: Option<Coordinate>,
}

impl PhotoMetadata {
    /// Build the record for an asset once its size is known.
    pub fn from_asset(asset: &Asset, file_size: u64) -> Self {
        Self {
            creation_date: asset.creation_date,
            file_size,
            location: asset.location,
        }
    }
}

/// Sort order by creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// Photo-library authorization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    /// Access granted to a user-selected subset of the library
    Limited,
}

impl AuthorizationStatus {
    /// Whether assets may be read under this status.
    pub fn is_granted(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Limited
        )
    }
}

/// Invalid photo query parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    ZeroLimit,
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::ZeroLimit => write!(f, "Photo limit must be at least 1"),
            QueryError::InvertedRange { start, end } => {
                write!(f, "Start date {start} is after end date {end}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Which photos to collect: an inclusive date range, an order and a cap.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoQuery {
    limit: usize,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    order: SortOrder,
}

impl PhotoQuery {
    /// Create a query. `limit` must be positive and `start <= end`.
    pub fn new(
        limit: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        order: SortOrder,
    ) -> Result<Self, QueryError> {
        if limit == 0 {
            return Err(QueryError::ZeroLimit);
        }
        if start > end {
            return Err(QueryError::InvertedRange { start, end });
        }
        Ok(Self {
            limit,
            start,
            end,
            order,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Whether an asset's creation date falls inside the range.
    ///
    /// Assets without a creation date never match.
    pub fn matches(&self, asset: &Asset) -> bool {
        asset
            .creation_date
            .map(|date| date >= self.start && date <= self.end)
            .unwrap_or(false)
    }

    /// Filter, sort and cap a set of assets according to this query.
    pub fn apply(&self, assets: Vec<Asset>) -> Vec<Asset> {
        let mut matching: Vec<Asset> = assets.into_iter().filter(|a| self.matches(a)).collect();

        // Stable sort keeps library order among equal timestamps
        match self.order {
            SortOrder::Ascending => matching.sort_by_key(|a| a.creation_date),
            SortOrder::Descending => matching.sort_by(|a, b| b.creation_date.cmp(&a.creation_date)),
        }

        matching.truncate(self.limit);
        matching
    }
}
