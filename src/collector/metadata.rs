//! Capture time and GPS position read from a photo's EXIF block.

use crate::collector::types::Coordinate;
use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Tag, Value};
use std::path::Path;

/// EXIF timestamp layout, e.g. `2023:07:14 16:45:30`.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// What the EXIF block says about where and when a photo was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExifDetails {
    /// `DateTimeOriginal`, read as UTC
    pub taken_at: Option<DateTime<Utc>>,
    /// GPS latitude/longitude, signed by their reference tags
    pub location: Option<Coordinate>,
}

/// Read the EXIF details of an image file.
///
/// Returns `None` when the file has no readable EXIF block.
pub fn read_exif_details(path: &Path) -> Option<ExifDetails> {
    let file = std::fs::File::open(path).ok()?;
    let mut bufreader = std::io::BufReader::new(&file);
    let exif = exif::Reader::new()
        .read_from_container(&mut bufreader)
        .ok()?;

    Some(ExifDetails {
        taken_at: taken_at(&exif),
        location: gps_location(&exif),
    })
}

fn first_ascii(exif: &exif::Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|raw| String::from_utf8_lossy(raw).trim().to_string()),
        _ => None,
    }
}

fn taken_at(exif: &exif::Exif) -> Option<DateTime<Utc>> {
    let raw = first_ascii(exif, Tag::DateTimeOriginal)?;
    NaiveDateTime::parse_from_str(&raw, EXIF_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn gps_location(exif: &exif::Exif) -> Option<Coordinate> {
    let latitude = gps_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let longitude = gps_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    Some(Coordinate::new(latitude, longitude))
}

fn gps_degrees(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let reference = first_ascii(exif, ref_tag)?;
    let parts: Vec<f64> = match &exif.get_field(value_tag, In::PRIMARY)?.value {
        Value::Rational(parts) => parts.iter().map(|r| r.to_f64()).collect(),
        Value::SRational(parts) => parts.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };
    let &[degrees, minutes, seconds] = parts.as_slice() else {
        return None;
    };
    Some(signed_degrees(degrees, minutes, seconds, &reference))
}

/// Degrees/minutes/seconds to decimal degrees; south and west are negative.
fn signed_degrees(degrees: f64, minutes: f64, seconds: f64, reference: &str) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference {
        "S" | "W" => -value,
        _ => value,
    }
}
