//! Device descriptor and battery readings.

use serde::{Deserialize, Serialize};

/// Battery level reported when the platform cannot read it.
pub const UNKNOWN_BATTERY_LEVEL: f32 = -1.0;

/// Slack, in percent, absorbed before truncating a battery level.
const PERCENT_TOLERANCE: f32 = 1e-3;

/// A source of device information.
pub trait DeviceInfo {
    /// Battery charge in `0.0..=1.0`, or [`UNKNOWN_BATTERY_LEVEL`].
    fn battery_level(&self) -> f32;

    /// Human-readable description: `"<name> — <model>, <system> <version>"`.
    fn descriptor(&self) -> String;
}

/// Device readings taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub descriptor: String,
    pub battery_level: f32,
}

impl DeviceSnapshot {
    /// Read the device now.
    pub fn capture<D: DeviceInfo + ?Sized>(device: &D) -> Self {
        Self {
            descriptor: device.descriptor(),
            battery_level: device.battery_level(),
        }
    }

    /// Battery level as a truncated percentage.
    ///
    /// A level within [`PERCENT_TOLERANCE`] below a whole percent counts as
    /// that percent, so `0.53` reads as 53 despite `f32` rounding.
    pub fn battery_percent(&self) -> i32 {
        (self.battery_level * 100.0 + PERCENT_TOLERANCE).floor() as i32
    }
}

/// Format a descriptor from its parts.
pub fn format_descriptor(name: &str, model: &str, system: &str, version: &str) -> String {
    format!("{name} — {model}, {system} {version}")
}
