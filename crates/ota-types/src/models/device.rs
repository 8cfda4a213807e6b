//! Device policy records held by the registry.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Update policy and last observed state of one device.
///
/// Field names match the on-disk `devices.json` layout so existing fleets
/// load without migration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevicePolicy {
    /// Operator-facing label
    pub device_id: String,
    /// Hardware revision tag
    #[serde(default = "default_hardware_version")]
    pub hardware_version: String,
    /// Firmware version the device should run
    pub target_version: String,
    /// Where the device downloads `target_version` from
    pub firmware_url: String,
    /// Content hash of the artifact behind `firmware_url`
    pub checksum: String,
    /// Last successful (authenticated) poll
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    /// When the device was last seen reporting a new version
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    /// Version reported on the last poll
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    /// Network origin of the last poll
    #[serde(default, rename = "ip_address", skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
}

fn default_hardware_version() -> String {
    "1.0".to_string()
}

/// Parse a stored timestamp. RFC 3339 is what this server writes; older
/// registries hold naive ISO 8601 (`2024-05-01T12:00:00.123456`), read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
    }
}

impl DevicePolicy {
    /// Create a policy with no observations yet.
    pub fn new(
        device_id: impl Into<String>,
        target_version: impl Into<String>,
        firmware_url: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            hardware_version: default_hardware_version(),
            target_version: target_version.into(),
            firmware_url: firmware_url.into(),
            checksum: checksum.into(),
            last_check: None,
            last_update: None,
            current_version: None,
            source_address: None,
        }
    }

    /// Set the hardware revision tag.
    pub fn with_hardware_version(mut self, hardware_version: impl Into<String>) -> Self {
        self.hardware_version = hardware_version.into();
        self
    }

    /// Merge a partial update into this record. `None` fields are left alone.
    pub fn apply(&mut self, update: DevicePolicyUpdate) {
        let DevicePolicyUpdate {
            device_id,
            hardware_version,
            target_version,
            firmware_url,
            checksum,
            last_check,
            last_update,
            current_version,
            source_address,
        } = update;

        if let Some(v) = device_id {
            self.device_id = v;
        }
        if let Some(v) = hardware_version {
            self.hardware_version = v;
        }
        if let Some(v) = target_version {
            self.target_version = v;
        }
        if let Some(v) = firmware_url {
            self.firmware_url = v;
        }
        if let Some(v) = checksum {
            self.checksum = v;
        }
        if let Some(v) = last_check {
            self.last_check = Some(v);
        }
        if let Some(v) = last_update {
            self.last_update = Some(v);
        }
        if let Some(v) = current_version {
            self.current_version = Some(v);
        }
        if let Some(v) = source_address {
            self.source_address = Some(v);
        }
    }
}

/// Partial update of a [`DevicePolicy`]. Absent fields mean "leave untouched".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DevicePolicyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(default, rename = "ip_address", skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
}

impl DevicePolicyUpdate {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
