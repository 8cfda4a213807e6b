//! Update decision engine: one device poll in, one decision out.
//!
//! Order of checks per poll:
//!
//! 1. input validation          → `BadRequest`, registry untouched
//! 2. registry lookup           → `Unauthorized` (not on the fleet list)
//! 3. token verification        → `AuthenticationFailed`
//! 4. target vs reported version
//! 5. best-effort observation write-back
//!
//! Step 2 runs before step 3, as in the deployed server. This lets an
//! unauthenticated caller tell registered MACs from unregistered ones.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use ota_types::{CheckError, DevicePolicy, DevicePolicyUpdate, MacAddress, UpdateCheckResponse};

use super::auth::{verify_token, SharedSecret};
use super::version::{compare_versions, SemVer};
use crate::modules::registry::DeviceRegistry;

/// Source of "now" for observation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Raw poll parameters as received from the transport.
#[derive(Debug, Clone, Default)]
pub struct UpdateCheckRequest {
    pub device_id: String,
    pub hardware: String,
    pub version: String,
    pub mac: String,
    pub auth_token: Option<String>,
    /// Client address as seen by the transport, if known
    pub source_address: Option<String>,
}

/// Poll parameters after step 1.
struct ValidatedCheck {
    mac: MacAddress,
    reported: SemVer,
    reported_raw: String,
    token: String,
}

pub struct UpdateDecisionEngine {
    registry: Arc<DeviceRegistry>,
    secret: SharedSecret,
    clock: Arc<dyn Clock>,
}

impl UpdateDecisionEngine {
    pub fn new(registry: Arc<DeviceRegistry>, secret: SharedSecret) -> Self {
        Self::with_clock(registry, secret, Arc::new(SystemClock))
    }

    pub fn with_clock(registry: Arc<DeviceRegistry>, secret: SharedSecret, clock: Arc<dyn Clock>) -> Self {
        Self { registry, secret, clock }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Run the full poll state machine.
    pub async fn check(&self, request: UpdateCheckRequest) -> Result<UpdateCheckResponse, CheckError> {
        tracing::info!(
            mac = %request.mac,
            device_id = %request.device_id,
            hardware = %request.hardware,
            version = %request.version,
            "Received update check"
        );

        let check = validate(&request).map_err(|e| {
            tracing::warn!(mac = %request.mac, "Bad update check: {}", e);
            e
        })?;
        let mac = &check.mac;

        let policy = match self.registry.get(mac).await {
            Ok(policy) => policy,
            Err(ota_types::RegistryError::NotFound { .. }) => {
                tracing::warn!(mac = %mac, "Unauthorized MAC address");
                return Err(CheckError::Unauthorized { mac: mac.to_string() });
            }
            Err(e) => {
                tracing::error!(mac = %mac, "Registry lookup failed: {}", e);
                return Err(e.into());
            }
        };

        if !verify_token(mac, &check.token, &self.secret) {
            tracing::warn!(mac = %mac, "Authentication failed");
            return Err(CheckError::AuthenticationFailed { mac: mac.to_string() });
        }
        tracing::info!(mac = %mac, "Authentication successful");

        let response = decide(&policy, check.reported, mac);

        self.record_observation(&check, &policy, request.source_address).await;

        Ok(response)
    }

    /// Step 5. Failures are logged and swallowed.
    async fn record_observation(
        &self,
        check: &ValidatedCheck,
        previous: &DevicePolicy,
        source_address: Option<String>,
    ) {
        let now = self.clock.now();
        let version_changed = previous
            .current_version
            .as_deref()
            .and_then(|v| SemVer::parse(v).ok())
            .is_some_and(|prev| prev != check.reported);

        let update = DevicePolicyUpdate {
            last_check: Some(now),
            last_update: version_changed.then_some(now),
            current_version: Some(check.reported_raw.clone()),
            source_address,
            ..Default::default()
        };

        if let Err(e) = self.registry.update_fields(&check.mac, update).await {
            tracing::warn!(mac = %check.mac, "Failed to record update check: {}", e);
        }
    }
}

fn validate(request: &UpdateCheckRequest) -> Result<ValidatedCheck, CheckError> {
    let token = request.auth_token.as_deref().unwrap_or_default();
    if [&request.device_id, &request.hardware, &request.version, &request.mac]
        .iter()
        .any(|field| field.is_empty())
        || token.is_empty()
    {
        return Err(CheckError::bad_request("Missing required parameters or auth header"));
    }

    let mac = MacAddress::parse(&request.mac)
        .map_err(|_| CheckError::bad_request("Invalid MAC address format"))?;
    let reported = SemVer::parse(&request.version)
        .map_err(|_| CheckError::bad_request("Invalid version format"))?;

    Ok(ValidatedCheck {
        mac,
        reported,
        reported_raw: request.version.clone(),
        token: token.to_string(),
    })
}

fn decide(policy: &DevicePolicy, reported: SemVer, mac: &MacAddress) -> UpdateCheckResponse {
    // Registry only accepts parseable targets, but the file may be hand-edited.
    let target = match SemVer::parse(&policy.target_version) {
        Ok(target) => target,
        Err(e) => {
            tracing::error!(mac = %mac, "Stored target version is invalid: {}", e);
            return UpdateCheckResponse::no_update();
        }
    };

    match compare_versions(&target, &reported) {
        Ordering::Greater => {
            tracing::info!(mac = %mac, current = %reported, target = %target, "Update available");
            UpdateCheckResponse::available(&policy.target_version, &policy.firmware_url, &policy.checksum)
        }
        Ordering::Equal | Ordering::Less => {
            tracing::info!(mac = %mac, current = %reported, target = %target, "No update needed");
            UpdateCheckResponse::no_update()
        }
    }
}
