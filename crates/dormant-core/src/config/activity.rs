//! Activity tracking configuration.
//!
//! The raw [`ActivityConfig`] is what the configuration files contain. It is
//! resolved once at startup into an immutable [`DormantSettings`] snapshot;
//! every malformed value falls back to its default individually.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::duration::{parse_iso8601, parse_period};

/// Status written when an account becomes dormant.
pub const DEFAULT_DORMANT_STATUS: &str = "dormant";
/// Status written when an account becomes active again.
pub const DEFAULT_ACTIVE_STATUS: &str = "";
/// Default inactivity window.
pub const DEFAULT_DORMANT_PERIOD: &str = "P60D";
/// Default interval between synchronization passes.
pub const DEFAULT_POLLING_PERIOD: &str = "PT1H";

/// Raw `[activity]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Status string for dormant accounts.
    #[serde(default)]
    pub status_dormant: Option<String>,
    /// Status string for accounts that become active again.
    #[serde(default)]
    pub status_default: Option<String>,
    /// Inactivity window as an ISO-8601 duration.
    #[serde(default)]
    pub period_dormant: Option<String>,
    /// Sync interval as an ISO-8601 duration or integer seconds.
    #[serde(default)]
    pub period_polling: Option<String>,
    /// Deployment epoch as an RFC 3339 instant.
    #[serde(default)]
    pub epoch: Option<String>,
}

impl ActivityConfig {
    /// The configured epoch, if present and well-formed.
    pub fn configured_epoch(&self) -> Option<DateTime<Utc>> {
        let raw = self.epoch.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(raw) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(e) => {
                error!(value = %raw, error = %e, "Malformed activity.epoch, ignoring");
                None
            }
        }
    }
}

/// Immutable, fully resolved activity settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DormantSettings {
    /// Status written when an account becomes dormant.
    pub dormant_status: String,
    /// Status written when an account becomes active again.
    pub default_status: String,
    /// Accounts not seen within this window are dormant.
    pub dormant_period: Duration,
    /// Interval between scheduled synchronization passes.
    pub polling_period: std::time::Duration,
    /// First-seen instant of this deployment.
    pub epoch: DateTime<Utc>,
}

impl DormantSettings {
    /// Settings with every value at its default.
    pub fn with_defaults(epoch: DateTime<Utc>) -> Self {
        Self {
            dormant_status: DEFAULT_DORMANT_STATUS.to_string(),
            default_status: DEFAULT_ACTIVE_STATUS.to_string(),
            dormant_period: Duration::days(60),
            polling_period: std::time::Duration::from_secs(3600),
            epoch,
        }
    }

    /// Resolve the raw section. `epoch` must already be resolved by the
    /// caller (configured value, persisted state, or now).
    pub fn resolve(raw: &ActivityConfig, epoch: DateTime<Utc>) -> Self {
        let mut settings = Self::with_defaults(epoch);

        if let Some(status) = &raw.status_dormant {
            settings.dormant_status = status.clone();
        }
        if let Some(status) = &raw.status_default {
            settings.default_status = status.clone();
        }
        if settings.dormant_status == settings.default_status {
            error!(
                status = %settings.dormant_status,
                "activity.status_dormant equals activity.status_default, using defaults"
            );
            settings.dormant_status = DEFAULT_DORMANT_STATUS.to_string();
            settings.default_status = DEFAULT_ACTIVE_STATUS.to_string();
        }

        if let Some(value) = &raw.period_dormant {
            match parse_iso8601(value) {
                Ok(period) if period > Duration::zero() => settings.dormant_period = period,
                Ok(_) => error!(
                    value = %value,
                    default = DEFAULT_DORMANT_PERIOD,
                    "activity.period_dormant must be positive, using default"
                ),
                Err(e) => error!(
                    value = %value,
                    default = DEFAULT_DORMANT_PERIOD,
                    error = %e,
                    "Malformed activity.period_dormant, using default"
                ),
            }
        }

        if let Some(value) = &raw.period_polling {
            match parse_period(value).map(|p| p.to_std()) {
                Ok(Ok(period)) if !period.is_zero() => settings.polling_period = period,
                Ok(_) => error!(
                    value = %value,
                    default = DEFAULT_POLLING_PERIOD,
                    "activity.period_polling must be positive, using default"
                ),
                Err(e) => error!(
                    value = %value,
                    default = DEFAULT_POLLING_PERIOD,
                    error = %e,
                    "Malformed activity.period_polling, using default"
                ),
            }
        }

        settings
    }

    /// Start of the current activity window relative to `now`. A period
    /// reaching past the representable range clamps to the earliest instant.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.dormant_period)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
