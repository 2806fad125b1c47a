use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;
use crate::domain::templates::Locale;

/// Configuration for the time_approvals module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeApprovalsConfig {
    /// How often the reconciler walks every tenant
    #[serde(default = "default_reconcile_interval", with = "humantime_serde")]
    pub reconcile_interval: Duration,
    /// Notifications older than this are pruned
    #[serde(default = "default_retention", with = "humantime_serde")]
    pub retention: Duration,
    #[serde(default = "default_standard_daily_minutes")]
    pub standard_daily_minutes: i64,
    #[serde(default = "default_expected_daily_minutes")]
    pub expected_daily_minutes: i64,
    #[serde(default)]
    pub locale: Locale,
    /// Per-subscriber buffer of the live push channel
    #[serde(default = "default_push_capacity")]
    pub push_capacity: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for TimeApprovalsConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: default_reconcile_interval(),
            retention: default_retention(),
            standard_daily_minutes: default_standard_daily_minutes(),
            expected_daily_minutes: default_expected_daily_minutes(),
            locale: Locale::default(),
            push_capacity: default_push_capacity(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl TimeApprovalsConfig {
    pub fn to_service_config(&self) -> anyhow::Result<ServiceConfig> {
        if self.standard_daily_minutes <= 0 {
            anyhow::bail!("standard_daily_minutes must be positive");
        }
        if self.expected_daily_minutes < 0 {
            anyhow::bail!("expected_daily_minutes must not be negative");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default_page_size must be between 1 and max_page_size ({})",
                self.max_page_size
            );
        }
        if self.reconcile_interval.is_zero() {
            anyhow::bail!("reconcile_interval must be greater than zero");
        }
        let retention = chrono::Duration::from_std(self.retention)
            .map_err(|_| anyhow::anyhow!("retention {:?} is out of range", self.retention))?;

        Ok(ServiceConfig {
            standard_daily_minutes: self.standard_daily_minutes,
            expected_daily_minutes: self.expected_daily_minutes,
            locale: self.locale,
            retention,
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            ..ServiceConfig::default()
        })
    }
}

fn default_reconcile_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_retention() -> Duration {
    Duration::from_secs(2 * 24 * 60 * 60)
}

fn default_standard_daily_minutes() -> i64 {
    480
}

fn default_expected_daily_minutes() -> i64 {
    480
}

fn default_push_capacity() -> usize {
    256
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    500
}
