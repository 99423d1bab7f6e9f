//! greenroom.toml settings parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the preview environment controller.
///
/// Every field has a default, so an empty file (or no file at all) yields
/// a usable configuration. Durations are strings like `"5s"`, `"500ms"`
/// or `"2m"`; unparseable values fall back to the documented default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreenroomConfig {
    /// Container repository preview images are published to.
    #[serde(default = "default_image_repository")]
    pub image_repository: String,
    /// Feature flags passed through to the application container.
    #[serde(default)]
    pub feature_flags: Vec<String>,
    /// Port the application serves on.
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Deadline for the platform to report the new service stable.
    #[serde(default = "default_stability_timeout")]
    pub stability_timeout: String,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub deletion: DeletionSettings,
}

/// Health verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    /// Path probed first on every attempt.
    #[serde(default = "default_health_path")]
    pub path: String,
    /// Per-request timeout.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,
    /// Fixed delay between failed attempts.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
    /// Attempt budget before the environment is declared unhealthy.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Settings for waiting out deletion of a replaced service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionSettings {
    /// Cadence of existence checks while the old service drains.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    /// Deadline for the old service to disappear.
    #[serde(default = "default_deletion_timeout")]
    pub timeout: String,
}

impl GreenroomConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GreenroomConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Stability deadline as a duration (default 10m).
    pub fn stability_timeout(&self) -> Duration {
        parse_duration(&self.stability_timeout).unwrap_or(Duration::from_secs(600))
    }
}

impl HealthSettings {
    /// Per-request timeout as a duration (default 5s).
    pub fn probe_timeout(&self) -> Duration {
        parse_duration(&self.probe_timeout).unwrap_or(Duration::from_secs(5))
    }

    /// Delay between failed attempts as a duration (default 10s).
    pub fn retry_delay(&self) -> Duration {
        parse_duration(&self.retry_delay).unwrap_or(Duration::from_secs(10))
    }
}

impl DeletionSettings {
    /// Existence check cadence as a duration (default 5s).
    pub fn poll_interval(&self) -> Duration {
        parse_duration(&self.poll_interval).unwrap_or(Duration::from_secs(5))
    }

    /// Deletion deadline as a duration (default 5m).
    pub fn timeout(&self) -> Duration {
        parse_duration(&self.timeout).unwrap_or(Duration::from_secs(300))
    }
}

impl Default for GreenroomConfig {
    fn default() -> Self {
        Self {
            image_repository: default_image_repository(),
            feature_flags: Vec::new(),
            app_port: default_app_port(),
            stability_timeout: default_stability_timeout(),
            health: HealthSettings::default(),
            deletion: DeletionSettings::default(),
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            path: default_health_path(),
            probe_timeout: default_probe_timeout(),
            retry_delay: default_retry_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for DeletionSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            timeout: default_deletion_timeout(),
        }
    }
}

fn default_image_repository() -> String {
    "preview-apps".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_stability_timeout() -> String {
    "10m".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_probe_timeout() -> String {
    "5s".to_string()
}

fn default_retry_delay() -> String {
    "10s".to_string()
}

fn default_max_attempts() -> u32 {
    30
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_deletion_timeout() -> String {
    "5m".to_string()
}

/// Parse a duration string like "5s", "500ms", "1m".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
