//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument (replay binary)
//! 2. Default: config/dev.toml
//!
//! Any load or parse failure falls back to built-in defaults; policy
//! lookups must never fail a request because configuration is
//! unreachable.

use crate::domain::types::{Fence, FenceId, GeoPoint};
use crate::services::presence::PresenceConfig;
use crate::services::status::PolicySettings;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site identifier (e.g., "hq", "branch-blr")
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "attendance".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_work_start")]
    pub work_start: String,
    #[serde(default = "default_work_end")]
    pub work_end: String,
    #[serde(default = "default_late_threshold_minutes")]
    pub late_threshold_minutes: i64,
    #[serde(default = "default_half_day_threshold_minutes")]
    pub half_day_threshold_minutes: i64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            work_start: default_work_start(),
            work_end: default_work_end(),
            late_threshold_minutes: default_late_threshold_minutes(),
            half_day_threshold_minutes: default_half_day_threshold_minutes(),
        }
    }
}

fn default_work_start() -> String {
    "09:00".to_string()
}

fn default_work_end() -> String {
    "18:00".to_string()
}

fn default_late_threshold_minutes() -> i64 {
    555 // 09:15
}

fn default_half_day_threshold_minutes() -> i64 {
    780 // 13:00
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Consecutive outside-fence pings before forced checkout
    #[serde(default = "default_outside_ping_threshold")]
    pub outside_ping_threshold: u32,
    /// Minutes without a ping before the read path marks tracking stale
    #[serde(default = "default_stale_after_minutes")]
    pub stale_after_minutes: i64,
    /// Minutes within which an open session can be resumed
    #[serde(default = "default_resume_window_minutes")]
    pub resume_window_minutes: i64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            outside_ping_threshold: default_outside_ping_threshold(),
            stale_after_minutes: default_stale_after_minutes(),
            resume_window_minutes: default_resume_window_minutes(),
        }
    }
}

fn default_outside_ping_threshold() -> u32 {
    5
}

fn default_stale_after_minutes() -> i64 {
    10
}

fn default_resume_window_minutes() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct FenceConfig {
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub radius_m: f64,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceMatchConfig {
    #[serde(default = "default_facematch_url")]
    pub url: String,
    #[serde(default = "default_facematch_min_similarity")]
    pub min_similarity: f64,
    #[serde(default = "default_facematch_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FaceMatchConfig {
    fn default() -> Self {
        Self {
            url: default_facematch_url(),
            min_similarity: default_facematch_min_similarity(),
            timeout_ms: default_facematch_timeout_ms(),
        }
    }
}

fn default_facematch_url() -> String {
    "http://localhost:8900".to_string()
}

fn default_facematch_min_similarity() -> f64 {
    0.85
}

fn default_facematch_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PingLogConfig {
    /// File path for the ping audit log (JSONL format)
    #[serde(default = "default_ping_log_file")]
    pub file: String,
}

impl Default for PingLogConfig {
    fn default() -> Self {
        Self { file: default_ping_log_file() }
    }
}

fn default_ping_log_file() -> String {
    "pings.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub fences: Vec<FenceConfig>,
    #[serde(default)]
    pub facematch: FaceMatchConfig,
    #[serde(default)]
    pub ping_log: PingLogConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    policy: PolicySettings,
    presence: PresenceConfig,
    fences: Vec<Fence>,
    facematch_url: String,
    facematch_min_similarity: f64,
    facematch_timeout_ms: u64,
    ping_log_file: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            policy: PolicySettings::default(),
            presence: PresenceConfig::default(),
            fences: Vec::new(),
            facematch_url: default_facematch_url(),
            facematch_min_similarity: default_facematch_min_similarity(),
            facematch_timeout_ms: default_facematch_timeout_ms(),
            ping_log_file: default_ping_log_file(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let fences = toml_config
            .fences
            .into_iter()
            .map(|f| Fence {
                id: FenceId(f.id),
                name: f.name.unwrap_or_else(|| format!("FENCE_{}", f.id)),
                center: GeoPoint::new(f.lat, f.lng),
                radius_m: f.radius_m,
                branch: f.branch,
            })
            .collect();

        Ok(Self {
            site_id: toml_config.site.id,
            policy: PolicySettings {
                work_start: toml_config.policy.work_start,
                work_end: toml_config.policy.work_end,
                late_threshold_minutes: toml_config.policy.late_threshold_minutes,
                half_day_threshold_minutes: toml_config.policy.half_day_threshold_minutes,
            },
            presence: PresenceConfig {
                outside_ping_threshold: toml_config.tracking.outside_ping_threshold,
                stale_after_minutes: toml_config.tracking.stale_after_minutes,
                resume_window_minutes: toml_config.tracking.resume_window_minutes,
            },
            fences,
            facematch_url: toml_config.facematch.url,
            facematch_min_similarity: toml_config.facematch.min_similarity,
            facematch_timeout_ms: toml_config.facematch.timeout_ms,
            ping_log_file: toml_config.ping_log.file,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration from a path - falls back to defaults on error
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn policy(&self) -> &PolicySettings {
        &self.policy
    }

    pub fn presence(&self) -> &PresenceConfig {
        &self.presence
    }

    pub fn fences(&self) -> &[Fence] {
        &self.fences
    }

    pub fn facematch_url(&self) -> &str {
        &self.facematch_url
    }

    pub fn facematch_min_similarity(&self) -> f64 {
        self.facematch_min_similarity
    }

    pub fn facematch_timeout_ms(&self) -> u64 {
        self.facematch_timeout_ms
    }

    pub fn ping_log_file(&self) -> &str {
        &self.ping_log_file
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to override policy settings
    #[cfg(test)]
    pub fn with_policy(mut self, policy: PolicySettings) -> Self {
        self.policy = policy;
        self
    }
}
