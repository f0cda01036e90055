use crate::models::Property;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Collection mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Sweep the next N days to track how fast inventory sells out
    Occupancy,
    /// Probe a few fixed check-in offsets across several stay lengths
    Pricing,
}

impl Mode {
    /// Human-readable mode name used in banners and the analysis document
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Occupancy => "Occupancy Tracking",
            Mode::Pricing => "Pricing Analysis",
        }
    }
}

/// Transport used to fetch listing pages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetcherKind {
    Browser,
    Http,
}

/// Run configuration, immutable after load.
///
/// Every field has a default, so a partial config file works and a missing
/// file falls back to pure defaults. Components borrow the config; nothing
/// mutates it after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    /// Occupancy mode: horizon in days, inclusive
    pub days_ahead: u32,
    /// Occupancy mode: check every Nth day offset
    pub check_interval: u32,
    /// Occupancy mode: fixed stay length in nights
    pub occupancy_stay_duration: u32,
    /// Pricing mode: days from today to each probed check-in
    pub check_in_offsets: Vec<u32>,
    /// Pricing mode: stay lengths probed per check-in
    pub stay_durations: Vec<u32>,
    pub guests: u32,
    pub rooms: u32,
    /// Pause between page fetches, in seconds
    pub request_delay_secs: f64,
    /// Records buffered before an automatic flush to the dataset
    pub batch_size: usize,
    pub base_url: String,
    pub data_file: PathBuf,
    pub analysis_file: PathBuf,
    pub progress_file: PathBuf,
    pub archive_dir: PathBuf,
    pub archiving_enabled: bool,
    /// Archives kept per kind; older ones are pruned
    pub max_archive_files: usize,
    /// Property every other property is compared against
    pub reference_property: String,
    pub fetcher: FetcherKind,
    pub headless: bool,
    pub browser_timeout_secs: u64,
    /// Settle time after navigation; listing pages render rooms client side
    pub browser_settle_secs: u64,
    pub http_timeout_secs: u64,
    pub properties: Vec<Property>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Occupancy,
            days_ahead: 30,
            check_interval: 3,
            occupancy_stay_duration: 1,
            check_in_offsets: vec![7, 14, 30],
            stay_durations: vec![1, 3, 7],
            guests: 2,
            rooms: 1,
            request_delay_secs: 2.0,
            batch_size: 10,
            base_url: "https://www.booking.com".to_string(),
            data_file: PathBuf::from("data/pricing_data.csv"),
            analysis_file: PathBuf::from("data/pricing_analysis.json"),
            progress_file: PathBuf::from("data/scrape_progress.json"),
            archive_dir: PathBuf::from("data/archive"),
            archiving_enabled: true,
            max_archive_files: 30,
            reference_property: String::new(),
            fetcher: FetcherKind::Browser,
            headless: true,
            browser_timeout_secs: 30,
            browser_settle_secs: 3,
            http_timeout_secs: 30,
            properties: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: the defaults apply (with an empty
    /// property list). A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Create output directories for the dataset, progress and archive files
    pub fn ensure_directories(&self) -> Result<()> {
        for path in [&self.data_file, &self.analysis_file, &self.progress_file] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        std::fs::create_dir_all(&self.archive_dir)
            .with_context(|| format!("Failed to create {}", self.archive_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_an_occupancy_run() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Occupancy);
        assert_eq!(config.days_ahead, 30);
        assert_eq!(config.check_interval, 3);
        assert_eq!(config.batch_size, 10);
        assert!(config.archiving_enabled);
        assert!(config.properties.is_empty());
    }

    #[test]
    fn partial_file_fills_missing_fields_with_defaults() {
        let raw = r#"{
            "mode": "pricing",
            "reference_property": "Seaview Lodge",
            "properties": [
                {"name": "Seaview Lodge", "slug": "seaview-lodge", "country_code": "za"}
            ]
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.mode, Mode::Pricing);
        assert_eq!(config.reference_property, "Seaview Lodge");
        assert_eq!(config.properties.len(), 1);
        assert_eq!(config.properties[0].slug, "seaview-lodge");
        // untouched fields keep their defaults
        assert_eq!(config.guests, 2);
        assert_eq!(config.stay_durations, vec![1, 3, 7]);
        assert_eq!(config.fetcher, FetcherKind::Browser);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.days_ahead, Config::default().days_ahead);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json {").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn mode_names_match_report_labels() {
        assert_eq!(Mode::Occupancy.display_name(), "Occupancy Tracking");
        assert_eq!(Mode::Pricing.display_name(), "Pricing Analysis");
    }
}
