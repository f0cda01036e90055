use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::Property;

/// On-disk shape of the daily progress file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScrapeProgress {
    date: Option<NaiveDate>,
    completed_properties: Vec<String>,
    last_updated: DateTime<Utc>,
}

/// How today's run relates to what the progress file remembers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// New collection day (or nothing on record)
    Fresh,
    /// Same day, some properties still outstanding
    Resuming,
    /// Same day, every configured property already collected
    Done,
}

/// The resolved plan for one run
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub kind: SessionKind,
    /// Properties still to collect, in configured order
    pub remaining: Vec<Property>,
    /// Slugs already collected today
    pub completed: Vec<String>,
    /// Stored collection date when starting fresh over an older file;
    /// the store archives the previous dataset under this date
    pub prior_date: Option<NaiveDate>,
}

/// Tracks which properties finished collecting today.
///
/// Completion is per property, never per date check: a property interrupted
/// halfway is re-collected in full on resume and the duplicate rows are
/// accepted. Every completion is persisted on the spot, so a crash at any
/// point loses at most the in-flight property.
pub struct ScrapeSessionTracker {
    path: PathBuf,
    today: NaiveDate,
    completed: Vec<String>,
}

impl ScrapeSessionTracker {
    pub fn new(path: impl Into<PathBuf>, today: NaiveDate) -> Self {
        Self {
            path: path.into(),
            today,
            completed: Vec::new(),
        }
    }

    /// Classify the session against the stored progress and work out what
    /// remains. A missing, empty or unreadable progress file counts as no
    /// progress at all.
    pub fn plan(&mut self, properties: &[Property]) -> SessionPlan {
        let stored = load_progress(&self.path);

        match stored {
            Some(progress) if progress.date == Some(self.today) => {
                self.completed = progress.completed_properties;
                let remaining: Vec<Property> = properties
                    .iter()
                    .filter(|p| !self.completed.contains(&p.slug))
                    .cloned()
                    .collect();

                if remaining.is_empty() {
                    info!("All properties already scraped today ({})", self.today);
                    SessionPlan {
                        kind: SessionKind::Done,
                        remaining,
                        completed: self.completed.clone(),
                        prior_date: None,
                    }
                } else {
                    info!(
                        "Resuming: {} already done, {} remaining",
                        self.completed.len(),
                        remaining.len()
                    );
                    SessionPlan {
                        kind: SessionKind::Resuming,
                        remaining,
                        completed: self.completed.clone(),
                        prior_date: None,
                    }
                }
            }
            stored => {
                let prior_date = stored.and_then(|p| p.date);
                info!(
                    "New collection day - will scrape all {} properties",
                    properties.len()
                );
                self.completed = Vec::new();
                SessionPlan {
                    kind: SessionKind::Fresh,
                    remaining: properties.to_vec(),
                    completed: Vec::new(),
                    prior_date,
                }
            }
        }
    }

    /// Record one property as collected and persist the whole progress
    /// file immediately.
    pub fn mark_completed(&mut self, slug: &str) -> Result<(), StoreError> {
        self.completed.push(slug.to_string());
        let progress = ScrapeProgress {
            date: Some(self.today),
            completed_properties: self.completed.clone(),
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&progress)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

fn load_progress(path: &Path) -> Option<ScrapeProgress> {
    if !path.exists() {
        return None;
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Could not read progress file: {}", e);
            return None;
        }
    };
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&raw) {
        Ok(progress) => Some(progress),
        Err(e) => {
            debug!("Ignoring unreadable progress file: {}", e);
            None
        }
    }
}
