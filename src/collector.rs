use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::{Config, Mode};
use crate::models::Availability;
use crate::scrapers::normalize::{error_record, normalize_record};
use crate::scrapers::page::parse_listing_page;
use crate::scrapers::{build_stay_queries, PageFetcher};
use crate::storage::{rotate_archives, IncrementalRecordStore, ScrapeSessionTracker, SessionKind};

/// Record counts for one collection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub records: usize,
    pub available: usize,
    pub sold_out: usize,
    pub errors: usize,
}

/// Collect pricing data for every property still outstanding today.
///
/// One sequential pass: for each property, every configured date check is
/// fetched, parsed and appended in order, with a polite delay between page
/// loads. A failed fetch still yields a record (availability `error`); a
/// failed write or progress save aborts the run, leaving everything
/// persisted so far valid for a later resume.
pub async fn run_collection(
    config: &Config,
    fetcher: &dyn PageFetcher,
) -> anyhow::Result<RunTotals> {
    let today = Local::now().date_naive();
    let mut tracker = ScrapeSessionTracker::new(&config.progress_file, today);
    let plan = tracker.plan(&config.properties);

    if plan.kind == SessionKind::Done {
        info!("Run again tomorrow for fresh data");
        return Ok(RunTotals::default());
    }

    let fresh = plan.kind == SessionKind::Fresh;
    if fresh {
        let archive_date = plan
            .prior_date
            .unwrap_or_else(|| today - chrono::Duration::days(1));
        rotate_archives(config, archive_date).context("Failed to archive previous dataset")?;
    }
    let mut store = IncrementalRecordStore::open(&config.data_file, config.batch_size, fresh)
        .with_context(|| format!("Failed to open dataset at {}", config.data_file.display()))?;

    let queries = build_stay_queries(config, today);
    let delay = Duration::from_secs_f64(config.request_delay_secs);
    let total_properties = config.properties.len();

    info!("Total properties: {}", total_properties);
    info!("Already completed today: {}", plan.completed.len());
    info!("To scrape now: {}", plan.remaining.len());
    info!(
        "Date checks per property: {} via {}",
        queries.len(),
        fetcher.source_name()
    );

    let mut totals = RunTotals::default();

    for (index, property) in plan.remaining.iter().enumerate() {
        let position = plan.completed.len() + index + 1;
        info!(
            "[{}/{}] Scraping {} ({})",
            position, total_properties, property.name, property.slug
        );

        let mut property_records = 0usize;
        let mut available = 0usize;
        let mut sold_out = 0usize;

        for stay in &queries {
            let record = match fetcher
                .fetch_page(property, stay.check_in, stay.check_out)
                .await
            {
                Ok(html) => {
                    let signals = parse_listing_page(&html);
                    normalize_record(config, property, stay, &signals)
                }
                Err(e) => {
                    warn!(
                        "Fetch failed for {} ({} to {}): {}",
                        property.slug, stay.check_in, stay.check_out, e
                    );
                    error_record(config, property, stay)
                }
            };

            debug!(
                "   {} to {}: {}",
                stay.check_in, stay.check_out, record.availability
            );
            match record.availability {
                Availability::Available => {
                    available += 1;
                    totals.available += 1;
                }
                Availability::SoldOut => {
                    sold_out += 1;
                    totals.sold_out += 1;
                }
                Availability::Error => totals.errors += 1,
            }
            property_records += 1;
            totals.records += 1;

            store
                .append(record)
                .context("Failed to write record to dataset")?;
            tokio::time::sleep(delay).await;
        }

        store
            .flush()
            .context("Failed to flush records to dataset")?;

        if property_records > 0 {
            if config.mode == Mode::Occupancy {
                let rate = sold_out as f64 / property_records as f64 * 100.0;
                info!(
                    "   Occupancy rate: {:.1}% ({}/{} days sold out)",
                    rate, sold_out, property_records
                );
            }
            info!(
                "   {} records | Available: {}, Sold out: {}",
                property_records, available, sold_out
            );
        } else {
            warn!("   No data for {}", property.name);
        }

        tracker
            .mark_completed(&property.slug)
            .context("Failed to persist progress")?;
        info!(
            "   Progress saved ({}/{} complete)",
            tracker.completed_count(),
            total_properties
        );
    }

    info!(
        "COMPLETE: {} new records saved to {}",
        store.records_written(),
        config.data_file.display()
    );
    info!(
        "Available: {} | Sold out: {} | Errors: {}",
        totals.available, totals.sold_out, totals.errors
    );

    Ok(totals)
}
