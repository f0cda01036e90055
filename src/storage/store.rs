use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::PricingRecord;

/// Dataset column order; must track the `PricingRecord` field order
const COLUMNS: [&str; 25] = [
    "hotel_name",
    "hotel_slug",
    "check_in_date",
    "check_out_date",
    "nights",
    "guests",
    "rooms",
    "day_offset",
    "availability",
    "total_price",
    "original_price",
    "price_per_night",
    "has_discount",
    "discount_percentage",
    "rating_score",
    "review_count",
    "total_room_types",
    "available_room_types",
    "sold_out_room_types",
    "property_occupancy_rate",
    "min_room_price",
    "max_room_price",
    "avg_room_price",
    "room_names",
    "scrape_timestamp",
];

/// Append-only CSV store with batched writes.
///
/// Records buffer in memory and hit disk when a full batch accumulates or on
/// an explicit flush, so an interrupted run keeps everything up to the last
/// flush. Opening fresh truncates the dataset (the caller archives first);
/// opening otherwise appends, writing the header only when the file is new.
pub struct IncrementalRecordStore {
    writer: csv::Writer<File>,
    buffer: Vec<PricingRecord>,
    batch_size: usize,
    records_written: usize,
}

impl IncrementalRecordStore {
    pub fn open(path: &Path, batch_size: usize, fresh: bool) -> Result<Self, StoreError> {
        let needs_header =
            fresh || !path.exists() || std::fs::metadata(path)?.len() == 0;
        let file = if fresh {
            File::create(path)?
        } else {
            OpenOptions::new().create(true).append(true).open(path)?
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(COLUMNS)?;
            writer.flush()?;
        }

        Ok(Self {
            writer,
            buffer: Vec::new(),
            batch_size,
            records_written: 0,
        })
    }

    /// Buffer one record, flushing automatically when the batch fills
    pub fn append(&mut self, record: PricingRecord) -> Result<(), StoreError> {
        self.buffer.push(record);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write any partial batch to disk
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let count = self.buffer.len();
        for record in self.buffer.drain(..) {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        self.records_written += count;
        Ok(())
    }

    /// Records flushed to disk by this store instance
    pub fn records_written(&self) -> usize {
        self.records_written
    }
}

/// Read the whole dataset back
pub fn load_records(path: &Path) -> Result<Vec<PricingRecord>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Archive the previous day's dataset and analysis before a fresh run.
///
/// Archive names are keyed by the prior collection date and never
/// overwritten; a re-run on the same boundary keeps the first archive.
/// Oldest archives beyond the retention cap are pruned, CSV and JSON
/// independently. The live dataset itself is truncated by the store when
/// it opens fresh, whether or not archiving is enabled here.
pub fn rotate_archives(config: &Config, prior_date: NaiveDate) -> Result<(), StoreError> {
    if !config.archiving_enabled {
        return Ok(());
    }
    if !config.data_file.exists() {
        return Ok(());
    }

    let stamp = prior_date.format("%Y%m%d").to_string();
    std::fs::create_dir_all(&config.archive_dir)?;

    let csv_name = format!("pricing_data_{}.csv", stamp);
    let csv_target = config.archive_dir.join(&csv_name);
    if csv_target.exists() {
        info!("Archive already exists: {} (preserving it)", csv_name);
    } else {
        std::fs::copy(&config.data_file, &csv_target)?;
        info!("Archived existing data to {}", csv_name);
    }

    let json_name = format!("pricing_analysis_{}.json", stamp);
    let json_target = config.archive_dir.join(&json_name);
    if config.analysis_file.exists() && !json_target.exists() {
        std::fs::copy(&config.analysis_file, &json_target)?;
        info!("Archived existing analysis to {}", json_name);
    }

    prune_archives(&config.archive_dir, "pricing_data_", ".csv", config.max_archive_files)?;
    prune_archives(
        &config.archive_dir,
        "pricing_analysis_",
        ".json",
        config.max_archive_files,
    )?;
    Ok(())
}

/// Keep the newest `keep` archives of one kind; date-keyed names sort
/// chronologically, so a reverse name sort puts newest first.
fn prune_archives(dir: &Path, prefix: &str, suffix: &str, keep: usize) -> Result<(), StoreError> {
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
        .collect();
    names.sort();
    names.reverse();

    for name in names.iter().skip(keep) {
        std::fs::remove_file(dir.join(name))?;
        info!("Removed old archive: {}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn record(hotel: &str, check_in_day: u32) -> PricingRecord {
        let check_in = NaiveDate::from_ymd_opt(2026, 9, check_in_day).unwrap();
        PricingRecord {
            hotel_name: hotel.to_string(),
            hotel_slug: hotel.to_lowercase().replace(' ', "-"),
            check_in_date: check_in,
            check_out_date: check_in + chrono::Duration::days(1),
            nights: 1,
            guests: 2,
            rooms: 1,
            day_offset: Some(check_in_day),
            availability: Availability::Available,
            total_price: Some(1234.5),
            original_price: None,
            price_per_night: Some(1234.5),
            has_discount: Some(false),
            discount_percentage: None,
            rating_score: Some(8.7),
            review_count: Some(412),
            total_room_types: Some(3),
            available_room_types: Some(2),
            sold_out_room_types: Some(1),
            property_occupancy_rate: Some(33.33),
            min_room_price: Some(1234.5),
            max_room_price: Some(2100.0),
            avg_room_price: Some(1667.25),
            room_names: "Standard Double, Sea Facing Suite".to_string(),
            scrape_timestamp: Utc.with_ymd_and_hms(2026, 8, 23, 6, 30, 0).unwrap(),
        }
    }

    fn archive_config(dir: &Path) -> Config {
        Config {
            data_file: dir.join("pricing_data.csv"),
            analysis_file: dir.join("pricing_analysis.json"),
            archive_dir: dir.join("archive"),
            max_archive_files: 5,
            ..Config::default()
        }
    }

    fn archive_names(dir: &PathBuf) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn open_writes_the_header_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing_data.csv");
        let _store = IncrementalRecordStore::open(&path, 10, false).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("hotel_name,hotel_slug,"));
        assert!(load_records(&path).unwrap().is_empty());
    }

    #[test]
    fn header_tracks_record_field_order() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(record("Seaview Lodge", 1)).unwrap();
        let written = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = written.lines().next().unwrap();

        assert_eq!(header, COLUMNS.join(","));
    }

    #[test]
    fn records_buffer_until_the_batch_fills() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing_data.csv");
        let mut store = IncrementalRecordStore::open(&path, 2, false).unwrap();

        store.append(record("Seaview Lodge", 1)).unwrap();
        assert!(load_records(&path).unwrap().is_empty());
        assert_eq!(store.records_written(), 0);

        store.append(record("Seaview Lodge", 2)).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 2);
        assert_eq!(store.records_written(), 2);

        store.append(record("Seaview Lodge", 3)).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 2);
        store.flush().unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 3);
        assert_eq!(store.records_written(), 3);
    }

    #[test]
    fn reopening_appends_without_a_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing_data.csv");

        let mut store = IncrementalRecordStore::open(&path, 1, false).unwrap();
        store.append(record("Seaview Lodge", 1)).unwrap();
        store.append(record("Seaview Lodge", 2)).unwrap();
        drop(store);

        let mut resumed = IncrementalRecordStore::open(&path, 1, false).unwrap();
        resumed.append(record("Harbour Hotel", 3)).unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].hotel_name, "Harbour Hotel");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.matches("hotel_name").count(), 1);
    }

    #[test]
    fn opening_fresh_truncates_the_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing_data.csv");

        let mut store = IncrementalRecordStore::open(&path, 1, false).unwrap();
        store.append(record("Seaview Lodge", 1)).unwrap();
        drop(store);

        let _fresh = IncrementalRecordStore::open(&path, 1, true).unwrap();
        assert!(load_records(&path).unwrap().is_empty());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("hotel_name,"));
    }

    #[test]
    fn records_round_trip_through_the_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing_data.csv");
        let mut store = IncrementalRecordStore::open(&path, 1, false).unwrap();

        let full = record("Seaview Lodge", 1);
        let mut sparse = record("Harbour Hotel", 2);
        sparse.availability = Availability::Error;
        sparse.day_offset = None;
        sparse.total_price = None;
        sparse.price_per_night = None;
        sparse.has_discount = None;
        sparse.rating_score = None;
        sparse.review_count = None;
        sparse.total_room_types = None;
        sparse.available_room_types = None;
        sparse.sold_out_room_types = None;
        sparse.property_occupancy_rate = None;
        sparse.min_room_price = None;
        sparse.max_room_price = None;
        sparse.avg_room_price = None;
        sparse.room_names = String::new();

        store.append(full.clone()).unwrap();
        store.append(sparse.clone()).unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records, vec![full, sparse]);
    }

    #[test]
    fn rotation_archives_both_files_keyed_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let config = archive_config(dir.path());
        std::fs::write(&config.data_file, "hotel_name\nSeaview Lodge\n").unwrap();
        std::fs::write(&config.analysis_file, "{}").unwrap();

        let prior = NaiveDate::from_ymd_opt(2026, 8, 22).unwrap();
        rotate_archives(&config, prior).unwrap();

        assert_eq!(
            archive_names(&config.archive_dir),
            vec![
                "pricing_analysis_20260822.json".to_string(),
                "pricing_data_20260822.csv".to_string(),
            ]
        );
        let archived =
            std::fs::read_to_string(config.archive_dir.join("pricing_data_20260822.csv")).unwrap();
        assert_eq!(archived, "hotel_name\nSeaview Lodge\n");
    }

    #[test]
    fn rotation_never_overwrites_an_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let config = archive_config(dir.path());
        std::fs::create_dir_all(&config.archive_dir).unwrap();
        std::fs::write(&config.data_file, "new data").unwrap();
        let target = config.archive_dir.join("pricing_data_20260822.csv");
        std::fs::write(&target, "first archive").unwrap();

        let prior = NaiveDate::from_ymd_opt(2026, 8, 22).unwrap();
        rotate_archives(&config, prior).unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "first archive");
    }

    #[test]
    fn rotation_prunes_the_oldest_archives_beyond_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let config = archive_config(dir.path());
        std::fs::create_dir_all(&config.archive_dir).unwrap();
        std::fs::write(&config.data_file, "live").unwrap();
        for day in 1..=5 {
            let name = format!("pricing_data_2026010{}.csv", day);
            std::fs::write(config.archive_dir.join(name), "old").unwrap();
        }

        let prior = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        rotate_archives(&config, prior).unwrap();

        let names = archive_names(&config.archive_dir);
        assert_eq!(names.len(), 5);
        assert!(!names.contains(&"pricing_data_20260101.csv".to_string()));
        assert!(names.contains(&"pricing_data_20260106.csv".to_string()));
    }

    #[test]
    fn disabled_archiving_copies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = archive_config(dir.path());
        config.archiving_enabled = false;
        std::fs::write(&config.data_file, "live").unwrap();

        rotate_archives(&config, NaiveDate::from_ymd_opt(2026, 8, 22).unwrap()).unwrap();
        assert!(!config.archive_dir.exists());
    }

    #[test]
    fn rotation_without_a_dataset_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = archive_config(dir.path());

        rotate_archives(&config, NaiveDate::from_ymd_opt(2026, 8, 22).unwrap()).unwrap();
        assert!(!config.archive_dir.exists());
    }
}
