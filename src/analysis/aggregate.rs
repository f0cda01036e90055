use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::analysis::reconcile::{reconcile, ReconciledInventory};
use crate::models::{
    MetricSource, OccupancyMetrics, PricingMetrics, PricingRecord, RoomInventoryReport,
};

/// One property's full record history plus its reconciled room inventory
#[derive(Debug, Clone)]
pub struct PropertyHistory {
    pub records: Vec<PricingRecord>,
    pub rooms: ReconciledInventory,
}

/// The dataset grouped by property, in first-seen order.
///
/// Built once per analysis run; every metric table derives from it. Metric
/// values stay unrounded, rendering decides the precision.
#[derive(Debug, Clone, Default)]
pub struct PropertyDataset {
    groups: IndexMap<String, PropertyHistory>,
}

impl PropertyDataset {
    pub fn from_records(records: Vec<PricingRecord>) -> Self {
        let mut grouped: IndexMap<String, Vec<PricingRecord>> = IndexMap::new();
        for record in records {
            grouped
                .entry(record.hotel_name.clone())
                .or_default()
                .push(record);
        }

        let groups = grouped
            .into_iter()
            .map(|(name, records)| {
                let rooms = reconcile(&records);
                (name, PropertyHistory { records, rooms })
            })
            .collect();

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn property_count(&self) -> usize {
        self.groups.len()
    }

    /// Most recent scrape timestamp across the whole dataset
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.groups
            .values()
            .flat_map(|history| history.records.iter())
            .map(|record| record.scrape_timestamp)
            .max()
    }

    /// Occupancy rollup per property, sorted by property-level occupancy
    /// rate descending.
    ///
    /// The property-level rate counts error checks in the denominator: an
    /// unreachable page is evidence of neither availability nor demand, but
    /// it was a check. Room-level figures come from the reconciled samples.
    pub fn occupancy_metrics(&self) -> Vec<OccupancyMetrics> {
        let mut metrics = Vec::new();

        for (hotel_name, history) in &self.groups {
            let total_checks = history.records.len();
            let available = history.records.iter().filter(|r| r.is_available()).count();
            let sold_out = history.records.iter().filter(|r| r.is_sold_out()).count();

            let occupancy_rate = share_pct(sold_out, total_checks);
            let availability_rate = share_pct(available, total_checks);

            let rooms = &history.rooms;
            let multi_room = rooms.room_type_estimate.map_or(false, |e| e > 1);
            let (preferred_occupancy_rate, occupancy_source) =
                if multi_room && rooms.avg_occupancy > 0.0 {
                    (rooms.avg_occupancy, MetricSource::Room)
                } else {
                    (occupancy_rate, MetricSource::Property)
                };

            metrics.push(OccupancyMetrics {
                hotel_name: hotel_name.clone(),
                total_checks,
                available,
                sold_out,
                occupancy_rate,
                availability_rate,
                avg_total_room_types: rooms.avg_total,
                avg_available_room_types: rooms.avg_available,
                avg_sold_out_room_types: rooms.avg_sold,
                avg_room_occupancy_rate: rooms.avg_occupancy,
                preferred_occupancy_rate,
                occupancy_source,
            });
        }

        metrics.sort_by(|a, b| b.occupancy_rate.total_cmp(&a.occupancy_rate));
        metrics
    }

    /// Pricing rollup per property over available, priced date checks,
    /// sorted by property-level average price descending. Properties with
    /// no usable per-night price are left out.
    pub fn pricing_metrics(&self) -> Vec<PricingMetrics> {
        let mut metrics = Vec::new();

        for (hotel_name, history) in &self.groups {
            let priced: Vec<&PricingRecord> = history
                .records
                .iter()
                .filter(|r| r.is_available() && r.total_price.is_some())
                .collect();
            let prices: Vec<f64> = priced.iter().filter_map(|r| r.price_per_night).collect();

            let Some(avg_price_per_night) = mean(&prices) else {
                continue;
            };

            let discounted: Vec<f64> = priced
                .iter()
                .filter(|r| r.has_discount == Some(true))
                .filter_map(|r| r.discount_percentage)
                .collect();
            let ratings: Vec<f64> = priced.iter().filter_map(|r| r.rating_score).collect();

            let rooms = &history.rooms;
            let multi_room = rooms.room_type_estimate.map_or(false, |e| e > 1);
            let (preferred_price, price_source) = match rooms.avg_price {
                Some(room_avg) if multi_room => (room_avg, MetricSource::Room),
                _ => (avg_price_per_night, MetricSource::Property),
            };

            metrics.push(PricingMetrics {
                hotel_name: hotel_name.clone(),
                avg_price_per_night,
                min_price: prices.iter().copied().fold(f64::INFINITY, f64::min),
                max_price: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                median_price: median(&prices).unwrap_or(avg_price_per_night),
                std_price: sample_std(&prices),
                discount_frequency: share_pct(
                    priced.iter().filter(|r| r.has_discount == Some(true)).count(),
                    priced.len(),
                ),
                avg_discount: mean(&discounted),
                avg_rating: mean(&ratings),
                sample_size: priced.len(),
                avg_min_room_price: rooms.avg_min_price,
                avg_max_room_price: rooms.avg_max_price,
                avg_room_price: rooms.avg_price,
                room_price_range: rooms
                    .avg_max_price
                    .zip(rooms.avg_min_price)
                    .map(|(max, min)| max - min),
                preferred_price,
                price_source,
            });
        }

        metrics.sort_by(|a, b| b.avg_price_per_night.total_cmp(&a.avg_price_per_night));
        metrics
    }

    /// Room-level inventory and pricing-strategy report, sorted by average
    /// room occupancy descending. A property appears only when its history
    /// ever reported room types; with a known estimate at least one
    /// reconciled sample always exists.
    pub fn room_inventory(&self) -> Vec<RoomInventoryReport> {
        let mut reports = Vec::new();

        for (hotel_name, history) in &self.groups {
            let rooms = &history.rooms;
            let Some(room_type_estimate) = rooms.room_type_estimate else {
                continue;
            };

            let spread = rooms
                .avg_max_price
                .zip(rooms.avg_min_price)
                .map(|(max, min)| max - min);
            let spread_pct = spread.zip(rooms.avg_min_price).map(|(spread, min)| {
                if min > 0.0 {
                    spread / min * 100.0
                } else {
                    0.0
                }
            });

            reports.push(RoomInventoryReport {
                hotel_name: hotel_name.clone(),
                room_type_estimate,
                avg_total_room_types: rooms.avg_total,
                avg_available_room_types: rooms.avg_available,
                avg_sold_out_room_types: rooms.avg_sold,
                avg_room_occupancy_rate: rooms.avg_occupancy,
                rooms_sold_out_pct: rooms.avg_occupancy,
                avg_min_room_price: rooms.avg_min_price,
                avg_max_room_price: rooms.avg_max_price,
                avg_room_price: rooms.avg_price,
                room_price_spread: spread,
                room_price_spread_pct: spread_pct,
                uses_room_tiering: spread_pct.map_or(false, |pct| pct > 50.0),
                sample_size: rooms.samples.len(),
            });
        }

        reports.sort_by(|a, b| {
            b.avg_room_occupancy_rate
                .total_cmp(&a.avg_room_occupancy_rate)
        });
        reports
    }
}

fn share_pct(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Sample standard deviation; undefined for fewer than two values
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|value| (value - avg).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
