use crate::models::{Availability, PricingRecord};

/// One reconciled room-inventory observation
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSample {
    pub effective_total: u32,
    pub effective_available: u32,
    pub sold: u32,
    pub occupancy_pct: f64,
    pub min_price_per_night: Option<f64>,
    pub max_price_per_night: Option<f64>,
    pub avg_price_per_night: Option<f64>,
}

/// Accumulator carried across one property's history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileState {
    /// Most recent positive room-type total seen so far
    pub last_known_total: Option<u32>,
}

/// Reconciled room inventory for one property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledInventory {
    pub samples: Vec<RoomSample>,
    /// Maximum reported room-type total over the whole history
    pub room_type_estimate: Option<u32>,
    pub state: ReconcileState,
    pub avg_total: f64,
    pub avg_available: f64,
    pub avg_sold: f64,
    pub avg_occupancy: f64,
    pub avg_min_price: Option<f64>,
    pub avg_max_price: Option<f64>,
    pub avg_price: Option<f64>,
}

/// Fold one property's time-ordered records into trustworthy room samples.
///
/// Individual date checks under-report inventory: sold-out pages drop the
/// room table, the DOM fallback misses types, error checks carry nothing.
/// The fold fixes a room-type total per check (the history-wide maximum when
/// one exists, else the carried-forward last positive total) and derives
/// availability against it:
///
/// - reported available count when present,
/// - zero for sold-out checks,
/// - the full total otherwise (assume availability absent contrary evidence).
///
/// Available is clamped into [0, total]; checks with no usable total and no
/// availability signal contribute nothing. Pure over its input: the same
/// history reconciles to the same samples every time.
pub fn reconcile(records: &[PricingRecord]) -> ReconciledInventory {
    let room_type_estimate = records
        .iter()
        .filter_map(|r| r.total_room_types)
        .filter(|total| *total > 0)
        .max();

    let mut state = ReconcileState::default();
    let mut samples = Vec::new();

    for record in records {
        if let Some(total) = record.total_room_types.filter(|t| *t > 0) {
            state.last_known_total = Some(total);
        }

        let effective_total = room_type_estimate.or(state.last_known_total).unwrap_or(0);
        let has_available_signal =
            record.available_room_types.is_some() || record.availability == Availability::SoldOut;

        if effective_total == 0 && !has_available_signal {
            continue;
        }

        let raw_available = match (record.available_room_types, record.availability) {
            (Some(count), _) => count,
            (None, Availability::SoldOut) => 0,
            (None, _) => effective_total,
        };
        let effective_available = raw_available.min(effective_total);
        let sold = effective_total - effective_available;
        let occupancy_pct = if effective_total > 0 {
            f64::from(sold) / f64::from(effective_total) * 100.0
        } else {
            0.0
        };

        samples.push(RoomSample {
            effective_total,
            effective_available,
            sold,
            occupancy_pct,
            min_price_per_night: record.min_room_price.map(|p| per_night(p, record)),
            max_price_per_night: record.max_room_price.map(|p| per_night(p, record)),
            avg_price_per_night: record.avg_room_price.map(|p| per_night(p, record)),
        });
    }

    let avg_total = mean(samples.iter().map(|s| f64::from(s.effective_total))).unwrap_or(0.0);
    let avg_available =
        mean(samples.iter().map(|s| f64::from(s.effective_available))).unwrap_or(0.0);
    let avg_sold = mean(samples.iter().map(|s| f64::from(s.sold))).unwrap_or(0.0);
    let avg_occupancy = mean(samples.iter().map(|s| s.occupancy_pct)).unwrap_or(0.0);
    let avg_min_price = mean(samples.iter().filter_map(|s| s.min_price_per_night));
    let avg_max_price = mean(samples.iter().filter_map(|s| s.max_price_per_night));
    let avg_price = mean(samples.iter().filter_map(|s| s.avg_price_per_night));

    ReconciledInventory {
        samples,
        room_type_estimate,
        state,
        avg_total,
        avg_available,
        avg_sold,
        avg_occupancy,
        avg_min_price,
        avg_max_price,
        avg_price,
    }
}

/// Normalize a room price for the stay to a per-night figure: divide by the
/// night count when known, fall back to the record's own per-night price,
/// else keep the raw value unscaled.
fn per_night(price: f64, record: &PricingRecord) -> f64 {
    if record.nights > 0 {
        price / f64::from(record.nights)
    } else if let Some(per_night) = record.price_per_night {
        per_night
    } else {
        price
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
