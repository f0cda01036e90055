use tracing::warn;

use crate::models::{ComparisonRecord, OccupancyMetrics, PricingMetrics};

/// Position every property against the reference property.
///
/// Primary price and occupancy axes use the preferred (room-aware) figures;
/// the plain property-level deltas ride along as a secondary axis. Room
/// deltas only exist when both sides actually reported room data. Properties
/// missing from either metric table are left out, as is the reference
/// itself. Sorted by preferred price delta percent, cheapest relative first.
pub fn compare_to_reference(
    pricing: &[PricingMetrics],
    occupancy: &[OccupancyMetrics],
    reference: &str,
) -> Vec<ComparisonRecord> {
    let ref_pricing = pricing.iter().find(|m| m.hotel_name == reference);
    let ref_occupancy = occupancy.iter().find(|m| m.hotel_name == reference);

    let (Some(ref_pricing), Some(ref_occupancy)) = (ref_pricing, ref_occupancy) else {
        warn!("Reference property '{}' not found in collected data", reference);
        return Vec::new();
    };

    let mut comparisons = Vec::new();

    for subject in pricing {
        if subject.hotel_name == reference {
            continue;
        }
        let Some(subject_occ) = occupancy.iter().find(|m| m.hotel_name == subject.hotel_name)
        else {
            continue;
        };

        let price_vs_ref = subject.preferred_price - ref_pricing.preferred_price;
        let price_vs_ref_pct = if ref_pricing.preferred_price > 0.0 {
            price_vs_ref / ref_pricing.preferred_price * 100.0
        } else {
            0.0
        };
        let occ_vs_ref =
            subject_occ.preferred_occupancy_rate - ref_occupancy.preferred_occupancy_rate;

        let room_price_vs_ref = subject
            .avg_room_price
            .zip(ref_pricing.avg_room_price)
            .map(|(subject_price, ref_price)| subject_price - ref_price);
        let room_occ_vs_ref = (subject_occ.avg_total_room_types > 0.0
            && ref_occupancy.avg_total_room_types > 0.0)
            .then(|| subject_occ.avg_room_occupancy_rate - ref_occupancy.avg_room_occupancy_rate);

        comparisons.push(ComparisonRecord {
            hotel_name: subject.hotel_name.clone(),
            avg_price: subject.preferred_price,
            price_vs_ref,
            price_vs_ref_pct,
            property_price_vs_ref: subject.avg_price_per_night - ref_pricing.avg_price_per_night,
            occupancy: subject_occ.preferred_occupancy_rate,
            occ_vs_ref,
            property_occ_vs_ref: subject_occ.occupancy_rate - ref_occupancy.occupancy_rate,
            room_price_vs_ref,
            room_occ_vs_ref,
            position: if price_vs_ref > 0.0 {
                "Higher Price".to_string()
            } else {
                "Lower Price".to_string()
            },
            demand: if occ_vs_ref > 0.0 {
                "Higher Demand".to_string()
            } else {
                "Lower Demand".to_string()
            },
        });
    }

    comparisons.sort_by(|a, b| a.price_vs_ref_pct.total_cmp(&b.price_vs_ref_pct));
    comparisons
}
