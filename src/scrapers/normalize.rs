use chrono::Utc;

use crate::config::Config;
use crate::models::{round2, Availability, PricingRecord, Property};
use crate::scrapers::page::PageSignals;
use crate::scrapers::types::StayQuery;

/// Build the record for one date check from parsed page signals.
///
/// Availability: with a room signal, available means at least one room type
/// has a usable price. Without one, property-level sold-out indicators
/// decide, defaulting to available.
///
/// The effective total price is the cheapest room price, falling back to the
/// DOM headline price when structured extraction found nothing usable.
pub fn normalize_record(
    config: &Config,
    property: &Property,
    stay: &StayQuery,
    signals: &PageSignals,
) -> PricingRecord {
    let inventory = &signals.inventory;

    let availability = if signals.room_signal {
        if inventory.available_room_types > 0 {
            Availability::Available
        } else {
            Availability::SoldOut
        }
    } else if signals.dom_sold_out {
        Availability::SoldOut
    } else {
        Availability::Available
    };

    let total_price = inventory.min_room_price.or(signals.headline_price);
    let price_per_night = match total_price {
        Some(price) if price > 0.0 && stay.nights > 0 => Some(price / f64::from(stay.nights)),
        _ => None,
    };

    let (has_discount, discount_percentage) = match (signals.original_price, total_price) {
        (Some(original), Some(price)) if original > price => {
            (true, Some(round2((original - price) / original * 100.0)))
        }
        _ => (false, None),
    };

    let property_occupancy_rate = if inventory.total_room_types > 0 {
        Some(round2(
            f64::from(inventory.sold_out_room_types) / f64::from(inventory.total_room_types)
                * 100.0,
        ))
    } else {
        None
    };

    PricingRecord {
        hotel_name: property.name.clone(),
        hotel_slug: property.slug.clone(),
        check_in_date: stay.check_in,
        check_out_date: stay.check_out,
        nights: stay.nights,
        guests: config.guests,
        rooms: config.rooms,
        day_offset: stay.day_offset,
        availability,
        total_price,
        original_price: signals.original_price,
        price_per_night,
        has_discount: Some(has_discount),
        discount_percentage,
        rating_score: signals.rating_score,
        review_count: signals.review_count,
        total_room_types: Some(inventory.total_room_types),
        available_room_types: Some(inventory.available_room_types),
        sold_out_room_types: Some(inventory.sold_out_room_types),
        property_occupancy_rate,
        min_room_price: inventory.min_room_price,
        max_room_price: inventory.max_room_price,
        avg_room_price: inventory.avg_room_price,
        room_names: inventory.room_names.join(", "),
        scrape_timestamp: Utc::now(),
    }
}

/// Record for a date check whose page could not be fetched.
///
/// Every price and room field stays absent; only the stay coordinates and
/// the error verdict survive.
pub fn error_record(config: &Config, property: &Property, stay: &StayQuery) -> PricingRecord {
    PricingRecord {
        hotel_name: property.name.clone(),
        hotel_slug: property.slug.clone(),
        check_in_date: stay.check_in,
        check_out_date: stay.check_out,
        nights: stay.nights,
        guests: config.guests,
        rooms: config.rooms,
        day_offset: stay.day_offset,
        availability: Availability::Error,
        total_price: None,
        original_price: None,
        price_per_night: None,
        has_discount: None,
        discount_percentage: None,
        rating_score: None,
        review_count: None,
        total_room_types: None,
        available_room_types: None,
        sold_out_room_types: None,
        property_occupancy_rate: None,
        min_room_price: None,
        max_room_price: None,
        avg_room_price: None,
        room_names: String::new(),
        scrape_timestamp: Utc::now(),
    }
}
