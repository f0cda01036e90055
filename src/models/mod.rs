use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A property under observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub slug: String,
    /// Country code used in the listing URL path (e.g. "za")
    pub country_code: String,
}

/// Availability verdict for one date check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    SoldOut,
    Error,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Availability::Available => "available",
            Availability::SoldOut => "sold_out",
            Availability::Error => "error",
        };
        f.write_str(label)
    }
}

/// One observation of one property for one stay window.
///
/// Field order defines the dataset column order, so new fields go at the
/// end or get an archive migration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingRecord {
    pub hotel_name: String,
    pub hotel_slug: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub nights: u32,
    pub guests: u32,
    pub rooms: u32,
    /// Days from the collection date to check-in; occupancy mode only
    pub day_offset: Option<u32>,
    pub availability: Availability,
    pub total_price: Option<f64>,
    pub original_price: Option<f64>,
    pub price_per_night: Option<f64>,
    pub has_discount: Option<bool>,
    pub discount_percentage: Option<f64>,
    pub rating_score: Option<f64>,
    pub review_count: Option<u32>,
    pub total_room_types: Option<u32>,
    pub available_room_types: Option<u32>,
    pub sold_out_room_types: Option<u32>,
    pub property_occupancy_rate: Option<f64>,
    pub min_room_price: Option<f64>,
    pub max_room_price: Option<f64>,
    pub avg_room_price: Option<f64>,
    /// Room type names joined with ", "
    pub room_names: String,
    pub scrape_timestamp: DateTime<Utc>,
}

impl PricingRecord {
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    pub fn is_sold_out(&self) -> bool {
        self.availability == Availability::SoldOut
    }
}

/// Which tier a preferred metric came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    Room,
    Property,
}

/// Per-property occupancy rollup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccupancyMetrics {
    pub hotel_name: String,
    pub total_checks: usize,
    pub available: usize,
    pub sold_out: usize,
    /// Share of date checks that came back sold out, in percent
    pub occupancy_rate: f64,
    pub availability_rate: f64,
    pub avg_total_room_types: f64,
    pub avg_available_room_types: f64,
    pub avg_sold_out_room_types: f64,
    pub avg_room_occupancy_rate: f64,
    pub preferred_occupancy_rate: f64,
    pub occupancy_source: MetricSource,
}

/// Per-property pricing rollup over available, priced date checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingMetrics {
    pub hotel_name: String,
    pub avg_price_per_night: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub median_price: f64,
    /// Sample standard deviation; absent with fewer than two samples
    pub std_price: Option<f64>,
    pub discount_frequency: f64,
    pub avg_discount: Option<f64>,
    pub avg_rating: Option<f64>,
    pub sample_size: usize,
    pub avg_min_room_price: Option<f64>,
    pub avg_max_room_price: Option<f64>,
    pub avg_room_price: Option<f64>,
    pub room_price_range: Option<f64>,
    pub preferred_price: f64,
    pub price_source: MetricSource,
}

/// One property's position relative to the reference property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonRecord {
    pub hotel_name: String,
    /// The property's preferred price per night
    pub avg_price: f64,
    pub price_vs_ref: f64,
    pub price_vs_ref_pct: f64,
    pub property_price_vs_ref: f64,
    /// The property's preferred occupancy rate
    pub occupancy: f64,
    pub occ_vs_ref: f64,
    pub property_occ_vs_ref: f64,
    pub room_price_vs_ref: Option<f64>,
    pub room_occ_vs_ref: Option<f64>,
    pub position: String,
    pub demand: String,
}

/// Room-level inventory and pricing strategy for one property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomInventoryReport {
    pub hotel_name: String,
    pub room_type_estimate: u32,
    pub avg_total_room_types: f64,
    pub avg_available_room_types: f64,
    pub avg_sold_out_room_types: f64,
    pub avg_room_occupancy_rate: f64,
    /// Same value as avg_room_occupancy_rate, not its complement
    pub rooms_sold_out_pct: f64,
    pub avg_min_room_price: Option<f64>,
    pub avg_max_room_price: Option<f64>,
    pub avg_room_price: Option<f64>,
    pub room_price_spread: Option<f64>,
    pub room_price_spread_pct: Option<f64>,
    /// Price spread above 50% of the cheapest room reads as tiered pricing
    pub uses_room_tiering: bool,
    pub sample_size: usize,
}

/// The full analysis output document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisDocument {
    pub generated_at: DateTime<Utc>,
    pub reference_property: String,
    pub mode: String,
    pub pricing_metrics: Vec<PricingMetrics>,
    pub occupancy_metrics: Vec<OccupancyMetrics>,
    pub comparison: Vec<ComparisonRecord>,
    pub room_inventory: Vec<RoomInventoryReport>,
}

/// Round to two decimals for reported percentages and price stats
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
