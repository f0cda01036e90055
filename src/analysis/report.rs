use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use crate::analysis::aggregate::PropertyDataset;
use crate::analysis::compare::compare_to_reference;
use crate::config::Config;
use crate::error::StoreError;
use crate::models::{AnalysisDocument, PricingRecord};
use crate::storage::load_records;

/// Run the full analysis pass: load the dataset, derive every metric table,
/// write the JSON document and print the key insights.
pub fn run_analysis(config: &Config) -> anyhow::Result<AnalysisDocument> {
    if !config.data_file.exists() {
        anyhow::bail!(
            "Pricing data not found at {} - run a scrape first",
            config.data_file.display()
        );
    }

    info!("Loading pricing data...");
    let records = load_records(&config.data_file).with_context(|| {
        format!(
            "Failed to load pricing data from {}",
            config.data_file.display()
        )
    })?;
    info!("Loaded {} records", records.len());

    let document = build_analysis(
        records,
        &config.reference_property,
        config.mode.display_name(),
    );

    write_analysis(&document, &config.analysis_file).with_context(|| {
        format!("Failed to write analysis to {}", config.analysis_file.display())
    })?;
    info!("Analysis saved to {}", config.analysis_file.display());

    print_key_insights(&document);
    Ok(document)
}

/// Derive the complete analysis document from raw records.
///
/// An empty dataset still produces a valid document with empty tables;
/// `generated_at` then falls back to the current time instead of the
/// newest record timestamp.
pub fn build_analysis(
    records: Vec<PricingRecord>,
    reference: &str,
    mode_name: &str,
) -> AnalysisDocument {
    let dataset = PropertyDataset::from_records(records);
    if dataset.is_empty() {
        warn!("No pricing data available to analyze");
    }

    let generated_at = dataset.latest_timestamp().unwrap_or_else(Utc::now);

    info!(
        "Calculating occupancy metrics for {} properties...",
        dataset.property_count()
    );
    let occupancy_metrics = dataset.occupancy_metrics();

    info!("Calculating pricing metrics...");
    let pricing_metrics = dataset.pricing_metrics();

    info!("Comparing to {}...", reference);
    let comparison = compare_to_reference(&pricing_metrics, &occupancy_metrics, reference);

    info!("Analyzing room inventory and pricing strategies...");
    let room_inventory = dataset.room_inventory();

    AnalysisDocument {
        generated_at,
        reference_property: reference.to_string(),
        mode: mode_name.to_string(),
        pricing_metrics,
        occupancy_metrics,
        comparison,
        room_inventory,
    }
}

pub fn write_analysis(document: &AnalysisDocument, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Human-readable summary of where the reference property stands
fn print_key_insights(document: &AnalysisDocument) {
    let reference = &document.reference_property;

    println!();
    println!("{}", "=".repeat(70));
    println!("KEY INSIGHTS");
    println!("{}", "=".repeat(70));

    let ref_pricing = document
        .pricing_metrics
        .iter()
        .find(|m| &m.hotel_name == reference);
    let ref_occupancy = document
        .occupancy_metrics
        .iter()
        .find(|m| &m.hotel_name == reference);
    let ref_room = document
        .room_inventory
        .iter()
        .find(|r| &r.hotel_name == reference);

    if let (Some(pricing), Some(occupancy)) = (ref_pricing, ref_occupancy) {
        println!("\n{}:", reference);
        println!("  Price/Night: {:.2}", pricing.preferred_price);
        println!("  Occupancy: {:.1}%", occupancy.preferred_occupancy_rate);

        if let Some(room) = ref_room {
            println!("\n  Room Inventory:");
            println!("    Total Room Types: {:.1}", room.avg_total_room_types);
            println!("    Available Rooms: {:.1}", room.avg_available_room_types);
            println!("    Room Occupancy: {:.1}%", room.avg_room_occupancy_rate);

            if let (Some(min), Some(max), Some(avg)) = (
                room.avg_min_room_price,
                room.avg_max_room_price,
                room.avg_room_price,
            ) {
                println!("  Room Pricing:");
                println!("    Min Room Price: {:.2}", min);
                println!("    Max Room Price: {:.2}", max);
                println!("    Avg Room Price: {:.2}", avg);
                if let Some(spread_pct) = room.room_price_spread_pct {
                    println!("    Price Spread: {:.1}%", spread_pct);
                }
            }
        }
    }

    if !document.comparison.is_empty() {
        let cheaper = document
            .comparison
            .iter()
            .filter(|c| c.price_vs_ref < 0.0)
            .count();
        let pricier = document
            .comparison
            .iter()
            .filter(|c| c.price_vs_ref > 0.0)
            .count();
        println!("\nMarket Position:");
        println!("  {} competitors cheaper | {} more expensive", cheaper, pricier);

        // the comparison table is sorted by relative price, cheapest first
        if let (Some(first), Some(last)) =
            (document.comparison.first(), document.comparison.last())
        {
            println!(
                "  Cheapest competitor: {} ({:+.1}% vs {})",
                first.hotel_name, first.price_vs_ref_pct, reference
            );
            println!(
                "  Most expensive: {} ({:+.1}% vs {})",
                last.hotel_name, last.price_vs_ref_pct, reference
            );
        }
    }

    if !document.room_inventory.is_empty() {
        println!("\nRoom Inventory Intelligence:");
        println!(
            "  Properties with room data: {}",
            document.room_inventory.len()
        );

        let high_occupancy: Vec<_> = document
            .room_inventory
            .iter()
            .filter(|r| r.avg_room_occupancy_rate > 70.0)
            .collect();
        if !high_occupancy.is_empty() {
            println!(
                "  High room occupancy (>70%): {} properties",
                high_occupancy.len()
            );
            for report in high_occupancy.iter().take(3) {
                println!(
                    "    - {}: {:.1}% occupancy",
                    report.hotel_name, report.avg_room_occupancy_rate
                );
            }
        }

        let tiered = document
            .room_inventory
            .iter()
            .filter(|r| r.uses_room_tiering)
            .count();
        if tiered > 0 {
            println!(
                "  Using tiered pricing (>50% price spread): {} properties",
                tiered
            );
        }
    }

    println!("\n{}", "=".repeat(70));
}
