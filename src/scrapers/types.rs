use chrono::NaiveDate;

use crate::config::{Config, Mode};
use crate::models::Property;

/// One (check-in, check-out) window to query for a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    /// Days from the collection date to check-in; occupancy mode only
    pub day_offset: Option<u32>,
}

/// Expand the configured date matrix for one collection day.
///
/// Occupancy mode sweeps day offsets 0, interval, 2x interval up to and
/// including the horizon, each with the fixed stay length. Pricing mode
/// crosses every check-in offset with every stay duration.
pub fn build_stay_queries(config: &Config, today: NaiveDate) -> Vec<StayQuery> {
    let mut queries = Vec::new();

    match config.mode {
        Mode::Occupancy => {
            let mut day_offset = 0;
            while day_offset <= config.days_ahead {
                let check_in = today + chrono::Duration::days(i64::from(day_offset));
                let nights = config.occupancy_stay_duration;
                queries.push(StayQuery {
                    check_in,
                    check_out: check_in + chrono::Duration::days(i64::from(nights)),
                    nights,
                    day_offset: Some(day_offset),
                });
                if config.check_interval == 0 {
                    break;
                }
                day_offset += config.check_interval;
            }
        }
        Mode::Pricing => {
            for &offset in &config.check_in_offsets {
                let check_in = today + chrono::Duration::days(i64::from(offset));
                for &nights in &config.stay_durations {
                    queries.push(StayQuery {
                        check_in,
                        check_out: check_in + chrono::Duration::days(i64::from(nights)),
                        nights,
                        day_offset: None,
                    });
                }
            }
        }
    }

    queries
}

/// Build the listing URL for a property and stay window
pub fn listing_url(
    base_url: &str,
    property: &Property,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: u32,
    rooms: u32,
) -> String {
    format!(
        "{base}/hotel/{cc}/{slug}.en-gb.html?checkin={check_in}&checkout={check_out}&group_adults={guests}&group_children=0&no_rooms={rooms}",
        base = base_url,
        cc = property.country_code,
        slug = property.slug,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, d).unwrap()
    }

    #[test]
    fn occupancy_sweep_includes_the_horizon() {
        let config = Config {
            mode: Mode::Occupancy,
            days_ahead: 30,
            check_interval: 3,
            occupancy_stay_duration: 1,
            ..Config::default()
        };
        let queries = build_stay_queries(&config, day(1));

        // offsets 0, 3, 6, ..., 30
        assert_eq!(queries.len(), 11);
        assert_eq!(queries[0].day_offset, Some(0));
        assert_eq!(queries[0].check_in, day(1));
        assert_eq!(queries[0].check_out, day(2));
        assert_eq!(queries[10].day_offset, Some(30));
        assert_eq!(queries[10].check_in, day(1) + chrono::Duration::days(30));
        assert!(queries.iter().all(|q| q.nights == 1));
    }

    #[test]
    fn pricing_mode_crosses_offsets_with_durations() {
        let config = Config {
            mode: Mode::Pricing,
            check_in_offsets: vec![7, 14],
            stay_durations: vec![1, 3, 7],
            ..Config::default()
        };
        let queries = build_stay_queries(&config, day(1));

        assert_eq!(queries.len(), 6);
        assert!(queries.iter().all(|q| q.day_offset.is_none()));
        assert_eq!(queries[0].check_in, day(8));
        assert_eq!(queries[0].check_out, day(9));
        assert_eq!(queries[2].nights, 7);
        assert_eq!(queries[2].check_out, day(15));
        assert_eq!(queries[3].check_in, day(15));
    }

    #[test]
    fn listing_url_carries_stay_and_occupancy_params() {
        let property = Property {
            name: "Seaview Lodge".to_string(),
            slug: "seaview-lodge".to_string(),
            country_code: "za".to_string(),
        };
        let url = listing_url(
            "https://www.booking.com",
            &property,
            day(8),
            day(10),
            2,
            1,
        );
        assert_eq!(
            url,
            "https://www.booking.com/hotel/za/seaview-lodge.en-gb.html\
             ?checkin=2026-09-08&checkout=2026-09-10&group_adults=2&group_children=0&no_rooms=1"
        );
    }
}
