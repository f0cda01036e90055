use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::scrapers::extract::{
    extract_embedded_json, parse_all_room_names, parse_room_listings, EmbeddedJson, RoomInventory,
    ALL_ROOMS_KEY, ROOMS_KEY,
};

/// Selectors tried in order for the headline price
const PRICE_SELECTORS: &[&str] = &[
    "[data-testid='price-and-discounted-price']",
    ".prco-valign-middle-helper",
    ".bui-price-display__value",
    ".prco-inline-block-maker-helper",
    "[data-testid='recommended-price']",
    ".bui_price_headline",
    ".prco-text-nowrap-helper",
];

/// Property-level sold-out markers
const SOLD_OUT_SELECTORS: &[&str] = &[
    ".soldout_property",
    "[data-testid='soldout-property']",
    ".bui-banner--warning",
];

/// Phrases that read as "nothing bookable" when they appear in page text
const NO_AVAILABILITY_PHRASES: &[&str] =
    &["no availability", "sold out", "not available", "fully booked"];

/// Raw signals parsed from one listing page.
///
/// The normalizer turns these into a `PricingRecord`; everything here is
/// still close to the markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    pub inventory: RoomInventory,
    /// True when a structured or DOM room listing was found; drives the
    /// availability verdict
    pub room_signal: bool,
    /// Property-level sold-out indicators; only consulted without a room signal
    pub dom_sold_out: bool,
    /// DOM headline price; populated only when structured extraction found
    /// no rooms
    pub headline_price: Option<f64>,
    pub original_price: Option<f64>,
    pub rating_score: Option<f64>,
    pub review_count: Option<u32>,
}

/// Parse a listing page into raw signals.
///
/// Extraction order: the embedded room listing first, the all-rooms name
/// object second, the DOM third. Prices are captured before availability is
/// decided, so sold-out dates with a displayed price keep it.
pub fn parse_listing_page(html: &str) -> PageSignals {
    let mut signals = PageSignals::default();

    // Approach 1: embedded room listing
    match extract_embedded_json(html, ROOMS_KEY) {
        EmbeddedJson::Literal(value) => {
            let listings = parse_room_listings(&value);
            if !listings.is_empty() {
                signals.inventory = RoomInventory::from_listings(&listings);
                signals.room_signal = true;
            }
        }
        EmbeddedJson::NotFound => {}
        EmbeddedJson::Malformed => debug!("Embedded room listing is malformed, falling back"),
    }

    // Approach 1b: all-rooms object carries names even when everything is
    // sold out
    if !signals.room_signal {
        if let Some(value) = extract_embedded_json(html, ALL_ROOMS_KEY).into_value() {
            let names = parse_all_room_names(&value);
            if !names.is_empty() {
                signals.inventory = RoomInventory::from_names_only(names);
                signals.room_signal = true;
            }
        }
    }

    let document = Html::parse_document(html);

    // Approach 2: DOM fallback for pages without embedded room data
    if !signals.room_signal {
        signals.headline_price = headline_price(&document);
        signals.dom_sold_out = property_sold_out(&document);

        if let Some(inventory) = room_table_inventory(&document) {
            signals.inventory = inventory;
            signals.room_signal = true;
        }
    }

    // Discount, rating and review signals only live in the DOM
    signals.original_price = select_text(&document, ".bui-price-display__original")
        .as_deref()
        .and_then(price_from_text);
    signals.rating_score = select_text(&document, "[data-testid='review-score'] .d10a6220b4")
        .and_then(|text| text.trim().parse().ok());
    signals.review_count = select_text(&document, "[data-testid='review-score'] .e6208ee469")
        .as_deref()
        .and_then(leading_count);

    signals
}

/// Extract a numeric price from text like "R 1,234" or "ZAR 1234.56"
pub fn price_from_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// First number in text, tolerating thousands separators ("1,234 reviews")
fn leading_count(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

fn select_text(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First price selector whose text contains a digit
fn headline_price(document: &Html) -> Option<f64> {
    for css in PRICE_SELECTORS {
        if let Some(text) = select_text(document, css) {
            if text.chars().any(|c| c.is_ascii_digit()) {
                return price_from_text(&text);
            }
        }
    }
    None
}

/// Property-level sold-out check: marker elements, then page-text phrases.
///
/// A phrase only counts when "room" is absent from its immediate context,
/// otherwise room-level notices ("this room is not available") would read as
/// property-level ones.
fn property_sold_out(document: &Html) -> bool {
    for css in SOLD_OUT_SELECTORS {
        if document.select(&selector(css)).next().is_some() {
            return true;
        }
    }

    let page_text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    let bytes = page_text.as_bytes();
    for phrase in NO_AVAILABILITY_PHRASES {
        if let Some(pos) = page_text.find(phrase) {
            let start = pos.saturating_sub(50);
            let end = (pos + 50).min(bytes.len());
            let context = &bytes[start..end];
            if !context.windows(4).any(|w| w == b"room") {
                return true;
            }
        }
    }
    false
}

/// Scan the room table for per-room-type availability and prices
fn room_table_inventory(document: &Html) -> Option<RoomInventory> {
    let table = document
        .select(&selector("#hprt-table"))
        .next()
        .or_else(|| document.select(&selector("[data-block-id='rooms-table']")).next())?;

    let row_selector = selector("tr.js-rt-block-row, tr[data-block-id]");
    let name_selector = selector(".hprt-roomtype-icon-link, .hprt-roomtype-name, [data-testid='title']");
    let price_cell_selector = selector(".hprt-table-cell-price");
    let price_selector = selector("[data-testid='price-and-discounted-price'], .bui-price-display__value");

    let rows: Vec<ElementRef> = table.select(&row_selector).collect();

    let mut names = Vec::new();
    let mut prices = Vec::new();
    let mut total: u32 = 0;
    let mut available: u32 = 0;

    if rows.is_empty() {
        // No row markup; count by price cells and room-type cells instead
        for cell in table.select(&price_cell_selector) {
            if let Some(price_el) = cell.select(&price_selector).next() {
                available += 1;
                if let Some(price) = price_from_text(&element_text(price_el)) {
                    prices.push(price);
                }
            }
        }
        total = table
            .select(&selector(".hprt-table-cell-roomtype, .hprt-roomtype-icon-link"))
            .count() as u32;
        for name_el in table.select(&selector(".hprt-roomtype-icon-link, .hprt-roomtype-name")) {
            let name = element_text(name_el);
            if !name.is_empty() {
                names.push(name);
            }
        }
    } else {
        for row in rows {
            total += 1;
            if let Some(name_el) = row.select(&name_selector).next() {
                let name = element_text(name_el);
                if !name.is_empty() {
                    names.push(name);
                }
            }
            let priced = row
                .select(&price_cell_selector)
                .next()
                .and_then(|cell| cell.select(&price_selector).next());
            if let Some(price_el) = priced {
                available += 1;
                if let Some(price) = price_from_text(&element_text(price_el)) {
                    prices.push(price);
                }
            }
        }
    }

    Some(RoomInventory::from_counts(names, total, available, &prices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_listing_wins_over_the_dom() {
        let html = r#"<html><body>
            <script>
            booking.env = { b_rooms_available_and_soldout: [
                {"b_name": "Deluxe Room", "b_blocks": [{"b_raw_price": 2400.0}]},
                {"b_name": "Standard Room", "b_blocks": [{"b_raw_price": 1800.0}]},
                {"b_name": "Attic Room", "b_blocks": []}
            ] };
            </script>
            <span data-testid="price-and-discounted-price">R 9,999</span>
        </body></html>"#;

        let signals = parse_listing_page(html);
        assert!(signals.room_signal);
        assert_eq!(signals.inventory.total_room_types, 3);
        assert_eq!(signals.inventory.available_room_types, 2);
        assert_eq!(signals.inventory.min_room_price, Some(1800.0));
        // headline is fallback only, never read on the structured path
        assert_eq!(signals.headline_price, None);
    }

    #[test]
    fn all_rooms_names_cover_sold_out_pages() {
        let html = r#"<html><body><script>
            booking.env = { b_all_rooms: {"r1": {"b_name": "Garden Suite"}, "r2": {"b_name": "Loft"}},
            };
        </script></body></html>"#;

        let signals = parse_listing_page(html);
        assert!(signals.room_signal);
        assert_eq!(signals.inventory.total_room_types, 2);
        assert_eq!(signals.inventory.available_room_types, 0);
        assert_eq!(signals.inventory.sold_out_room_types, 2);
    }

    #[test]
    fn dom_room_table_rows_drive_counts() {
        let html = r#"<html><body>
            <table id="hprt-table">
                <tr class="js-rt-block-row">
                    <td><a class="hprt-roomtype-icon-link">Sea View Double</a></td>
                    <td class="hprt-table-cell-price">
                        <span class="bui-price-display__value">R 1,250</span>
                    </td>
                </tr>
                <tr class="js-rt-block-row">
                    <td><a class="hprt-roomtype-icon-link">Courtyard Twin</a></td>
                    <td class="hprt-table-cell-price"></td>
                </tr>
            </table>
        </body></html>"#;

        let signals = parse_listing_page(html);
        assert!(signals.room_signal);
        assert_eq!(signals.inventory.total_room_types, 2);
        assert_eq!(signals.inventory.available_room_types, 1);
        assert_eq!(signals.inventory.sold_out_room_types, 1);
        assert_eq!(signals.inventory.min_room_price, Some(1250.0));
        assert_eq!(
            signals.inventory.room_names,
            vec!["Sea View Double", "Courtyard Twin"]
        );
    }

    #[test]
    fn headline_price_survives_without_room_data() {
        let html = r#"<html><body>
            <div class="bui-price-display__value">ZAR 3,450.50</div>
        </body></html>"#;

        let signals = parse_listing_page(html);
        assert!(!signals.room_signal);
        assert_eq!(signals.headline_price, Some(3450.50));
        assert!(!signals.dom_sold_out);
    }

    #[test]
    fn sold_out_marker_is_detected() {
        let html = r#"<html><body>
            <div class="soldout_property">This property has no availability.</div>
        </body></html>"#;

        let signals = parse_listing_page(html);
        assert!(!signals.room_signal);
        assert!(signals.dom_sold_out);
    }

    #[test]
    fn room_level_notice_is_not_a_property_sold_out() {
        let html = r#"<html><body>
            <p>This room is not available for your dates.</p>
        </body></html>"#;

        let signals = parse_listing_page(html);
        assert!(!signals.dom_sold_out);
    }

    #[test]
    fn rating_review_and_original_price_come_from_the_dom() {
        let html = r#"<html><body>
            <span class="bui-price-display__original">R 2,000</span>
            <div data-testid="review-score">
                <div class="d10a6220b4">8.7</div>
                <div class="e6208ee469">1,284 reviews</div>
            </div>
        </body></html>"#;

        let signals = parse_listing_page(html);
        assert_eq!(signals.original_price, Some(2000.0));
        assert_eq!(signals.rating_score, Some(8.7));
        assert_eq!(signals.review_count, Some(1284));
    }

    #[test]
    fn price_text_parsing_strips_currency_noise() {
        assert_eq!(price_from_text("R 1,234"), Some(1234.0));
        assert_eq!(price_from_text("ZAR 1234.56"), Some(1234.56));
        assert_eq!(price_from_text("from\u{a0}R\u{a0}980"), Some(980.0));
        assert_eq!(price_from_text("call us"), None);
    }
}
