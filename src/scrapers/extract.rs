use serde_json::Value;

use crate::models::round2;

/// Key holding the structured room listing on booking pages
pub const ROOMS_KEY: &str = "b_rooms_available_and_soldout";
/// Secondary key holding every room type, priced or not
pub const ALL_ROOMS_KEY: &str = "b_all_rooms";

/// Result of pulling an embedded JSON literal out of page markup
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddedJson {
    /// The literal was found and parsed
    Literal(Value),
    /// The key is absent, or no occurrence of it is followed by a bracket
    NotFound,
    /// The literal is truncated or is not valid JSON
    Malformed,
}

impl EmbeddedJson {
    pub fn into_value(self) -> Option<Value> {
        match self {
            EmbeddedJson::Literal(value) => Some(value),
            EmbeddedJson::NotFound | EmbeddedJson::Malformed => None,
        }
    }
}

/// Extract the first JSON array or object literal following `<key>:` in raw
/// markup.
///
/// Listing pages inline their data model inside large scripts where string
/// values contain quotes, brackets and escapes, so the literal cannot be cut
/// out with a non-greedy match. The scanner tracks string state with a
/// one-character escape lookahead and counts brackets only outside strings;
/// the literal ends when the depth returns to zero.
///
/// Key occurrences followed by a scalar or prose instead of a bracket are
/// skipped; the literal comes from the first occurrence a bracket actually
/// follows. A malformed literal there is reported as such, not retried on
/// later occurrences.
pub fn extract_embedded_json(markup: &str, key: &str) -> EmbeddedJson {
    let needle = format!("{key}:");

    let mut search_from = 0;
    let literal = loop {
        let Some(found) = markup[search_from..].find(&needle) else {
            return EmbeddedJson::NotFound;
        };
        let key_end = search_from + found + needle.len();
        search_from = key_end;

        let after_key = &markup[key_end..];
        let Some(bracket_pos) = after_key.find(|c: char| !c.is_whitespace()) else {
            return EmbeddedJson::NotFound;
        };
        let candidate = &after_key[bracket_pos..];
        if matches!(candidate.as_bytes().first(), Some(b'[') | Some(b'{')) {
            break candidate;
        }
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in literal.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            '[' | '{' if !in_string => depth += 1,
            ']' | '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let end = idx + ch.len_utf8();
                    return match serde_json::from_str(&literal[..end]) {
                        Ok(value) => EmbeddedJson::Literal(value),
                        Err(_) => EmbeddedJson::Malformed,
                    };
                }
            }
            _ => {}
        }
    }

    // Ran off the end of the markup with the literal still open
    EmbeddedJson::Malformed
}

/// One room type pulled from the embedded room listing
#[derive(Debug, Clone, PartialEq)]
pub struct RoomListing {
    pub name: String,
    /// Price of the room's first block; None means not bookable
    pub price: Option<f64>,
}

/// Parse the embedded room array into room listings.
///
/// Every array element counts toward the total. A room is available only
/// when its first block carries a parseable price above zero; rooms without
/// one still surface so sold-out inventory stays visible.
pub fn parse_room_listings(rooms: &Value) -> Vec<RoomListing> {
    let Some(items) = rooms.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|room| {
            let name = room
                .get("b_name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Room")
                .to_string();
            let price = room
                .get("b_blocks")
                .and_then(Value::as_array)
                .and_then(|blocks| blocks.first())
                .and_then(|block| block.get("b_raw_price"))
                .and_then(raw_price)
                .filter(|price| *price > 0.0);
            RoomListing { name, price }
        })
        .collect()
}

/// b_raw_price arrives either as a JSON number or a numeric string
fn raw_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pull room names out of the secondary all-rooms object.
///
/// The object maps room ids to room info; only names are trustworthy here,
/// prices and availability are not part of this structure.
pub fn parse_all_room_names(all_rooms: &Value) -> Vec<String> {
    let Some(map) = all_rooms.as_object() else {
        return Vec::new();
    };

    map.values()
        .filter_map(|room| room.get("b_name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Aggregate room counts and price stats for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomInventory {
    pub room_names: Vec<String>,
    pub total_room_types: u32,
    pub available_room_types: u32,
    pub sold_out_room_types: u32,
    pub min_room_price: Option<f64>,
    pub max_room_price: Option<f64>,
    /// Mean of the available room prices, rounded to two decimals
    pub avg_room_price: Option<f64>,
}

impl RoomInventory {
    /// Build inventory from counts and the usable room prices.
    ///
    /// The available count is clamped to the total when the total is known,
    /// so available + sold_out always equals total for total > 0.
    pub fn from_counts(room_names: Vec<String>, total: u32, available: u32, prices: &[f64]) -> Self {
        let available = if total > 0 { available.min(total) } else { available };
        let sold_out = total.saturating_sub(available);

        let min_room_price = prices.iter().copied().reduce(f64::min);
        let max_room_price = prices.iter().copied().reduce(f64::max);
        let avg_room_price = if prices.is_empty() {
            None
        } else {
            Some(round2(prices.iter().sum::<f64>() / prices.len() as f64))
        };

        Self {
            room_names,
            total_room_types: total,
            available_room_types: available,
            sold_out_room_types: sold_out,
            min_room_price,
            max_room_price,
            avg_room_price,
        }
    }

    /// Roll parsed room listings up into inventory stats
    pub fn from_listings(listings: &[RoomListing]) -> Self {
        let names: Vec<String> = listings.iter().map(|listing| listing.name.clone()).collect();
        let prices: Vec<f64> = listings.iter().filter_map(|listing| listing.price).collect();
        let total = listings.len() as u32;
        let available = prices.len() as u32;
        Self::from_counts(names, total, available, &prices)
    }

    /// Inventory known only by name: every room type reads as sold out
    pub fn from_names_only(room_names: Vec<String>) -> Self {
        let total = room_names.len() as u32;
        Self::from_counts(room_names, total, 0, &[])
    }
}
