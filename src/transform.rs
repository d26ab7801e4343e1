//! Shaping of raw journal documents into export rows.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::constants::{COORDINATE_DECIMALS, US_COUNTRY_ALIASES, US_STATE_CODES};
use crate::model::{JournalRow, RawJournal};

static US_STATES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| US_STATE_CODES.iter().copied().collect());

/// Country for a location.
///
/// An explicit country wins (US spellings normalized to `USA`). Otherwise a US
/// state code, or any alphabetic token of the address that is one, means `USA`.
pub fn decide_country(address: &str, state: &str, location_country: &str) -> String {
    let country = location_country.trim();
    if !country.is_empty() {
        let upper = country.to_uppercase();
        if US_COUNTRY_ALIASES.contains(&upper.as_str()) {
            return "USA".to_string();
        }
        return country.to_string();
    }

    if US_STATES.contains(state.trim().to_uppercase().as_str()) {
        return "USA".to_string();
    }

    let upper = address.to_uppercase();
    let mentions_state = upper
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|t| !t.is_empty())
        .any(|t| US_STATES.contains(t));
    if mentions_state {
        return "USA".to_string();
    }

    String::new()
}

/// Collapse whitespace runs of two or more into one space, then strip
/// surrounding spaces and commas.
pub fn clean_place(place: &str) -> String {
    let mut out = String::with_capacity(place.len());
    let mut chars = place.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.trim_matches(|c| c == ' ' || c == ',').to_string()
}

pub fn round_coordinate(value: Option<f64>) -> Option<f64> {
    let factor = 10f64.powi(COORDINATE_DECIMALS);
    value
        .filter(|v| v.is_finite())
        .map(|v| (v * factor).round() / factor)
}

pub fn clean_row(raw: RawJournal) -> JournalRow {
    let address_for_check = if raw.address.is_empty() {
        raw.place.as_str()
    } else {
        raw.address.as_str()
    };
    let country = decide_country(address_for_check, &raw.state, &raw.location_country);

    JournalRow {
        country,
        n_place: clean_place(&raw.place),
        n_lati: round_coordinate(raw.latitude),
        n_long: round_coordinate(raw.longitude),
        journal_id: raw.journal_id,
        user_name: raw.user_name,
        user_email: raw.user_email,
        timestamp: raw.timestamp,
        end_date_time: raw.end_date_time,
        n_name: raw.location_name,
        city: raw.city,
        state: raw.state,
        zip: raw.zip,
        n_park_nbr: raw.park_number,
    }
}

pub fn clean(raw: Vec<RawJournal>) -> Vec<JournalRow> {
    dedupe_keep_last(raw.into_iter().map(clean_row).collect())
}

/// Drop earlier duplicates of a journal id; survivors keep their positions.
pub fn dedupe_keep_last(rows: Vec<JournalRow>) -> Vec<JournalRow> {
    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        last_index.insert(row.journal_id.as_str(), i);
    }
    let keep: HashSet<usize> = last_index.into_values().collect();

    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, row)| row)
        .collect()
}

/// Existing artifact rows followed by fresh rows; fresh values win on conflict.
pub fn merge(existing: Vec<JournalRow>, fresh: Vec<JournalRow>) -> Vec<JournalRow> {
    let mut combined = existing;
    combined.extend(fresh);
    dedupe_keep_last(combined)
}
