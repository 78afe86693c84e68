//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::Property;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Thousands-separated price with its currency code.
pub fn format_price(price: f64, currency: &str) -> String {
    let whole = format!("{:.0}", price.trunc());
    let (sign, digits) = whole.strip_prefix('-').map_or(("", whole.as_str()), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}{grouped} {currency}")
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

/// Table of properties for list output
pub fn property_table(properties: &[Property]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Name", "Category", "Status", "Price", "Location"]));

    for property in properties {
        table.add_row(vec![
            Cell::new(truncate(&property.id, 12)),
            Cell::new(truncate(&property.name, 32)),
            Cell::new(property.category.as_str()),
            Cell::new(property.status.as_str()),
            Cell::new(format_price(property.price, &property.currency))
                .set_alignment(CellAlignment::Right),
            Cell::new(truncate(&property.location.to_string(), 40)),
        ]);
    }

    table.to_string()
}

/// Two-column key/value table for detail output
pub fn detail_table(rows: &[(&str, String)]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).add_attribute(Attribute::Bold), Cell::new(value)]);
    }

    table.to_string()
}
