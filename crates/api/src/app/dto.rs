use serde::Deserialize;

use pantry_infra::InventorySnapshot;
use pantry_inventory::{InventoryRecord, StockMove, StockOutcome};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ItemNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

// -------------------------
// Response mapping
// -------------------------

/// Display form of a key: first character uppercased, rest untouched.
pub fn display_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn record_to_json(record: &InventoryRecord) -> serde_json::Value {
    serde_json::json!({
        "name": record.key().as_str(),
        "display_name": display_name(record.key().as_str()),
        "quantity": record.quantity().get(),
    })
}

pub fn snapshot_to_json(snapshot: &InventorySnapshot) -> serde_json::Value {
    serde_json::json!({
        "items": snapshot.records.iter().map(record_to_json).collect::<Vec<_>>(),
        "total_units": snapshot.total_units(),
        "fetched_at": snapshot.fetched_at.to_rfc3339(),
    })
}

pub fn outcome_to_json(mv: StockMove, outcome: &StockOutcome) -> serde_json::Value {
    serde_json::json!({
        "move": mv,
        "name": outcome.key.as_str(),
        "before": outcome.before.map(|q| q.get()),
        "after": outcome.after.map(|q| q.get()),
        "deleted": outcome.deleted(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_capitalizes_first_letter() {
        assert_eq!(display_name("apple"), "Apple");
        assert_eq!(display_name("green tea"), "Green tea");
        assert_eq!(display_name("ßeta"), "SSeta");
        assert_eq!(display_name(""), "");
    }
}
