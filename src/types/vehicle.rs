//! Value holders shared between laps and participants
//!
//! Vehicles and drivers are owned by the reader that built the session and
//! shared through `Arc`. Two handles refer to the same vehicle or driver only
//! when they point at the same allocation. Deserializing gives every value its
//! own allocation; [`Session::intern_vehicles`](super::Session::intern_vehicles)
//! and [`Session::intern_drivers`](super::Session::intern_drivers) merge equal
//! values back into shared handles.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Vehicle driven on a lap or entered by a participant
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Vehicle {
    /// Model name
    pub name: String,
    /// Vehicle class used to split sessions (e.g. "GT3")
    pub class: Option<String>,
    /// Race number
    pub number: Option<String>,
}

impl Vehicle {
    /// Create a vehicle with a name and class
    pub fn new(name: impl Into<String>, class: Option<&str>) -> Self {
        Self { name: name.into(), class: class.map(str::to_string), number: None }
    }
}

/// Driver of a lap
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Driver {
    /// Display name
    pub name: String,
    /// Identifier from the simulator (GUID, Steam id, ...)
    pub driver_id: Option<String>,
    /// Whether the driver is human rather than AI
    pub human: bool,
}

impl Driver {
    /// Create a human driver
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), driver_id: None, human: true }
    }
}

/// Track limits violation recorded on a lap
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Cut {
    /// Duration of the cut in seconds
    pub time: Option<f64>,
    /// Elapsed session time when the cut happened
    pub elapsed_seconds: Option<f64>,
}

/// Push `item` unless the same allocation is already present.
pub(crate) fn push_distinct<T>(items: &mut Vec<Arc<T>>, item: &Arc<T>) {
    if !items.iter().any(|known| Arc::ptr_eq(known, item)) {
        items.push(Arc::clone(item));
    }
}

/// Point `item` at the first equal value in `table`, adding it when unseen.
pub(crate) fn intern<T: PartialEq>(table: &mut Vec<Arc<T>>, item: &mut Arc<T>) {
    match table.iter().position(|known| **known == **item) {
        Some(index) => *item = Arc::clone(&table[index]),
        None => table.push(Arc::clone(item)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_distinct_uses_identity_not_equality() {
        let first = Arc::new(Vehicle::new("Porsche 911 GT3 R", Some("GT3")));
        let twin = Arc::new(Vehicle::new("Porsche 911 GT3 R", Some("GT3")));

        let mut items = Vec::new();
        push_distinct(&mut items, &first);
        push_distinct(&mut items, &first);
        push_distinct(&mut items, &twin);

        assert_eq!(items.len(), 2);
        assert!(Arc::ptr_eq(&items[0], &first));
        assert!(Arc::ptr_eq(&items[1], &twin));
    }

    #[test]
    fn intern_merges_equal_values() {
        let mut table = Vec::new();
        let mut first = Arc::new(Driver::new("Alice Moreau"));
        let mut twin = Arc::new(Driver::new("Alice Moreau"));
        let mut other = Arc::new(Driver::new("Ben Okafor"));

        intern(&mut table, &mut first);
        intern(&mut table, &mut twin);
        intern(&mut table, &mut other);

        assert_eq!(table.len(), 2);
        assert!(Arc::ptr_eq(&first, &twin));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
