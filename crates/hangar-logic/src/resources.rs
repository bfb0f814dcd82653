//! Fungible resources: definitions (density, unit cost), per-object
//! inventories, and the [`ResourceStore`] seam the reconciler works over.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::node::{Node, NodeError};

/// Amounts closer than this are treated as equal.
pub const AMOUNT_EPSILON: f64 = 1e-9;

/// Physical properties of a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    /// Mass per unit in tons. Zero for intangible resources.
    pub density: f64,
    /// Cost per unit.
    pub unit_cost: f64,
}

/// Registry of known resource definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLibrary {
    defs: HashMap<String, ResourceDefinition>,
}

impl ResourceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock resource set.
    pub fn standard() -> Self {
        let mut lib = Self::new();
        lib.insert("ElectricCharge", 0.0, 0.0);
        lib.insert("LiquidFuel", 0.005, 0.8);
        lib.insert("Oxidizer", 0.005, 0.18);
        lib.insert("MonoPropellant", 0.004, 1.2);
        lib.insert("XenonGas", 0.0001, 4.0);
        lib
    }

    pub fn insert(&mut self, name: &str, density: f64, unit_cost: f64) {
        self.defs.insert(
            name.to_string(),
            ResourceDefinition {
                name: name.to_string(),
                density,
                unit_cost,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDefinition> {
        self.defs.get(name)
    }

    /// Density of `name`; unknown resources weigh nothing.
    pub fn density(&self, name: &str) -> f64 {
        self.get(name).map(|d| d.density).unwrap_or(0.0)
    }

    pub fn unit_cost(&self, name: &str) -> f64 {
        self.get(name).map(|d| d.unit_cost).unwrap_or(0.0)
    }
}

/// Amount held against a capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAmount {
    pub amount: f64,
    pub capacity: f64,
}

impl ResourceAmount {
    pub fn new(amount: f64, capacity: f64) -> Self {
        Self {
            amount: amount.clamp(0.0, capacity.max(0.0)),
            capacity: capacity.max(0.0),
        }
    }

    pub fn free(&self) -> f64 {
        self.capacity - self.amount
    }
}

/// Anything that holds resources and can move them in or out.
pub trait ResourceStore {
    fn resource_names(&self) -> Vec<String>;
    fn amount(&self, name: &str) -> f64;
    fn capacity(&self, name: &str) -> f64;
    /// Add `delta` (negative to drain), clamped to `[0, capacity]`.
    /// Returns the amount actually moved, signed like `delta`.
    fn transfer(&mut self, name: &str, delta: f64) -> f64;
}

/// Resource tanks of one object, keyed by resource name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInventory {
    entries: BTreeMap<String, ResourceAmount>,
}

impl ResourceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tank; tanks of the same resource merge.
    pub fn add(&mut self, name: &str, amount: f64, capacity: f64) {
        let e = self.entries.entry(name.to_string()).or_default();
        *e = ResourceAmount::new(e.amount + amount, e.capacity + capacity);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceAmount> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceAmount)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum another inventory into this one.
    pub fn merge(&mut self, other: &ResourceInventory) {
        for (name, r) in &other.entries {
            self.add(name, r.amount, r.capacity);
        }
    }

    pub fn mass(&self, library: &ResourceLibrary) -> f64 {
        self.entries
            .iter()
            .map(|(n, r)| r.amount * library.density(n))
            .sum()
    }

    pub fn cost(&self, library: &ResourceLibrary) -> f64 {
        self.entries
            .iter()
            .map(|(n, r)| r.amount * library.unit_cost(n))
            .sum()
    }

    pub fn save(&self, node: &mut Node) {
        for (name, r) in &self.entries {
            let n = node.add_node("RESOURCE");
            n.add_value("name", name);
            n.add_value("amount", r.amount);
            n.add_value("maxAmount", r.capacity);
        }
    }

    pub fn load(node: &Node) -> Result<Self, NodeError> {
        let mut inv = Self::new();
        for n in node.get_nodes("RESOURCE") {
            let name: String = n.parse("name")?;
            inv.add(&name, n.parse("amount")?, n.parse("maxAmount")?);
        }
        Ok(inv)
    }
}

impl ResourceStore for ResourceInventory {
    fn resource_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn amount(&self, name: &str) -> f64 {
        self.entries.get(name).map(|r| r.amount).unwrap_or(0.0)
    }

    fn capacity(&self, name: &str) -> f64 {
        self.entries.get(name).map(|r| r.capacity).unwrap_or(0.0)
    }

    fn transfer(&mut self, name: &str, delta: f64) -> f64 {
        let Some(r) = self.entries.get_mut(name) else {
            return 0.0;
        };
        let moved = if delta >= 0.0 {
            delta.min(r.free())
        } else {
            delta.max(-r.amount)
        };
        r.amount += moved;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_clamps_both_ways() {
        let mut inv = ResourceInventory::new();
        inv.add("LiquidFuel", 30.0, 50.0);
        assert_eq!(inv.transfer("LiquidFuel", 40.0), 20.0);
        assert_eq!(inv.amount("LiquidFuel"), 50.0);
        assert_eq!(inv.transfer("LiquidFuel", -80.0), -50.0);
        assert_eq!(inv.amount("LiquidFuel"), 0.0);
        assert_eq!(inv.transfer("Oxidizer", 5.0), 0.0);
    }

    #[test]
    fn test_tanks_merge() {
        let mut inv = ResourceInventory::new();
        inv.add("Oxidizer", 10.0, 20.0);
        inv.add("Oxidizer", 5.0, 20.0);
        assert_eq!(inv.amount("Oxidizer"), 15.0);
        assert_eq!(inv.capacity("Oxidizer"), 40.0);
    }

    #[test]
    fn test_mass_ignores_massless() {
        let lib = ResourceLibrary::standard();
        let mut inv = ResourceInventory::new();
        inv.add("ElectricCharge", 1000.0, 1000.0);
        inv.add("LiquidFuel", 100.0, 100.0);
        assert!((inv.mass(&lib) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_save_load() {
        let mut inv = ResourceInventory::new();
        inv.add("MonoPropellant", 12.5, 30.0);
        let mut node = Node::new("RESOURCES");
        inv.save(&mut node);
        assert_eq!(ResourceInventory::load(&node).unwrap(), inv);
    }
}
