//! Cargo totals carried by the hangar part.
//!
//! Totals move incrementally as entries come and go ([`CargoTotals::apply`])
//! and can be rebuilt from the entries themselves ([`CargoTotals::resync`]).
//! Both paths read the entry's own `mass`/`cost`, which
//! [`PackedEntry::adjust_mass_cost`] keeps in step with its metric, so the
//! two agree after any interleaving of admissions and resource transfers.

use serde::{Deserialize, Serialize};

use crate::entry::PackedEntry;
use crate::metric::Metric;

/// Aggregate footprint of everything a hangar holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CargoTotals {
    /// Part mass without cargo, captured once.
    pub base_mass: f64,
    pub vessels_mass: f64,
    pub vessels_cost: f64,
    pub used_volume: f64,
}

impl CargoTotals {
    pub fn new(base_mass: f64) -> Self {
        Self {
            base_mass,
            ..Self::default()
        }
    }

    /// Add (`k = 1`) or remove (`k = -1`) a footprint. Totals never go
    /// below zero.
    pub fn apply(&mut self, metric: &Metric, k: f64) {
        self.vessels_mass = (self.vessels_mass + metric.mass * k).max(0.0);
        self.vessels_cost = (self.vessels_cost + metric.cost * k).max(0.0);
        self.used_volume = (self.used_volume + metric.volume * k).max(0.0);
    }

    /// Shift mass and cost after a resource transfer.
    pub fn adjust(&mut self, d_mass: f64, d_cost: f64) {
        self.vessels_mass = (self.vessels_mass + d_mass).max(0.0);
        self.vessels_cost = (self.vessels_cost + d_cost).max(0.0);
    }

    /// Rebuild from scratch over every held entry.
    pub fn resync<'a>(&mut self, entries: impl IntoIterator<Item = &'a PackedEntry>) {
        self.vessels_mass = 0.0;
        self.vessels_cost = 0.0;
        self.used_volume = 0.0;
        for e in entries {
            self.vessels_mass += e.mass;
            self.vessels_cost += e.cost;
            self.used_volume += e.metric.volume;
        }
    }

    /// Mass of the hangar part with its cargo.
    pub fn part_mass(&self) -> f64 {
        self.base_mass + self.vessels_mass
    }

    pub fn agrees_with(&self, other: &CargoTotals, tolerance: f64) -> bool {
        (self.vessels_mass - other.vessels_mass).abs() <= tolerance
            && (self.vessels_cost - other.vessels_cost).abs() <= tolerance
            && (self.used_volume - other.used_volume).abs() <= tolerance
    }
}

/// Seats left for crew given the part's leftover volume.
pub fn crew_capacity_for(part_volume: f64, hangar_volume: f64, crew_volume_ratio: f64, volume_per_kerbal: f64) -> u32 {
    if volume_per_kerbal <= 0.0 {
        return 0;
    }
    let seats = (part_volume - hangar_volume) * crew_volume_ratio / volume_per_kerbal;
    if seats.is_finite() && seats > 0.0 {
        seats.floor() as u32
    } else {
        0
    }
}
