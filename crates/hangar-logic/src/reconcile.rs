//! Pooled resource transfer between a container and one of its members.
//!
//! For each resource both sides can hold, the reconciler snapshots the
//! member's amount (`offset`) and the container's amount, forming a pool.
//! The member's target amount may then be adjusted anywhere within
//! `[min_amount, max_amount]`, the range in which both sides stay within
//! capacity, and [`ResourceReconciler::apply`] moves the difference.

use serde::{Deserialize, Serialize};

use crate::resources::{ResourceLibrary, ResourceStore, AMOUNT_EPSILON};

/// Negotiation state for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceManifest {
    pub name: String,
    /// Requested member amount.
    pub amount: f64,
    /// Member capacity.
    pub capacity: f64,
    /// Member amount when negotiation started.
    pub offset: f64,
    pub host_amount: f64,
    pub host_capacity: f64,
    pub pool: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl ResourceManifest {
    pub fn new(name: &str, amount: f64, capacity: f64, host_amount: f64, host_capacity: f64) -> Self {
        let mut m = Self {
            name: name.to_string(),
            amount,
            capacity,
            offset: amount,
            host_amount,
            host_capacity,
            pool: 0.0,
            min_amount: 0.0,
            max_amount: 0.0,
        };
        m.recompute_bounds();
        m
    }

    /// Re-read the container side, keeping the member snapshot.
    pub fn refresh(&mut self, host_amount: f64) {
        self.host_amount = host_amount;
        self.recompute_bounds();
        self.amount = self.amount.clamp(self.min_amount, self.max_amount);
    }

    /// `min_amount <= max_amount` always holds; with both sides full the
    /// rounded pool can otherwise put the lower bound above the upper.
    fn recompute_bounds(&mut self) {
        self.pool = self.host_amount + self.offset;
        self.max_amount = self.pool.min(self.capacity).max(0.0);
        self.min_amount = (self.pool - self.host_capacity).max(0.0).min(self.max_amount);
    }

    /// Request a member amount; the stored value is clamped to the bounds.
    pub fn set_amount(&mut self, amount: f64) -> f64 {
        self.amount = amount.clamp(self.min_amount, self.max_amount);
        self.amount
    }

    /// Requested change to the member (positive: member receives).
    pub fn delta(&self) -> f64 {
        self.amount - self.offset
    }
}

/// What an [`ResourceReconciler::apply`] pass actually moved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferSummary {
    /// (resource, amount received by the member; negative when returned).
    pub moved: Vec<(String, f64)>,
    /// Change in the member's mass.
    pub mass_delta: f64,
    /// Change in the member's cost.
    pub cost_delta: f64,
}

/// Pending transfer manifests for one member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceReconciler {
    manifests: Vec<ResourceManifest>,
}

impl ResourceReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        !self.manifests.is_empty()
    }

    pub fn manifests(&self) -> &[ResourceManifest] {
        &self.manifests
    }

    pub fn clear(&mut self) {
        self.manifests.clear();
    }

    /// Build one manifest per member resource the host can also hold.
    /// A no-op while manifests are still pending.
    pub fn prepare<H, M>(&mut self, host: &H, member: &M)
    where
        H: ResourceStore + ?Sized,
        M: ResourceStore + ?Sized,
    {
        if self.is_pending() {
            return;
        }
        for name in member.resource_names() {
            let host_capacity = host.capacity(&name);
            if host_capacity <= 0.0 {
                continue;
            }
            self.manifests.push(ResourceManifest::new(
                &name,
                member.amount(&name),
                member.capacity(&name),
                host.amount(&name),
                host_capacity,
            ));
        }
    }

    /// Re-read container amounts for every pending manifest.
    pub fn refresh<H: ResourceStore + ?Sized>(&mut self, host: &H) {
        for m in &mut self.manifests {
            m.refresh(host.amount(&m.name));
        }
    }

    /// Request a member amount for `name`; returns the clamped value.
    pub fn set_amount(&mut self, name: &str, amount: f64) -> Option<f64> {
        self.manifests
            .iter_mut()
            .find(|m| m.name == name)
            .map(|m| m.set_amount(amount))
    }

    /// Fill the member to the top of its range for every resource.
    pub fn fill_member(&mut self) {
        for m in &mut self.manifests {
            let max = m.max_amount;
            m.set_amount(max);
        }
    }

    /// Move every pending delta, then clear the manifests.
    ///
    /// The container's pool is moved first; the member then receives what
    /// the container actually gave, and anything the member cannot take is
    /// handed back, so the realised transfer never exceeds the request and
    /// the per-resource total is conserved.
    pub fn apply<H, M>(&mut self, host: &mut H, member: &mut M, library: &ResourceLibrary) -> TransferSummary
    where
        H: ResourceStore + ?Sized,
        M: ResourceStore + ?Sized,
    {
        let mut summary = TransferSummary::default();
        for m in self.manifests.drain(..) {
            let requested = m.delta();
            if requested.abs() < AMOUNT_EPSILON {
                continue;
            }
            let host_moved = host.transfer(&m.name, -requested);
            let wanted = -host_moved;
            let member_moved = member.transfer(&m.name, wanted);
            let leftover = wanted - member_moved;
            if leftover.abs() >= AMOUNT_EPSILON {
                host.transfer(&m.name, leftover);
            }
            let density = library.density(&m.name);
            if density > 0.0 {
                summary.mass_delta += member_moved * density;
            }
            summary.cost_delta += member_moved * library.unit_cost(&m.name);
            log::debug!("reconciled {}: member {:+.3}", m.name, member_moved);
            summary.moved.push((m.name, member_moved));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceInventory;

    fn inv(entries: &[(&str, f64, f64)]) -> ResourceInventory {
        let mut i = ResourceInventory::new();
        for (n, a, c) in entries {
            i.add(n, *a, *c);
        }
        i
    }

    #[test]
    fn test_manifest_bounds() {
        // member 20/50, host 70/80: pool 90, member needs >=10, can take <=50
        let m = ResourceManifest::new("LiquidFuel", 20.0, 50.0, 70.0, 80.0);
        assert_eq!(m.pool, 90.0);
        assert_eq!(m.min_amount, 10.0);
        assert_eq!(m.max_amount, 50.0);
    }

    #[test]
    fn test_skips_resources_host_cannot_hold() {
        let host = inv(&[("LiquidFuel", 10.0, 100.0)]);
        let member = inv(&[("LiquidFuel", 5.0, 10.0), ("XenonGas", 3.0, 10.0)]);
        let mut r = ResourceReconciler::new();
        r.prepare(&host, &member);
        assert_eq!(r.manifests().len(), 1);
        assert_eq!(r.manifests()[0].name, "LiquidFuel");
    }

    #[test]
    fn test_prepare_is_noop_while_pending() {
        let host = inv(&[("LiquidFuel", 10.0, 100.0)]);
        let member = inv(&[("LiquidFuel", 5.0, 10.0)]);
        let mut r = ResourceReconciler::new();
        r.prepare(&host, &member);
        r.set_amount("LiquidFuel", 10.0);
        r.prepare(&host, &member);
        assert_eq!(r.manifests()[0].amount, 10.0);
    }

    #[test]
    fn test_apply_fills_member_and_conserves() {
        let lib = ResourceLibrary::standard();
        let mut host = inv(&[("LiquidFuel", 100.0, 200.0), ("ElectricCharge", 50.0, 100.0)]);
        let mut member = inv(&[("LiquidFuel", 10.0, 60.0), ("ElectricCharge", 0.0, 40.0)]);
        let mut r = ResourceReconciler::new();
        r.prepare(&host, &member);
        r.fill_member();
        let s = r.apply(&mut host, &mut member, &lib);

        assert_eq!(member.amount("LiquidFuel"), 60.0);
        assert_eq!(host.amount("LiquidFuel"), 50.0);
        assert_eq!(member.amount("ElectricCharge"), 40.0);
        assert_eq!(host.amount("ElectricCharge"), 10.0);
        // only the fuel weighs anything
        assert!((s.mass_delta - 50.0 * 0.005).abs() < 1e-12);
        assert!(!r.is_pending());
    }

    #[test]
    fn test_request_clamped_to_range() {
        let mut r = ResourceReconciler::new();
        let host = inv(&[("Oxidizer", 5.0, 10.0)]);
        let member = inv(&[("Oxidizer", 20.0, 30.0)]);
        r.prepare(&host, &member);
        // pool 25, host holds at most 10 → member keeps at least 15
        assert_eq!(r.set_amount("Oxidizer", 0.0), Some(15.0));
        assert_eq!(r.set_amount("Oxidizer", 99.0), Some(25.0));
        assert_eq!(r.set_amount("Missing", 1.0), None);
    }

    #[test]
    fn test_refresh_tracks_host_changes() {
        let mut r = ResourceReconciler::new();
        let mut host = inv(&[("LiquidFuel", 40.0, 100.0)]);
        let member = inv(&[("LiquidFuel", 0.0, 100.0)]);
        r.prepare(&host, &member);
        r.fill_member();
        assert_eq!(r.manifests()[0].amount, 40.0);
        host.transfer("LiquidFuel", -30.0);
        r.refresh(&host);
        assert_eq!(r.manifests()[0].max_amount, 10.0);
        assert_eq!(r.manifests()[0].amount, 10.0);
    }

    #[test]
    fn test_refresh_with_both_sides_full() {
        // 0.1 + 0.2 rounds above 0.3, so the raw lower bound exceeds the upper
        let mut r = ResourceReconciler::new();
        let host = inv(&[("LiquidFuel", 0.1, 0.1)]);
        let member = inv(&[("LiquidFuel", 0.2, 0.2)]);
        r.prepare(&host, &member);
        r.refresh(&host);
        let m = &r.manifests()[0];
        assert!(m.min_amount <= m.max_amount);
        assert_eq!(m.amount, 0.2);
        assert_eq!(r.set_amount("LiquidFuel", 0.0), Some(0.2));
    }
}
