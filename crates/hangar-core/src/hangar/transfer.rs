//! Resource negotiation between the host vessel and a stored vessel.

use hangar_logic::entry::{PackedEntry, VesselId};
use hangar_logic::reconcile::{ResourceManifest, TransferSummary};

use super::Hangar;
use crate::world::FlightWorld;

impl Hangar {
    /// Open manifests for stored vessel `id`. Manifests already pending for
    /// the same vessel are kept as they are; ones for another vessel are
    /// dropped. Returns whether anything can be transferred.
    pub fn prepare_resource_list(&mut self, world: &FlightWorld, id: VesselId) -> bool {
        if self.config.no_transfers {
            return false;
        }
        if self.reconciling != Some(id) {
            self.reconciler.clear();
        }
        let (Some(stored), Some(host)) = (self.stored.get(&id), world.structure(self.vessel)) else {
            return false;
        };
        self.reconciler.prepare(&host, &stored.0);
        self.reconciling = Some(id);
        self.reconciler.is_pending()
    }

    /// Re-read the host's amounts and recompute every manifest's range.
    pub fn update_resource_list(&mut self, world: &FlightWorld) {
        if let Some(host) = world.structure(self.vessel) {
            self.reconciler.refresh(&host);
        }
    }

    pub fn resource_manifests(&self) -> &[ResourceManifest] {
        self.reconciler.manifests()
    }

    /// Ask for `amount` of `name` aboard the stored vessel; returns the
    /// clamped request.
    pub fn set_resource_amount(&mut self, name: &str, amount: f64) -> Option<f64> {
        self.reconciler.set_amount(name, amount)
    }

    pub fn fill_resources(&mut self) {
        self.reconciler.fill_member();
    }

    /// Apply the pending manifests to the stored vessel they were opened for.
    pub fn transfer_resources(&mut self, world: &mut FlightWorld) -> Option<TransferSummary> {
        let id = self.reconciling?;
        let (host, library) = world.structure_and_library(self.vessel)?;
        let stored = self.stored.get_mut(&id)?;
        self.reconciler.refresh(&*host);
        let summary = self.reconciler.apply(host, &mut stored.0, library);
        stored.adjust_mass_cost(summary.mass_delta, summary.cost_delta);
        self.reconciling = None;
        self.settled(world, &summary);
        Some(summary)
    }

    /// Settle pending manifests for an entry that is leaving the hangar.
    pub(super) fn settle_resources(&mut self, world: &mut FlightWorld, entry: &mut PackedEntry) {
        if self.reconciling != Some(entry.id) {
            return;
        }
        self.reconciling = None;
        let Some((host, library)) = world.structure_and_library(self.vessel) else {
            self.reconciler.clear();
            return;
        };
        self.reconciler.refresh(&*host);
        let summary = self.reconciler.apply(host, entry, library);
        entry.adjust_mass_cost(summary.mass_delta, summary.cost_delta);
        self.settled(world, &summary);
    }

    fn settled(&mut self, world: &mut FlightWorld, summary: &TransferSummary) {
        self.totals.adjust(summary.mass_delta, summary.cost_delta);
        self.sync_part(world, None);
        for (name, moved) in &summary.moved {
            log::info!("hangar \"{}\": {:+.3} {} to stored vessel", self.name, moved, name);
        }
    }
}
