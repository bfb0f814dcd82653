//! Packed entries: the cargo records a hangar holds.
//!
//! Both kinds share the footprint fields (metric, mass, cost, crew, tanks,
//! centre offsets) and differ only in what they carry to rebuild a vessel:
//!
//! | Kind | Origin | Payload |
//! |------|--------|---------|
//! | [`EntryKind::Stored`] | live vessel captured on docking | [`VesselSnapshot`] |
//! | [`EntryKind::Construct`] | editor design, not yet launched | [`PackedDesign`] |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::design::{DesignError, ShipDesign};
use crate::math::Vec3;
use crate::metric::Metric;
use crate::node::{Node, NodeError};
use crate::resources::{ResourceInventory, ResourceLibrary, ResourceStore};

/// Identifier of a vessel and of the entry that packs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub Uuid);

impl VesselId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VesselId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VesselId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A crew member riding in a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub profession: String,
}

impl CrewMember {
    pub fn new(name: &str, profession: &str) -> Self {
        Self {
            name: name.to_string(),
            profession: profession.to_string(),
        }
    }
}

/// Frozen state of a live vessel, enough to rebuild it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselSnapshot {
    pub design: ShipDesign,
    /// Simulation time of capture.
    pub captured_at: f64,
}

/// An editor design waiting to be launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedDesign {
    pub design: ShipDesign,
    pub flag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryKind {
    Stored(VesselSnapshot),
    Construct(PackedDesign),
}

/// One packed vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedEntry {
    pub id: VesselId,
    pub name: String,
    pub metric: Metric,
    pub mass: f64,
    pub cost: f64,
    pub crew: Vec<CrewMember>,
    pub resources: ResourceInventory,
    /// Centre of mass in the vessel frame.
    pub center_of_mass: Vec3,
    /// Centre of the vessel bounds in the vessel frame.
    pub center_of_geometry: Vec3,
    pub kind: EntryKind,
}

impl PackedEntry {
    /// Capture a live vessel. `metric` already carries the vessel's mass
    /// and cost; `crew` is whoever was aboard when it docked.
    pub fn stored(
        id: VesselId,
        snapshot: VesselSnapshot,
        metric: Metric,
        crew: Vec<CrewMember>,
        library: &ResourceLibrary,
    ) -> Self {
        let design = &snapshot.design;
        Self {
            id,
            name: design.name.clone(),
            mass: metric.mass,
            cost: metric.cost,
            crew,
            resources: design.resources(),
            center_of_mass: design.center_of_mass(library),
            center_of_geometry: design.center_of_geometry(),
            metric,
            kind: EntryKind::Stored(snapshot),
        }
    }

    /// Pack an editor design under a fresh id.
    pub fn construct(design: ShipDesign, flag: &str, metric: Metric, library: &ResourceLibrary) -> Self {
        let mut metric = metric;
        metric.mass = design.mass(library);
        metric.cost = design.cost(library);
        Self {
            id: VesselId::new(),
            name: design.name.clone(),
            mass: metric.mass,
            cost: metric.cost,
            crew: Vec::new(),
            resources: design.resources(),
            center_of_mass: design.center_of_mass(library),
            center_of_geometry: design.center_of_geometry(),
            metric,
            kind: EntryKind::Construct(PackedDesign {
                design,
                flag: flag.to_string(),
            }),
        }
    }

    pub fn is_construct(&self) -> bool {
        matches!(self.kind, EntryKind::Construct(_))
    }

    pub fn design(&self) -> &ShipDesign {
        match &self.kind {
            EntryKind::Stored(s) => &s.design,
            EntryKind::Construct(c) => &c.design,
        }
    }

    /// Shift mass and cost, keeping the metric in step.
    pub fn adjust_mass_cost(&mut self, d_mass: f64, d_cost: f64) {
        self.mass += d_mass;
        self.cost += d_cost;
        self.metric.mass = self.mass;
        self.metric.cost = self.cost;
    }

    /// Another copy of a construct under a fresh id. Stored vessels are
    /// unique and cannot be copied.
    pub fn duplicate(&self) -> Option<Self> {
        match self.kind {
            EntryKind::Construct(_) => Some(Self {
                id: VesselId::new(),
                ..self.clone()
            }),
            EntryKind::Stored(_) => None,
        }
    }

    /// Design with the current tank levels written back into its parts.
    ///
    /// Reconciled amounts are tracked on the entry as a whole; they are
    /// spread over the design's tanks in part order.
    pub fn design_with_resources(&self) -> ShipDesign {
        let mut design = self.design().clone();
        let mut remaining: Vec<(String, f64)> = self
            .resources
            .iter()
            .map(|(n, r)| (n.clone(), r.amount))
            .collect();
        for part in &mut design.parts {
            for tank in &mut part.resources {
                if let Some((_, left)) = remaining.iter_mut().find(|(n, _)| *n == tank.name) {
                    tank.amount = left.min(tank.capacity);
                    *left -= tank.amount;
                }
            }
        }
        design
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn node_name(&self) -> &'static str {
        use crate::constants::keys;
        match self.kind {
            EntryKind::Stored(_) => keys::STORED_VESSEL_NODE,
            EntryKind::Construct(_) => keys::PACKED_CONSTRUCT_NODE,
        }
    }

    pub fn save(&self, node: &mut Node) {
        node.add_value("id", self.id);
        node.add_value("name", &self.name);
        node.add_value("mass", self.mass);
        node.add_value("cost", self.cost);
        node.add_value("CoM", self.center_of_mass);
        node.add_value("CoG", self.center_of_geometry);
        self.metric.save(node.add_node("METRIC"));
        let crew = node.add_node("CREW");
        for c in &self.crew {
            let k = crew.add_node("KERBAL");
            k.add_value("name", &c.name);
            k.add_value("profession", &c.profession);
        }
        self.resources.save(node.add_node("RESOURCES"));
        match &self.kind {
            EntryKind::Stored(s) => {
                node.add_value("capturedAt", s.captured_at);
                s.design.save(node.add_node("VESSEL"));
            }
            EntryKind::Construct(c) => {
                node.add_value("flag", &c.flag);
                c.design.save(node.add_node("CONSTRUCT"));
            }
        }
    }

    pub fn load(node: &Node) -> Result<Self, DesignError> {
        let kind = if let Some(v) = node.get_node("VESSEL") {
            EntryKind::Stored(VesselSnapshot {
                design: ShipDesign::load(v)?,
                captured_at: node.parse_or("capturedAt", 0.0)?,
            })
        } else {
            EntryKind::Construct(PackedDesign {
                design: ShipDesign::load(node.require_node("CONSTRUCT")?)?,
                flag: node.parse_or("flag", String::new())?,
            })
        };
        let crew = match node.get_node("CREW") {
            Some(c) => c
                .get_nodes("KERBAL")
                .map(|k| -> Result<CrewMember, NodeError> {
                    Ok(CrewMember {
                        name: k.parse("name")?,
                        profession: k.parse_or("profession", String::new())?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let resources = match node.get_node("RESOURCES") {
            Some(r) => ResourceInventory::load(r)?,
            None => ResourceInventory::new(),
        };
        let mut entry = Self {
            id: node.parse("id")?,
            name: node.parse("name")?,
            metric: Metric::load(node.require_node("METRIC")?)?,
            mass: node.parse("mass")?,
            cost: node.parse("cost")?,
            crew,
            resources,
            center_of_mass: node.parse("CoM")?,
            center_of_geometry: node.parse("CoG")?,
            kind,
        };
        entry.adjust_mass_cost(0.0, 0.0);
        Ok(entry)
    }
}

impl ResourceStore for PackedEntry {
    fn resource_names(&self) -> Vec<String> {
        self.resources.resource_names()
    }

    fn amount(&self, name: &str) -> f64 {
        self.resources.amount(name)
    }

    fn capacity(&self, name: &str) -> f64 {
        self.resources.capacity(name)
    }

    fn transfer(&mut self, name: &str, delta: f64) -> f64 {
        self.resources.transfer(name, delta)
    }
}
