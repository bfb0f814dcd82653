//! Part structure of a vessel: geometry, seats, tanks and docking ports.

use hangar_logic::design::{PartSpec, ShipDesign, TankSpec};
use hangar_logic::entry::{CrewMember, VesselId};
use hangar_logic::math::{Quat, Transform, Vec3};
use hangar_logic::resources::{ResourceInventory, ResourceLibrary, ResourceStore};
use serde::{Deserialize, Serialize};

/// One part of a live vessel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    /// Dry mass in tons, cargo included for hangar parts.
    pub mass: f64,
    pub cost: f64,
    /// Part origin in the vessel frame.
    pub position: Vec3,
    pub rotation: Quat,
    pub size: Vec3,
    pub crew_capacity: u32,
    pub crew: Vec<CrewMember>,
    pub resources: ResourceInventory,
    pub command: bool,
    pub launch_clamp: bool,
    pub docking_port: bool,
    /// Vessel currently attached to this part's docking port.
    pub docked: Option<VesselId>,
}

impl Part {
    pub fn from_spec(spec: &PartSpec) -> Self {
        Self {
            name: spec.name.clone(),
            mass: spec.mass,
            cost: spec.cost,
            position: spec.position,
            rotation: spec.rotation,
            size: spec.size,
            crew_capacity: spec.crew_capacity,
            crew: Vec::new(),
            resources: spec.inventory(),
            command: spec.command,
            launch_clamp: spec.launch_clamp,
            docking_port: spec.docking_port,
            docked: None,
        }
    }

    pub fn to_spec(&self) -> PartSpec {
        let mut spec = PartSpec::new(&self.name, self.mass, self.cost, self.position, self.size);
        spec.rotation = self.rotation;
        spec.crew_capacity = self.crew_capacity;
        spec.command = self.command;
        spec.launch_clamp = self.launch_clamp;
        spec.docking_port = self.docking_port;
        spec.resources = self
            .resources
            .iter()
            .map(|(name, r)| TankSpec {
                name: name.clone(),
                amount: r.amount,
                capacity: r.capacity,
            })
            .collect();
        spec
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    pub fn free_seats(&self) -> u32 {
        self.crew_capacity.saturating_sub(self.crew.len() as u32)
    }

    pub fn volume(&self) -> f64 {
        self.size.abs().product()
    }
}

/// Ordered parts of a vessel; index 0 is the root part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Structure {
    pub parts: Vec<Part>,
}

impl Structure {
    pub fn from_design(design: &ShipDesign) -> Self {
        Self {
            parts: design.parts.iter().map(Part::from_spec).collect(),
        }
    }

    /// Design of the vessel as it is now, tank levels included.
    pub fn to_design(&self, name: &str) -> ShipDesign {
        ShipDesign::new(name, self.parts.iter().map(Part::to_spec).collect())
    }

    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut Part> {
        self.parts.get_mut(index)
    }

    pub fn mass(&self, library: &ResourceLibrary) -> f64 {
        self.parts
            .iter()
            .map(|p| p.mass + p.resources.mass(library))
            .sum()
    }

    pub fn cost(&self, library: &ResourceLibrary) -> f64 {
        self.parts
            .iter()
            .map(|p| p.cost + p.resources.cost(library))
            .sum()
    }

    pub fn is_controllable(&self) -> bool {
        self.parts.iter().any(|p| p.command)
    }

    /// First vessel attached to any docking port.
    pub fn docked_vessel(&self) -> Option<VesselId> {
        self.parts.iter().find_map(|p| p.docked)
    }

    // ── Crew ────────────────────────────────────────────────────────────

    pub fn crew(&self) -> Vec<CrewMember> {
        self.parts.iter().flat_map(|p| p.crew.iter().cloned()).collect()
    }

    pub fn crew_count(&self) -> u32 {
        self.parts.iter().map(|p| p.crew.len() as u32).sum()
    }

    pub fn crew_capacity(&self) -> u32 {
        self.parts.iter().map(|p| p.crew_capacity).sum()
    }

    pub fn free_seats(&self) -> u32 {
        self.crew_capacity().saturating_sub(self.crew_count())
    }

    /// Seat as many of `crew` as fit in one part; the rest stay in `crew`.
    pub fn add_crew_to_part(&mut self, index: usize, crew: &mut Vec<CrewMember>) {
        let Some(part) = self.parts.get_mut(index) else {
            return;
        };
        let n = (part.free_seats() as usize).min(crew.len());
        part.crew.extend(crew.drain(..n));
    }

    /// Seat crew in part order; whoever does not fit stays in `crew`.
    pub fn add_crew(&mut self, crew: &mut Vec<CrewMember>) {
        for i in 0..self.parts.len() {
            if crew.is_empty() {
                break;
            }
            self.add_crew_to_part(i, crew);
        }
    }

    /// Unseat the named crew members wherever they sit.
    pub fn remove_crew(&mut self, crew: &[CrewMember]) -> Vec<CrewMember> {
        let mut removed = Vec::new();
        for part in &mut self.parts {
            part.crew.retain(|c| {
                if crew.contains(c) {
                    removed.push(c.clone());
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    pub fn take_all_crew(&mut self) -> Vec<CrewMember> {
        self.parts
            .iter_mut()
            .flat_map(|p| std::mem::take(&mut p.crew))
            .collect()
    }
}

/// Tanks of all parts act as one store; transfers fill or drain them in
/// part order.
impl ResourceStore for Structure {
    fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .parts
            .iter()
            .flat_map(|p| p.resources.resource_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn amount(&self, name: &str) -> f64 {
        self.parts.iter().map(|p| p.resources.amount(name)).sum()
    }

    fn capacity(&self, name: &str) -> f64 {
        self.parts.iter().map(|p| p.resources.capacity(name)).sum()
    }

    fn transfer(&mut self, name: &str, delta: f64) -> f64 {
        let mut left = delta;
        for part in &mut self.parts {
            if left == 0.0 {
                break;
            }
            left -= part.resources.transfer(name, left);
        }
        delta - left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure() -> Structure {
        let design = ShipDesign::new(
            "Tug",
            vec![
                PartSpec::new("pod", 1.0, 100.0, Vec3::ZERO, Vec3::ONE)
                    .with_command()
                    .with_crew(1),
                PartSpec::new("cabin", 2.0, 50.0, Vec3::new(0.0, -1.0, 0.0), Vec3::ONE)
                    .with_crew(2)
                    .with_tank("LiquidFuel", 10.0, 20.0),
                PartSpec::new("tank", 0.5, 20.0, Vec3::new(0.0, -2.0, 0.0), Vec3::ONE)
                    .with_tank("LiquidFuel", 5.0, 20.0),
            ],
        );
        Structure::from_design(&design)
    }

    #[test]
    fn test_crew_fills_parts_in_order() {
        let mut s = structure();
        let mut crew = vec![
            CrewMember::new("Jeb", "Pilot"),
            CrewMember::new("Bill", "Engineer"),
            CrewMember::new("Bob", "Scientist"),
            CrewMember::new("Val", "Pilot"),
        ];
        s.add_crew(&mut crew);
        assert_eq!(s.crew_count(), 3);
        assert_eq!(crew.len(), 1);
        assert_eq!(s.parts[0].crew[0].name, "Jeb");
        assert_eq!(s.free_seats(), 0);

        let removed = s.remove_crew(&[CrewMember::new("Bill", "Engineer")]);
        assert_eq!(removed.len(), 1);
        assert_eq!(s.crew_count(), 2);
    }

    #[test]
    fn test_transfer_spans_parts() {
        let mut s = structure();
        assert_eq!(s.amount("LiquidFuel"), 15.0);
        assert_eq!(s.capacity("LiquidFuel"), 40.0);

        let moved = s.transfer("LiquidFuel", 20.0);
        assert_eq!(moved, 20.0);
        assert_eq!(s.parts[1].resources.amount("LiquidFuel"), 20.0);
        assert_eq!(s.parts[2].resources.amount("LiquidFuel"), 15.0);

        let drained = s.transfer("LiquidFuel", -100.0);
        assert_eq!(drained, -35.0);
        assert_eq!(s.amount("LiquidFuel"), 0.0);
    }

    #[test]
    fn test_design_roundtrip_keeps_levels() {
        let mut s = structure();
        s.transfer("LiquidFuel", -5.0);
        let design = s.to_design("Tug");
        assert_eq!(design.resources().amount("LiquidFuel"), 10.0);
        assert!(design.is_controllable());
        assert_eq!(design.crew_capacity(), 3);
    }
}
