//! Ship designs: the part list an editor saves and a hangar can pack.
//!
//! A design describes each part's box, pose, mass, cost, crew seats and
//! tanks in the design's own frame. Designs come from JSON descriptors or
//! from the persistence tree of a packed construct.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Bounds, Quat, Transform, Vec3};
use crate::node::{Node, NodeError};
use crate::resources::{ResourceInventory, ResourceLibrary};

/// Why a design cannot be instantiated.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("design \"{0}\" has no parts")]
    Empty(String),

    #[error("part \"{part}\" is invalid: {reason}")]
    InvalidPart { part: String, reason: String },

    #[error("cannot parse design: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read design: {0}")]
    Node(#[from] NodeError),
}

/// One resource tank of a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSpec {
    pub name: String,
    pub amount: f64,
    pub capacity: f64,
}

fn default_true() -> bool {
    true
}

/// One part of a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub name: String,
    /// Dry mass in tons.
    pub mass: f64,
    /// Dry cost.
    pub cost: f64,
    /// Part origin in the design frame.
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    /// Box extents around the part origin.
    pub size: Vec3,
    #[serde(default)]
    pub crew_capacity: u32,
    #[serde(default)]
    pub resources: Vec<TankSpec>,
    #[serde(default)]
    pub launch_clamp: bool,
    /// False for experimental parts not yet unlocked.
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub docking_port: bool,
    /// Command pod or remote guidance unit.
    #[serde(default)]
    pub command: bool,
}

impl PartSpec {
    pub fn new(name: &str, mass: f64, cost: f64, position: Vec3, size: Vec3) -> Self {
        Self {
            name: name.to_string(),
            mass,
            cost,
            position,
            rotation: Quat::IDENTITY,
            size,
            crew_capacity: 0,
            resources: Vec::new(),
            launch_clamp: false,
            available: true,
            docking_port: false,
            command: false,
        }
    }

    pub fn with_command(mut self) -> Self {
        self.command = true;
        self
    }

    pub fn with_crew(mut self, seats: u32) -> Self {
        self.crew_capacity = seats;
        self
    }

    pub fn with_tank(mut self, name: &str, amount: f64, capacity: f64) -> Self {
        self.resources.push(TankSpec {
            name: name.to_string(),
            amount,
            capacity,
        });
        self
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    /// Corners of the part box in the design frame.
    pub fn corners(&self) -> [Vec3; 8] {
        let t = self.transform();
        Bounds::from_center_size(Vec3::ZERO, self.size)
            .corners()
            .map(|c| t.transform_point(c))
    }

    pub fn inventory(&self) -> ResourceInventory {
        let mut inv = ResourceInventory::new();
        for tank in &self.resources {
            inv.add(&tank.name, tank.amount, tank.capacity);
        }
        inv
    }

    fn check(&self) -> Result<(), DesignError> {
        let invalid = |reason: &str| DesignError::InvalidPart {
            part: self.name.clone(),
            reason: reason.to_string(),
        };
        if !self.size.is_finite() || self.size.x <= 0.0 || self.size.y <= 0.0 || self.size.z <= 0.0 {
            return Err(invalid("size must be finite and positive"));
        }
        if !self.position.is_finite() {
            return Err(invalid("position must be finite"));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(invalid("mass must be positive"));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(invalid("cost must not be negative"));
        }
        if self.rotation.norm() < 1e-9 {
            return Err(invalid("rotation is degenerate"));
        }
        Ok(())
    }

    pub fn save(&self, node: &mut Node) {
        node.add_value("name", &self.name);
        node.add_value("mass", self.mass);
        node.add_value("cost", self.cost);
        node.add_value("position", self.position);
        let r = self.rotation;
        node.add_value("rotation", format!("{},{},{},{}", r.w, r.x, r.y, r.z));
        node.add_value("size", self.size);
        node.add_value("crewCapacity", self.crew_capacity);
        node.add_value("launchClamp", self.launch_clamp);
        node.add_value("available", self.available);
        node.add_value("dockingPort", self.docking_port);
        node.add_value("command", self.command);
        self.inventory().save(node);
    }

    pub fn load(node: &Node) -> Result<Self, NodeError> {
        let resources = ResourceInventory::load(node)?
            .iter()
            .map(|(name, r)| TankSpec {
                name: name.clone(),
                amount: r.amount,
                capacity: r.capacity,
            })
            .collect();
        Ok(Self {
            name: node.parse("name")?,
            mass: node.parse("mass")?,
            cost: node.parse("cost")?,
            position: node.parse("position")?,
            rotation: parse_quat(node, "rotation")?,
            size: node.parse("size")?,
            crew_capacity: node.parse_or("crewCapacity", 0)?,
            resources,
            launch_clamp: node.parse_or("launchClamp", false)?,
            available: node.parse_or("available", true)?,
            docking_port: node.parse_or("dockingPort", false)?,
            command: node.parse_or("command", false)?,
        })
    }
}

fn parse_quat(node: &Node, key: &str) -> Result<Quat, NodeError> {
    let Some(raw) = node.get_value(key) else {
        return Ok(Quat::IDENTITY);
    };
    let invalid = |reason: String| NodeError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
        reason,
    };
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| invalid(e.to_string())))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [w, x, y, z] => Ok(Quat::new(*w, *x, *y, *z)),
        _ => Err(invalid("expected w,x,y,z".into())),
    }
}

/// A complete vessel design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipDesign {
    pub name: String,
    pub parts: Vec<PartSpec>,
}

impl ShipDesign {
    pub fn new(name: &str, parts: Vec<PartSpec>) -> Self {
        Self {
            name: name.to_string(),
            parts,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DesignError> {
        let design: Self = serde_json::from_str(json)?;
        design.validate()?;
        Ok(design)
    }

    /// Check that every part can be instantiated.
    pub fn validate(&self) -> Result<(), DesignError> {
        if self.parts.is_empty() {
            return Err(DesignError::Empty(self.name.clone()));
        }
        self.parts.iter().try_for_each(PartSpec::check)
    }

    pub fn has_launch_clamp(&self) -> bool {
        self.parts.iter().any(|p| p.launch_clamp)
    }

    pub fn unavailable_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| !p.available)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn is_controllable(&self) -> bool {
        self.parts.iter().any(|p| p.command)
    }

    pub fn crew_capacity(&self) -> u32 {
        self.parts.iter().map(|p| p.crew_capacity).sum()
    }

    /// All part box corners in the design frame.
    pub fn points(&self) -> Vec<Vec3> {
        self.parts.iter().flat_map(|p| p.corners()).collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points())
    }

    /// Merged tanks of every part.
    pub fn resources(&self) -> ResourceInventory {
        let mut inv = ResourceInventory::new();
        for p in &self.parts {
            inv.merge(&p.inventory());
        }
        inv
    }

    pub fn dry_mass(&self) -> f64 {
        self.parts.iter().map(|p| p.mass).sum()
    }

    pub fn mass(&self, library: &ResourceLibrary) -> f64 {
        self.dry_mass() + self.resources().mass(library)
    }

    pub fn cost(&self, library: &ResourceLibrary) -> f64 {
        self.parts.iter().map(|p| p.cost).sum::<f64>() + self.resources().cost(library)
    }

    /// Mass-weighted centre of the parts, tanks included.
    pub fn center_of_mass(&self, library: &ResourceLibrary) -> Vec3 {
        let mut total = 0.0;
        let mut acc = Vec3::ZERO;
        for p in &self.parts {
            let m = p.mass + p.inventory().mass(library);
            acc += p.position * m;
            total += m;
        }
        if total > 0.0 {
            acc / total
        } else {
            self.center_of_geometry()
        }
    }

    /// Centre of the design's bounding box.
    pub fn center_of_geometry(&self) -> Vec3 {
        self.bounds().map(|b| b.center()).unwrap_or(Vec3::ZERO)
    }

    pub fn save(&self, node: &mut Node) {
        node.add_value("name", &self.name);
        for p in &self.parts {
            p.save(node.add_node("PART"));
        }
    }

    pub fn load(node: &Node) -> Result<Self, DesignError> {
        let parts = node
            .get_nodes("PART")
            .map(PartSpec::load)
            .collect::<Result<Vec<_>, _>>()?;
        let design = Self {
            name: node.parse("name")?,
            parts,
        };
        design.validate()?;
        Ok(design)
    }
}
