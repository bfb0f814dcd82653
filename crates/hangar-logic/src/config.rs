//! Hangar part configuration and its validation.
//!
//! A [`HangarConfig`] comes from a JSON part definition or from the
//! persistence tree of the part module. Missing fields take the stock
//! defaults.
//!
//! ```
//! use hangar_logic::config::{validate_config, HangarConfig};
//!
//! let mut config = HangarConfig::default();
//! config.launch_velocity = "0,2,0".into();
//! assert!(validate_config(&config).is_empty());
//! assert!(config.launch_velocity().is_some());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::defaults;
use crate::math::{Quat, Transform, Vec3};
use crate::mesh::Mesh;
use crate::metric::load_mesh;
use crate::node::{Node, NodeError};

/// Animated gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Seconds to open or close.
    pub duration: f64,
    /// Electric charge per second while moving.
    pub energy: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            duration: defaults::GATE_DURATION,
            energy: defaults::GATE_ENERGY,
        }
    }
}

/// Configured storage space in the part frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub size: Vec3,
    #[serde(default)]
    pub center: Vec3,
    /// Exact inner surface, used when `use_mesh` is set.
    #[serde(default)]
    pub mesh: Option<Mesh>,
    #[serde(default)]
    pub use_mesh: bool,
}

/// Per-part hangar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HangarConfig {
    /// Empty means "use the part name".
    pub hangar_name: String,
    /// Storage space; `None` derives it from the part volume.
    pub hangar_space: Option<SpaceConfig>,
    /// `None` means the hangar has no gate and is always open.
    pub gate: Option<GateConfig>,
    /// Electric charge per second while Active.
    pub energy_consumption: f64,
    pub volume_per_kerbal: f64,
    pub static_crew_capacity: bool,
    pub no_transfers: bool,
    /// Upward offset of the launch point when no launch transform is set.
    pub launch_height_offset: f64,
    pub launch_transform: Option<Transform>,
    /// Launch impulse as "x,y,z" in the launch frame.
    pub launch_velocity: String,
    pub launch_with_punch: bool,
}

impl Default for HangarConfig {
    fn default() -> Self {
        Self {
            hangar_name: String::new(),
            hangar_space: None,
            gate: Some(GateConfig::default()),
            energy_consumption: defaults::ENERGY_CONSUMPTION,
            volume_per_kerbal: defaults::VOLUME_PER_KERBAL,
            static_crew_capacity: true,
            no_transfers: false,
            launch_height_offset: 0.0,
            launch_transform: None,
            launch_velocity: String::new(),
            launch_with_punch: false,
        }
    }
}

impl HangarConfig {
    pub fn from_json(json: &str) -> Result<Self, NodeError> {
        let config: Self = serde_json::from_str(json)?;
        if let Some(mesh) = config.hangar_space.as_ref().and_then(|s| s.mesh.as_ref()) {
            if !mesh.is_well_formed() {
                return Err(NodeError::Invalid {
                    key: "hangar_space.mesh".into(),
                    value: format!("{} vertices", mesh.vertices.len()),
                    reason: "triangle index out of range".into(),
                });
            }
        }
        Ok(config)
    }

    /// Read a part module node; absent values keep their defaults.
    pub fn from_node(node: &Node) -> Result<Self, NodeError> {
        let d = Self::default();
        let hangar_space = match node.get_node("HANGAR_SPACE") {
            Some(s) => Some(SpaceConfig {
                size: s.parse("size")?,
                center: s.parse_or("center", Vec3::ZERO)?,
                mesh: s.get_node("MESH").map(load_mesh).transpose()?,
                use_mesh: s.parse_or("useMesh", false)?,
            }),
            None => None,
        };
        let gate = if node.parse_or("hasGate", true)? {
            Some(GateConfig {
                duration: node.parse_or("gateDuration", defaults::GATE_DURATION)?,
                energy: node.parse_or("gateEnergy", defaults::GATE_ENERGY)?,
            })
        } else {
            None
        };
        let launch_transform = match node.get_value("launchTransform") {
            Some(_) => Some(Transform::new(node.parse("launchTransform")?, Quat::IDENTITY)),
            None => None,
        };
        Ok(Self {
            hangar_name: node.parse_or("HangarName", d.hangar_name)?,
            hangar_space,
            gate,
            energy_consumption: node.parse_or("EnergyConsumption", d.energy_consumption)?,
            volume_per_kerbal: node.parse_or("VolumePerKerbal", d.volume_per_kerbal)?,
            static_crew_capacity: node.parse_or("StaticCrewCapacity", d.static_crew_capacity)?,
            no_transfers: node.parse_or("NoTransfers", d.no_transfers)?,
            launch_height_offset: node.parse_or("LaunchHeightOffset", d.launch_height_offset)?,
            launch_transform,
            launch_velocity: node.parse_or("LaunchVelocity", d.launch_velocity)?,
            launch_with_punch: node.parse_or("LaunchWithPunch", d.launch_with_punch)?,
        })
    }

    /// Parsed launch impulse. An unparseable string is logged and ignored.
    pub fn launch_velocity(&self) -> Option<Vec3> {
        let raw = self.launch_velocity.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<Vec3>() {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("unable to parse LaunchVelocity \"{raw}\": {e}");
                None
            }
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("energy consumption must not be negative ({0})")]
    NegativeEnergy(f64),
    #[error("volume per kerbal must be positive ({0})")]
    InvalidVolumePerKerbal(f64),
    #[error("launch height offset must be finite")]
    NonFiniteOffset,
    #[error("hangar space size must be finite and positive")]
    InvalidSpaceSize,
    #[error("hangar space mesh is required and must enclose a volume")]
    EmptySpaceMesh,
    #[error("hangar space mesh has a triangle index past its {0} vertices")]
    MalformedSpaceMesh(usize),
    #[error("gate duration must be positive ({0})")]
    InvalidGateDuration(f64),
}

/// Validate a hangar configuration, returning all errors found.
pub fn validate_config(config: &HangarConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.energy_consumption.is_nan() || config.energy_consumption < 0.0 {
        errors.push(ConfigError::NegativeEnergy(config.energy_consumption));
    }
    if config.volume_per_kerbal.is_nan() || config.volume_per_kerbal <= 0.0 {
        errors.push(ConfigError::InvalidVolumePerKerbal(config.volume_per_kerbal));
    }
    if !config.launch_height_offset.is_finite() {
        errors.push(ConfigError::NonFiniteOffset);
    }
    if let Some(space) = &config.hangar_space {
        let s = space.size;
        if !s.is_finite() || s.x <= 0.0 || s.y <= 0.0 || s.z <= 0.0 {
            errors.push(ConfigError::InvalidSpaceSize);
        }
        match &space.mesh {
            Some(m) if !m.is_well_formed() => {
                errors.push(ConfigError::MalformedSpaceMesh(m.vertices.len()));
            }
            Some(m) if space.use_mesh && (m.is_empty() || m.volume() <= 0.0) => {
                errors.push(ConfigError::EmptySpaceMesh);
            }
            None if space.use_mesh => errors.push(ConfigError::EmptySpaceMesh),
            _ => {}
        }
    }
    if let Some(gate) = &config.gate {
        if gate.duration.is_nan() || gate.duration <= 0.0 {
            errors.push(ConfigError::InvalidGateDuration(gate.duration));
        }
    }
    errors
}
