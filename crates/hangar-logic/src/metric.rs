//! Metric: bounding volume, mass and cost of a packable object, with
//! orientation-aware fit tests against a box or an arbitrary hull mesh.

use serde::{Deserialize, Serialize};

use crate::math::{Bounds, Transform, Vec3};
use crate::mesh::{convex_hull, Mesh, FIT_TOLERANCE};
use crate::node::{Node, NodeError};

/// Volumes below this are treated as "no usable space".
pub const EMPTY_VOLUME: f64 = 1e-6;

/// Geometric and physical footprint of an object.
///
/// `size` and `center` describe the object's bounding box in its own frame.
/// When `hull` is present, `volume` is the hull's enclosed volume and the box
/// merely bounds it; otherwise `volume == size.x * size.y * size.z`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub size: Vec3,
    pub volume: f64,
    pub mass: f64,
    pub cost: f64,
    pub center: Vec3,
    pub hull: Option<Mesh>,
}

/// Storage space a metric can be fitted into, expressed in the frame passed
/// as `space_frame` to [`Metric::fits_aligned`].
#[derive(Debug, Clone, PartialEq)]
pub enum Space<'a> {
    Box(&'a Metric),
    Hull(&'a Mesh),
}

impl Metric {
    pub fn from_box(size: Vec3, center: Vec3, mass: f64, cost: f64) -> Self {
        let size = size.abs();
        Self {
            size,
            volume: size.product(),
            mass,
            cost,
            center,
            hull: None,
        }
    }

    /// Box metric of a point cloud; an empty cloud yields an empty metric.
    pub fn from_points(points: &[Vec3], mass: f64, cost: f64) -> Self {
        match Bounds::from_points(points) {
            Some(b) => Self::from_box(b.size(), b.center(), mass, cost),
            None => Self {
                mass,
                cost,
                ..Self::default()
            },
        }
    }

    /// Hull metric of a closed mesh.
    pub fn from_mesh(mesh: Mesh, mass: f64, cost: f64) -> Self {
        let Some(b) = mesh.bounds() else {
            return Self {
                mass,
                cost,
                ..Self::default()
            };
        };
        Self {
            size: b.size(),
            volume: mesh.volume(),
            mass,
            cost,
            center: b.center(),
            hull: Some(mesh),
        }
    }

    /// Convex-hull metric of a point cloud, falling back to the bounding box
    /// when the cloud is flat or too small to span a hull.
    pub fn from_hull_points(points: &[Vec3], mass: f64, cost: f64) -> Self {
        match convex_hull(points) {
            Some(mesh) => Self::from_mesh(mesh, mass, cost),
            None => Self::from_points(points, mass, cost),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.volume.abs() < EMPTY_VOLUME
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_center_size(self.center, self.size)
    }

    /// Linear scale by `k`; mass and cost are cargo properties and stay put.
    pub fn scale(&self, k: f64) -> Self {
        Self {
            size: self.size * k.abs(),
            volume: self.volume * k.abs().powi(3),
            mass: self.mass,
            cost: self.cost,
            center: self.center * k,
            hull: self.hull.as_ref().map(|h| h.scaled(k)),
        }
    }

    /// Closed surface of this metric in its own frame.
    pub fn shape(&self) -> Mesh {
        match &self.hull {
            Some(h) => h.clone(),
            None => Mesh::from_bounds(&self.bounds()),
        }
    }

    /// Whether this metric fits `space` when its bounds centre is placed at
    /// `target` (aligned with the target's rotation).
    ///
    /// `target` and `space_frame` are expressed in a common parent frame; the
    /// candidate shape is carried into `space_frame` before testing.
    pub fn fits_aligned(&self, target: &Transform, space_frame: &Transform, space: Space<'_>) -> bool {
        let space_volume = match space {
            Space::Box(m) => m.volume,
            Space::Hull(mesh) => mesh.volume(),
        };
        if self.volume > space_volume + FIT_TOLERANCE {
            return false;
        }
        let shape = self.shape().translated(-self.center);
        let in_space: Vec<Vec3> = shape
            .vertices
            .iter()
            .map(|v| space_frame.inverse_transform_point(target.transform_point(*v)))
            .collect();
        match space {
            Space::Box(m) => {
                let b = m.bounds();
                in_space.iter().all(|p| b.contains(p, FIT_TOLERANCE))
            }
            Space::Hull(mesh) => mesh.contains_mesh(&Mesh::new(in_space, shape.triangles)),
        }
    }

    /// Orientation-free quick check: every sorted dimension fits.
    pub fn fits_somehow(&self, other: &Metric) -> bool {
        let a = self.size.sorted();
        let b = other.size.sorted();
        self.volume <= other.volume + FIT_TOLERANCE
            && a.iter().zip(b.iter()).all(|(x, y)| *x <= *y + FIT_TOLERANCE)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn save(&self, node: &mut Node) {
        node.add_value("size", self.size);
        node.add_value("volume", self.volume);
        node.add_value("mass", self.mass);
        node.add_value("cost", self.cost);
        node.add_value("center", self.center);
        if let Some(hull) = &self.hull {
            let h = node.add_node("HULL");
            for v in &hull.vertices {
                h.add_value("v", v);
            }
            for t in &hull.triangles {
                h.add_value("t", format!("{},{},{}", t[0], t[1], t[2]));
            }
        }
    }

    pub fn load(node: &Node) -> Result<Self, NodeError> {
        let hull = node.get_node("HULL").map(load_mesh).transpose()?;
        Ok(Self {
            size: node.parse("size")?,
            volume: node.parse("volume")?,
            mass: node.parse("mass")?,
            cost: node.parse("cost")?,
            center: node.parse("center")?,
            hull,
        })
    }
}

/// Read a mesh written as `v = x,y,z` and `t = a,b,c` values. Triangle
/// indices are range-checked against the vertices.
pub fn load_mesh(node: &Node) -> Result<Mesh, NodeError> {
    let vertices = node
        .get_values("v")
        .map(|s| {
            s.parse::<Vec3>().map_err(|reason| NodeError::Invalid {
                key: "v".into(),
                value: s.to_string(),
                reason,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let triangles = node
        .get_values("t")
        .map(|s| parse_triangle(s, vertices.len()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Mesh::new(vertices, triangles))
}

fn parse_triangle(s: &str, vertex_count: usize) -> Result<[usize; 3], NodeError> {
    let invalid = |reason: String| NodeError::Invalid {
        key: "t".into(),
        value: s.to_string(),
        reason,
    };
    let idx: Vec<usize> = s
        .split(',')
        .map(|p| p.trim().parse::<usize>().map_err(|e| invalid(e.to_string())))
        .collect::<Result<_, _>>()?;
    match idx.as_slice() {
        [a, b, c] if *a < vertex_count && *b < vertex_count && *c < vertex_count => Ok([*a, *b, *c]),
        _ => Err(invalid("triangle must have three in-range indices".into())),
    }
}
