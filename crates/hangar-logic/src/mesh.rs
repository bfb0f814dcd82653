//! Closed triangle meshes: volume, point containment, convex hulls and
//! exact mesh-in-mesh containment.
//!
//! # Containment
//!
//! A closed candidate surface `A` lies inside a closed container surface `B`
//! when every vertex of `A` is inside `B` and the two surfaces do not cross.
//! Two triangle surfaces cross exactly when an edge of one pierces a
//! triangle of the other, so the test is:
//!
//! 1. bounds pre-check,
//! 2. every candidate vertex inside the container (parity ray cast),
//! 3. no candidate edge pierces a container triangle,
//! 4. no container edge pierces a candidate triangle.
//!
//! Touching surfaces are resolved by shrinking the candidate toward its
//! centroid by [`FIT_TOLERANCE`] metres before testing, so a candidate that
//! is flush with a container wall counts as fitting.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::math::{Bounds, Transform, Vec3};

/// Absolute clearance (m) granted to flush contact in containment tests.
pub const FIT_TOLERANCE: f64 = 1e-4;

/// Skewed ray direction for parity tests; avoids grazing axis-aligned edges.
const RAY_DIR: Vec3 = Vec3 {
    x: 0.577_215_664_9,
    y: 0.618_033_988_7,
    z: 0.533_725_149_3,
};

/// Indexed triangle mesh with outward (counter-clockwise) winding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Closed box mesh covering `bounds`.
    pub fn from_bounds(bounds: &Bounds) -> Self {
        let vertices = bounds.corners().to_vec();
        // corner index bits: 1 = +x, 2 = +y, 4 = +z
        let triangles = vec![
            [0, 2, 1],
            [1, 2, 3], // -z
            [4, 5, 6],
            [5, 7, 6], // +z
            [0, 1, 4],
            [1, 5, 4], // -y
            [2, 6, 3],
            [3, 6, 7], // +y
            [0, 4, 2],
            [2, 4, 6], // -x
            [1, 3, 5],
            [3, 7, 5], // +x
        ];
        Self {
            vertices,
            triangles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Every triangle index names an existing vertex. Meshes read from
    /// config are checked before any geometry is run on them.
    pub fn is_well_formed(&self) -> bool {
        let n = self.vertices.len();
        self.triangles.iter().all(|t| t.iter().all(|i| *i < n))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }

    /// Enclosed volume (divergence theorem over signed tetrahedra).
    pub fn volume(&self) -> f64 {
        let signed: f64 = self
            .triangles
            .iter()
            .map(|t| {
                let (a, b, c) = self.corners(t);
                a.dot(&b.cross(&c))
            })
            .sum();
        (signed / 6.0).abs()
    }

    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::ZERO, |acc, v| acc + *v);
        sum / self.vertices.len() as f64
    }

    pub fn transformed(&self, t: &Transform) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| t.transform_point(*v)).collect(),
            triangles: self.triangles.clone(),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
            triangles: self.triangles.clone(),
        }
    }

    /// Uniform scale about the origin.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v * k).collect(),
            triangles: self.triangles.clone(),
        }
    }

    /// Unique undirected edges.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut seen = HashSet::new();
        for t in &self.triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                seen.insert((a.min(b), a.max(b)));
            }
        }
        let mut edges: Vec<_> = seen.into_iter().collect();
        edges.sort_unstable();
        edges
    }

    fn corners(&self, t: &[usize; 3]) -> (Vec3, Vec3, Vec3) {
        (self.vertices[t[0]], self.vertices[t[1]], self.vertices[t[2]])
    }

    /// Parity ray-cast point containment. Points on the surface are unspecified.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let mut crossings = 0usize;
        for t in &self.triangles {
            let (a, b, c) = self.corners(t);
            if let Some(d) = ray_triangle(p, RAY_DIR, a, b, c) {
                if d > 1e-12 {
                    crossings += 1;
                }
            }
        }
        crossings % 2 == 1
    }

    /// Whether segment `a→b` pierces any triangle of this surface.
    pub fn segment_crosses_surface(&self, a: Vec3, b: Vec3) -> bool {
        let dir = b - a;
        self.triangles.iter().any(|t| {
            let (p0, p1, p2) = self.corners(t);
            matches!(ray_triangle(a, dir, p0, p1, p2), Some(s) if s > 1e-9 && s < 1.0 - 1e-9)
        })
    }

    /// Exact containment of `inner` (a closed surface) in this closed surface.
    pub fn contains_mesh(&self, inner: &Mesh) -> bool {
        let (Some(outer_b), Some(inner_b)) = (self.bounds(), inner.bounds()) else {
            return false;
        };
        let inner = inner.shrunk(FIT_TOLERANCE);
        if !inner
            .vertices
            .iter()
            .all(|v| outer_b.contains(v, FIT_TOLERANCE))
        {
            return false;
        }
        if inner_b.size().product() > 0.0 && inner.volume() > self.volume() + FIT_TOLERANCE {
            return false;
        }
        if !inner.vertices.iter().all(|v| self.contains_point(*v)) {
            return false;
        }
        let inner_crosses = inner.edges().into_iter().any(|(i, j)| {
            self.segment_crosses_surface(inner.vertices[i], inner.vertices[j])
        });
        if inner_crosses {
            return false;
        }
        !self
            .edges()
            .into_iter()
            .any(|(i, j)| inner.segment_crosses_surface(self.vertices[i], self.vertices[j]))
    }

    /// Copy pulled toward the centroid so its furthest vertex moves by `by`.
    fn shrunk(&self, by: f64) -> Mesh {
        let c = self.centroid();
        let radius = self
            .vertices
            .iter()
            .map(|v| v.distance(&c))
            .fold(0.0, f64::max);
        if radius <= by {
            return self.clone();
        }
        let k = 1.0 - by / radius;
        Mesh {
            vertices: self.vertices.iter().map(|v| c + (*v - c) * k).collect(),
            triangles: self.triangles.clone(),
        }
    }
}

/// Möller–Trumbore: parameter `s` along `dir` where the ray from `origin`
/// meets triangle `abc`, or `None` when it misses or runs parallel.
fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f64> {
    let e1 = b - a;
    let e2 = c - a;
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < 1e-14 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = inv * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    Some(inv * e2.dot(&q))
}

// ── Convex hull ─────────────────────────────────────────────────────────

/// Convex hull of a point cloud by incremental insertion.
///
/// Returns `None` when the cloud is degenerate (fewer than four points, or
/// all points colinear or coplanar).
pub fn convex_hull(points: &[Vec3]) -> Option<Mesh> {
    let bounds = Bounds::from_points(points)?;
    let scale = bounds.size().length().max(1e-9);
    let eps = scale * 1e-9;

    let p0 = 0;
    let p1 = farthest(points, |p| p.distance(&points[p0]))?;
    let axis = (points[p1] - points[p0]).normalize();
    let p2 = farthest(points, |p| {
        let d = *p - points[p0];
        (d - axis * d.dot(&axis)).length()
    })?;
    let normal = (points[p1] - points[p0])
        .cross(&(points[p2] - points[p0]))
        .normalize();
    let p3 = farthest(points, |p| (*p - points[p0]).dot(&normal).abs())?;

    if points[p1].distance(&points[p0]) <= eps
        || normal.length() == 0.0
        || (points[p3] - points[p0]).dot(&normal).abs() <= eps
    {
        return None;
    }

    let mut faces: Vec<[usize; 3]> = Vec::new();
    let interior = (points[p0] + points[p1] + points[p2] + points[p3]) * 0.25;
    for [a, b, c] in [[p0, p1, p2], [p0, p1, p3], [p0, p2, p3], [p1, p2, p3]] {
        faces.push(orient_outward(points, [a, b, c], interior));
    }

    for (i, p) in points.iter().enumerate() {
        if [p0, p1, p2, p3].contains(&i) {
            continue;
        }
        let visible: Vec<bool> = faces
            .iter()
            .map(|f| plane_distance(points, f, *p) > eps)
            .collect();
        if !visible.iter().any(|v| *v) {
            continue;
        }
        let mut visible_edges = HashSet::new();
        for (f, _) in faces.iter().zip(&visible).filter(|(_, v)| **v) {
            visible_edges.insert((f[0], f[1]));
            visible_edges.insert((f[1], f[2]));
            visible_edges.insert((f[2], f[0]));
        }
        let horizon: Vec<(usize, usize)> = visible_edges
            .iter()
            .filter(|(a, b)| !visible_edges.contains(&(*b, *a)))
            .copied()
            .collect();
        faces = faces
            .into_iter()
            .zip(visible)
            .filter(|(_, v)| !*v)
            .map(|(f, _)| f)
            .collect();
        for (a, b) in horizon {
            faces.push([a, b, i]);
        }
    }

    // compact to the vertices actually referenced
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut vertices = Vec::new();
    let triangles = faces
        .iter()
        .map(|f| {
            f.map(|idx| {
                *remap.entry(idx).or_insert_with(|| {
                    vertices.push(points[idx]);
                    vertices.len() - 1
                })
            })
        })
        .collect();
    Some(Mesh::new(vertices, triangles))
}

fn farthest(points: &[Vec3], metric: impl Fn(&Vec3) -> f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, metric(p)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

fn plane_distance(points: &[Vec3], f: &[usize; 3], p: Vec3) -> f64 {
    let (a, b, c) = (points[f[0]], points[f[1]], points[f[2]]);
    let n = (b - a).cross(&(c - a)).normalize();
    n.dot(&(p - a))
}

fn orient_outward(points: &[Vec3], f: [usize; 3], interior: Vec3) -> [usize; 3] {
    if plane_distance(points, &f, interior) > 0.0 {
        [f[0], f[2], f[1]]
    } else {
        f
    }
}
