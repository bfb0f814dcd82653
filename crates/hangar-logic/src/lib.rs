//! Pure packing logic for the hangar engine.
//!
//! This crate contains everything about packing vessels that is independent
//! of the host simulation: geometry, capacity accounting, resource pooling,
//! state tables and persistence records. Functions take plain data and
//! return results, so they are unit-testable without an ECS world.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Hangar part configuration and validation |
//! | [`constants`] | Volume ratios, admission thresholds, timings, node keys |
//! | [`design`] | Ship designs: parts, tanks, centres, JSON/node loading |
//! | [`entry`] | Packed entries (stored vessels and packed constructs) |
//! | [`math`] | `f64` vectors, quaternions, rigid transforms, AABBs |
//! | [`mesh`] | Closed meshes, convex hulls, exact mesh-in-mesh containment |
//! | [`metric`] | Bounding volume, mass and cost with fit tests |
//! | [`momentum`] | Momentum-conserving docking and launch velocity changes |
//! | [`node`] | Hierarchical key/value persistence tree |
//! | [`pack`] | Capacity-constrained keyed entry container |
//! | [`reconcile`] | Pooled resource transfer between hangar and cargo |
//! | [`resources`] | Resource definitions, inventories, the store trait |
//! | [`state`] | Hangar/gate state and the rejection debounce table |
//! | [`totals`] | Aggregate cargo mass/cost/volume and crew seats |

pub mod config;
pub mod constants;
pub mod design;
pub mod entry;
pub mod math;
pub mod mesh;
pub mod metric;
pub mod momentum;
pub mod node;
pub mod pack;
pub mod reconcile;
pub mod resources;
pub mod state;
pub mod totals;
