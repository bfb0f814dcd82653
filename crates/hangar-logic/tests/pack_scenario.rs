//! End-to-end packing scenarios over real entries: fit test, admission,
//! removal, resource settlement and persistence.

use hangar_logic::design::{PartSpec, ShipDesign};
use hangar_logic::entry::PackedEntry;
use hangar_logic::math::{Transform, Vec3};
use hangar_logic::metric::{Metric, Space};
use hangar_logic::node::Node;
use hangar_logic::pack::{Pack, PackedConstruct, Packable};
use hangar_logic::reconcile::ResourceReconciler;
use hangar_logic::resources::{ResourceInventory, ResourceLibrary, ResourceStore};
use hangar_logic::totals::CargoTotals;

fn slab(name: &str, volume: f64) -> PackedConstruct {
    let lib = ResourceLibrary::standard();
    let size = Vec3::new(volume / 4.0, 2.0, 2.0);
    let design = ShipDesign::new(
        name,
        vec![PartSpec::new("hull", 1.0, 100.0, Vec3::ZERO, size).with_tank("LiquidFuel", 10.0, 40.0)],
    );
    let metric = Metric::from_points(&design.points(), 0.0, 0.0);
    PackedConstruct(PackedEntry::construct(design, "", metric, &lib))
}

fn bay(volume: f64) -> Pack<PackedConstruct> {
    Pack::new(Metric::from_box(Vec3::new(volume / 25.0, 5.0, 5.0), Vec3::ZERO, 0.0, 0.0))
}

#[test]
fn scenario_hundred_cubic_metres() {
    let mut pack = bay(100.0);
    let a = slab("A", 60.0);
    let b = slab("B", 50.0);
    let a_id = a.id;
    assert!((a.metric.volume - 60.0).abs() < 1e-9);

    assert!(pack.add(a));
    assert!((pack.used_volume() - 60.0).abs() < 1e-9);

    let before = pack.ids();
    assert!(!pack.add(b.clone()));
    assert_eq!(pack.ids(), before);
    assert!((pack.used_volume() - 60.0).abs() < 1e-9);

    assert!(pack.remove(&a_id).is_some());
    assert_eq!(pack.used_volume(), 0.0);

    assert!(pack.add(b));
    assert!((pack.used_volume() - 50.0).abs() < 1e-9);
}

#[test]
fn shape_fit_precedes_capacity() {
    let space = Metric::from_box(Vec3::new(10.0, 3.0, 3.0), Vec3::ZERO, 0.0, 0.0);
    // small volume but too long for the bay
    let pole = Metric::from_box(Vec3::new(12.0, 0.2, 0.2), Vec3::ZERO, 1.0, 1.0);
    let t = Transform::IDENTITY;
    assert!(pole.volume < space.volume);
    assert!(!pole.fits_aligned(&t, &t, Space::Box(&space)));
    assert!(!pole.fits_somehow(&space));
}

#[test]
fn settlement_updates_entry_and_totals_together() {
    let lib = ResourceLibrary::standard();
    let mut pack = bay(100.0);
    let e = slab("Tanker", 20.0);
    let id = e.id;
    let mut totals = CargoTotals::new(3.0);
    totals.apply(&e.metric, 1.0);
    pack.add(e);

    let mut host = ResourceInventory::new();
    host.add("LiquidFuel", 100.0, 100.0);

    let mut rec = ResourceReconciler::new();
    let entry = pack.get_mut(&id).unwrap();
    rec.prepare(&host, &entry.0);
    rec.fill_member();
    let summary = rec.apply(&mut host, &mut entry.0, &lib);
    entry.adjust_mass_cost(summary.mass_delta, summary.cost_delta);
    totals.adjust(summary.mass_delta, summary.cost_delta);

    assert_eq!(entry.amount("LiquidFuel"), 40.0);
    assert_eq!(host.amount("LiquidFuel"), 70.0);

    let mut resynced = CargoTotals::new(3.0);
    resynced.resync(pack.values().map(|c| &c.0));
    assert!(totals.agrees_with(&resynced, 1e-9));
}

#[test]
fn persisted_pack_reloads_same_entries() {
    let mut pack = bay(100.0);
    pack.add(slab("One", 20.0));
    pack.add(slab("Two", 30.0));
    let mut node = Node::new("PACKED_CONSTRUCTS");
    pack.save(&mut node);
    assert_eq!(node.get_nodes(PackedConstruct::NODE_NAME).count(), 2);

    let mut back = bay(100.0);
    back.load(&node);
    assert_eq!(back.ids(), pack.ids());
    assert_eq!(back.used_volume(), pack.used_volume());
    for (a, b) in back.values().zip(pack.values()) {
        assert_eq!(a, b);
    }
}
