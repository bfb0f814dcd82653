//! Hangar Headless Simulation Harness
//!
//! Drives the hangar engine through packing, docking, launch and mission
//! start scenarios and checks the conservation laws along the way.
//! Runs entirely in-process: no rendering, no input, no persistence files.
//!
//! Usage:
//!   cargo run -p hangar-simtest
//!   cargo run -p hangar-simtest -- --verbose
//!   cargo run -p hangar-simtest -- --seed 7

use hangar_core::prelude::*;
use hangar_logic::config::{validate_config, HangarConfig};
use hangar_logic::design::ShipDesign;
use hangar_logic::entry::{PackedEntry, VesselId};
use hangar_logic::math::{Transform, Vec3};
use hangar_logic::metric::Metric;
use hangar_logic::pack::{Pack, PackedConstruct};
use hangar_logic::resources::{ResourceLibrary, ResourceStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Design library ──────────────────────────────────────────────────────
const DESIGNS_JSON: &str = include_str!("../../../data/designs.json");

const HOST_POSITION: Vec3 = Vec3 {
    x: 0.0,
    y: 700_000.0,
    z: 0.0,
};
const HOST_VELOCITY: Vec3 = Vec3 {
    x: 2200.0,
    y: 0.0,
    z: 0.0,
};
/// Part index of the cargo bay in the carrier design.
const CARGO_BAY: usize = 2;
const SERVICE_BAY: usize = 3;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let seed = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    println!("=== Hangar Simulation Harness (seed {}) ===\n", seed);

    let designs = match load_designs() {
        Ok(d) => d,
        Err(e) => {
            println!("  ✗ designs_parse: {}", e);
            std::process::exit(1);
        }
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::new();

    // 1. Design library and config validation
    results.extend(validate_designs(&designs, verbose));

    // 2. Pack capacity invariant under random traffic
    results.extend(validate_pack_capacity(&mut rng, verbose));

    // 3. Docking and launch momentum
    results.extend(validate_momentum(&designs, &mut rng, verbose));

    // 4. Resource pooling
    results.extend(validate_resource_pool(&designs, &mut rng, verbose));

    // 5. Rejection debounce
    results.extend(validate_debounce(&designs, verbose));

    // 6. Mission start conversion
    results.extend(validate_mission_start(&designs, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

struct Designs {
    carrier: ShipDesign,
    scout: ShipDesign,
    rover: ShipDesign,
    stand: ShipDesign,
}

fn load_designs() -> Result<Designs, String> {
    let all: Vec<ShipDesign> = serde_json::from_str(DESIGNS_JSON).map_err(|e| e.to_string())?;
    let find = |name: &str| {
        all.iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| format!("design \"{}\" missing", name))
    };
    Ok(Designs {
        carrier: find("Carrier")?,
        scout: find("Scout")?,
        rover: find("Rover")?,
        stand: find("Launch Stand")?,
    })
}

fn gateless() -> HangarConfig {
    HangarConfig {
        gate: None,
        ..HangarConfig::default()
    }
}

/// A flight world with the carrier and one active hangar on its cargo bay.
fn docking_world(designs: &Designs, config: HangarConfig) -> Result<(FlightWorld, Hangar), HangarError> {
    let mut world = FlightWorld::new(Scene::Flight);
    let host = world.spawn_loaded(&designs.carrier, Transform::from_position(HOST_POSITION), HOST_VELOCITY);
    let mut hangar = Hangar::new(HangarId(0), host, CARGO_BAY, config);
    hangar.setup(&mut world, false)?;
    hangar.activate();
    Ok((world, hangar))
}

fn spawn_in_bay(world: &mut FlightWorld, design: &ShipDesign, velocity: Vec3) -> VesselId {
    let at = Transform::from_position(HOST_POSITION + Vec3::new(0.0, -10.0, 0.0));
    world.spawn_loaded(design, at, velocity)
}

fn momentum(world: &FlightWorld, ids: &[VesselId]) -> Vec3 {
    ids.iter().fold(Vec3::ZERO, |acc, id| {
        let v = world.orbit(*id).map(|o| o.velocity).unwrap_or_default();
        acc + v * world.vessel_mass(*id)
    })
}

// ── 1. Designs ──────────────────────────────────────────────────────────

fn validate_designs(designs: &Designs, verbose: bool) -> Vec<TestResult> {
    println!("--- Designs & Config ---");
    let mut results = Vec::new();

    for d in [&designs.carrier, &designs.scout, &designs.rover, &designs.stand] {
        let check = d.validate();
        results.push(TestResult {
            name: format!("design_valid_{}", d.name.to_lowercase().replace(' ', "_")),
            passed: check.is_ok(),
            detail: match check {
                Ok(()) => format!("{} parts, {:.2} t dry", d.parts.len(), d.dry_mass()),
                Err(e) => e.to_string(),
            },
        });
    }

    let lib = ResourceLibrary::standard();
    if verbose {
        println!(
            "  carrier: {:.2} t wet, {:.0} funds",
            designs.carrier.mass(&lib),
            designs.carrier.cost(&lib)
        );
    }

    let errors = validate_config(&HangarConfig::default());
    results.push(TestResult {
        name: "default_config_valid".into(),
        passed: errors.is_empty(),
        detail: format!("{} config errors", errors.len()),
    });

    let bad = HangarConfig {
        energy_consumption: -1.0,
        volume_per_kerbal: 0.0,
        ..HangarConfig::default()
    };
    let errors = validate_config(&bad);
    results.push(TestResult {
        name: "bad_config_reported".into(),
        passed: errors.len() >= 2,
        detail: format!("{} config errors", errors.len()),
    });

    results
}

// ── 2. Pack capacity ────────────────────────────────────────────────────

fn validate_pack_capacity(rng: &mut StdRng, _verbose: bool) -> Vec<TestResult> {
    println!("--- Pack Capacity ---");
    let mut results = Vec::new();
    let lib = ResourceLibrary::standard();

    let mut pack: Pack<PackedConstruct> = Pack::new(Metric::from_box(Vec3::new(10.0, 5.0, 2.0), Vec3::ZERO, 0.0, 0.0));
    let mut violations = 0;
    let mut admitted = 0;
    let mut rejected = 0;
    for i in 0..400 {
        if rng.gen_bool(0.65) {
            let size = Vec3::new(rng.gen_range(0.5..6.0), rng.gen_range(0.5..4.0), rng.gen_range(0.5..2.0));
            let design = ShipDesign::new(
                &format!("crate-{}", i),
                vec![hangar_logic::design::PartSpec::new("box", 1.0, 10.0, Vec3::ZERO, size)],
            );
            let metric = Metric::from_points(&design.points(), 0.0, 0.0);
            let fits_volume = pack.used_volume() + metric.volume <= pack.space().volume;
            let entry = PackedConstruct(PackedEntry::construct(design, "", metric, &lib));
            let added = pack.add(entry);
            if added != fits_volume {
                violations += 1;
            }
            if added {
                admitted += 1;
            } else {
                rejected += 1;
            }
        } else if let Some(id) = pack.ids().first().copied() {
            pack.remove(&id);
        }
        if (pack.used_volume() - pack.entries_volume()).abs() > 1e-9 || pack.used_volume() > pack.space().volume + 1e-9 {
            violations += 1;
        }
    }
    results.push(TestResult {
        name: "pack_capacity_invariant".into(),
        passed: violations == 0,
        detail: format!("{} admitted, {} rejected, {} violations", admitted, rejected, violations),
    });

    results
}

// ── 3. Momentum ─────────────────────────────────────────────────────────

fn validate_momentum(designs: &Designs, rng: &mut StdRng, verbose: bool) -> Vec<TestResult> {
    println!("--- Docking & Launch Momentum ---");
    let mut results = Vec::new();
    let config = HangarConfig {
        launch_with_punch: true,
        launch_velocity: "0,-2,0".into(),
        ..gateless()
    };

    let mut worst_store = 0.0_f64;
    let mut worst_launch = 0.0_f64;
    let mut failures = Vec::new();
    for round in 0..25 {
        let (mut world, mut hangar) = match docking_world(designs, config.clone()) {
            Ok(w) => w,
            Err(e) => {
                failures.push(format!("round {}: {}", round, e));
                continue;
            }
        };
        let drift = Vec3::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
        let scout = spawn_in_bay(&mut world, &designs.scout, HOST_VELOCITY + drift);
        let host = hangar.vessel();

        let before = momentum(&world, &[host, scout]);
        if let Err(e) = hangar.store_vessel(&mut world, scout, true) {
            failures.push(format!("round {} store: {}", round, e));
            continue;
        }
        let docked = momentum(&world, &[host]);
        worst_store = worst_store.max((docked - before).length() / before.length());

        hangar.activate();
        if let Err(e) = hangar.try_restore(&mut world, scout) {
            failures.push(format!("round {} launch: {}", round, e));
            continue;
        }
        let launched = momentum(&world, &[host, scout]);
        worst_launch = worst_launch.max((launched - docked).length() / docked.length());
    }
    if verbose {
        println!("  worst relative momentum error: store {:.2e}, launch {:.2e}", worst_store, worst_launch);
    }

    results.push(TestResult {
        name: "momentum_rounds_complete".into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "25 dock/launch rounds".into()
        } else {
            failures.join("; ")
        },
    });
    results.push(TestResult {
        name: "momentum_store_conserved".into(),
        passed: worst_store < 1e-9,
        detail: format!("worst relative error {:.2e}", worst_store),
    });
    results.push(TestResult {
        name: "momentum_launch_conserved".into(),
        passed: worst_launch < 1e-9,
        detail: format!("worst relative error {:.2e}", worst_launch),
    });

    results
}

// ── 4. Resource pool ────────────────────────────────────────────────────

fn validate_resource_pool(designs: &Designs, rng: &mut StdRng, _verbose: bool) -> Vec<TestResult> {
    println!("--- Resource Pooling ---");
    let mut results = Vec::new();
    let mut worst = 0.0_f64;
    let mut drift = 0usize;
    let mut rounds = 0usize;

    for _ in 0..25 {
        let Ok((mut world, mut hangar)) = docking_world(designs, gateless()) else {
            continue;
        };
        let scout = spawn_in_bay(&mut world, &designs.scout, HOST_VELOCITY);
        if hangar.store_vessel(&mut world, scout, false).is_err() {
            continue;
        }
        let host = hangar.vessel();
        let pool = |world: &FlightWorld, hangar: &Hangar, name: &str| {
            let host_amount = world.structure(host).map(|s| s.amount(name)).unwrap_or(0.0);
            let member = hangar.get_vessel(&scout).map(|s| s.amount(name)).unwrap_or(0.0);
            host_amount + member
        };
        let before: Vec<f64> = ["LiquidFuel", "Oxidizer"].iter().map(|n| pool(&world, &hangar, n)).collect();

        hangar.prepare_resource_list(&world, scout);
        hangar.set_resource_amount("LiquidFuel", rng.gen_range(0.0..80.0));
        hangar.set_resource_amount("Oxidizer", rng.gen_range(0.0..100.0));
        hangar.transfer_resources(&mut world);

        for (name, b) in ["LiquidFuel", "Oxidizer"].iter().zip(&before) {
            worst = worst.max((pool(&world, &hangar, name) - b).abs() / b.max(1.0));
        }
        if !hangar.totals().agrees_with(&hangar.resynced_totals(), 1e-9) {
            drift += 1;
        }
        if hangar.setup(&mut world, true).is_err() || !hangar.totals().agrees_with(&hangar.resynced_totals(), 1e-9) {
            drift += 1;
        }
        rounds += 1;
    }

    results.push(TestResult {
        name: "resource_pool_conserved".into(),
        passed: rounds > 0 && worst < 1e-6,
        detail: format!("{} rounds, worst relative error {:.2e}", rounds, worst),
    });
    results.push(TestResult {
        name: "totals_match_resync".into(),
        passed: rounds > 0 && drift == 0,
        detail: format!("{} disagreements", drift),
    });

    results
}

// ── 5. Debounce ─────────────────────────────────────────────────────────

fn validate_debounce(designs: &Designs, _verbose: bool) -> Vec<TestResult> {
    println!("--- Rejection Debounce ---");
    let mut results = Vec::new();
    let Ok((mut world, mut hangar)) = docking_world(designs, gateless()) else {
        results.push(TestResult {
            name: "debounce_setup".into(),
            passed: false,
            detail: "hangar setup failed".into(),
        });
        return results;
    };
    // a second carrier never fits the bay
    let oversized = spawn_in_bay(&mut world, &designs.carrier, HOST_VELOCITY);
    for _ in 0..10 {
        let _ = hangar.store_vessel(&mut world, oversized, true);
        hangar.fixed_update(&mut world, 0.2);
    }
    let shown = world.messages_containing("clearance");
    results.push(TestResult {
        name: "debounce_single_message".into(),
        passed: shown == 1 && hangar.debounce().contains(&oversized),
        detail: format!("{} messages for 10 contacts in 2 s", shown),
    });

    world.tick(3.5);
    hangar.fixed_update(&mut world, 3.5);
    let expired = hangar.debounce().is_empty();
    let _ = hangar.store_vessel(&mut world, oversized, true);
    let shown = world.messages_containing("clearance");
    results.push(TestResult {
        name: "debounce_expires".into(),
        passed: expired && shown == 2,
        detail: format!("expired: {}, {} messages after a quiet window", expired, shown),
    });

    // momentary rejections are never remembered
    let scout = spawn_in_bay(&mut world, &designs.scout, HOST_VELOCITY + Vec3::new(4.0, 0.0, 0.0));
    let refused = hangar.store_vessel(&mut world, scout, true).is_err();
    world.update(scout, |o: &mut OrbitState| o.velocity = HOST_VELOCITY);
    let stored = hangar.store_vessel(&mut world, scout, true).is_ok();
    results.push(TestResult {
        name: "momentary_rejection_not_debounced".into(),
        passed: refused && stored,
        detail: format!("refused while fast: {}, stored once slow: {}", refused, stored),
    });

    results
}

// ── 6. Mission start ────────────────────────────────────────────────────

fn validate_mission_start(designs: &Designs, verbose: bool) -> Vec<TestResult> {
    println!("--- Mission Start ---");
    let mut results = Vec::new();

    let mut flight = Flight::new(Scene::Flight);
    let host = flight
        .world
        .spawn_loaded(&designs.carrier, Transform::from_position(HOST_POSITION), HOST_VELOCITY);
    let (cargo, service) = match (
        flight.add_hangar(host, CARGO_BAY, gateless()),
        flight.add_hangar(host, SERVICE_BAY, gateless()),
    ) {
        (Ok(c), Ok(s)) => (c, s),
        _ => {
            results.push(TestResult {
                name: "mission_setup".into(),
                passed: false,
                detail: "hangars could not be mounted".into(),
            });
            return results;
        }
    };

    let packed = [
        (cargo, &designs.rover),
        (cargo, &designs.rover),
        (cargo, &designs.scout),
        (service, &designs.scout),
    ]
    .into_iter()
    .filter(|(id, design)| {
        matches!(
            flight.with_hangar(*id, |h, world| h.add_construct(world, (*design).clone(), "")),
            Ok(Ok(_))
        )
    })
    .count();
    let clamp_refused = matches!(
        flight.with_hangar(cargo, |h, world| h.add_construct(world, designs.stand.clone(), "")),
        Ok(Err(_))
    );
    results.push(TestResult {
        name: "constructs_packed".into(),
        passed: packed == 4 && clamp_refused,
        detail: format!("{} packed, launch stand refused: {}", packed, clamp_refused),
    });

    flight.start();
    let mut ticks = 0;
    let mut order_ok = true;
    while !flight.all_ready() && ticks < 2000 {
        flight.update(0.02);
        ticks += 1;
        let service_started = flight.hangar(service).map(|h| h.constructs().is_empty()).unwrap_or(false);
        if service_started && !flight.registry().is_ready(cargo) {
            order_ok = false;
        }
    }
    if verbose {
        println!("  conversion finished after {} ticks ({:.2} s)", ticks, flight.world.time);
    }

    let stored: usize = [cargo, service]
        .iter()
        .filter_map(|id| flight.hangar(*id))
        .map(|h| h.stored().len())
        .sum();
    results.push(TestResult {
        name: "mission_all_ready".into(),
        passed: flight.all_ready(),
        detail: format!("{} ticks", ticks),
    });
    results.push(TestResult {
        name: "mission_constructs_stored".into(),
        passed: stored == 4 && flight.world.vessel_count() == 1,
        detail: format!("{} stored, {} vessels in flight", stored, flight.world.vessel_count()),
    });
    results.push(TestResult {
        name: "mission_readiness_order".into(),
        passed: order_ok,
        detail: "service bay waited for the cargo bay".into(),
    });
    results.push(TestResult {
        name: "mission_persistent_saves".into(),
        passed: flight.world.save_requests == 2,
        detail: format!("{} save requests", flight.world.save_requests),
    });

    results
}
