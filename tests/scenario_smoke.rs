use vortica_engine::{Scenario, Simulation};

#[test]
fn scenario_json_builds_and_steps() {
    let json = r#"{
        "params": { "height": 40, "width": 80, "viscosity": 0.02, "u0": 0.05 },
        "obstacles": [ { "shape": "circle", "row": 20, "col": 20, "radius": 4 } ]
    }"#;
    let mut sim = Simulation::from_scenario_json(json).unwrap();
    assert_eq!(sim.height(), 40);
    assert_eq!(sim.width(), 80);
    assert!(sim.get_barrier(20, 20).unwrap());

    sim.step_many(5);
    assert_eq!(sim.frame_count(), 6);

    let manifest = sim.params_json();
    assert!(manifest.contains("\"height\":40"));
    assert!(manifest.contains("\"started\":true"));
}

#[test]
fn karman_preset_round_trips_through_json() {
    let json = Scenario::karman().to_json().unwrap();
    let sim = Simulation::from_scenario_json(&json).unwrap();
    assert_eq!(sim.height(), 80);
    assert_eq!(sim.width(), 200);
    assert!(sim.get_barrier(40, 50).unwrap());
}

#[test]
fn perf_smoke_step() {
    let mut sim = Simulation::new(64, 128, 0.02, 0.05).unwrap();
    sim.enable_perf_metrics(true);
    sim.step();
    let stats = sim.get_perf_stats();
    assert!(stats.step_ms() >= 0.0);
    assert_eq!(stats.lattice_cells(), 64 * 128);
}

#[test]
fn facade_save_load_round_trip() {
    let mut sim = Simulation::new(16, 16, 0.02, 0.05).unwrap();
    sim.set_barrier(true, 8, 8).unwrap();
    sim.step_many(3);

    let bytes = sim.save().unwrap();
    let loaded = Simulation::load(&bytes).unwrap();
    assert_eq!(loaded.height(), 16);
    assert!(loaded.started());
    assert!(loaded.get_barrier(8, 8).unwrap());
    assert_eq!(loaded.frame_count(), 1);
}
