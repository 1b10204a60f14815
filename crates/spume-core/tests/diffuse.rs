use glam::Vec3;
use spume_core::sim::{DiffuseKind, FluidSim};
use spume_core::SimulationConfig;

const DT: f32 = 1.0 / 60.0;

#[test]
fn fast_surface_particle_spawns_spray_same_step() {
    let mut sim = FluidSim::new(SimulationConfig::default()).unwrap();
    // Isolated and fast: zero neighbors puts it at the free surface, and its
    // kinetic energy clears the spray threshold
    sim.spawn(Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.0, -4.0, 0.0));

    sim.advance(DT);

    let counts = sim.diffuse_counts();
    assert!(counts.spray >= 1, "expected spray after one step, got {:?}", counts);
    assert!(sim
        .diffuse_particles()
        .iter()
        .any(|d| d.kind == DiffuseKind::Spray));
}

#[test]
fn diffuse_count_never_exceeds_capacity() {
    let mut config = SimulationConfig::default();
    config.diffuse.capacity = 8;
    let mut sim = FluidSim::new(config).unwrap();

    // Thirty sparse, fast particles all qualify as spray sources every step
    for i in 0..30 {
        let x = 0.05 + 0.03 * i as f32;
        sim.spawn(Vec3::new(x.min(0.95), 0.8, 0.5), Vec3::new(0.0, -4.0, 0.0));
    }

    for _ in 0..5 {
        sim.advance(DT);
        let n = sim.diffuse_particles().len();
        assert!(n <= 8, "diffuse buffer grew to {} past capacity", n);
    }
    assert!(!sim.diffuse_particles().is_empty());
}

#[test]
fn no_expired_particles_survive_the_sweep() {
    let mut sim = FluidSim::new(SimulationConfig::default()).unwrap();
    sim.spawn(Vec3::new(0.5, 0.7, 0.5), Vec3::new(0.0, -4.0, 0.0));

    // Long enough for early spawns to expire and be swept
    for _ in 0..120 {
        sim.advance(DT);
        for d in sim.diffuse_particles() {
            assert!(d.time_to_live > 0.0, "expired {:?} survived the sweep", d.kind);
        }
    }
}
