use spume_core::sim::FluidSim;
use spume_core::SimulationConfig;

#[test]
fn default_config_is_runnable() {
    assert!(FluidSim::new(SimulationConfig::default()).is_ok());
}

#[test]
fn radius_cell_precondition_is_enforced() {
    let mut config = SimulationConfig::default();
    config.fluid.interaction_radius = 0.15; // cell size 0.2 allows at most 0.1
    let err = FluidSim::new(config).err().unwrap();
    assert!(err.contains("cell size"), "unexpected error: {}", err);
}

#[test]
fn non_positive_rest_density_is_rejected() {
    let mut config = SimulationConfig::default();
    config.fluid.rest_density = 0.0;
    let err = FluidSim::new(config).err().unwrap();
    assert!(err.contains("rest density"), "unexpected error: {}", err);
}

#[test]
fn zero_iteration_count_is_rejected() {
    let mut config = SimulationConfig::default();
    config.fluid.solver_iterations = 0;
    assert!(FluidSim::new(config).is_err());
}

#[test]
fn non_positive_dt_is_rejected() {
    let mut config = SimulationConfig::default();
    config.world.dt = 0.0;
    assert!(FluidSim::new(config).is_err());
}

#[test]
fn inverted_container_is_rejected() {
    let mut config = SimulationConfig::default();
    config.container.min = [2.0, 0.0, 0.0];
    assert!(FluidSim::new(config).is_err());
}

#[test]
fn zero_diffuse_capacity_is_rejected() {
    let mut config = SimulationConfig::default();
    config.diffuse.capacity = 0;
    assert!(FluidSim::new(config).is_err());
}

#[test]
fn bad_lifetime_range_is_rejected() {
    let mut config = SimulationConfig::default();
    config.diffuse.spray_lifetime = [1.0, 0.5];
    assert!(FluidSim::new(config).is_err());
}
