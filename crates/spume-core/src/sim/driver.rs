//! Simulation driver.
//!
//! Owns the particle store, the spatial index, the constraint solver, and
//! the diffuse buffer. `advance` is the only mutating entry point; the
//! snapshot accessors return views that stay valid until the next call.

use glam::Vec3;

use spume_params::SimulationConfig;

use super::diffuse::{DiffuseCounts, DiffuseParticle, DiffuseSolver};
use super::grid::SpatialGrid;
use super::particles::{FluidStats, Particle, ParticleStore};
use super::solver::PbfSolver;

pub struct FluidSim {
    config: SimulationConfig,
    store: ParticleStore,
    grid: SpatialGrid,
    solver: PbfSolver,
    diffuse: DiffuseSolver,
    positions_cache: Vec<Vec3>,
    pending_wall_offset: Vec3,
}

impl FluidSim {
    /// Build a simulator from a validated configuration. A rejected
    /// configuration leaves no partially-initialized state behind.
    pub fn new(config: SimulationConfig) -> Result<Self, String> {
        config.validate()?;

        let grid = SpatialGrid::new(
            Vec3::from_array(config.container.min),
            Vec3::from_array(config.container.max),
            config.fluid.cell_size,
        );

        Ok(Self {
            store: ParticleStore::new(config.fluid.max_particles as usize),
            grid,
            solver: PbfSolver::new(&config),
            diffuse: DiffuseSolver::new(&config),
            positions_cache: Vec::new(),
            pending_wall_offset: Vec3::ZERO,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Seed the configured scene volume with fluid particles.
    pub fn seed_scene(&mut self) {
        let scene = &self.config.scene;
        self.store.seed_block(
            Vec3::from_array(scene.fill_min),
            Vec3::from_array(scene.fill_max),
            scene.spacing,
            scene.jitter,
            self.config.world.seed,
        );
        log::info!("seeded {} fluid particles", self.store.len());
    }

    pub fn spawn(&mut self, position: Vec3, velocity: Vec3) {
        self.store.spawn(position, velocity);
    }

    pub fn spawn_with(&mut self, particle: Particle) {
        self.store.spawn_with(particle);
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    /// Translate all container walls by `offset` for the next step only.
    pub fn nudge_walls(&mut self, offset: Vec3) {
        self.pending_wall_offset += offset;
    }

    /// Advance the simulation by one step. Runs the full pipeline: predict,
    /// rebuild the index, iterate constraint projection, finalize
    /// velocities, then update the diffuse set against the new state.
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            log::warn!("ignoring advance with non-positive dt {}", dt);
            return;
        }

        let wall_offset = std::mem::take(&mut self.pending_wall_offset);
        let particles = &mut self.store.particles;

        self.solver.predict(particles, dt);
        self.grid.rebuild(particles);
        self.solver.project(particles, &self.grid, wall_offset);
        self.solver.finalize(particles, &self.grid, wall_offset, dt);

        self.diffuse.update(particles, &self.grid, dt);

        self.store.update_stats(self.config.fluid.particle_mass);
        self.positions_cache.clear();
        self.positions_cache
            .extend(self.store.particles.iter().map(|p| p.position));
    }

    /// Primary particle positions, index-stable within a step.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions_cache
    }

    pub fn particles(&self) -> &[Particle] {
        &self.store.particles
    }

    pub fn diffuse_particles(&self) -> &[DiffuseParticle] {
        self.diffuse.particles()
    }

    pub fn diffuse_counts(&self) -> DiffuseCounts {
        self.diffuse.counts()
    }

    pub fn stats(&self) -> &FluidStats {
        &self.store.stats
    }
}
