//! Diffuse particle synthesis.
//!
//! Classifies primary particles whose kinetic state warrants a secondary
//! visual effect and manages the resulting short-lived spray, foam, and
//! bubble particles. Diffuse particles never participate in the
//! incompressibility solve; they are advected with cheap per-kind motion
//! models and culled when their lifetime runs out.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use spume_params::{DiffuseConfig, SimulationConfig};

use super::grid::SpatialGrid;
use super::kernels::poly6;
use super::particles::Particle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffuseKind {
    Spray,
    Foam,
    Bubble,
}

/// Shared payload with a kind tag; the kind selects the integration model.
#[derive(Debug, Clone, Copy)]
pub struct DiffuseParticle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub time_to_live: f32,
    pub kind: DiffuseKind,
}

impl DiffuseParticle {
    pub fn is_expired(&self) -> bool {
        self.time_to_live <= 0.0
    }
}

/// Live diffuse particle counts by kind, for metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffuseCounts {
    pub spray: u32,
    pub foam: u32,
    pub bubble: u32,
}

/// Kernel-weighted fluid velocity around a point, with the summed kernel
/// weight and the raw support count used for surface checks.
fn sample_fluid(
    position: Vec3,
    primaries: &[Particle],
    grid: &SpatialGrid,
    h: f32,
    scratch: &mut Vec<usize>,
) -> (Vec3, f32, u32) {
    grid.gather(position, scratch);
    let h_sq = h * h;

    let mut velocity = Vec3::ZERO;
    let mut weight = 0.0;
    let mut support = 0u32;
    for &j in scratch.iter() {
        let p = &primaries[j];
        if p.phase != 0 {
            continue;
        }
        let r_sq = (position - p.position).length_squared();
        if r_sq >= h_sq {
            continue;
        }
        let w = poly6(r_sq, h);
        velocity += p.velocity * w;
        weight += w;
        support += 1;
    }

    if weight > 1e-9 {
        (velocity / weight, weight, support)
    } else {
        (Vec3::ZERO, 0.0, support)
    }
}

fn draw_lifetime(rng: &mut ChaCha8Rng, range: [f32; 2]) -> f32 {
    if range[1] > range[0] {
        rng.gen_range(range[0]..range[1])
    } else {
        range[0]
    }
}

pub struct DiffuseSolver {
    config: DiffuseConfig,
    rest_density: f32,
    particle_mass: f32,
    interaction_radius: f32,
    gravity: Vec3,
    particles: Vec<DiffuseParticle>,
    rng: ChaCha8Rng,
    saturation_logged: bool,
}

impl DiffuseSolver {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.diffuse.clone(),
            rest_density: config.fluid.rest_density,
            particle_mass: config.fluid.particle_mass,
            interaction_radius: config.fluid.interaction_radius,
            gravity: Vec3::from_array(config.world.gravity),
            particles: Vec::with_capacity(config.diffuse.capacity as usize),
            rng: ChaCha8Rng::seed_from_u64(config.world.seed),
            saturation_logged: false,
        }
    }

    pub fn particles(&self) -> &[DiffuseParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn counts(&self) -> DiffuseCounts {
        let mut counts = DiffuseCounts::default();
        for d in &self.particles {
            match d.kind {
                DiffuseKind::Spray => counts.spray += 1,
                DiffuseKind::Foam => counts.foam += 1,
                DiffuseKind::Bubble => counts.bubble += 1,
            }
        }
        counts
    }

    /// Advance the diffuse set against the finalized primary state: advect
    /// existing particles, classify new sources, and sweep out expired ones.
    pub fn update(&mut self, primaries: &[Particle], grid: &SpatialGrid, dt: f32) {
        self.advect(primaries, grid, dt);

        for p in primaries {
            if let Some(kind) = self.classify(p) {
                self.try_spawn(p, kind);
            }
        }

        self.particles.retain(|d| !d.is_expired());
    }

    fn advect(&mut self, primaries: &[Particle], grid: &SpatialGrid, dt: f32) {
        let h = self.interaction_radius;
        let up = -self.gravity.normalize_or_zero();
        let gravity = self.gravity;
        let mut scratch = Vec::new();

        for i in 0..self.particles.len() {
            let (position, kind) = {
                let d = &self.particles[i];
                (d.position, d.kind)
            };
            let (fluid_velocity, weight, support) =
                sample_fluid(position, primaries, grid, h, &mut scratch);

            // A bubble surfacing out of the fluid becomes foam with a fresh
            // lifetime instead of dying submerged.
            let converts = kind == DiffuseKind::Bubble && support < self.config.surface_neighbors;
            let foam_ttl = if converts {
                Some(draw_lifetime(&mut self.rng, self.config.foam_lifetime))
            } else {
                None
            };

            let blend = (self.config.foam_decay * dt).min(1.0);
            let d = &mut self.particles[i];
            match kind {
                DiffuseKind::Spray => {
                    // Ballistic with air drag
                    d.velocity += gravity * dt;
                    d.velocity /= 1.0 + self.config.spray_drag * dt;
                }
                DiffuseKind::Foam => {
                    // Carried by the surrounding fluid
                    if weight > 0.0 {
                        d.velocity = d.velocity.lerp(fluid_velocity, blend);
                    }
                }
                DiffuseKind::Bubble => {
                    // Buoyant rise modulated by the carrying fluid
                    d.velocity += up * self.config.bubble_buoyancy * dt;
                    if weight > 0.0 {
                        d.velocity = d.velocity.lerp(fluid_velocity, blend * 0.5);
                    }
                }
            }
            d.position += d.velocity * dt;

            if let Some(ttl) = foam_ttl {
                d.kind = DiffuseKind::Foam;
                d.time_to_live = ttl;
            } else {
                d.time_to_live -= dt;
            }
        }
    }

    fn classify(&self, p: &Particle) -> Option<DiffuseKind> {
        if p.is_boundary() || p.phase != 0 {
            return None;
        }

        let near_surface = p.neighbor_count < self.config.surface_neighbors;
        let energy = p.kinetic_energy(self.particle_mass);

        if near_surface && energy >= self.config.spray_energy {
            return Some(DiffuseKind::Spray);
        }
        if near_surface
            && energy >= self.config.foam_energy
            && p.curl.length() >= self.config.foam_curl
        {
            return Some(DiffuseKind::Foam);
        }
        // Trapped-air signature: well supported but locally under-dense
        if !near_surface && p.density / self.rest_density <= self.config.trapped_air_ratio {
            return Some(DiffuseKind::Bubble);
        }
        None
    }

    fn try_spawn(&mut self, source: &Particle, kind: DiffuseKind) {
        if self.particles.len() >= self.config.capacity as usize {
            if !self.saturation_logged {
                log::warn!(
                    "diffuse buffer saturated at {}; spawn attempts dropped",
                    self.config.capacity
                );
                self.saturation_logged = true;
            }
            return;
        }

        let range = match kind {
            DiffuseKind::Spray => self.config.spray_lifetime,
            DiffuseKind::Foam => self.config.foam_lifetime,
            DiffuseKind::Bubble => self.config.bubble_lifetime,
        };
        self.particles.push(DiffuseParticle {
            position: source.position,
            velocity: source.velocity,
            time_to_live: draw_lifetime(&mut self.rng, range),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spume_params::SimulationConfig;

    fn solver() -> (DiffuseSolver, SpatialGrid) {
        let config = SimulationConfig::default();
        let grid = SpatialGrid::new(
            Vec3::from_array(config.container.min),
            Vec3::from_array(config.container.max),
            config.fluid.cell_size,
        );
        (DiffuseSolver::new(&config), grid)
    }

    #[test]
    fn lifetimes_strictly_decrease() {
        let (mut solver, grid) = solver();
        solver.particles.push(DiffuseParticle {
            position: Vec3::splat(0.5),
            velocity: Vec3::ZERO,
            time_to_live: 1.0,
            kind: DiffuseKind::Spray,
        });
        solver.particles.push(DiffuseParticle {
            position: Vec3::splat(0.5),
            velocity: Vec3::ZERO,
            time_to_live: 0.5,
            kind: DiffuseKind::Foam,
        });

        let dt = 0.1;
        let mut previous: Vec<f32> = solver.particles.iter().map(|d| d.time_to_live).collect();
        for _ in 0..4 {
            solver.update(&[], &grid, dt);
            for (d, old) in solver.particles.iter().zip(&previous) {
                assert!(d.time_to_live < *old);
            }
            previous = solver.particles.iter().map(|d| d.time_to_live).collect();
        }
    }

    #[test]
    fn expired_particles_are_swept() {
        let (mut solver, grid) = solver();
        solver.particles.push(DiffuseParticle {
            position: Vec3::splat(0.5),
            velocity: Vec3::ZERO,
            time_to_live: 0.05,
            kind: DiffuseKind::Foam,
        });

        solver.update(&[], &grid, 0.1);
        assert!(solver.is_empty());
    }

    #[test]
    fn spawn_is_skipped_at_capacity() {
        let config = SimulationConfig {
            diffuse: spume_params::DiffuseConfig {
                capacity: 4,
                ..SimulationConfig::default().diffuse
            },
            ..SimulationConfig::default()
        };
        let mut solver = DiffuseSolver::new(&config);
        let source = Particle::new(Vec3::splat(0.5), Vec3::new(0.0, -5.0, 0.0));

        for _ in 0..10 {
            solver.try_spawn(&source, DiffuseKind::Spray);
        }
        assert_eq!(solver.len(), 4);
    }

    #[test]
    fn surfacing_bubble_becomes_foam() {
        let (mut solver, grid) = solver();
        solver.particles.push(DiffuseParticle {
            position: Vec3::splat(0.5),
            velocity: Vec3::ZERO,
            time_to_live: 2.0,
            kind: DiffuseKind::Bubble,
        });

        // No primary particles around: the bubble is at the free surface
        solver.update(&[], &grid, 0.01);
        assert_eq!(solver.particles()[0].kind, DiffuseKind::Foam);
    }
}
