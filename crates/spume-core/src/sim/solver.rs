//! Position-based incompressibility solver.
//!
//! Each step predicts positions from velocities, then runs a fixed number of
//! constraint projection iterations that nudge predicted positions toward
//! the rest density, and finally derives velocities from the position delta.
//! Velocity post-processing (vorticity confinement, XSPH viscosity) runs
//! after finalization, before the diffuse generator.
//!
//! Every pass is a read phase over a snapshot followed by a write phase, so
//! a particle only ever observes fully-committed neighbor state from the
//! previous pass.

use glam::Vec3;
use rayon::prelude::*;

use spume_params::{ContainerConfig, FluidConfig, SimulationConfig};

use super::grid::SpatialGrid;
use super::kernels::{poly6, spiky_gradient};
use super::particles::Particle;

/// Phase filter: two particles sharing the same non-zero phase do not
/// constrain each other (rigid-cluster exemption). Phase 0 is ordinary
/// fluid and always interacts.
#[inline]
fn constrains(phase_a: i32, phase_b: i32) -> bool {
    phase_a == 0 || phase_a != phase_b
}

pub struct PbfSolver {
    fluid: FluidConfig,
    container: ContainerConfig,
    gravity: Vec3,
}

impl PbfSolver {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            fluid: config.fluid.clone(),
            container: config.container.clone(),
            gravity: Vec3::from_array(config.world.gravity),
        }
    }

    fn walls(&self, wall_offset: Vec3) -> (Vec3, Vec3) {
        (
            Vec3::from_array(self.container.min) + wall_offset,
            Vec3::from_array(self.container.max) + wall_offset,
        )
    }

    /// Integrate external acceleration and predict positions.
    /// Immovable particles keep their position.
    pub fn predict(&self, particles: &mut [Particle], dt: f32) {
        let gravity = self.gravity;
        particles.par_iter_mut().for_each(|p| {
            if p.inverse_mass == 0.0 {
                return;
            }
            p.velocity += gravity * dt;
            p.position = p.old_position + p.velocity * dt;
        });
    }

    /// Run the fixed count of constraint projection iterations against the
    /// spatial index, clamping against the (possibly offset) container walls
    /// after each iteration.
    pub fn project(&self, particles: &mut [Particle], grid: &SpatialGrid, wall_offset: Vec3) {
        let h = self.fluid.interaction_radius;
        let h_sq = h * h;
        let rest = self.fluid.rest_density;
        let mass = self.fluid.particle_mass;
        let relaxation = self.fluid.relaxation;
        let min_neighbors = self.fluid.min_neighbors;
        let s_corr_k = self.fluid.s_corr_strength;
        let w_ref = poly6((self.fluid.s_corr_radius * h).powi(2), h);
        let (wall_min, wall_max) = self.walls(wall_offset);

        for _ in 0..self.fluid.solver_iterations {
            // Density and Lagrange multiplier pass
            let snapshot: &[Particle] = particles;
            let updates: Vec<(f32, f32, u32)> = snapshot
                .par_iter()
                .enumerate()
                .map_init(Vec::new, |scratch, (i, p_i)| {
                    grid.gather(p_i.position, scratch);

                    let mut density = 0.0;
                    let mut grad_i = Vec3::ZERO;
                    let mut sum_grad_sq = 0.0;
                    let mut neighbors = 0u32;

                    for &j in scratch.iter() {
                        let p_j = &snapshot[j];
                        if !constrains(p_i.phase, p_j.phase) {
                            continue;
                        }
                        let r = p_i.position - p_j.position;
                        let r_sq = r.length_squared();
                        if r_sq >= h_sq {
                            continue;
                        }
                        density += mass * poly6(r_sq, h);
                        if j != i {
                            neighbors += 1;
                            let grad_j = spiky_gradient(r, h) / rest;
                            sum_grad_sq += grad_j.length_squared();
                            grad_i += grad_j;
                        }
                    }
                    sum_grad_sq += grad_i.length_squared();

                    // Sparse neighborhoods read as at-or-below rest density:
                    // no spurious repulsion at the free surface.
                    let constraint = density / rest - 1.0;
                    let lambda = if constraint > 0.0 && neighbors >= min_neighbors {
                        -constraint / (sum_grad_sq + relaxation)
                    } else {
                        0.0
                    };

                    (density, lambda, neighbors)
                })
                .collect();

            particles
                .par_iter_mut()
                .zip(updates)
                .for_each(|(p, (density, lambda, neighbors))| {
                    p.density = density;
                    p.lambda = lambda;
                    p.neighbor_count = neighbors;
                });

            // Position correction pass
            let snapshot: &[Particle] = particles;
            let deltas: Vec<Vec3> = snapshot
                .par_iter()
                .enumerate()
                .map_init(Vec::new, |scratch, (i, p_i)| {
                    if p_i.inverse_mass == 0.0 {
                        return Vec3::ZERO;
                    }
                    grid.gather(p_i.position, scratch);

                    let mut delta = Vec3::ZERO;
                    for &j in scratch.iter() {
                        if j == i {
                            continue;
                        }
                        let p_j = &snapshot[j];
                        if !constrains(p_i.phase, p_j.phase) {
                            continue;
                        }
                        let r = p_i.position - p_j.position;
                        let r_sq = r.length_squared();
                        if r_sq >= h_sq {
                            continue;
                        }
                        let s_corr = if w_ref > 1e-9 {
                            -s_corr_k * (poly6(r_sq, h) / w_ref).powi(4)
                        } else {
                            0.0
                        };
                        delta += (p_i.lambda + p_j.lambda + s_corr) * spiky_gradient(r, h);
                    }

                    delta / rest * p_i.inverse_mass
                })
                .collect();

            particles.par_iter_mut().zip(deltas).for_each(|(p, delta)| {
                if p.inverse_mass > 0.0 {
                    p.position = (p.position + delta).clamp(wall_min, wall_max);
                }
            });
        }
    }

    /// Derive velocities from the position delta, commit positions, then run
    /// the velocity post-processing passes.
    pub fn finalize(
        &self,
        particles: &mut [Particle],
        grid: &SpatialGrid,
        wall_offset: Vec3,
        dt: f32,
    ) {
        particles.par_iter_mut().for_each(|p| {
            if p.inverse_mass == 0.0 {
                p.velocity = Vec3::ZERO;
                p.old_position = p.position;
                return;
            }
            p.velocity = (p.position - p.old_position) / dt;
            p.old_position = p.position;
        });

        self.apply_vorticity_confinement(particles, grid, dt);
        self.apply_xsph_viscosity(particles, grid);
        self.apply_wall_response(particles, wall_offset);
    }

    /// Vorticity confinement: estimate the local curl, then push each
    /// particle along the restored rotational axis. The curl is kept on the
    /// particle for the diffuse classifier.
    fn apply_vorticity_confinement(&self, particles: &mut [Particle], grid: &SpatialGrid, dt: f32) {
        let h = self.fluid.interaction_radius;
        let h_sq = h * h;
        let eps = self.fluid.vorticity_eps;

        let snapshot: &[Particle] = particles;
        let curls: Vec<Vec3> = snapshot
            .par_iter()
            .enumerate()
            .map_init(Vec::new, |scratch, (i, p_i)| {
                if p_i.inverse_mass == 0.0 {
                    return Vec3::ZERO;
                }
                grid.gather(p_i.position, scratch);

                let mut omega = Vec3::ZERO;
                for &j in scratch.iter() {
                    if j == i {
                        continue;
                    }
                    let p_j = &snapshot[j];
                    if !constrains(p_i.phase, p_j.phase) {
                        continue;
                    }
                    let r = p_i.position - p_j.position;
                    if r.length_squared() >= h_sq {
                        continue;
                    }
                    omega += (p_j.velocity - p_i.velocity).cross(spiky_gradient(r, h));
                }
                omega
            })
            .collect();

        particles.par_iter_mut().zip(curls).for_each(|(p, omega)| {
            p.curl = omega;
        });

        if eps == 0.0 {
            return;
        }

        let snapshot: &[Particle] = particles;
        let forces: Vec<Vec3> = snapshot
            .par_iter()
            .enumerate()
            .map_init(Vec::new, |scratch, (i, p_i)| {
                let omega_len = p_i.curl.length();
                if p_i.inverse_mass == 0.0 || omega_len < 1e-6 {
                    return Vec3::ZERO;
                }
                grid.gather(p_i.position, scratch);

                let mut eta = Vec3::ZERO;
                for &j in scratch.iter() {
                    if j == i {
                        continue;
                    }
                    let p_j = &snapshot[j];
                    if !constrains(p_i.phase, p_j.phase) {
                        continue;
                    }
                    let r = p_i.position - p_j.position;
                    if r.length_squared() >= h_sq {
                        continue;
                    }
                    eta += spiky_gradient(r, h) * omega_len;
                }

                // Isolated particle or net-zero corrective direction
                if eta.length_squared() < 1e-12 {
                    return Vec3::ZERO;
                }
                eta.normalize().cross(p_i.curl) * eps
            })
            .collect();

        particles.par_iter_mut().zip(forces).for_each(|(p, force)| {
            p.velocity += force * dt;
        });
    }

    /// XSPH viscosity: blend each velocity toward the kernel-weighted
    /// neighborhood average.
    fn apply_xsph_viscosity(&self, particles: &mut [Particle], grid: &SpatialGrid) {
        let c = self.fluid.xsph_viscosity;
        if c == 0.0 {
            return;
        }
        let h = self.fluid.interaction_radius;
        let h_sq = h * h;

        let snapshot: &[Particle] = particles;
        let corrections: Vec<Vec3> = snapshot
            .par_iter()
            .enumerate()
            .map_init(Vec::new, |scratch, (i, p_i)| {
                if p_i.inverse_mass == 0.0 {
                    return Vec3::ZERO;
                }
                grid.gather(p_i.position, scratch);

                let mut correction = Vec3::ZERO;
                for &j in scratch.iter() {
                    if j == i {
                        continue;
                    }
                    let p_j = &snapshot[j];
                    if !constrains(p_i.phase, p_j.phase) {
                        continue;
                    }
                    let r = p_i.position - p_j.position;
                    let r_sq = r.length_squared();
                    if r_sq >= h_sq {
                        continue;
                    }
                    correction += (p_j.velocity - p_i.velocity) * poly6(r_sq, h);
                }
                correction * c
            })
            .collect();

        particles.par_iter_mut().zip(corrections).for_each(|(p, correction)| {
            p.velocity += correction;
        });
    }

    /// Reflect velocity components pointing into a wall the particle rests
    /// against, then apply the global damping factor.
    fn apply_wall_response(&self, particles: &mut [Particle], wall_offset: Vec3) {
        let (wall_min, wall_max) = self.walls(wall_offset);
        let restitution = self.container.restitution;
        let damping = self.fluid.velocity_damping;
        let margin = 1e-5;

        particles.par_iter_mut().for_each(|p| {
            if p.inverse_mass == 0.0 {
                return;
            }
            for axis in 0..3 {
                if p.position[axis] <= wall_min[axis] + margin && p.velocity[axis] < 0.0 {
                    p.velocity[axis] *= -restitution;
                } else if p.position[axis] >= wall_max[axis] - margin && p.velocity[axis] > 0.0 {
                    p.velocity[axis] *= -restitution;
                }
            }
            p.velocity *= damping;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_exclusion_rule() {
        // Fluid always interacts, including with itself
        assert!(constrains(0, 0));
        assert!(constrains(0, 3));
        assert!(constrains(3, 0));
        // Distinct rigid clusters interact, identical ones do not
        assert!(constrains(1, 2));
        assert!(!constrains(2, 2));
    }
}
