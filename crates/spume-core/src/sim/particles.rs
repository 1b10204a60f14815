use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A primary fluid particle.
///
/// `position` is the predicted position the constraint solver works on;
/// `old_position` is the committed position from the previous step. The
/// trailing fields are per-step solver scratch kept here so the diffuse
/// classifier can read them after the solve.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub old_position: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    pub inverse_mass: f32, // 0 marks an immovable boundary particle
    pub phase: i32,
    pub density: f32,
    pub lambda: f32,
    pub curl: Vec3,
    pub neighbor_count: u32,
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self::with_phase(position, velocity, 1.0, 0)
    }

    pub fn with_phase(position: Vec3, velocity: Vec3, inverse_mass: f32, phase: i32) -> Self {
        Self {
            old_position: position,
            position,
            velocity,
            inverse_mass,
            phase,
            density: 0.0,
            lambda: 0.0,
            curl: Vec3::ZERO,
            neighbor_count: 0,
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.inverse_mass == 0.0
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn kinetic_energy(&self, mass: f32) -> f32 {
        0.5 * mass * self.velocity.length_squared()
    }
}

/// Aggregate statistics for metrics collection
#[derive(Debug, Clone, Default)]
pub struct FluidStats {
    pub particle_count: u32,
    pub mean_speed: f32,
    pub max_speed: f32,
    pub mean_density: f32,
    pub kinetic_energy: f32,
}

/// Fixed-capacity store for the primary particle set.
///
/// The store is owned exclusively by the driver; spawning past capacity is
/// a silent no-op so a saturated scene degrades instead of failing.
pub struct ParticleStore {
    pub particles: Vec<Particle>,
    capacity: usize,
    pub stats: FluidStats,
    saturation_logged: bool,
}

impl ParticleStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity.min(65_536)),
            capacity,
            stats: FluidStats::default(),
            saturation_logged: false,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn spawn(&mut self, position: Vec3, velocity: Vec3) {
        self.spawn_with(Particle::new(position, velocity));
    }

    pub fn spawn_with(&mut self, particle: Particle) {
        if self.particles.len() >= self.capacity {
            if !self.saturation_logged {
                log::warn!("particle store saturated at {}; further spawns dropped", self.capacity);
                self.saturation_logged = true;
            }
            return;
        }
        self.particles.push(particle);
    }

    /// Seed a jittered lattice of fluid particles filling `min..max`.
    pub fn seed_block(&mut self, min: Vec3, max: Vec3, spacing: f32, jitter: f32, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let amplitude = spacing * jitter;

        let mut y = min.y;
        while y <= max.y {
            let mut x = min.x;
            while x <= max.x {
                let mut z = min.z;
                while z <= max.z {
                    let offset = if amplitude > 0.0 {
                        Vec3::new(
                            rng.gen_range(-amplitude..amplitude),
                            rng.gen_range(-amplitude..amplitude),
                            rng.gen_range(-amplitude..amplitude),
                        )
                    } else {
                        Vec3::ZERO
                    };
                    self.spawn(Vec3::new(x, y, z) + offset, Vec3::ZERO);
                    z += spacing;
                }
                x += spacing;
            }
            y += spacing;
        }
    }

    pub fn update_stats(&mut self, particle_mass: f32) {
        if self.particles.is_empty() {
            self.stats = FluidStats::default();
            return;
        }

        let count = self.particles.len() as f32;
        let mut speed_sum = 0.0;
        let mut max_speed: f32 = 0.0;
        let mut density_sum = 0.0;
        let mut energy = 0.0;

        for p in &self.particles {
            let speed = p.speed();
            speed_sum += speed;
            max_speed = max_speed.max(speed);
            density_sum += p.density;
            energy += p.kinetic_energy(particle_mass);
        }

        self.stats = FluidStats {
            particle_count: self.particles.len() as u32,
            mean_speed: speed_sum / count,
            max_speed,
            mean_density: density_sum / count,
            kinetic_energy: energy,
        };
    }
}
