//! Shared parameter types for the spume fluid simulator
//!
//! This crate contains all parameter structures used by both the solver core
//! and the headless runner to ensure consistency and prevent parameter drift.

/// World / stepping configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    pub steps: u32,
    pub dt: f32,
    pub seed: u64,
    pub gravity: [f32; 3],
}

/// Fluid solver parameters
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FluidConfig {
    pub rest_density: f32,       // Target density rho_0
    pub interaction_radius: f32, // Smoothing kernel support h
    pub cell_size: f32,          // Spatial index cell edge, must be >= 2h
    pub solver_iterations: u32,  // Fixed constraint projection count
    pub particle_mass: f32,
    pub max_particles: u32,
    pub relaxation: f32,         // Epsilon added to the gradient-norm denominator
    pub s_corr_strength: f32,    // Tensile instability correction magnitude
    pub s_corr_radius: f32,      // Reference distance for the correction, fraction of h
    pub vorticity_eps: f32,      // Vorticity confinement strength
    pub xsph_viscosity: f32,     // XSPH velocity smoothing coefficient
    pub velocity_damping: f32,   // Global per-step damping factor
    pub min_neighbors: u32,      // Below this the density constraint is skipped
}

/// Container bounds
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerConfig {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub restitution: f32, // Velocity rebound on wall contact, 0 = slide
}

/// Diffuse particle generator configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffuseConfig {
    pub capacity: u32,           // Hard cap on live diffuse particles
    pub surface_neighbors: u32,  // Neighbor count below which a particle is near-surface
    pub spray_energy: f32,       // Kinetic energy threshold for spray
    pub foam_energy: f32,        // Kinetic energy threshold for foam
    pub foam_curl: f32,          // Curl magnitude threshold for foam
    pub trapped_air_ratio: f32,  // Density ratio below which a submerged particle bubbles
    pub spray_lifetime: [f32; 2],
    pub foam_lifetime: [f32; 2],
    pub bubble_lifetime: [f32; 2],
    pub spray_drag: f32,         // Air drag on ballistic spray
    pub foam_decay: f32,         // Rate at which foam locks onto the fluid velocity
    pub bubble_buoyancy: f32,    // Upward drift acceleration for bubbles
}

/// Initial fluid volume seeded by the runner
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneConfig {
    pub fill_min: [f32; 3],
    pub fill_max: [f32; 3],
    pub spacing: f32,
    pub jitter: f32, // Fraction of spacing used for random offset
}

/// Complete simulation configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub fluid: FluidConfig,
    pub container: ContainerConfig,
    pub diffuse: DiffuseConfig,
    pub scene: SceneConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig {
                steps: 600,
                dt: 1.0 / 60.0,
                seed: 1337,
                gravity: [0.0, -9.81, 0.0],
            },
            fluid: FluidConfig {
                rest_density: 1000.0,
                interaction_radius: 0.1,
                cell_size: 0.2,
                solver_iterations: 3,
                particle_mass: 0.125,
                max_particles: 100_000,
                relaxation: 100.0,
                s_corr_strength: 0.001,
                s_corr_radius: 0.2,
                vorticity_eps: 0.01,
                xsph_viscosity: 0.01,
                velocity_damping: 0.998,
                min_neighbors: 4,
            },
            container: ContainerConfig {
                min: [0.0, 0.0, 0.0],
                max: [1.0, 1.0, 1.0],
                restitution: 0.2,
            },
            diffuse: DiffuseConfig {
                capacity: 4096,
                surface_neighbors: 20,
                spray_energy: 0.5,
                foam_energy: 0.05,
                foam_curl: 2.0,
                trapped_air_ratio: 0.85,
                spray_lifetime: [0.4, 1.2],
                foam_lifetime: [2.0, 5.0],
                bubble_lifetime: [1.0, 3.0],
                spray_drag: 1.5,
                foam_decay: 4.0,
                bubble_buoyancy: 3.0,
            },
            scene: SceneConfig {
                fill_min: [0.05, 0.05, 0.05],
                fill_max: [0.95, 0.45, 0.95],
                spacing: 0.05,
                jitter: 0.2,
            },
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration before the simulator is allowed to run.
    ///
    /// Every rejected case here must prevent construction entirely; there is
    /// no partially-initialized state.
    pub fn validate(&self) -> Result<(), String> {
        if self.world.dt <= 0.0 {
            return Err(format!("time step must be positive, got {}", self.world.dt));
        }
        if self.fluid.rest_density <= 0.0 {
            return Err(format!(
                "rest density must be positive, got {}",
                self.fluid.rest_density
            ));
        }
        if self.fluid.interaction_radius <= 0.0 {
            return Err(format!(
                "interaction radius must be positive, got {}",
                self.fluid.interaction_radius
            ));
        }
        if self.fluid.cell_size <= 0.0 {
            return Err(format!("cell size must be positive, got {}", self.fluid.cell_size));
        }
        // Index correctness precondition: a neighbor within the interaction
        // radius must always land in the 27-cell stencil.
        if self.fluid.interaction_radius > self.fluid.cell_size / 2.0 {
            return Err(format!(
                "interaction radius {} exceeds half the cell size {}",
                self.fluid.interaction_radius, self.fluid.cell_size
            ));
        }
        if self.fluid.solver_iterations == 0 {
            return Err("solver iteration count must be at least 1".to_string());
        }
        if self.fluid.particle_mass <= 0.0 {
            return Err(format!(
                "particle mass must be positive, got {}",
                self.fluid.particle_mass
            ));
        }
        if self.fluid.max_particles == 0 {
            return Err("max particle count must be at least 1".to_string());
        }
        for axis in 0..3 {
            if self.container.min[axis] >= self.container.max[axis] {
                return Err(format!(
                    "container min {:?} must be strictly below max {:?}",
                    self.container.min, self.container.max
                ));
            }
        }
        if self.diffuse.capacity == 0 {
            return Err("diffuse particle capacity must be at least 1".to_string());
        }
        for (name, range) in [
            ("spray", self.diffuse.spray_lifetime),
            ("foam", self.diffuse.foam_lifetime),
            ("bubble", self.diffuse.bubble_lifetime),
        ] {
            if range[0] <= 0.0 || range[1] < range[0] {
                return Err(format!("{} lifetime range {:?} is not a valid range", name, range));
            }
        }
        if self.scene.spacing <= 0.0 {
            return Err(format!(
                "scene particle spacing must be positive, got {}",
                self.scene.spacing
            ));
        }
        Ok(())
    }

    /// Log the parameters that most influence solver behavior.
    pub fn log_summary(&self) {
        log::info!(
            "fluid: rest density {}, radius {}, cell {}, {} iterations",
            self.fluid.rest_density,
            self.fluid.interaction_radius,
            self.fluid.cell_size,
            self.fluid.solver_iterations
        );
        log::info!(
            "diffuse: capacity {}, surface cutoff {} neighbors",
            self.diffuse.capacity,
            self.diffuse.surface_neighbors
        );
    }
}
