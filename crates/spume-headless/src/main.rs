mod metrics;
mod snapshots;

use clap::Parser;
use glam::Vec3;
use metrics::MetricsWriter;
use snapshots::SnapshotWriter;
use spume_core::sim::FluidSim;
use spume_core::SimulationConfig;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "spume-headless")]
#[command(about = "Headless CLI runner for spume fluid experiments")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output directory for results
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Override the configured step count
    #[arg(long)]
    steps: Option<u32>,

    /// Nudge the container walls every N steps ("shake the tank")
    #[arg(long, value_name = "N")]
    shake_every: Option<u32>,

    /// Enable strict mode (fail on any errors)
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let cli = Cli::parse();

    // Load configuration
    println!("Loading configuration from {}", cli.config.display());
    let config: SimulationConfig = serde_yaml::from_str(&std::fs::read_to_string(&cli.config)?)?;

    if let Err(reason) = config.validate() {
        anyhow::bail!("invalid configuration: {}", reason);
    }
    config.log_summary();

    // Create output directory
    std::fs::create_dir_all(&cli.out)?;

    let steps = cli.steps.unwrap_or(config.world.steps);
    let dt = config.world.dt;

    let mut sim = FluidSim::new(config).map_err(|reason| anyhow::anyhow!(reason))?;
    println!("Seeding fluid volume...");
    sim.seed_scene();
    if sim.particle_count() == 0 {
        anyhow::bail!("scene seeding produced no particles; check the scene block");
    }

    let mut metrics_writer = MetricsWriter::new(&cli.out)?;
    let snapshot_writer = SnapshotWriter::new(&cli.out)?;
    let snapshot_steps = [0, steps / 2, steps];

    // Main simulation loop
    println!("Starting simulation for {} steps...", steps);
    let start_time = Instant::now();

    for step in 0..=steps {
        let step_start = Instant::now();

        if let Some(every) = cli.shake_every {
            if every > 0 && step > 0 && step % every == 0 {
                // Alternate the shake direction so the tank oscillates
                let direction = if (step / every) % 2 == 0 { 1.0 } else { -1.0 };
                sim.nudge_walls(Vec3::new(direction * 0.02, 0.0, 0.0));
            }
        }

        sim.advance(dt);

        // Metrics and logging every 20 steps
        if step % 20 == 0 {
            let step_time = step_start.elapsed();
            let diffuse = sim.diffuse_counts();
            metrics_writer.write_step(step, sim.stats(), diffuse, step_time)?;

            println!(
                "Step {}: particles={}, mean_speed={:.3}, diffuse={}/{}/{}, time={:?}",
                step,
                sim.stats().particle_count,
                sim.stats().mean_speed,
                diffuse.spray,
                diffuse.foam,
                diffuse.bubble,
                step_time
            );
        }

        if snapshot_steps.contains(&step) {
            snapshot_writer.write_particles_snapshot(step, &sim)?;
            snapshot_writer.write_diffuse_snapshot(step, &sim)?;
            println!("Snapshot written for step {}", step);
        }

        // A diverged solve poisons every later step; stop early
        if !sim.stats().mean_speed.is_finite() {
            if cli.strict {
                anyhow::bail!("simulation diverged at step {}", step);
            }
            println!("Warning: simulation diverged at step {}", step);
            break;
        }
    }

    let total_time = start_time.elapsed();
    println!(
        "Simulation completed in {:?} ({} metric rows)",
        total_time,
        metrics_writer.step_count()
    );
    println!("Results written to {}", cli.out.display());

    Ok(())
}
