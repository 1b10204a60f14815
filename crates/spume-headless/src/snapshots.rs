use csv::Writer;
use spume_core::sim::{DiffuseKind, FluidSim};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Snapshot writer for particle and diffuse-particle state
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: &Path) -> Result<Self, anyhow::Error> {
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write primary particle state to CSV
    pub fn write_particles_snapshot(&self, step: u32, sim: &FluidSim) -> Result<(), anyhow::Error> {
        let filename = format!("particles_{:04}.csv", step);
        let file = File::create(self.output_dir.join(filename))?;
        let mut csv_writer = Writer::from_writer(file);

        csv_writer.write_record(["id", "x", "y", "z", "vx", "vy", "vz", "density", "phase"])?;
        for (i, p) in sim.particles().iter().enumerate() {
            csv_writer.write_record(&[
                i.to_string(),
                p.position.x.to_string(),
                p.position.y.to_string(),
                p.position.z.to_string(),
                p.velocity.x.to_string(),
                p.velocity.y.to_string(),
                p.velocity.z.to_string(),
                p.density.to_string(),
                p.phase.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the active diffuse particle set to CSV
    pub fn write_diffuse_snapshot(&self, step: u32, sim: &FluidSim) -> Result<(), anyhow::Error> {
        let filename = format!("diffuse_{:04}.csv", step);
        let file = File::create(self.output_dir.join(filename))?;
        let mut csv_writer = Writer::from_writer(file);

        csv_writer.write_record(["kind", "x", "y", "z", "vx", "vy", "vz", "ttl"])?;
        for d in sim.diffuse_particles() {
            let kind = match d.kind {
                DiffuseKind::Spray => "spray",
                DiffuseKind::Foam => "foam",
                DiffuseKind::Bubble => "bubble",
            };
            csv_writer.write_record(&[
                kind.to_string(),
                d.position.x.to_string(),
                d.position.y.to_string(),
                d.position.z.to_string(),
                d.velocity.x.to_string(),
                d.velocity.y.to_string(),
                d.velocity.z.to_string(),
                d.time_to_live.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
