use csv::Writer;
use spume_core::sim::{DiffuseCounts, FluidStats};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Metrics writer for CSV output and performance logging
pub struct MetricsWriter {
    csv_writer: Writer<File>,
    step_count: u32,
}

impl MetricsWriter {
    pub fn new(output_dir: &Path) -> Result<Self, anyhow::Error> {
        let csv_path = output_dir.join("metrics.csv");
        let file = File::create(csv_path)?;

        let mut csv_writer = Writer::from_writer(file);
        csv_writer.write_record([
            "step",
            "particles",
            "mean_speed",
            "max_speed",
            "mean_density",
            "kinetic_energy",
            "spray",
            "foam",
            "bubble",
            "wall_time_ms",
        ])?;

        Ok(Self {
            csv_writer,
            step_count: 0,
        })
    }

    /// Write metrics for a single simulation step
    pub fn write_step(
        &mut self,
        step: u32,
        fluid: &FluidStats,
        diffuse: DiffuseCounts,
        step_time: Duration,
    ) -> Result<(), anyhow::Error> {
        let wall_time_ms = step_time.as_secs_f64() * 1000.0;

        self.csv_writer.write_record(&[
            step.to_string(),
            fluid.particle_count.to_string(),
            fluid.mean_speed.to_string(),
            fluid.max_speed.to_string(),
            fluid.mean_density.to_string(),
            fluid.kinetic_energy.to_string(),
            diffuse.spray.to_string(),
            diffuse.foam.to_string(),
            diffuse.bubble.to_string(),
            wall_time_ms.to_string(),
        ])?;

        self.csv_writer.flush()?;
        self.step_count += 1;
        Ok(())
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }
}
