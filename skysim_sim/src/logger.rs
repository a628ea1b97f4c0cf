// skysim_sim/src/logger.rs

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use skysim_core::algorithms::Algorithm;
use skysim_core::simulator::RunOutcome;
use skysim_core::types::{PhysicsState, SensorData};

/// On-disk session recorder: one directory per run with a metadata file,
/// a JSON-lines step stream and a JSON-lines event stream.
///
/// The format is a convenience for offline analysis, not a contract.
pub struct SessionLogger {
    directory: PathBuf,
    steps: BufWriter<File>,
    events: BufWriter<File>,
}

impl SessionLogger {
    pub fn new(
        root: &Path,
        scenario_name: &str,
        algorithm_name: &str,
    ) -> std::io::Result<Self> {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let directory = root.join(format!("session_{stamp}"));
        fs::create_dir_all(&directory)?;

        let meta = json!({
            "scenario": scenario_name,
            "algorithm": algorithm_name,
            "started_at": chrono::Utc::now().to_rfc3339(),
        });
        fs::write(
            directory.join("meta.json"),
            serde_json::to_string_pretty(&meta)?,
        )?;

        Ok(Self {
            steps: BufWriter::new(File::create(directory.join("steps.jsonl"))?),
            events: BufWriter::new(File::create(directory.join("events.jsonl"))?),
            directory,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn log_step(
        &mut self,
        timestamp: f64,
        state: &PhysicsState,
        sensors: &SensorData,
    ) -> std::io::Result<()> {
        let (roll, pitch, yaw) = state.euler_angles();
        let record = json!({
            "t": timestamp,
            "position": [state.position.x, state.position.y, state.position.z],
            "velocity": [state.velocity.x, state.velocity.y, state.velocity.z],
            "attitude": [roll, pitch, yaw],
            "gps": sensors.gps.as_ref().map(|fix| {
                [fix.position.x, fix.position.y, fix.position.z]
            }),
            "lidar_min": sensors.lidar.as_ref().and_then(|scan| {
                scan.ranges.iter().copied().reduce(f64::min)
            }),
        });
        writeln!(self.steps, "{record}")
    }

    pub fn log_event(&mut self, kind: &str, message: &str) -> std::io::Result<()> {
        let record = json!({
            "at": chrono::Utc::now().to_rfc3339(),
            "kind": kind,
            "message": message,
        });
        writeln!(self.events, "{record}")
    }

    /// Writes the run summary: outcome, the algorithm's final status map
    /// and its full control history.
    pub fn finish(
        &mut self,
        outcome: &RunOutcome,
        algorithm: &dyn Algorithm,
    ) -> std::io::Result<()> {
        let controls: Vec<_> = algorithm
            .outputs()
            .iter()
            .map(|c| json!([c.roll, c.pitch, c.yaw, c.thrust]))
            .collect();
        let summary = json!({
            "outcome": format!("{outcome:?}"),
            "success": outcome.is_success(),
            "steps": outcome.steps(),
            "collided": outcome.collided(),
            "algorithm_status": algorithm.status(),
            "controls": controls,
        });
        fs::write(
            self.directory.join("summary.json"),
            serde_json::to_string_pretty(&summary)?,
        )?;
        self.steps.flush()?;
        self.events.flush()
    }
}
