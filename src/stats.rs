//! Run statistics written at the end of a session.
//!
//! The file holds three lines: total inference time in seconds, frames per
//! second, and model load time in seconds.

use crate::{Error, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Timing summary of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    /// Wall time spent in the frame loop, rounded to 0.1 s
    pub inference_secs: f64,
    /// Frames processed per second
    pub fps: f64,
    /// Wall time spent loading all models
    pub load_secs: f64,
}

impl RunStats {
    /// Summarize a run of `frames` frames
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Frame counts stay far below 2^52
    pub fn new(frames: u64, inference: Duration, load: Duration) -> Self {
        let inference_secs = (inference.as_secs_f64() * 10.0).round() / 10.0;
        let fps = if inference_secs > 0.0 {
            frames as f64 / inference_secs
        } else {
            0.0
        };

        Self {
            inference_secs,
            fps,
            load_secs: load.as_secs_f64(),
        }
    }

    /// Render the three-line file body
    #[must_use]
    pub fn to_file_contents(&self) -> String {
        let mut body = String::new();
        // `{:?}` keeps the `.0` on whole numbers. Writing to a String cannot fail.
        let _ = writeln!(body, "{:?}", self.inference_secs);
        let _ = writeln!(body, "{:?}", self.fps);
        let _ = writeln!(body, "{:?}", self.load_secs);
        body
    }

    /// Write the stats file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_file_contents())?;
        log::info!("Wrote run statistics to {}", path.display());
        Ok(())
    }

    /// Read a stats file back
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or does not hold three numbers
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let values = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.trim()
                    .parse::<f64>()
                    .map_err(|e| Error::InvalidInput(format!("Bad stats line {line:?}: {e}")))
            })
            .collect::<Result<Vec<f64>>>()?;

        match values.as_slice() {
            [inference_secs, fps, load_secs] => Ok(Self {
                inference_secs: *inference_secs,
                fps: *fps,
                load_secs: *load_secs,
            }),
            other => Err(Error::InvalidInput(format!(
                "Expected 3 stats lines, got {}",
                other.len()
            ))),
        }
    }
}
