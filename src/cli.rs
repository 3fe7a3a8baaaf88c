//! Command-line arguments and how they layer over the configuration file.

use crate::{
    config::Config,
    inference::Device,
    mouse_control::{Precision, Speed},
    Result,
};
use clap::Parser;
use std::path::PathBuf;

/// Gaze-controlled mouse pointer
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Face detection ONNX model
    #[arg(short = 'f', long)]
    pub face_detection_model: Option<PathBuf>,

    /// Facial landmarks ONNX model
    #[arg(short = 'l', long)]
    pub facial_landmarks_model: Option<PathBuf>,

    /// Head pose estimation ONNX model
    #[arg(short = 'p', long)]
    pub head_pose_model: Option<PathBuf>,

    /// Gaze estimation ONNX model
    #[arg(short = 'g', long)]
    pub gaze_estimation_model: Option<PathBuf>,

    /// Video or image file, or CAM for the webcam
    #[arg(short, long)]
    pub input: String,

    /// Target device (CPU, GPU, MYRIAD, HETERO)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Probability threshold for face detections
    #[arg(short = 't', long)]
    pub prob_threshold: Option<f32>,

    /// Overlays to draw, any of: fd fl hp ge
    #[arg(long, num_args = 1.., value_delimiter = ' ')]
    pub flags: Vec<String>,

    /// Directory for the output video and stats file
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Mouse precision (high, medium, low)
    #[arg(long)]
    pub precision: Option<String>,

    /// Mouse speed (fast, medium, slow)
    #[arg(long)]
    pub speed: Option<String>,

    /// Do not open the visualization window
    #[arg(long)]
    pub no_display: bool,

    /// Do not move the mouse
    #[arg(long)]
    pub no_mouse: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Overlay command-line values onto a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a device, precision or speed name is unknown
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(path) = &self.face_detection_model {
            config.models.face_detection.clone_from(path);
        }
        if let Some(path) = &self.facial_landmarks_model {
            config.models.facial_landmarks.clone_from(path);
        }
        if let Some(path) = &self.head_pose_model {
            config.models.head_pose.clone_from(path);
        }
        if let Some(path) = &self.gaze_estimation_model {
            config.models.gaze_estimation.clone_from(path);
        }
        if let Some(device) = &self.device {
            config.inference.device = device.parse::<Device>()?;
        }
        if let Some(threshold) = self.prob_threshold {
            config.inference.prob_threshold = threshold;
        }
        if !self.flags.is_empty() {
            config.output.flags.clone_from(&self.flags);
        }
        if let Some(dir) = &self.output_path {
            config.output.directory.clone_from(dir);
        }
        if let Some(precision) = &self.precision {
            config.mouse.precision = precision.parse::<Precision>()?;
        }
        if let Some(speed) = &self.speed {
            config.mouse.speed = speed.parse::<Speed>()?;
        }
        if self.no_display {
            config.output.display = false;
        }
        if self.no_mouse {
            config.mouse.enabled = false;
        }

        Ok(config)
    }
}
