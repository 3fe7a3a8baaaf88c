//! Configuration management for the gaze pointer application

use crate::{
    inference::Device,
    mouse_control::{Precision, Speed},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Inference configuration
    pub inference: InferenceConfig,

    /// Mouse control configuration
    pub mouse: MouseConfig,

    /// Output configuration
    pub output: OutputConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to face detection ONNX model
    pub face_detection: PathBuf,

    /// Path to facial landmarks ONNX model
    pub facial_landmarks: PathBuf,

    /// Path to head pose ONNX model
    pub head_pose: PathBuf,

    /// Path to gaze estimation ONNX model
    pub gaze_estimation: PathBuf,
}

/// Inference parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Target device
    pub device: Device,

    /// Face detection probability threshold (0.0-1.0)
    pub prob_threshold: f32,
}

/// Mouse control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    /// Enable cursor control
    pub enabled: bool,

    /// Pixels per unit of gaze displacement
    pub precision: Precision,

    /// Duration of one pointer move
    pub speed: Speed,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the output video and stats file
    pub directory: PathBuf,

    /// Show the visualization window
    pub display: bool,

    /// Overlays to draw: any of fd, fl, hp, ge
    pub flags: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_detection: PathBuf::from("models/face-detection-adas-binary-0001.onnx"),
            facial_landmarks: PathBuf::from("models/landmarks-regression-retail-0009.onnx"),
            head_pose: PathBuf::from("models/head-pose-estimation-adas-0001.onnx"),
            gaze_estimation: PathBuf::from("models/gaze-estimation-adas-0002.onnx"),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            prob_threshold: 0.5,
        }
    }
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            precision: Precision::Medium,
            speed: Speed::Fast,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("results"),
            display: true,
            flags: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate thresholds, flags and model paths
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.inference.prob_threshold) {
            return Err(Error::ConfigError(
                "Probability threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        crate::visualization::VisualizationFlags::parse(&self.output.flags)
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let models = [
            ("Face detection", &self.models.face_detection),
            ("Facial landmarks", &self.models.facial_landmarks),
            ("Head pose", &self.models.head_pose),
            ("Gaze estimation", &self.models.gaze_estimation),
        ];
        for (what, path) in models {
            if !path.is_file() {
                return Err(Error::ConfigError(format!(
                    "{what} model not found: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze Pointer Configuration

# Model paths (ONNX exports of the Open Model Zoo models)
models:
  face_detection: "models/face-detection-adas-binary-0001.onnx"
  facial_landmarks: "models/landmarks-regression-retail-0009.onnx"
  head_pose: "models/head-pose-estimation-adas-0001.onnx"
  gaze_estimation: "models/gaze-estimation-adas-0002.onnx"

# Inference
inference:
  device: CPU
  prob_threshold: 0.5

# Mouse control
mouse:
  enabled: true
  precision: medium
  speed: fast

# Output
output:
  directory: "results"
  display: true
  flags: []
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        let defaults = Config::default();

        assert_eq!(config.models.head_pose, defaults.models.head_pose);
        assert_eq!(config.inference.device, Device::Cpu);
        assert!((config.inference.prob_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.mouse.precision, Precision::Medium);
        assert_eq!(config.mouse.speed, Speed::Fast);
        assert_eq!(config.output.directory, PathBuf::from("results"));
        assert!(config.output.flags.is_empty());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::from_yaml("inference:\n  device: GPU\nmouse:\n  precision: high\n").unwrap();
        assert_eq!(config.inference.device, Device::Gpu);
        assert!((config.inference.prob_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.mouse.precision, Precision::High);
        assert!(config.mouse.enabled);
    }

    #[test]
    fn test_names_in_yaml_are_case_insensitive() {
        let config = Config::from_yaml("inference:\n  device: cuda\n").unwrap();
        assert_eq!(config.inference.device, Device::Gpu);

        let config = Config::from_yaml(
            "inference:\n  device: Myriad\nmouse:\n  precision: LOW\n  speed: Slow\noutput:\n  directory: out\n",
        )
        .unwrap();
        assert_eq!(config.inference.device, Device::Myriad);
        assert_eq!(config.mouse.precision, Precision::Low);
        assert_eq!(config.mouse.speed, Speed::Slow);
        assert_eq!(config.output.directory, PathBuf::from("out"));
    }

    #[test]
    fn test_saved_names_load_back() {
        let mut config = Config::default();
        config.inference.device = Device::Hetero;
        config.mouse.speed = Speed::Medium;
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("device: HETERO"));

        let loaded = Config::from_yaml(&yaml).unwrap();
        assert_eq!(loaded.inference.device, Device::Hetero);
        assert_eq!(loaded.mouse.speed, Speed::Medium);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("inference:\n  device: TPU\n"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_threshold_and_flags() {
        let mut config = Config::default();
        config.inference.prob_threshold = 1.5;
        assert!(config.validate().unwrap_err().to_string().contains("threshold"));

        config.inference.prob_threshold = 0.6;
        config.output.flags = vec!["zz".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_model_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        for (name, slot) in [
            ("fd.onnx", &mut config.models.face_detection),
            ("fl.onnx", &mut config.models.facial_landmarks),
            ("hp.onnx", &mut config.models.head_pose),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, b"").unwrap();
            *slot = path;
        }
        config.models.gaze_estimation = dir.path().join("missing.onnx");

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Gaze estimation model not found"));

        fs::write(&config.models.gaze_estimation, b"").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaze.yaml");
        let mut config = Config::default();
        config.output.flags = vec!["fd".to_string(), "ge".to_string()];
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.output.flags, config.output.flags);
    }
}
