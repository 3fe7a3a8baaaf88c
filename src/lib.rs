//! Gaze-controlled mouse pointer.
//!
//! This library drives the mouse pointer from where a person is looking,
//! using a cascade of four ONNX models:
//! 1. Face detection to crop the first face in the frame
//! 2. Facial landmark detection to locate the eyes
//! 3. Head pose estimation for yaw, pitch and roll
//! 4. Gaze estimation from both eye crops and the head pose
//!
//! The gaze vector is rotated by the head roll and turned into a relative
//! pointer move on X11. Optional overlays draw the intermediate results.
//!
//! # Examples
//!
//! ## Single image
//!
//! ```no_run
//! use gaze_pointer::{
//!     face_detection::FaceDetector, gaze_estimation::GazeEstimator,
//!     head_pose::HeadPoseEstimator, inference::Device, landmark_detection::LandmarkDetector,
//! };
//! use opencv::imgcodecs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let faces = FaceDetector::new("models/face-detection-adas-binary-0001.onnx", Device::Cpu, 0.5)?;
//! let landmarks = LandmarkDetector::new("models/landmarks-regression-retail-0009.onnx", Device::Cpu)?;
//! let head_pose = HeadPoseEstimator::new("models/head-pose-estimation-adas-0001.onnx", Device::Cpu)?;
//! let gaze = GazeEstimator::new("models/gaze-estimation-adas-0002.onnx", Device::Cpu)?;
//!
//! let image = imgcodecs::imread("face.jpg", imgcodecs::IMREAD_COLOR)?;
//!
//! if let Some((face_image, face)) = faces.predict(&image)? {
//!     let pose = head_pose.predict(&face_image)?;
//!     let eyes = landmarks.predict(&face_image)?;
//!     let result = gaze.predict(&eyes.left_image, &eyes.right_image, &pose)?;
//!     println!("Face {:?}: gaze {:?}, move by {:?}", face.bbox, result.vector, result.mouse);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Drawing the head pose axes
//!
//! ```no_run
//! use gaze_pointer::{head_pose::HeadPose, visualization::draw_axes};
//! use gaze_pointer::constants::{AXIS_FOCAL_LENGTH, AXIS_SCALE};
//! use opencv::{core::{Mat, Scalar, CV_8UC3}, prelude::*};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut canvas = Mat::new_rows_cols_with_default(200, 200, CV_8UC3, Scalar::all(0.0))?;
//! let pose = HeadPose { yaw: 20.0, pitch: -5.0, roll: 3.0 };
//! draw_axes(&mut canvas, (100.0, 100.0), &pose, AXIS_SCALE, AXIS_FOCAL_LENGTH)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Complete pipeline
//!
//! ```no_run
//! use gaze_pointer::{app::GazeApp, config::Config, input_feeder::InputSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.output.flags = vec!["fd".into(), "ge".into()];
//!
//! let mut app = GazeApp::new(config, InputSource::from_arg("demo.mp4")?)?;
//! let stats = app.run()?;
//! println!("{:.1} fps", stats.fps);
//! # Ok(())
//! # }
//! ```

/// ONNX Runtime sessions, devices and model signatures
pub mod inference;

/// Face detection module for finding the face to track
pub mod face_detection;

/// Facial landmark detection and eye cropping
pub mod landmark_detection;

/// Head pose estimation (yaw, pitch, roll)
pub mod head_pose;

/// Gaze estimation and gaze-to-pointer displacement
pub mod gaze_estimation;

/// Mouse pointer control for X11 systems
pub mod mouse_control;

/// Camera, video and image input
pub mod input_feeder;

/// Overlays, axis projection and window composition
pub mod visualization;

/// Run statistics file
pub mod stats;

/// Utility functions for image processing and coordinate transformations
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

/// Command-line arguments
pub mod cli;

pub use error::{Error, Result};
