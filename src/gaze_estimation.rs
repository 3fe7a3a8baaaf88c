//! Gaze estimation (`gaze-estimation-adas-0002`).
//!
//! Takes both eye crops plus the head pose angles and regresses a gaze
//! direction in the head coordinate frame. The x/y part of that vector,
//! de-rotated by the head roll, is the cursor displacement.

use crate::{
    constants::GAZE_EYE_INPUT_SIZE,
    head_pose::HeadPose,
    inference::{find_output, Device, ModelSignature, OnnxModel},
    utils::image_conversion::blob_from_image,
    Error, Result,
};
use ndarray::Array2;
use opencv::core::Mat;
use std::path::Path;
use std::time::Duration;

/// Left eye input tensor
pub const LEFT_EYE_INPUT: &str = "left_eye_image";
/// Right eye input tensor
pub const RIGHT_EYE_INPUT: &str = "right_eye_image";
/// Head pose input tensor, `[1, 3]` as yaw, pitch, roll
pub const HEAD_POSE_INPUT: &str = "head_pose_angles";
/// Gaze output tensor
pub const GAZE_OUTPUT: &str = "gaze_vector";

/// Tensors the gaze estimator must expose
pub const GAZE_SIGNATURE: ModelSignature = ModelSignature {
    input_count: 3,
    named_inputs: &[LEFT_EYE_INPUT, RIGHT_EYE_INPUT, HEAD_POSE_INPUT],
    named_outputs: &[GAZE_OUTPUT],
};

/// Gaze estimate for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaze {
    /// Raw gaze direction
    pub vector: [f32; 3],
    /// Roll-compensated cursor displacement `(x, y)`
    pub mouse: (f64, f64),
}

/// Gaze estimator
pub struct GazeEstimator {
    model: OnnxModel,
}

impl GazeEstimator {
    /// Load the gaze estimator
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        log::info!(
            "Initializing GazeEstimator with model: {}",
            model_path.as_ref().display()
        );
        Ok(Self {
            model: OnnxModel::load(model_path, device)?,
        })
    }

    /// Time spent loading the model
    #[must_use]
    pub const fn load_time(&self) -> Duration {
        self.model.load_time()
    }

    /// Verify the loaded model
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not match [`GAZE_SIGNATURE`]
    pub fn check_model(&self) -> Result<()> {
        self.model.check_model(&GAZE_SIGNATURE)
    }

    /// Estimate gaze from both eye crops and the head pose
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails, or the output has fewer than three values
    pub fn predict(&self, left_eye: &Mat, right_eye: &Mat, pose: &HeadPose) -> Result<Gaze> {
        let left = blob_from_image(left_eye, GAZE_EYE_INPUT_SIZE, GAZE_EYE_INPUT_SIZE)?;
        let right = blob_from_image(right_eye, GAZE_EYE_INPUT_SIZE, GAZE_EYE_INPUT_SIZE)?;
        let angles = Array2::from_shape_vec((1, 3), pose.as_array().to_vec())
            .map_err(|e| Error::InvalidInput(format!("Failed to build head pose tensor: {e}")))?;

        let outputs = self.model.run(vec![
            (LEFT_EYE_INPUT, left.into_dyn()),
            (RIGHT_EYE_INPUT, right.into_dyn()),
            (HEAD_POSE_INPUT, angles.into_dyn()),
        ])?;

        let raw = find_output(&outputs, GAZE_OUTPUT).or_else(|_| {
            outputs
                .first()
                .ok_or_else(|| Error::ModelOutputError("Gaze estimator produced no output".to_string()))
        })?;

        match raw.data.as_slice() {
            [x, y, z, ..] => {
                let vector = [*x, *y, *z];
                Ok(Gaze {
                    vector,
                    mouse: mouse_displacement(vector, pose.roll),
                })
            }
            other => Err(Error::ModelOutputError(format!(
                "Expected 3 gaze values, got {}",
                other.len()
            ))),
        }
    }
}

/// Rotate the gaze x/y by the negative head roll so that tilting the head
/// does not move the cursor.
#[must_use]
pub fn mouse_displacement(gaze: [f32; 3], roll_degrees: f32) -> (f64, f64) {
    let roll = f64::from(roll_degrees).to_radians();
    let (sn, cs) = roll.sin_cos();
    let gx = f64::from(gaze[0]);
    let gy = f64::from(gaze[1]);

    (gx * cs + gy * sn, -gx * sn + gy * cs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn test_mouse_displacement_no_roll() {
        let (x, y) = mouse_displacement([0.3, -0.2, -0.9], 0.0);
        assert!((x - 0.3).abs() < TOLERANCE);
        assert!((y + 0.2).abs() < TOLERANCE);
    }

    #[test]
    fn test_mouse_displacement_quarter_roll() {
        let (x, y) = mouse_displacement([1.0, 0.0, 0.0], 90.0);
        assert!(x.abs() < TOLERANCE);
        assert!((y + 1.0).abs() < TOLERANCE);

        let (x, y) = mouse_displacement([0.0, 1.0, 0.0], 90.0);
        assert!((x - 1.0).abs() < TOLERANCE);
        assert!(y.abs() < TOLERANCE);
    }

    #[test]
    fn test_mouse_displacement_preserves_length() {
        let (x, y) = mouse_displacement([0.6, 0.8, 0.0], 37.0);
        assert!(((x * x + y * y).sqrt() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_gaze_signature() {
        assert_eq!(GAZE_SIGNATURE.input_count, 3);
        assert!(GAZE_SIGNATURE.named_inputs.contains(&HEAD_POSE_INPUT));
    }
}
