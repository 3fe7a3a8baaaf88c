//! Head pose estimation (`head-pose-estimation-adas-0001`).
//!
//! The network regresses the three Tait-Bryan angles directly, one output
//! tensor per angle, in degrees.

use crate::{
    constants::HEAD_POSE_INPUT_SIZE,
    inference::{find_output, Device, ModelOutput, ModelSignature, OnnxModel},
    utils::image_conversion::blob_from_image,
    Error, Result,
};
use opencv::core::Mat;
use std::path::Path;
use std::time::Duration;

/// Yaw output tensor
pub const YAW_OUTPUT: &str = "angle_y_fc";
/// Pitch output tensor
pub const PITCH_OUTPUT: &str = "angle_p_fc";
/// Roll output tensor
pub const ROLL_OUTPUT: &str = "angle_r_fc";

/// Tensors the head pose estimator must expose
pub const HEAD_POSE_SIGNATURE: ModelSignature = ModelSignature {
    input_count: 1,
    named_inputs: &[],
    named_outputs: &[YAW_OUTPUT, PITCH_OUTPUT, ROLL_OUTPUT],
};

/// Head orientation relative to the camera, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    /// Rotation about the vertical axis
    pub yaw: f32,
    /// Rotation about the horizontal axis
    pub pitch: f32,
    /// Rotation about the viewing axis
    pub roll: f32,
}

impl HeadPose {
    /// Angles in the `(yaw, pitch, roll)` order the gaze network takes them
    #[must_use]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.yaw, self.pitch, self.roll]
    }
}

/// Head pose estimator
pub struct HeadPoseEstimator {
    model: OnnxModel,
    input_size: (i32, i32),
}

impl HeadPoseEstimator {
    /// Load the head pose estimator
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        log::info!(
            "Initializing HeadPoseEstimator with model: {}",
            model_path.as_ref().display()
        );
        let model = OnnxModel::load(model_path, device)?;
        let input_size = model.input_size(0, (HEAD_POSE_INPUT_SIZE, HEAD_POSE_INPUT_SIZE));

        Ok(Self { model, input_size })
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
    /// Returns an error if the model does not match [`HEAD_POSE_SIGNATURE`]
    pub fn check_model(&self) -> Result<()> {
        self.model.check_model(&HEAD_POSE_SIGNATURE)
    }

    /// Estimate the pose of a face crop
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or an angle output is missing
    pub fn predict(&self, face: &Mat) -> Result<HeadPose> {
        let (width, height) = self.input_size;
        let blob = blob_from_image(face, width, height)?;
        let outputs = self.model.run(vec![("data", blob.into_dyn())])?;
        parse_head_pose(&outputs)
    }
}

/// Read the three angle outputs by name
///
/// # Errors
///
/// Returns an error if an angle tensor is missing or empty
pub fn parse_head_pose(outputs: &[ModelOutput]) -> Result<HeadPose> {
    let angle = |name: &str| -> Result<f32> {
        find_output(outputs, name)?
            .data
            .first()
            .copied()
            .ok_or_else(|| Error::ModelOutputError(format!("Output {name} is empty")))
    };

    Ok(HeadPose {
        yaw: angle(YAW_OUTPUT)?,
        pitch: angle(PITCH_OUTPUT)?,
        roll: angle(ROLL_OUTPUT)?,
    })
}
