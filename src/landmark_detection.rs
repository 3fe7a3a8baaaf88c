use crate::{
    constants::{EYE_HALF_SIZE, LANDMARKS_INPUT_SIZE, NUM_LANDMARKS},
    inference::{Device, ModelSignature, OnnxModel},
    utils::{clip_box, image_conversion::blob_from_image, safe_cast::f32_to_i32_clamp},
    Error, Result,
};
use opencv::core::{Mat, Point2f, Rect};
use opencv::prelude::*;
use std::path::Path;
use std::time::Duration;

/// Tensors the landmark regressor must expose
pub const LANDMARKS_SIGNATURE: ModelSignature = ModelSignature {
    input_count: 1,
    named_inputs: &[],
    named_outputs: &[],
};

/// Eye crops and the landmarks they were cut around, in face-crop coordinates
#[derive(Debug)]
pub struct EyeRegions {
    /// Left eye crop
    pub left_image: Mat,
    /// Right eye crop
    pub right_image: Mat,
    /// Left eye box inside the face crop
    pub left_box: Rect,
    /// Right eye box inside the face crop
    pub right_box: Rect,
    /// All five landmarks in face-crop pixels
    pub landmarks: Vec<Point2f>,
}

/// Five-point facial landmark regressor (`landmarks-regression-retail-0009`)
pub struct LandmarkDetector {
    model: OnnxModel,
    input_size: i32,
}

impl LandmarkDetector {
    /// Load the landmark regressor
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        log::info!(
            "Initializing LandmarkDetector with model: {}",
            model_path.as_ref().display()
        );
        let model = OnnxModel::load(model_path, device)?;
        let (input_size, _) = model.input_size(0, (LANDMARKS_INPUT_SIZE, LANDMARKS_INPUT_SIZE));

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
    /// Returns an error if the model does not match [`LANDMARKS_SIGNATURE`]
    pub fn check_model(&self) -> Result<()> {
        self.model.check_model(&LANDMARKS_SIGNATURE)
    }

    /// Locate the eyes in a face crop and cut them out
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Inference fails or yields fewer than five points
    /// - An eye box falls entirely outside the crop
    pub fn predict(&self, face: &Mat) -> Result<EyeRegions> {
        let blob = blob_from_image(face, self.input_size, self.input_size)?;
        let outputs = self.model.run(vec![("0", blob.into_dyn())])?;
        let raw = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("Landmark regressor produced no output".to_string()))?;

        let landmarks = scale_landmarks(&raw.data, face.cols(), face.rows())?;
        let (left_box, right_box) = eye_boxes(&landmarks, face.cols(), face.rows())?;

        Ok(EyeRegions {
            left_image: Mat::roi(face, left_box)?.try_clone()?,
            right_image: Mat::roi(face, right_box)?.try_clone()?,
            left_box,
            right_box,
            landmarks,
        })
    }
}

/// Scale normalized `(x, y)` pairs to crop pixels
///
/// # Errors
///
/// Returns an error if fewer than [`NUM_LANDMARKS`] points are present
#[allow(clippy::cast_precision_loss)] // Crop dimensions fit in f32
pub fn scale_landmarks(data: &[f32], width: i32, height: i32) -> Result<Vec<Point2f>> {
    if data.len() < NUM_LANDMARKS * 2 {
        return Err(Error::ModelOutputError(format!(
            "Expected {} landmark values, got {}",
            NUM_LANDMARKS * 2,
            data.len()
        )));
    }

    Ok(data
        .chunks_exact(2)
        .take(NUM_LANDMARKS)
        .map(|xy| Point2f::new(xy[0] * width as f32, xy[1] * height as f32))
        .collect())
}

/// Square boxes of side `2 * EYE_HALF_SIZE` around the two eye landmarks, clipped to the crop
///
/// # Errors
///
/// Returns an error if either box lies outside the crop
pub fn eye_boxes(landmarks: &[Point2f], width: i32, height: i32) -> Result<(Rect, Rect)> {
    let around = |point: &Point2f| {
        let cx = f32_to_i32_clamp(point.x, i32::MIN, i32::MAX);
        let cy = f32_to_i32_clamp(point.y, i32::MIN, i32::MAX);
        clip_box(
            cx.saturating_sub(EYE_HALF_SIZE),
            cy.saturating_sub(EYE_HALF_SIZE),
            cx.saturating_add(EYE_HALF_SIZE),
            cy.saturating_add(EYE_HALF_SIZE),
            width,
            height,
        )
        .ok_or_else(|| Error::InvalidInput(format!("Eye at ({}, {}) lies outside the face crop", point.x, point.y)))
    };

    match landmarks {
        [left, right, ..] => Ok((around(left)?, around(right)?)),
        _ => Err(Error::InvalidInput("Need both eye landmarks".to_string())),
    }
}
