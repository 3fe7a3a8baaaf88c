use crate::{
    constants::{DETECTION_RECORD_LEN, FACE_DETECTION_INPUT_HEIGHT, FACE_DETECTION_INPUT_WIDTH},
    inference::{Device, ModelSignature, OnnxModel},
    utils::{clip_box, image_conversion::blob_from_image, safe_cast::f32_to_i32_clamp},
    Error, Result,
};
use opencv::core::{Mat, Rect};
use opencv::prelude::*;
use std::path::Path;
use std::time::Duration;

/// Tensors the face detector must expose
pub const FACE_DETECTION_SIGNATURE: ModelSignature = ModelSignature {
    input_count: 1,
    named_inputs: &[],
    named_outputs: &[],
};

/// Face detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetection {
    /// Bounding box of the detected face in frame coordinates
    pub bbox: Rect,
    /// Confidence score of the detection
    pub confidence: f32,
}

/// SSD face detector (`face-detection-adas-binary-0001`)
pub struct FaceDetector {
    model: OnnxModel,
    input_size: (i32, i32),
    threshold: f32,
}

impl FaceDetector {
    /// Load the face detector
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device, threshold: f32) -> Result<Self> {
        log::info!("Initializing FaceDetector with model: {}", model_path.as_ref().display());
        let model = OnnxModel::load(model_path, device)?;
        let input_size = model.input_size(0, (FACE_DETECTION_INPUT_WIDTH, FACE_DETECTION_INPUT_HEIGHT));

        Ok(Self {
            model,
            input_size,
            threshold,
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
    /// Returns an error if the model does not match [`FACE_DETECTION_SIGNATURE`]
    pub fn check_model(&self) -> Result<()> {
        self.model.check_model(&FACE_DETECTION_SIGNATURE)
    }

    /// Detect the first face above the threshold and crop it out of the frame.
    ///
    /// Returns `None` when no face passes the threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing, inference or cropping fails
    pub fn predict(&self, frame: &Mat) -> Result<Option<(Mat, FaceDetection)>> {
        let (width, height) = self.input_size;
        let blob = blob_from_image(frame, width, height)?;

        let outputs = self.model.run(vec![("data", blob.into_dyn())])?;
        let detections = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("Face detector produced no output".to_string()))?;

        let Some(face) = parse_detections(&detections.data, frame.cols(), frame.rows(), self.threshold) else {
            return Ok(None);
        };

        let crop = Mat::roi(frame, face.bbox)?.try_clone()?;
        Ok(Some((crop, face)))
    }
}

/// Pick the first detection record at or above `threshold` and scale it to the frame.
///
/// Records are `(image_id, label, confidence, xmin, ymin, xmax, ymax)` with
/// normalized coordinates. A negative `image_id` terminates the list.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Frame dimensions fit in f32
pub fn parse_detections(data: &[f32], frame_width: i32, frame_height: i32, threshold: f32) -> Option<FaceDetection> {
    data.chunks_exact(DETECTION_RECORD_LEN)
        .take_while(|record| record[0] >= 0.0)
        .filter(|record| record[2] >= threshold)
        .find_map(|record| {
            let to_x = |v: f32| f32_to_i32_clamp(v * frame_width as f32, 0, frame_width);
            let to_y = |v: f32| f32_to_i32_clamp(v * frame_height as f32, 0, frame_height);
            let bbox = clip_box(
                to_x(record[3]),
                to_y(record[4]),
                to_x(record[5]),
                to_y(record[6]),
                frame_width,
                frame_height,
            )?;
            Some(FaceDetection {
                bbox,
                confidence: record[2],
            })
        })
}
