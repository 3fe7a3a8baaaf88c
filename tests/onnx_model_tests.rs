//! Tests for ONNX model loading and the four-stage cascade


use gaze_pointer::{
    config::ModelConfig,
    face_detection::FaceDetector,
    gaze_estimation::GazeEstimator,
    head_pose::{HeadPose, HeadPoseEstimator},
    inference::{Device, OnnxModel},
    landmark_detection::LandmarkDetector,
    Error, Result,
};
use opencv::prelude::*;
use test_helpers::{create_grey_image, models_available};

#[test]
fn test_missing_model_file() {
    match OnnxModel::load("models/does-not-exist.onnx", Device::Cpu) {
        Err(Error::ModelError(msg)) => assert!(msg.contains("does-not-exist")),
        Err(other) => panic!("Expected ModelError, got {other}"),
        Ok(_) => panic!("Expected ModelError"),
    }
}

#[test]
fn test_missing_detector_models() {
    assert!(FaceDetector::new("nope/fd.onnx", Device::Cpu, 0.5).is_err());
    assert!(LandmarkDetector::new("nope/fl.onnx", Device::Cpu).is_err());
    assert!(HeadPoseEstimator::new("nope/hp.onnx", Device::Cpu).is_err());
    assert!(GazeEstimator::new("nope/ge.onnx", Device::Cpu).is_err());
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_models_match_signatures() -> Result<()> {
    assert!(models_available(), "Models not found under models/");
    let models = ModelConfig::default();

    let face = FaceDetector::new(&models.face_detection, Device::Cpu, 0.5)?;
    let landmarks = LandmarkDetector::new(&models.facial_landmarks, Device::Cpu)?;
    let head_pose = HeadPoseEstimator::new(&models.head_pose, Device::Cpu)?;
    let gaze = GazeEstimator::new(&models.gaze_estimation, Device::Cpu)?;

    face.check_model()?;
    landmarks.check_model()?;
    head_pose.check_model()?;
    gaze.check_model()?;
    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_blank_frame_has_no_face() -> Result<()> {
    let models = ModelConfig::default();
    let face = FaceDetector::new(&models.face_detection, Device::Cpu, 0.5)?;

    let frame = create_grey_image(480, 640)?;
    assert!(face.predict(&frame)?.is_none());
    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_stages_accept_arbitrary_crops() -> Result<()> {
    let models = ModelConfig::default();
    let landmarks = LandmarkDetector::new(&models.facial_landmarks, Device::Cpu)?;
    let head_pose = HeadPoseEstimator::new(&models.head_pose, Device::Cpu)?;
    let gaze = GazeEstimator::new(&models.gaze_estimation, Device::Cpu)?;

    let face = create_grey_image(150, 120)?;
    let pose = head_pose.predict(&face)?;
    assert!(pose.yaw.is_finite() && pose.pitch.is_finite() && pose.roll.is_finite());

    let eyes = landmarks.predict(&face)?;
    assert_eq!(eyes.landmarks.len(), 5);
    assert!(!eyes.left_image.empty());
    assert!(!eyes.right_image.empty());

    let result = gaze.predict(&eyes.left_image, &eyes.right_image, &HeadPose::default())?;
    assert!(result.vector.iter().all(|v| v.is_finite()));
    Ok(())
}
