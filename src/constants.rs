//! Constants used throughout the application

/// Face detector input width (`face-detection-adas-binary-0001`)
pub const FACE_DETECTION_INPUT_WIDTH: i32 = 672;
/// Face detector input height
pub const FACE_DETECTION_INPUT_HEIGHT: i32 = 384;
/// Values per detection record: image id, label, confidence, xmin, ymin, xmax, ymax
pub const DETECTION_RECORD_LEN: usize = 7;

/// Landmark regressor input size (`landmarks-regression-retail-0009`)
pub const LANDMARKS_INPUT_SIZE: i32 = 48;
/// Number of landmark points (eyes, nose tip, mouth corners)
pub const NUM_LANDMARKS: usize = 5;
/// Half side of the square eye crop around each eye centre, in pixels
pub const EYE_HALF_SIZE: i32 = 10;

/// Head pose estimator input size (`head-pose-estimation-adas-0001`)
pub const HEAD_POSE_INPUT_SIZE: i32 = 60;
/// Gaze estimator eye input size (`gaze-estimation-adas-0002`)
pub const GAZE_EYE_INPUT_SIZE: i32 = 60;

/// Move the cursor once every this many frames
pub const MOUSE_MOVE_INTERVAL: u64 = 5;
/// Number of intermediate pointer warps used to tween one move
pub const MOUSE_TWEEN_STEPS: u32 = 20;

/// Focal length used for the head pose axis overlay
pub const AXIS_FOCAL_LENGTH: f64 = 950.0;
/// Axis length used for the head pose axis overlay
pub const AXIS_SCALE: f64 = 50.0;

/// Side of each pane in the visualization window
pub const PREVIEW_PANE_SIZE: i32 = 500;
/// Visualization window title
pub const WINDOW_NAME: &str = "Visualization";
/// Key wait per frame while a window is shown, in milliseconds
pub const KEY_WAIT_MS: i32 = 60;
/// ESC key code
pub const ESC_KEY: i32 = 27;

/// Frame rate assumed when the capture backend reports none
pub const DEFAULT_FPS: f64 = 30.0;

/// Output video file name inside the output directory
pub const OUTPUT_VIDEO_NAME: &str = "output_video.mp4";
/// Statistics file name inside the output directory
pub const STATS_FILE_NAME: &str = "stats.txt";
