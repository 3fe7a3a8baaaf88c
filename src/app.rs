//! Main application module: the frame loop driving all four models.

use crate::{
    config::Config,
    constants::{ESC_KEY, KEY_WAIT_MS, MOUSE_MOVE_INTERVAL, OUTPUT_VIDEO_NAME, STATS_FILE_NAME, WINDOW_NAME},
    error::Result,
    face_detection::FaceDetector,
    gaze_estimation::{Gaze, GazeEstimator},
    head_pose::HeadPoseEstimator,
    input_feeder::{InputFeeder, InputSource},
    landmark_detection::LandmarkDetector,
    mouse_control::MouseController,
    stats::RunStats,
    visualization::{compose_display, render_preview, FrameOverlay, VisualizationFlags},
};
use log::{debug, info, warn};
use opencv::{
    core::{Mat, Size},
    highgui::{self, WINDOW_NORMAL},
    prelude::*,
    videoio::VideoWriter,
};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Should this frame trigger a cursor move
#[must_use]
pub const fn is_mouse_frame(counter: u64) -> bool {
    counter % MOUSE_MOVE_INTERVAL == 0
}

/// What the loop does with a processed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameActions {
    /// Append the frame to the output video
    pub write: bool,
    /// Move the pointer by the frame's gaze
    pub move_mouse: bool,
    /// Leave the loop after this frame
    pub exit: bool,
}

/// Decide the actions for frame number `counter`.
///
/// A frame without a face is neither written nor used for the pointer; ESC exits either way.
#[must_use]
pub const fn frame_actions(face_found: bool, counter: u64, key: i32) -> FrameActions {
    FrameActions {
        write: face_found,
        move_mouse: face_found && is_mouse_frame(counter),
        exit: key == ESC_KEY,
    }
}

/// Gaze pointer application
pub struct GazeApp {
    config: Config,
    flags: VisualizationFlags,
    face_detector: FaceDetector,
    landmark_detector: LandmarkDetector,
    head_pose_estimator: HeadPoseEstimator,
    gaze_estimator: GazeEstimator,
    mouse: Option<MouseController>,
    input: InputFeeder,
    writer: VideoWriter,
    load_time: Duration,
}

impl GazeApp {
    /// Load every model, open the input and the output video
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A model fails to load or does not expose the expected tensors
    /// - The input cannot be opened
    /// - The output directory or video cannot be created
    pub fn new(config: Config, source: InputSource) -> Result<Self> {
        info!("Initializing gaze pointer on {}", config.inference.device);
        let flags = VisualizationFlags::parse(&config.output.flags)?;
        let device = config.inference.device;

        let started = Instant::now();
        let face_detector = FaceDetector::new(
            &config.models.face_detection,
            device,
            config.inference.prob_threshold,
        )?;
        info!(
            "Face detection model loaded: time: {:.3} ms",
            face_detector.load_time().as_secs_f64() * 1000.0
        );
        let landmark_detector = LandmarkDetector::new(&config.models.facial_landmarks, device)?;
        info!(
            "Facial landmarks detection model loaded: time: {:.3} ms",
            landmark_detector.load_time().as_secs_f64() * 1000.0
        );
        let head_pose_estimator = HeadPoseEstimator::new(&config.models.head_pose, device)?;
        info!(
            "Head pose estimation model loaded: time: {:.3} ms",
            head_pose_estimator.load_time().as_secs_f64() * 1000.0
        );
        let gaze_estimator = GazeEstimator::new(&config.models.gaze_estimation, device)?;
        info!(
            "Gaze estimation model loaded: time: {:.3} ms",
            gaze_estimator.load_time().as_secs_f64() * 1000.0
        );
        let load_time = started.elapsed();
        info!("Total loading time: {:.3} ms", load_time.as_secs_f64() * 1000.0);

        face_detector.check_model()?;
        landmark_detector.check_model()?;
        head_pose_estimator.check_model()?;
        gaze_estimator.check_model()?;
        info!("All models are loaded successfully");

        let mut input = InputFeeder::new(source);
        input.load_data()?;
        info!("Input feeder is loaded: {:?}", input.source());

        let writer = Self::open_writer(&config.output.directory, input.frame_size()?, input.fps()?)?;

        let mouse = if config.mouse.enabled {
            match MouseController::new(config.mouse.precision, config.mouse.speed) {
                Ok(controller) => Some(controller),
                Err(e) => {
                    warn!("Mouse control unavailable, continuing without it: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if config.output.display {
            highgui::named_window(WINDOW_NAME, WINDOW_NORMAL)?;
        }

        Ok(Self {
            config,
            flags,
            face_detector,
            landmark_detector,
            head_pose_estimator,
            gaze_estimator,
            mouse,
            input,
            writer,
            load_time,
        })
    }

    fn open_writer(directory: &Path, size: Size, fps: f64) -> Result<VideoWriter> {
        fs::create_dir_all(directory)?;
        let path = directory.join(OUTPUT_VIDEO_NAME);
        let filename = path.to_string_lossy();

        let mut writer = VideoWriter::new(&filename, VideoWriter::fourcc('a', 'v', 'c', '1')?, fps, size, true)?;
        if !writer.is_opened()? {
            warn!("avc1 encoder unavailable, falling back to mp4v");
            writer = VideoWriter::new(&filename, VideoWriter::fourcc('m', 'p', '4', 'v')?, fps, size, true)?;
        }
        if !writer.is_opened()? {
            warn!("Could not open output video {}", path.display());
        } else {
            info!("Writing output video to {} ({}x{} @ {:.1} fps)", path.display(), size.width, size.height, fps);
        }

        Ok(writer)
    }

    /// Run the frame loop until the input ends or ESC is pressed, then write the stats file
    ///
    /// # Errors
    ///
    /// Returns an error if any stage, the video writer or the stats file fails
    pub fn run(&mut self) -> Result<RunStats> {
        info!("Start inferencing on input");

        let mut counter: u64 = 0;
        let started = Instant::now();

        while let Some(mut frame) = self.input.next_frame()? {
            let key = if self.config.output.display {
                highgui::wait_key(KEY_WAIT_MS)?
            } else {
                -1
            };
            counter += 1;

            let gaze = self.process_frame(&mut frame)?;
            let actions = frame_actions(gaze.is_some(), counter, key);

            if actions.write && self.writer.is_opened()? {
                self.writer.write(&frame)?;
            }
            if let (true, Some(gaze)) = (actions.move_mouse, &gaze) {
                self.move_mouse(gaze)?;
            }
            if actions.exit {
                info!("Exit key is pressed");
                break;
            }
        }

        let stats = RunStats::new(counter, started.elapsed(), self.load_time);
        info!("Frames processed: {}", counter);
        info!("Total inference time {} seconds", stats.inference_secs);
        info!("FPS {:.2} frame/second", stats.fps);

        stats.write_to(self.config.output.directory.join(STATS_FILE_NAME))?;
        self.shutdown()?;

        Ok(stats)
    }

    /// Run one frame through the cascade. Returns `None` when no face is found.
    fn process_frame(&mut self, frame: &mut Mat) -> Result<Option<Gaze>> {
        let Some((face_image, face)) = self.face_detector.predict(frame)? else {
            warn!("Unable to detect the face");
            return Ok(None);
        };
        debug!("Face at {:?} ({:.2})", face.bbox, face.confidence);

        let pose = self.head_pose_estimator.predict(&face_image)?;
        let eyes = self.landmark_detector.predict(&face_image)?;
        let gaze = self
            .gaze_estimator
            .predict(&eyes.left_image, &eyes.right_image, &pose)?;
        debug!(
            "yaw {:.2} pitch {:.2} roll {:.2} gaze {:?}",
            pose.yaw, pose.pitch, pose.roll, gaze.vector
        );

        let preview = if self.flags.is_empty() {
            None
        } else {
            let overlay = FrameOverlay {
                face_image: &face_image,
                face: &face,
                eyes: &eyes,
                pose: &pose,
            };
            Some(render_preview(frame, &overlay, self.flags)?)
        };

        if self.config.output.display {
            let image = compose_display(frame, preview.as_ref())?;
            highgui::imshow(WINDOW_NAME, &image)?;
        }

        Ok(Some(gaze))
    }

    fn move_mouse(&self, gaze: &Gaze) -> Result<()> {
        if let Some(mouse) = &self.mouse {
            mouse.move_by(gaze.mouse.0, gaze.mouse.1)?;
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.writer.release()?;
        self.input.close()?;
        if self.config.output.display {
            highgui::destroy_all_windows()?;
        }
        info!("Video stream ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_moves_every_fifth_frame() {
        let moves: Vec<u64> = (1..=20).filter(|&c| is_mouse_frame(c)).collect();
        assert_eq!(moves, vec![5, 10, 15, 20]);
    }

    #[test]
    fn test_face_frames_are_written_and_move_on_interval() {
        let moved: Vec<u64> = (1..=12)
            .filter(|&c| frame_actions(true, c, -1).move_mouse)
            .collect();
        assert_eq!(moved, vec![5, 10]);
        assert!((1..=12).all(|c| frame_actions(true, c, -1).write));
        assert!(!frame_actions(true, 5, -1).exit);
    }

    #[test]
    fn test_face_miss_skips_write_and_mouse() {
        let actions = frame_actions(false, 10, -1);
        assert_eq!(actions, FrameActions::default());
    }

    #[test]
    fn test_esc_exits_with_or_without_face() {
        let miss = frame_actions(false, 3, ESC_KEY);
        assert!(miss.exit);
        assert!(!miss.write && !miss.move_mouse);

        let hit = frame_actions(true, 5, ESC_KEY);
        assert_eq!(
            hit,
            FrameActions {
                write: true,
                move_mouse: true,
                exit: true,
            }
        );
    }

    #[test]
    fn test_other_keys_do_not_exit() {
        assert!(!frame_actions(false, 1, i32::from(b'q')).exit);
        assert!(!frame_actions(true, 1, 0).exit);
    }
}
