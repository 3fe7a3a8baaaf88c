//! Frame source for the pipeline: webcam, video file, or a single image.

use crate::{constants::DEFAULT_FPS, Error, Result};
use log::info;
use opencv::{
    core::{Mat, Size},
    imgcodecs,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use std::path::{Path, PathBuf};

/// Image extensions treated as single-frame input
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    Video(PathBuf),
    /// Still image path
    Image(PathBuf),
}

impl InputSource {
    /// Interpret a CLI input value: `CAM` for the default webcam, otherwise a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInputPath`] if the path is not an existing file
    pub fn from_arg(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("cam") {
            return Ok(Self::Camera(0));
        }

        let path = Path::new(value);
        if !path.is_file() {
            return Err(Error::InvalidInputPath(path.to_path_buf()));
        }

        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));

        Ok(if is_image {
            Self::Image(path.to_path_buf())
        } else {
            Self::Video(path.to_path_buf())
        })
    }
}

enum Feed {
    Closed,
    Capture(VideoCapture),
    Still(Option<Mat>, Size),
}

/// Sequential frame reader
pub struct InputFeeder {
    source: InputSource,
    feed: Feed,
}

impl InputFeeder {
    /// Create a feeder. Nothing is opened until [`InputFeeder::load_data`].
    #[must_use]
    pub const fn new(source: InputSource) -> Self {
        Self {
            source,
            feed: Feed::Closed,
        }
    }

    /// Source this feeder reads from
    #[must_use]
    pub const fn source(&self) -> &InputSource {
        &self.source
    }

    /// Open the underlying capture or read the image
    ///
    /// # Errors
    ///
    /// Returns an error if the device, file or image cannot be opened
    pub fn load_data(&mut self) -> Result<()> {
        self.feed = match &self.source {
            InputSource::Camera(index) => {
                info!("Opening camera {}", index);
                Feed::Capture(Self::opened(VideoCapture::new(*index, videoio::CAP_ANY)?, "camera")?)
            }
            InputSource::Video(path) => {
                info!("Opening video file: {}", path.display());
                let capture = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
                Feed::Capture(Self::opened(capture, "video file")?)
            }
            InputSource::Image(path) => {
                info!("Reading image: {}", path.display());
                let image = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_COLOR)?;
                if image.empty() {
                    return Err(Error::InvalidInput(format!("Cannot decode image {}", path.display())));
                }
                let size = image.size()?;
                Feed::Still(Some(image), size)
            }
        };

        Ok(())
    }

    fn opened(capture: VideoCapture, what: &str) -> Result<VideoCapture> {
        if capture.is_opened()? {
            Ok(capture)
        } else {
            Err(Error::InvalidInput(format!("Failed to open {what}")))
        }
    }

    /// Read the next frame; `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the feeder was not loaded or the backend fails
    pub fn next_frame(&mut self) -> Result<Option<Mat>> {
        match &mut self.feed {
            Feed::Closed => Err(Error::InvalidInput("Input feeder is not loaded".to_string())),
            Feed::Capture(capture) => {
                let mut frame = Mat::default();
                if capture.read(&mut frame)? && !frame.empty() {
                    Ok(Some(frame))
                } else {
                    Ok(None)
                }
            }
            Feed::Still(image, _) => Ok(image.take()),
        }
    }

    /// Frame size as reported by the source
    ///
    /// # Errors
    ///
    /// Returns an error if the feeder was not loaded or the property query fails
    #[allow(clippy::cast_possible_truncation)] // Frame dimensions are whole numbers
    pub fn frame_size(&self) -> Result<Size> {
        match &self.feed {
            Feed::Closed => Err(Error::InvalidInput("Input feeder is not loaded".to_string())),
            Feed::Capture(capture) => Ok(Size::new(
                capture.get(CAP_PROP_FRAME_WIDTH)? as i32,
                capture.get(CAP_PROP_FRAME_HEIGHT)? as i32,
            )),
            Feed::Still(_, size) => Ok(*size),
        }
    }

    /// Frame rate, falling back to [`DEFAULT_FPS`] when the backend reports none
    ///
    /// # Errors
    ///
    /// Returns an error if the property query fails
    pub fn fps(&self) -> Result<f64> {
        let reported = match &self.feed {
            Feed::Capture(capture) => capture.get(CAP_PROP_FPS)?,
            Feed::Closed | Feed::Still(..) => 0.0,
        };
        Ok(if reported > 0.0 { reported } else { DEFAULT_FPS })
    }

    /// Release the capture
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release
    pub fn close(&mut self) -> Result<()> {
        if let Feed::Capture(capture) = &mut self.feed {
            capture.release()?;
        }
        self.feed = Feed::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, Vector, CV_8UC3};
    use std::fs;

    #[test]
    fn test_cam_keyword() {
        assert_eq!(InputSource::from_arg("CAM").unwrap(), InputSource::Camera(0));
        assert_eq!(InputSource::from_arg("cam").unwrap(), InputSource::Camera(0));
    }

    #[test]
    fn test_missing_path_is_invalid() {
        match InputSource::from_arg("/definitely/not/here.mp4") {
            Err(Error::InvalidInputPath(path)) => assert_eq!(path, PathBuf::from("/definitely/not/here.mp4")),
            other => panic!("Expected InvalidInputPath, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InputSource::from_arg(&dir.path().to_string_lossy()).is_err());
    }

    #[test]
    fn test_extension_selects_source_kind() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        let image = dir.path().join("face.JPG");
        fs::write(&video, b"").unwrap();
        fs::write(&image, b"").unwrap();

        assert_eq!(
            InputSource::from_arg(&video.to_string_lossy()).unwrap(),
            InputSource::Video(video)
        );
        assert_eq!(
            InputSource::from_arg(&image.to_string_lossy()).unwrap(),
            InputSource::Image(image)
        );
    }

    #[test]
    fn test_unloaded_feeder() {
        let mut feeder = InputFeeder::new(InputSource::Camera(0));
        assert!(feeder.next_frame().is_err());
        assert!(feeder.frame_size().is_err());
        assert!((feeder.fps().unwrap() - DEFAULT_FPS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_image_yields_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        let image = Mat::new_rows_cols_with_default(24, 32, CV_8UC3, Scalar::all(128.0)).unwrap();
        imgcodecs::imwrite(&path.to_string_lossy(), &image, &Vector::new()).unwrap();

        let mut feeder = InputFeeder::new(InputSource::from_arg(&path.to_string_lossy()).unwrap());
        feeder.load_data().unwrap();
        assert_eq!(feeder.frame_size().unwrap(), Size::new(32, 24));

        let frame = feeder.next_frame().unwrap().unwrap();
        assert_eq!(frame.rows(), 24);
        assert!(feeder.next_frame().unwrap().is_none());
        feeder.close().unwrap();
    }
}
