//! Debug overlays: face box, eye boxes, pose text and projected head pose axes.
//!
//! The axis overlay rotates a unit cross by `Rz(roll) · Ry(yaw) · Rx(pitch)`,
//! pushes it `focal` units in front of the camera, and projects it with a
//! pinhole model centred on the face.

use crate::{
    constants::{AXIS_FOCAL_LENGTH, AXIS_SCALE, PREVIEW_PANE_SIZE},
    face_detection::FaceDetection,
    head_pose::HeadPose,
    landmark_detection::EyeRegions,
    utils::rect_center,
    Error, Result,
};
use ndarray::{arr1, arr2, Array1, Array2};
use opencv::{
    core::{self, Mat, Point, Scalar, Size},
    imgproc::{self, InterpolationFlags, FONT_HERSHEY_COMPLEX, LINE_8},
    prelude::*,
};
use std::str::FromStr;

/// Rotation matrix for head pose angles in degrees, composed as `Rz(roll) · Ry(yaw) · Rx(pitch)`
#[must_use]
pub fn rotation_matrix(yaw: f64, pitch: f64, roll: f64) -> Array2<f64> {
    let (sy, cy) = yaw.to_radians().sin_cos();
    let (sp, cp) = pitch.to_radians().sin_cos();
    let (sr, cr) = roll.to_radians().sin_cos();

    let r_x = arr2(&[[1.0, 0.0, 0.0], [0.0, cp, -sp], [0.0, sp, cp]]);
    let r_y = arr2(&[[cy, 0.0, -sy], [0.0, 1.0, 0.0], [sy, 0.0, cy]]);
    let r_z = arr2(&[[cr, -sr, 0.0], [sr, cr, 0.0], [0.0, 0.0, 1.0]]);

    r_z.dot(&r_y).dot(&r_x)
}

/// Projected endpoints of the head pose axes, in image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisProjection {
    /// Face centre the x and y axes start from
    pub origin: (f64, f64),
    /// End of the x axis
    pub x_end: (f64, f64),
    /// End of the y axis
    pub y_end: (f64, f64),
    /// Tail of the z axis (behind the face)
    pub z_start: (f64, f64),
    /// Head of the z axis (towards the camera)
    pub z_end: (f64, f64),
}

/// Project the rotated axes with focal length `focal` around `center`.
///
/// The centre is truncated to whole pixels first, as the camera matrix is built from pixel indices.
#[must_use]
pub fn project_axes(center: (f64, f64), yaw: f64, pitch: f64, roll: f64, scale: f64, focal: f64) -> AxisProjection {
    let cx = center.0.trunc();
    let cy = center.1.trunc();
    let rotation = rotation_matrix(yaw, pitch, roll);
    let offset = arr1(&[0.0, 0.0, focal]);

    let project = |axis: Array1<f64>| {
        let v = rotation.dot(&axis) + &offset;
        (v[0] / v[2] * focal + cx, v[1] / v[2] * focal + cy)
    };

    AxisProjection {
        origin: (cx, cy),
        x_end: project(arr1(&[scale, 0.0, 0.0])),
        y_end: project(arr1(&[0.0, -scale, 0.0])),
        z_start: project(arr1(&[0.0, 0.0, scale])),
        z_end: project(arr1(&[0.0, 0.0, -scale])),
    }
}

/// Truncate a projected point to a pixel
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Saturating truncation toward zero is intended
pub fn to_pixel(point: (f64, f64)) -> Point {
    Point::new(point.0 as i32, point.1 as i32)
}

/// Draw the head pose axes: x red, y green, z blue with a dot at its head
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails
pub fn draw_axes(image: &mut Mat, center: (f64, f64), pose: &HeadPose, scale: f64, focal: f64) -> Result<()> {
    let axes = project_axes(
        center,
        f64::from(pose.yaw),
        f64::from(pose.pitch),
        f64::from(pose.roll),
        scale,
        focal,
    );
    let origin = to_pixel(axes.origin);
    let z_end = to_pixel(axes.z_end);

    imgproc::line(image, origin, to_pixel(axes.x_end), Scalar::new(0.0, 0.0, 255.0, 0.0), 2, LINE_8, 0)?;
    imgproc::line(image, origin, to_pixel(axes.y_end), Scalar::new(0.0, 255.0, 0.0, 0.0), 2, LINE_8, 0)?;
    imgproc::line(image, to_pixel(axes.z_start), z_end, Scalar::new(255.0, 0.0, 0.0, 0.0), 2, LINE_8, 0)?;
    imgproc::circle(image, z_end, 3, Scalar::new(255.0, 0.0, 0.0, 0.0), 2, LINE_8, 0)?;

    Ok(())
}

/// Which stage outputs to overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualizationFlags {
    /// `fd`: face detection
    pub face: bool,
    /// `fl`: facial landmarks (eye boxes)
    pub landmarks: bool,
    /// `hp`: head pose angles
    pub head_pose: bool,
    /// `ge`: gaze / head pose axes
    pub gaze: bool,
}

impl VisualizationFlags {
    /// Parse a list of flag names
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown flag
    pub fn parse<S: AsRef<str>>(flags: &[S]) -> Result<Self> {
        flags.iter().try_fold(Self::default(), |mut parsed, flag| {
            match flag.as_ref().parse::<Flag>()? {
                Flag::Face => parsed.face = true,
                Flag::Landmarks => parsed.landmarks = true,
                Flag::HeadPose => parsed.head_pose = true,
                Flag::Gaze => parsed.gaze = true,
            }
            Ok(parsed)
        })
    }

    /// Number of enabled overlays
    #[must_use]
    pub fn count(&self) -> usize {
        [self.face, self.landmarks, self.head_pose, self.gaze]
            .iter()
            .filter(|enabled| **enabled)
            .count()
    }

    /// True when no overlay is enabled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

enum Flag {
    Face,
    Landmarks,
    HeadPose,
    Gaze,
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fd" => Ok(Self::Face),
            "fl" => Ok(Self::Landmarks),
            "hp" => Ok(Self::HeadPose),
            "ge" => Ok(Self::Gaze),
            other => Err(Error::InvalidInput(format!(
                "Unknown visualization flag {other}, expected fd, fl, hp or ge"
            ))),
        }
    }
}

/// Per-frame stage outputs the preview draws from
pub struct FrameOverlay<'a> {
    /// Face crop
    pub face_image: &'a Mat,
    /// Face box in the frame
    pub face: &'a FaceDetection,
    /// Eye boxes in the face crop
    pub eyes: &'a EyeRegions,
    /// Head pose
    pub pose: &'a HeadPose,
}

/// Build the preview pane.
///
/// With `fd` alone the preview is the frame with the face box; with `fd` plus
/// other flags, or with `fl`, it is the face crop. The axis overlay goes on the
/// crop when the preview is the crop, otherwise onto `frame` itself at the face centre.
///
/// # Errors
///
/// Returns an error if an `OpenCV` call fails
pub fn render_preview(frame: &mut Mat, overlay: &FrameOverlay<'_>, flags: VisualizationFlags) -> Result<Mat> {
    let mut preview = frame.try_clone()?;

    if flags.face {
        if flags.count() == 1 {
            imgproc::rectangle(
                &mut preview,
                overlay.face.bbox,
                Scalar::new(255.0, 0.0, 0.0, 0.0),
                3,
                LINE_8,
                0,
            )?;
        } else {
            preview = overlay.face_image.try_clone()?;
        }
    }

    if flags.landmarks {
        if !flags.face {
            preview = overlay.face_image.try_clone()?;
        }
        imgproc::rectangle(&mut preview, overlay.eyes.left_box, Scalar::new(255.0, 0.0, 250.0, 0.0), 1, LINE_8, 0)?;
        imgproc::rectangle(&mut preview, overlay.eyes.right_box, Scalar::new(255.0, 0.0, 255.0, 0.0), 1, LINE_8, 0)?;
    }

    if flags.head_pose {
        let text = format!(
            "yaw:{:.2} | pitch:{:.2} | roll:{:.2}",
            overlay.pose.yaw, overlay.pose.pitch, overlay.pose.roll
        );
        imgproc::put_text(
            &mut preview,
            &text,
            Point::new(20, 40),
            FONT_HERSHEY_COMPLEX,
            0.35,
            Scalar::new(255.0, 0.0, 255.0, 0.0),
            2,
            LINE_8,
            false,
        )?;
    }

    if flags.gaze {
        if flags.face || flags.landmarks {
            let center = (
                f64::from(overlay.face_image.cols()) / 2.0,
                f64::from(overlay.face_image.rows()) / 2.0,
            );
            draw_axes(&mut preview, center, overlay.pose, AXIS_SCALE, AXIS_FOCAL_LENGTH)?;
        } else {
            let center = rect_center(overlay.face.bbox);
            draw_axes(frame, center, overlay.pose, AXIS_SCALE, AXIS_FOCAL_LENGTH)?;
        }
    }

    Ok(preview)
}

/// Window content: the frame alone, or frame and preview side by side
///
/// # Errors
///
/// Returns an error if resizing or concatenation fails
pub fn compose_display(frame: &Mat, preview: Option<&Mat>) -> Result<Mat> {
    let pane = |image: &Mat| -> Result<Mat> {
        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(PREVIEW_PANE_SIZE, PREVIEW_PANE_SIZE),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;
        Ok(resized)
    };

    let left = pane(frame)?;
    match preview {
        None => Ok(left),
        Some(preview) => {
            let right = pane(preview)?;
            let mut combined = Mat::default();
            core::hconcat2(&left, &right, &mut combined)?;
            Ok(combined)
        }
    }
}
