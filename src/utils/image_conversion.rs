//! Image to tensor conversion for the model inputs.

use crate::Result;
use ndarray::Array4;
use opencv::core::{Mat, Size, Vec3b};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;

/// Resize a BGR image and lay it out as a `[1, 3, height, width]` blob.
///
/// Channel order stays BGR and pixel values stay in 0-255, which is what
/// the Open Model Zoo networks were trained on.
///
/// # Errors
///
/// Returns an error if the image is empty, is not 8-bit 3-channel, or the
/// resize fails.
#[allow(clippy::cast_sign_loss)] // Target dimensions are validated positive
pub fn blob_from_image(image: &Mat, width: i32, height: i32) -> Result<Array4<f32>> {
    if image.empty() || width <= 0 || height <= 0 {
        return Err(crate::Error::InvalidInput(format!(
            "Cannot build {width}x{height} blob from {}x{} image",
            image.cols(),
            image.rows()
        )));
    }
    if image.channels() != 3 {
        return Err(crate::Error::InvalidInput(format!(
            "Expected 3-channel image, got {} channels",
            image.channels()
        )));
    }

    let mut resized = Mat::default();
    imgproc::resize(
        image,
        &mut resized,
        Size::new(width, height),
        0.0,
        0.0,
        InterpolationFlags::INTER_LINEAR as i32,
    )?;

    let mut blob = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for row in 0..height {
        for col in 0..width {
            let pixel = resized.at_2d::<Vec3b>(row, col)?;
            for ch in 0..3 {
                blob[[0, ch, row as usize, col as usize]] = f32::from(pixel[ch]);
            }
        }
    }

    Ok(blob)
}
