//! Clamping casts from model coordinates to pixel and pointer coordinates

/// Clamp and convert f32 to i32 for pixel coordinates. Non-finite values map to `min`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    (value.clamp(min as f32, max as f32) as i32).clamp(min, max)
}

/// Clamp and convert f64 to i16 for X11 pointer coordinates
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i16_clamp(value: f64, min: i16, max: i16) -> i16 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    value.clamp(f64::from(min), f64::from(max)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_detection_coordinates_clamp_to_frame() {
        assert_eq!(f32_to_i32_clamp(0.5 * 640.0, 0, 640), 320);
        assert_eq!(f32_to_i32_clamp(-0.02 * 640.0, 0, 640), 0);
        assert_eq!(f32_to_i32_clamp(1.1 * 480.0, 0, 480), 480);
        assert_eq!(f32_to_i32_clamp(f32::NAN, 0, 100), 0);
        assert_eq!(f32_to_i32_clamp(50.0, 100, 0), 50);
    }

    #[test]
    fn test_pointer_coordinates_clamp_to_screen() {
        assert_eq!(f64_to_i16_clamp(1919.6, 0, 1919), 1919);
        assert_eq!(f64_to_i16_clamp(-3.0, 0, 1079), 0);
        assert_eq!(f64_to_i16_clamp(f64::INFINITY, 0, 10), 0);
        assert_eq!(f64_to_i16_clamp(7.9, 0, 10), 7);
    }

    proptest! {
        #[test]
        fn prop_f32_to_i32_clamp_always_within_bounds(
            value in any::<f32>(),
            min in any::<i32>(),
            max in any::<i32>()
        ) {
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            let result = f32_to_i32_clamp(value, min, max);
            prop_assert!(result >= min);
            prop_assert!(result <= max);
        }

        #[test]
        fn prop_f64_to_i16_clamp_within_screen(value in any::<f64>(), max in 1i16..8192) {
            let result = f64_to_i16_clamp(value, 0, max);
            prop_assert!((0..=max).contains(&result));
        }
    }
}
