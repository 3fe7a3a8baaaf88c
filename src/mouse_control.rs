//! Mouse control module for X11-based systems.
//!
//! Moves the pointer relative to its current position by a gaze
//! displacement scaled by a precision factor, tweened over a duration
//! picked by a speed setting.

use crate::{
    constants::MOUSE_TWEEN_STEPS,
    error::{Error, Result},
    utils::safe_cast::f64_to_i16_clamp,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use x11rb::{
    connection::Connection,
    protocol::xproto::{ConnectionExt, Window},
    rust_connection::RustConnection,
};

/// Pixels moved per unit of gaze displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Precision {
    /// 100 px per unit
    High,
    /// 500 px per unit
    #[default]
    Medium,
    /// 1000 px per unit
    Low,
}

impl Precision {
    /// Pixels per unit of displacement
    #[must_use]
    pub const fn pixels(self) -> f64 {
        match self {
            Self::High => 100.0,
            Self::Medium => 500.0,
            Self::Low => 1000.0,
        }
    }
}

impl TryFrom<String> for Precision {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(Error::ConfigError(format!("Unknown mouse precision: {other}"))),
        }
    }
}

/// How long one pointer move takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Speed {
    /// One second
    #[default]
    Fast,
    /// Five seconds
    Medium,
    /// Ten seconds
    Slow,
}

impl Speed {
    /// Duration of one tweened move
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Fast => Duration::from_secs(1),
            Self::Medium => Duration::from_secs(5),
            Self::Slow => Duration::from_secs(10),
        }
    }
}

impl TryFrom<String> for Speed {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for Speed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "medium" => Ok(Self::Medium),
            "slow" => Ok(Self::Slow),
            other => Err(Error::ConfigError(format!("Unknown mouse speed: {other}"))),
        }
    }
}

/// Screen-pixel offset for a gaze displacement. Screen y grows downwards, gaze y upwards.
#[must_use]
pub fn relative_offset(x: f64, y: f64, precision: Precision) -> (f64, f64) {
    let scale = precision.pixels();
    (x * scale, -y * scale)
}

/// Intermediate pointer positions from `start` to `start + offset`, clamped to the screen.
///
/// The last element is always the destination.
#[must_use]
pub fn tween_path(start: (i16, i16), offset: (f64, f64), steps: u32, screen: (u16, u16)) -> Vec<(i16, i16)> {
    let steps = steps.max(1);
    let max_x = i16::try_from(screen.0.saturating_sub(1)).unwrap_or(i16::MAX);
    let max_y = i16::try_from(screen.1.saturating_sub(1)).unwrap_or(i16::MAX);

    (1..=steps)
        .map(|step| {
            let t = f64::from(step) / f64::from(steps);
            (
                f64_to_i16_clamp(f64::from(start.0) + offset.0 * t, 0, max_x),
                f64_to_i16_clamp(f64::from(start.1) + offset.1 * t, 0, max_y),
            )
        })
        .collect()
}

/// Pointer mover for X11
pub struct MouseController {
    connection: RustConnection,
    root: Window,
    screen_width: u16,
    screen_height: u16,
    precision: Precision,
    speed: Speed,
}

impl MouseController {
    /// Connect to the X server
    ///
    /// # Errors
    ///
    /// Returns an error if there is no X display or no screen
    pub fn new(precision: Precision, speed: Speed) -> Result<Self> {
        info!("Initializing X11 mouse controller ({precision:?} precision, {speed:?} speed)");

        let (connection, screen_num) =
            RustConnection::connect(None).map_err(|e| Error::X11(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::X11("Failed to get screen".to_string()))?;
        let root = screen.root;
        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        info!("Connected to X11 display, screen: {}x{}", screen_width, screen_height);

        Ok(Self {
            connection,
            root,
            screen_width,
            screen_height,
            precision,
            speed,
        })
    }

    /// Current pointer position
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer query fails
    pub fn position(&self) -> Result<(i16, i16)> {
        let reply = self
            .connection
            .query_pointer(self.root)
            .map_err(|e| Error::MouseControl(format!("Failed to send query pointer: {e}")))?
            .reply()
            .map_err(|e| Error::MouseControl(format!("Failed to query pointer: {e}")))?;

        Ok((reply.root_x, reply.root_y))
    }

    /// Move the pointer by a gaze displacement. Blocks for the speed duration.
    ///
    /// # Errors
    ///
    /// Returns an error if querying or warping the pointer fails
    pub fn move_by(&self, x: f64, y: f64) -> Result<()> {
        let offset = relative_offset(x, y, self.precision);
        let start = self.position()?;
        let path = tween_path(
            start,
            offset,
            MOUSE_TWEEN_STEPS,
            (self.screen_width, self.screen_height),
        );
        debug!("Moving pointer from {:?} by ({:.1}, {:.1})", start, offset.0, offset.1);

        let pause = self.speed.duration() / MOUSE_TWEEN_STEPS;
        for (px, py) in path {
            self.warp(px, py)?;
            thread::sleep(pause);
        }

        Ok(())
    }

    /// Screen dimensions
    #[must_use]
    pub const fn screen_size(&self) -> (u16, u16) {
        (self.screen_width, self.screen_height)
    }

    fn warp(&self, x: i16, y: i16) -> Result<()> {
        self.connection
            .warp_pointer(x11rb::NONE, self.root, 0, 0, 0, 0, x, y)
            .map_err(|e| Error::MouseControl(format!("Failed to warp pointer: {e}")))?;

        self.connection
            .flush()
            .map_err(|e| Error::MouseControl(format!("Failed to flush connection: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires X11 display
    fn test_mouse_controller_creation() {
        let controller = MouseController::new(Precision::Medium, Speed::Fast).unwrap();
        let (width, height) = controller.screen_size();
        assert!(width > 0 && height > 0);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Precision::default(), Precision::Medium);
        assert_eq!(Speed::default(), Speed::Fast);
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!("HIGH".parse::<Precision>().unwrap(), Precision::High);
        assert_eq!("slow".parse::<Speed>().unwrap(), Speed::Slow);
        assert!("extreme".parse::<Precision>().is_err());
        assert!("warp".parse::<Speed>().is_err());
    }

    #[test]
    fn test_relative_offset_flips_y() {
        assert_eq!(relative_offset(0.1, 0.2, Precision::Medium), (50.0, -100.0));
        assert_eq!(relative_offset(-1.0, -1.0, Precision::High), (-100.0, 100.0));
        assert_eq!(relative_offset(0.5, 0.0, Precision::Low), (500.0, -0.0));
    }

    #[test]
    fn test_tween_path_reaches_destination() {
        let path = tween_path((100, 100), (40.0, -20.0), 4, (1920, 1080));
        assert_eq!(path, vec![(110, 95), (120, 90), (130, 85), (140, 80)]);
    }

    #[test]
    fn test_tween_path_clamps_to_screen() {
        let path = tween_path((10, 1070), (-50.0, 50.0), 2, (1920, 1080));
        assert_eq!(path.last(), Some(&(0, 1079)));
    }

    #[test]
    fn test_tween_path_zero_steps() {
        assert_eq!(tween_path((5, 5), (1.0, 1.0), 0, (100, 100)), vec![(6, 6)]);
    }
}
