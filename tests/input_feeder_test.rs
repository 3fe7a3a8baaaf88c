//! Tests for frame sources and the files a run leaves behind


use gaze_pointer::{
    constants::{DEFAULT_FPS, STATS_FILE_NAME},
    input_feeder::{InputFeeder, InputSource},
    stats::RunStats,
    Error, Result,
};
use opencv::prelude::*;
use std::fs;
use std::time::Duration;
use test_helpers::write_test_image;

#[test]
fn test_image_source_yields_one_frame() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("face.png");
    write_test_image(&path, 120, 160)?;

    let source = InputSource::from_arg(&path.to_string_lossy())?;
    assert_eq!(source, InputSource::Image(path.clone()));

    let mut feeder = InputFeeder::new(source);
    assert_eq!(feeder.source(), &InputSource::Image(path.clone()));
    feeder.load_data()?;
    let size = feeder.frame_size()?;
    assert_eq!((size.width, size.height), (160, 120));
    assert!((feeder.fps()? - DEFAULT_FPS).abs() < f64::EPSILON);

    let frame = feeder.next_frame()?.expect("image frame");
    assert_eq!(frame.cols(), 160);
    assert!(feeder.next_frame()?.is_none());

    feeder.close()?;
    assert!(feeder.next_frame().is_err());
    Ok(())
}

#[test]
fn test_extension_is_case_insensitive() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("FACE.JPG");
    fs::write(&path, b"")?;
    assert!(matches!(InputSource::from_arg(&path.to_string_lossy())?, InputSource::Image(_)));
    Ok(())
}

#[test]
fn test_other_files_are_videos() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.mp4");
    fs::write(&path, b"")?;
    assert_eq!(InputSource::from_arg(&path.to_string_lossy())?, InputSource::Video(path));
    Ok(())
}

#[test]
fn test_directory_is_not_an_input() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        InputSource::from_arg(&dir.path().to_string_lossy()),
        Err(Error::InvalidInputPath(_))
    ));
}

#[test]
fn test_corrupt_image_fails_to_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.png");
    fs::write(&path, b"not a png")?;

    let mut feeder = InputFeeder::new(InputSource::Image(path));
    assert!(feeder.load_data().is_err());
    Ok(())
}

#[test]
fn test_unloaded_feeder_reports_errors() {
    let mut feeder = InputFeeder::new(InputSource::Camera(0));
    assert!(feeder.next_frame().is_err());
    assert!(feeder.frame_size().is_err());
    assert!((feeder.fps().unwrap() - DEFAULT_FPS).abs() < f64::EPSILON);
}

#[test]
fn test_stats_file_round_trip_in_output_dir() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("results").join(STATS_FILE_NAME);

    let stats = RunStats::new(90, Duration::from_millis(3_040), Duration::from_millis(820));
    stats.write_to(&path)?;

    let body = fs::read_to_string(&path)?;
    assert_eq!(body.lines().count(), 3);
    assert_eq!(body.lines().next(), Some("3.0"));
    assert_eq!(body.lines().nth(1), Some("30.0"));

    let loaded = RunStats::from_file(&path)?;
    assert!((loaded.inference_secs - 3.0).abs() < 1e-9);
    assert!((loaded.fps - 30.0).abs() < 1e-9);
    assert!((loaded.load_secs - 0.82).abs() < 1e-9);
    Ok(())
}
