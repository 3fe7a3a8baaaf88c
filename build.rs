//! Build script probing the native libraries the gaze pointer links against.
//!
//! OpenCV and X11 are located through pkg-config. ONNX Runtime is fetched by
//! the `ort` crate unless `ORT_LIB_LOCATION` points at a local install.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let has_pkg_config = probe_pkg_config();
    if has_pkg_config {
        probe_opencv();
        probe_x11();
    }
    probe_onnxruntime();

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

/// Run `pkg-config` with the given arguments, returning trimmed stdout on success
fn pkg_config(args: &[&str]) -> Option<String> {
    let output = Command::new("pkg-config").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn probe_pkg_config() -> bool {
    match pkg_config(&["--version"]) {
        Some(version) => {
            println!("cargo:warning=Found pkg-config version: {version}");
            true
        }
        None => {
            println!("cargo:warning=pkg-config not found. This is required to find OpenCV and X11.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
            false
        }
    }
}

fn probe_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    let version = pkg_config(&["--modversion", "opencv4"]).or_else(|| pkg_config(&["--modversion", "opencv"]));
    match version {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. The highgui, videoio and imgcodecs modules are required.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }
}

fn probe_x11() {
    // Pointer control only exists on Linux
    if !env::var("TARGET").unwrap_or_default().contains("linux") {
        return;
    }
    if pkg_config(&["--exists", "x11"]).is_none() {
        println!("cargo:warning=X11 libraries not found. The mouse pointer will not move.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install libx11-dev");
    }
}

fn probe_onnxruntime() {
    println!("cargo:rerun-if-env-changed=ORT_LIB_LOCATION");
    println!("cargo:rerun-if-env-changed=ORT_STRATEGY");

    if let Ok(location) = env::var("ORT_LIB_LOCATION") {
        println!("cargo:warning=Using ONNX Runtime from {location}");
    }
}
