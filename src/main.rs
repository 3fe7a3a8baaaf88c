//! Gaze pointer application: moves the mouse where the user looks.

use anyhow::Result;
use clap::Parser;
use gaze_pointer::{
    app::GazeApp,
    cli::Args,
    config::Config,
    input_feeder::InputSource,
    Error,
};
use log::{error, info};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Gaze Pointer");

    // Load configuration if provided
    let config_file = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    let source = match InputSource::from_arg(&args.input) {
        Ok(source) => source,
        Err(Error::InvalidInputPath(path)) => {
            error!("Unable to find specified input file: {}", path.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    info!("Input: {:?}", source);

    let config = args.apply(config_file)?;
    config.validate()?;

    // Create and run application
    let mut app = GazeApp::new(config, source)?;
    let stats = app.run()?;
    info!(
        "Done: {:.1} s inference, {:.2} fps, {:.3} s model loading",
        stats.inference_secs, stats.fps, stats.load_secs
    );

    Ok(())
}
