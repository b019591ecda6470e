//! Bracket capture binary.
//!
//! Runs one bracketed session on `/dev/video0` with the default brackets.
//! The single optional argument overrides the filename base.

use pi_cam_bracket::{BracketSession, CameraDevice, SessionConfig, V4L2Camera};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> pi_cam_bracket::Result<()> {
    let mut config = SessionConfig::default();
    if let Some(name) = std::env::args().nth(1) {
        config = config.with_base_name(&name);
    }

    let camera = V4L2Camera::open(config.device_index, config.framerate, config.resolution)?;
    println!("Device: {}", camera.capabilities().card);
    println!("Driver: {}", camera.capabilities().driver);

    let report = BracketSession::new(camera, config).run()?;
    println!(
        "Wrote {} images and {} to {}",
        report.images.len(),
        pi_cam_bracket::manifest::MANIFEST_FILE,
        report.dir.display()
    );

    Ok(())
}
