//! Bracketed capture sessions: directory setup, the calibration lock, the
//! capture loop, and the manifest.

use crate::config::SessionConfig;
use crate::manifest::SessionManifest;
use crate::traits::{AwbGains, AwbMode, CameraDevice, CameraError, ExposureMode, Result};
use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

/// What a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// The timestamped session directory.
    pub dir: PathBuf,
    /// Every captured image, in capture order.
    pub images: Vec<PathBuf>,
    /// Path of the written manifest.
    pub manifest: PathBuf,
    /// The gain pair the session was locked to.
    pub gains: AwbGains,
}

/// One bracketed capture session over one camera device.
///
/// The session owns the device for its whole lifetime, so the handle is
/// released when the session ends, on the failure path included. The
/// preview is stopped on both paths as well; only the manifest is
/// reserved for fully successful runs.
pub struct BracketSession<C: CameraDevice> {
    camera: C,
    config: SessionConfig,
}

impl<C: CameraDevice> BracketSession<C> {
    /// Create a session around an already-open device.
    #[must_use]
    pub fn new(camera: C, config: SessionConfig) -> Self {
        Self { camera, config }
    }

    /// Run the session to completion: create the output directory, lock
    /// calibration, capture the full bracket, then stop the preview and
    /// write the manifest.
    ///
    /// Fails fast: the first error aborts the remaining bracket, and any
    /// already-captured files are left in place for inspection.
    pub fn run(mut self) -> Result<SessionReport> {
        self.config.validate()?;

        let dir = create_session_dir(&self.config.output_root, &Local::now())?;
        let total = self.config.total_captures();
        log::info!("Taking {total} pictures into {}", dir.display());

        let outcome = self.capture_bracket(&dir);
        let stopped = self.camera.stop_preview();

        let (gains, images) = outcome?;
        stopped?;

        let manifest = SessionManifest {
            exposure_mode: ExposureMode::Off,
            awb_mode: AwbMode::Off,
            gains,
            isos: self.config.iso_list.clone(),
            shutter_speeds: self.config.shutter_list.clone(),
        }
        .write(&dir)?;
        log::info!("Done.");

        Ok(SessionReport {
            dir,
            images,
            manifest,
            gains,
        })
    }

    /// Start the preview, lock calibration, and walk the bracket.
    fn capture_bracket(&mut self, dir: &Path) -> Result<(AwbGains, Vec<PathBuf>)> {
        self.camera.start_preview(&self.config.preview)?;
        let gains = self.calibrate()?;

        let pairs = bracket_pairs(&self.config);
        let mut images = Vec::with_capacity(pairs.len());
        for (iso, shutter) in pairs {
            let iteration_start = Instant::now();
            log::info!("Setting ISO={iso}, shutter speed={shutter}");
            self.camera.set_iso(iso)?;
            self.camera.set_shutter_speed(shutter)?;
            if !self.config.pause_between.is_zero() {
                thread::sleep(self.config.pause_between);
            }

            let destination = dir.join(image_file_name(
                &self.config.base_name,
                iso,
                shutter,
                &self.config.format,
            ));
            let capture_start = Instant::now();
            self.camera.capture(&destination)?;
            let end = Instant::now();
            log::info!(
                "Capture took {:.2} s and iteration {:.2} s",
                (end - capture_start).as_secs_f64(),
                (end - iteration_start).as_secs_f64()
            );
            images.push(destination);
        }

        Ok((gains, images))
    }

    /// The exposure and white-balance lock.
    ///
    /// Ordering is load-bearing: the settle pause lets auto-exposure
    /// converge on the first ISO before the manual shutter value lands,
    /// gains are read while AWB is still active, and the pair is
    /// re-applied after the mode switch because some devices reset the
    /// gain controls when AWB turns off.
    fn calibrate(&mut self) -> Result<AwbGains> {
        let Some(&iso) = self.config.iso_list.first() else {
            return Err(CameraError::InvalidConfig("ISO list is empty".to_owned()));
        };
        let Some(&shutter) = self.config.shutter_list.first() else {
            return Err(CameraError::InvalidConfig(
                "shutter speed list is empty".to_owned(),
            ));
        };

        self.camera.set_iso(iso)?;
        thread::sleep(self.config.settle);
        self.camera.set_shutter_speed(shutter)?;
        self.camera.set_exposure_mode(ExposureMode::Off)?;

        let gains = self.camera.awb_gains()?;
        self.camera.set_awb_mode(AwbMode::Off)?;
        self.camera.set_awb_gains(gains)?;
        log::info!("Gains fixed to: {gains}");

        Ok(gains)
    }
}

/// Ordered Cartesian product of the two brackets: ISO-major,
/// shutter-minor.
fn bracket_pairs(config: &SessionConfig) -> Vec<(u32, u32)> {
    config
        .iso_list
        .iter()
        .flat_map(|&iso| config.shutter_list.iter().map(move |&shutter| (iso, shutter)))
        .collect()
}

/// Deterministic image filename for one (ISO, shutter) pair.
#[must_use]
pub fn image_file_name(base: &str, iso: u32, shutter: u32, format: &str) -> String {
    format!("{base}-{iso}-{shutter}.{format}")
}

/// Directory name for a session starting at `now`.
fn session_dir_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Create the timestamped session directory under `root`.
///
/// Creation is idempotent: a directory that already exists (a re-run
/// within the same second) is reused as-is.
fn create_session_dir<Tz: TimeZone>(root: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let dir = root.join(session_dir_name(now));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
