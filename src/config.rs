//! Session configuration.

use crate::traits::{CameraError, Fraction, PreviewWindow, Resolution, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable inputs for one bracket capture session.
///
/// The defaults reproduce the classic v2-module bracketing setup: 17 fps,
/// full 3280x2464 stills, a single ISO swept across four shutter speeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sensor framerate held for the whole session.
    pub framerate: Fraction,
    /// Still resolution requested from the device.
    pub resolution: Resolution,
    /// ISO values to bracket, in capture order.
    pub iso_list: Vec<u32>,
    /// Shutter speeds to bracket, in microseconds, in capture order.
    pub shutter_list: Vec<u32>,
    /// Base component of every image filename.
    pub base_name: String,
    /// Directory under which the timestamped session directory is created.
    pub output_root: PathBuf,
    /// Extension given to capture files; the encoding itself is whatever
    /// the device produces.
    pub format: String,
    /// Index of the video device to open (`/dev/video{index}`).
    pub device_index: usize,
    /// Pause after the first ISO is applied, letting auto-exposure
    /// converge before the lock.
    pub settle: Duration,
    /// Pause between applying a pair's settings and capturing it. Zero by
    /// default: property writes block until the device has applied them.
    pub pause_between: Duration,
    /// Preview geometry handed to the device.
    pub preview: PreviewWindow,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            framerate: Fraction::from(17),
            resolution: Resolution::new(3280, 2464),
            iso_list: vec![100],
            shutter_list: vec![1000, 2500, 5000, 10000],
            base_name: "raw".to_owned(),
            output_root: PathBuf::from("capture"),
            format: "jpg".to_owned(),
            device_index: 0,
            settle: Duration::from_secs(2),
            pause_between: Duration::ZERO,
            preview: PreviewWindow {
                resolution: Resolution::new(410, 313),
                fullscreen: false,
                origin: (100, 100),
                size: Resolution::new(820, 616),
            },
        }
    }
}

impl SessionConfig {
    /// Replace the filename base.
    #[must_use]
    pub fn with_base_name(mut self, base_name: &str) -> Self {
        self.base_name = base_name.to_owned();
        self
    }

    /// Replace the ISO bracket.
    #[must_use]
    pub fn with_iso_list(mut self, iso_list: Vec<u32>) -> Self {
        self.iso_list = iso_list;
        self
    }

    /// Replace the shutter-speed bracket (microseconds).
    #[must_use]
    pub fn with_shutter_list(mut self, shutter_list: Vec<u32>) -> Self {
        self.shutter_list = shutter_list;
        self
    }

    /// Replace the output root directory.
    #[must_use]
    pub fn with_output_root(mut self, output_root: &Path) -> Self {
        self.output_root = output_root.to_path_buf();
        self
    }

    /// Replace the auto-exposure settle pause.
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Replace the per-pair pause.
    #[must_use]
    pub fn with_pause_between(mut self, pause_between: Duration) -> Self {
        self.pause_between = pause_between;
        self
    }

    /// Replace the video device index.
    #[must_use]
    pub fn with_device_index(mut self, device_index: usize) -> Self {
        self.device_index = device_index;
        self
    }

    /// Number of captures the bracket will produce.
    #[must_use]
    pub fn total_captures(&self) -> usize {
        self.iso_list.len() * self.shutter_list.len()
    }

    /// Validate the configuration.
    ///
    /// Calibration locks onto the first entry of each bracket, so empty
    /// brackets are rejected up front instead of producing an empty run.
    pub fn validate(&self) -> Result<()> {
        if self.iso_list.is_empty() {
            return Err(CameraError::InvalidConfig("ISO list is empty".to_owned()));
        }
        if self.shutter_list.is_empty() {
            return Err(CameraError::InvalidConfig(
                "shutter speed list is empty".to_owned(),
            ));
        }
        if self.iso_list.contains(&0) {
            return Err(CameraError::InvalidConfig(
                "ISO values must be positive".to_owned(),
            ));
        }
        if self.shutter_list.contains(&0) {
            return Err(CameraError::InvalidConfig(
                "shutter speeds must be positive".to_owned(),
            ));
        }
        if self.framerate.numerator == 0 || self.framerate.denominator == 0 {
            return Err(CameraError::InvalidConfig(
                "framerate must be positive".to_owned(),
            ));
        }
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(CameraError::InvalidConfig(
                "resolution must be non-zero".to_owned(),
            ));
        }
        if self.base_name.is_empty() {
            return Err(CameraError::InvalidConfig("base name is empty".to_owned()));
        }
        Ok(())
    }
}
