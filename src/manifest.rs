//! Session manifest (`params.txt`) rendering and writing.
//!
//! The manifest records the calibration state a session ran with, so
//! shots from different sessions can be compared later.

use crate::traits::{AwbGains, AwbMode, ExposureMode, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the manifest file inside a session directory.
pub const MANIFEST_FILE: &str = "params.txt";

/// Calibration values and bracket lists of one finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionManifest {
    /// Exposure mode after the calibration lock.
    pub exposure_mode: ExposureMode,
    /// AWB mode after the calibration lock.
    pub awb_mode: AwbMode,
    /// The locked white-balance gains.
    pub gains: AwbGains,
    /// ISO bracket, in capture order.
    pub isos: Vec<u32>,
    /// Shutter bracket in microseconds, in capture order.
    pub shutter_speeds: Vec<u32>,
}

impl SessionManifest {
    /// Render the manifest text, one `key: value` line per entry.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Exposure mode: {}\nAWB mode: {}\nGains: {}\nISOs: {}\nShutter speeds: {}\n",
            self.exposure_mode,
            self.awb_mode,
            self.gains,
            render_list(&self.isos),
            render_list(&self.shutter_speeds),
        )
    }

    /// Write the manifest into `dir`, replacing any previous one.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}

/// `[a, b, c]` rendering, order preserved.
fn render_list(values: &[u32]) -> String {
    let inner = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}
