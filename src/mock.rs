//! Mock camera implementation for testing without hardware.

use crate::traits::{
    AwbGains, AwbMode, CameraDevice, CameraError, DeviceCapabilities, ExposureMode, Fraction,
    PreviewWindow, Result,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One recorded device interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `start_preview` was called.
    StartPreview,
    /// `set_iso` with the given ISO.
    SetIso(u32),
    /// `set_shutter_speed` with the given microseconds.
    SetShutter(u32),
    /// `set_exposure_mode` with the given mode.
    SetExposureMode(ExposureMode),
    /// `awb_gains` was read.
    ReadGains,
    /// `set_awb_mode` with the given mode.
    SetAwbMode(AwbMode),
    /// `set_awb_gains` with the given pair.
    SetGains(AwbGains),
    /// `capture` to the given destination.
    Capture(PathBuf),
    /// `stop_preview` was called.
    StopPreview,
    /// The camera was dropped.
    Released,
}

/// Shared, clonable view of a mock camera's recorded calls.
///
/// Clone the log before handing the camera to a session; the session
/// consumes the camera, the log survives it.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl CallLog {
    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    /// Snapshot of the calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

/// Mock camera for exercising sessions without hardware.
///
/// Records every trait call in a shared [`CallLog`], reports a
/// configurable gain pair, and writes a tiny JPEG-framed stub for each
/// capture so filesystem behavior can be asserted. Captures can be
/// scripted to fail at a chosen point.
pub struct MockCamera {
    capabilities: DeviceCapabilities,
    gains: AwbGains,
    log: CallLog,
    captures: u32,
    fail_on_capture: Option<u32>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    /// Create a new mock camera with default gains and a fresh log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: DeviceCapabilities {
                driver: "mock".to_owned(),
                card: "Mock Camera".to_owned(),
                bus_info: "mock:0".to_owned(),
                can_capture: true,
                can_stream: true,
            },
            gains: AwbGains::new(Fraction::new(379, 256), Fraction::new(311, 256)),
            log: CallLog::default(),
            captures: 0,
            fail_on_capture: None,
        }
    }

    /// Set the gain pair reported by `awb_gains`.
    #[must_use]
    pub fn with_gains(mut self, gains: AwbGains) -> Self {
        self.gains = gains;
        self
    }

    /// Make the `n`-th capture (1-based) fail with `CaptureFailed`.
    #[must_use]
    pub fn failing_on_capture(mut self, n: u32) -> Self {
        self.fail_on_capture = Some(n);
        self
    }

    /// Handle to the shared call log.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl CameraDevice for MockCamera {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn set_iso(&mut self, iso: u32) -> Result<()> {
        self.log.push(Call::SetIso(iso));
        Ok(())
    }

    fn set_shutter_speed(&mut self, microseconds: u32) -> Result<()> {
        self.log.push(Call::SetShutter(microseconds));
        Ok(())
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> Result<()> {
        self.log.push(Call::SetExposureMode(mode));
        Ok(())
    }

    fn set_awb_mode(&mut self, mode: AwbMode) -> Result<()> {
        self.log.push(Call::SetAwbMode(mode));
        Ok(())
    }

    fn awb_gains(&self) -> Result<AwbGains> {
        self.log.push(Call::ReadGains);
        Ok(self.gains)
    }

    fn set_awb_gains(&mut self, gains: AwbGains) -> Result<()> {
        self.log.push(Call::SetGains(gains));
        Ok(())
    }

    fn start_preview(&mut self, _window: &PreviewWindow) -> Result<()> {
        self.log.push(Call::StartPreview);
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<()> {
        self.log.push(Call::StopPreview);
        Ok(())
    }

    fn capture(&mut self, destination: &Path) -> Result<()> {
        self.captures += 1;
        self.log.push(Call::Capture(destination.to_path_buf()));
        if self.fail_on_capture == Some(self.captures) {
            return Err(CameraError::CaptureFailed(format!(
                "scripted failure on capture {}",
                self.captures
            )));
        }
        fs::write(destination, stub_jpeg(self.captures))?;
        Ok(())
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        self.log.push(Call::Released);
    }
}

/// Minimal JPEG-framed payload: SOI marker, sequence counter, EOI marker.
fn stub_jpeg(sequence: u32) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend_from_slice(&sequence.to_be_bytes());
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_camera_creation() {
        let camera = MockCamera::new();
        assert_eq!(camera.capabilities().driver, "mock");
        assert!(camera.capabilities().can_capture);
        assert!(camera.capabilities().can_stream);
    }

    #[test]
    fn test_mock_records_calls_in_order() {
        let mut camera = MockCamera::new();
        let log = camera.log();

        camera.set_iso(100).expect("set_iso should succeed");
        camera
            .set_shutter_speed(2500)
            .expect("set_shutter_speed should succeed");
        camera
            .set_exposure_mode(ExposureMode::Off)
            .expect("set_exposure_mode should succeed");

        assert_eq!(
            log.calls(),
            vec![
                Call::SetIso(100),
                Call::SetShutter(2500),
                Call::SetExposureMode(ExposureMode::Off),
            ]
        );
    }

    #[test]
    fn test_mock_reports_configured_gains() {
        let gains = AwbGains::new(Fraction::new(3, 2), Fraction::new(5, 4));
        let camera = MockCamera::new().with_gains(gains);
        assert_eq!(camera.awb_gains().expect("awb_gains should succeed"), gains);
    }

    #[test]
    fn test_mock_capture_writes_jpeg_stub() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let path = dir.path().join("frame.jpg");

        let mut camera = MockCamera::new();
        camera.capture(&path).expect("capture should succeed");

        let data = fs::read(&path).expect("stub file should exist");
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
        assert_eq!(&data[data.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_mock_scripted_capture_failure() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let first = dir.path().join("a.jpg");
        let second = dir.path().join("b.jpg");

        let mut camera = MockCamera::new().failing_on_capture(2);
        camera.capture(&first).expect("first capture should succeed");
        let err = camera.capture(&second);

        assert!(matches!(err, Err(CameraError::CaptureFailed(_))));
        assert!(first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn test_mock_drop_records_release() {
        let camera = MockCamera::new();
        let log = camera.log();
        drop(camera);
        assert_eq!(log.calls(), vec![Call::Released]);
    }
}
