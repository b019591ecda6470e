//! V4L2 still-camera backend using the v4l crate.
//!
//! Drives a capture node through the classic control set: ISO and
//! exposure via the camera-class controls, white balance via the
//! user-class balance controls. Stills are pulled from the driver's
//! `MJPG` stream so encoding stays in the device ISP. Dropping the
//! camera closes the device handle.

use v4l::buffer::Type;
use v4l::control::{Control, MenuItem, Value};
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::traits::{
    AwbGains, AwbMode, CameraDevice, CameraError, DeviceCapabilities, ExposureMode, Fraction,
    PreviewWindow, Resolution, Result,
};
use std::fs;
use std::path::Path;

// User-class controls (V4L2_CID_BASE).
const CID_AUTO_WHITE_BALANCE: u32 = 0x0098_0900 + 12;
const CID_RED_BALANCE: u32 = 0x0098_0900 + 14;
const CID_BLUE_BALANCE: u32 = 0x0098_0900 + 15;

// Camera-class controls (V4L2_CID_CAMERA_CLASS_BASE).
const CID_EXPOSURE_AUTO: u32 = 0x009a_0900 + 1;
const CID_EXPOSURE_ABSOLUTE: u32 = 0x009a_0900 + 2;
const CID_ISO_SENSITIVITY: u32 = 0x009a_0900 + 23;
const CID_ISO_SENSITIVITY_AUTO: u32 = 0x009a_0900 + 24;

// Menu values for `CID_EXPOSURE_AUTO`.
const EXPOSURE_AUTO: i64 = 0;
const EXPOSURE_MANUAL: i64 = 1;

// Menu value for `CID_ISO_SENSITIVITY_AUTO`.
const ISO_MANUAL: i64 = 0;

/// `CID_EXPOSURE_ABSOLUTE` counts in units of 100 microseconds.
const EXPOSURE_STEP_US: u32 = 100;

/// Driver scale of the balance controls: 1000 means a gain of 1.0.
const BALANCE_SCALE: u32 = 1000;

/// Buffers queued for the one-shot capture stream.
const CAPTURE_BUFFERS: u32 = 2;

/// V4L2-backed still camera.
pub struct V4L2Camera {
    device: Device,
    capabilities: DeviceCapabilities,
}

impl V4L2Camera {
    /// Open `/dev/video{index}` and configure it for `resolution` stills
    /// at `framerate`.
    ///
    /// The driver may adjust both the frame size and the interval; the
    /// adjusted values are accepted and logged, only a refused ioctl
    /// aborts the open.
    pub fn open(index: usize, framerate: Fraction, resolution: Resolution) -> Result<Self> {
        let device =
            Device::new(index).map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;

        let caps = device
            .query_caps()
            .map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;
        let capabilities = DeviceCapabilities {
            driver: caps.driver,
            card: caps.card,
            bus_info: caps.bus,
            can_capture: caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE),
            can_stream: caps.capabilities.contains(v4l::capability::Flags::STREAMING),
        };
        log::debug!(
            "Opened {} ({}) on {}",
            capabilities.card,
            capabilities.driver,
            capabilities.bus_info
        );

        let mut fmt = device
            .format()
            .map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;
        fmt.width = resolution.width;
        fmt.height = resolution.height;
        fmt.fourcc = v4l::FourCC::new(b"MJPG");
        let actual = device
            .set_format(&fmt)
            .map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;
        if actual.width != resolution.width || actual.height != resolution.height {
            log::warn!(
                "Driver adjusted frame size {resolution} to {}",
                Resolution::new(actual.width, actual.height)
            );
        }

        // S_PARM takes the frame interval, the inverse of the framerate.
        let mut params = device
            .params()
            .map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;
        params.interval = v4l::Fraction::new(framerate.denominator, framerate.numerator);
        let params = device
            .set_params(&params)
            .map_err(|err| CameraError::DeviceOpenFailed(err.to_string()))?;
        log::debug!("Frame interval {}", Fraction::from(params.interval));

        Ok(Self {
            device,
            capabilities,
        })
    }

    fn set_ctrl(&self, id: u32, value: Value, what: &str) -> Result<()> {
        self.device
            .set_control(Control { id, value })
            .map_err(|err| CameraError::ControlFailed(format!("{what}: {err}")))
    }

    fn ctrl_value(&self, id: u32, what: &str) -> Result<i64> {
        let ctrl = self
            .device
            .control(id)
            .map_err(|err| CameraError::ControlFailed(format!("{what}: {err}")))?;
        match ctrl.value {
            Value::Integer(value) => Ok(value),
            Value::Boolean(value) => Ok(i64::from(value)),
            other => Err(CameraError::ControlFailed(format!(
                "{what}: unexpected control payload {other:?}"
            ))),
        }
    }

    /// Resolve an ISO value to its `CID_ISO_SENSITIVITY` menu index.
    ///
    /// The control is an integer menu: `S_CTRL` takes the entry index,
    /// and the entries carry the ISO values the sensor offers.
    fn iso_menu_index(&self, iso: u32) -> Result<u32> {
        let controls = self
            .device
            .query_controls()
            .map_err(|err| CameraError::ControlFailed(format!("iso sensitivity menu: {err}")))?;
        let menu = controls
            .into_iter()
            .find(|ctrl| ctrl.id == CID_ISO_SENSITIVITY)
            .and_then(|ctrl| ctrl.items)
            .ok_or_else(|| {
                CameraError::ControlFailed("driver reports no iso sensitivity menu".to_owned())
            })?;
        find_iso_menu_index(&menu, iso).ok_or_else(|| {
            CameraError::ControlFailed(format!("ISO {iso} is not offered by the sensor"))
        })
    }
}

impl CameraDevice for V4L2Camera {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn set_iso(&mut self, iso: u32) -> Result<()> {
        self.set_ctrl(
            CID_ISO_SENSITIVITY_AUTO,
            Value::Integer(ISO_MANUAL),
            "iso sensitivity mode",
        )?;
        let index = self.iso_menu_index(iso)?;
        self.set_ctrl(
            CID_ISO_SENSITIVITY,
            Value::Integer(i64::from(index)),
            "iso sensitivity",
        )
    }

    fn set_shutter_speed(&mut self, microseconds: u32) -> Result<()> {
        let ticks = i64::from((microseconds / EXPOSURE_STEP_US).max(1));
        self.set_ctrl(CID_EXPOSURE_ABSOLUTE, Value::Integer(ticks), "exposure time")
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> Result<()> {
        let value = match mode {
            ExposureMode::Auto => EXPOSURE_AUTO,
            ExposureMode::Off => EXPOSURE_MANUAL,
        };
        self.set_ctrl(CID_EXPOSURE_AUTO, Value::Integer(value), "exposure mode")
    }

    fn set_awb_mode(&mut self, mode: AwbMode) -> Result<()> {
        let on = matches!(mode, AwbMode::Auto);
        self.set_ctrl(CID_AUTO_WHITE_BALANCE, Value::Boolean(on), "awb mode")
    }

    fn awb_gains(&self) -> Result<AwbGains> {
        let red = self.ctrl_value(CID_RED_BALANCE, "red balance")?;
        let blue = self.ctrl_value(CID_BLUE_BALANCE, "blue balance")?;
        Ok(AwbGains::new(balance_to_gain(red), balance_to_gain(blue)))
    }

    fn set_awb_gains(&mut self, gains: AwbGains) -> Result<()> {
        self.set_ctrl(
            CID_RED_BALANCE,
            Value::Integer(gain_to_balance(gains.red)),
            "red balance",
        )?;
        self.set_ctrl(
            CID_BLUE_BALANCE,
            Value::Integer(gain_to_balance(gains.blue)),
            "blue balance",
        )
    }

    fn start_preview(&mut self, window: &PreviewWindow) -> Result<()> {
        log::debug!(
            "No preview surface on this backend; ignoring {} window at ({}, {})",
            window.size,
            window.origin.0,
            window.origin.1
        );
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<()> {
        Ok(())
    }

    fn capture(&mut self, destination: &Path) -> Result<()> {
        let mut stream = Stream::with_buffers(&self.device, Type::VideoCapture, CAPTURE_BUFFERS)
            .map_err(|err| CameraError::CaptureFailed(err.to_string()))?;
        let (buf, meta) = stream
            .next()
            .map_err(|err| CameraError::CaptureFailed(err.to_string()))?;

        let used = usize::try_from(meta.bytesused).unwrap_or(buf.len());
        let data = buf.get(..used).unwrap_or(buf);
        fs::write(destination, data)?;
        log::debug!("Wrote {} bytes to {}", data.len(), destination.display());
        Ok(())
    }
}

/// Find the menu index of the entry whose value equals `iso`.
fn find_iso_menu_index(items: &[(u32, MenuItem)], iso: u32) -> Option<u32> {
    items.iter().find_map(|(index, item)| match item {
        MenuItem::Value(value) if *value == i64::from(iso) => Some(*index),
        _ => None,
    })
}

/// Convert a raw balance control value to a gain fraction.
fn balance_to_gain(raw: i64) -> Fraction {
    let raw = u32::try_from(raw).unwrap_or(0);
    Fraction::new(raw, BALANCE_SCALE)
}

/// Convert a gain fraction to a raw balance control value.
fn gain_to_balance(gain: Fraction) -> i64 {
    if gain.denominator == 0 {
        return i64::from(BALANCE_SCALE);
    }
    i64::from(gain.numerator) * i64::from(BALANCE_SCALE) / i64::from(gain.denominator)
}
