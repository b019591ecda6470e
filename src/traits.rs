//! Core types and the camera capability trait.

use std::path::Path;
use thiserror::Error;

/// Rational value used for framerates and white-balance gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    /// Numerator.
    pub numerator: u32,
    /// Denominator (never zero).
    pub denominator: u32,
}

impl Fraction {
    /// Create a new fraction.
    #[must_use]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl From<u32> for Fraction {
    fn from(value: u32) -> Self {
        Self::new(value, 1)
    }
}

impl std::fmt::Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl From<v4l::Fraction> for Fraction {
    fn from(fraction: v4l::Fraction) -> Self {
        Self::new(fraction.numerator, fraction.denominator)
    }
}

impl From<Fraction> for v4l::Fraction {
    fn from(fraction: Fraction) -> Self {
        Self::new(fraction.numerator, fraction.denominator)
    }
}

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Exposure control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    /// Exposure follows the device's auto-exposure algorithm.
    Auto,
    /// Exposure locked; ISO and shutter speed keep their manual values.
    Off,
}

impl std::fmt::Display for ExposureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Auto-white-balance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwbMode {
    /// Gains follow the device's white-balance algorithm.
    Auto,
    /// Gains frozen at their last applied values.
    Off,
}

impl std::fmt::Display for AwbMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// White-balance gain pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwbGains {
    /// Red channel gain.
    pub red: Fraction,
    /// Blue channel gain.
    pub blue: Fraction,
}

impl AwbGains {
    /// Create a new gain pair.
    #[must_use]
    pub const fn new(red: Fraction, blue: Fraction) -> Self {
        Self { red, blue }
    }
}

impl std::fmt::Display for AwbGains {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.red, self.blue)
    }
}

/// Geometry of the operator-facing live preview.
///
/// Advisory only: preview placement never affects captured files, and
/// headless backends are free to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewWindow {
    /// Render resolution of the preview stream.
    pub resolution: Resolution,
    /// Cover the whole screen instead of a window.
    pub fullscreen: bool,
    /// Window origin, pixels from the top-left screen corner.
    pub origin: (i32, i32),
    /// Window size in pixels.
    pub size: Resolution,
}

/// Device capability flags.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

/// Error type for camera and session operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Failed to open the device or apply its initial format.
    #[error("Failed to open device: {0}")]
    DeviceOpenFailed(String),
    /// A device property could not be read or written.
    #[error("Camera control failed: {0}")]
    ControlFailed(String),
    /// Single-frame capture failed.
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// Session configuration was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for camera and session operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Abstraction over the camera operations a capture session needs.
///
/// Every method blocks until the device has acted on the request; a
/// returned `Ok` means the setting is live for the next capture.
pub trait CameraDevice {
    /// Get device capabilities.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Set the sensor ISO sensitivity.
    fn set_iso(&mut self, iso: u32) -> Result<()>;

    /// Set the shutter speed in microseconds.
    fn set_shutter_speed(&mut self, microseconds: u32) -> Result<()>;

    /// Switch the exposure control mode.
    fn set_exposure_mode(&mut self, mode: ExposureMode) -> Result<()>;

    /// Switch the auto-white-balance mode.
    fn set_awb_mode(&mut self, mode: AwbMode) -> Result<()>;

    /// Read the white-balance gains currently in effect.
    fn awb_gains(&self) -> Result<AwbGains>;

    /// Apply a white-balance gain pair.
    fn set_awb_gains(&mut self, gains: AwbGains) -> Result<()>;

    /// Start the live preview. May be a no-op on headless backends.
    fn start_preview(&mut self, window: &PreviewWindow) -> Result<()>;

    /// Stop the live preview.
    fn stop_preview(&mut self) -> Result<()>;

    /// Capture one still into `destination`, encoded in the device's
    /// native output format. Blocks until the file is fully written.
    fn capture(&mut self, destination: &Path) -> Result<()>;
}
