//! Pi-Cam-Bracket: bracketed still capture sessions for Raspberry Pi cameras
//!
//! Walks a camera through the Cartesian product of an ISO bracket and a
//! shutter-speed bracket with exposure and white balance locked, producing
//! one image file per pair plus a manifest of the locked parameters. The
//! device boundary is a trait, so sessions run identically against real
//! V4L2 hardware and the in-tree mock.

pub mod config;
pub mod device;
pub mod manifest;
pub mod session;
pub mod traits;

#[cfg(test)]
pub mod mock;

pub use config::SessionConfig;
pub use device::V4L2Camera;
pub use manifest::SessionManifest;
pub use session::{BracketSession, SessionReport};
pub use traits::{
    AwbGains, AwbMode, CameraDevice, CameraError, DeviceCapabilities, ExposureMode, Fraction,
    PreviewWindow, Resolution, Result,
};
