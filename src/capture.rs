use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::scan::dto::RawCapture;

/// JPEG quality factor used for frame grabs.
pub const CAPTURE_QUALITY: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    Front,
    Rear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    /// Rear camera on handhelds, front camera otherwise.
    pub fn preferred_facing(self) -> CameraFacing {
        match self {
            DeviceClass::Mobile => CameraFacing::Rear,
            DeviceClass::Desktop => CameraFacing::Front,
        }
    }
}

/// Access to the platform camera. Opening may be denied by the user or
/// unsupported on the device; both surface as `camera` errors.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>, ScanError>;
}

/// A live camera stream. The stream exclusively owns its device tracks
/// for its lifetime.
pub trait CameraStream: Send {
    /// Grab the current frame as an encoded image at the given quality.
    fn grab_frame(&mut self, quality: f32) -> Result<RawCapture, ScanError>;

    /// Stop every track owned by the stream. Idempotent.
    fn stop_all_tracks(&mut self);

    fn active_tracks(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    RequestingDevice,
    Streaming,
    /// Terminal: a frame was handed off.
    Captured,
    /// Terminal: device access denied or the stream failed.
    Denied,
    /// Terminal: user backed out without capturing.
    Cancelled,
}

/// Owns the camera lifecycle for one capture session: acquire stream,
/// grab a frame, release. Every exit from `Streaming` stops all tracks,
/// whichever edge is taken.
pub struct CaptureController {
    device: Arc<dyn CameraDevice>,
    device_class: DeviceClass,
    state: CaptureState,
    stream: Option<Box<dyn CameraStream>>,
}

impl CaptureController {
    pub fn new(device: Arc<dyn CameraDevice>, device_class: DeviceClass) -> Self {
        Self {
            device,
            device_class,
            state: CaptureState::Idle,
            stream: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Idle -> RequestingDevice -> Streaming, or Denied when access fails.
    pub async fn activate(&mut self) -> Result<(), ScanError> {
        if self.state != CaptureState::Idle {
            return Err(ScanError::Camera(
                "capture session already used, start a new one".into(),
            ));
        }
        self.state = CaptureState::RequestingDevice;
        let facing = self.device_class.preferred_facing();
        debug!(?facing, "requesting camera");

        match self.device.open(facing).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = CaptureState::Streaming;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "camera access denied");
                self.state = CaptureState::Denied;
                Err(err)
            }
        }
    }

    /// Streaming -> Captured, handing off the frame. The stream is
    /// released whether or not the grab succeeds.
    pub fn capture(&mut self) -> Result<RawCapture, ScanError> {
        let mut stream = match self.stream.take() {
            Some(stream) if self.state == CaptureState::Streaming => stream,
            _ => {
                return Err(ScanError::Camera("no active camera stream".into()));
            }
        };

        let frame = stream.grab_frame(CAPTURE_QUALITY);
        stream.stop_all_tracks();

        match frame {
            Ok(capture) => {
                self.state = CaptureState::Captured;
                Ok(capture)
            }
            Err(err) => {
                warn!(error = %err, "frame grab failed");
                self.state = CaptureState::Denied;
                Err(err)
            }
        }
    }

    /// Streaming -> Cancelled, releasing the stream without a capture.
    pub fn cancel(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
        }
        if matches!(
            self.state,
            CaptureState::RequestingDevice | CaptureState::Streaming
        ) {
            self.state = CaptureState::Cancelled;
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
        }
    }
}
