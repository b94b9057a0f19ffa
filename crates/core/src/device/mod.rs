mod scripted;

use futures::future::BoxFuture;

pub use scripted::{IssuedStreams, ScriptedMediaDevices, ScriptedStream};

/// Browser-style permission state for camera/microphone access.
///
/// `Prompt` doubles as the degraded answer when the underlying permission
/// API is unavailable; absence of the API is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionState {
    Prompt,
    Granted,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera and microphone access was denied")]
    NotAllowed,
    #[error("no camera or microphone was found")]
    NotFound,
    #[error("the capture device is already in use by another application")]
    Busy,
    #[error("media capture is not supported: {0}")]
    Unsupported(String),
}

/// A live capture stream handle. Implementations own the underlying
/// hardware tracks; `stop_tracks` must be safe to call more than once.
pub trait MediaStream: Send + std::fmt::Debug {
    fn id(&self) -> &str;
    fn stop_tracks(&mut self);
    fn is_live(&self) -> bool;
}

/// Capability layer over the platform device APIs.
///
/// Acquisition is a black box that can be rejected by the user at any
/// time, including after a previously successful grant (revocation).
pub trait MediaDevices: Send + Sync {
    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> BoxFuture<'_, Result<Box<dyn MediaStream>, DeviceError>>;

    fn query_permission(&self) -> BoxFuture<'_, PermissionState>;
}

/// Owns at most one live media stream and guarantees it is torn down
/// exactly through [`DeviceSession::release`], whatever the exit path.
pub struct DeviceSession<D: MediaDevices> {
    devices: D,
    stream: Option<Box<dyn MediaStream>>,
}

impl<D: MediaDevices> DeviceSession<D> {
    pub fn new(devices: D) -> Self {
        Self {
            devices,
            stream: None,
        }
    }

    /// Acquire a fresh stream. Any previously held stream is released
    /// first, so the session never holds two live streams.
    pub async fn acquire(&mut self, constraints: MediaConstraints) -> Result<(), DeviceError> {
        self.release();
        let stream = self.devices.acquire(constraints).await?;
        tracing::debug!(stream_id = stream.id(), "media stream acquired");
        self.stream = Some(stream);
        Ok(())
    }

    /// Idempotent teardown: stops every track and clears the handle.
    /// Safe to call even if nothing was ever acquired.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            tracing::debug!(stream_id = stream.id(), "media stream released");
        }
    }

    pub fn has_live_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    pub async fn query_permission(&self) -> PermissionState {
        self.devices.query_permission().await
    }
}

impl<D: MediaDevices> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}
