mod scripted;

use crate::config::ChunkInterval;
use crate::device::{DeviceError, DeviceSession, MediaConstraints, MediaDevices};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

pub use scripted::ScriptedEncoder;

/// Encoder formats in descending preference order, most
/// compressed/standard first. The order is a behavioral contract.
pub const DEFAULT_MIME_CANDIDATES: [&str; 4] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
    "video/mp4",
];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MimeType(String);

impl MimeType {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn default_mime_candidates() -> Vec<MimeType> {
    DEFAULT_MIME_CANDIDATES
        .iter()
        .map(|m| MimeType::new(*m))
        .collect()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("none of the preferred recording formats is supported here")]
    EncoderUnsupported,
    #[error("cannot {action} while the recorder is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error("encoding failed: {0}")]
    EncodingFailure(String),
}

/// Why a recording attempt ended in [`RecorderState::Failed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    Device(DeviceError),
    Recording(RecorderError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Acquiring,
    Ready,
    Recording,
    Stopping,
    Stopped,
    Failed(FailureReason),
}

impl RecorderState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Ready => "ready",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderEvent {
    Chunk(Bytes),
    Error(String),
}

/// Capability layer over the platform media encoder.
///
/// `start` hands back the event channel the encoder flushes chunks into.
/// `stop` must be idempotent; it forces a final flush and then closes the
/// channel, so a reader draining to the end always observes every chunk.
pub trait MediaEncoder: Send {
    fn is_type_supported(&self, mime: &MimeType) -> bool;

    fn start(
        &mut self,
        mime: &MimeType,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<EncoderEvent>, RecorderError>;

    fn stop(&mut self);
}

/// The finished recording, assembled from the complete chunk buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaBlob {
    pub mime_type: MimeType,
    pub bytes: Bytes,
}

impl MediaBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Recording state machine over a [`DeviceSession`] and a [`MediaEncoder`].
///
/// Chunks are appended in arrival order and never reordered; the blob is
/// only assembled once the encoder's final flush has been observed.
pub struct Recorder<D: MediaDevices, E: MediaEncoder> {
    session: DeviceSession<D>,
    encoder: E,
    constraints: MediaConstraints,
    chunk_interval: ChunkInterval,
    mime_candidates: Vec<MimeType>,
    state: RecorderState,
    chosen_mime: Option<MimeType>,
    chunks: Vec<Bytes>,
    events: Option<mpsc::Receiver<EncoderEvent>>,
    final_blob: Option<MediaBlob>,
}

impl<D: MediaDevices, E: MediaEncoder> Recorder<D, E> {
    pub fn new(devices: D, encoder: E) -> Self {
        Self {
            session: DeviceSession::new(devices),
            encoder,
            constraints: MediaConstraints::default(),
            chunk_interval: ChunkInterval::default(),
            mime_candidates: default_mime_candidates(),
            state: RecorderState::Idle,
            chosen_mime: None,
            chunks: Vec::new(),
            events: None,
            final_blob: None,
        }
    }

    pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_chunk_interval(mut self, interval: ChunkInterval) -> Self {
        self.chunk_interval = interval;
        self
    }

    pub fn with_mime_candidates(mut self, candidates: Vec<MimeType>) -> Self {
        self.mime_candidates = candidates;
        self
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn chosen_mime(&self) -> Option<&MimeType> {
        self.chosen_mime.as_ref()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn final_blob(&self) -> Option<&MediaBlob> {
        self.final_blob.as_ref()
    }

    pub fn device_session(&self) -> &DeviceSession<D> {
        &self.session
    }

    /// `Idle → Acquiring → Ready`, or `Failed` with the device error.
    ///
    /// Calling `start` on a stale attempt discards it first, which is what
    /// makes [`Recorder::restart`] a plain discard-then-start.
    pub async fn start(&mut self) -> Result<(), DeviceError> {
        if !matches!(self.state, RecorderState::Idle) {
            self.discard();
        }
        self.state = RecorderState::Acquiring;
        let permission = self.session.query_permission().await;
        tracing::debug!(?permission, "acquiring media devices");
        match self.session.acquire(self.constraints).await {
            Ok(()) => {
                self.state = RecorderState::Ready;
                Ok(())
            }
            Err(error) => {
                self.teardown();
                self.state = RecorderState::Failed(FailureReason::Device(error.clone()));
                tracing::warn!(%error, "device acquisition failed");
                Err(error)
            }
        }
    }

    /// `Ready → Recording`. Negotiates the first supported format from the
    /// candidate list; on `EncoderUnsupported` the state stays `Ready`.
    pub fn record(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, RecorderState::Ready) {
            return Err(RecorderError::InvalidState {
                action: "record",
                state: self.state.name(),
            });
        }
        let chosen = self
            .mime_candidates
            .iter()
            .find(|m| self.encoder.is_type_supported(m))
            .cloned();
        let Some(mime) = chosen else {
            return Err(RecorderError::EncoderUnsupported);
        };
        let events = self.encoder.start(&mime, self.chunk_interval.duration())?;
        tracing::info!(mime = mime.as_str(), "recording started");
        self.chosen_mime = Some(mime);
        self.events = Some(events);
        self.chunks.clear();
        self.final_blob = None;
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Drain whatever chunks the encoder has flushed so far. Non-empty
    /// fragments are appended in arrival order; empty ones are skipped.
    /// An encoder error moves the recorder to `Failed` and releases the
    /// devices.
    pub fn poll_chunks(&mut self) -> Result<usize, RecorderError> {
        if !matches!(self.state, RecorderState::Recording) {
            return Ok(0);
        }
        let Some(mut rx) = self.events.take() else {
            return Ok(0);
        };
        let mut appended = 0;
        loop {
            match rx.try_recv() {
                Ok(EncoderEvent::Chunk(bytes)) => {
                    if !bytes.is_empty() {
                        self.chunks.push(bytes);
                        appended += 1;
                    }
                }
                Ok(EncoderEvent::Error(message)) => {
                    let error = RecorderError::EncodingFailure(message);
                    self.fail_recording(error.clone());
                    return Err(error);
                }
                Err(_) => break,
            }
        }
        self.events = Some(rx);
        Ok(appended)
    }

    /// `Recording → Stopping → Stopped`. A no-op in any other state.
    ///
    /// Stops the encoder, drains the event channel to the end so the final
    /// flush is always observed, assembles the blob, and releases the
    /// devices.
    pub async fn stop(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, RecorderState::Recording) {
            tracing::trace!(state = self.state.name(), "stop ignored");
            return Ok(());
        }
        self.state = RecorderState::Stopping;
        self.encoder.stop();
        let Some(mut rx) = self.events.take() else {
            let error =
                RecorderError::EncodingFailure("encoder event channel was lost".to_owned());
            self.fail_recording(error.clone());
            return Err(error);
        };
        while let Some(event) = rx.recv().await {
            match event {
                EncoderEvent::Chunk(bytes) => {
                    if !bytes.is_empty() {
                        self.chunks.push(bytes);
                    }
                }
                EncoderEvent::Error(message) => {
                    let error = RecorderError::EncodingFailure(message);
                    self.fail_recording(error.clone());
                    return Err(error);
                }
            }
        }
        let Some(mime) = self.chosen_mime.clone() else {
            let error =
                RecorderError::EncodingFailure("no negotiated recording format".to_owned());
            self.fail_recording(error.clone());
            return Err(error);
        };
        let total: usize = self.chunks.iter().map(Bytes::len).sum();
        let mut assembled = BytesMut::with_capacity(total);
        for chunk in &self.chunks {
            assembled.extend_from_slice(chunk);
        }
        self.final_blob = Some(MediaBlob {
            mime_type: mime,
            bytes: assembled.freeze(),
        });
        self.teardown();
        self.state = RecorderState::Stopped;
        tracing::info!(chunks = self.chunks.len(), bytes = total, "recording stopped");
        Ok(())
    }

    /// Drop the current attempt entirely: chunk buffer, blob and
    /// negotiated format are cleared and the devices released.
    pub fn discard(&mut self) {
        self.teardown();
        self.chunks.clear();
        self.final_blob = None;
        self.chosen_mime = None;
        self.state = RecorderState::Idle;
    }

    /// Discard and immediately begin a fresh attempt.
    pub async fn restart(&mut self) -> Result<(), DeviceError> {
        self.discard();
        self.start().await
    }

    /// `Failed → Idle` once the caller has surfaced the failure.
    pub fn acknowledge_failure(&mut self) {
        if matches!(self.state, RecorderState::Failed(_)) {
            self.state = RecorderState::Idle;
        }
    }

    fn fail_recording(&mut self, error: RecorderError) {
        tracing::warn!(%error, "recorder failed mid-recording");
        self.teardown();
        self.state = RecorderState::Failed(FailureReason::Recording(error));
    }

    // The one teardown routine every exit path funnels through.
    fn teardown(&mut self) {
        self.encoder.stop();
        self.events = None;
        self.session.release();
    }
}
