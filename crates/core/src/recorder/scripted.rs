use crate::recorder::{default_mime_candidates, EncoderEvent, MediaEncoder, MimeType, RecorderError};
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;

/// Scripted stand-in for the platform media encoder.
///
/// Periodic-flush chunks are emitted when recording starts; the optional
/// final chunk is emitted by `stop`, modelling the forced final flush. An
/// error can be injected after a given number of chunks.
pub struct ScriptedEncoder {
    supported: Vec<MimeType>,
    chunks: Vec<Bytes>,
    final_chunk: Option<Bytes>,
    error_after: Option<(usize, String)>,
    tx: Option<mpsc::Sender<EncoderEvent>>,
    negotiated: Option<MimeType>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self {
            supported: default_mime_candidates(),
            chunks: Vec::new(),
            final_chunk: None,
            error_after: None,
            tx: None,
            negotiated: None,
        }
    }

    pub fn with_supported(mut self, supported: Vec<MimeType>) -> Self {
        self.supported = supported;
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<Bytes>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn with_final_chunk(mut self, chunk: Bytes) -> Self {
        self.final_chunk = Some(chunk);
        self
    }

    pub fn with_error_after(mut self, chunks_before_error: usize, message: &str) -> Self {
        self.error_after = Some((chunks_before_error, message.to_owned()));
        self
    }

    /// The format negotiated at the last `start` call.
    pub fn negotiated(&self) -> Option<&MimeType> {
        self.negotiated.as_ref()
    }
}

impl Default for ScriptedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEncoder for ScriptedEncoder {
    fn is_type_supported(&self, mime: &MimeType) -> bool {
        self.supported.contains(mime)
    }

    fn start(
        &mut self,
        mime: &MimeType,
        _chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<EncoderEvent>, RecorderError> {
        if self.tx.is_some() {
            return Err(RecorderError::InvalidState {
                action: "start the encoder",
                state: "recording",
            });
        }
        // Capacity covers every scripted chunk plus an error and the final
        // flush, so try_send never drops an event.
        let (tx, rx) = mpsc::channel(self.chunks.len() + 2);
        let mut errored = false;
        for (i, chunk) in self.chunks.iter().enumerate() {
            if let Some((after, message)) = &self.error_after {
                if i == *after {
                    let _ = tx.try_send(EncoderEvent::Error(message.clone()));
                    errored = true;
                    break;
                }
            }
            let _ = tx.try_send(EncoderEvent::Chunk(chunk.clone()));
        }
        if !errored {
            if let Some((after, message)) = &self.error_after {
                if *after >= self.chunks.len() {
                    let _ = tx.try_send(EncoderEvent::Error(message.clone()));
                    errored = true;
                }
            }
        }
        self.negotiated = Some(mime.clone());
        // After an error the encoder is dead: no final flush will follow.
        self.tx = if errored { None } else { Some(tx) };
        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Some(final_chunk) = self.final_chunk.take() {
                let _ = tx.try_send(EncoderEvent::Chunk(final_chunk));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval() -> Duration {
        Duration::from_millis(100)
    }

    #[tokio::test]
    async fn emits_scripted_chunks_then_closes_after_stop() {
        let mut encoder = ScriptedEncoder::new()
            .with_chunks(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")])
            .with_final_chunk(Bytes::from_static(b"c"));
        let mime = MimeType::new("video/webm");
        let mut rx = encoder.start(&mime, interval()).expect("start succeeds");

        assert_eq!(rx.recv().await, Some(EncoderEvent::Chunk(Bytes::from_static(b"a"))));
        assert_eq!(rx.recv().await, Some(EncoderEvent::Chunk(Bytes::from_static(b"b"))));

        encoder.stop();
        assert_eq!(rx.recv().await, Some(EncoderEvent::Chunk(Bytes::from_static(b"c"))));
        assert_eq!(rx.recv().await, None, "channel closes after the final flush");
        assert_eq!(encoder.negotiated(), Some(&mime));
    }

    #[tokio::test]
    async fn injected_error_ends_the_event_stream() {
        let mut encoder = ScriptedEncoder::new()
            .with_chunks(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")])
            .with_final_chunk(Bytes::from_static(b"c"))
            .with_error_after(1, "boom");
        let mut rx = encoder
            .start(&MimeType::new("video/webm"), interval())
            .expect("start succeeds");

        assert_eq!(rx.recv().await, Some(EncoderEvent::Chunk(Bytes::from_static(b"a"))));
        assert_eq!(rx.recv().await, Some(EncoderEvent::Error("boom".to_owned())));
        assert_eq!(rx.recv().await, None, "no final flush after an error");
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let mut encoder = ScriptedEncoder::new().with_final_chunk(Bytes::from_static(b"f"));
        let mime = MimeType::new("video/webm");
        let _rx = encoder.start(&mime, interval()).expect("first start");
        let err = encoder.start(&mime, interval()).expect_err("second start");
        assert!(matches!(err, RecorderError::InvalidState { .. }));
    }

    #[test]
    fn stop_without_start_is_safe() {
        let mut encoder = ScriptedEncoder::new();
        encoder.stop();
        encoder.stop();
    }

    #[test]
    fn supported_set_is_configurable() {
        let encoder = ScriptedEncoder::new().with_supported(vec![MimeType::new("video/mp4")]);
        assert!(encoder.is_type_supported(&MimeType::new("video/mp4")));
        assert!(!encoder.is_type_supported(&MimeType::new("video/webm")));
    }
}
