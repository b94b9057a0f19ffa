use crate::analysis::{
    AnalysisClient, AnalysisResults, FacialAnalysis, FusionMetadata, NetworkError,
    RawAnalysisResult, Submission,
};
use crate::recorder::MediaBlob;
use futures::future::BoxFuture;
use futures::FutureExt;

/// Canned analysis client for offline runs and tests: answers every
/// submission with a fixed result, or a fixed failure.
#[derive(Clone)]
pub struct DummyAnalysisClient {
    outcome: Result<RawAnalysisResult, NetworkError>,
}

impl DummyAnalysisClient {
    pub fn with_result(result: RawAnalysisResult) -> Self {
        Self {
            outcome: Ok(result),
        }
    }

    pub fn with_error(error: NetworkError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

impl Default for DummyAnalysisClient {
    /// A plausible successful analysis of a solid practice take.
    fn default() -> Self {
        Self::with_result(RawAnalysisResult {
            success: true,
            analysis_results: Some(AnalysisResults {
                final_emotion: Some("happy".to_owned()),
                confidence: Some(0.82),
                facial_analysis: Some(FacialAnalysis {
                    faces_detected_total: 9,
                    frames_analyzed: 10,
                    dominant_emotion: Some("happy".to_owned()),
                }),
                audio_analysis: Some(crate::analysis::AudioAnalysis {
                    emotion: Some("happy".to_owned()),
                    confidence: Some(0.78),
                    transcript: Some("Hi, I'm glad to be here today.".to_owned()),
                    sentiment: Some("positive".to_owned()),
                    formality: Some("neutral".to_owned()),
                    sarcasm_detected: Some(false),
                }),
                fusion: Some(FusionMetadata {
                    modalities_agree: true,
                    method: Some("weighted-average".to_owned()),
                }),
            }),
            transcript: Some("Hi, I'm glad to be here today.".to_owned()),
            error: None,
        })
    }
}

impl AnalysisClient for DummyAnalysisClient {
    fn submit(
        &self,
        _blob: MediaBlob,
        submission: Submission,
    ) -> BoxFuture<'_, Result<RawAnalysisResult, NetworkError>> {
        async move {
            tracing::debug!(scenario = %submission.scenario_id, "dummy analysis submission");
            self.outcome.clone()
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MimeType;
    use bytes::Bytes;

    fn blob() -> MediaBlob {
        MediaBlob {
            mime_type: MimeType::new("video/webm"),
            bytes: Bytes::from_static(b"recording"),
        }
    }

    fn submission() -> Submission {
        Submission {
            scenario_id: "introduction".to_owned(),
            scenario_prompt: "prompt".to_owned(),
        }
    }

    #[tokio::test]
    async fn default_result_is_a_successful_analysis() {
        let raw = DummyAnalysisClient::default()
            .submit(blob(), submission())
            .await
            .expect("canned success");
        assert!(raw.success);
        assert!(raw.analysis_results.is_some());
    }

    #[tokio::test]
    async fn configured_error_is_returned_verbatim() {
        let err = DummyAnalysisClient::with_error(NetworkError::Timeout)
            .submit(blob(), submission())
            .await
            .expect_err("canned failure");
        assert_eq!(err, NetworkError::Timeout);
    }
}
