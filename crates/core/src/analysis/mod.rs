mod dummy;
mod http;

use crate::recorder::MediaBlob;
use crate::scenario::PracticeScenario;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use dummy::DummyAnalysisClient;
pub use http::HttpAnalysisClient;

/// Client-side ceiling on the media payload; larger recordings are
/// rejected before any bytes move.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Scenario metadata that travels beside the media as form fields, never
/// embedded in the media itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission {
    pub scenario_id: String,
    pub scenario_prompt: String,
}

impl Submission {
    pub fn for_scenario(scenario: &PracticeScenario) -> Self {
        Self {
            scenario_id: scenario.id.as_str().to_owned(),
            scenario_prompt: scenario.prompt_text.clone(),
        }
    }
}

/// The analysis service response. `success` is the one required field;
/// every sub-object may be absent and nothing downstream may assume
/// otherwise.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawAnalysisResult {
    pub success: bool,
    #[serde(default)]
    pub analysis_results: Option<AnalysisResults>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResults {
    #[serde(default)]
    pub final_emotion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub facial_analysis: Option<FacialAnalysis>,
    #[serde(default)]
    pub audio_analysis: Option<AudioAnalysis>,
    #[serde(default)]
    pub fusion: Option<FusionMetadata>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FacialAnalysis {
    #[serde(default)]
    pub faces_detected_total: u32,
    #[serde(default)]
    pub frames_analyzed: u32,
    #[serde(default)]
    pub dominant_emotion: Option<String>,
}

/// Present only when the service managed to analyze the audio track.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioAnalysis {
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub formality: Option<String>,
    #[serde(default)]
    pub sarcasm_detected: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FusionMetadata {
    #[serde(default)]
    pub modalities_agree: bool,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("the analysis request timed out")]
    Timeout,
    #[error("the recording is too large to upload ({size_bytes} bytes)")]
    PayloadTooLarge { size_bytes: usize },
    #[error("the analysis service is unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("the analysis service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Upload boundary to the external analysis service. One request per
/// finished recording; a timeout is surfaced, never silently retried.
pub trait AnalysisClient: Send + Sync {
    fn submit(
        &self,
        blob: MediaBlob,
        submission: Submission,
    ) -> BoxFuture<'_, Result<RawAnalysisResult, NetworkError>>;
}

impl<T: AnalysisClient + ?Sized> AnalysisClient for Box<T> {
    fn submit(
        &self,
        blob: MediaBlob,
        submission: Submission,
    ) -> BoxFuture<'_, Result<RawAnalysisResult, NetworkError>> {
        (**self).submit(blob, submission)
    }
}
