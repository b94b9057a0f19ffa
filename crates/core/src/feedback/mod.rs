mod synthesizer;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use synthesizer::{
    audio_clarity, emotional_expression, engagement_level, eye_contact_quality,
    overall_performance, speaking_confidence, synthesize,
};

/// How consistently a face was on camera, banded from the face/frame ratio.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngagementLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs improvement",
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AudioClarity {
    Clear,
    MostlyClear,
    SomewhatUnclear,
    Unclear,
    NotDetected,
}

impl fmt::Display for AudioClarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly clear",
            Self::SomewhatUnclear => "Somewhat unclear",
            Self::Unclear => "Unclear",
            Self::NotDetected => "Not detected",
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EyeContactQuality {
    Good,
    NeedsPractice,
}

impl fmt::Display for EyeContactQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "Good",
            Self::NeedsPractice => "Needs practice",
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpeakingConfidence {
    Confident,
    Developing,
    Building,
}

impl fmt::Display for SpeakingConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confident => "Confident speaker",
            Self::Developing => "Developing confidence",
            Self::Building => "Building confidence",
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum OverallPerformance {
    Excellent,
    Good,
    Fair,
    KeepPracticing,
}

impl fmt::Display for OverallPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent practice session",
            Self::Good => "Good practice session",
            Self::Fair => "Fair practice session",
            Self::KeepPracticing => "Keep practicing",
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmotionalExpression {
    Expressive,
    Emerging,
    Subtle,
    Neutral,
}

impl fmt::Display for EmotionalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Expressive => "Expressive",
            Self::Emerging => "Emerging expression",
            Self::Subtle => "Subtle expression",
            Self::Neutral => "Neutral",
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assessments {
    pub engagement_level: EngagementLevel,
    pub speaking_confidence: SpeakingConfidence,
    pub emotional_expression: EmotionalExpression,
    pub overall_performance: OverallPerformance,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackLists {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_steps: Vec<String>,
    pub confidence_notes: Vec<String>,
    pub technical_tips: Vec<String>,
}

/// The derived report. Computed once per analysis and never mutated; a
/// new recording produces a new report.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackReport {
    pub tone_summary: String,
    pub multimodal_summary: String,
    pub facial_summary: String,
    pub audio_summary: String,
    pub assessments: Assessments,
    pub feedback: FeedbackLists,
}
