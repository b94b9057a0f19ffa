use crate::analysis::{AudioAnalysis, RawAnalysisResult};
use crate::feedback::{
    Assessments, AudioClarity, EmotionalExpression, EngagementLevel, EyeContactQuality,
    FeedbackLists, FeedbackReport, OverallPerformance, SpeakingConfidence,
};
use crate::scenario::PracticeScenario;

const MAX_NEXT_STEPS: usize = 3;
const MAX_CONFIDENCE_NOTES: usize = 3;
const MAX_TECHNICAL_TIPS: usize = 3;

fn face_ratio(faces_detected: u32, frames_analyzed: u32) -> f64 {
    // Denominator clamped to 1: a recording with no analyzed frames
    // scores zero instead of dividing by zero.
    f64::from(faces_detected) / f64::from(frames_analyzed.max(1))
}

pub fn engagement_level(faces_detected: u32, frames_analyzed: u32) -> EngagementLevel {
    let ratio = face_ratio(faces_detected, frames_analyzed);
    if ratio >= 0.8 {
        EngagementLevel::Excellent
    } else if ratio >= 0.6 {
        EngagementLevel::Good
    } else if ratio >= 0.4 {
        EngagementLevel::Fair
    } else {
        EngagementLevel::NeedsImprovement
    }
}

pub fn audio_clarity(audio: Option<&AudioAnalysis>) -> AudioClarity {
    let Some(audio) = audio else {
        return AudioClarity::NotDetected;
    };
    let confidence = audio.confidence.unwrap_or(0.0);
    if confidence > 0.7 {
        AudioClarity::Clear
    } else if confidence > 0.5 {
        AudioClarity::MostlyClear
    } else if confidence > 0.3 {
        AudioClarity::SomewhatUnclear
    } else {
        AudioClarity::Unclear
    }
}

pub fn eye_contact_quality(faces_detected: u32, frames_analyzed: u32) -> EyeContactQuality {
    if face_ratio(faces_detected, frames_analyzed) >= 0.7 {
        EyeContactQuality::Good
    } else {
        EyeContactQuality::NeedsPractice
    }
}

pub fn speaking_confidence(confidence: f64) -> SpeakingConfidence {
    let score = confidence * 100.0;
    if score > 70.0 {
        SpeakingConfidence::Confident
    } else if score > 50.0 {
        SpeakingConfidence::Developing
    } else {
        SpeakingConfidence::Building
    }
}

/// Additive 0-100 score: +25 for each of confidence > 0.5, any face
/// detected, audio analyzed, confidence > 0.7.
pub fn overall_performance(
    confidence: f64,
    faces_detected: u32,
    audio_analyzed: bool,
) -> OverallPerformance {
    let mut score = 0u32;
    if confidence > 0.5 {
        score += 25;
    }
    if faces_detected > 0 {
        score += 25;
    }
    if audio_analyzed {
        score += 25;
    }
    if confidence > 0.7 {
        score += 25;
    }
    if score >= 75 {
        OverallPerformance::Excellent
    } else if score >= 50 {
        OverallPerformance::Good
    } else if score >= 25 {
        OverallPerformance::Fair
    } else {
        OverallPerformance::KeepPracticing
    }
}

pub fn emotional_expression(
    final_emotion: Option<&str>,
    confidence: f64,
) -> EmotionalExpression {
    if final_emotion.is_none() {
        return EmotionalExpression::Neutral;
    }
    if confidence > 0.6 {
        EmotionalExpression::Expressive
    } else if confidence > 0.3 {
        EmotionalExpression::Emerging
    } else {
        EmotionalExpression::Subtle
    }
}

/// Derive the full report from one analysis result and the scenario the
/// user practiced. Pure and total: every missing field falls back to a
/// neutral default, so a report is always produced.
pub fn synthesize(result: &RawAnalysisResult, scenario: &PracticeScenario) -> FeedbackReport {
    let analysis = result.analysis_results.as_ref();
    let confidence = analysis.and_then(|a| a.confidence).unwrap_or(0.0);
    let final_emotion = analysis.and_then(|a| a.final_emotion.as_deref());
    let facial = analysis.and_then(|a| a.facial_analysis.as_ref());
    let audio = analysis.and_then(|a| a.audio_analysis.as_ref());
    let fusion = analysis.and_then(|a| a.fusion.as_ref());

    let (faces, frames) = facial
        .map(|f| (f.faces_detected_total, f.frames_analyzed))
        .unwrap_or((0, 0));
    let ratio = face_ratio(faces, frames);
    let audio_confidence = audio.and_then(|a| a.confidence).unwrap_or(0.0);
    let modalities_agree = fusion.is_some_and(|f| f.modalities_agree);

    let engagement = engagement_level(faces, frames);
    let clarity = audio_clarity(audio);
    let eye_contact = eye_contact_quality(faces, frames);
    let speaking = speaking_confidence(confidence);
    let overall = overall_performance(confidence, faces, audio.is_some());
    let expression = emotional_expression(final_emotion, confidence);

    let tone_summary = match final_emotion {
        Some(emotion) => format!(
            "Your overall tone came across as {emotion} ({:.0}% confidence).",
            confidence * 100.0
        ),
        None => "No dominant tone was detected in this recording.".to_owned(),
    };

    let multimodal_summary = match fusion {
        Some(f) if f.modalities_agree => {
            "Your facial expression and your voice told the same story.".to_owned()
        }
        Some(_) => "Your face and your voice sent mixed signals; aligning them makes \
                    the message stronger."
            .to_owned(),
        None => "Agreement between face and voice could not be assessed.".to_owned(),
    };

    let facial_summary = if facial.is_none() || frames == 0 {
        "No facial analysis was available for this recording.".to_owned()
    } else {
        format!(
            "Your face was detected in {faces} of {frames} analyzed frames \
             ({engagement} engagement, eye contact: {eye_contact})."
        )
    };

    let audio_summary = match audio {
        None => "Audio was not detected, so speech analysis was skipped.".to_owned(),
        Some(a) => {
            let mut summary = format!("Speech clarity: {clarity}.");
            if let Some(emotion) = &a.emotion {
                summary.push_str(&format!(" Your voice carried a {emotion} tone."));
            }
            if a.transcript.is_some() {
                summary.push_str(" A transcript of what you said was captured.");
            }
            summary
        }
    };

    // Strengths: fixed condition list, evaluated independently, in order.
    let mut strengths = Vec::new();
    if confidence > 0.6 {
        strengths.push("You expressed emotion clearly and held it through the take.".to_owned());
    }
    if eye_contact == EyeContactQuality::Good {
        strengths.push(
            "Steady on-camera presence: your face stayed in frame nearly the whole time."
                .to_owned(),
        );
    }
    if audio.is_some() && audio_confidence > 0.6 {
        strengths.push("Your voice came through clearly and confidently.".to_owned());
    }
    if modalities_agree {
        strengths.push("Your expression and your tone reinforced each other.".to_owned());
    }
    if strengths.is_empty() {
        strengths.push(
            "You finished a complete practice take, and that consistency is how \
             improvement starts."
                .to_owned(),
        );
    }

    let mut improvements = Vec::new();
    if faces == 0 {
        improvements.push(
            "Your face was never detected. Adjust the camera so you are clearly visible."
                .to_owned(),
        );
    }
    if faces > 0 && ratio < 0.4 {
        improvements
            .push("You drifted out of frame often; keep yourself centered on camera.".to_owned());
    }
    if audio.is_none() {
        improvements
            .push("No speech was picked up. Check the microphone and speak up.".to_owned());
    }
    if audio.is_some() && audio_confidence <= 0.4 {
        improvements
            .push("Your delivery was hard to read; slow down and enunciate.".to_owned());
    }
    if confidence <= 0.4 {
        improvements.push(
            "The overall impression was muted. Try dialing expressiveness up a notch."
                .to_owned(),
        );
    }
    if improvements.is_empty() {
        improvements.push(
            "Keep practicing; repetition is what turns good takes into great ones.".to_owned(),
        );
    }

    let mut next_steps = Vec::new();
    if overall != OverallPerformance::Excellent {
        next_steps.push(format!(
            "Run the \"{}\" scenario again and aim for a steadier delivery.",
            scenario.title
        ));
    }
    if eye_contact == EyeContactQuality::NeedsPractice {
        next_steps
            .push("Practice looking directly into the lens rather than at the screen.".to_owned());
    }
    if matches!(
        clarity,
        AudioClarity::SomewhatUnclear | AudioClarity::Unclear | AudioClarity::NotDetected
    ) {
        next_steps.push(
            "Record a short voice memo first to warm up and check your levels.".to_owned(),
        );
    }
    if speaking != SpeakingConfidence::Confident {
        next_steps.push("Rehearse your opening line until it feels automatic.".to_owned());
    }
    next_steps.push("Try a different scenario to stretch the same skills in a new context.".to_owned());
    if let Some(tip) = scenario.tips.first() {
        next_steps.push(format!("Scenario tip to focus on next: {tip}"));
    }
    next_steps.truncate(MAX_NEXT_STEPS);

    let mut confidence_notes = Vec::new();
    match speaking {
        SpeakingConfidence::Confident => {
            confidence_notes.push("You sounded confident. Keep that energy.".to_owned());
            confidence_notes
                .push("Your confidence score was strong; try a harder scenario next.".to_owned());
        }
        SpeakingConfidence::Developing => {
            confidence_notes
                .push("Your confidence is developing; it shows in stretches of the take.".to_owned());
            confidence_notes.push(
                "Anchor yourself with a slow first sentence and the rest tends to follow."
                    .to_owned(),
            );
        }
        SpeakingConfidence::Building => {
            confidence_notes.push(
                "Confidence builds with repetitions; nobody sounds sure on take one.".to_owned(),
            );
            confidence_notes
                .push("Shorter, more frequent practice sessions beat one long one.".to_owned());
        }
    }
    if confidence == 0.0 {
        confidence_notes.push(
            "The analyzer could not score confidence this time; treat this take as a baseline."
                .to_owned(),
        );
    }
    confidence_notes.truncate(MAX_CONFIDENCE_NOTES);

    let mut technical_tips = Vec::new();
    if faces == 0 || ratio < 0.4 {
        technical_tips.push(
            "Raise the camera to eye level and keep about an arm's length of distance.".to_owned(),
        );
    }
    if frames > 0 && ratio < 0.8 {
        technical_tips.push(
            "Check your lighting: a light source in front of you keeps your face detectable."
                .to_owned(),
        );
    }
    if matches!(
        clarity,
        AudioClarity::SomewhatUnclear | AudioClarity::Unclear | AudioClarity::NotDetected
    ) {
        technical_tips.push(
            "Move closer to the microphone or use a headset to cut room echo.".to_owned(),
        );
    }
    technical_tips.push(
        "Record in a quiet spot; background noise degrades both speech and emotion analysis."
            .to_owned(),
    );
    technical_tips.truncate(MAX_TECHNICAL_TIPS);

    FeedbackReport {
        tone_summary,
        multimodal_summary,
        facial_summary,
        audio_summary,
        assessments: Assessments {
            engagement_level: engagement,
            speaking_confidence: speaking,
            emotional_expression: expression,
            overall_performance: overall,
        },
        feedback: FeedbackLists {
            strengths,
            improvements,
            next_steps,
            confidence_notes,
            technical_tips,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResults, FacialAnalysis, FusionMetadata};

    fn scenario() -> PracticeScenario {
        crate::scenario::find("introduction").expect("known scenario")
    }

    fn result_with(analysis: AnalysisResults) -> RawAnalysisResult {
        RawAnalysisResult {
            success: true,
            analysis_results: Some(analysis),
            transcript: None,
            error: None,
        }
    }

    #[test]
    fn engagement_banding_matches_contract() {
        assert_eq!(engagement_level(8, 10), EngagementLevel::Excellent);
        assert_eq!(engagement_level(5, 10), EngagementLevel::Fair);
        assert_eq!(engagement_level(6, 10), EngagementLevel::Good);
        assert_eq!(engagement_level(3, 10), EngagementLevel::NeedsImprovement);
        assert_eq!(engagement_level(4, 10), EngagementLevel::Fair);
        assert_eq!(engagement_level(0, 10), EngagementLevel::NeedsImprovement);
    }

    #[test]
    fn engagement_guards_division_by_zero() {
        assert_eq!(engagement_level(0, 0), EngagementLevel::NeedsImprovement);
        // With frames clamped to 1, detections still count.
        assert_eq!(engagement_level(1, 0), EngagementLevel::Excellent);
    }

    #[test]
    fn audio_clarity_banding_matches_contract() {
        let with_confidence = |c: f64| AudioAnalysis {
            confidence: Some(c),
            ..AudioAnalysis::default()
        };
        assert_eq!(audio_clarity(None), AudioClarity::NotDetected);
        assert_eq!(audio_clarity(Some(&with_confidence(0.71))), AudioClarity::Clear);
        assert_eq!(
            audio_clarity(Some(&with_confidence(0.7))),
            AudioClarity::MostlyClear,
            "0.7 itself is not above the Clear threshold"
        );
        assert_eq!(
            audio_clarity(Some(&with_confidence(0.51))),
            AudioClarity::MostlyClear
        );
        assert_eq!(
            audio_clarity(Some(&with_confidence(0.4))),
            AudioClarity::SomewhatUnclear
        );
        assert_eq!(audio_clarity(Some(&with_confidence(0.3))), AudioClarity::Unclear);
        assert_eq!(
            audio_clarity(Some(&AudioAnalysis::default())),
            AudioClarity::Unclear,
            "missing confidence defaults to zero"
        );
    }

    #[test]
    fn eye_contact_bands_at_seven_tenths() {
        assert_eq!(eye_contact_quality(7, 10), EyeContactQuality::Good);
        assert_eq!(eye_contact_quality(6, 10), EyeContactQuality::NeedsPractice);
        assert_eq!(eye_contact_quality(0, 0), EyeContactQuality::NeedsPractice);
    }

    #[test]
    fn speaking_confidence_banding_matches_contract() {
        assert_eq!(speaking_confidence(0.82), SpeakingConfidence::Confident);
        assert_eq!(
            speaking_confidence(0.7),
            SpeakingConfidence::Developing,
            "70 is not above the Confident threshold"
        );
        assert_eq!(speaking_confidence(0.51), SpeakingConfidence::Developing);
        assert_eq!(speaking_confidence(0.5), SpeakingConfidence::Building);
        assert_eq!(speaking_confidence(0.0), SpeakingConfidence::Building);
        assert_eq!(
            speaking_confidence(0.82).to_string(),
            "Confident speaker"
        );
    }

    #[test]
    fn overall_performance_full_score_is_excellent() {
        let overall = overall_performance(0.75, 2, true);
        assert_eq!(overall, OverallPerformance::Excellent);
        assert_eq!(overall.to_string(), "Excellent practice session");
    }

    #[test]
    fn overall_performance_partial_scores_band_down() {
        // confidence 0.6, faces, audio: 25 + 25 + 25 = 75.
        assert_eq!(overall_performance(0.6, 1, true), OverallPerformance::Excellent);
        // confidence 0.6, no faces, audio: 50.
        assert_eq!(overall_performance(0.6, 0, true), OverallPerformance::Good);
        // faces only: 25.
        assert_eq!(overall_performance(0.0, 3, false), OverallPerformance::Fair);
        // nothing: 0.
        assert_eq!(
            overall_performance(0.0, 0, false),
            OverallPerformance::KeepPracticing
        );
    }

    #[test]
    fn minimal_success_response_yields_neutral_report_with_fallbacks() {
        let raw = RawAnalysisResult {
            success: true,
            analysis_results: None,
            transcript: None,
            error: None,
        };
        let report = synthesize(&raw, &scenario());

        assert_eq!(
            report.assessments.engagement_level,
            EngagementLevel::NeedsImprovement
        );
        assert_eq!(
            report.assessments.speaking_confidence,
            SpeakingConfidence::Building
        );
        assert_eq!(
            report.assessments.emotional_expression,
            EmotionalExpression::Neutral
        );
        assert_eq!(
            report.assessments.overall_performance,
            OverallPerformance::KeepPracticing
        );
        assert!(!report.feedback.strengths.is_empty(), "fallback strength fires");
        assert!(
            !report.feedback.improvements.is_empty(),
            "improvement conditions fire on an empty result"
        );
        assert!(!report.feedback.next_steps.is_empty());
    }

    #[test]
    fn strong_take_produces_excellent_report() {
        let raw = result_with(AnalysisResults {
            final_emotion: Some("happy".to_owned()),
            confidence: Some(0.82),
            facial_analysis: Some(FacialAnalysis {
                faces_detected_total: 9,
                frames_analyzed: 10,
                dominant_emotion: Some("happy".to_owned()),
            }),
            audio_analysis: Some(AudioAnalysis {
                confidence: Some(0.78),
                ..AudioAnalysis::default()
            }),
            fusion: Some(FusionMetadata {
                modalities_agree: true,
                method: None,
            }),
        });
        let report = synthesize(&raw, &scenario());

        assert_eq!(report.assessments.engagement_level, EngagementLevel::Excellent);
        assert_eq!(
            report.assessments.speaking_confidence,
            SpeakingConfidence::Confident
        );
        assert_eq!(
            report.assessments.overall_performance,
            OverallPerformance::Excellent
        );
        assert!(report.tone_summary.contains("happy"));
        assert!(report.tone_summary.contains("82%"));
        assert!(report.feedback.strengths.len() >= 3);
    }

    #[test]
    fn bounded_lists_never_exceed_their_caps() {
        let raw = RawAnalysisResult {
            success: true,
            analysis_results: None,
            transcript: None,
            error: None,
        };
        let report = synthesize(&raw, &scenario());
        assert!(report.feedback.next_steps.len() <= 3);
        assert!(report.feedback.confidence_notes.len() <= 3);
        assert!(report.feedback.technical_tips.len() <= 3);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let raw = result_with(AnalysisResults {
            final_emotion: Some("neutral".to_owned()),
            confidence: Some(0.45),
            facial_analysis: Some(FacialAnalysis {
                faces_detected_total: 5,
                frames_analyzed: 10,
                dominant_emotion: None,
            }),
            audio_analysis: None,
            fusion: None,
        });
        let a = synthesize(&raw, &scenario());
        let b = synthesize(&raw, &scenario());
        assert_eq!(a, b);
    }

    #[test]
    fn missing_audio_is_reported_not_detected() {
        let raw = result_with(AnalysisResults {
            final_emotion: Some("calm".to_owned()),
            confidence: Some(0.6),
            facial_analysis: Some(FacialAnalysis {
                faces_detected_total: 10,
                frames_analyzed: 10,
                dominant_emotion: None,
            }),
            audio_analysis: None,
            fusion: None,
        });
        let report = synthesize(&raw, &scenario());
        assert!(report.audio_summary.contains("not detected"));
        assert!(report
            .feedback
            .improvements
            .iter()
            .any(|i| i.contains("microphone")));
    }
}
