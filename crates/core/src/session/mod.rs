use crate::analysis::{AnalysisClient, NetworkError, Submission};
use crate::device::{DeviceError, MediaDevices};
use crate::feedback::{synthesize, FeedbackReport};
use crate::recorder::{MediaEncoder, Recorder, RecorderError};
use crate::scenario::{self, PracticeScenario};
use crate::store::{ReportStore, StoreError, StoredReport};
use std::time::SystemTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    ScenarioSelection,
    DeviceSetup,
    Recording,
    Review,
    Submitting,
    Complete,
    Error,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScenarioSelection => "scenario selection",
            Self::DeviceSetup => "device setup",
            Self::Recording => "recording",
            Self::Review => "review",
            Self::Submitting => "submitting",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

/// Which taxonomy the surfaced failure came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Device,
    Recorder,
    Network,
    Store,
}

/// What the session retries when the user asks to try the failed step
/// again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FailedAction {
    EnableCamera,
    BeginRecording,
    Submit,
}

/// The surfaced failure: a human-readable message, the originating error
/// kind, and where the session goes back to once acknowledged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionFailure {
    pub message: String,
    pub kind: ErrorKind,
    resume: SessionPhase,
    retryable: Option<FailedAction>,
}

impl SessionFailure {
    pub fn resume_phase(&self) -> SessionPhase {
        self.resume
    }

    /// False only for the mid-recording encoder failure, which forces a
    /// full restart instead of a step retry.
    pub fn can_retry(&self) -> bool {
        self.retryable.is_some()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
    #[error("cannot {action} during {phase}")]
    InvalidAction {
        action: &'static str,
        phase: &'static str,
    },
}

/// Orchestrates one practice session: scenario choice, recorder
/// lifecycle, upload, synthesis, and the persisted single-slot report.
///
/// Every method corresponds to one user action; failures park the
/// session in [`SessionPhase::Error`] with a message, the error kind,
/// and a way back to the prior actionable phase. Network calls are
/// never retried automatically.
pub struct SessionController<D, E, C, S>
where
    D: MediaDevices,
    E: MediaEncoder,
    C: AnalysisClient,
    S: ReportStore,
{
    recorder: Recorder<D, E>,
    client: C,
    store: S,
    phase: SessionPhase,
    scenario: Option<PracticeScenario>,
    report: Option<FeedbackReport>,
    failure: Option<SessionFailure>,
}

impl<D, E, C, S> SessionController<D, E, C, S>
where
    D: MediaDevices,
    E: MediaEncoder,
    C: AnalysisClient,
    S: ReportStore,
{
    pub fn new(recorder: Recorder<D, E>, client: C, store: S) -> Self {
        Self {
            recorder,
            client,
            store,
            phase: SessionPhase::ScenarioSelection,
            scenario: None,
            report: None,
            failure: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn scenario(&self) -> Option<&PracticeScenario> {
        self.scenario.as_ref()
    }

    pub fn report(&self) -> Option<&FeedbackReport> {
        self.report.as_ref()
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    pub fn recorder(&self) -> &Recorder<D, E> {
        &self.recorder
    }

    /// `ScenarioSelection → DeviceSetup` on an explicit choice.
    pub fn select_scenario(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::ScenarioSelection, "select a scenario")?;
        let scenario =
            scenario::find(id).ok_or_else(|| SessionError::UnknownScenario(id.to_owned()))?;
        tracing::info!(scenario = id, title = %scenario.title, "scenario selected");
        self.scenario = Some(scenario);
        self.phase = SessionPhase::DeviceSetup;
        Ok(())
    }

    /// Acquire camera and microphone. The session stays in device setup;
    /// recording starts with [`SessionController::begin_recording`].
    pub async fn enable_camera(&mut self) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::DeviceSetup, "enable the camera")?;
        match self.recorder.start().await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.recorder.acknowledge_failure();
                self.enter_error(
                    ErrorKind::Device,
                    error.to_string(),
                    SessionPhase::DeviceSetup,
                    Some(FailedAction::EnableCamera),
                );
                Err(error.into())
            }
        }
    }

    /// `DeviceSetup → Recording` once the encoder format is negotiated.
    pub fn begin_recording(&mut self) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::DeviceSetup, "begin recording")?;
        match self.recorder.record() {
            Ok(()) => {
                self.phase = SessionPhase::Recording;
                Ok(())
            }
            Err(error) => {
                self.enter_error(
                    ErrorKind::Recorder,
                    error.to_string(),
                    SessionPhase::DeviceSetup,
                    Some(FailedAction::BeginRecording),
                );
                Err(error.into())
            }
        }
    }

    /// Drain chunks the encoder has flushed so far. An encoder failure
    /// here forces a full restart: the partial buffer cannot be trusted.
    pub fn poll_recording(&mut self) -> Result<usize, SessionError> {
        if self.phase != SessionPhase::Recording {
            return Ok(0);
        }
        match self.recorder.poll_chunks() {
            Ok(appended) => Ok(appended),
            Err(error) => {
                self.fail_recording_attempt(&error);
                Err(error.into())
            }
        }
    }

    /// `Recording → Review` with the assembled blob.
    pub async fn finish_recording(&mut self) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::Recording, "finish recording")?;
        match self.recorder.stop().await {
            Ok(()) => {
                self.phase = SessionPhase::Review;
                Ok(())
            }
            Err(error) => {
                self.fail_recording_attempt(&error);
                Err(error.into())
            }
        }
    }

    /// `Review → Submitting → Complete`: upload the blob, synthesize the
    /// report, persist it into the single latest-result slot.
    pub async fn submit(&mut self) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::Review, "submit the recording")?;
        let Some(scenario) = self.scenario.clone() else {
            return Err(SessionError::InvalidAction {
                action: "submit without a scenario",
                phase: self.phase.name(),
            });
        };
        let Some(blob) = self.recorder.final_blob().cloned() else {
            return Err(SessionError::InvalidAction {
                action: "submit without a finished recording",
                phase: self.phase.name(),
            });
        };

        self.phase = SessionPhase::Submitting;
        let submission = Submission::for_scenario(&scenario);
        match self.client.submit(blob, submission).await {
            Ok(raw) => {
                let report = synthesize(&raw, &scenario);
                let stored = StoredReport {
                    scenario_id: scenario.id.as_str().to_owned(),
                    transcript: raw.transcript.clone(),
                    report: report.clone(),
                    saved_at: SystemTime::now(),
                };
                match self.store.save(stored).await {
                    Ok(()) => {
                        tracing::info!(scenario = scenario.id.as_str(), "session complete");
                        self.report = Some(report);
                        self.phase = SessionPhase::Complete;
                        Ok(())
                    }
                    Err(error) => {
                        self.enter_error(
                            ErrorKind::Store,
                            error.to_string(),
                            SessionPhase::Review,
                            Some(FailedAction::Submit),
                        );
                        Err(error.into())
                    }
                }
            }
            Err(error) => {
                self.enter_error(
                    ErrorKind::Network,
                    error.to_string(),
                    SessionPhase::Review,
                    Some(FailedAction::Submit),
                );
                Err(error.into())
            }
        }
    }

    /// Drop the recording before submission. No network call is ever
    /// issued for a discarded take.
    pub fn discard(&mut self) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::Review, "discard the recording")?;
        self.recorder.discard();
        self.phase = SessionPhase::DeviceSetup;
        tracing::info!("recording discarded before submission");
        Ok(())
    }

    /// Leave the error phase and return to the prior actionable phase.
    pub fn acknowledge_error(&mut self) -> Result<(), SessionError> {
        let Some(failure) = self.failure.take() else {
            return Err(SessionError::InvalidAction {
                action: "acknowledge an error",
                phase: self.phase.name(),
            });
        };
        self.phase = failure.resume;
        Ok(())
    }

    /// Re-run exactly the step that failed. For the one non-retryable
    /// failure (encoder death mid-recording) this only returns the
    /// session to device setup.
    pub async fn retry(&mut self) -> Result<(), SessionError> {
        let Some(failure) = self.failure.clone() else {
            return Err(SessionError::InvalidAction {
                action: "retry",
                phase: self.phase.name(),
            });
        };
        self.acknowledge_error()?;
        match failure.retryable {
            None => Ok(()),
            Some(FailedAction::EnableCamera) => self.enable_camera().await,
            Some(FailedAction::BeginRecording) => self.begin_recording(),
            Some(FailedAction::Submit) => self.submit().await,
        }
    }

    /// Back to scenario selection from any phase, tearing down any live
    /// recorder state.
    pub fn reset(&mut self) {
        self.recorder.discard();
        self.scenario = None;
        self.report = None;
        self.failure = None;
        self.phase = SessionPhase::ScenarioSelection;
    }

    fn require_phase(
        &self,
        expected: SessionPhase,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidAction {
                action,
                phase: self.phase.name(),
            })
        }
    }

    // A dead encoder invalidates the partial buffer, so the attempt is
    // dropped entirely rather than offered for retry.
    fn fail_recording_attempt(&mut self, error: &RecorderError) {
        self.recorder.discard();
        self.enter_error(
            ErrorKind::Recorder,
            error.to_string(),
            SessionPhase::DeviceSetup,
            None,
        );
    }

    fn enter_error(
        &mut self,
        kind: ErrorKind,
        message: String,
        resume: SessionPhase,
        retryable: Option<FailedAction>,
    ) {
        tracing::warn!(?kind, %message, resume = resume.name(), "session entered error phase");
        self.failure = Some(SessionFailure {
            message,
            kind,
            resume,
            retryable,
        });
        self.phase = SessionPhase::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        AnalysisResults, DummyAnalysisClient, FacialAnalysis, RawAnalysisResult,
    };
    use crate::device::ScriptedMediaDevices;
    use crate::feedback::EngagementLevel;
    use crate::recorder::{MediaBlob, RecorderState, ScriptedEncoder};
    use crate::store::MemoryStore;
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts submissions; fails the first `failures` of them.
    #[derive(Clone)]
    struct FlakyClient {
        calls: Arc<AtomicUsize>,
        failures: usize,
        error: NetworkError,
        result: RawAnalysisResult,
    }

    impl FlakyClient {
        fn new(failures: usize, error: NetworkError, result: RawAnalysisResult) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                failures,
                error,
                result,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnalysisClient for FlakyClient {
        fn submit(
            &self,
            _blob: MediaBlob,
            _submission: Submission,
        ) -> BoxFuture<'_, Result<RawAnalysisResult, NetworkError>> {
            async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call < self.failures {
                    Err(self.error.clone())
                } else {
                    Ok(self.result.clone())
                }
            }
            .boxed()
        }
    }

    fn happy_result() -> RawAnalysisResult {
        RawAnalysisResult {
            success: true,
            analysis_results: Some(AnalysisResults {
                final_emotion: Some("happy".to_owned()),
                confidence: Some(0.82),
                facial_analysis: Some(FacialAnalysis {
                    faces_detected_total: 9,
                    frames_analyzed: 10,
                    dominant_emotion: Some("happy".to_owned()),
                }),
                audio_analysis: None,
                fusion: None,
            }),
            transcript: Some("Hi, I'm glad to be here.".to_owned()),
            error: None,
        }
    }

    fn encoder_with_take() -> ScriptedEncoder {
        ScriptedEncoder::new()
            .with_chunks(vec![
                Bytes::from_static(b"frame-1"),
                Bytes::from_static(b"frame-2"),
            ])
            .with_final_chunk(Bytes::from_static(b"frame-3"))
    }

    fn controller<C: AnalysisClient>(
        devices: ScriptedMediaDevices,
        encoder: ScriptedEncoder,
        client: C,
        store: MemoryStore,
    ) -> SessionController<ScriptedMediaDevices, ScriptedEncoder, C, MemoryStore> {
        SessionController::new(Recorder::new(devices, encoder), client, store)
    }

    #[tokio::test]
    async fn full_session_produces_and_persists_the_report() {
        let store = MemoryStore::new();
        let client = DummyAnalysisClient::with_result(happy_result());
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            client,
            store.clone(),
        );

        session.select_scenario("introduction").expect("scenario selected");
        session.enable_camera().await.expect("camera enabled");
        session.begin_recording().expect("recording started");
        session.finish_recording().await.expect("recording finished");
        assert_eq!(session.phase(), SessionPhase::Review);

        session.submit().await.expect("submission succeeds");
        assert_eq!(session.phase(), SessionPhase::Complete);

        let report = session.report().expect("report available");
        assert_eq!(
            report.assessments.engagement_level,
            EngagementLevel::Excellent
        );
        assert_eq!(
            report.assessments.speaking_confidence.to_string(),
            "Confident speaker"
        );

        let stored = store
            .load()
            .await
            .expect("load succeeds")
            .expect("slot filled");
        assert_eq!(stored.scenario_id, "introduction");
        assert_eq!(&stored.report, report);
        assert_eq!(stored.transcript.as_deref(), Some("Hi, I'm glad to be here."));
    }

    #[tokio::test]
    async fn actions_out_of_phase_are_rejected() {
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            DummyAnalysisClient::default(),
            MemoryStore::new(),
        );

        assert!(matches!(
            session.begin_recording(),
            Err(SessionError::InvalidAction { .. })
        ));
        assert!(matches!(
            session.submit().await,
            Err(SessionError::InvalidAction { .. })
        ));
        assert!(matches!(
            session.discard(),
            Err(SessionError::InvalidAction { .. })
        ));
        assert_eq!(session.phase(), SessionPhase::ScenarioSelection);
    }

    #[tokio::test]
    async fn unknown_scenario_is_rejected_in_place() {
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            DummyAnalysisClient::default(),
            MemoryStore::new(),
        );
        assert!(matches!(
            session.select_scenario("nope"),
            Err(SessionError::UnknownScenario(_))
        ));
        assert_eq!(session.phase(), SessionPhase::ScenarioSelection);
    }

    #[tokio::test]
    async fn denied_camera_parks_session_in_error_and_recovers() {
        let mut session = controller(
            ScriptedMediaDevices::failing(DeviceError::NotAllowed),
            encoder_with_take(),
            DummyAnalysisClient::default(),
            MemoryStore::new(),
        );
        session.select_scenario("interview").expect("scenario selected");

        let err = session.enable_camera().await.expect_err("camera denied");
        assert!(matches!(err, SessionError::Device(DeviceError::NotAllowed)));
        assert_eq!(session.phase(), SessionPhase::Error);

        let failure = session.failure().expect("failure recorded");
        assert_eq!(failure.kind, ErrorKind::Device);
        assert!(failure.can_retry());
        assert_eq!(failure.resume_phase(), SessionPhase::DeviceSetup);

        session.acknowledge_error().expect("acknowledged");
        assert_eq!(session.phase(), SessionPhase::DeviceSetup);
    }

    #[tokio::test]
    async fn submit_failure_surfaces_and_retry_reruns_only_the_upload() {
        let client = FlakyClient::new(1, NetworkError::Timeout, happy_result());
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            client.clone(),
            MemoryStore::new(),
        );

        session.select_scenario("introduction").expect("scenario selected");
        session.enable_camera().await.expect("camera enabled");
        session.begin_recording().expect("recording started");
        session.finish_recording().await.expect("recording finished");

        let err = session.submit().await.expect_err("first submit times out");
        assert!(matches!(err, SessionError::Network(NetworkError::Timeout)));
        assert_eq!(session.phase(), SessionPhase::Error);
        let failure = session.failure().expect("failure recorded");
        assert_eq!(failure.kind, ErrorKind::Network);
        assert_eq!(failure.resume_phase(), SessionPhase::Review);

        session.retry().await.expect("retry succeeds");
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert_eq!(client.calls(), 2, "exactly one manual retry, no auto-retries");
    }

    #[tokio::test]
    async fn discard_never_issues_a_network_call() {
        let client = FlakyClient::new(0, NetworkError::Timeout, happy_result());
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            client.clone(),
            MemoryStore::new(),
        );

        session.select_scenario("small-talk").expect("scenario selected");
        session.enable_camera().await.expect("camera enabled");
        session.begin_recording().expect("recording started");
        session.finish_recording().await.expect("recording finished");

        session.discard().expect("discard succeeds");
        assert_eq!(session.phase(), SessionPhase::DeviceSetup);
        assert_eq!(session.recorder().state(), &RecorderState::Idle);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn encoder_death_forces_full_restart() {
        let encoder = ScriptedEncoder::new()
            .with_chunks(vec![Bytes::from_static(b"frame-1")])
            .with_error_after(1, "encoder crashed");
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder,
            DummyAnalysisClient::default(),
            MemoryStore::new(),
        );

        session.select_scenario("presentation").expect("scenario selected");
        session.enable_camera().await.expect("camera enabled");
        session.begin_recording().expect("recording started");

        let err = session
            .finish_recording()
            .await
            .expect_err("stop observes the encoder error");
        assert!(matches!(err, SessionError::Recorder(_)));
        let failure = session.failure().expect("failure recorded");
        assert!(!failure.can_retry(), "mid-recording failure is not retryable");

        session.retry().await.expect("retry degrades to acknowledge");
        assert_eq!(session.phase(), SessionPhase::DeviceSetup);
        assert_eq!(session.recorder().state(), &RecorderState::Idle);
    }

    #[tokio::test]
    async fn reset_returns_to_scenario_selection_from_any_phase() {
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            DummyAnalysisClient::with_result(happy_result()),
            MemoryStore::new(),
        );

        session.select_scenario("introduction").expect("scenario selected");
        session.enable_camera().await.expect("camera enabled");
        session.begin_recording().expect("recording started");

        session.reset();
        assert_eq!(session.phase(), SessionPhase::ScenarioSelection);
        assert!(session.scenario().is_none());
        assert!(session.report().is_none());
        assert_eq!(session.recorder().state(), &RecorderState::Idle);
    }

    #[tokio::test]
    async fn poll_recording_reports_progress_outside_recording_as_zero() {
        let mut session = controller(
            ScriptedMediaDevices::granting(),
            encoder_with_take(),
            DummyAnalysisClient::default(),
            MemoryStore::new(),
        );
        assert_eq!(session.poll_recording().expect("noop poll"), 0);

        session.select_scenario("introduction").expect("scenario selected");
        session.enable_camera().await.expect("camera enabled");
        session.begin_recording().expect("recording started");
        assert_eq!(session.poll_recording().expect("poll drains"), 2);
    }
}
