#![deny(warnings)]

use anyhow::{bail, Context};
use bytes::Bytes;
use camcoach_core::analysis::{AnalysisClient, DummyAnalysisClient, HttpAnalysisClient};
use camcoach_core::config::{
    resolve_endpoint, resolve_string_with_default, ChunkInterval, StdEnv, UploadTimeout,
    DEFAULT_CHUNK_INTERVAL_MS, DEFAULT_STORE_FILENAME, DEFAULT_UPLOAD_TIMEOUT_SECS,
    ENV_STORE_PATH,
};
use camcoach_core::device::ScriptedMediaDevices;
use camcoach_core::feedback::FeedbackReport;
use camcoach_core::recorder::{Recorder, ScriptedEncoder};
use camcoach_core::scenario::{catalog, PracticeScenario};
use camcoach_core::session::SessionController;
use camcoach_core::store::{JsonFileStore, ReportStore};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "camcoach")]
#[command(about = "Record a practice session and get multimodal feedback on it")]
struct Args {
    /// Scenario to practice (see --list-scenarios).
    #[arg(long)]
    scenario: Option<String>,

    /// Analysis service endpoint.
    #[arg(long)]
    endpoint: Option<String>,

    /// Use a canned analysis result instead of calling the service.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Length of the simulated take, in seconds.
    #[arg(long, default_value_t = 5)]
    record_secs: u64,

    #[arg(long, default_value_t = DEFAULT_CHUNK_INTERVAL_MS)]
    chunk_interval_ms: u64,

    #[arg(long, default_value_t = DEFAULT_UPLOAD_TIMEOUT_SECS)]
    upload_timeout_secs: u64,

    /// Where the latest report is kept (single slot, overwritten).
    #[arg(long)]
    store_path: Option<String>,

    #[arg(long, default_value_t = false)]
    list_scenarios: bool,

    /// Print the persisted latest report and exit.
    #[arg(long, default_value_t = false)]
    show_last: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    if args.list_scenarios {
        list_scenarios();
        return Ok(());
    }

    let env = StdEnv;
    let store_path = resolve_string_with_default(
        args.store_path.clone(),
        ENV_STORE_PATH,
        &env,
        DEFAULT_STORE_FILENAME,
    );
    let store = JsonFileStore::new(store_path);

    if args.show_last {
        return show_last(&store).await;
    }

    run_session(args, store).await
}

async fn run_session(args: Args, store: JsonFileStore) -> anyhow::Result<()> {
    let Some(scenario_id) = args.scenario.clone() else {
        bail!("--scenario is required (use --list-scenarios to see the options)");
    };

    let env = StdEnv;
    let endpoint = resolve_endpoint(args.endpoint.clone(), &env)?;
    let timeout = UploadTimeout::new(args.upload_timeout_secs)?;
    let chunk_interval = ChunkInterval::new(args.chunk_interval_ms)?;

    let client: Box<dyn AnalysisClient> = if args.offline {
        tracing::info!("offline mode: using a canned analysis result");
        Box::new(DummyAnalysisClient::default())
    } else {
        tracing::info!(endpoint = endpoint.as_str(), "using the analysis service");
        Box::new(HttpAnalysisClient::new(endpoint, timeout))
    };

    let recorder = Recorder::new(
        ScriptedMediaDevices::granting(),
        simulated_take(args.record_secs),
    )
    .with_chunk_interval(chunk_interval);
    let mut session = SessionController::new(recorder, client, store);

    session.select_scenario(&scenario_id)?;
    let scenario = session
        .scenario()
        .cloned()
        .context("scenario vanished after selection")?;
    println!("Scenario: {}", scenario.title);
    println!("  {}", scenario.prompt_text);

    session.enable_camera().await?;
    session.begin_recording()?;
    let mut flushed = 0;
    for _ in 0..args.record_secs.max(1) {
        tokio::time::sleep(chunk_interval.duration()).await;
        flushed += session.poll_recording()?;
    }
    tracing::debug!(flushed, "chunks flushed during the take");
    session.finish_recording().await?;
    session.submit().await?;

    let report = session.report().context("no report after completion")?;
    print_report(&scenario, report);
    Ok(())
}

/// The headless capture stand-in: one patterned chunk per second of the
/// requested take, plus a final flush.
fn simulated_take(seconds: u64) -> ScriptedEncoder {
    let chunks: Vec<Bytes> = (0..seconds.max(1))
        .map(|i| Bytes::from(vec![(i % 251) as u8; 16 * 1024]))
        .collect();
    ScriptedEncoder::new()
        .with_chunks(chunks)
        .with_final_chunk(Bytes::from(vec![0xFF; 4 * 1024]))
}

fn list_scenarios() {
    for scenario in catalog() {
        println!("{:<14} {}", scenario.id.as_str(), scenario.title);
        println!("{:<14} {}", "", scenario.prompt_text);
    }
}

async fn show_last(store: &JsonFileStore) -> anyhow::Result<()> {
    match store.load().await? {
        Some(stored) => println!("{}", serde_json::to_string_pretty(&stored)?),
        None => println!("no saved report yet"),
    }
    Ok(())
}

fn print_report(scenario: &PracticeScenario, report: &FeedbackReport) {
    println!("\n=== Feedback: {} ===", scenario.title);
    println!("{}", report.tone_summary);
    println!("{}", report.multimodal_summary);
    println!("{}", report.facial_summary);
    println!("{}", report.audio_summary);

    println!("\nAssessments");
    println!("  engagement:  {}", report.assessments.engagement_level);
    println!("  confidence:  {}", report.assessments.speaking_confidence);
    println!("  expression:  {}", report.assessments.emotional_expression);
    println!("  overall:     {}", report.assessments.overall_performance);

    print_list("Strengths", &report.feedback.strengths);
    print_list("Improvements", &report.feedback.improvements);
    print_list("Next steps", &report.feedback.next_steps);
    print_list("Confidence notes", &report.feedback.confidence_notes);
    print_list("Technical tips", &report.feedback.technical_tips);
}

fn print_list(title: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    println!("\n{title}");
    for entry in entries {
        println!("  - {entry}");
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
