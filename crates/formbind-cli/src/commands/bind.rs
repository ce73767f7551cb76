use formbind_core::collaborators::{
    GlobalThreshold, JsonBlocksOcr, OcrEngine, SpeechToText, TesseractOcr, TextTranscriptSource,
    WhisperCli,
};
use formbind_core::error::FormBindError;
use formbind_core::jobs::{EngineJobProcessor, JobQueue, JobRequest, JobStatus};
use formbind_core::process_form_with;
use std::path::{Path, PathBuf};
use tracing::info;

use super::engine_config;
use crate::output;

pub struct BindArgs {
    pub image: PathBuf,
    pub blocks: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub media: Option<PathBuf>,
    pub preset: String,
    pub config: Option<PathBuf>,
    pub output: String,
    pub out: Option<PathBuf>,
    pub verbose: bool,
}

pub fn run(args: BindArgs) -> Result<(), FormBindError> {
    let config = engine_config(&args.preset, args.config.as_deref())?;
    let page = image::open(&args.image)?;

    let ocr: Box<dyn OcrEngine> = match args.blocks {
        Some(path) => Box::new(JsonBlocksOcr::new(path)),
        None => Box::new(TesseractOcr::new()),
    };
    let (speech, source): (Box<dyn SpeechToText>, PathBuf) = match (args.transcript, args.media) {
        (Some(path), _) => (Box::new(TextTranscriptSource::new()), path),
        (None, Some(path)) => (Box::new(WhisperCli::default()), path),
        (None, None) => {
            return Err(FormBindError::InvalidInput(
                "either --transcript or --media is required".into(),
            ))
        }
    };

    let result = process_form_with(
        &page,
        &source,
        &GlobalThreshold::default(),
        ocr.as_ref(),
        speech.as_ref(),
        &config,
    )?;

    if let Some(path) = &args.out {
        // Always write JSON when saving to file
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)?;
        eprintln!(
            "Bound {} of {} field(s), written to {}",
            result.report.bindings.len(),
            result.report.total_fields(),
            path.display()
        );
        for w in &result.trace.warnings {
            eprintln!("  warning: {}", w.message);
        }
        return Ok(());
    }

    match args.output.as_str() {
        "json" => output::json::print(&result)?,
        _ => output::table::print_result(&result, args.verbose),
    }
    Ok(())
}

/// Run every job in `jobs_file` through tesseract and whisper.
pub fn batch(jobs_file: &Path, preset: &str, config_file: Option<&Path>) -> Result<(), FormBindError> {
    let config = engine_config(preset, config_file)?;
    let content = std::fs::read_to_string(jobs_file)?;
    let requests: Vec<JobRequest> = serde_json::from_str(&content)?;

    let queue = JobQueue::start(EngineJobProcessor::new(
        config,
        Box::new(GlobalThreshold::default()),
        Box::new(TesseractOcr::new()),
        Box::new(WhisperCli::default()),
    ));
    let total = requests.len();
    for request in requests {
        queue.submit(request)?;
    }
    info!(jobs = total, "batch submitted");
    let records = queue.shutdown()?;

    let failed = records
        .iter()
        .filter(|r| r.status == JobStatus::Error)
        .count();
    output::table::print_jobs(&records);
    if failed > 0 {
        return Err(FormBindError::Job(format!(
            "{failed} of {} job(s) failed",
            records.len()
        )));
    }
    Ok(())
}
