pub mod collaborators;
pub mod config;
pub mod error;
pub mod jobs;
pub mod matching;
pub mod model;
pub mod structure;
pub mod text;
pub mod trace;
pub mod transcript;

use collaborators::{filter_by_confidence, Binarizer, OcrEngine, SpeechToText};
use config::schema::EngineConfig;
use error::FormBindError;
use image::{DynamicImage, GrayImage};
use matching::BindingReport;
use model::TextBlock;
use serde::Serialize;
use std::path::Path;
use structure::{FormStructure, StructureDetector};
use text::ticket::TicketInfo;
use text::TextClassification;
use trace::TraceBundle;
use tracing::info;
use transcript::{DomainFields, TranscriptEntities};

/// Everything learned about one form and its conversation.
#[derive(Debug, Clone, Serialize)]
pub struct FormResult {
    pub structure: FormStructure,
    pub classification: TextClassification,
    /// Facts printed on the form itself.
    pub ticket: TicketInfo,
    pub entities: TranscriptEntities,
    pub domain: DomainFields,
    pub report: BindingReport,
    pub trace: TraceBundle,
}

/// Main API entry point: bind a conversation to the fields of a form.
///
/// `binary` is the binarized page and `blocks` the raw OCR output for it;
/// blocks below the configured OCR confidence floor are dropped first.
pub fn process_form(
    binary: &GrayImage,
    blocks: Vec<TextBlock>,
    transcript: &str,
    config: &EngineConfig,
) -> Result<FormResult, FormBindError> {
    // Detect form geometry
    let structure = StructureDetector::new(config.structure.clone()).analyze(binary)?;

    // Split OCR text into captions and values
    let blocks = filter_by_confidence(blocks, config.layout.min_ocr_confidence);
    let classification = text::classify(&blocks, &structure.all_elements, &config.layout);
    let ticket = text::ticket::scan_ticket_text(&blocks);

    // Pull entities out of the conversation
    let entities = transcript::parse(transcript);
    let domain = transcript::parse_domain_conversation(transcript);

    // Bind fields to values
    let fillable: Vec<_> = structure.fillable().copied().collect();
    let report = matching::bind(
        &fillable,
        &classification.labels,
        &entities,
        &domain,
        transcript,
        &config.matching,
    );
    let trace = trace::build_binding_trace(&structure, &classification, &entities, &report);

    info!(
        elements = structure.all_elements.len(),
        labels = classification.labels.len(),
        bound = report.bindings.len(),
        fields = report.total_fields(),
        "form processed"
    );

    Ok(FormResult {
        structure,
        classification,
        ticket,
        entities,
        domain,
        report,
        trace,
    })
}

/// Run the whole pipeline through the external engines.
pub fn process_form_with(
    page: &DynamicImage,
    media: &Path,
    binarizer: &dyn Binarizer,
    ocr: &dyn OcrEngine,
    speech: &dyn SpeechToText,
    config: &EngineConfig,
) -> Result<FormResult, FormBindError> {
    let binary = binarizer.binarize(page);
    let blocks = ocr.recognize(page)?;
    let transcript = speech.transcribe(media)?;
    process_form(&binary, blocks, &transcript.text, config)
}
