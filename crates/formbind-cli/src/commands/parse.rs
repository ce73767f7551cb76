use formbind_core::error::FormBindError;
use formbind_core::transcript;
use serde::Serialize;
use std::path::Path;

use super::read_transcript;
use crate::output;

#[derive(Serialize)]
struct ParsedTranscript {
    entities: transcript::TranscriptEntities,
    domain: transcript::DomainFields,
}

pub fn run(transcript_file: &Path, output_format: &str) -> Result<(), FormBindError> {
    let text = read_transcript(transcript_file)?.text;
    let parsed = ParsedTranscript {
        entities: transcript::parse(&text),
        domain: transcript::parse_domain_conversation(&text),
    };

    match output_format {
        "json" => output::json::print(&parsed)?,
        _ => output::table::print_entities(&parsed.entities, &parsed.domain),
    }
    Ok(())
}
