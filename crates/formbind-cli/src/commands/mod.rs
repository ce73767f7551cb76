pub mod analyze;
pub mod bind;
pub mod config;
pub mod fill;
pub mod parse;

use formbind_core::collaborators::{SpeechToText, TextTranscriptSource, Transcript};
use formbind_core::config::builtin::load_preset;
use formbind_core::config::load_config;
use formbind_core::config::schema::EngineConfig;
use formbind_core::error::FormBindError;
use std::path::Path;

/// A config file wins over the preset name.
pub fn engine_config(preset: &str, file: Option<&Path>) -> Result<EngineConfig, FormBindError> {
    match file {
        Some(path) => load_config(path),
        None => load_preset(preset),
    }
}

pub fn read_transcript(path: &Path) -> Result<Transcript, FormBindError> {
    TextTranscriptSource::new().transcribe(path)
}
