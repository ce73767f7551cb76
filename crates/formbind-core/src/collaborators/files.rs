use super::{OcrEngine, SpeechToText, Transcript};
use crate::error::FormBindError;
use crate::model::TextBlock;
use image::DynamicImage;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(untagged)]
enum BlocksFile {
    List(Vec<TextBlock>),
    Wrapped { blocks: Vec<TextBlock> },
}

/// OCR results recognized ahead of time and stored as JSON.
///
/// Accepts either a bare array of blocks or `{"blocks": [...]}`.
pub struct JsonBlocksOcr {
    path: PathBuf,
}

impl JsonBlocksOcr {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<TextBlock>, FormBindError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_blocks(&content).map_err(|e| FormBindError::Collaborator {
            engine: self.backend_name().to_string(),
            reason: format!("{}: {e}", self.path.display()),
        })
    }
}

/// Parse OCR blocks from JSON text.
pub fn parse_blocks(json: &str) -> Result<Vec<TextBlock>, FormBindError> {
    let file: BlocksFile = serde_json::from_str(json)?;
    Ok(match file {
        BlocksFile::List(blocks) | BlocksFile::Wrapped { blocks } => blocks,
    })
}

impl OcrEngine for JsonBlocksOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<TextBlock>, FormBindError> {
        self.load()
    }

    fn backend_name(&self) -> &str {
        "json-blocks"
    }
}

/// Reads a transcript produced elsewhere.
///
/// `.json` files hold a [`Transcript`] with segments; anything else is read
/// as plain UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTranscriptSource;

impl TextTranscriptSource {
    pub fn new() -> Self {
        Self
    }
}

impl SpeechToText for TextTranscriptSource {
    fn transcribe(&self, media: &Path) -> Result<Transcript, FormBindError> {
        let content = std::fs::read_to_string(media)?;
        let is_json = media
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let mut transcript: Transcript =
                serde_json::from_str(&content).map_err(|e| FormBindError::Collaborator {
                    engine: self.backend_name().to_string(),
                    reason: format!("{}: {e}", media.display()),
                })?;
            transcript.text = transcript.text.trim().to_string();
            Ok(transcript)
        } else {
            Ok(Transcript::from_text(content))
        }
    }

    fn backend_name(&self) -> &str {
        "transcript-file"
    }
}
