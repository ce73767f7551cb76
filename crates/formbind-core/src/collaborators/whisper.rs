use super::{SpeechToText, Transcript};
use crate::error::FormBindError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Speech-to-text backend using the `whisper` command-line tool.
///
/// The tool writes `<stem>.json` into an output directory; that file holds
/// the full text and timed segments.
pub struct WhisperCli {
    model: String,
    language: String,
}

impl WhisperCli {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            language: "en".into(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn is_available() -> bool {
        Command::new("whisper")
            .arg("--help")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn error(&self, reason: String) -> FormBindError {
        FormBindError::Collaborator {
            engine: self.backend_name().to_string(),
            reason,
        }
    }
}

impl Default for WhisperCli {
    fn default() -> Self {
        Self::new("base")
    }
}

impl SpeechToText for WhisperCli {
    fn transcribe(&self, media: &Path) -> Result<Transcript, FormBindError> {
        if !media.is_file() {
            return Err(FormBindError::InvalidInput(format!(
                "media file {} does not exist",
                media.display()
            )));
        }
        let out_dir = tempfile::tempdir()?;

        let output = Command::new("whisper")
            .arg(media)
            .args(["--model", &self.model])
            .args(["--language", &self.language])
            .args(["--task", "transcribe", "--fp16", "False"])
            .args(["--output_format", "json"])
            .arg("--output_dir")
            .arg(out_dir.path())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.error("whisper not found on PATH".into())
                } else {
                    self.error(format!("could not run whisper: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.error(format!("exit code {code}: {}", stderr.trim())));
        }

        let stem = media
            .file_stem()
            .ok_or_else(|| self.error(format!("{} has no file name", media.display())))?;
        let json_path = out_dir
            .path()
            .join(format!("{}.json", stem.to_string_lossy()));
        let content = std::fs::read_to_string(&json_path)
            .map_err(|e| self.error(format!("missing output {}: {e}", json_path.display())))?;

        let transcript = parse_whisper_json(&content).map_err(|e| self.error(e.to_string()))?;
        debug!(
            segments = transcript.segments.len(),
            duration = transcript.duration(),
            "whisper transcription finished"
        );
        Ok(transcript)
    }

    fn backend_name(&self) -> &str {
        "whisper"
    }
}

/// Parse whisper's JSON output, trimming the text of the whole and of each segment.
pub fn parse_whisper_json(json: &str) -> Result<Transcript, FormBindError> {
    let mut transcript: Transcript = serde_json::from_str(json)?;
    transcript.text = transcript.text.trim().to_string();
    for segment in &mut transcript.segments {
        segment.text = segment.text.trim().to_string();
    }
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whisper_json() {
        let json = r#"{
            "text": " I'm Officer Martinez. Badge number 5847.",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 2.4, "text": " I'm Officer Martinez.",
                 "tokens": [1, 2], "temperature": 0.0, "avg_logprob": -0.31,
                 "compression_ratio": 1.2, "no_speech_prob": 0.01},
                {"id": 1, "seek": 0, "start": 2.4, "end": 4.0, "text": " Badge number 5847.",
                 "avg_logprob": -0.18}
            ],
            "language": "en"
        }"#;
        let t = parse_whisper_json(json).unwrap();
        assert_eq!(t.text, "I'm Officer Martinez. Badge number 5847.");
        assert_eq!(t.segments[1].text, "Badge number 5847.");
        assert_eq!(t.segments[0].confidence, -0.31);
        assert_eq!(t.duration(), 4.0);
    }

    #[test]
    fn test_missing_media_rejected() {
        let err = WhisperCli::default()
            .transcribe(Path::new("/nonexistent/stop.wav"))
            .unwrap_err();
        assert!(matches!(err, FormBindError::InvalidInput(_)));
    }
}
