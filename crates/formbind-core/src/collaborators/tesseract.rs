use super::OcrEngine;
use crate::error::FormBindError;
use crate::model::TextBlock;
use image::{DynamicImage, ImageFormat};
use std::process::Command;
use tracing::{debug, warn};

/// OCR backend using the `tesseract` command-line tool.
///
/// Runs with `--oem 3 --psm 6` (default engine, one uniform block of text)
/// and reads word boxes from its TSV output.
pub struct TesseractOcr {
    oem: u8,
    psm: u8,
}

impl TesseractOcr {
    pub fn new() -> Self {
        TesseractOcr { oem: 3, psm: 6 }
    }

    /// Page segmentation mode passed as `--psm`.
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    /// Check if tesseract is available on the system.
    pub fn is_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextBlock>, FormBindError> {
        // Write the page to a temp PNG
        let tmpfile = tempfile::Builder::new()
            .prefix("formbind-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(tmpfile.path(), ImageFormat::Png)?;

        let output = Command::new("tesseract")
            .arg(tmpfile.path())
            .arg("stdout")
            .args(["--oem", &self.oem.to_string(), "--psm", &self.psm.to_string()])
            .arg("tsv")
            .output()
            .map_err(|e| {
                let reason = if e.kind() == std::io::ErrorKind::NotFound {
                    "tesseract not found on PATH".to_string()
                } else {
                    format!("could not run tesseract: {e}")
                };
                FormBindError::Collaborator {
                    engine: self.backend_name().to_string(),
                    reason,
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FormBindError::Collaborator {
                engine: self.backend_name().to_string(),
                reason: format!("exit code {code}: {}", stderr.trim()),
            });
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let blocks = parse_tsv(&tsv);
        debug!(blocks = blocks.len(), "tesseract recognized words");
        Ok(blocks)
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

/// Word rows of tesseract TSV output.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Layout rows (conf -1) and empty words are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<TextBlock> {
    let mut out = Vec::new();

    for (line_no, raw) in tsv.lines().enumerate().skip(1) {
        let cols: Vec<&str> = raw.splitn(12, '\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let nums: Option<Vec<u32>> = cols[6..10].iter().map(|c| c.trim().parse().ok()).collect();
        let conf: Option<f32> = cols[10].trim().parse().ok();
        let (Some(nums), Some(conf)) = (nums, conf) else {
            warn!(line = line_no + 1, "unparseable tesseract row skipped");
            continue;
        };
        if conf < 0.0 {
            continue;
        }

        match TextBlock::new(text, nums[0], nums[1], nums[2], nums[3], conf.min(100.0)) {
            Ok(block) => out.push(block),
            Err(e) => warn!(line = line_no + 1, error = %e, "tesseract row rejected"),
        }
    }

    out
}
