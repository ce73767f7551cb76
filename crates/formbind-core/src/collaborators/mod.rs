pub mod files;
pub mod tesseract;
pub mod whisper;

use crate::error::FormBindError;
use crate::model::{GeometricElement, TextBlock};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use files::{JsonBlocksOcr, TextTranscriptSource};
pub use tesseract::TesseractOcr;
pub use whisper::WhisperCli;

/// Trait for OCR backends.
pub trait OcrEngine: Send + Sync {
    /// Recognize positioned text in a page image.
    ///
    /// Blocks are returned unfiltered; see [`filter_by_confidence`].
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextBlock>, FormBindError>;

    /// Name of this OCR backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for speech-to-text backends.
pub trait SpeechToText: Send + Sync {
    fn transcribe(&self, media: &Path) -> Result<Transcript, FormBindError>;

    fn backend_name(&self) -> &str;
}

/// Trait for image cleanup backends that produce a 0/255 page.
pub trait Binarizer: Send + Sync {
    fn binarize(&self, image: &DynamicImage) -> GrayImage;
}

/// Fixed global threshold on luminance: darker than `level` becomes 0.
///
/// Good enough for clean scans; photographs want an adaptive binarizer.
#[derive(Debug, Clone, Copy)]
pub struct GlobalThreshold {
    pub level: u8,
}

impl Default for GlobalThreshold {
    fn default() -> Self {
        Self { level: 128 }
    }
}

impl Binarizer for GlobalThreshold {
    fn binarize(&self, image: &DynamicImage) -> GrayImage {
        let mut gray = image.to_luma8();
        for pixel in gray.pixels_mut() {
            pixel.0[0] = if pixel.0[0] < self.level { 0 } else { 255 };
        }
        gray
    }
}

/// A timed piece of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Seconds from the start of the recording.
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Mean token log-probability reported by the recognizer.
    #[serde(default, alias = "avg_logprob")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Transcript {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            ..Default::default()
        }
    }

    /// End time of the last segment, 0 without segments.
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

/// Drop blocks the OCR engine was not sure about, and blank ones.
pub fn filter_by_confidence(blocks: Vec<TextBlock>, min_confidence: f32) -> Vec<TextBlock> {
    blocks
        .into_iter()
        .filter(|b| b.confidence() >= min_confidence && !b.text().trim().is_empty())
        .collect()
}

pub const LETTER_WIDTH_INCHES: f32 = 8.5;
pub const LETTER_HEIGHT_INCHES: f32 = 11.0;

/// Rectangle in page inches, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InchRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pixel to inch conversion for a scan that covers a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageScale {
    pub pixels_per_inch_x: f32,
    pub pixels_per_inch_y: f32,
}

impl PageScale {
    pub fn new(
        image_width: u32,
        image_height: u32,
        page_width_inches: f32,
        page_height_inches: f32,
    ) -> Result<Self, FormBindError> {
        if image_width == 0 || image_height == 0 {
            return Err(FormBindError::InvalidInput(
                "cannot scale an empty image".into(),
            ));
        }
        if page_width_inches <= 0.0 || page_height_inches <= 0.0 {
            return Err(FormBindError::InvalidInput(format!(
                "page size {page_width_inches}x{page_height_inches} in is not positive"
            )));
        }
        Ok(Self {
            pixels_per_inch_x: image_width as f32 / page_width_inches,
            pixels_per_inch_y: image_height as f32 / page_height_inches,
        })
    }

    /// Scale for a US-letter page.
    pub fn letter(image_width: u32, image_height: u32) -> Result<Self, FormBindError> {
        Self::new(image_width, image_height, LETTER_WIDTH_INCHES, LETTER_HEIGHT_INCHES)
    }

    pub fn to_inches(&self, x: u32, y: u32) -> (f32, f32) {
        (
            x as f32 / self.pixels_per_inch_x,
            y as f32 / self.pixels_per_inch_y,
        )
    }

    pub fn element_rect(&self, element: &GeometricElement) -> InchRect {
        let (x, y) = self.to_inches(element.x(), element.y());
        let (width, height) = self.to_inches(element.width(), element.height());
        InchRect {
            x,
            y,
            width,
            height,
        }
    }
}
