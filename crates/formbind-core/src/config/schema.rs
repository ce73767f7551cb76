use serde::{Deserialize, Serialize};

/// Tunable thresholds for the whole engine.
///
/// Every pixel threshold was tuned on a single ~300 dpi sample ticket; scans
/// at other resolutions should load a matching preset or a custom file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    pub description: Option<String>,
    pub structure: StructureConfig,
    pub layout: LayoutConfig,
    pub matching: MatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            description: None,
            structure: StructureConfig::default(),
            layout: LayoutConfig::default(),
            matching: MatchConfig::default(),
        }
    }
}

/// Geometric structure detection thresholds (pixels unless noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Minimum Hough accumulator votes for a candidate line.
    pub hough_vote_threshold: u32,
    /// Non-maximum suppression radius in the Hough accumulator.
    pub hough_suppression_radius: u32,
    pub min_line_length: u32,
    /// Largest gap bridged when walking a Hough line across the edge map.
    pub max_line_gap: u32,
    /// Degrees from 0/180 (horizontal) or 90 (vertical) still accepted.
    pub angle_tolerance_deg: f32,
    /// Thickness given to emitted line elements.
    pub line_thickness: u32,
    pub checkbox_min_size: u32,
    pub checkbox_max_size: u32,
    pub checkbox_aspect_min: f32,
    pub checkbox_aspect_max: f32,
    pub box_min_width: u32,
    pub box_min_height: u32,
    pub box_max_height: u32,
    /// Height of the strip above a line scanned for label ink.
    pub text_strip_height: u32,
    /// Foreground pixels in the strip needed to infer a text field.
    pub text_pixel_threshold: u32,
    pub field_height: u32,
    pub checkbox_confidence: f32,
    pub box_confidence: f32,
    pub text_field_confidence: f32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_vote_threshold: 100,
            hough_suppression_radius: 8,
            min_line_length: 50,
            max_line_gap: 10,
            angle_tolerance_deg: 10.0,
            line_thickness: 2,
            checkbox_min_size: 15,
            checkbox_max_size: 40,
            checkbox_aspect_min: 0.7,
            checkbox_aspect_max: 1.3,
            box_min_width: 50,
            box_min_height: 15,
            box_max_height: 50,
            text_strip_height: 30,
            text_pixel_threshold: 50,
            field_height: 25,
            checkbox_confidence: 0.8,
            box_confidence: 0.7,
            text_field_confidence: 0.9,
        }
    }
}

/// Text block classification and line grouping thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical window within which a block counts as a field caption.
    pub label_proximity: u32,
    /// Maximum y difference for two blocks to share a reading line.
    pub line_gap: u32,
    /// OCR blocks below this confidence (0-100) are dropped by the caller.
    pub min_ocr_confidence: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            label_proximity: 30,
            line_gap: 10,
            min_ocr_confidence: 30.0,
        }
    }
}

/// Field-binding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// How far below a field's top edge a label may still start.
    pub label_tolerance: u32,
    pub keyword_confidence: f32,
    pub context_confidence: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            label_tolerance: 20,
            keyword_confidence: 0.8,
            context_confidence: 0.5,
        }
    }
}
