use crate::error::FormBindError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    HLine,
    VLine,
    /// Rectangular region large enough to hold handwriting.
    #[serde(rename = "box")]
    FieldBox,
    Checkbox,
    /// Blank inferred above an underscore-style line.
    TextField,
}

impl ElementKind {
    /// Whether a value can be written into elements of this kind.
    pub fn is_fillable(self) -> bool {
        matches!(self, ElementKind::FieldBox | ElementKind::TextField)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::HLine => write!(f, "h_line"),
            ElementKind::VLine => write!(f, "v_line"),
            ElementKind::FieldBox => write!(f, "box"),
            ElementKind::Checkbox => write!(f, "checkbox"),
            ElementKind::TextField => write!(f, "text_field"),
        }
    }
}

/// A typed piece of form geometry, in source-image pixel space.
///
/// Only the structure detector creates these; fields are read through
/// accessors so a detected element cannot be patched after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeometricElement {
    kind: ElementKind,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    confidence: f32,
}

impl GeometricElement {
    pub fn new(
        kind: ElementKind,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        confidence: f32,
    ) -> Result<Self, FormBindError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(FormBindError::InvalidElement(format!(
                "{kind} confidence {confidence} is outside [0, 1]"
            )));
        }
        Ok(Self {
            kind,
            x,
            y,
            width,
            height,
            confidence,
        })
    }

    /// Reject the element if it does not fit inside an image of the given size.
    pub fn within(self, image_width: u32, image_height: u32) -> Result<Self, FormBindError> {
        if self.right() > image_width || self.bottom() > image_height {
            return Err(FormBindError::InvalidElement(format!(
                "{} at ({}, {}) size {}x{} exceeds image bounds {}x{}",
                self.kind, self.x, self.y, self.width, self.height, image_width, image_height
            )));
        }
        Ok(self)
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

impl fmt::Display for GeometricElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(x={}, y={}, w={}, h={})",
            self.kind, self.x, self.y, self.width, self.height
        )
    }
}

/// A positioned text fragment as reported by the OCR engine.
///
/// Confidence uses the OCR engine's 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TextBlockRecord")]
pub struct TextBlock {
    text: String,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    confidence: f32,
}

impl TextBlock {
    pub fn new(
        text: impl Into<String>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        confidence: f32,
    ) -> Result<Self, FormBindError> {
        let text = text.into();
        if !(0.0..=100.0).contains(&confidence) {
            return Err(FormBindError::InvalidTextBlock {
                text,
                reason: format!("confidence {confidence} is outside [0, 100]"),
            });
        }
        Ok(Self {
            text,
            x,
            y,
            width,
            height,
            confidence,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Wire shape of a text block, validated on the way into [`TextBlock`].
#[derive(Debug, Deserialize)]
struct TextBlockRecord {
    text: String,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    confidence: f32,
}

impl TryFrom<TextBlockRecord> for TextBlock {
    type Error = FormBindError;

    fn try_from(r: TextBlockRecord) -> Result<Self, Self::Error> {
        TextBlock::new(r.text, r.x, r.y, r.width, r.height, r.confidence)
    }
}

/// A value assigned to a fillable field by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBinding {
    field: GeometricElement,
    label_text: String,
    value: String,
    confidence: f32,
    /// Name of the matching rule that produced the value.
    rule: String,
}

impl FieldBinding {
    pub(crate) fn new(
        field: GeometricElement,
        label_text: impl Into<String>,
        value: impl Into<String>,
        confidence: f32,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field,
            label_text: label_text.into(),
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            rule: rule.into(),
        }
    }

    pub fn field(&self) -> &GeometricElement {
        &self.field
    }

    pub fn label_text(&self) -> &str {
        &self.label_text
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_rejects_bad_confidence() {
        assert!(GeometricElement::new(ElementKind::Checkbox, 0, 0, 20, 20, 1.5).is_err());
        assert!(GeometricElement::new(ElementKind::Checkbox, 0, 0, 20, 20, -0.1).is_err());
        assert!(GeometricElement::new(ElementKind::Checkbox, 0, 0, 20, 20, f32::NAN).is_err());
    }

    #[test]
    fn test_element_within_bounds() {
        let el = GeometricElement::new(ElementKind::FieldBox, 10, 10, 80, 30, 0.7).unwrap();
        assert!(el.within(100, 100).is_ok());
        assert!(el.within(89, 100).is_err());
        assert!(el.within(100, 39).is_err());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ElementKind::HLine).unwrap(), "\"h_line\"");
        assert_eq!(serde_json::to_string(&ElementKind::FieldBox).unwrap(), "\"box\"");
        assert_eq!(
            serde_json::to_string(&ElementKind::TextField).unwrap(),
            "\"text_field\""
        );
    }

    #[test]
    fn test_only_boxes_and_text_fields_are_fillable() {
        assert!(ElementKind::FieldBox.is_fillable());
        assert!(ElementKind::TextField.is_fillable());
        assert!(!ElementKind::Checkbox.is_fillable());
        assert!(!ElementKind::HLine.is_fillable());
    }

    #[test]
    fn test_text_block_confidence_range() {
        assert!(TextBlock::new("Name:", 0, 0, 40, 12, 95.0).is_ok());
        assert!(TextBlock::new("Name:", 0, 0, 40, 12, 101.0).is_err());
    }

    #[test]
    fn test_text_block_deserialize_validates() {
        let ok = r#"{"text":"DATE","x":5,"y":6,"width":30,"height":10,"confidence":88.5}"#;
        let block: TextBlock = serde_json::from_str(ok).unwrap();
        assert_eq!(block.text(), "DATE");
        assert_eq!(block.x(), 5);

        let bad = r#"{"text":"DATE","x":5,"y":6,"width":30,"height":10,"confidence":250}"#;
        assert!(serde_json::from_str::<TextBlock>(bad).is_err());
    }

    #[test]
    fn test_binding_confidence_clamped() {
        let el = GeometricElement::new(ElementKind::TextField, 0, 0, 10, 10, 0.9).unwrap();
        let b = FieldBinding::new(el, "Name:", "John", 1.7, "name");
        assert_eq!(b.confidence(), 1.0);
    }
}
