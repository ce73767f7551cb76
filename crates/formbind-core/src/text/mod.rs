pub mod ticket;

use crate::config::schema::LayoutConfig;
use crate::model::{GeometricElement, TextBlock};
use serde::Serialize;
use tracing::debug;

/// Words that mark an OCR fragment as a field caption on citation forms.
pub const LABEL_KEYWORDS: &[&str] = &[
    "name",
    "date",
    "address",
    "city",
    "state",
    "zip",
    "license",
    "plate",
    "violation",
    "officer",
    "badge",
    "court",
    "ticket",
    "case",
    "speed",
    "location",
];

/// Label/value partition of a set of OCR blocks.
///
/// Blocks keep their input order within each side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextClassification {
    pub labels: Vec<TextBlock>,
    pub values: Vec<TextBlock>,
}

/// Blocks that share a reading line, left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    /// y of the block that opened the line.
    pub anchor_y: u32,
    pub blocks: Vec<TextBlock>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split OCR blocks into labels and values.
pub fn classify(
    blocks: &[TextBlock],
    elements: &[GeometricElement],
    config: &LayoutConfig,
) -> TextClassification {
    let fields: Vec<&GeometricElement> = elements.iter().filter(|e| e.kind().is_fillable()).collect();

    let mut result = TextClassification::default();
    for block in blocks {
        if is_label(block, &fields, config) {
            result.labels.push(block.clone());
        } else {
            result.values.push(block.clone());
        }
    }

    debug!(
        labels = result.labels.len(),
        values = result.values.len(),
        "text blocks classified"
    );
    result
}

/// Whether a block reads as a caption.
///
/// Any one of: trailing colon, a label keyword, or sitting next to a
/// fillable field the way a caption does.
pub fn is_label(block: &TextBlock, fields: &[&GeometricElement], config: &LayoutConfig) -> bool {
    let text = block.text().trim();
    if text.ends_with(':') {
        return true;
    }

    let lower = text.to_lowercase();
    if LABEL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return true;
    }

    fields.iter().any(|field| is_caption_of(block, field, config.label_proximity))
}

/// Within `proximity` above the field's top edge, starting at or left of its
/// right edge. Text inside or below a field is what was written in it.
fn is_caption_of(block: &TextBlock, field: &GeometricElement, proximity: u32) -> bool {
    block.y() <= field.y() && field.y() - block.y() < proximity && block.x() <= field.right()
}

/// Group blocks into reading-order lines.
///
/// Blocks are sorted top to bottom; a block joins the current line while its
/// y is within `line_gap` of the line's first block.
pub fn group_into_lines(blocks: &[TextBlock], line_gap: u32) -> Vec<TextLine> {
    let mut sorted: Vec<&TextBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.y());

    let mut lines: Vec<TextLine> = Vec::new();
    for block in sorted {
        match lines.last_mut() {
            Some(line) if block.y().abs_diff(line.anchor_y) < line_gap => {
                line.blocks.push(block.clone());
            }
            _ => lines.push(TextLine {
                anchor_y: block.y(),
                blocks: vec![block.clone()],
            }),
        }
    }

    for line in &mut lines {
        line.blocks.sort_by_key(|b| b.x());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;

    fn block(text: &str, x: u32, y: u32) -> TextBlock {
        TextBlock::new(text, x, y, 40, 12, 90.0).unwrap()
    }

    fn field(x: u32, y: u32, w: u32) -> GeometricElement {
        GeometricElement::new(ElementKind::TextField, x, y, w, 25, 0.9).unwrap()
    }

    #[test]
    fn test_colon_suffix_is_label() {
        let c = classify(&[block("Plaintiff:", 0, 0)], &[], &LayoutConfig::default());
        assert_eq!(c.labels.len(), 1);
        assert!(c.values.is_empty());
    }

    #[test]
    fn test_keyword_is_label_case_insensitive() {
        let c = classify(
            &[block("DRIVER LICENSE NO", 0, 0), block("Badge", 0, 100)],
            &[],
            &LayoutConfig::default(),
        );
        assert_eq!(c.labels.len(), 2);
    }

    #[test]
    fn test_plain_text_is_value() {
        let c = classify(&[block("Smith", 0, 0), block("4511.21", 0, 40)], &[], &LayoutConfig::default());
        assert!(c.labels.is_empty());
        assert_eq!(c.values.len(), 2);
    }

    #[test]
    fn test_block_next_to_field_is_label() {
        let fields = [field(100, 200, 150)];
        let cfg = LayoutConfig::default();
        // Within 30px vertically and left of the field's right edge.
        let c = classify(&[block("Vehicle", 20, 180)], &fields, &cfg);
        assert_eq!(c.labels.len(), 1);
        // Too far above.
        let c = classify(&[block("Vehicle", 20, 150)], &fields, &cfg);
        assert!(c.labels.is_empty());
        // Right of the field.
        let c = classify(&[block("Vehicle", 260, 195)], &fields, &cfg);
        assert!(c.labels.is_empty());
    }

    #[test]
    fn test_text_written_inside_field_stays_value() {
        let fields = [field(100, 200, 150)];
        let cfg = LayoutConfig::default();
        let c = classify(&[block("Chen", 120, 210)], &fields, &cfg);
        assert!(c.labels.is_empty());
        assert_eq!(c.values[0].text(), "Chen");

        // Level with the top edge still reads as a caption.
        let c = classify(&[block("Chen", 20, 200)], &fields, &cfg);
        assert_eq!(c.labels.len(), 1);
    }

    #[test]
    fn test_lines_and_checkboxes_do_not_make_captions() {
        let cb = GeometricElement::new(ElementKind::Checkbox, 100, 200, 20, 20, 0.8).unwrap();
        let c = classify(&[block("Vehicle", 20, 195)], &[cb], &LayoutConfig::default());
        assert!(c.labels.is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let blocks = vec![
            block("Name:", 10, 10),
            block("John", 80, 12),
            block("Vehicle", 20, 180),
            block("Red", 200, 400),
        ];
        let fields = [field(100, 200, 150)];
        let cfg = LayoutConfig::default();
        let first = classify(&blocks, &fields, &cfg);
        let second = classify(&blocks, &fields, &cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn test_group_into_lines() {
        let blocks = vec![
            block("Smith", 120, 52),
            block("Name:", 10, 50),
            block("Date:", 10, 80),
            block("01/15/2024", 100, 85),
        ];
        let lines = group_into_lines(&blocks, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Name: Smith");
        assert_eq!(lines[1].text(), "Date: 01/15/2024");
    }

    #[test]
    fn test_group_uses_line_anchor_not_previous_block() {
        // 50 -> 58 -> 66: the third block is 16px from the anchor.
        let blocks = vec![block("a", 0, 50), block("b", 50, 58), block("c", 100, 66)];
        let lines = group_into_lines(&blocks, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].blocks.len(), 2);
        assert_eq!(lines[1].anchor_y, 66);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_into_lines(&[], 10).is_empty());
    }
}
