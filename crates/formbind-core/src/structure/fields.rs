use crate::config::schema::StructureConfig;
use crate::error::FormBindError;
use crate::model::{ElementKind, GeometricElement};
use image::GrayImage;

/// Count foreground pixels in `[x, x+width) x [y, y+height)`, clipped to the mask.
pub fn ink_in_region(mask: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> u32 {
    let (mw, mh) = mask.dimensions();
    let x_end = x.saturating_add(width).min(mw);
    let y_end = y.saturating_add(height).min(mh);
    let mut count = 0;
    for yy in y.min(y_end)..y_end {
        for xx in x.min(x_end)..x_end {
            if mask.get_pixel(xx, yy).0[0] > 0 {
                count += 1;
            }
        }
    }
    count
}

/// Infer fillable text fields from underscore-style horizontal lines.
///
/// A line with enough ink in the strip directly above it reads as a blank
/// with its caption on top; the field is placed just above the line.
pub fn infer_text_fields(
    mask: &GrayImage,
    h_lines: &[GeometricElement],
    config: &StructureConfig,
) -> Result<Vec<GeometricElement>, FormBindError> {
    let (width, height) = mask.dimensions();
    let mut fields = Vec::new();

    for line in h_lines {
        // No room for the field inside the image.
        if line.y() < config.field_height {
            continue;
        }

        let strip_top = line.y().saturating_sub(config.text_strip_height);
        let ink = ink_in_region(mask, line.x(), strip_top, line.width(), line.y() - strip_top);
        if ink <= config.text_pixel_threshold {
            continue;
        }

        fields.push(
            GeometricElement::new(
                ElementKind::TextField,
                line.x(),
                line.y() - config.field_height,
                line.width(),
                config.field_height,
                config.text_field_confidence,
            )?
            .within(width, height)?,
        );
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::foreground_mask;
    use crate::structure::test_support::page;

    fn h_line(x: u32, y: u32, width: u32) -> GeometricElement {
        GeometricElement::new(ElementKind::HLine, x, y, width, 2, 1.0).unwrap()
    }

    #[test]
    fn test_field_placed_above_line_with_text() {
        // "Label" ink: 60x10 block 15px above the line.
        let img = page(300, 200, &[(40, 105, 60, 10), (40, 130, 200, 2)]);
        let mask = foreground_mask(&img);
        let line = h_line(40, 130, 200);

        let fields = infer_text_fields(&mask, &[line], &StructureConfig::default()).unwrap();
        assert_eq!(fields.len(), 1);
        let f = fields[0];
        assert_eq!(f.kind(), ElementKind::TextField);
        assert_eq!(f.y(), line.y() - 25);
        assert_eq!(f.height(), 25);
        assert_eq!(f.x(), 40);
        assert_eq!(f.width(), 200);
        assert_eq!(f.confidence(), 0.9);
    }

    #[test]
    fn test_no_field_without_text_above() {
        let img = page(300, 200, &[(40, 130, 200, 2)]);
        let mask = foreground_mask(&img);
        let fields =
            infer_text_fields(&mask, &[h_line(40, 130, 200)], &StructureConfig::default()).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_sparse_ink_below_threshold() {
        // 5x10 = 50 pixels: not more than the threshold.
        let img = page(300, 200, &[(40, 110, 5, 10)]);
        let mask = foreground_mask(&img);
        let fields =
            infer_text_fields(&mask, &[h_line(40, 130, 200)], &StructureConfig::default()).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_line_near_top_edge_skipped() {
        let img = page(300, 200, &[(40, 0, 60, 10)]);
        let mask = foreground_mask(&img);
        let fields =
            infer_text_fields(&mask, &[h_line(40, 12, 200)], &StructureConfig::default()).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_ink_in_region_clips_to_image() {
        let img = page(50, 50, &[(40, 40, 10, 10)]);
        let mask = foreground_mask(&img);
        assert_eq!(ink_in_region(&mask, 40, 40, 100, 100), 100);
        assert_eq!(ink_in_region(&mask, 60, 60, 10, 10), 0);
    }
}
