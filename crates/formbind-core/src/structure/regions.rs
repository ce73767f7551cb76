use crate::config::schema::StructureConfig;
use crate::error::FormBindError;
use crate::model::{ElementKind, GeometricElement};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Axis-aligned bounding rectangle of a connected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Decide what a bounding rectangle represents.
///
/// The checkbox test runs first, so a near-square rectangle that would also
/// pass as a box is always a checkbox.
pub fn classify_rect(width: u32, height: u32, config: &StructureConfig) -> Option<ElementKind> {
    if height == 0 {
        return None;
    }
    let aspect = width as f32 / height as f32;
    let is_square = config.checkbox_aspect_min < aspect && aspect < config.checkbox_aspect_max;
    // Both bounds are exclusive.
    let in_band = |d: u32| config.checkbox_min_size < d && d < config.checkbox_max_size;
    if is_square && in_band(width) && in_band(height) {
        return Some(ElementKind::Checkbox);
    }

    if width > config.box_min_width
        && height > config.box_min_height
        && height < config.box_max_height
    {
        return Some(ElementKind::FieldBox);
    }

    None
}

/// Bounding rectangles of the outermost connected regions of a mask.
///
/// Contours nested inside another region's hole are skipped, so text
/// printed inside a bordered box does not produce regions of its own.
pub fn outer_regions(mask: &GrayImage) -> Vec<Rect> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let min_x = c.points.iter().map(|p| p.x).min()?;
            let max_x = c.points.iter().map(|p| p.x).max()?;
            let min_y = c.points.iter().map(|p| p.y).min()?;
            let max_y = c.points.iter().map(|p| p.y).max()?;
            Some(Rect {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            })
        })
        .collect()
}

/// Detect candidate text boxes and checkboxes in a foreground mask.
pub fn detect_regions(
    mask: &GrayImage,
    config: &StructureConfig,
) -> Result<(Vec<GeometricElement>, Vec<GeometricElement>), FormBindError> {
    let (width, height) = mask.dimensions();
    let mut boxes = Vec::new();
    let mut checkboxes = Vec::new();

    for rect in outer_regions(mask) {
        match classify_rect(rect.width, rect.height, config) {
            Some(ElementKind::Checkbox) => checkboxes.push(
                GeometricElement::new(
                    ElementKind::Checkbox,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    config.checkbox_confidence,
                )?
                .within(width, height)?,
            ),
            Some(kind) => boxes.push(
                GeometricElement::new(
                    kind,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    config.box_confidence,
                )?
                .within(width, height)?,
            ),
            None => {}
        }
    }

    Ok((boxes, checkboxes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::foreground_mask;
    use crate::structure::test_support::{outline, page};

    #[test]
    fn test_square_in_band_is_checkbox() {
        let cfg = StructureConfig::default();
        assert_eq!(classify_rect(20, 20, &cfg), Some(ElementKind::Checkbox));
    }

    #[test]
    fn test_wide_rect_is_box() {
        let cfg = StructureConfig::default();
        assert_eq!(classify_rect(80, 30, &cfg), Some(ElementKind::FieldBox));
    }

    #[test]
    fn test_checkbox_band_edges() {
        let cfg = StructureConfig::default();
        assert_eq!(classify_rect(16, 16, &cfg), Some(ElementKind::Checkbox));
        assert_eq!(classify_rect(39, 39, &cfg), Some(ElementKind::Checkbox));
        assert_eq!(classify_rect(15, 15, &cfg), None);
        assert_eq!(classify_rect(40, 40, &cfg), None);
        assert_eq!(classify_rect(45, 45, &cfg), None);
    }

    #[test]
    fn test_elongated_or_tall_rects_ignored() {
        let cfg = StructureConfig::default();
        // Too short to be a box, too wide to be a checkbox.
        assert_eq!(classify_rect(200, 10, &cfg), None);
        // Too tall for a box.
        assert_eq!(classify_rect(200, 80, &cfg), None);
        assert_eq!(classify_rect(10, 0, &cfg), None);
    }

    #[test]
    fn test_detect_regions_from_image() {
        let mut img = page(300, 200, &[(20, 120, 80, 30)]);
        outline(&mut img, 200, 30, 20, 20);
        let mask = foreground_mask(&img);
        let (boxes, checkboxes) = detect_regions(&mask, &StructureConfig::default()).unwrap();

        assert_eq!(checkboxes.len(), 1);
        let cb = checkboxes[0];
        assert_eq!((cb.x(), cb.y(), cb.width(), cb.height()), (200, 30, 20, 20));
        assert_eq!(cb.confidence(), 0.8);

        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        assert_eq!(b.kind(), ElementKind::FieldBox);
        assert_eq!((b.x(), b.y(), b.width(), b.height()), (20, 120, 80, 30));
        assert_eq!(b.confidence(), 0.7);
    }

    #[test]
    fn test_text_inside_checkbox_is_not_a_region() {
        let mut img = page(100, 100, &[(28, 28, 4, 4)]);
        outline(&mut img, 20, 20, 20, 20);
        let mask = foreground_mask(&img);
        let rects = outer_regions(&mask);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].width, 20);
    }
}
