pub mod fields;
pub mod lines;
pub mod regions;

use crate::config::schema::StructureConfig;
use crate::error::FormBindError;
use crate::model::{ElementKind, GeometricElement};
use image::{GrayImage, Luma};
use serde::Serialize;
use tracing::debug;

/// Everything the detector found on one form image.
///
/// `all_elements` is the plain union of the other lists, in the order
/// h_lines, v_lines, boxes, checkboxes, fields. Overlap between categories
/// is kept; the matcher resolves it by nearest-element selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormStructure {
    pub image_width: u32,
    pub image_height: u32,
    pub h_lines: Vec<GeometricElement>,
    pub v_lines: Vec<GeometricElement>,
    pub boxes: Vec<GeometricElement>,
    pub checkboxes: Vec<GeometricElement>,
    pub fields: Vec<GeometricElement>,
    pub all_elements: Vec<GeometricElement>,
}

impl FormStructure {
    /// Elements a value can be written into (boxes and inferred text fields).
    pub fn fillable(&self) -> impl Iterator<Item = &GeometricElement> {
        self.all_elements.iter().filter(|e| e.kind().is_fillable())
    }

    pub fn count(&self, kind: ElementKind) -> usize {
        self.all_elements.iter().filter(|e| e.kind() == kind).count()
    }
}

/// Infers form structure from a binarized (0/255) image.
pub struct StructureDetector {
    config: StructureConfig,
}

impl StructureDetector {
    pub fn new(config: StructureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn analyze(&self, binary: &GrayImage) -> Result<FormStructure, FormBindError> {
        let (width, height) = binary.dimensions();
        if width == 0 || height == 0 {
            return Err(FormBindError::InvalidInput(format!(
                "binary image has no pixels ({width}x{height})"
            )));
        }

        let mask = foreground_mask(binary);

        let (h_lines, v_lines) = lines::detect_lines(binary, &self.config)?;
        let (boxes, checkboxes) = regions::detect_regions(&mask, &self.config)?;
        let fields = fields::infer_text_fields(&mask, &h_lines, &self.config)?;

        debug!(
            h_lines = h_lines.len(),
            v_lines = v_lines.len(),
            boxes = boxes.len(),
            checkboxes = checkboxes.len(),
            fields = fields.len(),
            "form structure analyzed"
        );

        let all_elements = h_lines
            .iter()
            .chain(&v_lines)
            .chain(&boxes)
            .chain(&checkboxes)
            .chain(&fields)
            .copied()
            .collect();

        Ok(FormStructure {
            image_width: width,
            image_height: height,
            h_lines,
            v_lines,
            boxes,
            checkboxes,
            fields,
            all_elements,
        })
    }
}

impl Default for StructureDetector {
    fn default() -> Self {
        Self::new(StructureConfig::default())
    }
}

/// Build a mask where foreground (ink) pixels are 255 and background is 0.
///
/// Foreground is whichever of dark/light is the minority in the image, so
/// both black-on-white and inverted binarizations work. On an exact tie dark
/// pixels are taken as ink.
pub fn foreground_mask(binary: &GrayImage) -> GrayImage {
    let dark = binary.pixels().filter(|p| p.0[0] < 128).count();
    let total = binary.pixels().len();
    let ink_is_dark = dark * 2 <= total;

    let (width, height) = binary.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let is_dark = binary.get_pixel(x, y).0[0] < 128;
        if is_dark == ink_is_dark {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::page;
    use super::*;

    #[test]
    fn test_blank_page_has_no_elements() {
        let img = page(200, 120, &[]);
        let s = StructureDetector::default().analyze(&img).unwrap();
        assert!(s.h_lines.is_empty());
        assert!(s.v_lines.is_empty());
        assert!(s.boxes.is_empty());
        assert!(s.checkboxes.is_empty());
        assert!(s.fields.is_empty());
        assert!(s.all_elements.is_empty());
    }

    #[test]
    fn test_solid_black_page_has_no_elements() {
        let img = GrayImage::from_pixel(120, 80, Luma([0]));
        let s = StructureDetector::default().analyze(&img).unwrap();
        assert!(s.all_elements.is_empty());
    }

    #[test]
    fn test_empty_image_is_input_error() {
        let img = GrayImage::new(0, 0);
        let err = StructureDetector::default().analyze(&img).unwrap_err();
        assert!(matches!(err, FormBindError::InvalidInput(_)));
    }

    #[test]
    fn test_foreground_mask_picks_minority() {
        let img = page(10, 10, &[(0, 0, 2, 2)]);
        let mask = foreground_mask(&img);
        assert_eq!(mask.get_pixel(0, 0).0[0], 255);
        assert_eq!(mask.get_pixel(5, 5).0[0], 0);

        // Inverted binarization: white ink on black.
        let mut inverted = GrayImage::from_pixel(10, 10, Luma([0]));
        inverted.put_pixel(3, 3, Luma([255]));
        let mask = foreground_mask(&inverted);
        assert_eq!(mask.get_pixel(3, 3).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_all_elements_is_union_in_category_order() {
        let mut img = page(300, 160, &[(20, 100, 80, 30)]);
        super::test_support::outline(&mut img, 200, 20, 20, 20);
        let s = StructureDetector::default().analyze(&img).unwrap();
        let expected = s.h_lines.len()
            + s.v_lines.len()
            + s.boxes.len()
            + s.checkboxes.len()
            + s.fields.len();
        assert_eq!(s.all_elements.len(), expected);
        assert_eq!(s.count(ElementKind::Checkbox), s.checkboxes.len());
        assert_eq!(s.checkboxes.len(), 1);
        assert_eq!(s.boxes.len(), 1);
    }
}
