//! Directional line extraction.
//!
//! imageproc's Hough transform yields infinite lines in polar form. Each one
//! is walked back across the edge map to recover the finite segments that
//! voted for it, bridging gaps up to `max_line_gap` and dropping segments
//! shorter than `min_line_length`. That reproduces what a probabilistic
//! Hough transform reports.

use crate::config::schema::StructureConfig;
use crate::error::FormBindError;
use crate::model::{ElementKind, GeometricElement};
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines as hough_lines, LineDetectionOptions, PolarLine};

/// A finite line segment in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Segment {
    pub fn length(&self) -> f64 {
        let dx = f64::from(self.x2) - f64::from(self.x1);
        let dy = f64::from(self.y2) - f64::from(self.y1);
        dx.hypot(dy)
    }

    /// Absolute angle from the horizontal axis in degrees, in [0, 180].
    pub fn angle_deg(&self) -> f64 {
        let dx = f64::from(self.x2) - f64::from(self.x1);
        let dy = f64::from(self.y2) - f64::from(self.y1);
        dy.atan2(dx).to_degrees().abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Classify a segment as horizontal, vertical, or neither (diagonal).
pub fn orientation(segment: &Segment, tolerance_deg: f32) -> Option<Orientation> {
    let angle = segment.angle_deg();
    let tol = f64::from(tolerance_deg);
    if angle < tol || angle > 180.0 - tol {
        Some(Orientation::Horizontal)
    } else if (angle - 90.0).abs() < tol {
        Some(Orientation::Vertical)
    } else {
        None
    }
}

/// Detect horizontal and vertical line elements in a binary image.
pub fn detect_lines(
    binary: &GrayImage,
    config: &StructureConfig,
) -> Result<(Vec<GeometricElement>, Vec<GeometricElement>), FormBindError> {
    let (width, height) = binary.dimensions();
    let edges = canny(binary, config.canny_low, config.canny_high);
    let options = LineDetectionOptions {
        vote_threshold: config.hough_vote_threshold,
        suppression_radius: config.hough_suppression_radius,
    };

    let mut h_lines = Vec::new();
    let mut v_lines = Vec::new();

    for line in hough_lines(&edges, options) {
        for segment in walk_segments(&edges, &line, config) {
            match orientation(&segment, config.angle_tolerance_deg) {
                Some(Orientation::Horizontal) => {
                    let x = segment.x1.min(segment.x2);
                    let y = segment.y1.min(segment.y2);
                    let span = segment.x1.abs_diff(segment.x2);
                    let thickness = config.line_thickness.min(height - y);
                    h_lines.push(
                        GeometricElement::new(ElementKind::HLine, x, y, span, thickness, 1.0)?
                            .within(width, height)?,
                    );
                }
                Some(Orientation::Vertical) => {
                    let x = segment.x1.min(segment.x2);
                    let y = segment.y1.min(segment.y2);
                    let span = segment.y1.abs_diff(segment.y2);
                    let thickness = config.line_thickness.min(width - x);
                    v_lines.push(
                        GeometricElement::new(ElementKind::VLine, x, y, thickness, span, 1.0)?
                            .within(width, height)?,
                    );
                }
                None => {}
            }
        }
    }

    Ok((h_lines, v_lines))
}

/// Recover the finite segments of a polar line from the edge map.
///
/// Lines satisfy `x*cos(t) + y*sin(t) = r`. Mostly-horizontal lines are
/// stepped along x, mostly-vertical ones along y, checking one pixel either
/// side of the ideal position to absorb angle quantization.
pub fn walk_segments(edges: &GrayImage, line: &PolarLine, config: &StructureConfig) -> Vec<Segment> {
    let (width, height) = edges.dimensions();
    let theta = f64::from(line.angle_in_degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let r = f64::from(line.r);
    let step_x = sin.abs() >= cos.abs();

    let steps = if step_x { width } else { height };
    let mut segments = Vec::new();
    let mut run: Option<((u32, u32), (u32, u32))> = None;
    let mut gap = 0u32;

    for t in 0..steps {
        let point = if step_x {
            let y = (r - f64::from(t) * cos) / sin;
            to_pixel(f64::from(t), y, width, height)
        } else {
            let x = (r - f64::from(t) * sin) / cos;
            to_pixel(x, f64::from(t), width, height)
        };

        let hit = point.filter(|&(x, y)| is_edge_near(edges, x, y, step_x));
        match (hit, run.as_mut()) {
            (Some(p), Some((_, end))) => {
                *end = p;
                gap = 0;
            }
            (Some(p), None) => {
                run = Some((p, p));
                gap = 0;
            }
            (None, Some(_)) => {
                gap += 1;
                if gap > config.max_line_gap {
                    if let Some((start, end)) = run.take() {
                        push_if_long(&mut segments, start, end, config.min_line_length);
                    }
                    gap = 0;
                }
            }
            (None, None) => {}
        }
    }

    if let Some((start, end)) = run {
        push_if_long(&mut segments, start, end, config.min_line_length);
    }

    segments
}

fn to_pixel(x: f64, y: f64, width: u32, height: u32) -> Option<(u32, u32)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (x, y) = (x.round(), y.round());
    if x < 0.0 || y < 0.0 || x >= f64::from(width) || y >= f64::from(height) {
        return None;
    }
    Some((x as u32, y as u32))
}

fn is_edge_near(edges: &GrayImage, x: u32, y: u32, step_x: bool) -> bool {
    let (width, height) = edges.dimensions();
    let is_edge = |x: u32, y: u32| x < width && y < height && edges.get_pixel(x, y).0[0] > 0;
    if step_x {
        is_edge(x, y) || is_edge(x, y + 1) || (y > 0 && is_edge(x, y - 1))
    } else {
        is_edge(x, y) || is_edge(x + 1, y) || (x > 0 && is_edge(x - 1, y))
    }
}

fn push_if_long(segments: &mut Vec<Segment>, start: (u32, u32), end: (u32, u32), min_len: u32) {
    let segment = Segment {
        x1: start.0,
        y1: start.1,
        x2: end.0,
        y2: end.1,
    };
    if segment.length() >= f64::from(min_len) {
        segments.push(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::test_support::page;
    use image::Luma;

    fn seg(x1: u32, y1: u32, x2: u32, y2: u32) -> Segment {
        Segment { x1, y1, x2, y2 }
    }

    #[test]
    fn test_orientation_classification() {
        assert_eq!(orientation(&seg(0, 10, 100, 12), 10.0), Some(Orientation::Horizontal));
        assert_eq!(orientation(&seg(100, 12, 0, 10), 10.0), Some(Orientation::Horizontal));
        assert_eq!(orientation(&seg(10, 0, 12, 100), 10.0), Some(Orientation::Vertical));
        assert_eq!(orientation(&seg(0, 0, 100, 100), 10.0), None);
    }

    #[test]
    fn test_walk_bridges_small_gaps_and_drops_short_runs() {
        let mut edges = GrayImage::new(200, 20);
        // 0..60 and 65..120 separated by a 4px gap, then a short run.
        for x in (0..60).chain(65..120).chain(150..170) {
            edges.put_pixel(x, 10, Luma([255]));
        }
        let line = PolarLine {
            r: 10.0,
            angle_in_degrees: 90,
        };
        let segments = walk_segments(&edges, &line, &StructureConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].x1, 0);
        assert_eq!(segments[0].x2, 119);
        assert_eq!(segments[0].y1, 10);
    }

    #[test]
    fn test_walk_vertical_line() {
        let mut edges = GrayImage::new(40, 200);
        for y in 20..180 {
            edges.put_pixel(15, y, Luma([255]));
        }
        let line = PolarLine {
            r: 15.0,
            angle_in_degrees: 0,
        };
        let segments = walk_segments(&edges, &line, &StructureConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!((segments[0].x1, segments[0].y1), (15, 20));
        assert_eq!((segments[0].x2, segments[0].y2), (15, 179));
    }

    #[test]
    fn test_detects_long_horizontal_rule() {
        let img = page(240, 100, &[(20, 50, 200, 3)]);
        let (h_lines, v_lines) = detect_lines(&img, &StructureConfig::default()).unwrap();
        assert!(!h_lines.is_empty());
        assert!(v_lines.is_empty());
        for line in &h_lines {
            assert_eq!(line.kind(), ElementKind::HLine);
            assert_eq!(line.height(), 2);
            assert!(line.width() >= 50);
            assert!((40..60).contains(&line.y()), "y = {}", line.y());
        }
    }

    #[test]
    fn test_no_lines_on_blank_page() {
        let img = page(120, 120, &[]);
        let (h_lines, v_lines) = detect_lines(&img, &StructureConfig::default()).unwrap();
        assert!(h_lines.is_empty());
        assert!(v_lines.is_empty());
    }
}
