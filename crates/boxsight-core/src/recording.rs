//! A [`Surface`] that records drawing operations instead of pixels.
//!
//! Useful wherever the question is *what* was drawn rather than how it
//! looks: counting boxes, checking their geometry, or comparing two
//! renders for equality.

use std::convert::Infallible;

use crate::render::{Color, FontSpec, Surface};
use crate::types::{Dimensions, Rect};

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Image(Dimensions),
    StrokeRect {
        rect: Rect,
        line_width: f64,
        color: Color,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        font: String,
        color: Color,
    },
}

/// Display-list surface.
///
/// Text is measured as a fixed fraction of the font size per character,
/// which is enough to make label geometry deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSurface {
    size: Option<Dimensions>,
    ops: Vec<DrawOp>,
    advance_ratio: f64,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// Average advance of a character, as a fraction of the em size.
    pub const DEFAULT_ADVANCE_RATIO: f64 = 0.6;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            size: None,
            ops: Vec::new(),
            advance_ratio: Self::DEFAULT_ADVANCE_RATIO,
        }
    }

    /// Size set by the last reset, or `None` if never drawn.
    #[must_use]
    pub const fn size(&self) -> Option<Dimensions> {
        self.size
    }

    /// Operations since the last reset.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Rectangles stroked since the last reset, in draw order.
    #[must_use]
    pub fn stroked_rects(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokeRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Text drawn since the last reset, in draw order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Forget the size and all operations, as if never drawn.
    pub fn clear(&mut self) {
        self.size = None;
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    type Image = Dimensions;
    type Error = Infallible;

    fn reset(&mut self, size: Dimensions) -> Result<(), Self::Error> {
        self.size = Some(size);
        self.ops.clear();
        Ok(())
    }

    fn draw_image(&mut self, image: &Dimensions) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::Image(*image));
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::StrokeRect {
            rect,
            line_width,
            color,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::FillRect { rect, color });
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f64, Self::Error> {
        Ok(text.chars().count() as f64 * font.size_px * self.advance_ratio)
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: &FontSpec,
        color: Color,
    ) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::FillText {
            text: text.to_owned(),
            x,
            y,
            font: font.css(),
            color,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::render::{RenderStyle, render_annotations};
    use crate::types::{BoundingBox, Detection};

    fn det(name: &str, x: f64, y: f64) -> Detection {
        let b = BoundingBox::new(x, y, x + 10.0, y + 10.0).unwrap();
        Detection::new(name, 0.5, b).unwrap()
    }

    #[test]
    fn records_one_box_per_detection_in_order() {
        let mut surface = RecordingSurface::new();
        let dets = [det("a", 0.0, 0.0), det("b", 50.0, 50.0), det("c", 20.0, 30.0)];
        render_annotations(
            &mut surface,
            &Dimensions::new(100, 100),
            &dets,
            &RenderStyle::default(),
        )
        .unwrap();

        assert_eq!(surface.size(), Some(Dimensions::new(100, 100)));
        assert_eq!(surface.ops()[0], DrawOp::Image(Dimensions::new(100, 100)));
        let rects = surface.stroked_rects();
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[1], Rect::new(40.0, 40.0, 30.0, 30.0));
        assert_eq!(surface.texts(), ["a (50.0%)", "b (50.0%)", "c (50.0%)"]);
    }

    #[test]
    fn each_annotation_is_box_then_background_then_text() {
        let mut surface = RecordingSurface::new();
        render_annotations(
            &mut surface,
            &Dimensions::new(64, 64),
            &[det("a", 20.0, 30.0)],
            &RenderStyle::default(),
        )
        .unwrap();
        let ops = surface.ops();
        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[1], DrawOp::StrokeRect { line_width, .. } if (line_width - 6.0).abs() < f64::EPSILON));
        assert!(matches!(ops[2], DrawOp::FillRect { .. }));
        assert!(matches!(&ops[3], DrawOp::FillText { font, .. } if font == "bold 18px Arial"));
    }

    #[test]
    fn measure_scales_with_length_and_size() {
        let mut surface = RecordingSurface::new();
        let font = RenderStyle::default().font;
        let w = surface.measure_text("abcd", &font).unwrap();
        assert!((w - 4.0 * 18.0 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut surface = RecordingSurface::new();
        render_annotations(
            &mut surface,
            &Dimensions::new(8, 8),
            &[det("a", 0.0, 0.0)],
            &RenderStyle::default(),
        )
        .unwrap();
        surface.clear();
        assert_eq!(surface, RecordingSurface::new());
    }
}
