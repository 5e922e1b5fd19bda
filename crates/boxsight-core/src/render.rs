//! Annotation renderer.
//!
//! Draws a source image and one labeled box per detection onto a
//! [`Surface`]. The drawing operations mirror a 2D canvas context so the
//! same algorithm drives the browser canvas, the tiny-skia raster surface
//! and the recording surface used in tests.
//!
//! # Algorithm
//!
//! 1. Resize the surface to the image's natural size and clear it.
//! 2. Draw the image at (0,0), 1:1.
//! 3. For each detection, in order (later detections on top):
//!    stroke the box inflated by [`RenderStyle::box_padding`], then
//!    fill a label background sized to the measured label text directly
//!    above the inflated box's top-left corner, then fill the label text.
//!
//! Every call starts from a cleared surface, so rendering the same inputs
//! twice gives identical output.

use crate::label::overlay_label;
use crate::types::{Detection, Dimensions, Rect, RgbaImage};

/// An 8-bit RGBA paint color (straight alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS color string: `#rrggbb` when opaque, `rgba(r, g, b, a)`
    /// otherwise.
    #[must_use]
    pub fn css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = f64::from(self.a) / 255.0;
            format!("rgba({}, {}, {}, {alpha:.3})", self.r, self.g, self.b)
        }
    }
}

/// Font used for label text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// CSS font family. Raster surfaces use their embedded face instead.
    pub family: String,
    /// Em size in pixels.
    pub size_px: f64,
    pub bold: bool,
}

impl FontSpec {
    /// CSS `font` shorthand, e.g. `"bold 18px Arial"`.
    #[must_use]
    pub fn css(&self) -> String {
        let weight = if self.bold { "bold " } else { "" };
        format!("{weight}{}px {}", self.size_px, self.family)
    }
}

/// Fixed visual constants for annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    /// Margin added on every side of a detection box.
    pub box_padding: f64,
    /// Box stroke width.
    pub line_width: f64,
    pub box_color: Color,
    /// Height of the label background.
    pub label_height: f64,
    /// Extra width added to the measured label text.
    pub label_padding: f64,
    /// Offset of the text from the background's left and bottom edges.
    pub text_inset: f64,
    pub font: FontSpec,
    pub label_background: Color,
    pub label_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            box_padding: 10.0,
            line_width: 6.0,
            box_color: Color::rgb(0x2B, 0x00, 0x00),
            label_height: 24.0,
            label_padding: 10.0,
            text_inset: 5.0,
            font: FontSpec {
                family: "Arial".to_owned(),
                size_px: 18.0,
                bold: true,
            },
            label_background: Color::rgba(0, 0, 0, 204),
            label_color: Color::WHITE,
        }
    }
}

/// Something with a known natural size that a [`Surface`] can draw.
pub trait SourceImage {
    /// Natural (intrinsic) pixel size.
    fn dimensions(&self) -> Dimensions;
}

impl SourceImage for RgbaImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }
}

/// Size-only image, for surfaces that record operations instead of
/// pixels.
impl SourceImage for Dimensions {
    fn dimensions(&self) -> Dimensions {
        *self
    }
}

/// A 2D drawing target with canvas-like operations.
///
/// Text positions are on the alphabetic baseline.
pub trait Surface {
    /// Image type this surface can draw.
    type Image: SourceImage + ?Sized;
    /// Error raised by the underlying drawing backend.
    type Error;

    /// Resize to `size` and clear all content.
    fn reset(&mut self, size: Dimensions) -> Result<(), Self::Error>;

    /// Draw `image` at the origin, unscaled.
    fn draw_image(&mut self, image: &Self::Image) -> Result<(), Self::Error>;

    /// Stroke the outline of `rect`, centered on its edges.
    fn stroke_rect(
        &mut self,
        rect: Rect,
        line_width: f64,
        color: Color,
    ) -> Result<(), Self::Error>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), Self::Error>;

    /// Advance width of `text` in `font`.
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f64, Self::Error>;

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: &FontSpec,
        color: Color,
    ) -> Result<(), Self::Error>;
}

/// Geometry of one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationLayout {
    /// The inflated box outline.
    pub frame: Rect,
    /// Label background, directly above `frame`'s top-left corner.
    pub label_background: Rect,
    /// Baseline origin of the label text.
    pub text_origin: (f64, f64),
}

/// Compute where a detection's box and label go, given the measured
/// width of its label text.
#[must_use]
pub fn layout_annotation(
    detection: &Detection,
    style: &RenderStyle,
    text_width: f64,
) -> AnnotationLayout {
    let frame = detection.bbox().inflate(style.box_padding);
    let label_background = Rect::new(
        frame.x,
        frame.y - style.label_height,
        text_width + style.label_padding,
        style.label_height,
    );
    AnnotationLayout {
        frame,
        label_background,
        text_origin: (frame.x + style.text_inset, frame.y - style.text_inset),
    }
}

/// Render `image` and its detections onto `surface`.
///
/// The surface ends up exactly the image's natural size. Detections are
/// drawn in sequence order with no z-sorting.
///
/// # Errors
///
/// Propagates the first error from the surface; drawing stops there.
pub fn render_annotations<S: Surface>(
    surface: &mut S,
    image: &S::Image,
    detections: &[Detection],
    style: &RenderStyle,
) -> Result<(), S::Error> {
    let size = image.dimensions();
    surface.reset(size)?;
    surface.draw_image(image)?;

    for detection in detections {
        let label = overlay_label(detection);
        let text_width = surface.measure_text(&label, &style.font)?;
        let layout = layout_annotation(detection, style, text_width);

        surface.stroke_rect(layout.frame, style.line_width, style.box_color)?;
        surface.fill_rect(layout.label_background, style.label_background)?;
        let (x, y) = layout.text_origin;
        surface.fill_text(&label, x, y, &style.font, style.label_color)?;
    }
    Ok(())
}
