//! Raster drawing surface backed by `tiny-skia`.
//!
//! Box strokes and label backgrounds are drawn as anti-aliased paths.
//! Label text is rasterized from an embedded DejaVu Sans Bold face with
//! `ab_glyph` into a coverage mask, then filled through that mask so it
//! blends exactly like the other shapes.

use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont, point};
use image::RgbaImage;
use tiny_skia::{
    ColorU8, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::render::{Color, FontSpec, Surface};
use crate::types::{Dimensions, Rect};

/// Bold sans-serif face used for labels (Bitstream Vera license, see
/// `assets/DejaVuSans-LICENSE.txt`).
static LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Errors from decoding, drawing or encoding raster images.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode or encode an image.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// The surface cannot have this size.
    #[error("invalid surface size {}x{}", .0.width, .0.height)]
    InvalidSize(Dimensions),

    /// The embedded label font could not be loaded.
    #[error("label font unavailable")]
    Font,
}

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) into RGBA.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] if `bytes` is empty.
/// Returns [`RasterError::Image`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    if bytes.is_empty() {
        return Err(RasterError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// A [`Surface`] that draws into an RGBA pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    font: FontRef<'static>,
}

impl PixmapSurface {
    /// Create a 1x1 transparent surface; [`Surface::reset`] sizes it.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Font`] if the embedded font fails to parse.
    pub fn new() -> Result<Self, RasterError> {
        let font = FontRef::try_from_slice(LABEL_FONT).map_err(|_| RasterError::Font)?;
        let pixmap = Pixmap::new(1, 1).ok_or(RasterError::InvalidSize(Dimensions::new(1, 1)))?;
        Ok(Self { pixmap, font })
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Straight-alpha copy of one pixel, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Copy the surface out as a straight-alpha `RgbaImage`.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let data = self.pixmap.clone().take_demultiplied();
        RgbaImage::from_raw(w, h, data).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    /// Encode the surface as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Image`] if PNG encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let image = self.to_rgba_image();
        let mut png = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(png)
    }

    /// Pixel scale for an em size. `ab_glyph` scales relative to the
    /// font's ascent-to-descent height, not its em square.
    fn px_scale(&self, font: &FontSpec) -> PxScale {
        #[allow(clippy::cast_possible_truncation)]
        let em = font.size_px as f32;
        self.font.units_per_em().map_or(PxScale::from(em), |upem| {
            PxScale::from(em * self.font.height_unscaled() / upem)
        })
    }

    /// Lay out `text` on one line, returning each glyph with its pen
    /// position relative to the origin, and the total advance.
    fn layout(&self, text: &str, scale: PxScale) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0_f32;
        let mut prev: Option<GlyphId> = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            prev = Some(id);
        }
        (glyphs, caret)
    }
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

#[allow(clippy::cast_possible_truncation)]
fn to_skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

impl Surface for PixmapSurface {
    type Image = RgbaImage;
    type Error = RasterError;

    fn reset(&mut self, size: Dimensions) -> Result<(), Self::Error> {
        self.pixmap = Pixmap::new(size.width, size.height).ok_or(RasterError::InvalidSize(size))?;
        Ok(())
    }

    fn draw_image(&mut self, image: &RgbaImage) -> Result<(), Self::Error> {
        let size = IntSize::from_wh(image.width(), image.height()).ok_or(
            RasterError::InvalidSize(Dimensions::new(image.width(), image.height())),
        )?;
        let mut data = Vec::with_capacity(image.as_raw().len());
        for p in image.pixels() {
            let c = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let source = Pixmap::from_vec(data, size).ok_or(RasterError::InvalidSize(
            Dimensions::new(image.width(), image.height()),
        ))?;
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Color) -> Result<(), Self::Error> {
        // Zero-area rects have no outline to stroke.
        let Some(rect) = to_skia_rect(rect) else {
            return Ok(());
        };
        let path = PathBuilder::from_rect(rect);
        #[allow(clippy::cast_possible_truncation)]
        let stroke = Stroke {
            width: line_width as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint_for(color), &stroke, Transform::identity(), None);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), Self::Error> {
        if let Some(rect) = to_skia_rect(rect) {
            self.pixmap
                .fill_rect(rect, &paint_for(color), Transform::identity(), None);
        }
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f64, Self::Error> {
        let (_, advance) = self.layout(text, self.px_scale(font));
        Ok(f64::from(advance))
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: &FontSpec,
        color: Color,
    ) -> Result<(), Self::Error> {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let mut mask = Mask::new(w, h).ok_or(RasterError::InvalidSize(Dimensions::new(w, h)))?;
        let scale = self.px_scale(font);
        let (glyphs, advance) = self.layout(text, scale);
        let (ox, oy) = (x as f32, y as f32);

        let coverage = mask.data_mut();
        for (id, pen_x) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(ox + pen_x, oy));
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, c| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= w as i32 || py >= h as i32 {
                    return;
                }
                let idx = py as usize * w as usize + px as usize;
                let value = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                coverage[idx] = coverage[idx].max(value);
            });
        }

        // Fill a rect covering the whole line; the mask shapes the glyphs.
        let ascent = self.font.as_scaled(scale).ascent();
        let descent = self.font.as_scaled(scale).descent();
        if let Some(line) = tiny_skia::Rect::from_ltrb(
            ox.floor() - 1.0,
            (oy - ascent).floor() - 1.0,
            (ox + advance).ceil() + 1.0,
            (oy - descent).ceil() + 1.0,
        ) {
            self.pixmap
                .fill_rect(line, &paint_for(color), Transform::identity(), Some(&mask));
        }
        Ok(())
    }
}
