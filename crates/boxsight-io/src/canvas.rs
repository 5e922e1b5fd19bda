//! [`Surface`] implementation for an HTML `<canvas>` 2D context.

use boxsight_core::render::{Color, FontSpec, SourceImage, Surface};
use boxsight_core::{Dimensions, Rect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Errors from drawing on a canvas.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// No element with this id, or it is not a `<canvas>`.
    #[error("no canvas element with id {0:?}")]
    NotFound(String),

    /// The canvas has no 2D context.
    #[error("2d context unavailable")]
    NoContext,
}

impl From<JsValue> for CanvasError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// A decoded `<img>` ready to be drawn.
#[derive(Debug, Clone)]
pub struct LoadedImage(pub HtmlImageElement);

impl SourceImage for LoadedImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.0.natural_width(), self.0.natural_height())
    }
}

/// A canvas element and its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Wrap a canvas element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoContext`] if the 2D context is
    /// unavailable.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, CanvasError> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or(CanvasError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| CanvasError::NoContext)?;
        Ok(Self { canvas, ctx })
    }

    /// Look up a canvas by element id.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NotFound`] if there is no such canvas.
    pub fn by_id(id: &str) -> Result<Self, CanvasError> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| CanvasError::NotFound(id.to_owned()))?;
        Self::new(canvas)
    }

    #[must_use]
    pub const fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Clear the visible content, keeping the current size.
    pub fn clear(&self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    /// Encode the current content as a `data:image/png` URL.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::JsError`] if the canvas is tainted.
    pub fn to_png_data_url(&self) -> Result<String, CanvasError> {
        Ok(self.canvas.to_data_url()?)
    }
}

impl Surface for CanvasSurface {
    type Image = LoadedImage;
    type Error = CanvasError;

    fn reset(&mut self, size: Dimensions) -> Result<(), Self::Error> {
        // Assigning the size resets the bitmap and all context state.
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.clear();
        Ok(())
    }

    fn draw_image(&mut self, image: &LoadedImage) -> Result<(), Self::Error> {
        self.ctx
            .draw_image_with_html_image_element(&image.0, 0.0, 0.0)?;
        Ok(())
    }

    fn stroke_rect(
        &mut self,
        rect: Rect,
        line_width: f64,
        color: Color,
    ) -> Result<(), Self::Error> {
        self.ctx.set_line_width(line_width);
        self.ctx.set_stroke_style_str(&color.css());
        self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), Self::Error> {
        self.ctx.set_fill_style_str(&color.css());
        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f64, Self::Error> {
        // Measure with the font the text will be drawn in.
        self.ctx.set_font(&font.css());
        Ok(self.ctx.measure_text(text)?.width())
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: &FontSpec,
        color: Color,
    ) -> Result<(), Self::Error> {
        self.ctx.set_font(&font.css());
        self.ctx.set_text_baseline("alphabetic");
        self.ctx.set_fill_style_str(&color.css());
        self.ctx.fill_text(text, x, y)?;
        Ok(())
    }
}
