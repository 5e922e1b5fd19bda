//! Draw the selected image and its detections on the page canvas.

use boxsight_core::{
    Detection, Dimensions, RenderStyle, SourceImage, render_annotations, warn_on_coordinate_mismatch,
};

use crate::canvas::{CanvasError, CanvasSurface, LoadedImage};
use crate::preview::{PreviewError, load_image};

/// Errors from rendering annotations onto the page canvas.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The preview image could not be loaded.
    #[error(transparent)]
    Preview(#[from] PreviewError),

    /// Drawing on the canvas failed.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Load `preview_url`, then render it with `detections` onto the canvas
/// `canvas_id`.
///
/// Loading suspends; if `still_current` returns `false` once the image
/// is ready, nothing is drawn and `Ok(false)` is returned.
///
/// # Errors
///
/// Returns [`RenderError`] if the image fails to load or the canvas
/// cannot be drawn on.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn render_to_canvas(
    canvas_id: &str,
    preview_url: &str,
    detections: &[Detection],
    reported: Option<Dimensions>,
    style: &RenderStyle,
    still_current: impl Fn() -> bool,
) -> Result<bool, RenderError> {
    let image = LoadedImage(load_image(preview_url).await?);
    if !still_current() {
        log::debug!("skipping superseded render of {} detections", detections.len());
        return Ok(false);
    }

    warn_on_coordinate_mismatch(reported, image.dimensions());
    let mut surface = CanvasSurface::by_id(canvas_id)?;
    render_annotations(&mut surface, &image, detections, style)?;
    Ok(true)
}
