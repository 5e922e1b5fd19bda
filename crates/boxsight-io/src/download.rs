//! File download via a temporary anchor element.
//!
//! Dioxus has no built-in file download API. This module triggers
//! downloads by programmatically clicking a temporary `<a download>`.
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;

use crate::canvas::CanvasSurface;

/// Errors that can occur when triggering a file download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Download whatever `href` points at (object or data URL) as
/// `filename`.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if any browser API call fails.
pub fn trigger_download(href: &str, filename: &str) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| DownloadError::JsError(format!("failed to cast element: {e:?}")))?;
    anchor.set_href(href);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| DownloadError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();
    // The download has started; removal failing is harmless.
    let _ = body.remove_child(&anchor);
    Ok(())
}

/// Download the canvas content as a PNG.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if encoding or the download fails.
pub fn download_canvas_png(canvas_id: &str, filename: &str) -> Result<(), DownloadError> {
    let surface =
        CanvasSurface::by_id(canvas_id).map_err(|e| DownloadError::JsError(e.to_string()))?;
    let url = surface
        .to_png_data_url()
        .map_err(|e| DownloadError::JsError(e.to_string()))?;
    trigger_download(&url, filename)
}

/// `photo.jpg` -> `photo-annotated.png`.
#[must_use]
pub fn annotated_filename(source: &str) -> String {
    let stem = source.rsplit_once('.').map_or(source, |(stem, _)| stem);
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{stem}-annotated.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotated_names() {
        assert_eq!(annotated_filename("photo.jpg"), "photo-annotated.png");
        assert_eq!(annotated_filename("a.b.png"), "a.b-annotated.png");
        assert_eq!(annotated_filename("noext"), "noext-annotated.png");
        assert_eq!(annotated_filename(".png"), "image-annotated.png");
    }
}
