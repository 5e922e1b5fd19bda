//! boxsight-core: detection session and annotation rendering (sans-IO).
//!
//! Turns an object-detection backend's response into labeled bounding
//! boxes drawn over the original image:
//! select image -> trigger detection -> parse response -> render.
//!
//! This crate has **no I/O dependencies**. It never sends requests or
//! touches the DOM; [`Session`] hands out requests and accepts their
//! outcomes, and [`render_annotations`] draws onto any [`Surface`]. The
//! browser canvas lives in `boxsight-io`, the HTTP client for the command
//! line in `boxsight-cli`.

pub mod label;
pub mod multipart;
pub mod raster;
pub mod recording;
pub mod render;
pub mod response;
pub mod session;
pub mod types;

pub use label::{confidence_percent, list_entry, overlay_label};
pub use raster::{PixmapSurface, RasterError, decode_image};
pub use recording::{DrawOp, RecordingSurface};
pub use render::{Color, FontSpec, RenderStyle, SourceImage, Surface, render_annotations};
pub use response::{
    DetectionResponse, coordinate_space_matches, parse_response, warn_on_coordinate_mismatch,
};
pub use session::{
    DetectRequest, DetectionCycleState, Resolution, Session, SessionConfig, StalePolicy,
    SurfaceUpdate, Trigger,
};
pub use types::{
    BoundingBox, DEFAULT_ENDPOINT, DETECTION_FAILED_MESSAGE, DetectError, Detection, Dimensions,
    ErrorKind, ImageSource, NO_IMAGE_MESSAGE, Rect, RgbaImage,
};

/// Decode `image` and render it with `detections` onto a new raster
/// surface.
///
/// Logs (but does not fail on) a mismatch between `reported` and the
/// decoded image size.
///
/// # Errors
///
/// Returns [`RasterError`] if the image cannot be decoded or drawn.
pub fn render_to_pixmap(
    image: &ImageSource,
    detections: &[Detection],
    reported: Option<Dimensions>,
    style: &RenderStyle,
) -> Result<PixmapSurface, RasterError> {
    let decoded = decode_image(image.bytes())?;
    let actual = Dimensions::new(decoded.width(), decoded.height());
    warn_on_coordinate_mismatch(reported, actual);
    let mut surface = PixmapSurface::new()?;
    render_annotations(&mut surface, &decoded, detections, style)?;
    Ok(surface)
}
