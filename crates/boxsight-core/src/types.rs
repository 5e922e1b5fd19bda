//! Shared types for the boxsight detection session and renderer.

use std::sync::Arc;

/// Re-export `RgbaImage` so downstream crates can hand decoded images to
/// the raster surface without depending on `image` directly.
pub use image::RgbaImage;

/// Detection endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/detect";

/// User-facing message when detection is triggered with no image selected.
pub const NO_IMAGE_MESSAGE: &str = "Please upload an image.";

/// User-facing message for every transport or parse failure.
///
/// The underlying detail is logged, never shown.
pub const DETECTION_FAILED_MESSAGE: &str = "Error during detection. Please try again.";

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in surface pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// A detection's bounding box in the original image's pixel space.
///
/// Always satisfies `x_min <= x_max` and `y_min <= y_max` with finite
/// coordinates; the only constructor is [`BoundingBox::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl BoundingBox {
    /// Create a bounding box, returning `None` if any coordinate is not
    /// finite or a minimum exceeds its maximum.
    #[must_use]
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Option<Self> {
        let finite = [x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite());
        (finite && x_min <= x_max && y_min <= y_max).then_some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    #[must_use]
    pub const fn x_min(&self) -> f64 {
        self.x_min
    }

    #[must_use]
    pub const fn y_min(&self) -> f64 {
        self.y_min
    }

    #[must_use]
    pub const fn x_max(&self) -> f64 {
        self.x_max
    }

    #[must_use]
    pub const fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Grow the box by `padding` pixels on all four sides.
    ///
    /// Purely a visual margin for drawing; the detection itself is
    /// unchanged.
    #[must_use]
    pub fn inflate(&self, padding: f64) -> Rect {
        Rect::new(
            self.x_min - padding,
            self.y_min - padding,
            padding.mul_add(2.0, self.x_max - self.x_min),
            padding.mul_add(2.0, self.y_max - self.y_min),
        )
    }
}

/// One object reported by the detection backend.
///
/// Immutable once parsed. A detection cycle replaces the whole ordered
/// sequence at once; individual detections are never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    class_name: String,
    confidence: f64,
    bbox: BoundingBox,
    class_id: Option<u32>,
}

impl Detection {
    /// Create a detection.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Parse`] if `confidence` is not a finite
    /// value in `[0, 1]`.
    pub fn new(
        class_name: impl Into<String>,
        confidence: f64,
        bbox: BoundingBox,
    ) -> Result<Self, DetectError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DetectError::Parse(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
        Ok(Self {
            class_name: class_name.into(),
            confidence,
            bbox,
            class_id: None,
        })
    }

    /// Attach the backend's numeric class id.
    #[must_use]
    pub const fn with_class_id(mut self, class_id: u32) -> Self {
        self.class_id = Some(class_id);
        self
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Confidence score in `[0, 1]`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub const fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Numeric class id, when the backend sent one.
    #[must_use]
    pub const fn class_id(&self) -> Option<u32> {
        self.class_id
    }
}

/// The user-selected image payload plus its displayable reference.
///
/// `preview` is whatever URI the front end can load the image from: an
/// object URL in the browser, a file path on the command line. The bytes
/// are shared so that handing a copy to an in-flight request is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
    preview: String,
}

impl ImageSource {
    /// Create an image source. The MIME type is inferred from the file
    /// extension of `name`; use [`ImageSource::with_mime_type`] when the
    /// platform reports one.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        preview: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            mime_type: mime_type_for(&name).to_owned(),
            name,
            bytes: bytes.into(),
            preview: preview.into(),
        }
    }

    /// Replace the inferred MIME type. Empty values are ignored.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        if !mime_type.is_empty() {
            self.mime_type = mime_type;
        }
        self
    }

    /// Original file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw encoded image bytes as selected.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Loadable reference for displaying the image.
    #[must_use]
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

/// Extensions the native decoder reads, with their MIME types.
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
];

/// MIME type for a file name, by extension.
///
/// Unknown extensions map to `application/octet-stream`; the backend
/// decides whether it can read the bytes.
#[must_use]
pub fn mime_type_for(name: &str) -> &'static str {
    name.rsplit_once('.')
        .and_then(|(_, ext)| {
            IMAGE_TYPES
                .iter()
                .find(|(e, _)| e.eq_ignore_ascii_case(ext))
                .map(|&(_, mime)| mime)
        })
        .unwrap_or("application/octet-stream")
}

/// Broad category of a [`DetectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any request was made.
    Validation,
    /// Network failure or non-success HTTP status.
    Transport,
    /// The response body did not have the expected shape.
    Parse,
}

/// Errors that end a detection cycle.
///
/// None of these are fatal to the session: the next trigger starts a
/// fresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectError {
    /// Detection was triggered with no image selected.
    #[error("no image selected")]
    NoImage,

    /// The backend answered with a non-success status.
    #[error("detection backend returned HTTP {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The backend's `error` field, or the raw body when absent.
        detail: String,
    },

    /// The request never produced a response.
    #[error("detection request failed: {0}")]
    Transport(String),

    /// The response body was not a valid detection list.
    #[error("malformed detection response: {0}")]
    Parse(String),
}

impl DetectError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoImage => ErrorKind::Validation,
            Self::Status { .. } | Self::Transport(_) => ErrorKind::Transport,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }

    /// The fixed message shown to the user for this error.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => NO_IMAGE_MESSAGE,
            ErrorKind::Transport | ErrorKind::Parse => DETECTION_FAILED_MESSAGE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_rejects_inverted_extents() {
        assert!(BoundingBox::new(10.0, 0.0, 5.0, 10.0).is_none());
        assert!(BoundingBox::new(0.0, 10.0, 10.0, 5.0).is_none());
    }

    #[test]
    fn bounding_box_rejects_non_finite() {
        assert!(BoundingBox::new(f64::NAN, 0.0, 5.0, 10.0).is_none());
        assert!(BoundingBox::new(0.0, 0.0, f64::INFINITY, 10.0).is_none());
    }

    #[test]
    fn degenerate_box_is_allowed() {
        let b = BoundingBox::new(3.0, 4.0, 3.0, 4.0).unwrap();
        assert_eq!(b.inflate(10.0), Rect::new(-7.0, -6.0, 20.0, 20.0));
    }

    #[test]
    fn inflate_grows_every_side() {
        let b = BoundingBox::new(100.0, 50.0, 200.0, 150.0).unwrap();
        let r = b.inflate(10.0);
        assert_eq!(r, Rect::new(90.0, 40.0, 120.0, 120.0));
        assert!((r.right() - 210.0).abs() < f64::EPSILON);
        assert!((r.bottom() - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detection_confidence_bounds() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(Detection::new("cat", 0.0, b).is_ok());
        assert!(Detection::new("cat", 1.0, b).is_ok());
        assert!(matches!(
            Detection::new("cat", 1.5, b),
            Err(DetectError::Parse(_))
        ));
        assert!(Detection::new("cat", f64::NAN, b).is_err());
    }

    #[test]
    fn mime_types_by_extension() {
        assert_eq!(mime_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(mime_type_for("a.b.png"), "image/png");
        assert_eq!(mime_type_for("noext"), "application/octet-stream");
        assert_eq!(mime_type_for("anim.gif"), "application/octet-stream");
    }

    #[test]
    fn reported_mime_type_wins() {
        let gif = ImageSource::new("anim.gif", vec![0_u8], "").with_mime_type("image/gif");
        assert_eq!(gif.mime_type(), "image/gif");
        let bare = ImageSource::new("photo.png", vec![0_u8], "").with_mime_type("");
        assert_eq!(bare.mime_type(), "image/png");
    }

    #[test]
    fn user_messages_hide_detail() {
        let status = DetectError::Status {
            status: 500,
            detail: "CUDA out of memory".into(),
        };
        assert_eq!(status.user_message(), DETECTION_FAILED_MESSAGE);
        assert_eq!(
            DetectError::Parse("missing field".into()).user_message(),
            DETECTION_FAILED_MESSAGE
        );
        assert_eq!(DetectError::NoImage.user_message(), NO_IMAGE_MESSAGE);
        assert_eq!(DetectError::NoImage.kind(), ErrorKind::Validation);
    }
}
