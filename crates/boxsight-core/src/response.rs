//! Detection response parsing.
//!
//! The backend answers `POST /detect` with
//! `{ "detections": [ { class_name, confidence, bbox: {x_min, y_min,
//! x_max, y_max}, class_id?, original_width?, original_height? } ] }`
//! on success and `{ "error": "..." }` alongside a non-2xx status on
//! failure. This module turns a status code and body into either a
//! validated [`DetectionResponse`] or a [`DetectError`].

use serde::Deserialize;

use crate::types::{BoundingBox, DetectError, Detection, Dimensions};

#[derive(Deserialize)]
struct WireResponse {
    detections: Vec<WireDetection>,
}

#[derive(Deserialize)]
struct WireDetection {
    class_name: String,
    confidence: f64,
    bbox: WireBox,
    #[serde(default)]
    class_id: Option<u32>,
    #[serde(default)]
    original_width: Option<u32>,
    #[serde(default)]
    original_height: Option<u32>,
}

#[derive(Deserialize)]
struct WireBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

#[derive(Deserialize)]
struct WireError {
    error: String,
}

/// A successfully parsed detection response.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResponse {
    /// Detections in the order the backend reported them.
    pub detections: Vec<Detection>,

    /// Image size the backend says it ran inference on, if reported.
    ///
    /// Box coordinates are in this space. It should equal the decoded
    /// image's natural size; see [`coordinate_space_matches`].
    pub reported_dimensions: Option<Dimensions>,
}

/// Parse a detection response from its HTTP status and body.
///
/// # Errors
///
/// Returns [`DetectError::Status`] for any non-2xx status (the backend's
/// `error` field is kept as detail when present).
/// Returns [`DetectError::Parse`] if a 2xx body is not a valid detection
/// list.
pub fn parse_response(status: u16, body: &str) -> Result<DetectionResponse, DetectError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<WireError>(body)
            .map_or_else(|_| body.trim().to_owned(), |e| e.error);
        return Err(DetectError::Status { status, detail });
    }
    parse_body(body)
}

/// Parse a successful response body.
///
/// # Errors
///
/// Returns [`DetectError::Parse`] if the JSON is malformed, the
/// `detections` field is missing, or any detection violates the box
/// ordering or confidence range invariants.
pub fn parse_body(body: &str) -> Result<DetectionResponse, DetectError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| DetectError::Parse(e.to_string()))?;

    let mut reported: Option<Dimensions> = None;
    let mut detections = Vec::with_capacity(wire.detections.len());
    for (i, det) in wire.detections.into_iter().enumerate() {
        let b = &det.bbox;
        let bbox = BoundingBox::new(b.x_min, b.y_min, b.x_max, b.y_max).ok_or_else(|| {
            DetectError::Parse(format!(
                "detection {i}: invalid bbox ({}, {})-({}, {})",
                b.x_min, b.y_min, b.x_max, b.y_max
            ))
        })?;
        let detection = Detection::new(det.class_name, det.confidence, bbox)
            .map_err(|e| DetectError::Parse(format!("detection {i}: {e}")))?;
        let detection = match det.class_id {
            Some(id) => detection.with_class_id(id),
            None => detection,
        };

        if let (Some(width), Some(height)) = (det.original_width, det.original_height) {
            let dims = Dimensions::new(width, height);
            match reported {
                Some(prev) if prev != dims => {
                    return Err(DetectError::Parse(format!(
                        "detection {i}: original size {width}x{height} disagrees with {}x{}",
                        prev.width, prev.height
                    )));
                }
                _ => reported = Some(dims),
            }
        }

        detections.push(detection);
    }

    Ok(DetectionResponse {
        detections,
        reported_dimensions: reported,
    })
}

/// Check the coordinate contract between backend and image.
///
/// Boxes are drawn unscaled, so they are only correct when the backend
/// ran on an image of the same natural size as the one being drawn.
/// Returns `true` when no size was reported or the sizes agree.
#[must_use]
pub fn coordinate_space_matches(reported: Option<Dimensions>, actual: Dimensions) -> bool {
    reported.is_none_or(|r| r == actual)
}

/// Log a warning when the reported and actual image sizes disagree.
/// Drawing goes ahead unscaled either way.
pub fn warn_on_coordinate_mismatch(reported: Option<Dimensions>, actual: Dimensions) {
    match reported {
        Some(r) if !coordinate_space_matches(reported, actual) => log::warn!(
            "backend reported a {}x{} image but the source is {}x{}; boxes drawn unscaled",
            r.width,
            r.height,
            actual.width,
            actual.height
        ),
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    const CAT: &str = r#"{"detections":[{"class_id":15,"class_name":"cat","confidence":0.92,
        "bbox":{"x_min":100,"y_min":50,"x_max":200,"y_max":150},
        "original_width":640,"original_height":480}]}"#;

    #[test]
    fn parses_backend_shape() {
        let resp = parse_response(200, CAT).unwrap();
        assert_eq!(resp.detections.len(), 1);
        let det = &resp.detections[0];
        assert_eq!(det.class_name(), "cat");
        assert!((det.confidence() - 0.92).abs() < 1e-12);
        assert_eq!(det.class_id(), Some(15));
        assert!((det.bbox().x_max() - 200.0).abs() < f64::EPSILON);
        assert_eq!(resp.reported_dimensions, Some(Dimensions::new(640, 480)));
    }

    #[test]
    fn minimal_detection_fields_suffice() {
        let body = r#"{"detections":[{"class_name":"dog","confidence":0.5,
            "bbox":{"x_min":0.5,"y_min":1.5,"x_max":2.5,"y_max":3.5}}]}"#;
        let resp = parse_body(body).unwrap();
        assert_eq!(resp.detections[0].class_id(), None);
        assert_eq!(resp.reported_dimensions, None);
    }

    #[test]
    fn preserves_order() {
        let body = r#"{"detections":[
            {"class_name":"a","confidence":0.1,"bbox":{"x_min":0,"y_min":0,"x_max":1,"y_max":1}},
            {"class_name":"b","confidence":0.9,"bbox":{"x_min":0,"y_min":0,"x_max":1,"y_max":1}},
            {"class_name":"c","confidence":0.5,"bbox":{"x_min":0,"y_min":0,"x_max":1,"y_max":1}}]}"#;
        let names: Vec<_> = parse_body(body)
            .unwrap()
            .detections
            .iter()
            .map(|d| d.class_name().to_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn empty_list_is_success() {
        let resp = parse_response(200, r#"{"detections":[]}"#).unwrap();
        assert!(resp.detections.is_empty());
    }

    #[test]
    fn server_error_keeps_backend_detail() {
        let err = parse_response(500, r#"{"error":"model exploded"}"#).unwrap_err();
        assert_eq!(
            err,
            DetectError::Status {
                status: 500,
                detail: "model exploded".into()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn non_json_error_body_is_kept_raw() {
        let err = parse_response(502, "  Bad Gateway\n").unwrap_err();
        assert!(matches!(err, DetectError::Status { status: 502, ref detail } if detail == "Bad Gateway"));
    }

    #[test]
    fn success_status_with_bad_body_is_parse_error() {
        for body in ["", "not json", "{}", r#"{"detections":{}}"#, r#"{"detections":[{}]}"#] {
            let err = parse_response(200, body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse, "body {body:?}");
        }
    }

    #[test]
    fn inverted_box_is_parse_error() {
        let body = r#"{"detections":[{"class_name":"a","confidence":0.1,
            "bbox":{"x_min":5,"y_min":0,"x_max":1,"y_max":1}}]}"#;
        assert!(matches!(parse_body(body), Err(DetectError::Parse(_))));
    }

    #[test]
    fn out_of_range_confidence_is_parse_error() {
        let body = r#"{"detections":[{"class_name":"a","confidence":92,
            "bbox":{"x_min":0,"y_min":0,"x_max":1,"y_max":1}}]}"#;
        assert!(matches!(parse_body(body), Err(DetectError::Parse(_))));
    }

    #[test]
    fn disagreeing_original_sizes_are_rejected() {
        let body = r#"{"detections":[
            {"class_name":"a","confidence":0.1,"bbox":{"x_min":0,"y_min":0,"x_max":1,"y_max":1},
             "original_width":640,"original_height":480},
            {"class_name":"b","confidence":0.1,"bbox":{"x_min":0,"y_min":0,"x_max":1,"y_max":1},
             "original_width":320,"original_height":240}]}"#;
        assert!(matches!(parse_body(body), Err(DetectError::Parse(_))));
    }

    #[test]
    fn coordinate_contract() {
        let actual = Dimensions::new(640, 480);
        assert!(coordinate_space_matches(None, actual));
        assert!(coordinate_space_matches(Some(actual), actual));
        assert!(!coordinate_space_matches(
            Some(Dimensions::new(320, 240)),
            actual
        ));
        // Logging only; never fails.
        warn_on_coordinate_mismatch(Some(Dimensions::new(320, 240)), actual);
        warn_on_coordinate_mismatch(None, actual);
    }
}
