//! Blocking HTTP client for the detection endpoint.

use std::time::Duration;

use boxsight_core::multipart::{boundary_for, encode_image_form};
use boxsight_core::{DetectError, DetectionResponse, ImageSource, parse_response};

/// Build an agent whose requests give up after `timeout`.
#[must_use]
pub fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// `POST` `image` to `endpoint` as `multipart/form-data` and parse the
/// answer.
///
/// Error statuses are not transport failures here: their body is read
/// so the backend's `error` detail reaches the log.
pub fn detect(
    agent: &ureq::Agent,
    endpoint: &str,
    image: &ImageSource,
) -> Result<DetectionResponse, DetectError> {
    let form = encode_image_form(image, &boundary_for(image.bytes()));
    log::debug!(
        "POST {endpoint} ({} byte body, {})",
        form.body.len(),
        image.mime_type()
    );

    let response = match agent
        .post(endpoint)
        .set("Content-Type", &form.content_type)
        .send_bytes(&form.body)
    {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(t)) => return Err(DetectError::Transport(t.to_string())),
    };

    let status = response.status();
    let body = response
        .into_string()
        .map_err(|e| DetectError::Transport(format!("reading response body: {e}")))?;
    log::debug!("{endpoint} answered {status} ({} bytes)", body.len());
    parse_response(status, &body)
}
