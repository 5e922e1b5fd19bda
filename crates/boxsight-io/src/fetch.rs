//! Detection requests via the browser `fetch` API.

use boxsight_core::multipart::IMAGE_FIELD;
use boxsight_core::{DetectError, DetectionResponse, ImageSource, parse_response};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{BlobPropertyBag, FormData, Request, RequestInit, Response};

/// Errors from the browser side of a request, before any response
/// status is known.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// The response body was not text.
    #[error("response body is not text")]
    NotText,
}

impl From<JsValue> for FetchError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

impl From<FetchError> for DetectError {
    fn from(err: FetchError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// `POST` `image` to `endpoint` as `multipart/form-data` and parse the
/// answer.
///
/// # Errors
///
/// Returns [`DetectError::Transport`] if the request could not be made
/// or the backend answered with a non-success status, and
/// [`DetectError::Parse`] if the body is not a detection list.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn detect(
    endpoint: &str,
    image: &ImageSource,
) -> Result<DetectionResponse, DetectError> {
    let (status, body) = post_image(endpoint, image).await?;
    log::debug!("POST {endpoint} -> {status} ({} bytes)", body.len());
    parse_response(status, &body)
}

#[allow(clippy::future_not_send)]
async fn post_image(endpoint: &str, image: &ImageSource) -> Result<(u16, String), FetchError> {
    let window = web_sys::window().ok_or_else(|| FetchError::JsError("no global window".into()))?;

    // 1. Wrap the image bytes in a Blob carrying the file's MIME type.
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(image.bytes()));
    let opts = BlobPropertyBag::new();
    opts.set_type(image.mime_type());
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;

    // 2. Single-part form; the browser picks the boundary.
    let form = FormData::new()?;
    form.append_with_blob_and_filename(IMAGE_FIELD, &blob, image.name())?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&form);
    let request = Request::new_with_str_and_init(endpoint, &init)?;

    // 3. Await the response, then its body.
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    let status = response.status();
    let text = JsFuture::from(response.text()?).await?;
    let body = text.as_string().ok_or(FetchError::NotText)?;
    Ok((status, body))
}
