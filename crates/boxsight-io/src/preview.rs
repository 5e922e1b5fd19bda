//! Object URLs for selected images, and loading them back as decoded
//! `<img>` elements.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{BlobPropertyBag, HtmlImageElement};

/// Errors from creating or loading an image preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// The browser could not decode the image.
    #[error("image failed to load: {0}")]
    Load(String),
}

impl From<JsValue> for PreviewError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Create an object URL for encoded image bytes, for use as an
/// `<img src>` or canvas source.
///
/// The returned URL must be revoked via [`revoke_blob_url`] when the
/// image is replaced.
///
/// # Errors
///
/// Returns [`PreviewError::JsError`] if Blob or URL creation fails.
pub fn bytes_to_blob_url(bytes: &[u8], mime_type: &str) -> Result<String, PreviewError> {
    let uint8_array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&uint8_array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;

    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Revoke an object URL created by [`bytes_to_blob_url`].
///
/// Best-effort: failures are ignored since the URL may already have
/// been revoked.
pub fn revoke_blob_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

/// Load `url` into a fresh `<img>` and wait until it has decoded, so its
/// natural size is known.
///
/// # Errors
///
/// Returns [`PreviewError::Load`] if the browser fires `error` instead
/// of `load`.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn load_image(url: &str) -> Result<HtmlImageElement, PreviewError> {
    let img = HtmlImageElement::new()?;
    let (promise, resolve, reject) = new_promise();

    let onload = Closure::<dyn FnMut()>::new(move || {
        resolve.call0(&JsValue::NULL).ok();
    });
    let src = url.to_owned();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&src));
    });
    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    img.set_src(url);

    let outcome = JsFuture::from(promise).await;

    img.set_onload(None);
    img.set_onerror(None);
    drop(onload);
    drop(onerror);

    match outcome {
        Ok(_) => Ok(img),
        Err(e) => Err(PreviewError::Load(
            e.as_string().unwrap_or_else(|| "unknown source".into()),
        )),
    }
}

/// Create a JS Promise along with its resolve and reject functions.
fn new_promise() -> (js_sys::Promise, js_sys::Function, js_sys::Function) {
    let slots = Rc::new(RefCell::new(None::<(js_sys::Function, js_sys::Function)>));
    let slots_clone = Rc::clone(&slots);

    let promise = js_sys::Promise::new(&mut move |res, rej| {
        *slots_clone.borrow_mut() = Some((res, rej));
    });

    // The executor runs synchronously inside `Promise::new`.
    let (resolve, reject) = slots
        .borrow_mut()
        .take()
        .expect_throw("promise executor did not run");
    (promise, resolve, reject)
}
