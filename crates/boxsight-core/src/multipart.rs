//! `multipart/form-data` request body for the detection endpoint.
//!
//! The backend expects a single file part named `image`. Browsers build
//! this from a `FormData`; native clients use [`encode_image_form`].

use crate::types::ImageSource;

/// Form field name the backend reads the upload from.
pub const IMAGE_FIELD: &str = "image";

/// An encoded request body and the `Content-Type` header that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Encode `image` as the only part of a `multipart/form-data` body.
///
/// `boundary` must not occur in the image bytes. Callers pass something
/// unlikely; [`boundary_for`] derives one from the payload.
#[must_use]
pub fn encode_image_form(image: &ImageSource, boundary: &str) -> MultipartBody {
    let filename = image.name().replace(['"', '\r', '\n'], "_");
    let mut body = Vec::with_capacity(image.bytes().len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{IMAGE_FIELD}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", image.mime_type()).as_bytes());
    body.extend_from_slice(image.bytes());
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        body,
    }
}

/// A boundary string that does not occur in `bytes`.
#[must_use]
pub fn boundary_for(bytes: &[u8]) -> String {
    let mut counter: u32 = 0;
    loop {
        let candidate = format!("----boxsight-boundary-{counter:08x}");
        if !contains(bytes, candidate.as_bytes()) {
            return candidate;
        }
        counter += 1;
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(body: &MultipartBody) -> String {
        String::from_utf8_lossy(&body.body).into_owned()
    }

    #[test]
    fn single_image_part() {
        let image = ImageSource::new("cat.png", b"PNGDATA".to_vec(), "cat.png");
        let form = encode_image_form(&image, "XYZ");
        assert_eq!(form.content_type, "multipart/form-data; boundary=XYZ");
        assert_eq!(
            as_text(&form),
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"cat.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n--XYZ--\r\n"
        );
    }

    #[test]
    fn filename_quotes_are_neutralized() {
        let image = ImageSource::new("a\"b.jpg", vec![1_u8, 2, 3], "");
        let text = as_text(&encode_image_form(&image, "B"));
        assert!(text.contains("filename=\"a_b.jpg\""));
        assert!(text.contains("Content-Type: image/jpeg"));
    }

    #[test]
    fn boundary_avoids_payload() {
        let first = boundary_for(b"plain bytes");
        assert_eq!(first, "----boxsight-boundary-00000000");
        let tricky = format!("xx{first}yy");
        let second = boundary_for(tricky.as_bytes());
        assert_ne!(second, first);
        assert!(!tricky.contains(&second));
    }
}
