//! File upload component with drag-and-drop and file picker.

use boxsight_core::types::mime_type_for;
use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

/// A file read from the picker or a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Type reported by the browser, or guessed from the extension when
    /// it reports none.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Whether a file with this browser-reported type may be selected.
///
/// Files without a reported type (no or unknown extension) are let
/// through; the browser decides when it loads them.
fn is_image_upload(content_type: Option<&str>) -> bool {
    content_type.is_none_or(|t| t.is_empty() || t.starts_with("image/"))
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called with the file after a successful read.
    on_upload: EventHandler<SelectedFile>,
}

/// A drag-and-drop zone with a file picker button.
///
/// Accepts anything the browser considers an image. When a file is
/// selected (via the picker or drag-and-drop), reads the bytes and fires
/// `on_upload`.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut filename = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    // Shared by the picker and drop paths.
    let process_files = move |files: Vec<FileData>| async move {
        if let Some(file) = files.first() {
            let name = file.name();
            let content_type = file.content_type();
            if !is_image_upload(content_type.as_deref()) {
                error.set(Some(format!("Not an image: {name}")));
                return;
            }
            let mime_type = content_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| mime_type_for(&name).to_owned());
            match file.read_bytes().await {
                Ok(bytes) => {
                    filename.set(Some(name.clone()));
                    error.set(None);
                    props.on_upload.call(SelectedFile {
                        name,
                        mime_type,
                        bytes: bytes.to_vec(),
                    });
                }
                Err(e) => {
                    log::warn!("reading {name} failed: {e}");
                    error.set(Some(format!("Failed to read file: {e}")));
                }
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let zone_class = if dragging() {
        "upload-zone dragging"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref name) = filename() {
                p { class: "upload-name", "Loaded: {name}" }
            }

            if let Some(ref err) = error() {
                p { class: "error", "{err}" }
            }

            p { class: "hint", "Drop an image here or " }

            label { class: "button",
                input {
                    r#type: "file",
                    accept: "image/*",
                    class: "hidden",
                    onchange: handle_files,
                }
                "Choose File"
            }
        }
    }
}
