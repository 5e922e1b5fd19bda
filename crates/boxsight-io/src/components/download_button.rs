//! Download button for the annotated canvas.

use dioxus::prelude::*;

use crate::download;

/// Downloads the canvas `canvas_id` as `<source stem>-annotated.png`.
#[component]
pub fn DownloadButton(canvas_id: String, source_name: String) -> Element {
    let mut error = use_signal(|| Option::<String>::None);

    let on_click = move |_| {
        let filename = download::annotated_filename(&source_name);
        match download::download_canvas_png(&canvas_id, &filename) {
            Ok(()) => error.set(None),
            Err(e) => {
                log::warn!("download of {filename} failed: {e}");
                error.set(Some(format!("Download failed: {e}")));
            }
        }
    };

    rsx! {
        div { class: "download",
            button { class: "button", onclick: on_click, "Download annotated image" }
            if let Some(ref err) = error() {
                p { class: "error", "{err}" }
            }
        }
    }
}
