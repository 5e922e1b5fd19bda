use boxsight_core::{
    DEFAULT_ENDPOINT, ImageSource, RenderStyle, Resolution, Session, SessionConfig, SurfaceUpdate,
    Trigger,
};
use boxsight_io::{
    CanvasSurface, DetectButton, DetectionList, DownloadButton, FileUpload, SelectedFile,
    bytes_to_blob_url, revoke_blob_url,
};
use dioxus::prelude::*;

/// Detection endpoint, fixed at build time with `BOXSIGHT_ENDPOINT`.
const ENDPOINT: &str = match option_env!("BOXSIGHT_ENDPOINT") {
    Some(endpoint) => endpoint,
    None => DEFAULT_ENDPOINT,
};

const CANVAS_ID: &str = "annotation-canvas";

fn main() {
    // Only fails if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Debug);
    log::info!("detection endpoint: {ENDPOINT}");
    dioxus::launch(app);
}

/// Carry out a [`SurfaceUpdate`] on the page canvas.
///
/// Every `Clear` or `Draw` bumps `epoch`. A draw waits for the image to
/// load and is dropped if the epoch moved on in the meantime, so an
/// older overlay never lands on a newer state.
fn apply_surface(update: SurfaceUpdate, session: Signal<Session>, mut epoch: Signal<u64>) {
    match update {
        SurfaceUpdate::Keep => {}
        SurfaceUpdate::Clear => {
            epoch += 1;
            // The canvas only exists once an image is selected.
            if let Ok(surface) = CanvasSurface::by_id(CANVAS_ID) {
                surface.clear();
            }
        }
        SurfaceUpdate::Draw => {
            epoch += 1;
            let my_epoch = *epoch.peek();
            let (preview, detections, reported) = {
                let state = session.peek();
                let Some(image) = state.image() else {
                    return;
                };
                (
                    image.preview().to_owned(),
                    state.detections().to_vec(),
                    state.reported_dimensions(),
                )
            };

            spawn(async move {
                let outcome = boxsight_io::render_to_canvas(
                    CANVAS_ID,
                    &preview,
                    &detections,
                    reported,
                    &RenderStyle::default(),
                    || *epoch.peek() == my_epoch,
                )
                .await;
                if let Err(e) = outcome {
                    log::warn!("rendering annotations failed: {e}");
                }
            });
        }
    }
}

/// Root application component.
///
/// Holds the [`Session`] in a signal and wires the upload, detect and
/// download components to it. Every session transition is followed by
/// an explicit [`apply_surface`] call.
fn app() -> Element {
    let mut session = use_signal(|| Session::new(SessionConfig::default()));
    let epoch = use_signal(|| 0u64);

    // --- File upload handler ---
    let on_upload = move |file: SelectedFile| {
        let preview = bytes_to_blob_url(&file.bytes, &file.mime_type).unwrap_or_else(|e| {
            log::warn!("could not create preview for {}: {e}", file.name);
            String::new()
        });
        let image = ImageSource::new(file.name, file.bytes, preview).with_mime_type(file.mime_type);
        let (update, replaced) = session.write().select_file(image);
        if let Some(old) = replaced {
            revoke_blob_url(old.preview());
        }
        apply_surface(update, session, epoch);
    };

    // --- Detect handler ---
    let on_detect = move |()| {
        let trigger = session.write().trigger_detect();
        let Trigger::Issued { request, surface } = trigger else {
            return;
        };
        apply_surface(surface, session, epoch);

        spawn(async move {
            let outcome = boxsight_io::detect(ENDPOINT, request.image()).await;
            let resolution = session.write().resolve(request.generation(), outcome);
            if let Resolution::Applied(update) = resolution {
                apply_surface(update, session, epoch);
            }
        });
    };

    let state = session.read();
    let loading = state.is_loading();
    let error = state.error_message().map(str::to_owned);
    let detections = state.detections().to_vec();
    let source_name = state.image().map(|image| image.name().to_owned());
    let download_name = source_name.clone().filter(|_| !detections.is_empty());
    drop(state);

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/style.css") }

        div { class: "app",
            header {
                h1 { "boxsight" }
                p { class: "hint", "Object detection with labeled bounding boxes" }
            }

            FileUpload { on_upload: on_upload }

            DetectButton { loading: loading, on_detect: on_detect }

            if let Some(ref err) = error {
                p { class: "error", "{err}" }
            }

            if source_name.is_some() {
                div { class: "canvas-container",
                    canvas { id: CANVAS_ID, class: "annotation-canvas" }
                }
            }

            DetectionList { detections: detections }

            if let Some(name) = download_name {
                DownloadButton { canvas_id: CANVAS_ID.to_owned(), source_name: name }
            }
        }
    }
}
