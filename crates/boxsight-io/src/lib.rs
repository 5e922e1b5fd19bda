//! boxsight-io: Browser I/O and Dioxus component library.
//!
//! Sends detection requests with `fetch`, turns uploads into object
//! URLs, loads them as images, draws annotations on an HTML canvas and
//! downloads the result. Also provides the reusable UI components of the
//! boxsight web application.

pub mod canvas;
pub mod components;
pub mod download;
pub mod fetch;
pub mod preview;
pub mod render;

pub use canvas::{CanvasError, CanvasSurface, LoadedImage};
pub use components::{DetectButton, DetectionList, DownloadButton, FileUpload, SelectedFile};
pub use fetch::{FetchError, detect};
pub use preview::{PreviewError, bytes_to_blob_url, load_image, revoke_blob_url};
pub use render::{RenderError, render_to_canvas};
