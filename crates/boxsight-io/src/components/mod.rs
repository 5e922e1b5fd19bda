//! Dioxus UI components for boxsight.
//!
//! Provides the upload zone, the detect button, the detection list and
//! the annotated-image download button.

mod detect_button;
mod detection_list;
mod download_button;
mod upload;

pub use detect_button::DetectButton;
pub use detection_list::DetectionList;
pub use download_button::DownloadButton;
pub use upload::{FileUpload, SelectedFile};
