//! Textual list of the current detections.

use boxsight_core::{Detection, list_entry};
use dioxus::prelude::*;

/// One `<li>` per detection, in backend order. Renders nothing when the
/// list is empty.
#[component]
pub fn DetectionList(detections: Vec<Detection>) -> Element {
    if detections.is_empty() {
        return rsx! {};
    }
    rsx! {
        div { class: "detections",
            h3 { "Detections" }
            ul {
                for (i, entry) in detections.iter().map(list_entry).enumerate() {
                    li { key: "{i}", "{entry}" }
                }
            }
        }
    }
}
