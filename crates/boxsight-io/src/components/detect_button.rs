use dioxus::prelude::*;

/// Button label while idle.
pub const DETECT_LABEL: &str = "Detect Objects";
/// Button label while a request is in flight.
pub const DETECTING_LABEL: &str = "Detecting...";

/// The detection trigger. Disabled while `loading`.
#[component]
pub fn DetectButton(loading: bool, on_detect: EventHandler<()>) -> Element {
    rsx! {
        button {
            class: "button detect",
            disabled: loading,
            onclick: move |_| on_detect.call(()),
            if loading { "{DETECTING_LABEL}" } else { "{DETECT_LABEL}" }
        }
    }
}
