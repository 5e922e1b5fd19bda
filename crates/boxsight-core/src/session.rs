//! Detection session state machine.
//!
//! [`Session`] owns the selected image and the state of the current
//! detection cycle. It never performs I/O: [`Session::trigger_detect`]
//! hands back a [`DetectRequest`] for the caller to send, and the caller
//! feeds the outcome back through [`Session::resolve`].
//!
//! Every transition reports a [`SurfaceUpdate`] telling the caller
//! whether the drawing surface must be redrawn or cleared, so rendering
//! is an explicit step after each state change.
//!
//! # Overlapping requests
//!
//! Triggering again while a request is in flight is allowed and issues a
//! new request. Each request carries a generation number; which
//! resolutions are applied is governed by [`StalePolicy`]. Selecting a
//! new file also advances the generation, so a response computed for a
//! previous image is never shown over a new one.

use crate::response::DetectionResponse;
use crate::types::{DetectError, Detection, Dimensions, ImageSource};

/// Which detection responses are applied when requests overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Only the most recently issued request may update the state.
    /// Earlier responses are discarded whenever they arrive.
    #[default]
    LatestIssued,

    /// Every response is applied in the order it resolves, so the last
    /// one to arrive wins. Responses issued before the most recent file
    /// selection are still discarded.
    LastResolved,
}

/// Configuration for a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// How overlapping requests are reconciled.
    pub stale_policy: StalePolicy,
}

/// State of the current detection cycle. Exactly one is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetectionCycleState {
    /// Nothing requested since the last file selection.
    #[default]
    Idle,
    /// A request is in flight.
    AwaitingResult,
    /// The backend answered with this ordered detection list.
    Succeeded(Vec<Detection>),
    /// The cycle ended with this user-facing message.
    Failed(String),
}

/// What the caller must do with the drawing surface after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceUpdate {
    /// Nothing visible changed.
    Keep,
    /// Detections were cleared or the image replaced: clear the surface
    /// (or simply don't draw if it is not shown yet).
    Clear,
    /// A non-empty detection list arrived: render image and annotations.
    Draw,
}

/// A detection request to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectRequest {
    generation: u64,
    image: ImageSource,
}

impl DetectRequest {
    /// Generation to pass back to [`Session::resolve`].
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The image to upload.
    #[must_use]
    pub const fn image(&self) -> &ImageSource {
        &self.image
    }
}

/// Result of [`Session::trigger_detect`].
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A request was issued; send it and resolve it later.
    Issued {
        /// The request to send.
        request: DetectRequest,
        /// Surface action for entering `AwaitingResult`.
        surface: SurfaceUpdate,
    },
    /// Validation failed locally; no request was issued and the state is
    /// now `Failed`.
    Rejected(DetectError),
}

/// Result of [`Session::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The response updated the state.
    Applied(SurfaceUpdate),
    /// The response belonged to a superseded request and was dropped.
    Stale,
}

/// Owned session state: the selected image and the detection cycle.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: SessionConfig,
    image: Option<ImageSource>,
    cycle: DetectionCycleState,
    reported_dimensions: Option<Dimensions>,
    /// Last generation handed out, by either selection or request.
    generation: u64,
    /// Generation of the most recent file selection.
    selected_at: u64,
    /// Generation of the request still allowed to resolve under
    /// [`StalePolicy::LatestIssued`].
    awaited: Option<u64>,
}

impl Session {
    /// Create an empty session: `Idle`, no image, no detections.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the selected image.
    ///
    /// Valid in any state. Clears detections and any error, resets the
    /// cycle to `Idle` and invalidates all in-flight requests. Returns the
    /// surface action (always [`SurfaceUpdate::Clear`]) and the replaced
    /// image so the caller can release its preview reference.
    pub fn select_file(&mut self, image: ImageSource) -> (SurfaceUpdate, Option<ImageSource>) {
        log::debug!("selected {} ({} bytes)", image.name(), image.bytes().len());
        self.generation += 1;
        self.selected_at = self.generation;
        self.awaited = None;
        self.cycle = DetectionCycleState::Idle;
        self.reported_dimensions = None;
        let replaced = self.image.replace(image);
        (SurfaceUpdate::Clear, replaced)
    }

    /// Start a detection cycle.
    ///
    /// With no image selected the session moves to `Failed` with
    /// [`NO_IMAGE_MESSAGE`](crate::types::NO_IMAGE_MESSAGE) and nothing is
    /// sent. Otherwise it moves to `AwaitingResult` and returns the
    /// request to send.
    pub fn trigger_detect(&mut self) -> Trigger {
        let Some(image) = self.image.clone() else {
            let err = DetectError::NoImage;
            log::debug!("detect rejected: {err}");
            self.cycle = DetectionCycleState::Failed(err.user_message().to_owned());
            return Trigger::Rejected(err);
        };

        let had_detections = !self.detections().is_empty();
        self.generation += 1;
        self.awaited = Some(self.generation);
        self.cycle = DetectionCycleState::AwaitingResult;
        self.reported_dimensions = None;
        log::debug!("detect request {} issued for {}", self.generation, image.name());

        Trigger::Issued {
            request: DetectRequest {
                generation: self.generation,
                image,
            },
            surface: if had_detections {
                SurfaceUpdate::Clear
            } else {
                SurfaceUpdate::Keep
            },
        }
    }

    /// Apply the outcome of the request with the given generation.
    ///
    /// Responses that the [`StalePolicy`] rules out are dropped and leave
    /// the state untouched.
    pub fn resolve(
        &mut self,
        generation: u64,
        outcome: Result<DetectionResponse, DetectError>,
    ) -> Resolution {
        if !self.accepts(generation) {
            log::debug!("dropping stale response for request {generation}");
            return Resolution::Stale;
        }
        if self.awaited == Some(generation) {
            self.awaited = None;
        }

        let had_detections = !self.detections().is_empty();
        match outcome {
            Ok(response) => {
                log::debug!(
                    "request {generation} returned {} detections",
                    response.detections.len()
                );
                self.reported_dimensions = response.reported_dimensions;
                self.cycle = DetectionCycleState::Succeeded(response.detections);
            }
            Err(err) => {
                log::warn!("request {generation} failed: {err}");
                self.reported_dimensions = None;
                self.cycle = DetectionCycleState::Failed(err.user_message().to_owned());
            }
        }

        let surface = if !self.detections().is_empty() {
            SurfaceUpdate::Draw
        } else if had_detections {
            SurfaceUpdate::Clear
        } else {
            SurfaceUpdate::Keep
        };
        Resolution::Applied(surface)
    }

    fn accepts(&self, generation: u64) -> bool {
        match self.config.stale_policy {
            StalePolicy::LatestIssued => self.awaited == Some(generation),
            StalePolicy::LastResolved => {
                generation > self.selected_at && generation <= self.generation
            }
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &DetectionCycleState {
        &self.cycle
    }

    /// The selected image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    /// Current detections; empty unless the cycle `Succeeded`.
    #[must_use]
    pub fn detections(&self) -> &[Detection] {
        match &self.cycle {
            DetectionCycleState::Succeeded(d) => d,
            _ => &[],
        }
    }

    /// User-facing error message, if the cycle `Failed`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.cycle {
            DetectionCycleState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.cycle, DetectionCycleState::AwaitingResult)
    }

    /// Image size the backend reported for the current detections.
    #[must_use]
    pub const fn reported_dimensions(&self) -> Option<Dimensions> {
        self.reported_dimensions
    }
}
