//! Visual lens: point the camera at something and ask what it is.

use super::RequestStatus;
use crate::device::Camera;
use crate::gateway::TravelGateway;

pub const IDENTIFY_FALLBACK: &str =
    "Sorry, I couldn't identify this. Try another angle or better lighting.";
pub const CAMERA_UNAVAILABLE: &str = "Camera unavailable. Check camera permissions and try again.";

#[derive(Default)]
pub struct LensView {
    result: RequestStatus<String>,
}

impl LensView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> &RequestStatus<String> {
        &self.result
    }

    /// Dismiss the current result.
    pub fn clear(&mut self) {
        self.result = RequestStatus::Idle;
    }

    /// Capture a still and identify it. Ignored while an analysis is in
    /// flight.
    pub async fn capture_and_analyze(&mut self, camera: &dyn Camera, gateway: &dyn TravelGateway) {
        if self.result.is_loading() {
            return;
        }
        self.result = RequestStatus::Loading;

        let still = match camera.capture_still().await {
            Ok(still) => still,
            Err(e) => {
                tracing::warn!(error = %e, "Camera capture failed");
                self.result = RequestStatus::Failed(CAMERA_UNAVAILABLE.to_string());
                return;
            }
        };

        self.result = match gateway.identify_image(&still).await {
            Ok(description) => RequestStatus::Ready(description),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    transient = e.is_transient(),
                    bytes = still.len(),
                    "Identification failed"
                );
                RequestStatus::Failed(IDENTIFY_FALLBACK.to_string())
            }
        };
    }
}
