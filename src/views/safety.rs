//! Safety center: region status, alerts and etiquette for where you are.

use std::time::Duration;

use super::RequestStatus;
use crate::device::{locate_within, Geolocator};
use crate::gateway::{SafetyAlert, TravelGateway};

pub const DETECTING_LOCATION: &str = "Detecting location...";
pub const CHECKING_STATUS: &str = "Checking...";
pub const UNKNOWN_STATUS: &str = "Unknown";

pub struct SafetyView {
    location_name: String,
    region_status: String,
    alerts: Vec<SafetyAlert>,
    etiquette: Vec<String>,
    status: RequestStatus<()>,
    location_timeout: Duration,
}

impl SafetyView {
    pub fn new(location_timeout: Duration) -> Self {
        Self {
            location_name: DETECTING_LOCATION.to_string(),
            region_status: CHECKING_STATUS.to_string(),
            alerts: Vec::new(),
            etiquette: Vec::new(),
            status: RequestStatus::Idle,
            location_timeout,
        }
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    pub fn region_status(&self) -> &str {
        &self.region_status
    }

    pub fn alerts(&self) -> &[SafetyAlert] {
        &self.alerts
    }

    pub fn etiquette(&self) -> &[String] {
        &self.etiquette
    }

    pub fn status(&self) -> &RequestStatus<()> {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Locate the traveller and fetch the briefing for that spot.
    ///
    /// Without a position there is nothing to ask about, so the status
    /// becomes "Unknown" and no request is made.
    pub async fn load(&mut self, geolocator: &dyn Geolocator, gateway: &dyn TravelGateway) {
        self.status = RequestStatus::Loading;

        self.status = match locate_within(geolocator, self.location_timeout).await {
            None => RequestStatus::Failed(UNKNOWN_STATUS.to_string()),
            Some(point) => match gateway
                .get_safety_alerts(point.latitude, point.longitude)
                .await
            {
                Ok(bundle) => {
                    tracing::info!(
                        location = %bundle.location_name,
                        status = %bundle.region_status,
                        alerts = bundle.alerts.len(),
                        "Loaded safety briefing"
                    );
                    self.location_name = bundle.location_name;
                    self.region_status = bundle.region_status;
                    self.alerts = bundle.alerts;
                    self.etiquette = bundle.etiquette;
                    RequestStatus::Ready(())
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        transient = e.is_transient(),
                        "Safety briefing failed"
                    );
                    RequestStatus::Failed(UNKNOWN_STATUS.to_string())
                }
            },
        };

        if let Some(status) = self.status.failure() {
            self.region_status = status.to_string();
        }
    }
}
