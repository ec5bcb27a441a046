use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Single-shot position source.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current position. Errors cover permission denial and unavailable
    /// hardware.
    async fn current_position(&self) -> anyhow::Result<GeoPoint>;
}

/// Fetch a position, giving up after `timeout`.
///
/// Returns `None` on denial, failure or timeout; callers degrade to their
/// no-location path.
pub async fn locate_within(geo: &dyn Geolocator, timeout: Duration) -> Option<GeoPoint> {
    match tokio::time::timeout(timeout, geo.current_position()).await {
        Ok(Ok(point)) => Some(point),
        Ok(Err(e)) => {
            tracing::info!(error = %e, "Geolocation unavailable");
            None
        }
        Err(_) => {
            tracing::info!(
                timeout_ms = timeout.as_millis() as u64,
                "Geolocation timed out"
            );
            None
        }
    }
}

/// Geolocator that reports a configured position, or fails when none is
/// configured.
pub struct FixedGeolocator {
    point: Option<GeoPoint>,
}

impl FixedGeolocator {
    pub fn new(point: Option<GeoPoint>) -> Self {
        Self { point }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> anyhow::Result<GeoPoint> {
        self.point
            .ok_or_else(|| anyhow::anyhow!("Location permission denied or no position configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverResolves;

    #[async_trait]
    impl Geolocator for NeverResolves {
        async fn current_position(&self) -> anyhow::Result<GeoPoint> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn fixed_position_is_returned() {
        let point = GeoPoint {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let geo = FixedGeolocator::new(Some(point));
        assert_eq!(locate_within(&geo, Duration::from_secs(1)).await, Some(point));
    }

    #[tokio::test]
    async fn missing_position_degrades_to_none() {
        let geo = FixedGeolocator::new(None);
        assert!(locate_within(&geo, Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_geolocator_times_out() {
        let result = locate_within(&NeverResolves, Duration::from_secs(10)).await;
        assert!(result.is_none());
    }
}
