//! AI gateway: the single façade between feature views and the hosted
//! generative model.
//!
//! Every operation is one round trip. There is no retry, caching or rate
//! limiting here; callers own loading state and fallbacks.

pub mod error;
pub mod gemini;
pub mod prompts;
pub mod types;
pub mod wire;

use async_trait::async_trait;

use crate::device::GeoPoint;

#[allow(unused_imports)]
pub use error::GatewayError;
#[allow(unused_imports)]
pub use gemini::GeminiGateway;
#[allow(unused_imports)]
pub use types::{
    ActivitySuggestion, GroundingSource, Message, Role, SafetyAlert, SafetyBundle, Severity,
    TravelAdvice,
};

/// Feature-level operations against the AI backend.
#[async_trait]
pub trait TravelGateway: Send + Sync {
    /// Answer a free-text question, optionally grounded at `location`.
    ///
    /// `history` is replayed as prior turns before `prompt`.
    async fn generate_travel_advice(
        &self,
        prompt: &str,
        location: Option<GeoPoint>,
        history: &[Message],
    ) -> Result<TravelAdvice, GatewayError>;

    /// Identify a landmark, object or sign in a JPEG still.
    async fn identify_image(&self, jpeg: &[u8]) -> Result<String, GatewayError>;

    /// Markdown itinerary. May be empty if the model returned nothing.
    async fn create_itinerary(
        &self,
        destination: &str,
        days: u32,
        preferences: &str,
    ) -> Result<String, GatewayError>;

    async fn get_quick_suggestions(
        &self,
        destination: &str,
    ) -> Result<Vec<ActivitySuggestion>, GatewayError>;

    async fn get_safety_alerts(&self, lat: f64, lng: f64) -> Result<SafetyBundle, GatewayError>;
}
