//! Smart planner: destination, trip length and vibe in, Markdown plan out.

use super::RequestStatus;
use crate::gateway::{ActivitySuggestion, TravelGateway};

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 14;
pub const DEFAULT_DAYS: u32 = 3;

/// Vibe presets: button label and the preference text sent to the model.
pub const PREFERENCE_PRESETS: [(&str, &str); 4] = [
    ("Relaxed", "Relaxed, food-focused"),
    ("Sightseeing", "Action-packed, sightseeing"),
    ("Budget", "Budget-friendly, local vibes"),
    ("Luxury", "Luxury, exclusive experiences"),
];

pub const EMPTY_ITINERARY_FALLBACK: &str = "Failed to generate itinerary.";
pub const ITINERARY_ERROR_FALLBACK: &str = "Sorry, I couldn't build that itinerary right now.";

pub struct ItineraryView {
    destination: String,
    days: u32,
    preferences: String,
    itinerary: RequestStatus<String>,
    suggestions: Vec<ActivitySuggestion>,
    suggestion_status: RequestStatus<()>,
}

impl ItineraryView {
    /// Planner seeded with the scene's current destination.
    pub fn new(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            days: DEFAULT_DAYS,
            preferences: PREFERENCE_PRESETS[0].1.to_string(),
            itinerary: RequestStatus::Idle,
            suggestions: Vec::new(),
            suggestion_status: RequestStatus::Idle,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Edit the destination field. Nothing is fetched until
    /// [`Self::commit_destination`] or [`Self::generate`].
    pub fn set_destination(&mut self, destination: &str) {
        self.destination = destination.to_string();
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn increment_days(&mut self) {
        self.days = (self.days + 1).min(MAX_DAYS);
    }

    pub fn decrement_days(&mut self) {
        self.days = self.days.saturating_sub(1).max(MIN_DAYS);
    }

    /// Set the trip length directly, clamped to the supported range.
    pub fn set_days(&mut self, days: u32) {
        self.days = days.clamp(MIN_DAYS, MAX_DAYS);
    }

    pub fn preferences(&self) -> &str {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: &str) {
        self.preferences = preferences.to_string();
    }

    pub fn itinerary(&self) -> &RequestStatus<String> {
        &self.itinerary
    }

    pub fn suggestions(&self) -> &[ActivitySuggestion] {
        &self.suggestions
    }

    pub fn suggestion_status(&self) -> &RequestStatus<()> {
        &self.suggestion_status
    }

    /// Build an itinerary for the current fields.
    ///
    /// Returns the destination the scene should move to, or `None` when the
    /// destination is empty and nothing was requested.
    pub async fn generate(&mut self, gateway: &dyn TravelGateway) -> Option<String> {
        let destination = self.destination.trim().to_string();
        if destination.is_empty() {
            return None;
        }

        self.itinerary = RequestStatus::Loading;
        tracing::info!(destination = %destination, days = self.days, "Generating itinerary");

        self.itinerary = match gateway
            .create_itinerary(&destination, self.days, &self.preferences)
            .await
        {
            Ok(plan) if plan.trim().is_empty() => {
                RequestStatus::Failed(EMPTY_ITINERARY_FALLBACK.to_string())
            }
            Ok(plan) => RequestStatus::Ready(plan),
            Err(e) => {
                tracing::warn!(
                    destination = %destination,
                    error = %e,
                    transient = e.is_transient(),
                    "Itinerary request failed"
                );
                RequestStatus::Failed(ITINERARY_ERROR_FALLBACK.to_string())
            }
        };
        Some(destination)
    }

    /// Destination field lost focus.
    ///
    /// When the field holds a new destination, refresh the quick
    /// suggestions and return the destination the scene should move to.
    pub async fn commit_destination(
        &mut self,
        scene_destination: &str,
        gateway: &dyn TravelGateway,
    ) -> Option<String> {
        let destination = self.destination.trim().to_string();
        if destination.is_empty() || destination == scene_destination {
            return None;
        }

        self.refresh_suggestions(gateway).await;
        Some(destination)
    }

    /// Fetch quick suggestions for the current destination field.
    ///
    /// The previous list is kept when the request fails.
    pub async fn refresh_suggestions(&mut self, gateway: &dyn TravelGateway) {
        let destination = self.destination.trim().to_string();
        if destination.is_empty() {
            return;
        }

        self.suggestion_status = RequestStatus::Loading;
        self.suggestion_status = match gateway.get_quick_suggestions(&destination).await {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                RequestStatus::Ready(())
            }
            Err(e) => {
                tracing::warn!(
                    destination = %destination,
                    error = %e,
                    transient = e.is_transient(),
                    "Quick suggestions failed"
                );
                RequestStatus::Failed(e.to_string())
            }
        };
    }
}
