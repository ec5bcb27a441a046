//! Nomad: an AI travel companion.
//!
//! The crate is the client-side orchestration layer: it turns traveller
//! input (text, camera stills, location, live microphone audio) into calls
//! against Gemini and keeps the per-feature state a front end renders.
//!
//! - [`gateway`]: request/response operations (advice, lens, itinerary,
//!   suggestions, safety)
//! - [`voice`]: realtime voice session with gapless playback and barge-in
//! - [`views`]: per-tab state machines with fixed fallbacks
//! - [`shell`] and [`scene`]: navigation, consent and the ambient backdrop
//! - [`device`]: camera, microphone, speaker and geolocation capabilities

pub mod config;
pub mod device;
pub mod gateway;
pub mod scene;
pub mod shell;
pub mod views;
pub mod voice;
