//! Feature views: the state behind each tab.
//!
//! Views hold their own request status and are driven by explicit actions
//! taking `&mut self`, so a view never has two requests in flight. Gateway
//! and device failures never escape a view; they become fixed fallback
//! text.

pub mod chat;
pub mod itinerary;
pub mod lens;
pub mod safety;
pub mod status;
pub mod translator;
pub mod voice_guide;

#[allow(unused_imports)]
pub use chat::ChatView;
#[allow(unused_imports)]
pub use itinerary::ItineraryView;
#[allow(unused_imports)]
pub use lens::LensView;
#[allow(unused_imports)]
pub use safety::SafetyView;
#[allow(unused_imports)]
pub use status::RequestStatus;
#[allow(unused_imports)]
pub use translator::TranslatorView;
#[allow(unused_imports)]
pub use voice_guide::VoiceGuideView;
