//! Device capabilities consumed by the feature views and the voice guide.
//!
//! Each capability is a trait so front ends can plug in real hardware and
//! tests can plug in fakes. The implementations here are what the CLI uses:
//! a configured fixed position, image files as camera stills, raw PCM files
//! as a microphone and a wall-clock playback sink.

pub mod audio;
pub mod camera;
pub mod geo;

#[allow(unused_imports)]
pub use audio::{
    AudioOutput, BufferId, CaptureConfig, CaptureTracks, ClockedOutput, FileMicrophone, MicStream,
    Microphone, PlaybackSink,
};
#[allow(unused_imports)]
pub use camera::{Camera, FileCamera};
#[allow(unused_imports)]
pub use geo::{locate_within, FixedGeolocator, GeoPoint, Geolocator};
