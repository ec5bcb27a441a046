//! Ambient scene state: destination, theme, time of day and weather.
//!
//! The scene is a plain value owned by the shell. Every change produces a
//! new `Scene`; presentation code receives it by reference.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Destination shown before the user picks one.
pub const DEFAULT_DESTINATION: &str = "Kyoto, Japan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Default,
    Nature,
    Urban,
    Historic,
    Tropical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Sunrise,
    Day,
    Sunset,
    Night,
}

impl TimeOfDay {
    /// Map a local wall-clock hour (0..=23) to a time of day.
    ///
    /// Night is before 06:00 and after 20:59, sunrise 06:00-08:59, sunset
    /// 18:00-20:59, day otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            h if h < 6 || h > 20 => Self::Night,
            6..=8 => Self::Sunrise,
            18..=20 => Self::Sunset,
            _ => Self::Day,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunrise => "sunrise",
            Self::Day => "day",
            Self::Sunset => "sunset",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Cloudy,
    Rainy,
    Misty,
}

/// Colour wash laid over the backdrop image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub color: &'static str,
    /// Opacity in percent.
    pub opacity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub destination: String,
    pub theme: Theme,
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            destination: DEFAULT_DESTINATION.to_string(),
            theme: Theme::Nature,
            time_of_day: TimeOfDay::Day,
            weather: Weather::Clear,
        }
    }
}

impl Scene {
    /// Startup scene: defaults plus a one-time read of the local clock.
    pub fn at_startup(destination: &str) -> Self {
        let hour = chrono::Local::now().hour();
        Self::default()
            .with_destination(destination)
            .with_time_of_day(TimeOfDay::from_hour(hour))
    }

    pub fn with_destination(self, destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..self
        }
    }

    pub fn with_time_of_day(self, time_of_day: TimeOfDay) -> Self {
        Self {
            time_of_day,
            ..self
        }
    }

    pub fn with_weather(self, weather: Weather) -> Self {
        Self { weather, ..self }
    }

    /// Backdrop photo query for the current destination.
    pub fn backdrop_url(&self) -> String {
        format!(
            "https://source.unsplash.com/featured/1600x900/?{},travel",
            urlencoding::encode(&self.destination)
        )
    }

    pub fn overlay(&self) -> Overlay {
        match self.time_of_day {
            TimeOfDay::Night => Overlay {
                color: "slate-950",
                opacity: 70,
            },
            TimeOfDay::Sunset => Overlay {
                color: "orange-950",
                opacity: 50,
            },
            TimeOfDay::Sunrise => Overlay {
                color: "indigo-950",
                opacity: 40,
            },
            TimeOfDay::Day => Overlay {
                color: "slate-900",
                opacity: 40,
            },
        }
    }
}
