//! App shell: consent gate, tab navigation and the shared scene.

use serde::{Deserialize, Serialize};

use crate::scene::Scene;

/// Header subtitle when no destination is set.
pub const NO_DESTINATION_LABEL: &str = "Global Discovery";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Chat,
    Lens,
    Itinerary,
    Voice,
    Translate,
    Safety,
}

/// Bottom navigation entries, in display order. `Translate` is reached
/// from inside the guide, not from the bar.
pub const NAV_ITEMS: [(Tab, &str); 5] = [
    (Tab::Chat, "Guide"),
    (Tab::Lens, "Lens"),
    (Tab::Itinerary, "Plan"),
    (Tab::Voice, "Live"),
    (Tab::Safety, "Safety"),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("location and camera consent has not been granted")]
    ConsentRequired,
}

#[derive(Debug)]
pub struct Shell {
    active_tab: Tab,
    has_consent: bool,
    scene: Scene,
}

impl Shell {
    pub fn new(scene: Scene) -> Self {
        Self {
            active_tab: Tab::Chat,
            has_consent: false,
            scene,
        }
    }

    pub fn has_consent(&self) -> bool {
        self.has_consent
    }

    /// "Start Your Adventure".
    pub fn grant_consent(&mut self) {
        if !self.has_consent {
            tracing::info!("Consent granted");
        }
        self.has_consent = true;
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// Switch tabs. Features stay behind the consent screen until it is
    /// accepted.
    pub fn select_tab(&mut self, tab: Tab) -> Result<(), ShellError> {
        if !self.has_consent {
            return Err(ShellError::ConsentRequired);
        }
        if tab != self.active_tab {
            tracing::debug!(from = ?self.active_tab, to = ?tab, "Switching tab");
        }
        self.active_tab = tab;
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Adopt a destination chosen in the planner.
    pub fn apply_destination(&mut self, destination: Option<String>) {
        let Some(destination) = destination else {
            return;
        };
        if destination == self.scene.destination {
            return;
        }
        tracing::info!(destination = %destination, "Scene destination changed");
        self.scene = self.scene.clone().with_destination(destination);
    }

    /// Subtitle under the app name.
    pub fn header_label(&self) -> &str {
        if self.scene.destination.is_empty() {
            NO_DESTINATION_LABEL
        } else {
            &self.scene.destination
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TimeOfDay;

    #[test]
    fn tabs_are_gated_until_consent() {
        let mut shell = Shell::new(Scene::default());
        assert_eq!(shell.select_tab(Tab::Lens), Err(ShellError::ConsentRequired));
        assert_eq!(shell.active_tab(), Tab::Chat);

        shell.grant_consent();
        assert!(shell.select_tab(Tab::Lens).is_ok());
        assert_eq!(shell.active_tab(), Tab::Lens);
    }

    #[test]
    fn planner_destination_replaces_scene_destination_only() {
        let scene = Scene::default().with_time_of_day(TimeOfDay::Sunset);
        let mut shell = Shell::new(scene);
        shell.apply_destination(Some("Lisbon, Portugal".into()));

        assert_eq!(shell.scene().destination, "Lisbon, Portugal");
        assert_eq!(shell.scene().time_of_day, TimeOfDay::Sunset);
        assert_eq!(shell.header_label(), "Lisbon, Portugal");
    }

    #[test]
    fn no_destination_change_keeps_scene() {
        let mut shell = Shell::new(Scene::default());
        shell.apply_destination(None);
        assert_eq!(shell.scene(), &Scene::default());
    }

    #[test]
    fn empty_destination_shows_global_discovery() {
        let shell = Shell::new(Scene::default().with_destination(""));
        assert_eq!(shell.header_label(), NO_DESTINATION_LABEL);
    }

    #[test]
    fn nav_bar_order() {
        let labels: Vec<&str> = NAV_ITEMS.iter().map(|(_, label)| *label).collect();
        assert_eq!(labels, vec!["Guide", "Lens", "Plan", "Live", "Safety"]);
    }
}
