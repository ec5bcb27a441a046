//! Lingo helper: translate a phrase with a pronunciation guide.

use super::RequestStatus;
use crate::gateway::{prompts, TravelGateway};

pub const TARGET_LANGUAGES: [&str; 6] = ["Japanese", "French", "Spanish", "Italian", "Thai", "Hindi"];

pub const QUICK_PHRASES: [&str; 4] = [
    "Where is the bathroom?",
    "How much is this?",
    "I have an allergy",
    "Need help, please",
];

pub const TRANSLATION_FALLBACK: &str = "Translation failed.";

pub struct TranslatorView {
    text: String,
    target_language: String,
    result: RequestStatus<String>,
}

impl Default for TranslatorView {
    fn default() -> Self {
        Self {
            text: String::new(),
            target_language: TARGET_LANGUAGES[0].to_string(),
            result: RequestStatus::Idle,
        }
    }
}

impl TranslatorView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    /// Fill the input with a quick phrase.
    pub fn use_quick_phrase(&mut self, index: usize) {
        if let Some(phrase) = QUICK_PHRASES.get(index) {
            self.text = phrase.to_string();
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn set_target_language(&mut self, language: &str) {
        self.target_language = language.to_string();
    }

    pub fn result(&self) -> &RequestStatus<String> {
        &self.result
    }

    /// First line of the result, shown large above the full answer.
    pub fn headline(&self) -> Option<&str> {
        self.result.display_text().and_then(|text| text.lines().next())
    }

    /// Translate the current text. Blank input is ignored.
    pub async fn translate(&mut self, gateway: &dyn TravelGateway) {
        let text = self.text.trim();
        if text.is_empty() {
            return;
        }

        let prompt = prompts::translation(text, &self.target_language);
        self.result = RequestStatus::Loading;
        self.result = match gateway.generate_travel_advice(&prompt, None, &[]).await {
            Ok(advice) => RequestStatus::Ready(advice.text),
            Err(e) => {
                tracing::warn!(
                    language = %self.target_language,
                    error = %e,
                    transient = e.is_transient(),
                    "Translation failed"
                );
                RequestStatus::Failed(TRANSLATION_FALLBACK.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::{Call, FakeGateway};

    #[tokio::test]
    async fn translation_uses_advice_without_location_or_history() {
        let gateway = FakeGateway::answering("Toire wa doko desu ka?\n(toy-reh wah doh-koh des-kah)");
        let mut view = TranslatorView::new();
        view.use_quick_phrase(0);
        view.translate(&gateway).await;

        assert_eq!(view.headline(), Some("Toire wa doko desu ka?"));
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Advice {
                prompt,
                location,
                history,
            } => {
                assert!(prompt.contains("Japanese"));
                assert!(prompt.contains("phonetic"));
                assert!(prompt.contains("Where is the bathroom?"));
                assert!(location.is_none());
                assert!(history.is_empty());
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_text_is_ignored() {
        let gateway = FakeGateway::answering("unused");
        let mut view = TranslatorView::new();
        view.set_text("  \n ");
        view.translate(&gateway).await;
        assert!(gateway.calls().is_empty());
        assert_eq!(view.result(), &RequestStatus::Idle);
    }

    #[tokio::test]
    async fn failure_shows_fallback() {
        let mut view = TranslatorView::new();
        view.set_text("Thank you");
        view.set_target_language("Thai");
        view.translate(&FakeGateway::failing()).await;
        assert_eq!(view.headline(), Some(TRANSLATION_FALLBACK));
    }

    #[test]
    fn out_of_range_quick_phrase_is_ignored() {
        let mut view = TranslatorView::new();
        view.set_text("keep");
        view.use_quick_phrase(QUICK_PHRASES.len());
        assert_eq!(view.text(), "keep");
    }
}
