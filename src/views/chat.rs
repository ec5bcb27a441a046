//! Conversational guide: an append-only transcript with grounded answers.

use std::time::Duration;

use super::RequestStatus;
use crate::device::{locate_within, Geolocator};
use crate::gateway::{Message, TravelGateway};

pub const WELCOME_MESSAGE: &str = "Welcome to Kyoto. The air is crisp today. Shall we explore \
the hidden moss gardens of Arashiyama, or perhaps find the best local matcha?";

pub const SIGNAL_LOST_FALLBACK: &str =
    "I've lost the signal briefly. Even the best guides need a moment. Try again?";

/// Append-only conversation log. Messages are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn push(&mut self, message: Message) -> &Message {
        self.0.push(message);
        &self.0[self.0.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct ChatView {
    transcript: Transcript,
    status: RequestStatus<()>,
    location_timeout: Duration,
}

impl ChatView {
    pub fn new(location_timeout: Duration) -> Self {
        Self {
            transcript: Transcript(vec![Message::assistant(WELCOME_MESSAGE, Vec::new())]),
            status: RequestStatus::Idle,
            location_timeout,
        }
    }

    /// Messages in the order they were added.
    pub fn transcript(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn status(&self) -> &RequestStatus<()> {
        &self.status
    }

    /// Send `input` to the guide and append the reply.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the returned
    /// message is the assistant's reply, or the fallback if the request
    /// failed.
    pub async fn send(
        &mut self,
        input: &str,
        gateway: &dyn TravelGateway,
        geolocator: &dyn Geolocator,
    ) -> Option<&Message> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        self.transcript.push(Message::user(prompt));
        self.status = RequestStatus::Loading;

        let location = locate_within(geolocator, self.location_timeout).await;
        let history = &self.transcript.messages()[..self.transcript.len() - 1];

        let reply = match gateway
            .generate_travel_advice(prompt, location, history)
            .await
        {
            Ok(advice) => {
                self.status = RequestStatus::Ready(());
                Message::assistant(advice.text, advice.sources)
            }
            Err(e) => {
                tracing::warn!(error = %e, transient = e.is_transient(), "Guide request failed");
                self.status = RequestStatus::Failed(SIGNAL_LOST_FALLBACK.to_string());
                Message::assistant(SIGNAL_LOST_FALLBACK, Vec::new())
            }
        };
        Some(self.transcript.push(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{FixedGeolocator, GeoPoint};
    use crate::gateway::Role;
    use crate::views::testing::{Call, FakeGateway};

    fn view() -> ChatView {
        ChatView::new(Duration::from_secs(1))
    }

    #[test]
    fn starts_with_welcome() {
        let chat = view();
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.transcript()[0].role, Role::Assistant);
        assert!(chat.transcript()[0].content.starts_with("Welcome to Kyoto."));
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let gateway = FakeGateway::answering("unused");
        let mut chat = view();
        assert!(chat
            .send("   ", &gateway, &FixedGeolocator::new(None))
            .await
            .is_none());
        assert_eq!(chat.transcript().len(), 1);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn reply_is_appended_after_question() {
        let gateway = FakeGateway::answering("Try Ippodo on Teramachi street.");
        let here = GeoPoint {
            latitude: 35.01,
            longitude: 135.77,
        };
        let mut chat = view();
        let reply = chat
            .send("Best matcha?", &gateway, &FixedGeolocator::new(Some(here)))
            .await
            .unwrap();
        assert_eq!(reply.content, "Try Ippodo on Teramachi street.");

        let roles: Vec<Role> = chat.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(chat.status(), &RequestStatus::Ready(()));

        // History excludes the question itself.
        assert_eq!(
            gateway.calls(),
            vec![Call::Advice {
                prompt: "Best matcha?".into(),
                location: Some(here),
                history: vec![WELCOME_MESSAGE.to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn location_is_omitted_when_unavailable() {
        let gateway = FakeGateway::answering("ok");
        let mut chat = view();
        chat.send("Where now?", &gateway, &FixedGeolocator::new(None))
            .await;
        assert!(matches!(
            &gateway.calls()[0],
            Call::Advice { location: None, .. }
        ));
    }

    #[tokio::test]
    async fn failure_appends_fallback() {
        let gateway = FakeGateway::failing();
        let mut chat = view();
        let reply = chat
            .send("Hello?", &gateway, &FixedGeolocator::new(None))
            .await
            .unwrap();
        assert_eq!(reply.content, SIGNAL_LOST_FALLBACK);
        assert_eq!(chat.transcript().len(), 3);
        assert!(chat.status().failure().is_some());
    }
}
