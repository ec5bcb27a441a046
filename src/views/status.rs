/// Lifecycle of a view's single outstanding request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestStatus<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    /// Carries the fallback text shown in place of a result.
    Failed(String),
}

impl<T> RequestStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl RequestStatus<String> {
    /// Text to display: the result, or the fallback on failure.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) | Self::Failed(text) => Some(text),
            Self::Idle | Self::Loading => None,
        }
    }
}
