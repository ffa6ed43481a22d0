use serde::{Deserialize, Serialize};

/// A message with role and content, as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

/// Message content: either a bare string or a list of typed items.
///
/// Histories recorded from different chat frontends carry both shapes, so
/// both deserialize here and both serialize back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Items(Vec<ContentItem>),
}

/// One typed item of a mixed-content message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text { text: String },
    /// Plain text under the tag some frontends emit for typed input.
    InputText { text: String },
    /// An image carried by URL, either `https://...` or a `data:` URI.
    ImageUrl { image_url: ImageUrl },
}

/// The URL payload of an [`ContentItem::ImageUrl`] item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl Message {
    /// Create a new message with role and plain-text content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::new(Role::Assistant, content)
    }

    /// Create a user message from typed content items.
    pub fn user_items(items: Vec<ContentItem>) -> Self {
        Message {
            role: Role::User,
            content: MessageContent::Items(items),
        }
    }

    /// Get the role of this message.
    pub fn role(&self) -> Role {
        self.role
    }
}

impl ContentItem {
    /// A plain text item.
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    /// An image item referenced by URL.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentItem::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Role of a message participant.
///
/// `model` is accepted as an alias for `assistant` so histories captured
/// against Gemini-style APIs deserialize without preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    #[serde(alias = "model")]
    Assistant,
}
