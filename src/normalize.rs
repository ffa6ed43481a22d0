//! Normalization of caller-supplied message content into the
//! provider-agnostic intermediate representation.
//!
//! Every incoming [`MessageContent`] shape is reduced to a flat list of
//! [`ContentPart`]s before any provider mapping happens, so the provider
//! adapters only ever deal with three part kinds.

use crate::error::Error;
use crate::types::{ContentItem, Message, MessageContent, Role};

/// Base64 of the PNG file signature. A payload starting with this is a PNG
/// no matter what media type the data-URI header declares, and mislabeled
/// screenshots are common enough that the payload wins.
const PNG_BASE64_MAGIC: &str = "iVBOR";

/// One atomic unit of normalized message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Plain text, carried verbatim.
    Text { text: String },
    /// An inline image; `data` is the still-encoded base64 payload.
    Image { media_type: String, data: String },
    /// An image referenced by URI rather than carried inline.
    ImageRef {
        uri: String,
        mime_type: Option<String>,
    },
}

/// A message whose content has been reduced to parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl ContentPart {
    /// The text of a `Text` part, if that is what this is.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Reduce one message's content to parts.
///
/// A bare string becomes exactly one `Text` part holding the string
/// verbatim, even when empty. Typed items map one to one, in order:
/// `text` and `input_text` items become `Text` parts, `image_url` items
/// become `Image` parts when they carry a `data:image` URI and `ImageRef`
/// parts otherwise. Malformed data URIs fail the whole call.
pub fn normalize_content(content: &MessageContent) -> Result<Vec<ContentPart>, Error> {
    match content {
        MessageContent::Text(text) => Ok(vec![ContentPart::Text { text: text.clone() }]),
        MessageContent::Items(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ContentItem::Text { text } | ContentItem::InputText { text } => {
                        parts.push(ContentPart::Text { text: text.clone() });
                    }
                    ContentItem::ImageUrl { image_url } => {
                        parts.push(normalize_image_url(&image_url.url)?);
                    }
                }
            }
            Ok(parts)
        }
    }
}

/// Normalize every message of a history, preserving turn order.
pub fn normalize_history(history: &[Message]) -> Result<Vec<NormalizedMessage>, Error> {
    history
        .iter()
        .map(|msg| {
            Ok(NormalizedMessage {
                role: msg.role,
                parts: normalize_content(&msg.content)?,
            })
        })
        .collect()
}

/// Join the text parts of every system message into a single instruction.
///
/// Each system message contributes its `Text` parts joined with `\n`, and
/// the contributions of multiple system messages are appended in turn
/// order, also newline-joined. Returns `None` when no system message
/// carries any text, so mappers can omit the field entirely rather than
/// send an empty instruction.
pub fn extract_system_instruction(messages: &[NormalizedMessage]) -> Option<String> {
    let mut chunks = Vec::new();
    for msg in messages.iter().filter(|m| m.role == Role::System) {
        let texts: Vec<&str> = msg.parts.iter().filter_map(ContentPart::as_text).collect();
        let joined = texts.join("\n");
        if !joined.is_empty() {
            chunks.push(joined);
        }
    }
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n"))
    }
}

fn normalize_image_url(url: &str) -> Result<ContentPart, Error> {
    if !url.starts_with("data:image") {
        return Ok(ContentPart::ImageRef {
            uri: url.to_string(),
            mime_type: None,
        });
    }
    // data:<mediatype>[;base64],<payload> -- split on the first comma only,
    // the payload may contain more of them.
    let Some((header, payload)) = url.split_once(',') else {
        let head: String = url.chars().take(32).collect();
        return Err(Error::invalid_content(format!(
            "data URI has no ',' between header and payload: {head}..."
        )));
    };
    let media_type = if payload.starts_with(PNG_BASE64_MAGIC) {
        "image/png".to_string()
    } else {
        media_type_from_header(header).to_string()
    };
    Ok(ContentPart::Image {
        media_type,
        data: payload.to_string(),
    })
}

/// The declared media type sits between `data:` and the first `;`, or runs
/// to the end of the header when no parameters follow.
fn media_type_from_header(header: &str) -> &str {
    let rest = header.strip_prefix("data:").unwrap_or(header);
    match rest.find(';') {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_item(url: &str) -> MessageContent {
        MessageContent::Items(vec![ContentItem::image_url(url)])
    }

    #[test]
    fn test_plain_string_becomes_single_text_part() {
        let parts = normalize_content(&MessageContent::Text("hello".to_string())).unwrap();
        assert_eq!(
            parts,
            vec![ContentPart::Text {
                text: "hello".to_string()
            }]
        );

        // Empty strings survive verbatim rather than vanishing.
        let parts = normalize_content(&MessageContent::Text(String::new())).unwrap();
        assert_eq!(
            parts,
            vec![ContentPart::Text {
                text: String::new()
            }]
        );
    }

    #[test]
    fn test_items_map_in_order() {
        let content = MessageContent::Items(vec![
            ContentItem::text("before"),
            ContentItem::image_url("https://example.com/x.png"),
            ContentItem::InputText {
                text: "after".to_string(),
            },
        ]);
        let parts = normalize_content(&content).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].as_text(), Some("before"));
        assert!(matches!(
            parts[1],
            ContentPart::ImageRef { ref uri, .. } if uri == "https://example.com/x.png"
        ));
        assert_eq!(parts[2].as_text(), Some("after"));
    }

    #[test]
    fn test_data_uri_splits_into_media_type_and_payload() {
        let parts = normalize_content(&image_item("data:image/jpeg;base64,/9j/4AAQ")).unwrap();
        assert_eq!(
            parts,
            vec![ContentPart::Image {
                media_type: "image/jpeg".to_string(),
                data: "/9j/4AAQ".to_string()
            }]
        );
    }

    #[test]
    fn test_data_uri_without_parameters_still_parses() {
        let parts = normalize_content(&image_item("data:image/webp,UklGRg")).unwrap();
        assert_eq!(
            parts,
            vec![ContentPart::Image {
                media_type: "image/webp".to_string(),
                data: "UklGRg".to_string()
            }]
        );
    }

    #[test]
    fn test_payload_commas_stay_in_the_payload() {
        let parts = normalize_content(&image_item("data:image/gif;base64,R0lG,OD,lh")).unwrap();
        assert!(matches!(
            parts[0],
            ContentPart::Image { ref data, .. } if data == "R0lG,OD,lh"
        ));
    }

    #[test]
    fn test_png_magic_overrides_declared_media_type() {
        let parts =
            normalize_content(&image_item("data:image/jpeg;base64,iVBORw0KGgo=")).unwrap();
        assert!(matches!(
            parts[0],
            ContentPart::Image { ref media_type, .. } if media_type == "image/png"
        ));
    }

    #[test]
    fn test_data_uri_without_comma_is_rejected() {
        let err = normalize_content(&image_item("data:image/png;base64")).unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
    }

    #[test]
    fn test_non_data_urls_become_references() {
        let parts = normalize_content(&image_item("https://example.com/cat.jpg")).unwrap();
        assert_eq!(
            parts,
            vec![ContentPart::ImageRef {
                uri: "https://example.com/cat.jpg".to_string(),
                mime_type: None
            }]
        );
    }

    #[test]
    fn test_system_messages_merge_newline_joined() {
        let history = vec![
            Message::system("first rule"),
            Message::user("hi"),
            Message::system("second rule"),
        ];
        let normalized = normalize_history(&history).unwrap();
        assert_eq!(
            extract_system_instruction(&normalized).as_deref(),
            Some("first rule\nsecond rule")
        );
    }

    #[test]
    fn test_no_system_text_yields_none() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let normalized = normalize_history(&history).unwrap();
        assert_eq!(extract_system_instruction(&normalized), None);
    }

    #[test]
    fn test_image_only_system_message_contributes_nothing() {
        let history = vec![Message {
            role: Role::System,
            content: image_item("https://example.com/banner.png"),
        }];
        let normalized = normalize_history(&history).unwrap();
        assert_eq!(extract_system_instruction(&normalized), None);
    }

    #[test]
    fn test_empty_system_text_yields_none_not_empty_string() {
        let history = vec![Message::system(""), Message::user("hi")];
        let normalized = normalize_history(&history).unwrap();
        assert_eq!(extract_system_instruction(&normalized), None);
    }
}
