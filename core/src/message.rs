use serde::{Deserialize, Serialize};

use crate::identity::{MemberId, MessageRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Platform-neutral embed, used both for what the bot renders and for what it
/// reads back from channel history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmbed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<u32>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl RenderedEmbed {
    pub fn titled(title: impl Into<String>, colour: u32) -> Self {
        Self {
            title: Some(title.into()),
            colour: Some(colour),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Replace the first field named `name`, or append it.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(EmbedField {
                name: name.to_string(),
                value,
                inline: false,
            }),
        }
    }
}

/// Outbound message content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<RenderedEmbed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("image"))
    }
}

/// A message as read back from channel history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub id: MessageRef,
    pub author: MemberId,
    #[serde(default)]
    pub author_is_bot: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<RenderedEmbed>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageRef>,
}

impl PostedMessage {
    pub fn first_embed(&self) -> Option<&RenderedEmbed> {
        self.embeds.first()
    }

    pub fn first_image(&self) -> Option<&Attachment> {
        self.attachments.first().filter(|a| a.is_image())
    }
}

/// Find the payload of a `tag`-prefixed sidecar line. Lines may carry the
/// platform's subtext marker (`-# `) in front of the tag.
pub fn sidecar_payload<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let line = line.trim();
        let line = line.strip_prefix("-#").map(str::trim_start).unwrap_or(line);
        line.strip_prefix(tag).map(str::trim)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field_replaces_then_appends() {
        let mut embed = RenderedEmbed::titled("t", 0).with_field("A", "1");
        embed.set_field("A", "2");
        embed.set_field("B", "3");
        assert_eq!(embed.field("A"), Some("2"));
        assert_eq!(embed.field("B"), Some("3"));
        assert_eq!(embed.fields.len(), 2);
    }

    #[test]
    fn sidecar_payload_strips_subtext_marker() {
        let content = "<@1> • <@2>\n-# meta: {\"a\":1}";
        assert_eq!(sidecar_payload(content, "meta:"), Some("{\"a\":1}"));
        assert_eq!(sidecar_payload("meta: x", "meta:"), Some("x"));
        assert_eq!(sidecar_payload("nothing here", "meta:"), None);
    }

    #[test]
    fn only_image_attachments_count_as_screenshots() {
        let msg = PostedMessage {
            id: MessageRef(1),
            author: MemberId(2),
            author_is_bot: false,
            content: String::new(),
            embeds: vec![],
            attachments: vec![Attachment {
                url: "https://cdn/x.txt".into(),
                content_type: Some("text/plain".into()),
            }],
            reply_to: None,
        };
        assert!(msg.first_image().is_none());
    }
}
