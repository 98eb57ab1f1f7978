use std::sync::Arc;

use passage_core::error::SurfaceError;
use passage_core::message::{Attachment, EmbedField, PostedMessage, RenderedEmbed, RenderedMessage};
use passage_core::record::TicketRecord;
use passage_core::validation::TicketSurface;
use passage_core::{ChannelRef, MemberId, MessageRef};
use serenity::all::{ChannelId, Embed, GetMessages, Http, Message, MessageId};
use serenity::http::HttpError;

use crate::render;

/// Ticket channels and the feedback channel, as seen by the validation protocol.
pub struct DiscordSurface {
    http: Arc<Http>,
    feedback_channel: ChannelId,
}

impl DiscordSurface {
    pub fn new(http: Arc<Http>, feedback_channel: ChannelId) -> Self {
        Self {
            http,
            feedback_channel,
        }
    }
}

impl TicketSurface for DiscordSurface {
    async fn fetch_history(
        &self,
        channel: ChannelRef,
        window: usize,
    ) -> Result<Vec<PostedMessage>, SurfaceError> {
        let limit = window.clamp(1, 100) as u8;
        // Oldest first: the record opens the channel.
        let oldest = GetMessages::new().after(MessageId::new(1)).limit(limit);
        let messages = ChannelId::new(channel.0)
            .messages(&self.http, oldest)
            .await
            .map_err(surface_error)?;
        Ok(messages.iter().map(posted_message).collect())
    }

    async fn post_notice(&self, notice: &RenderedMessage) -> Result<MessageRef, SurfaceError> {
        let message = self
            .feedback_channel
            .send_message(&self.http, render::create_message(notice))
            .await
            .map_err(surface_error)?;
        Ok(MessageRef(message.id.get()))
    }

    async fn retire_control(&self, channel: ChannelRef, message: MessageRef) -> Result<(), SurfaceError> {
        ChannelId::new(channel.0)
            .delete_message(&self.http, MessageId::new(message.0))
            .await
            .map_err(surface_error)
    }

    async fn restore_control(
        &self,
        channel: ChannelRef,
        record: &TicketRecord,
    ) -> Result<MessageRef, SurfaceError> {
        let message = ChannelId::new(channel.0)
            .send_message(&self.http, render::validation_message(record))
            .await
            .map_err(surface_error)?;
        Ok(MessageRef(message.id.get()))
    }
}

pub fn surface_error(err: serenity::Error) -> SurfaceError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        if response.status_code.as_u16() == 404 {
            return SurfaceError::NotFound;
        }
    }
    SurfaceError::Platform(err.to_string())
}

pub fn posted_message(message: &Message) -> PostedMessage {
    PostedMessage {
        id: MessageRef(message.id.get()),
        author: MemberId(message.author.id.get()),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        embeds: message.embeds.iter().map(rendered_embed).collect(),
        attachments: message
            .attachments
            .iter()
            .map(|a| Attachment {
                url: a.url.clone(),
                content_type: a.content_type.clone(),
            })
            .collect(),
        reply_to: message
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| MessageRef(id.get())),
    }
}

pub fn rendered_embed(embed: &Embed) -> RenderedEmbed {
    RenderedEmbed {
        title: embed.title.clone(),
        description: embed.description.clone(),
        colour: embed.colour.map(|c| c.0),
        fields: embed
            .fields
            .iter()
            .map(|f| EmbedField {
                name: f.name.clone(),
                value: f.value.clone(),
                inline: f.inline,
            })
            .collect(),
        footer: embed.footer.as_ref().map(|f| f.text.clone()),
        image_url: embed.image.as_ref().map(|i| i.url.clone()),
    }
}
