use passage_core::MemberId;
use passage_core::error::SurfaceError;
use passage_core::feedback::{
    CommentRole, NOTICE_COLOUR, NOTICE_TITLE, apply_reply, notice_meta, screenshot_target,
};
use passage_core::message::RenderedEmbed;
use serenity::all::{Context, GetMessages, Message, MessageId};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::render;
use crate::state::AppState;
use crate::surface::{posted_message, surface_error};

/// How far back the feedback channel is scanned for a screenshot's notice.
const NOTICE_SCAN_WINDOW: u8 = 50;

pub async fn on_message(ctx: &Context, state: &AppState, message: &Message) -> Result<(), AppError> {
    if message.author.bot {
        return Ok(());
    }
    let channel = message.channel_id;
    if channel == state.config.screen_channel() {
        attach_screenshot(ctx, state, message).await
    } else if channel == state.config.feedback_channel() {
        comment_on_notice(ctx, state, message).await
    } else {
        Ok(())
    }
}

/// A screenshot posted in the screenshot channel becomes the image of the
/// newest notice its author is entitled to illustrate.
async fn attach_screenshot(ctx: &Context, state: &AppState, message: &Message) -> Result<(), AppError> {
    let posted = posted_message(message);
    let Some(image) = posted.first_image() else {
        return Ok(());
    };

    let feedback = state.config.feedback_channel();
    let history: Vec<_> = feedback
        .messages(&ctx.http, GetMessages::new().limit(NOTICE_SCAN_WINDOW))
        .await?
        .iter()
        .map(posted_message)
        .collect();
    let Some(target) = screenshot_target(&history, posted.author, state.config.owner_id, state.bot_id()?)
    else {
        debug!(author = %posted.author, "no fulfillment notice for screenshot");
        return Ok(());
    };

    let mut embed = history
        .iter()
        .find(|m| m.id == target)
        .and_then(|m| m.first_embed().cloned())
        .unwrap_or_else(|| RenderedEmbed::titled(NOTICE_TITLE, NOTICE_COLOUR));
    embed.image_url = Some(image.url.clone());
    feedback
        .edit_message(&ctx.http, MessageId::new(target.0), render::edit_embed(&embed))
        .await?;
    info!(author = %posted.author, notice = target.0, "screenshot attached to notice");
    Ok(())
}

/// A reply to a notice is folded into the notice's comment field (and its
/// image, if one is attached), then removed from the channel.
async fn comment_on_notice(ctx: &Context, state: &AppState, message: &Message) -> Result<(), AppError> {
    let Some(reply_to) = message.message_reference.as_ref().and_then(|r| r.message_id) else {
        return Ok(());
    };
    let bot = state.bot_id()?;
    let fetched = message
        .channel_id
        .message(ctx, reply_to)
        .await
        .map_err(surface_error);
    let Some(notice) = replied_message(fetched)? else {
        debug!(reply_to = %reply_to, "reply to a message that no longer exists");
        return Ok(());
    };
    if MemberId(notice.author.id.get()) != bot {
        return Ok(());
    }
    let notice = posted_message(&notice);
    let Some(meta) = notice_meta(&notice) else {
        return Ok(());
    };

    let reply = posted_message(message);
    let role = CommentRole::resolve(reply.author, state.config.owner_id, Some(&meta));
    let mut embed = notice
        .first_embed()
        .cloned()
        .unwrap_or_else(|| RenderedEmbed::titled(NOTICE_TITLE, NOTICE_COLOUR));
    let image = reply.first_image().map(|a| a.url.as_str());

    if apply_reply(&mut embed, role, &reply.content, image) {
        message
            .channel_id
            .edit_message(&ctx.http, reply_to, render::edit_embed(&embed))
            .await?;
        debug!(notice = %reply_to, role = role.label(), "comment added to notice");
    }

    if let Err(err) = message.delete(&ctx.http).await {
        warn!(message = %message.id, error = %err, "could not delete folded reply");
    }
    Ok(())
}

/// The message a reply points at; `None` once it has been deleted.
fn replied_message<T>(fetched: Result<T, SurfaceError>) -> Result<Option<T>, AppError> {
    match fetched {
        Ok(message) => Ok(Some(message)),
        Err(SurfaceError::NotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
