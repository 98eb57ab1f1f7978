use passage_core::MemberId;
use passage_core::controls::launch_control;
use passage_core::record::RECORD_COLOUR;
use serenity::all::{
    Context, CreateActionRow, CreateEmbed, CreateMessage, EditMessage, GetMessages, Message,
};
use tracing::{info, warn};

use super::reservation;
use super::ticket::{is_guild_member, member_overwrite};
use crate::error::AppError;
use crate::render;
use crate::state::AppState;

pub const DASHBOARD_TITLE: &str = "🤖 Bot de création de demandes de passage";
const DASHBOARD_DESCRIPTION: &str = "Bienvenue sur le bot de création de demandes de passage !\n\
    Cliquez sur le bouton ci-dessous pour lancer une réservation.";
const DASHBOARD_SCAN_WINDOW: u8 = 50;

fn is_dashboard(message: &Message, bot: MemberId) -> bool {
    MemberId(message.author.id.get()) == bot
        && message
            .embeds
            .first()
            .and_then(|e| e.title.as_deref())
            .is_some_and(|title| title == DASHBOARD_TITLE)
}

/// Edit the existing dashboard in place, or post and pin a new one.
pub async fn publish(ctx: &Context, state: &AppState) -> Result<(), AppError> {
    let bot = state.bot_id()?;
    let channel = state.config.dashboard_channel();
    let embed = CreateEmbed::new()
        .title(DASHBOARD_TITLE)
        .description(DASHBOARD_DESCRIPTION)
        .colour(RECORD_COLOUR);
    let components = vec![CreateActionRow::Buttons(vec![render::button(&launch_control())])];

    let existing = match channel
        .messages(&ctx.http, GetMessages::new().limit(DASHBOARD_SCAN_WINDOW))
        .await
    {
        Ok(messages) => messages.into_iter().find(|m| is_dashboard(m, bot)),
        Err(err) => {
            warn!(error = %err, "could not read dashboard channel; posting a new dashboard");
            None
        }
    };

    match existing {
        Some(message) => {
            channel
                .edit_message(
                    &ctx.http,
                    message.id,
                    EditMessage::new().embed(embed).components(components),
                )
                .await?;
            info!(message = %message.id, "dashboard refreshed");
        }
        None => {
            let message = channel
                .send_message(&ctx.http, CreateMessage::new().embed(embed).components(components))
                .await?;
            if let Err(err) = message.pin(&ctx.http).await {
                warn!(message = %message.id, error = %err, "could not pin dashboard");
            }
            info!(message = %message.id, "dashboard posted");
        }
    }
    Ok(())
}

pub async fn register_commands(ctx: &Context, state: &AppState) -> Result<(), AppError> {
    state
        .config
        .guild()
        .set_commands(&ctx.http, vec![reservation::command()])
        .await?;
    Ok(())
}

/// Every mapped assignee can post in the screenshot channel. Returns how many
/// identities were granted access.
pub async fn grant_screen_access(ctx: &Context, state: &AppState) -> usize {
    let guild = state.config.guild();
    let channel = state.config.screen_channel();
    let mut granted = 0;
    for provider in state.resolver.providers() {
        if !is_guild_member(ctx, guild, provider).await {
            warn!(provider = %provider, "mapped assignee is not in the guild");
            continue;
        }
        match channel.create_permission(&ctx.http, member_overwrite(provider)).await {
            Ok(()) => granted += 1,
            Err(err) => warn!(provider = %provider, error = %err, "could not open screenshot channel"),
        }
    }
    granted
}
