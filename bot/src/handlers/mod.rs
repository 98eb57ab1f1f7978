//! Gateway interaction and message handlers.

pub mod dashboard;
pub mod feedback;
pub mod flow;
pub mod reservation;
pub mod ticket;
pub mod validate;

use passage_core::controls::ControlId;
use serenity::all::{
    CommandInteraction, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse,
};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

pub async fn command(
    ctx: &Context,
    state: &AppState,
    command: &CommandInteraction,
) -> Result<(), AppError> {
    match command.data.name.as_str() {
        reservation::COMMAND_NAME => reservation::open_from_command(ctx, state, command).await,
        other => {
            debug!(command = other, "ignoring unknown command");
            Ok(())
        }
    }
}

pub async fn component(
    ctx: &Context,
    state: &AppState,
    component: &ComponentInteraction,
) -> Result<(), AppError> {
    let Some(control) = ControlId::parse(&component.data.custom_id) else {
        debug!(custom_id = %component.data.custom_id, "ignoring unknown control");
        acknowledge(ctx, component).await?;
        return Ok(());
    };

    match control {
        ControlId::Launch => reservation::open_from_dashboard(ctx, state, component).await,
        ControlId::Zone(slug) => reservation::pick_zone(ctx, state, component, &slug).await,
        ControlId::ActivityMenu(slug) => {
            reservation::pick_activity(ctx, state, component, &slug).await
        }
        ControlId::Flow { session, event } => {
            flow::handle(ctx, state, component, session, event).await
        }
        ControlId::Validate => validate::handle(ctx, state, component).await,
    }
}

/// Deferred update: the clicked message will be edited through `edit_response`.
pub(crate) async fn acknowledge(
    ctx: &Context,
    component: &ComponentInteraction,
) -> Result<(), AppError> {
    component
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await?;
    Ok(())
}

pub(crate) fn ephemeral(content: impl Into<String>) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true)
}

/// Replace the clicked message with plain text and no controls.
pub(crate) fn replace_with_text(content: impl Into<String>) -> EditInteractionResponse {
    EditInteractionResponse::new()
        .content(content)
        .embeds(Vec::new())
        .components(Vec::new())
}
