use passage_core::MemberId;
use passage_core::controls::{ControlId, zone_picker};
use passage_core::error::FlowError;
use passage_core::flow::{SelectionSession, render_view};
use serenity::all::{
    CommandInteraction, ComponentInteraction, ComponentInteractionDataKind, Context,
    CreateActionRow, CreateCommand, CreateInteractionResponse, CreateInteractionResponseMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption,
};
use tracing::info;

use super::ephemeral;
use crate::error::AppError;
use crate::render;
use crate::state::AppState;

pub const COMMAND_NAME: &str = "reservations";

pub fn command() -> CreateCommand {
    CreateCommand::new(COMMAND_NAME).description("Ouvre la procédure de réservation")
}

fn zone_picker_response(state: &AppState) -> CreateInteractionResponse {
    let controls = zone_picker(&state.catalog);
    CreateInteractionResponse::Message(
        ephemeral("🎟️ Choisissez la zone :").components(render::action_rows(&[controls])),
    )
}

pub async fn open_from_command(
    ctx: &Context,
    state: &AppState,
    command: &CommandInteraction,
) -> Result<(), AppError> {
    command
        .create_response(&ctx.http, zone_picker_response(state))
        .await?;
    Ok(())
}

pub async fn open_from_dashboard(
    ctx: &Context,
    state: &AppState,
    component: &ComponentInteraction,
) -> Result<(), AppError> {
    component
        .create_response(&ctx.http, zone_picker_response(state))
        .await?;
    Ok(())
}

pub async fn pick_zone(
    ctx: &Context,
    state: &AppState,
    component: &ComponentInteraction,
    slug: &str,
) -> Result<(), AppError> {
    let zone = state
        .catalog
        .zone_by_slug(slug)
        .ok_or_else(|| AppError::UnknownZone(slug.to_string()))?;

    let options = zone
        .activities
        .iter()
        .map(|activity| CreateSelectMenuOption::new(activity.name, activity.name))
        .collect();
    let menu = CreateSelectMenu::new(
        ControlId::ActivityMenu(zone.slug.to_string()).to_string(),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Choisissez un donjon...");

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                ephemeral(format!("Choisissez le donjon **{}** :", zone.name))
                    .components(vec![CreateActionRow::SelectMenu(menu)]),
            ),
        )
        .await?;
    Ok(())
}

pub async fn pick_activity(
    ctx: &Context,
    state: &AppState,
    component: &ComponentInteraction,
    slug: &str,
) -> Result<(), AppError> {
    let zone = state
        .catalog
        .zone_by_slug(slug)
        .ok_or_else(|| AppError::UnknownZone(slug.to_string()))?;
    let activity = match &component.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.first(),
        _ => None,
    }
    .ok_or(AppError::EmptySelection)?;

    if state.catalog.zone_of(activity).map(|z| z.slug) != Some(zone.slug) {
        return Err(FlowError::UnknownActivity(activity.clone()).into());
    }

    let requester = MemberId(component.user.id.get());
    let session = SelectionSession::start(requester, zone.name, activity, &state.catalog)?;
    let view = render_view(&session, &state.catalog);
    let key = state.sessions.open(session).await;
    info!(
        requester = %requester,
        session = %key.session,
        activity = %activity,
        "selection session opened"
    );

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(render::flow_embed(&view))
                    .components(render::action_rows(&view.rows))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
