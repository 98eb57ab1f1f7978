use passage_core::error::codes;
use passage_core::validation::{ValidationOutcome, ValidationRequest};
use passage_core::{ChannelRef, MemberId, MessageRef};
use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse,
};
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::surface::DiscordSurface;

const FULFILLED: &str = "✅ Passage validé, le feedback a été envoyé.";
const UNAUTHORIZED: &str = "❌ Seul le propriétaire ou le passeur peut valider le passage.";
const ALREADY_FULFILLED: &str = "ℹ️ Ce passage a déjà été validé.";
const RECORD_NOT_FOUND: &str = "❌ Impossible de retrouver la demande dans ce salon.";

/// Validation click. Everything the decision needs is read back from the
/// ticket channel, so this works for tickets opened before a restart.
pub async fn handle(
    ctx: &Context,
    state: &AppState,
    component: &ComponentInteraction,
) -> Result<(), AppError> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true)),
        )
        .await?;

    let surface = DiscordSurface::new(ctx.http.clone(), state.config.feedback_channel());
    let request = ValidationRequest {
        channel: ChannelRef(component.channel_id.get()),
        actor: MemberId(component.user.id.get()),
        control_message: MessageRef(component.message.id.get()),
    };
    let outcome = state.validator()?.validate(&surface, request).await?;

    let reply = match outcome {
        ValidationOutcome::FulfillmentPosted {
            record,
            notice,
            control_retired,
        } => {
            if !control_retired {
                warn!(channel = %request.channel.0, "validation control could not be removed");
            }
            info!(
                channel = %request.channel.0,
                actor = %request.actor,
                assignee = %record.assignee,
                notice = notice.0,
                "passage validated"
            );
            FULFILLED
        }
        ValidationOutcome::Unauthorized { record } => {
            info!(
                channel = %request.channel.0,
                actor = %request.actor,
                assignee = %record.assignee,
                code = codes::UNAUTHORIZED,
                "validation rejected"
            );
            UNAUTHORIZED
        }
        ValidationOutcome::AlreadyFulfilled { record } => {
            info!(
                channel = %request.channel.0,
                actor = %request.actor,
                assignee = %record.assignee,
                "validation control already consumed"
            );
            ALREADY_FULFILLED
        }
        ValidationOutcome::RecordNotFound => {
            warn!(
                channel = %request.channel.0,
                code = codes::RECORD_NOT_FOUND,
                "no ticket record in channel history"
            );
            RECORD_NOT_FOUND
        }
    };

    component
        .edit_response(&ctx.http, EditInteractionResponse::new().content(reply))
        .await?;
    Ok(())
}
